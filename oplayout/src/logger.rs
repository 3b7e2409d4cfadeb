use std::env;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Level comes from `OPLAYOUT_LOG` (`off`, `error` .. `trace`), `warn` by default.
pub fn setup() -> Result<(), SetLoggerError> {
    let level = env::var("OPLAYOUT_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
