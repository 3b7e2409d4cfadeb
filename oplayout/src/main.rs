mod logger;

use std::process::ExitCode;

use io_impl::RealIo;
use oplayout_lib::app::run;

fn main() -> ExitCode {
    if let Err(e) = logger::setup() {
        eprintln!("Failed to setup logger: {}", e);
    }
    match run(&RealIo()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("err {}", e);
            ExitCode::FAILURE
        }
    }
}
