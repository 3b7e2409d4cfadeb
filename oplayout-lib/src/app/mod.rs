pub mod describe;

use core::fmt::Write;
use std::{
    io::{self, Error},
    sync::Arc,
};

use io_trait::Io;

use crate::{class::registry::ClassRegistry, class::ClassDescriptor};

pub fn report(classes: &[Arc<ClassDescriptor>]) -> Result<String, core::fmt::Error> {
    classes.iter().try_fold(String::new(), |mut s, class| {
        write_class(&mut s, class)?;
        Ok(s)
    })
}

fn write_class(s: &mut String, class: &ClassDescriptor) -> core::fmt::Result {
    write!(s, "class {}", class.name())?;
    if let Some(base) = class.base() {
        write!(s, " : {}", base.name())?;
    }
    writeln!(s)?;
    writeln!(s, "  instance_size {}", class.instance_size())?;
    writeln!(s, "  item_size {}", class.item_size())?;
    if class.is_relative() {
        let range = class.private_range();
        writeln!(s, "  private {}..{}", range.start, range.end)?;
    }
    for m in class.members() {
        write!(s, "  member {} {} @{}", m.name, m.type_.name(), m.offset)?;
        if m.is_readonly() {
            write!(s, " readonly")?;
        }
        writeln!(s)?;
    }
    for (name, offset) in class.special().iter() {
        writeln!(s, "  special {name} @{offset}")?;
    }
    Ok(())
}

/// `<program> <input> <output>`: resolves the classes described in `input`
/// and writes their layout to `output`.
pub fn run(io: &impl Io) -> io::Result<()> {
    let mut a = io.args();
    a.next();
    let input = a
        .next()
        .ok_or_else(|| Error::other("missing input file"))?;
    let output = a
        .next()
        .ok_or_else(|| Error::other("missing output file"))?;

    let text = String::from_utf8(io.read(&input)?).map_err(Error::other)?;
    let registry = ClassRegistry::new();
    let classes = describe::parse(&text)
        .and_then(|drafts| describe::build(&drafts, &registry))
        .map_err(Error::other)?;
    log::info!("{}: {} classes", input, classes.len());
    let out = report(&classes).map_err(Error::other)?;
    io.write(&output, out.as_bytes())
}
