use crate::error::{LayoutError, LayoutResult};

use super::align::checked_align;

/// A declared instance size, decoded from its signed encoding:
/// `0` inherits the base size, a positive value is the whole instance size
/// and a negative value is the size of the class's own private region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclaredSize {
    Inherit,
    Absolute(usize),
    Relative(usize),
}

impl From<isize> for DeclaredSize {
    #[inline(always)]
    fn from(value: isize) -> Self {
        match value {
            0 => DeclaredSize::Inherit,
            v if v > 0 => DeclaredSize::Absolute(v.unsigned_abs()),
            v => DeclaredSize::Relative(v.unsigned_abs()),
        }
    }
}

impl DeclaredSize {
    #[inline(always)]
    pub const fn is_relative(self) -> bool {
        matches!(self, DeclaredSize::Relative(_))
    }
    /// The number of private bytes a relative class asks for.
    #[inline(always)]
    pub const fn extra(self) -> Option<usize> {
        match self {
            DeclaredSize::Relative(n) => Some(n),
            _ => None,
        }
    }
}

/// Offset of a class's private region: the aligned instance size of its base.
pub fn base_offset(base_size: Option<usize>) -> LayoutResult<usize> {
    checked_align(base_size.unwrap_or(0)).ok_or(LayoutError::SizeOverflow)
}

pub fn resolve_instance_size(declared: DeclaredSize, base_size: Option<usize>) -> LayoutResult<usize> {
    match declared {
        DeclaredSize::Inherit => Ok(base_size.unwrap_or(0)),
        DeclaredSize::Absolute(n) => Ok(n),
        DeclaredSize::Relative(n) => {
            let base_size = base_size.ok_or(LayoutError::MissingBase)?;
            let extra = checked_align(n).ok_or(LayoutError::SizeOverflow)?;
            base_offset(Some(base_size))?
                .checked_add(extra)
                .ok_or(LayoutError::SizeOverflow)
        }
    }
}
