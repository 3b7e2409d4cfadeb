use crate::{
    error::{LayoutError, LayoutResult},
    layout::size::{base_offset, resolve_instance_size, DeclaredSize},
};

use super::{
    member::{rewrite_offsets, ResolvedMembers},
    ClassDescriptor, ClassFlags, ClassSpec,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreationState {
    Unresolved,
    SizeResolved,
    OffsetsResolved,
    Ready,
}

#[derive(Debug)]
pub struct SizeResolved {
    spec: ClassSpec,
    declared: DeclaredSize,
    instance_size: usize,
    base_offset: usize,
}

#[derive(Debug)]
pub struct OffsetsResolved {
    size: SizeResolved,
    members: ResolvedMembers,
}

/// One class creation. Each [`Creation::step`] performs a single transition;
/// an error ends the creation and nothing is produced.
#[derive(Debug)]
pub enum Creation {
    Unresolved(ClassSpec),
    SizeResolved(SizeResolved),
    OffsetsResolved(OffsetsResolved),
    Ready(ClassDescriptor),
}

impl Creation {
    #[inline(always)]
    pub fn new(spec: ClassSpec) -> Self {
        Creation::Unresolved(spec)
    }
    pub fn state(&self) -> CreationState {
        match self {
            Creation::Unresolved(_) => CreationState::Unresolved,
            Creation::SizeResolved(_) => CreationState::SizeResolved,
            Creation::OffsetsResolved(_) => CreationState::OffsetsResolved,
            Creation::Ready(_) => CreationState::Ready,
        }
    }
    pub fn name(&self) -> &str {
        match self {
            Creation::Unresolved(spec) => &spec.name,
            Creation::SizeResolved(s) => &s.spec.name,
            Creation::OffsetsResolved(o) => &o.size.spec.name,
            Creation::Ready(d) => d.name(),
        }
    }
    pub fn step(self) -> LayoutResult<Self> {
        let next = match self {
            Creation::Unresolved(spec) => Creation::SizeResolved(resolve_size(spec)?),
            Creation::SizeResolved(size) => Creation::OffsetsResolved(resolve_offsets(size)?),
            Creation::OffsetsResolved(offsets) => Creation::Ready(finalize(offsets)?),
            ready @ Creation::Ready(_) => ready,
        };
        log::debug!("class `{}`: {:?}", next.name(), next.state());
        Ok(next)
    }
    pub fn finish(mut self) -> LayoutResult<ClassDescriptor> {
        let name = self.name().to_string();
        loop {
            self = self.step().inspect_err(|e| {
                log::warn!("class `{name}` rejected: {e}");
            })?;
            if let Creation::Ready(descriptor) = self {
                return Ok(descriptor);
            }
        }
    }
}

fn resolve_size(spec: ClassSpec) -> LayoutResult<SizeResolved> {
    let declared = DeclaredSize::from(spec.extra_size);
    let base_size = spec.base.as_ref().map(|b| b.instance_size());
    let instance_size = resolve_instance_size(declared, base_size)?;
    if let (DeclaredSize::Absolute(size), Some(base)) = (declared, spec.base.as_deref()) {
        // relative regions and trailing items of the bases are located inside the base size
        let shrinks = size < base.instance_size()
            && (base.items_at_end() || base.ancestors().any(ClassDescriptor::is_relative));
        if shrinks {
            return Err(LayoutError::AbsoluteSizeTooSmall {
                size,
                base_size: base.instance_size(),
            });
        }
    }
    let base_offset = base_offset(base_size)?;
    Ok(SizeResolved {
        spec,
        declared,
        instance_size,
        base_offset,
    })
}

fn resolve_offsets(size: SizeResolved) -> LayoutResult<OffsetsResolved> {
    let members = rewrite_offsets(&size.spec.members, size.declared, size.base_offset)?;
    Ok(OffsetsResolved { size, members })
}

fn resolve_item_size(spec: &ClassSpec, declared: DeclaredSize) -> LayoutResult<(usize, ClassFlags)> {
    let base_item_size = spec.base.as_ref().map_or(0, |b| b.item_size());
    let base_flags = spec.base.as_ref().map_or(ClassFlags::NONE, |b| b.flags());
    let mut flags = spec.flags.union(base_flags);
    let item_size = match spec.item_size {
        0 => base_item_size,
        n if n < 0 => return Err(LayoutError::UnsupportedRelativeItemSize),
        n => {
            if base_item_size > 0 {
                return Err(LayoutError::DuplicateItemStorage);
            }
            n.unsigned_abs()
        }
    };
    if declared.is_relative() {
        if spec.item_size > 0 {
            flags = flags.union(ClassFlags::ITEMS_AT_END);
        } else if base_item_size > 0 && !base_flags.contains(ClassFlags::ITEMS_AT_END) {
            return Err(LayoutError::ItemsNotAtEnd);
        }
    }
    Ok((item_size, flags))
}

fn finalize(offsets: OffsetsResolved) -> LayoutResult<ClassDescriptor> {
    let OffsetsResolved { size, members } = offsets;
    let (item_size, flags) = resolve_item_size(&size.spec, size.declared)?;
    let ClassSpec {
        name,
        extra_size,
        base,
        ..
    } = size.spec;
    Ok(ClassDescriptor {
        name,
        base,
        declared_extra_size: extra_size,
        instance_size: size.instance_size,
        item_size,
        base_offset: size.base_offset,
        flags,
        members: members.members,
        special: members.special,
    })
}

pub fn create_class(spec: ClassSpec) -> LayoutResult<ClassDescriptor> {
    Creation::new(spec).finish()
}
