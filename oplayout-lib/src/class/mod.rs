pub mod create;
pub mod member;
pub mod registry;

use core::ops::Range;
use std::sync::Arc;

use crate::layout::size::DeclaredSize;

use self::member::{MemberDef, SpecialOffsets};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassFlags(u32);

impl ClassFlags {
    pub const NONE: Self = Self(0);
    /// Item storage follows the full instance size of the runtime class,
    /// so every class of the hierarchy finds it through the item-data locator.
    pub const ITEMS_AT_END: Self = Self(1);
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    #[inline(always)]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// What a class author declares.
#[derive(Clone, Debug)]
pub struct ClassSpec {
    pub name: String,
    pub extra_size: isize,
    pub item_size: isize,
    pub flags: ClassFlags,
    pub members: Vec<MemberDef>,
    pub base: Option<Arc<ClassDescriptor>>,
}

impl ClassSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra_size: 0,
            item_size: 0,
            flags: ClassFlags::NONE,
            members: Vec::new(),
            base: None,
        }
    }
    pub fn base(mut self, base: &Arc<ClassDescriptor>) -> Self {
        self.base = Some(base.clone());
        self
    }
    pub fn extra_size(mut self, extra_size: isize) -> Self {
        self.extra_size = extra_size;
        self
    }
    pub fn item_size(mut self, item_size: isize) -> Self {
        self.item_size = item_size;
        self
    }
    pub fn items_at_end(mut self) -> Self {
        self.flags = self.flags.union(ClassFlags::ITEMS_AT_END);
        self
    }
    pub fn member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }
}

/// Resolved layout facts of a class. Immutable once created.
#[derive(Debug)]
pub struct ClassDescriptor {
    name: String,
    base: Option<Arc<ClassDescriptor>>,
    declared_extra_size: isize,
    instance_size: usize,
    item_size: usize,
    base_offset: usize,
    flags: ClassFlags,
    members: Vec<MemberDef>,
    special: SpecialOffsets,
}

impl ClassDescriptor {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[inline(always)]
    pub fn base(&self) -> Option<&Arc<ClassDescriptor>> {
        self.base.as_ref()
    }
    #[inline(always)]
    pub const fn declared_extra_size(&self) -> isize {
        self.declared_extra_size
    }
    #[inline(always)]
    pub fn declared_size(&self) -> DeclaredSize {
        self.declared_extra_size.into()
    }
    #[inline(always)]
    pub fn is_relative(&self) -> bool {
        self.declared_size().is_relative()
    }
    #[inline(always)]
    pub const fn instance_size(&self) -> usize {
        self.instance_size
    }
    #[inline(always)]
    pub const fn item_size(&self) -> usize {
        self.item_size
    }
    /// `align(base.instance_size)`, where the private region starts.
    #[inline(always)]
    pub const fn base_offset(&self) -> usize {
        self.base_offset
    }
    #[inline(always)]
    pub const fn flags(&self) -> ClassFlags {
        self.flags
    }
    #[inline(always)]
    pub const fn items_at_end(&self) -> bool {
        self.flags.contains(ClassFlags::ITEMS_AT_END)
    }
    #[inline(always)]
    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }
    #[inline(always)]
    pub const fn special(&self) -> &SpecialOffsets {
        &self.special
    }
    pub fn private_range(&self) -> Range<usize> {
        self.base_offset..self.instance_size.max(self.base_offset)
    }
    /// The class itself followed by its bases, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &ClassDescriptor> {
        let mut next = Some(self);
        core::iter::from_fn(move || {
            let current = next?;
            next = current.base.as_deref();
            Some(current)
        })
    }
    pub fn is_subclass_of(&self, class: &ClassDescriptor) -> bool {
        self.ancestors().any(|c| core::ptr::eq(c, class))
    }
    /// Finds a member declared by this class or, failing that, by the nearest base declaring it.
    pub fn lookup_member(&self, name: &str) -> Option<&MemberDef> {
        self.ancestors()
            .find_map(|c| c.members.iter().find(|m| m.name == name))
    }
}
