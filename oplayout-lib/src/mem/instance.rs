use core::{
    alloc::Layout,
    marker::PhantomData,
    ptr::{drop_in_place, NonNull},
    slice::from_raw_parts_mut,
};
use std::sync::Arc;

use crate::{
    class::ClassDescriptor,
    error::{LayoutError, LayoutResult},
    layout::{
        align::MAX_ALIGN,
        locate::{item_data, private_data, private_data_size},
    },
};

use super::{field_layout::FieldLayout, manager::Dealloc};

/// Stored right before the instance address.
#[derive(Debug)]
pub struct InstanceHeader {
    pub class: Arc<ClassDescriptor>,
    pub item_count: usize,
    pub block_size: usize,
}

pub const HEADER_LAYOUT: FieldLayout<InstanceHeader, u8> = FieldLayout::align_to(MAX_ALIGN);

impl InstanceHeader {
    pub fn block_layout(class: &ClassDescriptor, item_count: usize) -> LayoutResult<Layout> {
        class
            .item_size()
            .checked_mul(item_count)
            .and_then(|items| items.checked_add(class.instance_size()))
            .and_then(|size| HEADER_LAYOUT.layout(size))
            .ok_or(LayoutError::SizeOverflow)
    }
}

/// Address of an instance allocated by a [`super::manager::Manager`].
/// The address is aligned to [`MAX_ALIGN`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Instance(NonNull<u8>);

impl Instance {
    #[inline(always)]
    pub unsafe fn from_ptr(p: *mut u8) -> Self {
        Self(NonNull::new_unchecked(p))
    }
    #[inline(always)]
    pub const fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }
    /// # Safety
    ///
    /// The instance must be allocated by a manager and alive for `'a`.
    #[inline(always)]
    pub unsafe fn header<'a>(self) -> &'a InstanceHeader {
        &*HEADER_LAYOUT.from_adjacent(self.as_ptr())
    }
    /// The runtime class of the instance.
    #[inline(always)]
    pub unsafe fn class<'a>(self) -> &'a ClassDescriptor {
        &self.header().class
    }
    #[inline(always)]
    pub unsafe fn item_count(self) -> usize {
        self.header().item_count
    }
}

/// Owns an instance, drops its header and returns its memory on drop.
#[derive(Debug)]
pub struct InstanceRef<D: Dealloc> {
    instance: Instance,
    _0: PhantomData<D>,
}

impl<D: Dealloc> InstanceRef<D> {
    #[inline(always)]
    pub unsafe fn new(instance: Instance) -> Self {
        Self {
            instance,
            _0: PhantomData,
        }
    }
    #[inline(always)]
    pub fn instance(&self) -> Instance {
        self.instance
    }
    #[inline(always)]
    pub fn class(&self) -> &ClassDescriptor {
        unsafe { self.instance.class() }
    }
    #[inline(always)]
    pub fn item_count(&self) -> usize {
        unsafe { self.instance.item_count() }
    }
    /// The whole instance, items included.
    pub fn bytes(&mut self) -> &mut [u8] {
        let class = self.class();
        let len = class.instance_size() + class.item_size() * self.item_count();
        unsafe { from_raw_parts_mut(self.instance.as_ptr(), len) }
    }
    /// The private region of `class`, which must be a relative class of this instance's hierarchy.
    pub fn private_bytes(&mut self, class: &ClassDescriptor) -> LayoutResult<&mut [u8]> {
        if !class.is_relative() {
            return Err(LayoutError::NotRelative);
        }
        if !self.class().is_subclass_of(class) {
            return Err(LayoutError::NotInHierarchy);
        }
        if class.instance_size() > self.class().instance_size() {
            return Err(LayoutError::PrivateOutOfBounds);
        }
        unsafe {
            Ok(from_raw_parts_mut(
                private_data(self.instance, class),
                private_data_size(class),
            ))
        }
    }
    pub fn item_bytes(&mut self) -> LayoutResult<&mut [u8]> {
        let class = self.class();
        if !class.items_at_end() {
            return Err(LayoutError::ItemsNotAtEnd);
        }
        let len = class.item_size() * self.item_count();
        unsafe { Ok(from_raw_parts_mut(item_data(self.instance), len)) }
    }
}

impl<D: Dealloc> Drop for InstanceRef<D> {
    fn drop(&mut self) {
        unsafe {
            let header = HEADER_LAYOUT.from_adjacent_mut(self.instance.as_ptr());
            let layout = Layout::from_size_align_unchecked((*header).block_size, HEADER_LAYOUT.align);
            drop_in_place(header);
            D::dealloc(header as *mut u8, layout);
        }
    }
}
