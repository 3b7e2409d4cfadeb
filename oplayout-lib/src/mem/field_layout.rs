use core::{
    alloc::Layout,
    marker::PhantomData,
    mem::{align_of, size_of},
};

use crate::common::usize::{align_to, max};

/// Layout of a `T` followed by an adjacent `A` that starts at `size`.
pub struct FieldLayout<T, A> {
    pub align: usize,
    pub size: usize,
    _0: PhantomData<(T, A)>,
}

impl<T, A> FieldLayout<T, A> {
    pub const fn align_to(adjacent_align: usize) -> FieldLayout<T, A> {
        assert!(adjacent_align.is_power_of_two());
        assert!(adjacent_align >= align_of::<A>());
        FieldLayout {
            align: max(align_of::<T>(), adjacent_align),
            size: align_to(size_of::<T>(), adjacent_align),
            _0: PhantomData,
        }
    }
    /// Layout of the `T` together with `adjacent_size` bytes of `A`.
    pub fn layout(&self, adjacent_size: usize) -> Option<Layout> {
        let size = self.size.checked_add(adjacent_size)?;
        Layout::from_size_align(size, self.align).ok()
    }
    #[inline(always)]
    pub fn to_adjacent(&self, p: *const T) -> *const A {
        (p as *const u8).wrapping_add(self.size) as *const A
    }
    #[inline(always)]
    pub fn to_adjacent_mut(&self, p: *mut T) -> *mut A {
        (p as *mut u8).wrapping_add(self.size) as *mut A
    }
    #[inline(always)]
    pub fn from_adjacent(&self, p: *const A) -> *const T {
        (p as *const u8).wrapping_sub(self.size) as *const T
    }
    #[inline(always)]
    pub fn from_adjacent_mut(&self, p: *mut A) -> *mut T {
        (p as *mut u8).wrapping_sub(self.size) as *mut T
    }
}
