use core::{alloc::Layout, cell::Cell, marker::PhantomData};

use crate::common::usize::align_to;

use super::manager::{Dealloc, Manager};

/// A bump allocator over a caller-owned buffer. Memory is only reclaimed with the buffer.
#[derive(Debug)]
pub struct Arena<'a> {
    begin: Cell<usize>,
    end: usize,
    _0: PhantomData<&'a mut [u8]>,
}

impl<'a> Arena<'a> {
    pub fn new(range: &'a mut [u8]) -> Self {
        let begin = range.as_mut_ptr() as usize;
        Self {
            begin: Cell::new(begin),
            end: begin + range.len(),
            _0: PhantomData,
        }
    }
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.begin.get())
    }
}

pub struct NoDealloc();

impl Dealloc for NoDealloc {
    #[inline(always)]
    unsafe fn dealloc(_: *mut u8, _: Layout) {}
}

impl<'a> Manager for &'a Arena<'a> {
    type Dealloc = NoDealloc;
    unsafe fn alloc(self, layout: Layout) -> *mut u8 {
        let current = align_to(self.begin.get(), layout.align());
        let end = current + layout.size();
        if end > self.end {
            panic!("out of memory");
        }
        self.begin.set(end);
        current as *mut u8
    }
}
