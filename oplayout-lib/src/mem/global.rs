use core::alloc::Layout;
use std::alloc::{alloc, dealloc};

use super::manager::{Dealloc, Manager};

#[derive(Debug, Clone)]
pub struct Global();

pub const GLOBAL: Global = Global();

impl Dealloc for Global {
    #[inline(always)]
    unsafe fn dealloc(ptr: *mut u8, layout: Layout) {
        dealloc(ptr, layout)
    }
}

impl Manager for Global {
    type Dealloc = Global;
    #[inline(always)]
    unsafe fn alloc(self, layout: Layout) -> *mut u8 {
        alloc(layout)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::{
        class::{create::create_class, ClassSpec},
        layout::align::MAX_ALIGN,
        mem::manager::Manager,
    };

    use super::GLOBAL;

    #[test]
    #[wasm_bindgen_test]
    fn test_new() {
        let class = Arc::new(create_class(ClassSpec::new("A").extra_size(24)).unwrap());
        {
            let mut x = GLOBAL.instance_new(&class, 0).unwrap();
            assert_eq!(Arc::strong_count(&class), 2);
            assert_eq!(x.instance().as_ptr() as usize % MAX_ALIGN, 0);
            assert_eq!(x.bytes(), &[0u8; 24]);
        }
        assert_eq!(Arc::strong_count(&class), 1);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_empty_class() {
        let class = Arc::new(create_class(ClassSpec::new("Empty")).unwrap());
        let mut x = GLOBAL.instance_new(&class, 3).unwrap();
        assert!(x.bytes().is_empty());
        assert_eq!(x.item_count(), 3);
    }
}
