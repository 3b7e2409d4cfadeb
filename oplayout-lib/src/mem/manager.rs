use core::alloc::Layout;
use std::{alloc::handle_alloc_error, sync::Arc};

use crate::{class::ClassDescriptor, error::LayoutResult};

use super::instance::{Instance, InstanceHeader, InstanceRef, HEADER_LAYOUT};

pub trait Dealloc {
    unsafe fn dealloc(ptr: *mut u8, layout: Layout);
}

/// Block = (InstanceHeader, instance bytes, items)
pub trait Manager: Sized {
    // required:
    type Dealloc: Dealloc;
    unsafe fn alloc(self, layout: Layout) -> *mut u8;
    // optional:
    /// Allocates a zeroed instance of `class` with room for `item_count` items.
    fn instance_new(
        self,
        class: &Arc<ClassDescriptor>,
        item_count: usize,
    ) -> LayoutResult<InstanceRef<Self::Dealloc>> {
        let layout = InstanceHeader::block_layout(class, item_count)?;
        unsafe {
            let p = self.alloc(layout);
            if p.is_null() {
                handle_alloc_error(layout);
            }
            let header = p as *mut InstanceHeader;
            header.write(InstanceHeader {
                class: class.clone(),
                item_count,
                block_size: layout.size(),
            });
            let instance = HEADER_LAYOUT.to_adjacent_mut(header);
            instance.write_bytes(0, layout.size() - HEADER_LAYOUT.size);
            log::debug!(
                "new `{}` instance, {} items, {} bytes",
                class.name(),
                item_count,
                layout.size()
            );
            Ok(InstanceRef::new(Instance::from_ptr(instance)))
        }
    }
}
