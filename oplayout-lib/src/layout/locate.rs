use crate::{class::ClassDescriptor, mem::instance::Instance};

/// Address of the private region of `class` inside `instance`.
///
/// # Safety
///
/// `class` must be created with a relative size and be the class of `instance`
/// or one of its bases. Nothing is checked.
#[inline(always)]
pub unsafe fn private_data(instance: Instance, class: &ClassDescriptor) -> *mut u8 {
    instance.as_ptr().add(class.base_offset())
}

#[inline(always)]
pub fn private_data_size(class: &ClassDescriptor) -> usize {
    class.instance_size().saturating_sub(class.base_offset())
}

/// Address of the items of `instance`, right after the instance size of its runtime class.
///
/// # Safety
///
/// `instance` must be alive, and every class of its hierarchy that touches the items
/// must locate them this way rather than at a fixed offset.
#[inline(always)]
pub unsafe fn item_data(instance: Instance) -> *mut u8 {
    instance.as_ptr().add(instance.class().instance_size())
}

/// Like [`item_data`], but only for hierarchies created with items at the end.
///
/// # Safety
///
/// `instance` must be alive.
pub unsafe fn try_item_data(instance: Instance) -> Option<*mut u8> {
    if instance.class().items_at_end() {
        Some(item_data(instance))
    } else {
        None
    }
}
