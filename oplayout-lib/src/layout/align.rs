use core::mem::align_of;

use crate::common::usize::{align_to, checked_align_to, max};

/// The largest alignment a fundamental type of the platform requires.
/// Every instance address and every offset this crate computes is a multiple of it.
pub const MAX_ALIGN: usize = max(
    max(align_of::<u128>(), align_of::<f64>()),
    max(align_of::<u64>(), align_of::<usize>()),
);

const _: () = assert!(MAX_ALIGN.is_power_of_two());

#[inline(always)]
pub const fn align(size: usize) -> usize {
    align_to(size, MAX_ALIGN)
}

#[inline(always)]
pub const fn checked_align(size: usize) -> Option<usize> {
    checked_align_to(size, MAX_ALIGN)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::{align, checked_align, MAX_ALIGN};

    const _: () = assert!(align(0) == 0);
    const _: () = assert!(align(1) == MAX_ALIGN);
    const _: () = assert!(align(MAX_ALIGN) == MAX_ALIGN);
    const _: () = assert!(MAX_ALIGN >= 8);

    #[test]
    #[wasm_bindgen_test]
    fn test_align() {
        assert_eq!(align(32), 32);
        assert_eq!(align(33), 32 + MAX_ALIGN);
        assert_eq!(align(MAX_ALIGN + 1), MAX_ALIGN * 2);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_checked_align() {
        assert_eq!(checked_align(24), Some(align(24)));
        assert_eq!(checked_align(usize::MAX), None);
        assert_eq!(checked_align(usize::MAX - MAX_ALIGN + 1), Some(usize::MAX - MAX_ALIGN + 1));
    }

    proptest! {
        #[test]
        fn prop_align(b in 0usize..(usize::MAX / 2)) {
            let a = align(b);
            prop_assert_eq!(a % MAX_ALIGN, 0);
            prop_assert!(a >= b);
            prop_assert!(a < b + MAX_ALIGN);
        }
    }
}
