pub const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// Rounds `value` up to a multiple of `align`, which must be a power of two.
pub const fn align_to(value: usize, align: usize) -> usize {
    let mask = align - 1;
    (value + mask) & !mask
}

pub const fn checked_align_to(value: usize, align: usize) -> Option<usize> {
    let mask = align - 1;
    match value.checked_add(mask) {
        Some(v) => Some(v & !mask),
        None => None,
    }
}
