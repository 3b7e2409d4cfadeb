pub mod align;
pub mod locate;
pub mod size;

/// Operations available to every extension, whatever runtime build it is compiled against.
pub mod stable {
    pub use super::locate::{private_data, private_data_size};
}

/// Operations for callers that accept a stricter compatibility contract.
/// Includes everything from [`super::stable`].
pub mod unstable {
    pub use super::locate::{item_data, try_item_data};
    pub use super::stable::*;
}
