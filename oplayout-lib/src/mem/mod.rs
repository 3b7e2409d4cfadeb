pub mod arena;
pub mod field_layout;
pub mod global;
pub mod instance;
pub mod manager;
