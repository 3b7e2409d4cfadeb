#![allow(clippy::missing_safety_doc)]
pub mod app;
pub mod class;
pub mod common;
pub mod error;
pub mod layout;
pub mod mem;
