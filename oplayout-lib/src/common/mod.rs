pub mod usize;
