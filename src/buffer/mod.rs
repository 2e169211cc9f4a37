// src/buffer/mod.rs
//! Reference-counted typed buffer implementation

pub mod core;
pub(crate) mod ops;
pub(crate) mod unsafe_ops;

pub use core::Buffer;
