// src/memory/mod.rs
//! Memory contexts: where and how buffer blocks are allocated and released.

pub(crate) mod block;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod stats;

pub use config::ContextConfig;
pub use context::{AllocKind, MemoryContext};
pub use stats::ContextStats;
