// src/lib.rs
//! # Shared Typed Buffers and Table Accessors
//!
//! Reference-counted memory blocks that are either owned or borrowed, plus
//! row and column accessors that read tables into such blocks without a copy
//! whenever the table's layout and data type allow it.
//!
//! Features:
//! - [`Buffer<T>`]: a typed, shareable view of a block with an explicit
//!   mutable/immutable capability and a deleter that runs exactly once
//! - [`MemoryContext`]: lock-free caching allocator the buffers draw blocks from
//! - [`RowAccessor`] / [`ColumnAccessor`]: typed reads out of any [`Table`],
//!   aliasing table memory or converting cells as needed
//! - Optional secure wiping of released blocks using `zeroize`
//!
//! # Example
//!
//! ```
//! use blockbuf::prelude::*;
//!
//! let ctx = MemoryContext::default();
//! let table = HomogenTable::from_vec(vec![1i32, 2, 3, 4, 5, 6], 2, 3, DataLayout::RowMajor)?;
//!
//! let rows = RowAccessor::<f32>::new(&table)?.pull(&ctx, Range::all(), AllocKind::Host)?;
//! assert_eq!(rows.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! # Ok::<(), BufferError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_safety_doc)]

pub mod buffer;
pub mod element;
pub mod error;
pub mod memory;
pub mod table;

// Re-export main types
pub use buffer::Buffer;
pub use element::{DataType, Element, Scalar};
pub use error::{BufferError, Result};
pub use memory::{AllocKind, ContextConfig, ContextStats, MemoryContext};
pub use table::{
    Capabilities, ColumnAccessor, DataLayout, EmptyTable, FeatureType, HomogenTable, Range,
    RawView, RowAccessor, Table, TableKind, TableMetadata,
};

/// Commonly used imports.
pub mod prelude {
    pub use crate::buffer::Buffer;
    pub use crate::element::{DataType, Element, Scalar};
    pub use crate::error::{BufferError, Result};
    pub use crate::memory::{AllocKind, ContextConfig, ContextStats, MemoryContext};
    pub use crate::table::{
        ColumnAccessor, DataLayout, EmptyTable, FeatureType, HomogenTable, Range, RowAccessor,
        Table, TableMetadata,
    };
}
