// src/table/mod.rs
//! Tables and the accessors that pull typed blocks out of them.
//!
//! A [`Table`] describes its shape, per-feature types and, optionally, where
//! its cells live in memory. [`RowAccessor`] and [`ColumnAccessor`] turn a
//! [`Range`] of rows into a [`Buffer`](crate::Buffer) of the requested element
//! type: a view of the table's own memory when the layout and type allow it,
//! a converted copy otherwise.

pub mod column_accessor;
pub mod common;
pub mod homogen;
pub(crate) mod pull;
pub mod row_accessor;

pub use column_accessor::ColumnAccessor;
pub use common::{
    Capabilities, DataLayout, EmptyTable, FeatureType, Range, RawView, Table, TableKind,
    TableMetadata,
};
pub use homogen::HomogenTable;
pub use row_accessor::RowAccessor;
