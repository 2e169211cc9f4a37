// src/table/row_accessor.rs
//! Row-wise reads from a table.

use super::common::{Range, Table};
use super::pull::pull_block;
use crate::buffer::Buffer;
use crate::element::Element;
use crate::error::{BufferError, Result};
use crate::memory::{AllocKind, MemoryContext};
use std::marker::PhantomData;

/// Pulls blocks of rows out of a table as contiguous row-major `T` values.
///
/// If the table stores the requested rows contiguously as `T`, the returned
/// buffer is an immutable view of the table's memory. Otherwise the cells are
/// converted into a mutable block.
///
/// # Examples
///
/// ```
/// use blockbuf::prelude::*;
///
/// let table = HomogenTable::from_vec(vec![1i32, 2, 3, 4, 5, 6], 3, 2, DataLayout::RowMajor)?;
/// let ctx = MemoryContext::default();
///
/// let rows = RowAccessor::<f64>::new(&table)?.pull(&ctx, Range::new(1, -1), AllocKind::Host)?;
/// assert_eq!(rows.as_slice(), &[3.0, 4.0, 5.0, 6.0]);
/// # Ok::<(), BufferError>(())
/// ```
pub struct RowAccessor<'a, T> {
    table: &'a dyn Table,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Element> RowAccessor<'a, T> {
    /// Binds an accessor to `table`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::UnsupportedCapability`] if the table has no row access.
    pub fn new(table: &'a dyn Table) -> Result<Self> {
        if !table.capabilities().row_access {
            return Err(BufferError::UnsupportedCapability(format!(
                "{:?} table does not support row access",
                table.kind()
            )));
        }
        Ok(Self {
            table,
            _marker: PhantomData,
        })
    }

    /// Reads `rows` into a new buffer of `rows * column_count` values.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `rows` falls outside the table
    /// and propagates allocation errors.
    pub fn pull(&self, ctx: &MemoryContext, rows: Range, kind: AllocKind) -> Result<Buffer<T>> {
        let mut block = Buffer::new();
        self.pull_into(ctx, &mut block, rows, kind)?;
        Ok(block)
    }

    /// Reads `rows` into `block`, writing in place when `block` holds a
    /// mutable, unshared block with enough capacity.
    ///
    /// Returns the values now held by `block`.
    pub fn pull_into<'b>(
        &self,
        ctx: &MemoryContext,
        block: &'b mut Buffer<T>,
        rows: Range,
        kind: AllocKind,
    ) -> Result<&'b [T]> {
        let rows = rows.resolve(self.table.row_count())?;
        let columns = self.table.column_count();
        let count = rows.len().checked_mul(columns).ok_or_else(|| {
            BufferError::AllocationFailure("row block size overflows".into())
        })?;

        let direct = if count > 0 {
            self.table.row_block(rows.clone())
        } else {
            None
        };
        let table = self.table;
        pull_block(ctx, block, count, kind, direct, |out| {
            for (chunk, row) in out.chunks_exact_mut(columns).zip(rows) {
                for (column, value) in chunk.iter_mut().enumerate() {
                    *value = T::from_scalar(table.read_cell(row, column)?);
                }
            }
            Ok(())
        })?;
        Ok(block.as_slice())
    }
}
