// src/table/column_accessor.rs
//! Column-wise reads from a table.

use super::common::{Range, Table};
use super::pull::pull_block;
use crate::buffer::Buffer;
use crate::element::Element;
use crate::error::{BufferError, Result};
use crate::memory::{AllocKind, MemoryContext};
use std::marker::PhantomData;

/// Pulls a range of rows of one column out of a table as contiguous `T` values.
///
/// Column-major tables with a matching data type are read without a copy.
///
/// # Examples
///
/// ```
/// use blockbuf::prelude::*;
///
/// let table = HomogenTable::from_vec(vec![1.0f64, 2.0, 3.0, 4.0], 2, 2, DataLayout::RowMajor)?;
/// let ctx = MemoryContext::default();
///
/// let column = ColumnAccessor::<f32>::new(&table)?.pull(&ctx, 1, Range::all(), AllocKind::Host)?;
/// assert_eq!(column.as_slice(), &[2.0, 4.0]);
/// # Ok::<(), BufferError>(())
/// ```
pub struct ColumnAccessor<'a, T> {
    table: &'a dyn Table,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Element> ColumnAccessor<'a, T> {
    /// Binds an accessor to `table`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::UnsupportedCapability`] if the table has no column access.
    pub fn new(table: &'a dyn Table) -> Result<Self> {
        if !table.capabilities().column_access {
            return Err(BufferError::UnsupportedCapability(format!(
                "{:?} table does not support column access",
                table.kind()
            )));
        }
        Ok(Self {
            table,
            _marker: PhantomData,
        })
    }

    /// Reads `rows` of `column` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `column` or `rows` falls outside
    /// the table and propagates allocation errors.
    pub fn pull(
        &self,
        ctx: &MemoryContext,
        column: usize,
        rows: Range,
        kind: AllocKind,
    ) -> Result<Buffer<T>> {
        let mut block = Buffer::new();
        self.pull_into(ctx, &mut block, column, rows, kind)?;
        Ok(block)
    }

    /// Reads `rows` of `column` into `block`, writing in place when possible.
    pub fn pull_into<'b>(
        &self,
        ctx: &MemoryContext,
        block: &'b mut Buffer<T>,
        column: usize,
        rows: Range,
        kind: AllocKind,
    ) -> Result<&'b [T]> {
        let columns = self.table.column_count();
        if column >= columns {
            return Err(BufferError::OutOfRange {
                index: column as i64,
                bound: columns,
            });
        }
        let rows = rows.resolve(self.table.row_count())?;
        let count = rows.len();

        let direct = if count > 0 {
            self.table.column_block(column, rows.clone())
        } else {
            None
        };
        let table = self.table;
        pull_block(ctx, block, count, kind, direct, |out| {
            for (value, row) in out.iter_mut().zip(rows) {
                *value = T::from_scalar(table.read_cell(row, column)?);
            }
            Ok(())
        })?;
        Ok(block.as_slice())
    }
}
