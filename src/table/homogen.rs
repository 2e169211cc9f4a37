// src/table/homogen.rs
//! Homogeneous tables: every cell has the same data type.

use super::common::{
    Capabilities, DataLayout, RawView, Table, TableKind, TableMetadata,
};
use crate::buffer::Buffer;
use crate::element::{DataType, Element, Scalar};
use crate::error::{BufferError, Result};

/// A dense table whose cells share one data type, stored row- or column-major
/// in a single block.
///
/// The table holds its block through a [`Buffer`], so it shares ownership
/// with the buffer it was built from and with every zero-copy view pulled
/// out of it. Cloning the table shares the block too.
///
/// # Examples
///
/// ```
/// use blockbuf::prelude::*;
///
/// let table = HomogenTable::from_vec(
///     vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0],
///     2,
///     3,
///     DataLayout::RowMajor,
/// )?;
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.column_count(), 3);
/// assert_eq!(table.data_as::<f32>().unwrap()[4], 5.0);
/// # Ok::<(), BufferError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HomogenTable {
    storage: Buffer<u8>,
    data_type: DataType,
    row_count: usize,
    column_count: usize,
    layout: DataLayout,
    metadata: TableMetadata,
}

impl HomogenTable {
    /// Creates a table with zero rows and columns.
    pub fn new() -> Self {
        Self {
            storage: Buffer::new(),
            data_type: DataType::Float32,
            row_count: 0,
            column_count: 0,
            layout: DataLayout::RowMajor,
            metadata: TableMetadata::default(),
        }
    }

    /// Creates a table over the block of `data`, sharing its ownership.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if `layout` is
    /// [`DataLayout::Unknown`] or `row_count * column_count` differs from the
    /// buffer's element count.
    pub fn from_buffer<T: Element>(
        data: Buffer<T>,
        row_count: usize,
        column_count: usize,
        layout: DataLayout,
    ) -> Result<Self> {
        if layout == DataLayout::Unknown {
            return Err(BufferError::InvalidArgument(
                "homogen table layout must be row-major or column-major".into(),
            ));
        }
        if row_count.checked_mul(column_count) != Some(data.count()) {
            return Err(BufferError::InvalidArgument(format!(
                "{}x{} table does not match {} elements",
                row_count,
                column_count,
                data.count()
            )));
        }
        let mut storage = data.cast_view::<u8>(0, data.size())?;
        storage.freeze();
        Ok(Self {
            storage,
            data_type: T::DATA_TYPE,
            row_count,
            column_count,
            layout,
            metadata: TableMetadata::homogeneous(T::DATA_TYPE, column_count),
        })
    }

    /// Creates a table that owns the allocation of `data`.
    pub fn from_vec<T: Element>(
        data: Vec<T>,
        row_count: usize,
        column_count: usize,
        layout: DataLayout,
    ) -> Result<Self> {
        Self::from_buffer(Buffer::from_vec(data), row_count, column_count, layout)
    }

    /// Creates a table over caller-owned memory without taking ownership.
    ///
    /// # Safety
    ///
    /// Caller MUST guarantee: `data` points to `row_count * column_count`
    /// initialized elements that outlive the table and every buffer pulled
    /// from it without a copy.
    pub unsafe fn wrap<T: Element>(
        data: *const T,
        row_count: usize,
        column_count: usize,
        layout: DataLayout,
    ) -> Result<Self> {
        let count = row_count.checked_mul(column_count).ok_or_else(|| {
            BufferError::InvalidArgument("table shape overflows".into())
        })?;
        let buffer = unsafe { Buffer::wrap(data, count)? };
        Self::from_buffer(buffer, row_count, column_count, layout)
    }

    /// Pointer to the table's block; null for an empty table.
    pub fn data(&self) -> *const u8 {
        self.storage.data()
    }

    /// The cells as `T`, or `None` if `T` is not the table's data type.
    pub fn data_as<T: Element>(&self) -> Option<&[T]> {
        if T::DATA_TYPE != self.data_type {
            return None;
        }
        bytemuck::try_cast_slice(self.storage.as_slice()).ok()
    }

    /// Data type shared by every cell.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Bytes of `count` elements starting at element `first`.
    fn view(&self, first: usize, count: usize) -> Option<RawView> {
        let width = self.data_type.size_in_bytes();
        let bytes = self.storage.cast_view::<u8>(first * width, count * width).ok()?;
        Some(RawView {
            data_type: self.data_type,
            bytes,
        })
    }

    fn cell_index(&self, row: usize, column: usize) -> usize {
        match self.layout {
            DataLayout::ColumnMajor => column * self.row_count + row,
            _ => row * self.column_count + column,
        }
    }
}

impl Default for HomogenTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Table for HomogenTable {
    fn kind(&self) -> TableKind {
        TableKind::Homogen
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn data_layout(&self) -> DataLayout {
        self.layout
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn row_block(&self, rows: std::ops::Range<usize>) -> Option<RawView> {
        match self.layout {
            DataLayout::RowMajor => self.view(
                rows.start * self.column_count,
                rows.len() * self.column_count,
            ),
            DataLayout::ColumnMajor if self.column_count == 1 => {
                self.view(rows.start, rows.len())
            }
            _ => None,
        }
    }

    fn column_block(&self, column: usize, rows: std::ops::Range<usize>) -> Option<RawView> {
        if column >= self.column_count {
            return None;
        }
        match self.layout {
            DataLayout::ColumnMajor => {
                self.view(column * self.row_count + rows.start, rows.len())
            }
            DataLayout::RowMajor if self.column_count == 1 => self.view(rows.start, rows.len()),
            _ => None,
        }
    }

    fn read_cell(&self, row: usize, column: usize) -> Result<Scalar> {
        if row >= self.row_count {
            return Err(BufferError::OutOfRange {
                index: row as i64,
                bound: self.row_count,
            });
        }
        if column >= self.column_count {
            return Err(BufferError::OutOfRange {
                index: column as i64,
                bound: self.column_count,
            });
        }
        let width = self.data_type.size_in_bytes();
        let offset = self.cell_index(row, column) * width;
        Ok(Scalar::read(
            self.data_type,
            &self.storage.as_slice()[offset..offset + width],
        ))
    }
}
