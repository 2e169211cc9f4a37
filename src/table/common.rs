// src/table/common.rs
//! Table interface, metadata and row ranges.

use crate::buffer::Buffer;
use crate::element::{DataType, Scalar};
use crate::error::{BufferError, Result};

/// A range of rows `[start_idx, end_idx)`.
///
/// A negative `end_idx` counts from the end of the container:
/// - `-1` means "through the last row" (the whole tail),
/// - any other `-n` stops `n` rows before the end.
///
/// # Examples
///
/// ```
/// use blockbuf::Range;
///
/// assert_eq!(Range::new(0, -1).element_count(5), 5);
/// assert_eq!(Range::new(1, -2).element_count(5), 2);
/// assert_eq!(Range::new(2, 4).element_count(10), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// The first index in the range
    pub start_idx: i64,
    /// The end index: exclusive if non-negative, relative to the end if negative
    pub end_idx: i64,
}

impl Range {
    /// Creates a range from start and end indices.
    pub const fn new(start_idx: i64, end_idx: i64) -> Self {
        Self { start_idx, end_idx }
    }

    /// The range covering every row.
    pub const fn all() -> Self {
        Self::new(0, -1)
    }

    /// Exclusive end index once `max_end_index` is known.
    fn end_index(&self, max_end_index: i64) -> i64 {
        match self.end_idx {
            -1 => max_end_index,
            end if end < 0 => max_end_index.saturating_add(end),
            end => end,
        }
    }

    /// The number of elements in the range for a sequence ending at `max_end_index`.
    pub fn element_count(&self, max_end_index: i64) -> i64 {
        self.end_index(max_end_index)
            .saturating_sub(self.start_idx)
            .max(0)
    }

    /// Resolves the range against a container of `row_count` rows.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if the start is negative, the end
    /// lies past `row_count` or before the start.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Range;
    ///
    /// assert_eq!(Range::new(1, -1).resolve(3).unwrap(), 1..3);
    /// assert!(Range::new(0, 4).resolve(3).is_err());
    /// ```
    pub fn resolve(&self, row_count: usize) -> Result<std::ops::Range<usize>> {
        let end = self.end_index(row_count as i64);
        if self.start_idx < 0 {
            return Err(BufferError::OutOfRange {
                index: self.start_idx,
                bound: row_count,
            });
        }
        if end < 0 || end > row_count as i64 {
            return Err(BufferError::OutOfRange {
                index: end,
                bound: row_count,
            });
        }
        if self.start_idx > end {
            return Err(BufferError::OutOfRange {
                index: self.start_idx,
                bound: end as usize,
            });
        }
        Ok(self.start_idx as usize..end as usize)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::all()
    }
}

impl From<std::ops::Range<usize>> for Range {
    /// Indices past `i64::MAX` saturate, so they stay out of range when resolved.
    fn from(rows: std::ops::Range<usize>) -> Self {
        let index = |i: usize| i64::try_from(i).unwrap_or(i64::MAX);
        Self::new(index(rows.start), index(rows.end))
    }
}

impl From<std::ops::RangeFull> for Range {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::all()
    }
}

/// Measurement scale of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    /// Unordered categories
    Nominal,
    /// Ordered categories
    Ordinal,
    /// Continuous values without a natural zero
    Interval,
    /// Continuous values with a natural zero
    Ratio,
}

impl FeatureType {
    /// Default feature type for values of `data_type`: interval for floating
    /// point, ordinal for integers.
    pub fn default_for(data_type: DataType) -> Self {
        if data_type.is_floating_point() {
            Self::Interval
        } else {
            Self::Ordinal
        }
    }
}

/// Physical order of table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataLayout {
    /// No contiguous layout
    #[default]
    Unknown,
    /// Rows are contiguous
    RowMajor,
    /// Columns are contiguous
    ColumnMajor,
}

/// Runtime id of a table implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// [`EmptyTable`]
    Empty,
    /// [`HomogenTable`](super::HomogenTable)
    Homogen,
    /// Table types defined outside this crate
    Custom(u64),
}

/// Kinds of access a table supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Rows can be pulled with a [`RowAccessor`](super::RowAccessor)
    pub row_access: bool,
    /// Columns can be pulled with a [`ColumnAccessor`](super::ColumnAccessor)
    pub column_access: bool,
}

impl Capabilities {
    /// Every access kind.
    pub const ALL: Self = Self {
        row_access: true,
        column_access: true,
    };

    /// Row access only.
    pub const ROWS: Self = Self {
        row_access: true,
        column_access: false,
    };
}

/// Per-feature data and feature types of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMetadata {
    data_types: Vec<DataType>,
    feature_types: Vec<FeatureType>,
}

impl TableMetadata {
    /// Creates metadata from per-feature data and feature types.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if the two lists differ in length.
    pub fn new(data_types: Vec<DataType>, feature_types: Vec<FeatureType>) -> Result<Self> {
        if data_types.len() != feature_types.len() {
            return Err(BufferError::InvalidArgument(format!(
                "{} data types but {} feature types",
                data_types.len(),
                feature_types.len()
            )));
        }
        Ok(Self {
            data_types,
            feature_types,
        })
    }

    /// Metadata for `feature_count` features of the same data type, with the
    /// default feature type for it.
    pub fn homogeneous(data_type: DataType, feature_count: usize) -> Self {
        Self {
            data_types: vec![data_type; feature_count],
            feature_types: vec![FeatureType::default_for(data_type); feature_count],
        }
    }

    /// The number of features described.
    pub fn feature_count(&self) -> usize {
        self.data_types.len()
    }

    /// Data type of feature `index`.
    pub fn data_type(&self, index: usize) -> Result<DataType> {
        self.data_types
            .get(index)
            .copied()
            .ok_or(BufferError::OutOfRange {
                index: index as i64,
                bound: self.data_types.len(),
            })
    }

    /// Feature type of feature `index`.
    pub fn feature_type(&self, index: usize) -> Result<FeatureType> {
        self.feature_types
            .get(index)
            .copied()
            .ok_or(BufferError::OutOfRange {
                index: index as i64,
                bound: self.feature_types.len(),
            })
    }
}

/// Contiguous storage of one data type, viewed as bytes.
///
/// The byte buffer shares ownership with the table's storage, so a buffer
/// aliasing it stays valid after the table is dropped.
#[derive(Debug, Clone)]
pub struct RawView {
    /// Data type of the stored values
    pub data_type: DataType,
    /// Bytes of the values, in order
    pub bytes: Buffer<u8>,
}

/// Tabular data that accessors can read from.
///
/// Implementations report their shape and metadata, can optionally expose
/// contiguous storage for the zero-copy path, and must be able to read single
/// cells. Accessors never mutate a table and may read it from several threads.
pub trait Table: Send + Sync {
    /// Runtime id of the implementation.
    fn kind(&self) -> TableKind;

    /// The number of rows.
    fn row_count(&self) -> usize;

    /// The number of columns.
    fn column_count(&self) -> usize;

    /// Per-feature types.
    fn metadata(&self) -> &TableMetadata;

    /// Physical layout of the cells.
    fn data_layout(&self) -> DataLayout {
        DataLayout::Unknown
    }

    /// Access kinds the table supports.
    fn capabilities(&self) -> Capabilities;

    /// Whether the table holds any cells.
    fn has_data(&self) -> bool {
        self.row_count() > 0 && self.column_count() > 0
    }

    /// Contiguous row-major storage of exactly `rows`, if available.
    fn row_block(&self, _rows: std::ops::Range<usize>) -> Option<RawView> {
        None
    }

    /// Contiguous storage of `rows` of one column, if available.
    fn column_block(&self, _column: usize, _rows: std::ops::Range<usize>) -> Option<RawView> {
        None
    }

    /// Reads a single cell in its native data type.
    fn read_cell(&self, row: usize, column: usize) -> Result<Scalar>;
}

/// A table with no rows and no columns.
#[derive(Debug, Clone, Default)]
pub struct EmptyTable {
    metadata: TableMetadata,
}

impl EmptyTable {
    /// Creates the empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Table for EmptyTable {
    fn kind(&self) -> TableKind {
        TableKind::Empty
    }

    fn row_count(&self) -> usize {
        0
    }

    fn column_count(&self) -> usize {
        0
    }

    fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn read_cell(&self, row: usize, _column: usize) -> Result<Scalar> {
        Err(BufferError::OutOfRange {
            index: row as i64,
            bound: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_count() {
        assert_eq!(Range::new(0, -1).element_count(5), 5);
        assert_eq!(Range::new(1, -2).element_count(5), 2);
        assert_eq!(Range::new(2, 4).element_count(10), 2);
        assert_eq!(Range::new(4, -3).element_count(5), 0);
    }

    #[test]
    fn test_element_count_saturates() {
        assert_eq!(Range::new(i64::MIN, i64::MAX).element_count(5), i64::MAX);
        assert_eq!(Range::new(i64::MAX, -1).element_count(5), 0);
        assert_eq!(Range::new(0, -3).element_count(i64::MIN), 0);
    }

    #[test]
    fn test_from_large_usize_range() {
        let rows = Range::from(0..usize::MAX);
        assert_eq!(rows.end_idx, i64::MAX);
        assert!(matches!(
            rows.resolve(3),
            Err(BufferError::OutOfRange { index: i64::MAX, bound: 3 })
        ));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(Range::all().resolve(3).unwrap(), 0..3);
        assert_eq!(Range::new(1, -1).resolve(3).unwrap(), 1..3);
        assert_eq!(Range::new(1, -2).resolve(5).unwrap(), 1..3);
        assert_eq!(Range::from(1..3).resolve(3).unwrap(), 1..3);
        assert_eq!(Range::from(..).resolve(0).unwrap(), 0..0);
        assert_eq!(Range::new(3, 3).resolve(3).unwrap(), 3..3);
    }

    #[test]
    fn test_resolve_errors() {
        assert_eq!(
            Range::new(-1, 2).resolve(3),
            Err(BufferError::OutOfRange { index: -1, bound: 3 })
        );
        assert_eq!(
            Range::new(0, 4).resolve(3),
            Err(BufferError::OutOfRange { index: 4, bound: 3 })
        );
        assert_eq!(
            Range::new(0, -5).resolve(3),
            Err(BufferError::OutOfRange { index: -2, bound: 3 })
        );
        assert_eq!(
            Range::new(2, 1).resolve(3),
            Err(BufferError::OutOfRange { index: 2, bound: 1 })
        );
    }

    #[test]
    fn test_metadata() {
        let meta = TableMetadata::new(
            vec![DataType::Int32, DataType::Float64],
            vec![FeatureType::Nominal, FeatureType::Ratio],
        )
        .unwrap();
        assert_eq!(meta.feature_count(), 2);
        assert_eq!(meta.data_type(1).unwrap(), DataType::Float64);
        assert_eq!(meta.feature_type(0).unwrap(), FeatureType::Nominal);
        assert!(matches!(
            meta.data_type(2),
            Err(BufferError::OutOfRange { index: 2, bound: 2 })
        ));

        assert!(TableMetadata::new(vec![DataType::Int8], vec![]).is_err());
    }

    #[test]
    fn test_homogeneous_metadata_defaults() {
        let meta = TableMetadata::homogeneous(DataType::Float32, 3);
        assert_eq!(meta.feature_type(2).unwrap(), FeatureType::Interval);
        let meta = TableMetadata::homogeneous(DataType::UInt16, 1);
        assert_eq!(meta.feature_type(0).unwrap(), FeatureType::Ordinal);
    }

    #[test]
    fn test_empty_table() {
        let table = EmptyTable::new();
        assert_eq!(table.kind(), TableKind::Empty);
        assert!(!table.has_data());
        assert_eq!(table.data_layout(), DataLayout::Unknown);
        assert!(table.row_block(0..0).is_none());
        assert!(table.read_cell(0, 0).is_err());
    }
}
