// src/element.rs
//! Element data types and scalar conversion.
//!
//! Tables store their features in one of the [`DataType`]s below. Accessors
//! convert cells into the requested [`Element`] type through [`Scalar`],
//! using Rust `as` casts (wrapping integer narrowing, saturating float to int).

use bytemuck::Pod;

/// Data type of a table feature or buffer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
}

impl DataType {
    /// Size of one value in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Whether the type is a floating-point type.
    pub const fn is_floating_point(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

/// A single value tagged with its data type.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// Data type of the held value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::I8(_) => DataType::Int8,
            Self::I16(_) => DataType::Int16,
            Self::I32(_) => DataType::Int32,
            Self::I64(_) => DataType::Int64,
            Self::U8(_) => DataType::UInt8,
            Self::U16(_) => DataType::UInt16,
            Self::U32(_) => DataType::UInt32,
            Self::U64(_) => DataType::UInt64,
            Self::F32(_) => DataType::Float32,
            Self::F64(_) => DataType::Float64,
        }
    }

    /// Decodes one value of `data_type` from the start of `bytes`.
    ///
    /// `bytes` may be unaligned but must hold at least
    /// `data_type.size_in_bytes()` bytes.
    pub fn read(data_type: DataType, bytes: &[u8]) -> Scalar {
        let raw = &bytes[..data_type.size_in_bytes()];
        match data_type {
            DataType::Int8 => Self::I8(bytemuck::pod_read_unaligned(raw)),
            DataType::Int16 => Self::I16(bytemuck::pod_read_unaligned(raw)),
            DataType::Int32 => Self::I32(bytemuck::pod_read_unaligned(raw)),
            DataType::Int64 => Self::I64(bytemuck::pod_read_unaligned(raw)),
            DataType::UInt8 => Self::U8(bytemuck::pod_read_unaligned(raw)),
            DataType::UInt16 => Self::U16(bytemuck::pod_read_unaligned(raw)),
            DataType::UInt32 => Self::U32(bytemuck::pod_read_unaligned(raw)),
            DataType::UInt64 => Self::U64(bytemuck::pod_read_unaligned(raw)),
            DataType::Float32 => Self::F32(bytemuck::pod_read_unaligned(raw)),
            DataType::Float64 => Self::F64(bytemuck::pod_read_unaligned(raw)),
        }
    }
}

/// Types that can be stored in tables and pulled through accessors.
pub trait Element: Pod + PartialEq + Send + Sync {
    /// Data type tag of this element type.
    const DATA_TYPE: DataType;

    /// Converts a scalar of any data type into this type with `as` semantics.
    fn from_scalar(value: Scalar) -> Self;

    /// Wraps the value into a scalar.
    fn to_scalar(self) -> Scalar;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident, $variant:ident;)*) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dtype;

                #[inline]
                fn from_scalar(value: Scalar) -> Self {
                    match value {
                        Scalar::I8(v) => v as $ty,
                        Scalar::I16(v) => v as $ty,
                        Scalar::I32(v) => v as $ty,
                        Scalar::I64(v) => v as $ty,
                        Scalar::U8(v) => v as $ty,
                        Scalar::U16(v) => v as $ty,
                        Scalar::U32(v) => v as $ty,
                        Scalar::U64(v) => v as $ty,
                        Scalar::F32(v) => v as $ty,
                        Scalar::F64(v) => v as $ty,
                    }
                }

                #[inline]
                fn to_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }
            }
        )*
    };
}

impl_element! {
    i8 => Int8, I8;
    i16 => Int16, I16;
    i32 => Int32, I32;
    i64 => Int64, I64;
    u8 => UInt8, U8;
    u16 => UInt16, U16;
    u32 => UInt32, U32;
    u64 => UInt64, U64;
    f32 => Float32, F32;
    f64 => Float64, F64;
}
