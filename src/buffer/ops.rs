// src/buffer/ops.rs
//! Allocating buffer constructors and copy-on-demand operations

use super::core::Buffer;
use crate::error::{BufferError, Result};
use crate::memory::block::{Lifetime, SendPtr};
use crate::memory::{AllocKind, MemoryContext};
use bytemuck::Pod;
use std::mem::{self, ManuallyDrop};
use std::sync::Arc;

impl<T: Pod> Buffer<T> {
    /// Allocates a block of `count` elements owned by the new buffer as
    /// mutable data.
    ///
    /// The contents are valid values of `T` but unspecified: fresh blocks are
    /// zero-filled, blocks recycled by the context keep their previous bytes
    /// unless the context zeroes on release.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if `count == 0` and
    /// [`BufferError::AllocationFailure`] if the context cannot provide the
    /// block.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::prelude::*;
    ///
    /// let ctx = MemoryContext::default();
    /// let buf = Buffer::<f64>::empty(&ctx, 10, AllocKind::Shared)?;
    /// assert_eq!(buf.count(), 10);
    /// assert_eq!(buf.size(), 80);
    /// assert!(buf.has_mutable_data());
    ///
    /// assert!(Buffer::<f64>::empty(&ctx, 0, AllocKind::Shared).is_err());
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn empty(ctx: &MemoryContext, count: usize, kind: AllocKind) -> Result<Self> {
        if count == 0 {
            return Err(BufferError::InvalidArgument(
                "element count must be positive".into(),
            ));
        }
        let bytes = count.checked_mul(mem::size_of::<T>()).ok_or_else(|| {
            BufferError::AllocationFailure(format!("{} elements overflow the address space", count))
        })?;
        let (ptr, lifetime) = ctx.allocate(bytes, mem::align_of::<T>(), kind)?;
        Ok(Self::from_parts(
            ptr.as_ptr().cast::<T>(),
            count,
            true,
            Some(Arc::new(lifetime)),
        ))
    }

    /// Allocates a block of `count` elements, each set to `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::prelude::*;
    ///
    /// let ctx = MemoryContext::default();
    /// let buf = Buffer::full(&ctx, 3, 7u16, AllocKind::Host)?;
    /// assert_eq!(buf.as_slice(), &[7, 7, 7]);
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn full(ctx: &MemoryContext, count: usize, value: T, kind: AllocKind) -> Result<Self> {
        let mut buf = Self::empty(ctx, count, kind)?;
        buf.as_mut_slice()?.fill(value);
        Ok(buf)
    }

    /// Allocates a block of `count` zero-valued elements.
    pub fn zeros(ctx: &MemoryContext, count: usize, kind: AllocKind) -> Result<Self> {
        Self::full(ctx, count, T::zeroed(), kind)
    }

    /// Takes ownership of a vector's allocation as a mutable block.
    ///
    /// The vector is dropped when the last handle goes away. An empty vector
    /// gives an empty buffer.
    pub fn from_vec(data: Vec<T>) -> Self {
        if data.is_empty() {
            return Self::new();
        }
        let mut data = ManuallyDrop::new(data);
        let (ptr, len, cap) = (data.as_mut_ptr(), data.len(), data.capacity());
        let raw = SendPtr::new(ptr);
        let lifetime = Lifetime::with_release(move || {
            let ptr = raw.into_raw();
            drop(unsafe { Vec::from_raw_parts(ptr, len, cap) });
        });
        Self::from_parts(ptr, len, true, Some(Arc::new(lifetime)))
    }

    /// Makes sure the buffer holds mutable data.
    ///
    /// If the buffer already has mutable data nothing happens. Otherwise a new
    /// block of the same count is allocated, the immutable contents are copied
    /// into it and the buffer switches to it; the previous block loses one
    /// reference and is released only if this was its last handle.
    ///
    /// # Errors
    ///
    /// Propagates allocation errors; the buffer is unchanged on failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::prelude::*;
    ///
    /// let ctx = MemoryContext::default();
    /// let source = [1i32, 2, 3];
    /// let mut buf = unsafe { Buffer::wrap(source.as_ptr(), 3)? };
    /// assert!(!buf.has_mutable_data());
    ///
    /// buf.need_mutable_data(&ctx, AllocKind::Host)?;
    /// assert!(buf.has_mutable_data());
    /// assert_ne!(buf.data(), source.as_ptr());
    /// assert_eq!(buf.as_slice(), &source);
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn need_mutable_data(&mut self, ctx: &MemoryContext, kind: AllocKind) -> Result<&mut Self> {
        if self.mutable {
            return Ok(self);
        }
        if self.count == 0 {
            self.mutable = true;
            return Ok(self);
        }
        let mut fresh = Self::empty(ctx, self.count, kind)?;
        fresh.as_mut_slice()?.copy_from_slice(self.as_slice());
        *self = fresh;
        Ok(self)
    }

    /// Replaces the current block with a newly allocated one of `count` elements.
    ///
    /// The new block is acquired first; the previous block is left only once
    /// the allocation succeeded, so the buffer is unchanged on error.
    pub fn reset_with(&mut self, ctx: &MemoryContext, count: usize, kind: AllocKind) -> Result<()> {
        let fresh = Self::empty(ctx, count, kind)?;
        *self = fresh;
        Ok(())
    }

    /// Replaces the current block with the allocation of `data`.
    pub fn reset_from_vec(&mut self, data: Vec<T>) {
        *self = Self::from_vec(data);
    }
}
