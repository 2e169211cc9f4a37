// src/buffer/core.rs
//! Core buffer structure and basic operations
//!
//! This module provides the fundamental [`Buffer`] type: a typed view of a
//! contiguous memory block plus a shared lifetime token for that block.

use crate::error::{BufferError, Result};
use crate::memory::block::Lifetime;
use bytemuck::Pod;
use std::fmt;
use std::mem;
use std::ops::Index;
use std::sync::Arc;

/// A reference-counted, typed handle to a contiguous memory block.
///
/// Cloning a buffer shares the block: no data are copied, the reference count
/// of the block's lifetime token is incremented. The block is released (its
/// deleter runs exactly once) when the last handle that references it, copy
/// or alias, is dropped.
///
/// A buffer either holds its block as **mutable** data, in which case
/// [`mutable_data`](Self::mutable_data) returns the same address as
/// [`data`](Self::data), or as **immutable** data, for example a zero-copy
/// view into a table.
///
/// # Examples
///
/// ```
/// use blockbuf::prelude::*;
///
/// let ctx = MemoryContext::default();
/// let buf = Buffer::<f32>::full(&ctx, 4, 1.5, AllocKind::Host)?;
/// let copy = buf.clone();
///
/// assert_eq!(buf.data(), copy.data());
/// assert_eq!(copy.as_slice(), &[1.5; 4]);
/// # Ok::<(), BufferError>(())
/// ```
pub struct Buffer<T> {
    /// First element; null when the buffer is empty
    pub(crate) data: *const T,
    /// Number of elements in the view
    pub(crate) count: usize,
    /// Elements writable in place from `data` (>= count for reused blocks)
    pub(crate) capacity: usize,
    /// Whether `data` may be written through
    pub(crate) mutable: bool,
    /// Shared lifetime of the underlying block
    pub(crate) owner: Option<Arc<Lifetime>>,
}

// SAFETY: the block is only shared through the atomically counted token and
// element access follows the usual `&`/`&mut` rules of the handle.
unsafe impl<T: Send + Sync> Send for Buffer<T> {}
unsafe impl<T: Send + Sync> Sync for Buffer<T> {}

impl<T: Pod> Buffer<T> {
    /// Creates an empty buffer without any data.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Buffer;
    ///
    /// let buf = Buffer::<i32>::new();
    /// assert_eq!(buf.count(), 0);
    /// assert!(buf.data().is_null());
    /// assert!(!buf.has_mutable_data());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            data: std::ptr::null(),
            count: 0,
            capacity: 0,
            mutable: false,
            owner: None,
        }
    }

    #[inline]
    pub(crate) fn from_parts(
        data: *const T,
        count: usize,
        mutable: bool,
        owner: Option<Arc<Lifetime>>,
    ) -> Self {
        debug_assert!(count == 0 || !data.is_null());
        Self {
            data,
            count,
            capacity: count,
            mutable,
            owner,
        }
    }

    /// The immutable pointer to the memory block.
    ///
    /// Never null when `count() > 0`.
    #[inline(always)]
    pub fn data(&self) -> *const T {
        self.data
    }

    /// Returns whether the buffer holds its block as mutable data.
    #[inline(always)]
    pub fn has_mutable_data(&self) -> bool {
        self.mutable
    }

    /// The mutable pointer to the memory block, same address as [`data`](Self::data).
    ///
    /// Writing through the pointer is visible to every handle sharing the block.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidState`] if the buffer holds immutable data.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::prelude::*;
    ///
    /// let ctx = MemoryContext::default();
    /// let mut buf = Buffer::<u8>::zeros(&ctx, 4, AllocKind::Host)?;
    /// assert_eq!(buf.mutable_data()? as *const u8, buf.data());
    ///
    /// buf.freeze();
    /// assert!(buf.mutable_data().is_err());
    /// # Ok::<(), BufferError>(())
    /// ```
    #[inline]
    pub fn mutable_data(&self) -> Result<*mut T> {
        if !self.mutable {
            return Err(BufferError::InvalidState(
                "buffer holds immutable data".into(),
            ));
        }
        Ok(self.data as *mut T)
    }

    /// The number of elements in the buffer.
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.count
    }

    /// The size of the viewed memory in bytes, `count() * size_of::<T>()`.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.count * mem::size_of::<T>()
    }

    /// Returns `true` if the buffer has no elements.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of elements that can be written in place starting at `data()`.
    ///
    /// Equal to [`count`](Self::count) except after an accessor reused a
    /// larger block for a smaller request.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writable storage for the first `count` elements of the block, if this
    /// handle may overwrite it in place. `count` itself is left unchanged.
    pub(crate) fn reusable_mut(&mut self, count: usize) -> Option<&mut [T]> {
        if count == 0 || count > self.capacity || !self.mutable || !self.is_unique() {
            return None;
        }
        Some(unsafe { std::slice::from_raw_parts_mut(self.data as *mut T, count) })
    }

    /// Returns `true` if no other handle shares this buffer's block.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::prelude::*;
    ///
    /// let ctx = MemoryContext::default();
    /// let buf = Buffer::<u16>::zeros(&ctx, 8, AllocKind::Host)?;
    /// assert!(buf.is_unique());
    ///
    /// let copy = buf.clone();
    /// assert!(!buf.is_unique());
    /// drop(copy);
    /// assert!(buf.is_unique());
    /// # Ok::<(), BufferError>(())
    /// ```
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.owner
            .as_ref()
            .is_none_or(|owner| Arc::strong_count(owner) == 1)
    }

    /// Returns `true` if releasing the last handle frees memory, i.e. the
    /// block was not wrapped from caller-owned memory.
    #[inline]
    pub fn owns_memory(&self) -> bool {
        self.owner.as_ref().is_some_and(|owner| owner.is_managed())
    }

    /// Returns a slice of all elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Buffer;
    ///
    /// let buf = Buffer::from_vec(vec![1u32, 2, 3]);
    /// assert_eq!(buf.as_slice(), &[1, 2, 3]);
    /// ```
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        if self.count == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.data, self.count) }
    }

    /// Returns a mutable slice of all elements.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidState`] if the buffer holds immutable
    /// data or if another handle shares the block. Use
    /// [`mutable_data`](Self::mutable_data) to write into shared blocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Buffer;
    /// # use blockbuf::BufferError;
    ///
    /// let mut buf = Buffer::from_vec(vec![1u8, 2, 3]);
    /// buf.as_mut_slice()?[0] = 9;
    /// assert_eq!(buf.as_slice(), &[9, 2, 3]);
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        if !self.mutable {
            return Err(BufferError::InvalidState(
                "buffer holds immutable data".into(),
            ));
        }
        if !self.is_unique() {
            return Err(BufferError::InvalidState(
                "buffer block is shared with other handles".into(),
            ));
        }
        if self.count == 0 {
            return Ok(&mut []);
        }
        Ok(unsafe { std::slice::from_raw_parts_mut(self.data as *mut T, self.count) })
    }

    /// Iterates over the elements.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Copies the elements into a new `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    /// Drops the mutable capability; the block is kept.
    #[inline]
    pub fn freeze(&mut self) {
        self.mutable = false;
    }

    /// Leaves the memory block currently held, making the buffer empty.
    ///
    /// The block is released if this was its last handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Buffer;
    ///
    /// let mut buf = Buffer::from_vec(vec![1.0f64; 3]);
    /// buf.reset();
    /// assert_eq!(buf.count(), 0);
    /// assert!(buf.data().is_null());
    /// assert!(!buf.has_mutable_data());
    /// ```
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Moves the block and its ownership out, leaving this buffer empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Buffer;
    ///
    /// let mut src = Buffer::from_vec(vec![7i64; 2]);
    /// let ptr = src.data();
    /// let dst = src.take();
    ///
    /// assert_eq!(dst.data(), ptr);
    /// assert_eq!(src.count(), 0);
    /// assert!(src.data().is_null());
    /// ```
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Creates a view over `range` sharing this buffer's block.
    ///
    /// The view keeps the block alive and inherits the mutable capability.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `range` is not within `0..count()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Buffer;
    /// # use blockbuf::BufferError;
    ///
    /// let buf = Buffer::from_vec(vec![0u32, 1, 2, 3, 4]);
    /// let tail = buf.slice(2..5)?;
    /// drop(buf);
    /// assert_eq!(tail.as_slice(), &[2, 3, 4]);
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn slice(&self, range: std::ops::Range<usize>) -> Result<Self> {
        if range.end > self.count {
            return Err(BufferError::OutOfRange {
                index: range.end as i64,
                bound: self.count,
            });
        }
        if range.start > range.end {
            return Err(BufferError::OutOfRange {
                index: range.start as i64,
                bound: range.end,
            });
        }
        let count = range.end - range.start;
        let data = if count == 0 {
            std::ptr::null()
        } else {
            unsafe { self.data.add(range.start) }
        };
        Ok(Buffer::from_parts(data, count, self.mutable, self.owner.clone()))
    }

    /// Reinterprets part of the block as `count` elements of another type.
    ///
    /// `byte_offset` is measured from [`data`](Self::data). The view shares
    /// this buffer's block and inherits the mutable capability.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if the requested bytes do not
    /// fit in the buffer or the start address is not aligned for `U`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::Buffer;
    /// # use blockbuf::BufferError;
    ///
    /// let words = Buffer::from_vec(vec![0x0102_0304u32, 0]);
    /// let bytes = words.cast_view::<u8>(0, 4)?;
    /// assert_eq!(bytes.as_slice(), &0x0102_0304u32.to_ne_bytes());
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn cast_view<U: Pod>(&self, byte_offset: usize, count: usize) -> Result<Buffer<U>> {
        if count == 0 {
            return Ok(Buffer::from_parts(
                std::ptr::null(),
                0,
                self.mutable,
                self.owner.clone(),
            ));
        }
        let end = count
            .checked_mul(mem::size_of::<U>())
            .and_then(|bytes| bytes.checked_add(byte_offset));
        if end.is_none_or(|end| end > self.size()) {
            return Err(BufferError::InvalidArgument(format!(
                "view of {} elements at byte {} exceeds buffer of {} bytes",
                count,
                byte_offset,
                self.size()
            )));
        }
        let data = unsafe { self.data.cast::<u8>().add(byte_offset) }.cast::<U>();
        if (data as usize) % mem::align_of::<U>() != 0 {
            return Err(BufferError::InvalidArgument(format!(
                "byte {} is not aligned for a {}-byte aligned type",
                byte_offset,
                mem::align_of::<U>()
            )));
        }
        Ok(Buffer::from_parts(data, count, self.mutable, self.owner.clone()))
    }
}

impl<T: Pod> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Buffer<T> {
    /// Shares the block with the new handle; no data are copied.
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            count: self.count,
            capacity: self.capacity,
            mutable: self.mutable,
            owner: self.owner.clone(),
        }
    }
}

impl<T: Pod> Index<usize> for Buffer<T> {
    type Output = T;

    /// Bounds-checked element access; panics if `index >= count()`.
    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Pod> AsRef<[T]> for Buffer<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Pod> From<Vec<T>> for Buffer<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("data", &self.data)
            .field("count", &self.count)
            .field("mutable", &self.mutable)
            .field(
                "references",
                &self.owner.as_ref().map_or(0, Arc::strong_count),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(calls: &Arc<AtomicUsize>) -> Option<Arc<Lifetime>> {
        let calls = Arc::clone(calls);
        Some(Arc::new(Lifetime::with_release(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        })))
    }

    #[test]
    fn test_new_is_empty() {
        let buf = Buffer::<f32>::new();
        assert!(buf.is_empty());
        assert_eq!(buf.size(), 0);
        assert!(buf.as_slice().is_empty());
        assert!(buf.is_unique());
        assert!(!buf.owns_memory());
    }

    #[test]
    fn test_clone_shares_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut storage = [1u64, 2, 3];
        let buf = Buffer::from_parts(storage.as_mut_ptr(), 3, true, counted(&calls));
        let copy = buf.clone();

        assert_eq!(copy.data(), buf.data());
        assert_eq!(copy.size(), 24);
        drop(buf);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(copy);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_as_mut_slice_requires_unique() {
        let mut buf = Buffer::from_vec(vec![1u8, 2]);
        let copy = buf.clone();
        assert!(matches!(
            buf.as_mut_slice(),
            Err(BufferError::InvalidState(_))
        ));
        drop(copy);
        buf.as_mut_slice().unwrap()[1] = 5;
        assert_eq!(buf[1], 5);
    }

    #[test]
    fn test_slice_bounds() {
        let buf = Buffer::from_vec(vec![0i16; 4]);
        assert!(matches!(
            buf.slice(1..5),
            Err(BufferError::OutOfRange { index: 5, bound: 4 })
        ));
        let empty = buf.slice(4..4).unwrap();
        assert!(empty.is_empty());
        assert!(empty.data().is_null());
    }

    #[test]
    fn test_cast_view_checks() {
        let buf = Buffer::from_vec(vec![0u32; 4]);
        assert!(buf.cast_view::<u32>(4, 4).is_err());
        assert!(buf.cast_view::<u32>(2, 1).is_err());
        let tail = buf.cast_view::<u32>(8, 2).unwrap();
        assert_eq!(tail.data(), unsafe { buf.data().add(2) });
        assert!(tail.has_mutable_data());
    }

    #[test]
    fn test_capacity_tracks_count() {
        let buf = Buffer::from_vec(vec![3u8; 10]);
        assert_eq!(buf.capacity(), 10);
        assert_eq!(buf.slice(0..4).unwrap().capacity(), 4);
    }

    #[test]
    fn test_debug_reports_references() {
        let buf = Buffer::from_vec(vec![1u8]);
        let _copy = buf.clone();
        assert!(format!("{:?}", buf).contains("references: 2"));
    }

    #[test]
    fn test_reusable_mut() {
        let mut buf = Buffer::from_vec(vec![1i32; 6]);
        assert_eq!(buf.reusable_mut(4).unwrap().len(), 4);
        assert_eq!(buf.count(), 6);
        assert!(buf.reusable_mut(7).is_none());

        let copy = buf.clone();
        assert!(buf.reusable_mut(2).is_none());
        drop(copy);
        buf.freeze();
        assert!(buf.reusable_mut(2).is_none());
    }
}
