// src/buffer/unsafe_ops.rs
//! Raw-pointer constructors and unchecked access

use super::core::Buffer;
use crate::error::{BufferError, Result};
use crate::memory::block::{Lifetime, SendPtr};
use bytemuck::Pod;
use std::sync::Arc;

fn check_raw<T>(ptr: *const T, count: usize) -> Result<()> {
    if ptr.is_null() {
        return Err(BufferError::InvalidArgument("data pointer is null".into()));
    }
    if count == 0 {
        return Err(BufferError::InvalidArgument(
            "element count must be positive".into(),
        ));
    }
    Ok(())
}

impl<T: Pod> Buffer<T> {
    /// Wraps caller-owned memory as an immutable block. No deleter runs when
    /// the last handle drops; freeing the memory stays with the caller.
    ///
    /// # Safety
    ///
    /// Caller MUST guarantee: `ptr` points to `count` initialized elements
    /// that stay valid and unmodified through other paths for as long as any
    /// handle (copy or alias) of the returned buffer exists.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if `ptr` is null or `count == 0`.
    pub unsafe fn wrap(ptr: *const T, count: usize) -> Result<Self> {
        check_raw(ptr, count)?;
        Ok(Self::from_parts(
            ptr,
            count,
            false,
            Some(Arc::new(Lifetime::unmanaged())),
        ))
    }

    /// Wraps caller-owned memory as a mutable block. No deleter runs when the
    /// last handle drops.
    ///
    /// # Safety
    ///
    /// Same as [`wrap`](Self::wrap); additionally the memory must be writable.
    pub unsafe fn wrap_mut(ptr: *mut T, count: usize) -> Result<Self> {
        check_raw(ptr, count)?;
        Ok(Self::from_parts(
            ptr,
            count,
            true,
            Some(Arc::new(Lifetime::unmanaged())),
        ))
    }

    /// Adopts a mutable block; `deleter(ptr)` runs once when the last handle
    /// referencing the block drops.
    ///
    /// The deleter must not panic. A panicking deleter aborts the process.
    ///
    /// # Safety
    ///
    /// Caller MUST guarantee: `ptr` points to `count` initialized, writable
    /// elements that stay valid until the deleter is called.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidArgument`] if `ptr` is null or
    /// `count == 0`. The deleter is then dropped without being called and the
    /// memory stays with the caller.
    pub unsafe fn from_raw_parts<D>(ptr: *mut T, count: usize, deleter: D) -> Result<Self>
    where
        D: FnOnce(*mut T) + Send + Sync + 'static,
    {
        check_raw(ptr, count)?;
        let raw = SendPtr::new(ptr);
        let lifetime = Lifetime::with_release(move || deleter(raw.into_raw()));
        Ok(Self::from_parts(ptr, count, true, Some(Arc::new(lifetime))))
    }

    /// Adopts an immutable block; `deleter(ptr)` runs once when the last
    /// handle referencing the block drops.
    ///
    /// # Safety
    ///
    /// Caller MUST guarantee: `ptr` points to `count` initialized elements
    /// that stay valid until the deleter is called.
    pub unsafe fn from_raw_parts_const<D>(ptr: *const T, count: usize, deleter: D) -> Result<Self>
    where
        D: FnOnce(*const T) + Send + Sync + 'static,
    {
        check_raw(ptr, count)?;
        let raw = SendPtr::new(ptr as *mut T);
        let lifetime = Lifetime::with_release(move || deleter(raw.into_raw() as *const T));
        Ok(Self::from_parts(ptr, count, false, Some(Arc::new(lifetime))))
    }

    /// Creates an immutable view of `count` elements at `ptr` that shares
    /// ownership with `reference`. If the view is the last handle to go away,
    /// the deleter of `reference`'s block runs.
    ///
    /// # Safety
    ///
    /// Caller MUST guarantee: `ptr` points to `count` initialized elements
    /// kept valid by `reference`'s block (or by the caller when `reference`
    /// does not own memory).
    #[inline]
    pub unsafe fn alias<U>(reference: &Buffer<U>, ptr: *const T, count: usize) -> Self {
        Self::from_parts(ptr, count, false, reference.owner.clone())
    }

    /// Mutable counterpart of [`alias`](Self::alias).
    ///
    /// # Safety
    ///
    /// Same as [`alias`](Self::alias); additionally the memory must be writable.
    #[inline]
    pub unsafe fn alias_mut<U>(reference: &Buffer<U>, ptr: *mut T, count: usize) -> Self {
        Self::from_parts(ptr, count, true, reference.owner.clone())
    }

    /// Replaces the current block with an adopted mutable block.
    ///
    /// # Safety
    ///
    /// See [`from_raw_parts`](Self::from_raw_parts).
    pub unsafe fn reset_raw<D>(&mut self, ptr: *mut T, count: usize, deleter: D) -> Result<()>
    where
        D: FnOnce(*mut T) + Send + Sync + 'static,
    {
        *self = unsafe { Self::from_raw_parts(ptr, count, deleter)? };
        Ok(())
    }

    /// Replaces the current block with an adopted immutable block.
    ///
    /// # Safety
    ///
    /// See [`from_raw_parts_const`](Self::from_raw_parts_const).
    pub unsafe fn reset_raw_const<D>(&mut self, ptr: *const T, count: usize, deleter: D) -> Result<()>
    where
        D: FnOnce(*const T) + Send + Sync + 'static,
    {
        *self = unsafe { Self::from_raw_parts_const(ptr, count, deleter)? };
        Ok(())
    }

    /// Replaces the current block with a view sharing ownership with `reference`.
    ///
    /// # Safety
    ///
    /// See [`alias`](Self::alias).
    pub unsafe fn reset_alias<U>(&mut self, reference: &Buffer<U>, ptr: *const T, count: usize) {
        *self = unsafe { Self::alias(reference, ptr, count) };
    }

    /// Replaces the current block with a mutable view sharing ownership with
    /// `reference`.
    ///
    /// # Safety
    ///
    /// See [`alias_mut`](Self::alias_mut).
    pub unsafe fn reset_alias_mut<U>(&mut self, reference: &Buffer<U>, ptr: *mut T, count: usize) {
        *self = unsafe { Self::alias_mut(reference, ptr, count) };
    }

    /// Reads an element without bounds checking.
    ///
    /// # Safety
    ///
    /// Caller MUST guarantee: `index < self.count()`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(
            index < self.count,
            "get_unchecked: index {} >= count {}",
            index,
            self.count
        );
        unsafe { &*self.data.add(index) }
    }
}
