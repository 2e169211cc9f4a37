// src/memory/block.rs
//! Lifetime tokens and the raw blocks behind them.
//!
//! A [`Lifetime`] is the shared ownership object of a memory block: every
//! buffer handle that views the block (copies and aliases alike) holds the
//! same `Arc<Lifetime>`. When the last handle goes away the token drops and
//! runs its release callback exactly once.

use std::alloc::{self, Layout};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use zeroize::Zeroize;

type Release = Box<dyn FnOnce() + Send + Sync>;

/// Shared lifetime of one memory block.
pub(crate) struct Lifetime {
    release: Option<Release>,
}

impl Lifetime {
    /// Token for memory the caller keeps ownership of. Dropping it does nothing.
    pub(crate) fn unmanaged() -> Self {
        Self { release: None }
    }

    /// Token that runs `release` when the last reference drops.
    pub(crate) fn with_release<F>(release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Whether dropping the token releases memory.
    pub(crate) fn is_managed(&self) -> bool {
        self.release.is_some()
    }
}

impl std::fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifetime")
            .field("managed", &self.is_managed())
            .finish()
    }
}

impl Drop for Lifetime {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            // A panicking deleter is a contract violation: abort.
            if panic::catch_unwind(AssertUnwindSafe(release)).is_err() {
                tracing::error!("buffer deleter panicked, aborting");
                std::process::abort();
            }
        }
    }
}

/// Raw pointer that may cross threads inside a release callback.
pub(crate) struct SendPtr<T>(*mut T);

// SAFETY: the pointer is only handed back to the deleter that owns it.
unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    pub(crate) fn new(ptr: *mut T) -> Self {
        Self(ptr)
    }

    pub(crate) fn into_raw(self) -> *mut T {
        self.0
    }
}

/// A heap block allocated by a memory context. Freed on drop.
pub(crate) struct RawBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: RawBlock uniquely owns its allocation.
unsafe impl Send for RawBlock {}
unsafe impl Sync for RawBlock {}

impl RawBlock {
    /// Allocates a zero-filled block, `None` if the allocator fails.
    pub(crate) fn allocate(layout: Layout) -> Option<Self> {
        debug_assert!(layout.size() > 0);
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).map(|ptr| Self { ptr, layout })
    }

    #[inline]
    pub(crate) fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    #[inline]
    pub(crate) fn layout(&self) -> Layout {
        self.layout
    }

    /// Securely zeros the block contents.
    pub(crate) fn wipe(&mut self) {
        let bytes = unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) };
        bytes.zeroize();
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}
