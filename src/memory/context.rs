// src/memory/context.rs
//! Allocation contexts with a lock-free block cache.
//!
//! # Architecture
//!
//! A block request follows a two-tier cascade:
//!
//! 1. **Block cache**: released blocks are parked in lock-free queues
//!    partitioned by allocation kind and power-of-two size class.
//! 2. **Fresh allocation**: a zero-filled block from the global allocator.
//!
//! Requests that need a larger alignment than the context's, or that exceed
//! the largest size class, bypass the cache in both directions.
//!
//! # Contents of recycled blocks
//!
//! Element types are plain-old-data, so a recycled block holds valid (if
//! stale) values. Contexts configured with `zero_on_release` wipe every block
//! before it is cached or freed.

use super::block::{Lifetime, RawBlock};
use super::config::ContextConfig;
use super::stats::ContextStats;
use crate::error::{BufferError, Result};
use std::alloc::Layout;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

/// Smallest cached size class: 64 bytes.
const MIN_CLASS_SHIFT: u32 = 6;
/// Largest cached size class: 1GB.
const MAX_CLASS_SHIFT: u32 = 30;
const CLASS_COUNT: usize = (MAX_CLASS_SHIFT - MIN_CLASS_SHIFT + 1) as usize;

/// The kind of memory a block is placed in.
///
/// Every kind is backed by host memory here; the tag partitions the block
/// cache so blocks never migrate between kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllocKind {
    /// Host-only memory
    Host,
    /// Device-visible memory
    Device,
    /// Memory visible to both host and device
    #[default]
    Shared,
}

impl AllocKind {
    const COUNT: usize = 3;

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::Host => 0,
            Self::Device => 1,
            Self::Shared => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Lock-free queue with approximate size tracking
// ---------------------------------------------------------------------------

/// Wrapper around `crossbeam::SegQueue` that tracks an approximate length.
///
/// The counter and the queue are **not** updated atomically, so `len()` may
/// be briefly stale.
struct LockFreeQueue<T> {
    items: crossbeam::queue::SegQueue<T>,
    size: AtomicUsize,
}

impl<T> LockFreeQueue<T> {
    fn new() -> Self {
        Self {
            items: crossbeam::queue::SegQueue::new(),
            size: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn push(&self, item: T) {
        self.items.push(item);
        self.size.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn pop(&self) -> Option<T> {
        self.items.pop().inspect(|_| {
            self.size.fetch_sub(1, Ordering::Relaxed);
        })
    }

    #[inline]
    fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct StatsInner {
    acquired: AtomicUsize,
    allocated: AtomicUsize,
    reused: AtomicUsize,
    released: AtomicUsize,
    bytes_in_use: AtomicUsize,
}

struct ContextInner {
    config: ContextConfig,
    /// `AllocKind::COUNT * CLASS_COUNT` queues, indexed by `slot()`.
    cache: Vec<LockFreeQueue<RawBlock>>,
    stats: StatsInner,
}

impl ContextInner {
    fn cached(&self) -> usize {
        self.cache.iter().map(LockFreeQueue::len).sum()
    }

    fn release(&self, mut block: RawBlock, slot: Option<usize>) {
        self.stats.released.fetch_add(1, Ordering::Relaxed);
        self.stats
            .bytes_in_use
            .fetch_sub(block.layout().size(), Ordering::Relaxed);

        if self.config.zero_on_release {
            block.wipe();
        }

        // Best-effort bound: concurrent releases may briefly overshoot it.
        if let Some(slot) = slot {
            if self.cached() < self.config.max_cached_blocks {
                trace!(size = block.layout().size(), slot, "block returned to cache");
                self.cache[slot].push(block);
                return;
            }
        }
        trace!(size = block.layout().size(), "block freed");
    }
}

/// Rounds `bytes` up to its size class, `None` when too large to cache.
fn size_class(bytes: usize) -> Option<usize> {
    let rounded = bytes.max(1 << MIN_CLASS_SHIFT).checked_next_power_of_two()?;
    let shift = rounded.trailing_zeros();
    (shift <= MAX_CLASS_SHIFT).then(|| (shift - MIN_CLASS_SHIFT) as usize)
}

// ---------------------------------------------------------------------------
// MemoryContext
// ---------------------------------------------------------------------------

/// Handle to an allocation context.
///
/// Every allocating buffer operation takes a context; it decides where the
/// block lives and recycles blocks once their last buffer handle drops.
/// Cloning the handle shares the same cache and statistics, and live blocks
/// keep the context state alive.
///
/// # Example
///
/// ```rust
/// use blockbuf::prelude::*;
///
/// let ctx = MemoryContext::new(ContextConfig::default());
/// let first = Buffer::<f32>::zeros(&ctx, 256, AllocKind::Host)?;
/// drop(first);
///
/// // Same size class and kind: served from the cache.
/// let _second = Buffer::<f32>::zeros(&ctx, 200, AllocKind::Host)?;
/// assert_eq!(ctx.stats().reused, 1);
/// # Ok::<(), BufferError>(())
/// ```
#[derive(Clone)]
pub struct MemoryContext {
    inner: Arc<ContextInner>,
}

impl MemoryContext {
    /// Creates a new context. The alignment is rounded up to a power of two.
    pub fn new(mut config: ContextConfig) -> Self {
        config.alignment = config.alignment.max(1).next_power_of_two();
        let cache = (0..AllocKind::COUNT * CLASS_COUNT)
            .map(|_| LockFreeQueue::new())
            .collect();
        Self {
            inner: Arc::new(ContextInner {
                config,
                cache,
                stats: StatsInner {
                    acquired: AtomicUsize::new(0),
                    allocated: AtomicUsize::new(0),
                    reused: AtomicUsize::new(0),
                    released: AtomicUsize::new(0),
                    bytes_in_use: AtomicUsize::new(0),
                },
            }),
        }
    }
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl MemoryContext {
    /// The configuration this context was created with.
    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    /// Returns a snapshot of context statistics.
    ///
    /// All counters use `Relaxed` ordering; values are eventually consistent.
    pub fn stats(&self) -> ContextStats {
        let stats = &self.inner.stats;
        ContextStats {
            acquired: stats.acquired.load(Ordering::Relaxed),
            allocated: stats.allocated.load(Ordering::Relaxed),
            reused: stats.reused.load(Ordering::Relaxed),
            released: stats.released.load(Ordering::Relaxed),
            cached: self.inner.cached(),
            bytes_in_use: stats.bytes_in_use.load(Ordering::Relaxed),
        }
    }

    /// Frees every idle block held in the cache.
    pub fn clear_cache(&self) {
        let mut freed = 0usize;
        for queue in &self.inner.cache {
            while let Some(block) = queue.pop() {
                drop(block);
                freed += 1;
            }
        }
        debug!(freed, "block cache cleared");
    }

    /// Acquires a block of at least `bytes` bytes aligned to `align`.
    ///
    /// Returns the block start and the lifetime token that gives the block
    /// back to this context once dropped.
    pub(crate) fn allocate(
        &self,
        bytes: usize,
        align: usize,
        kind: AllocKind,
    ) -> Result<(NonNull<u8>, Lifetime)> {
        let config = &self.inner.config;
        if bytes > config.max_allocation_bytes {
            return Err(BufferError::AllocationFailure(format!(
                "requested {} bytes exceeds the context limit of {}",
                bytes, config.max_allocation_bytes
            )));
        }
        self.inner.stats.acquired.fetch_add(1, Ordering::Relaxed);

        let slot = if align <= config.alignment {
            size_class(bytes).map(|class| kind.index() * CLASS_COUNT + class)
        } else {
            None
        };

        let cached = slot.and_then(|slot| self.inner.cache[slot].pop());
        let block = match cached {
            Some(block) => {
                self.inner.stats.reused.fetch_add(1, Ordering::Relaxed);
                trace!(bytes, ?kind, "block served from cache");
                block
            }
            None => {
                let size = match slot {
                    Some(slot) => 1usize << (slot % CLASS_COUNT + MIN_CLASS_SHIFT as usize),
                    None => bytes.max(1),
                };
                let layout = Layout::from_size_align(size, align.max(config.alignment))
                    .map_err(|e| BufferError::AllocationFailure(e.to_string()))?;
                let block = RawBlock::allocate(layout).ok_or_else(|| {
                    BufferError::AllocationFailure(format!(
                        "allocator returned null for {} bytes",
                        layout.size()
                    ))
                })?;
                self.inner.stats.allocated.fetch_add(1, Ordering::Relaxed);
                debug!(bytes, size, ?kind, "block allocated");
                block
            }
        };

        self.inner
            .stats
            .bytes_in_use
            .fetch_add(block.layout().size(), Ordering::Relaxed);
        let ptr = block.ptr();
        let inner = Arc::clone(&self.inner);
        let lifetime = Lifetime::with_release(move || inner.release(block, slot));
        Ok((ptr, lifetime))
    }
}

impl fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContext")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_class() {
        assert_eq!(size_class(1), Some(0));
        assert_eq!(size_class(64), Some(0));
        assert_eq!(size_class(65), Some(1));
        assert_eq!(size_class(1 << 30), Some(CLASS_COUNT - 1));
        assert_eq!(size_class((1 << 30) + 1), None);
    }

    #[test]
    fn test_allocation_is_aligned() {
        let ctx = MemoryContext::default();
        let (ptr, _lifetime) = ctx.allocate(100, 4, AllocKind::Host).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 64, 0);
        assert_eq!(ctx.stats().bytes_in_use, 128);
    }

    #[test]
    fn test_release_goes_to_cache() {
        let ctx = MemoryContext::default();
        let (first, lifetime) = ctx.allocate(500, 8, AllocKind::Device).unwrap();
        drop(lifetime);
        assert_eq!(ctx.stats().cached, 1);
        assert_eq!(ctx.stats().bytes_in_use, 0);

        // Other kinds do not see the block.
        let (_, host) = ctx.allocate(500, 8, AllocKind::Host).unwrap();
        assert_eq!(ctx.stats().reused, 0);

        let (second, device) = ctx.allocate(400, 8, AllocKind::Device).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.stats().reused, 1);
        drop((host, device));
    }

    #[test]
    fn test_uncached_context_frees() {
        let ctx = MemoryContext::new(ContextConfig::uncached());
        let (_, lifetime) = ctx.allocate(64, 8, AllocKind::Shared).unwrap();
        drop(lifetime);
        let stats = ctx.stats();
        assert_eq!(stats.cached, 0);
        assert_eq!(stats.released, 1);
    }

    #[test]
    fn test_limit_is_allocation_failure() {
        let ctx = MemoryContext::new(ContextConfig::small());
        let err = ctx.allocate(2 << 20, 8, AllocKind::Host).unwrap_err();
        assert!(matches!(err, BufferError::AllocationFailure(_)));
        assert_eq!(ctx.stats().acquired, 0);
    }

    #[test]
    fn test_large_alignment_bypasses_cache() {
        let ctx = MemoryContext::new(ContextConfig::small());
        let (ptr, lifetime) = ctx.allocate(32, 128, AllocKind::Host).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 128, 0);
        drop(lifetime);
        assert_eq!(ctx.stats().cached, 0);
    }

    #[test]
    fn test_clear_cache() {
        let ctx = MemoryContext::default();
        for _ in 0..3 {
            let (_, a) = ctx.allocate(64, 8, AllocKind::Host).unwrap();
            let (_, b) = ctx.allocate(64, 8, AllocKind::Host).unwrap();
            drop((a, b));
        }
        assert_eq!(ctx.stats().cached, 2);
        ctx.clear_cache();
        assert_eq!(ctx.stats().cached, 0);
    }

    #[test]
    fn test_zero_on_release() {
        let ctx = MemoryContext::new(ContextConfig::secure());
        let (ptr, lifetime) = ctx.allocate(64, 8, AllocKind::Host).unwrap();
        unsafe { ptr.as_ptr().write_bytes(0x5A, 64) };
        drop(lifetime);

        let (again, _lifetime) = ctx.allocate(64, 8, AllocKind::Host).unwrap();
        assert_eq!(ptr, again);
        let bytes = unsafe { std::slice::from_raw_parts(again.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }
}
