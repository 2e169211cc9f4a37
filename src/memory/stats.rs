// src/memory/stats.rs
//! Statistics tracking for memory contexts.

/// Snapshot of memory context usage.
#[derive(Debug, Clone)]
pub struct ContextStats {
    /// Total number of block requests
    pub acquired: usize,
    /// Requests served by a fresh allocation
    pub allocated: usize,
    /// Requests served from the block cache
    pub reused: usize,
    /// Blocks released by their last buffer handle
    pub released: usize,
    /// Idle blocks currently held in the cache
    pub cached: usize,
    /// Bytes held by live blocks
    pub bytes_in_use: usize,
}

impl ContextStats {
    /// Returns the number of blocks currently referenced by buffers.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockbuf::prelude::*;
    ///
    /// let ctx = MemoryContext::default();
    /// let _buf = Buffer::<f64>::zeros(&ctx, 8, AllocKind::Host)?;
    /// assert_eq!(ctx.stats().in_use(), 1);
    /// # Ok::<(), BufferError>(())
    /// ```
    pub fn in_use(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }

    /// Returns the share of requests served from the cache (0.0-100.0).
    pub fn reuse_rate(&self) -> f64 {
        if self.acquired == 0 {
            return 0.0;
        }
        (self.reused as f64 / self.acquired as f64) * 100.0
    }
}
