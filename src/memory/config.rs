// src/memory/config.rs
//! Configuration for memory contexts

/// Configuration for [`MemoryContext`](super::MemoryContext) behavior.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Minimum alignment of every allocated block (bytes, power of two)
    pub alignment: usize,
    /// Maximum number of released blocks kept for reuse
    pub max_cached_blocks: usize,
    /// Largest single allocation the context accepts (bytes)
    pub max_allocation_bytes: usize,
    /// Securely zero block contents when a block is released
    pub zero_on_release: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            alignment: 64,                           // Cache line
            max_cached_blocks: 64,                   // Keep up to 64 idle blocks
            max_allocation_bytes: isize::MAX as usize, // Layout limit
            zero_on_release: false,
        }
    }
}

impl ContextConfig {
    /// Configuration that never caches released blocks.
    pub fn uncached() -> Self {
        Self {
            max_cached_blocks: 0,
            ..Self::default()
        }
    }

    /// Configuration that wipes every block on release.
    pub fn secure() -> Self {
        Self {
            zero_on_release: true,
            ..Self::default()
        }
    }

    /// Configuration for small embedded workloads (1MB allocation cap).
    pub fn small() -> Self {
        Self {
            alignment: 16,
            max_cached_blocks: 8,
            max_allocation_bytes: 1 << 20,
            zero_on_release: false,
        }
    }
}
