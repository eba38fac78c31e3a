//! Block-growing memory arena shared between a session and its sub-sessions.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::config::SessionConfig;
use crate::error::{PerError, PerResult};

/// Allocation statistics for an arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Blocks reserved since creation or the last reset.
    pub blocks: usize,
    /// Bytes reserved across all blocks.
    pub reserved_bytes: usize,
    /// Bytes handed out by `alloc`.
    pub allocated_bytes: usize,
}

#[derive(Debug)]
struct ArenaState {
    block_bytes: usize,
    max_bytes: usize,
    current: BytesMut,
    stats: ArenaStats,
}

/// A reference-counted, block-growing allocator.
///
/// Cloning a handle shares the arena and bumps its count; dropping a handle
/// releases it. The current block is freed when the last handle drops.
/// Allocations are carved from the current block and keep their block alive
/// on their own, so values decoded into the arena stay valid after the
/// session that produced them is destroyed.
///
/// `Arena` is neither `Send` nor `Sync`. A session and its sub-sessions must
/// stay on one thread.
#[derive(Debug, Clone)]
pub struct Arena {
    inner: Rc<RefCell<ArenaState>>,
}

impl Arena {
    /// Creates an arena reserving `block_bytes` at a time, handing out at
    /// most `max_bytes` in total.
    #[must_use]
    pub fn new(block_bytes: usize, max_bytes: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ArenaState {
                block_bytes: block_bytes.max(1),
                max_bytes,
                current: BytesMut::new(),
                stats: ArenaStats::default(),
            })),
        }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.arena_block_bytes, config.max_arena_bytes)
    }

    /// Allocates `len` zeroed bytes.
    ///
    /// A request larger than the block size gets a block of its own.
    ///
    /// # Errors
    ///
    /// Returns [`PerError::OutOfMemory`] if the arena limit would be exceeded.
    pub fn alloc(&self, len: usize) -> PerResult<BytesMut> {
        let mut state = self.inner.borrow_mut();
        let requested = state.stats.allocated_bytes.saturating_add(len);
        if requested > state.max_bytes {
            return Err(PerError::OutOfMemory {
                requested,
                limit: state.max_bytes,
            });
        }
        if len > state.current.len() {
            let block = len.max(state.block_bytes);
            trace!(block, "arena block reserved");
            state.current = BytesMut::zeroed(block);
            state.stats.blocks += 1;
            state.stats.reserved_bytes += block;
        }
        state.stats.allocated_bytes = requested;
        Ok(state.current.split_to(len))
    }

    /// Copies `data` into the arena.
    pub fn alloc_copy(&self, data: &[u8]) -> PerResult<Bytes> {
        let mut chunk = self.alloc(data.len())?;
        chunk.copy_from_slice(data);
        Ok(chunk.freeze())
    }

    /// Number of live handles to this arena.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Whether both handles refer to the same arena.
    #[must_use]
    pub fn shares_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.inner.borrow().stats
    }

    /// Drops the current block and clears the statistics.
    ///
    /// Allocations already handed out stay valid.
    pub fn reset(&self) {
        let mut state = self.inner.borrow_mut();
        state.current = BytesMut::new();
        state.stats = ArenaStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_zeroed_and_sized() {
        let arena = Arena::new(64, 1024);
        let chunk = arena.alloc(10).unwrap();
        assert_eq!(chunk.len(), 10);
        assert!(chunk.iter().all(|&b| b == 0));
    }

    #[test]
    fn small_allocations_share_a_block() {
        let arena = Arena::new(64, 1024);
        arena.alloc(10).unwrap();
        arena.alloc(20).unwrap();
        let stats = arena.stats();
        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.reserved_bytes, 64);
        assert_eq!(stats.allocated_bytes, 30);
    }

    #[test]
    fn new_block_when_current_is_exhausted() {
        let arena = Arena::new(64, 1024);
        arena.alloc(60).unwrap();
        arena.alloc(10).unwrap();
        assert_eq!(arena.stats().blocks, 2);
    }

    #[test]
    fn oversized_request_gets_its_own_block() {
        let arena = Arena::new(64, 1024);
        let chunk = arena.alloc(500).unwrap();
        assert_eq!(chunk.len(), 500);
        assert_eq!(arena.stats().reserved_bytes, 500);
    }

    #[test]
    fn limit_reports_out_of_memory() {
        let arena = Arena::new(64, 100);
        arena.alloc(80).unwrap();
        assert_eq!(
            arena.alloc(30),
            Err(PerError::OutOfMemory {
                requested: 110,
                limit: 100
            })
        );
        assert_eq!(arena.stats().allocated_bytes, 80);
    }

    #[test]
    fn clone_shares_and_counts() {
        let arena = Arena::new(64, 1024);
        assert_eq!(arena.handle_count(), 1);
        let other = arena.clone();
        assert!(arena.shares_with(&other));
        assert_eq!(arena.handle_count(), 2);
        other.alloc(5).unwrap();
        assert_eq!(arena.stats().allocated_bytes, 5);
        drop(other);
        assert_eq!(arena.handle_count(), 1);
    }

    #[test]
    fn allocation_outlives_arena() {
        let arena = Arena::new(64, 1024);
        let bytes = arena.alloc_copy(b"h323").unwrap();
        drop(arena);
        assert_eq!(&bytes[..], b"h323");
    }

    #[test]
    fn reset_clears_stats() {
        let arena = Arena::new(64, 100);
        arena.alloc(90).unwrap();
        arena.reset();
        assert_eq!(arena.stats(), ArenaStats::default());
        arena.alloc(90).unwrap();
    }
}
