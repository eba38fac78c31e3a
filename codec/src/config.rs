//! Per-session behavior flags and sizing limits.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default size of a dynamic encode buffer.
pub const DEFAULT_BUFFER_BYTES: usize = 2 * 1024;

/// Default arena block size.
pub const DEFAULT_ARENA_BLOCK_BYTES: usize = 4 * 1024;

/// Configuration fixed when a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Hand a dynamic encode buffer to the caller on teardown.
    pub preserve_buffer: bool,
    /// Let decoded strings borrow unfragmented data from the input.
    pub fast_copy: bool,
    /// Emit `trace`-level events for lengths and session lifecycle.
    pub trace: bool,
    /// Initial size of a dynamic encode buffer.
    pub initial_buffer_bytes: usize,
    /// Size of each arena block.
    pub arena_block_bytes: usize,
    /// Maximum bytes an arena may hand out.
    pub max_arena_bytes: usize,
    /// Maximum size of a dynamic encode buffer.
    pub max_message_bytes: usize,
    /// Give the I/O buffer its own arena instead of sharing the value arena.
    pub separate_message_arena: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preserve_buffer: false,
            fast_copy: true,
            trace: false,
            initial_buffer_bytes: DEFAULT_BUFFER_BYTES,
            arena_block_bytes: DEFAULT_ARENA_BLOCK_BYTES,
            max_arena_bytes: 16 * 1024 * 1024,
            max_message_bytes: 16 * 1024 * 1024,
            separate_message_arena: false,
        }
    }
}

impl SessionConfig {
    /// Small limits and tracing on, for tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            preserve_buffer: true,
            fast_copy: true,
            trace: true,
            initial_buffer_bytes: 64,
            arena_block_bytes: 256,
            max_arena_bytes: 1024 * 1024,
            max_message_bytes: 1024 * 1024,
            separate_message_arena: false,
        }
    }

    /// No size limits (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            preserve_buffer: false,
            fast_copy: true,
            trace: false,
            initial_buffer_bytes: DEFAULT_BUFFER_BYTES,
            arena_block_bytes: DEFAULT_ARENA_BLOCK_BYTES,
            max_arena_bytes: usize::MAX,
            max_message_bytes: usize::MAX,
            separate_message_arena: false,
        }
    }

    #[must_use]
    pub const fn with_preserve_buffer(mut self, preserve: bool) -> Self {
        self.preserve_buffer = preserve;
        self
    }

    #[must_use]
    pub const fn with_fast_copy(mut self, fast_copy: bool) -> Self {
        self.fast_copy = fast_copy;
        self
    }

    #[must_use]
    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    #[must_use]
    pub const fn with_max_message_bytes(mut self, max: usize) -> Self {
        self.max_message_bytes = max;
        self
    }

    #[must_use]
    pub const fn with_max_arena_bytes(mut self, max: usize) -> Self {
        self.max_arena_bytes = max;
        self
    }

    #[must_use]
    pub const fn with_separate_message_arena(mut self, separate: bool) -> Self {
        self.separate_message_arena = separate;
        self
    }
}
