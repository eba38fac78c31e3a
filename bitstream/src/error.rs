//! Error types for bit buffer operations.

use std::fmt;

/// Result type for bit buffer operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors raised by the bit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// Attempted to read past the end of the buffer.
    EndOfBuffer {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// A write did not fit in a caller-supplied (static) buffer.
    BufferOverflow {
        /// Number of bits attempted to write.
        attempted: usize,
        /// Remaining capacity in bits.
        capacity: usize,
    },

    /// A dynamic buffer would have to grow past its configured limit.
    OutOfMemory {
        /// Total bytes the buffer would need.
        requested: usize,
        /// Maximum bytes the buffer may hold.
        limit: usize,
    },

    /// Attempted to write into a buffer bound for decoding.
    ReadOnly,

    /// Invalid bit count for the operation.
    InvalidBitCount {
        /// The invalid bit count provided.
        bits: usize,
        /// Maximum allowed bits for this operation.
        max_bits: usize,
    },

    /// Value exceeds the range representable by the specified number of bits.
    ValueOutOfRange {
        /// The value that was out of range.
        value: u64,
        /// Number of bits available.
        bits: usize,
    },

    /// A restored mark points outside the buffer.
    InvalidMark {
        /// Bit position of the mark.
        position: usize,
        /// Size of the buffer in bits.
        size: usize,
    },
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfBuffer {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bits but only {available} bits available"
                )
            }
            Self::BufferOverflow {
                attempted,
                capacity,
            } => {
                write!(
                    f,
                    "attempted to write {attempted} bits but only {capacity} bits of capacity remain"
                )
            }
            Self::OutOfMemory { requested, limit } => {
                write!(
                    f,
                    "buffer needs {requested} bytes but is limited to {limit} bytes"
                )
            }
            Self::ReadOnly => write!(f, "attempted to write into a decode buffer"),
            Self::InvalidBitCount { bits, max_bits } => {
                write!(f, "invalid bit count {bits}, maximum allowed is {max_bits}")
            }
            Self::ValueOutOfRange { value, bits } => {
                write!(f, "value {value} cannot be represented in {bits} bits")
            }
            Self::InvalidMark { position, size } => {
                write!(f, "mark at bit {position} is outside a {size}-bit buffer")
            }
        }
    }
}

impl std::error::Error for BitError {}
