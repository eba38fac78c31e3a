//! Error and status types for PER encoding and decoding.

use std::fmt;

use bitstream::BitError;
use thiserror::Error;

/// Result type for codec operations.
pub type PerResult<T> = Result<T, PerError>;

/// Numeric status codes carried by the error stack.
///
/// Negative codes are failures. [`Status::Fragment`] is the one positive
/// code and is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Fragment = 2,
    BufferOverflow = -1,
    EndOfBuffer = -2,
    InvalidObjectId = -4,
    InvalidLength = -5,
    OutOfMemory = -12,
    StringOverflow = -17,
    ConstraintViolation = -23,
    RangeError = -24,
    InvalidParam = -30,
    InvalidFormat = -31,
}

impl Status {
    const ALL: [Self; 12] = [
        Self::Ok,
        Self::Fragment,
        Self::BufferOverflow,
        Self::EndOfBuffer,
        Self::InvalidObjectId,
        Self::InvalidLength,
        Self::OutOfMemory,
        Self::StringOverflow,
        Self::ConstraintViolation,
        Self::RangeError,
        Self::InvalidParam,
        Self::InvalidFormat,
    ];

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        self.code() < 0
    }

    /// Looks up a status by its numeric code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Message template; `%s` marks a parameter slot.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Ok => "Normal completion status",
            Self::Fragment => "Message fragment detected",
            Self::BufferOverflow => "Encode buffer overflow",
            Self::EndOfBuffer => "Unexpected end of buffer on decode",
            Self::InvalidObjectId => "Invalid object identifier",
            Self::InvalidLength => "Invalid field length detected",
            Self::OutOfMemory => "No dynamic memory available",
            Self::StringOverflow => "Max items in sized BIT or OCTET STRING field exceeded",
            Self::ConstraintViolation => "Value constraint violation: field %s, value %s",
            Self::RangeError => "Value range error: lower bound is greater than upper",
            Self::InvalidParam => "Invalid parameter passed to function or method",
            Self::InvalidFormat => "Invalid string format",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({})", self.code())
    }
}

/// What kind of constraint was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Integer outside `[lower, upper]`.
    Value { value: i128, lower: i128, upper: i128 },
    /// Adjusted whole number not below its range size.
    WholeNumber { value: u128, range: u128 },
    /// Item count outside every permitted size range.
    Size { length: usize },
    /// Character not in the permitted alphabet.
    Character { code: u32 },
    /// Decoded alphabet index past the end of the permitted alphabet.
    CharacterIndex { index: u64, alphabet: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value {
                value,
                lower,
                upper,
            } => write!(f, "value {value} outside [{lower}, {upper}]"),
            Self::WholeNumber { value, range } => {
                write!(f, "whole number {value} outside a range of {range}")
            }
            Self::Size { length } => write!(f, "size {length} not permitted"),
            Self::Character { code } => {
                write!(f, "character U+{code:04X} not in permitted alphabet")
            }
            Self::CharacterIndex { index, alphabet } => {
                write!(f, "alphabet index {index} past {alphabet} characters")
            }
        }
    }
}

/// Why an object identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidReason {
    TooFewArcs { count: usize },
    TooManyArcs { count: usize },
    FirstArc { arc: u32 },
    SecondArc { arc: u32 },
    ArcOverflow,
    Truncated,
}

impl fmt::Display for OidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewArcs { count } => write!(f, "{count} arcs, at least 2 required"),
            Self::TooManyArcs { count } => write!(f, "{count} arcs exceeds the maximum"),
            Self::FirstArc { arc } => write!(f, "first arc {arc} greater than 2"),
            Self::SecondArc { arc } => write!(f, "second arc {arc} greater than 39"),
            Self::ArcOverflow => write!(f, "sub-identifier overflows 32 bits"),
            Self::Truncated => write!(f, "sub-identifier runs past its length"),
        }
    }
}

/// Errors raised by the PER codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PerError {
    /// Bit buffer error (capacity, end of input, bad bit count).
    #[error("bit buffer: {0}")]
    Bitstream(#[from] BitError),

    #[error("constraint violation: {0}")]
    ConstraintViolation(Violation),

    #[error("range error: lower bound {lower} is greater than upper bound {upper}")]
    RangeError { lower: i128, upper: i128 },

    #[error("invalid object identifier: {0}")]
    InvalidObjectId(OidReason),

    #[error("invalid length {length}: {reason}")]
    InvalidLength { length: usize, reason: &'static str },

    #[error("arena needs {requested} bytes but is limited to {limit} bytes")]
    OutOfMemory { requested: usize, limit: usize },

    /// Decoded string does not fit the caller's buffer.
    #[error("string of {needed} bytes overflows a {capacity}-byte buffer")]
    StringOverflow { needed: usize, capacity: usize },

    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),

    #[error("invalid string format: {0}")]
    InvalidFormat(&'static str),
}

impl PerError {
    /// The status code recorded for this error.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Bitstream(err) => match err {
                BitError::EndOfBuffer { .. } => Status::EndOfBuffer,
                BitError::BufferOverflow { .. } => Status::BufferOverflow,
                BitError::OutOfMemory { .. } => Status::OutOfMemory,
                BitError::ReadOnly
                | BitError::InvalidBitCount { .. }
                | BitError::ValueOutOfRange { .. }
                | BitError::InvalidMark { .. } => Status::InvalidParam,
            },
            Self::ConstraintViolation(_) => Status::ConstraintViolation,
            Self::RangeError { .. } => Status::RangeError,
            Self::InvalidObjectId(_) => Status::InvalidObjectId,
            Self::InvalidLength { .. } => Status::InvalidLength,
            Self::OutOfMemory { .. } => Status::OutOfMemory,
            Self::StringOverflow { .. } => Status::StringOverflow,
            Self::InvalidParam(_) => Status::InvalidParam,
            Self::InvalidFormat(_) => Status::InvalidFormat,
        }
    }

    pub(crate) const fn value(value: i128, lower: i128, upper: i128) -> Self {
        Self::ConstraintViolation(Violation::Value {
            value,
            lower,
            upper,
        })
    }
}
