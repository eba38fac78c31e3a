//! Length determinants, including fragmentation of long values.

use std::fmt;

use tracing::trace;

use crate::constraint::{SizeRange, CONSTRAINED_LENGTH_LIMIT};
use crate::diag::{log_err, log_fail};
use crate::error::{PerError, PerResult, Status, Violation};
use crate::session::Session;

/// Items per fragment unit.
pub const FRAGMENT_UNIT: usize = 16_384;

/// Largest fragment multiplier.
const MAX_FRAGMENT_MULTIPLIER: usize = 4;

/// Outcome of a length determinant.
///
/// `Fragment(n)` means `n` items follow and another determinant comes after
/// them; callers loop until `Complete`. It is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthDeterminant {
    Complete(usize),
    Fragment(usize),
}

impl LengthDeterminant {
    /// Number of items covered by this determinant.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Complete(n) | Self::Fragment(n) => n,
        }
    }

    #[must_use]
    pub const fn is_fragment(self) -> bool {
        matches!(self, Self::Fragment(_))
    }

    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            Self::Complete(_) => Status::Ok,
            Self::Fragment(_) => Status::Fragment,
        }
    }
}

impl fmt::Display for LengthDeterminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(n) => write!(f, "{n}"),
            Self::Fragment(n) => write!(f, "{n} (fragment)"),
        }
    }
}

impl Session<'_> {
    /// Encodes a length under the active size constraint, consuming it.
    ///
    /// With an extensible constraint an extension bit comes first. Lengths
    /// whose selected range ends below 64K are constrained whole numbers
    /// (nothing at all for a fixed size). Otherwise the length is octet
    /// aligned: one octet below 128, two octets below 16K, and a fragment
    /// of up to 64K items beyond that.
    pub fn encode_length(&mut self, length: usize) -> PerResult<LengthDeterminant> {
        let constraint = self.size_constraint.take();
        let mut range = None;
        if let Some(constraint) = &constraint {
            let Some(selected) = constraint.check(length) else {
                log_fail!(self, PerError::ConstraintViolation(Violation::Size { length }));
            };
            if constraint.is_extensible() {
                log_err!(self, self.buffer.write_bit(selected.extended));
            }
            range = Some(selected);
        }
        if self.config().trace {
            trace!(length, ?range, "encode length");
        }

        match range {
            Some(SizeRange { lower, upper, .. }) if upper < CONSTRAINED_LENGTH_LIMIT => {
                if lower != upper {
                    let range = (upper - lower + 1) as u128;
                    log_err!(
                        self,
                        self.encode_constrained_whole_number((length - lower) as u64, range)
                    );
                }
                Ok(LengthDeterminant::Complete(length))
            }
            _ => Ok(log_err!(self, self.encode_unconstrained_length(length))),
        }
    }

    pub(crate) fn encode_unconstrained_length(
        &mut self,
        length: usize,
    ) -> PerResult<LengthDeterminant> {
        self.buffer.align();
        if length < 128 {
            self.buffer.write_bits(length as u64, 8)?;
            Ok(LengthDeterminant::Complete(length))
        } else if length < FRAGMENT_UNIT {
            self.buffer.write_bits(0x8000 | length as u64, 16)?;
            Ok(LengthDeterminant::Complete(length))
        } else {
            let multiplier = (length / FRAGMENT_UNIT).min(MAX_FRAGMENT_MULTIPLIER);
            self.buffer.write_bits(0xC0 | multiplier as u64, 8)?;
            Ok(LengthDeterminant::Fragment(multiplier * FRAGMENT_UNIT))
        }
    }

    /// Decodes a length under the active size constraint, consuming it.
    pub fn decode_length(&mut self) -> PerResult<LengthDeterminant> {
        let constraint = self.size_constraint.take();
        let mut extension = false;
        if constraint.as_ref().is_some_and(|c| c.is_extensible()) {
            extension = log_err!(self, self.buffer.read_bit());
        }
        let range = constraint.as_ref().and_then(|c| c.select(extension));

        let determinant = match range {
            Some(SizeRange { lower, upper, .. }) if upper < CONSTRAINED_LENGTH_LIMIT => {
                let length = if lower == upper {
                    lower
                } else {
                    let range = (upper - lower + 1) as u128;
                    lower + log_err!(self, self.decode_constrained_whole_number(range)) as usize
                };
                LengthDeterminant::Complete(length)
            }
            _ => log_err!(self, self.decode_unconstrained_length()),
        };
        if self.config().trace {
            trace!(%determinant, extension, "decode length");
        }
        Ok(determinant)
    }

    pub(crate) fn decode_unconstrained_length(&mut self) -> PerResult<LengthDeterminant> {
        self.buffer.align();
        let first = self.buffer.read_bits(8)? as usize;
        if first & 0x80 == 0 {
            return Ok(LengthDeterminant::Complete(first));
        }
        if first & 0x40 == 0 {
            let second = self.buffer.read_bits(8)? as usize;
            return Ok(LengthDeterminant::Complete(((first & 0x3F) << 8) | second));
        }
        let multiplier = first & 0x3F;
        if multiplier == 0 || multiplier > MAX_FRAGMENT_MULTIPLIER {
            return Err(PerError::InvalidLength {
                length: multiplier,
                reason: "fragment multiplier outside 1..=4",
            });
        }
        Ok(LengthDeterminant::Fragment(multiplier * FRAGMENT_UNIT))
    }

    /// Total item count of the (possibly fragmented) field at the cursor.
    ///
    /// Scans ahead in a sub-session, skipping `item_bits` per item of each
    /// fragment, so this session's cursor and constraint are untouched.
    pub fn component_length(&mut self, item_bits: usize) -> PerResult<usize> {
        let result = self.sub_session().scan_component(item_bits);
        Ok(log_err!(self, result))
    }

    fn scan_component(&mut self, item_bits: usize) -> PerResult<usize> {
        let mut total = 0usize;
        loop {
            let determinant = self.decode_length()?;
            let count = determinant.count();
            total = total.checked_add(count).ok_or(PerError::InvalidLength {
                length: count,
                reason: "component length overflows",
            })?;
            if !determinant.is_fragment() {
                return Ok(total);
            }
            self.buffer.skip_bits(count * item_bits)?;
        }
    }
}
