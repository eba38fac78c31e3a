//! Whole numbers and integers: constrained, semi-constrained, unconstrained
//! and small non-negative.

use crate::diag::{log_err, log_fail};
use crate::error::{PerError, PerResult, Violation};
use crate::length::LengthDeterminant;
use crate::session::Session;

/// Largest range a constrained whole number can span.
const MAX_WHOLE_NUMBER_RANGE: u128 = 1 << 64;

/// Octets in the longest semi-constrained encoding (a shifted `i64`/`u64`).
const MAX_INTEGER_OCTETS: usize = 9;

/// Number of significant bits in `value`; 0 for 0.
pub(crate) const fn bit_count(value: u128) -> u8 {
    (u128::BITS - value.leading_zeros()) as u8
}

/// Octets in the minimal non-negative binary encoding of `value` (at least 1).
pub(crate) const fn unsigned_octets(value: u128) -> usize {
    let bits = bit_count(value) as usize;
    if bits == 0 {
        1
    } else {
        bits.div_ceil(8)
    }
}

/// Octets in the minimal two's-complement encoding of `value`: the leading
/// nine bits are never all zeros or all ones.
pub(crate) const fn signed_octets(value: i128) -> usize {
    let significant = if value < 0 {
        i128::BITS - value.leading_ones()
    } else {
        i128::BITS - value.leading_zeros()
    };
    (significant as usize + 1).div_ceil(8)
}

fn signed_from_be(octets: &[u8]) -> i128 {
    let fill = if octets.first().is_some_and(|b| b & 0x80 != 0) {
        0xFF
    } else {
        0x00
    };
    let mut raw = [fill; 16];
    raw[16 - octets.len()..].copy_from_slice(octets);
    i128::from_be_bytes(raw)
}

fn unsigned_from_be(octets: &[u8]) -> u128 {
    octets
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b))
}

impl Session<'_> {
    /// Encodes `adjusted` (a value already offset by its lower bound) as a
    /// constrained whole number over `range` values.
    ///
    /// | range | encoding |
    /// |---|---|
    /// | 1..=255 | bit field of `bit_count(range - 1)` bits |
    /// | 256 | one aligned octet |
    /// | 257..=65536 | two aligned octets |
    /// | larger | octet count in a bit field, then aligned minimal octets |
    pub fn encode_constrained_whole_number(
        &mut self,
        adjusted: u64,
        range: u128,
    ) -> PerResult<()> {
        let result = self.write_whole_number(adjusted, range);
        log_err!(self, result);
        Ok(())
    }

    fn write_whole_number(&mut self, adjusted: u64, range: u128) -> PerResult<()> {
        check_range(range)?;
        if u128::from(adjusted) >= range {
            return Err(PerError::ConstraintViolation(Violation::WholeNumber {
                value: u128::from(adjusted),
                range,
            }));
        }
        if range <= 255 {
            self.buffer.write_bits(adjusted, bit_count(range - 1))?;
        } else if range == 256 {
            self.buffer.align();
            self.buffer.write_bits(adjusted, 8)?;
        } else if range <= 65_536 {
            self.buffer.align();
            self.buffer.write_bits(adjusted, 16)?;
        } else {
            let max_octets = unsigned_octets(range - 1);
            let octets = unsigned_octets(u128::from(adjusted));
            self.buffer
                .write_bits((octets - 1) as u64, bit_count((max_octets - 1) as u128))?;
            self.buffer.align();
            self.buffer.write_bits(adjusted, (octets * 8) as u8)?;
        }
        Ok(())
    }

    /// Decodes a constrained whole number over `range` values.
    pub fn decode_constrained_whole_number(&mut self, range: u128) -> PerResult<u64> {
        let result = self.read_whole_number(range);
        Ok(log_err!(self, result))
    }

    fn read_whole_number(&mut self, range: u128) -> PerResult<u64> {
        check_range(range)?;
        let value = if range <= 255 {
            self.buffer.read_bits(bit_count(range - 1))?
        } else if range == 256 {
            self.buffer.align();
            self.buffer.read_bits(8)?
        } else if range <= 65_536 {
            self.buffer.align();
            self.buffer.read_bits(16)?
        } else {
            let max_octets = unsigned_octets(range - 1);
            let octets = self
                .buffer
                .read_bits(bit_count((max_octets - 1) as u128))? as usize
                + 1;
            if octets > max_octets {
                return Err(PerError::InvalidLength {
                    length: octets,
                    reason: "whole number wider than its range",
                });
            }
            self.buffer.align();
            self.buffer.read_bits((octets * 8) as u8)?
        };
        if u128::from(value) >= range {
            return Err(PerError::ConstraintViolation(Violation::WholeNumber {
                value: u128::from(value),
                range,
            }));
        }
        Ok(value)
    }

    /// Encodes `value` constrained to `lower..=upper`.
    ///
    /// Nothing is written when `lower == upper`.
    pub fn encode_constrained_integer(
        &mut self,
        value: i64,
        lower: i64,
        upper: i64,
    ) -> PerResult<()> {
        if lower > upper {
            log_fail!(self, range_error(lower.into(), upper.into()));
        }
        if value < lower || value > upper {
            log_fail!(self, PerError::value(value.into(), lower.into(), upper.into()));
        }
        if lower == upper {
            return Ok(());
        }
        let range = (i128::from(upper) - i128::from(lower) + 1) as u128;
        let adjusted = (i128::from(value) - i128::from(lower)) as u64;
        log_err!(self, self.write_whole_number(adjusted, range));
        Ok(())
    }

    pub fn decode_constrained_integer(&mut self, lower: i64, upper: i64) -> PerResult<i64> {
        if lower > upper {
            log_fail!(self, range_error(lower.into(), upper.into()));
        }
        if lower == upper {
            return Ok(lower);
        }
        let range = (i128::from(upper) - i128::from(lower) + 1) as u128;
        let adjusted = log_err!(self, self.read_whole_number(range));
        let value = i128::from(lower) + i128::from(adjusted);
        match i64::try_from(value) {
            Ok(value) if value <= upper => Ok(value),
            _ => log_fail!(self, PerError::value(value, lower.into(), upper.into())),
        }
    }

    /// Unsigned counterpart of [`Session::encode_constrained_integer`].
    pub fn encode_constrained_unsigned(
        &mut self,
        value: u64,
        lower: u64,
        upper: u64,
    ) -> PerResult<()> {
        if lower > upper {
            log_fail!(self, range_error(lower.into(), upper.into()));
        }
        if value < lower || value > upper {
            log_fail!(self, PerError::value(value.into(), lower.into(), upper.into()));
        }
        if lower == upper {
            return Ok(());
        }
        let range = u128::from(upper - lower) + 1;
        log_err!(self, self.write_whole_number(value - lower, range));
        Ok(())
    }

    pub fn decode_constrained_unsigned(&mut self, lower: u64, upper: u64) -> PerResult<u64> {
        if lower > upper {
            log_fail!(self, range_error(lower.into(), upper.into()));
        }
        if lower == upper {
            return Ok(lower);
        }
        let range = u128::from(upper - lower) + 1;
        let adjusted = log_err!(self, self.read_whole_number(range));
        match lower.checked_add(adjusted) {
            Some(value) if value <= upper => Ok(value),
            _ => log_fail!(
                self,
                PerError::value(
                    i128::from(lower) + i128::from(adjusted),
                    lower.into(),
                    upper.into()
                )
            ),
        }
    }

    /// Encodes `value` with only a lower bound: an unconstrained length
    /// followed by the minimal two's-complement octets of `value - lower`.
    ///
    /// A `lower` of `i64::MIN` means no lower bound and no offset.
    pub fn encode_semi_constrained_integer(&mut self, value: i64, lower: i64) -> PerResult<()> {
        if value < lower {
            log_fail!(self, PerError::value(value.into(), lower.into(), i64::MAX.into()));
        }
        let offset = if lower == i64::MIN { 0 } else { i128::from(lower) };
        let shifted = i128::from(value) - offset;
        let octets = signed_octets(shifted);
        log_err!(self, self.write_integer_octets(&shifted.to_be_bytes(), octets));
        Ok(())
    }

    pub fn decode_semi_constrained_integer(&mut self, lower: i64) -> PerResult<i64> {
        let (raw, len) = log_err!(self, self.read_integer_octets());
        let offset = if lower == i64::MIN { 0 } else { i128::from(lower) };
        let value = signed_from_be(&raw[MAX_INTEGER_OCTETS - len..]) + offset;
        match i64::try_from(value) {
            Ok(value) if value >= lower => Ok(value),
            _ => log_fail!(self, PerError::value(value, lower.into(), i64::MAX.into())),
        }
    }

    /// Encodes a two's-complement integer with no bounds.
    pub fn encode_unconstrained_integer(&mut self, value: i64) -> PerResult<()> {
        self.encode_semi_constrained_integer(value, i64::MIN)
    }

    pub fn decode_unconstrained_integer(&mut self) -> PerResult<i64> {
        self.decode_semi_constrained_integer(i64::MIN)
    }

    /// Encodes `value` with only a lower bound as a minimal non-negative
    /// binary integer of `value - lower`.
    pub fn encode_semi_constrained_unsigned(&mut self, value: u64, lower: u64) -> PerResult<()> {
        if value < lower {
            log_fail!(self, PerError::value(value.into(), lower.into(), u64::MAX.into()));
        }
        let adjusted = u128::from(value - lower);
        let octets = unsigned_octets(adjusted);
        log_err!(self, self.write_integer_octets(&adjusted.to_be_bytes(), octets));
        Ok(())
    }

    pub fn decode_semi_constrained_unsigned(&mut self, lower: u64) -> PerResult<u64> {
        let (raw, len) = log_err!(self, self.read_integer_octets());
        let adjusted = unsigned_from_be(&raw[MAX_INTEGER_OCTETS - len..]);
        let value = u128::from(lower) + adjusted;
        match u64::try_from(value) {
            Ok(value) => Ok(value),
            Err(_) => log_fail!(
                self,
                PerError::value(
                    i128::try_from(value).unwrap_or(i128::MAX),
                    lower.into(),
                    u64::MAX.into()
                )
            ),
        }
    }

    /// Encodes a normally small non-negative whole number (extension
    /// addition counts, choice indices past the root).
    ///
    /// Values below 64 take seven bits. Larger values take a marker bit, an
    /// unconstrained length and aligned minimal octets.
    pub fn encode_small_whole_number(&mut self, value: u64) -> PerResult<()> {
        if value < 64 {
            log_err!(self, self.buffer.write_bits(value, 7));
            return Ok(());
        }
        log_err!(self, self.buffer.write_bit(true));
        let octets = unsigned_octets(u128::from(value));
        log_err!(
            self,
            self.write_integer_octets(&u128::from(value).to_be_bytes(), octets)
        );
        Ok(())
    }

    pub fn decode_small_whole_number(&mut self) -> PerResult<u64> {
        if !log_err!(self, self.buffer.read_bit()) {
            return Ok(log_err!(self, self.buffer.read_bits(6)));
        }
        let (raw, len) = log_err!(self, self.read_integer_octets());
        let value = unsigned_from_be(&raw[MAX_INTEGER_OCTETS - len..]);
        match u64::try_from(value) {
            Ok(value) => Ok(value),
            Err(_) => log_fail!(
                self,
                PerError::InvalidLength {
                    length: len,
                    reason: "small whole number wider than 64 bits",
                }
            ),
        }
    }

    /// Writes the last `octets` bytes of the 16-byte big-endian `be`,
    /// prefixed with their unconstrained length.
    fn write_integer_octets(&mut self, be: &[u8; 16], octets: usize) -> PerResult<()> {
        self.encode_unconstrained_length(octets)?;
        self.buffer.align();
        self.buffer.write_octets(&be[16 - octets..], octets * 8)?;
        Ok(())
    }

    /// Reads a length-prefixed integer. The octets are right-aligned in the
    /// returned array, followed by their count.
    fn read_integer_octets(&mut self) -> PerResult<([u8; MAX_INTEGER_OCTETS], usize)> {
        let octets = match self.decode_unconstrained_length()? {
            LengthDeterminant::Complete(n) if (1..=MAX_INTEGER_OCTETS).contains(&n) => n,
            determinant => {
                return Err(PerError::InvalidLength {
                    length: determinant.count(),
                    reason: "integer length outside 1..=9 octets",
                })
            }
        };
        self.buffer.align();
        let mut raw = [0u8; MAX_INTEGER_OCTETS];
        self.buffer
            .read_octets(&mut raw[MAX_INTEGER_OCTETS - octets..], octets * 8)?;
        Ok((raw, octets))
    }
}

const fn check_range(range: u128) -> PerResult<()> {
    if range == 0 || range > MAX_WHOLE_NUMBER_RANGE {
        Err(PerError::InvalidParam("whole number range must be 1..=2^64"))
    } else {
        Ok(())
    }
}

const fn range_error(lower: i128, upper: i128) -> PerError {
    PerError::RangeError { lower, upper }
}
