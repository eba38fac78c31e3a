//! Octet strings and bit strings.
//!
//! Both are a length determinant followed by the contents, repeated once
//! per fragment for values of 16K items or more. Decoded values either
//! borrow the input (fast copy, single fragment) or live in the type arena.

use std::ops::Deref;

use bytes::Bytes;
use tracing::trace;

use crate::constraint::string_needs_alignment;
use crate::diag::{log_err, log_fail};
use crate::error::{PerError, PerResult};
use crate::session::Session;

/// Decoded octets: a slice of the input or arena-owned bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Octets<'a> {
    Borrowed(&'a [u8]),
    Owned(Bytes),
}

impl Octets<'_> {
    #[must_use]
    pub const fn is_borrowed(&self) -> bool {
        matches!(self, Self::Borrowed(_))
    }

    /// Converts into owned bytes, copying a borrowed slice.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Borrowed(data) => Bytes::copy_from_slice(data),
            Self::Owned(bytes) => bytes,
        }
    }
}

impl Default for Octets<'_> {
    fn default() -> Self {
        Self::Borrowed(&[])
    }
}

impl Deref for Octets<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Borrowed(data) => data,
            Self::Owned(bytes) => bytes,
        }
    }
}

impl AsRef<[u8]> for Octets<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

/// A decoded bit string.
///
/// Bits beyond `bits` in the last octet are not part of the value; a
/// borrowed string may carry the next field's bits there.
#[derive(Debug, Clone, Default)]
pub struct BitString<'a> {
    bits: usize,
    data: Octets<'a>,
}

impl<'a> BitString<'a> {
    /// Wraps `data` holding `bits` bits, most significant first.
    ///
    /// Returns `None` when `data` is too short.
    #[must_use]
    pub fn new(bits: usize, data: Octets<'a>) -> Option<Self> {
        (bits.div_ceil(8) <= data.len()).then_some(Self { bits, data })
    }

    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bits
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Content octets, `bit_len().div_ceil(8)` of them.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.bits.div_ceil(8)]
    }

    #[must_use]
    pub const fn octets(&self) -> &Octets<'a> {
        &self.data
    }

    /// Bit `index`, counting from the most significant bit of the first octet.
    #[must_use]
    pub fn bit(&self, index: usize) -> Option<bool> {
        (index < self.bits).then(|| self.data[index / 8] & (0x80 >> (index % 8)) != 0)
    }
}

impl PartialEq for BitString<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits && (0..self.bits).all(|i| self.bit(i) == other.bit(i))
    }
}

impl Eq for BitString<'_> {}

impl<'a> Session<'a> {
    /// Encodes an octet string under the active size constraint.
    pub fn encode_octet_string(&mut self, data: &[u8]) -> PerResult<()> {
        let result = self.write_string(data, data.len(), false);
        log_err!(self, result);
        Ok(())
    }

    /// Encodes the first `bits` bits of `data` as a bit string.
    pub fn encode_bit_string(&mut self, bits: usize, data: &[u8]) -> PerResult<()> {
        if bits.div_ceil(8) > data.len() {
            log_fail!(
                self,
                PerError::InvalidParam("bit string data shorter than its bit count")
            );
        }
        let result = self.write_string(data, bits, true);
        log_err!(self, result);
        Ok(())
    }

    fn write_string(&mut self, data: &[u8], count: usize, bit_string: bool) -> PerResult<()> {
        let item_bits = if bit_string { 1 } else { 8 };
        let mut constraint = self.size_constraint.clone();
        let mut remaining = count;
        let mut offset = 0usize;
        loop {
            let determinant = self.encode_length(remaining)?;
            let chunk = determinant.count();
            if chunk > 0 {
                if string_needs_alignment(constraint.as_ref(), remaining, bit_string)? {
                    self.buffer.align();
                }
                self.buffer.write_octets(&data[offset / 8..], chunk * item_bits)?;
            }
            constraint = None;
            remaining -= chunk;
            offset += chunk * item_bits;
            if !determinant.is_fragment() {
                return Ok(());
            }
        }
    }

    /// Decodes an octet string under the active size constraint.
    ///
    /// With [`SessionConfig::fast_copy`](crate::SessionConfig::fast_copy)
    /// set, an unfragmented value borrows the input. Anything else is copied
    /// into the type arena.
    pub fn decode_octet_string(&mut self) -> PerResult<Octets<'a>> {
        let result = self.read_string_value(false);
        Ok(log_err!(self, result).1)
    }

    /// Decodes a bit string under the active size constraint.
    pub fn decode_bit_string(&mut self) -> PerResult<BitString<'a>> {
        let result = self.read_string_value(true);
        let (bits, data) = log_err!(self, result);
        Ok(BitString { bits, data })
    }

    /// Decodes an octet string into `dst`, returning the octet count.
    ///
    /// # Errors
    ///
    /// [`PerError::StringOverflow`] when `dst` is too small.
    pub fn decode_octet_string_into(&mut self, dst: &mut [u8]) -> PerResult<usize> {
        let result = self.read_string_into(dst, false);
        Ok(log_err!(self, result))
    }

    /// Decodes a bit string into `dst`, returning the bit count.
    pub fn decode_bit_string_into(&mut self, dst: &mut [u8]) -> PerResult<usize> {
        let result = self.read_string_into(dst, true);
        Ok(log_err!(self, result))
    }

    pub(crate) fn read_string_into(
        &mut self,
        dst: &mut [u8],
        bit_string: bool,
    ) -> PerResult<usize> {
        let item_bits = if bit_string { 1 } else { 8 };
        let mut constraint = self.size_constraint.clone();
        let mut total = 0usize;
        let mut offset = 0usize;
        loop {
            let determinant = self.decode_length()?;
            let chunk = determinant.count();
            let bits = chunk * item_bits;
            if chunk > 0 {
                if string_needs_alignment(constraint.as_ref(), chunk, bit_string)? {
                    self.buffer.align();
                }
                let end = (offset + bits).div_ceil(8);
                if end > dst.len() {
                    return Err(PerError::StringOverflow {
                        needed: end,
                        capacity: dst.len(),
                    });
                }
                self.buffer.read_octets(&mut dst[offset / 8..end], bits)?;
            }
            constraint = None;
            total += chunk;
            offset += bits;
            if !determinant.is_fragment() {
                return Ok(total);
            }
        }
    }

    fn read_string_value(&mut self, bit_string: bool) -> PerResult<(usize, Octets<'a>)> {
        if self.config().fast_copy {
            if let Some(value) = self.borrow_string(bit_string)? {
                return Ok(value);
            }
        }
        let item_bits = if bit_string { 1 } else { 8 };
        let count = self.component_length(item_bits)?;
        let mut storage = self.type_arena().alloc((count * item_bits).div_ceil(8))?;
        let decoded = self.read_string_into(&mut storage, bit_string)?;
        if self.config().trace {
            trace!(count = decoded, bit_string, "string copied into arena");
        }
        Ok((decoded, Octets::Owned(storage.freeze())))
    }

    /// Decodes an unfragmented string in place. Returns `None`, consuming
    /// nothing, when the value is fragmented.
    fn borrow_string(&mut self, bit_string: bool) -> PerResult<Option<(usize, Octets<'a>)>> {
        let probe = self.sub_session().decode_length();
        if !matches!(probe, Ok(determinant) if !determinant.is_fragment()) {
            return Ok(None);
        }
        let constraint = self.size_constraint.clone();
        let count = self.decode_length()?.count();
        if count == 0 {
            return Ok(Some((0, Octets::default())));
        }
        if string_needs_alignment(constraint.as_ref(), count, bit_string)? {
            self.buffer.align();
        }
        let bits = if bit_string { count } else { count * 8 };
        let data = match self.buffer.take_borrowed(bits)? {
            Some(slice) => Octets::Borrowed(slice),
            None => {
                let mut storage = self.type_arena().alloc(bits.div_ceil(8))?;
                self.buffer.read_octets(&mut storage, bits)?;
                Octets::Owned(storage.freeze())
            }
        };
        if self.config().trace {
            trace!(
                count,
                borrowed = data.is_borrowed(),
                bit_string,
                "string decoded in one piece"
            );
        }
        Ok(Some((count, data)))
    }
}
