//! Restricted character strings.
//!
//! 8-bit strings (numeric, printable, visible, IA5, teletex, general) go
//! through a [`CharSet`]; BMP and universal strings through a
//! [`WideCharSet`]. Each character is either its own code in the aligned
//! width or its index in the permitted alphabet, whichever the set selects.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constraint::char_string_needs_alignment;
use crate::diag::log_err;
use crate::error::{PerError, PerResult, Violation};
use crate::integer::bit_count;
use crate::length::LengthDeterminant;
use crate::session::Session;

const NUMERIC: &[u8] = b" 0123456789";
const PRINTABLE: &[u8] =
    b" '()+,-./0123456789:=?ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const TELETEX: &[u8] =
    b" !\"%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[]_abcdefghijklmnopqrstuvwxyz";

/// Aligned width for `bits` unaligned bits: the next power of two.
fn aligned_width(bits: u8) -> u8 {
    if bits <= 1 {
        bits
    } else {
        bits.next_power_of_two()
    }
}

/// Permitted alphabet and widths of an 8-bit character string type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharSet {
    chars: Vec<u8>,
    aligned_bits: u8,
    unaligned_bits: u8,
    canonical_bits: u8,
}

impl CharSet {
    fn canonical(chars: impl Into<Vec<u8>>, aligned_bits: u8, bits: u8) -> Self {
        let mut chars = chars.into();
        chars.sort_unstable();
        chars.dedup();
        Self {
            chars,
            aligned_bits,
            unaligned_bits: bits,
            canonical_bits: bits,
        }
    }

    /// NumericString: space and digits, 4 bits each.
    #[must_use]
    pub fn numeric() -> Self {
        Self::canonical(NUMERIC, 4, 4)
    }

    #[must_use]
    pub fn printable() -> Self {
        Self::canonical(PRINTABLE, 8, 7)
    }

    /// VisibleString: `0x20..=0x7E`.
    #[must_use]
    pub fn visible() -> Self {
        Self::canonical((0x20..=0x7E).collect::<Vec<u8>>(), 8, 7)
    }

    /// IA5String: `0x00..=0x7F`.
    #[must_use]
    pub fn ia5() -> Self {
        Self::canonical((0x00..=0x7F).collect::<Vec<u8>>(), 8, 7)
    }

    /// TeletexString (T61String).
    #[must_use]
    pub fn teletex() -> Self {
        Self::canonical(TELETEX, 8, 7)
    }

    /// GeneralString and other 8-bit strings: every octet.
    #[must_use]
    pub fn general() -> Self {
        Self::canonical((0x00..=0xFF).collect::<Vec<u8>>(), 8, 8)
    }

    /// Restricts this set to a permitted alphabet (`FROM("...")`).
    ///
    /// Widths are recomputed from the alphabet size; characters outside the
    /// set are kept out only by [`Session::encode_constrained_string`].
    #[must_use]
    pub fn with_alphabet(&self, alphabet: &[u8]) -> Self {
        let mut chars = alphabet.to_vec();
        chars.sort_unstable();
        chars.dedup();
        let unaligned_bits = bit_count(chars.len().saturating_sub(1) as u128);
        Self {
            chars,
            aligned_bits: aligned_width(unaligned_bits),
            unaligned_bits,
            canonical_bits: self.canonical_bits,
        }
    }

    #[must_use]
    pub fn chars(&self) -> &[u8] {
        &self.chars
    }

    #[must_use]
    pub const fn aligned_bits(&self) -> u8 {
        self.aligned_bits
    }

    #[must_use]
    pub const fn unaligned_bits(&self) -> u8 {
        self.unaligned_bits
    }

    #[must_use]
    pub const fn canonical_bits(&self) -> u8 {
        self.canonical_bits
    }

    /// Whether characters go on the wire as their own codes rather than as
    /// alphabet indices.
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        self.aligned_bits >= self.canonical_bits && self.canonical_bits > 4
    }

    fn index_of(&self, code: u8) -> Option<usize> {
        self.chars.binary_search(&code).ok()
    }

    fn to_wire(&self, ch: char) -> PerResult<u64> {
        let code = u32::from(ch);
        let index = u8::try_from(code).ok().and_then(|byte| self.index_of(byte));
        match index {
            Some(_) if self.is_direct() => Ok(u64::from(code)),
            Some(index) => Ok(index as u64),
            None => Err(PerError::ConstraintViolation(Violation::Character { code })),
        }
    }

    fn from_wire(&self, value: u64) -> PerResult<char> {
        if self.is_direct() {
            return match u8::try_from(value) {
                Ok(code) if self.index_of(code).is_some() => Ok(char::from(code)),
                _ => Err(PerError::ConstraintViolation(Violation::Character {
                    code: value as u32,
                })),
            };
        }
        usize::try_from(value)
            .ok()
            .and_then(|index| self.chars.get(index))
            .map(|&code| char::from(code))
            .ok_or(PerError::ConstraintViolation(Violation::CharacterIndex {
                index: value,
                alphabet: self.chars.len(),
            }))
    }
}

/// Permitted characters of a BMP or universal string.
///
/// Either a contiguous range, encoded as the offset from its first code,
/// or a discrete alphabet, encoded as an index into it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WideCharSet {
    first: u32,
    last: u32,
    alphabet: Option<Vec<u32>>,
    aligned_bits: u8,
    unaligned_bits: u8,
}

impl WideCharSet {
    /// BMPString: `0..=0xFFFF`, 16 bits.
    #[must_use]
    pub const fn bmp() -> Self {
        Self {
            first: 0,
            last: 0xFFFF,
            alphabet: None,
            aligned_bits: 16,
            unaligned_bits: 16,
        }
    }

    /// UniversalString: 32 bits.
    #[must_use]
    pub const fn universal() -> Self {
        Self {
            first: 0,
            last: u32::MAX,
            alphabet: None,
            aligned_bits: 32,
            unaligned_bits: 32,
        }
    }

    /// `FROM(first..last)`.
    ///
    /// Returns `None` if `first > last`.
    #[must_use]
    pub fn with_range(first: u32, last: u32) -> Option<Self> {
        if first > last {
            return None;
        }
        let unaligned_bits = bit_count(u128::from(last - first));
        Some(Self {
            first,
            last,
            alphabet: None,
            aligned_bits: aligned_width(unaligned_bits),
            unaligned_bits,
        })
    }

    /// `FROM("...")` over a discrete set of code points.
    #[must_use]
    pub fn with_alphabet(alphabet: &[u32]) -> Self {
        let mut chars = alphabet.to_vec();
        chars.sort_unstable();
        chars.dedup();
        let unaligned_bits = bit_count(chars.len().saturating_sub(1) as u128);
        Self {
            first: chars.first().copied().unwrap_or(0),
            last: chars.last().copied().unwrap_or(0),
            alphabet: Some(chars),
            aligned_bits: aligned_width(unaligned_bits),
            unaligned_bits,
        }
    }

    #[must_use]
    pub const fn aligned_bits(&self) -> u8 {
        self.aligned_bits
    }

    #[must_use]
    pub const fn unaligned_bits(&self) -> u8 {
        self.unaligned_bits
    }

    fn to_wire(&self, code: u32) -> PerResult<u64> {
        let wire = match &self.alphabet {
            Some(chars) => chars.binary_search(&code).ok().map(|index| index as u64),
            None => (self.first..=self.last)
                .contains(&code)
                .then(|| u64::from(code - self.first)),
        };
        wire.ok_or(PerError::ConstraintViolation(Violation::Character { code }))
    }

    fn from_wire(&self, value: u64) -> PerResult<u32> {
        let code = match &self.alphabet {
            Some(chars) => usize::try_from(value)
                .ok()
                .and_then(|index| chars.get(index))
                .copied(),
            None => u64::from(self.first)
                .checked_add(value)
                .and_then(|code| u32::try_from(code).ok())
                .filter(|&code| code <= self.last),
        };
        code.ok_or(PerError::ConstraintViolation(Violation::CharacterIndex {
            index: value,
            alphabet: self
                .alphabet
                .as_ref()
                .map_or(((self.last - self.first) as usize).saturating_add(1), Vec::len),
        }))
    }
}

impl Session<'_> {
    /// Encodes an 8-bit character string under the active size constraint.
    ///
    /// # Errors
    ///
    /// [`PerError::ConstraintViolation`] for a character outside `charset`.
    pub fn encode_constrained_string(
        &mut self,
        value: &str,
        charset: &CharSet,
    ) -> PerResult<()> {
        let result = self.write_char_string(value, charset);
        log_err!(self, result);
        Ok(())
    }

    fn write_char_string(&mut self, value: &str, charset: &CharSet) -> PerResult<()> {
        let codes = value
            .chars()
            .map(|ch| charset.to_wire(ch))
            .collect::<PerResult<Vec<u64>>>()?;
        let bits = charset.aligned_bits();
        let mut constraint = self.size_constraint.clone();
        let mut rest = codes.as_slice();
        loop {
            let determinant = self.encode_length(rest.len())?;
            let (chunk, tail) = rest.split_at(determinant.count());
            if char_string_needs_alignment(constraint.as_ref(), rest.len(), bits) {
                self.buffer.align();
            }
            for &code in chunk {
                self.buffer.write_bits(code, bits)?;
            }
            constraint = None;
            rest = tail;
            if !determinant.is_fragment() {
                return Ok(());
            }
        }
    }

    /// Decodes an 8-bit character string under the active size constraint.
    pub fn decode_constrained_string(&mut self, charset: &CharSet) -> PerResult<String> {
        let result = self.read_char_string(charset);
        Ok(log_err!(self, result))
    }

    fn read_char_string(&mut self, charset: &CharSet) -> PerResult<String> {
        let bits = charset.aligned_bits();
        let mut constraint = self.size_constraint.clone();
        let mut value = String::new();
        loop {
            let determinant = self.decode_length()?;
            let count = determinant.count();
            if char_string_needs_alignment(constraint.as_ref(), count, bits) {
                self.buffer.align();
            }
            self.buffer
                .ensure_readable(count.saturating_mul(usize::from(bits)))?;
            value.reserve(count);
            for _ in 0..count {
                let code = self.buffer.read_bits(bits)?;
                value.push(charset.from_wire(code)?);
            }
            constraint = None;
            if !determinant.is_fragment() {
                return Ok(value);
            }
        }
    }

    /// Encodes a BMPString, restricted to `permitted` when given.
    ///
    /// Characters are always octet aligned.
    pub fn encode_bmp_string(
        &mut self,
        value: &str,
        permitted: Option<&WideCharSet>,
    ) -> PerResult<()> {
        let bmp = WideCharSet::bmp();
        let result = self.write_wide_string(value, permitted.unwrap_or(&bmp));
        log_err!(self, result);
        Ok(())
    }

    pub fn decode_bmp_string(&mut self, permitted: Option<&WideCharSet>) -> PerResult<String> {
        let bmp = WideCharSet::bmp();
        let result = self.read_wide_string(permitted.unwrap_or(&bmp));
        Ok(log_err!(self, result))
    }

    /// Encodes a UniversalString, restricted to `permitted` when given.
    pub fn encode_universal_string(
        &mut self,
        value: &str,
        permitted: Option<&WideCharSet>,
    ) -> PerResult<()> {
        let universal = WideCharSet::universal();
        let result = self.write_wide_string(value, permitted.unwrap_or(&universal));
        log_err!(self, result);
        Ok(())
    }

    pub fn decode_universal_string(
        &mut self,
        permitted: Option<&WideCharSet>,
    ) -> PerResult<String> {
        let universal = WideCharSet::universal();
        let result = self.read_wide_string(permitted.unwrap_or(&universal));
        Ok(log_err!(self, result))
    }

    fn write_wide_string(&mut self, value: &str, charset: &WideCharSet) -> PerResult<()> {
        let codes = value
            .chars()
            .map(|ch| charset.to_wire(u32::from(ch)))
            .collect::<PerResult<Vec<u64>>>()?;
        let bits = charset.aligned_bits();
        let mut rest = codes.as_slice();
        loop {
            let determinant = self.encode_length(rest.len())?;
            let (chunk, tail) = rest.split_at(determinant.count());
            self.buffer.align();
            for &code in chunk {
                self.buffer.write_bits(code, bits)?;
            }
            rest = tail;
            if !determinant.is_fragment() {
                return Ok(());
            }
        }
    }

    fn read_wide_string(&mut self, charset: &WideCharSet) -> PerResult<String> {
        let bits = charset.aligned_bits();
        let mut value = String::new();
        loop {
            let determinant = self.decode_length()?;
            let count = determinant.count();
            self.buffer.align();
            self.buffer
                .ensure_readable(count.saturating_mul(usize::from(bits)))?;
            value.reserve(count);
            for _ in 0..count {
                let code = charset.from_wire(self.buffer.read_bits(bits)?)?;
                let ch = char::from_u32(code)
                    .ok_or(PerError::InvalidFormat("code point is not a character"))?;
                value.push(ch);
            }
            if !determinant.is_fragment() {
                return Ok(value);
            }
        }
    }

    /// Encodes a UTF8String (or another string carried as raw octets):
    /// a length in octets, then the octets.
    pub fn encode_var_width_string(&mut self, value: &str) -> PerResult<()> {
        let result = self.write_var_width_string(value.as_bytes());
        log_err!(self, result);
        Ok(())
    }

    fn write_var_width_string(&mut self, octets: &[u8]) -> PerResult<()> {
        let mut constraint = self.size_constraint.clone();
        let mut rest = octets;
        loop {
            let determinant = self.encode_length(rest.len())?;
            let (chunk, tail) = rest.split_at(determinant.count());
            if char_string_needs_alignment(constraint.as_ref(), rest.len(), 8) {
                self.buffer.align();
            }
            self.buffer.write_octets(chunk, chunk.len() * 8)?;
            constraint = None;
            rest = tail;
            if !determinant.is_fragment() {
                return Ok(());
            }
        }
    }

    /// Decodes a UTF8String.
    ///
    /// # Errors
    ///
    /// [`PerError::InvalidFormat`] when the octets are not UTF-8.
    pub fn decode_var_width_string(&mut self) -> PerResult<String> {
        let result = self.read_var_width_string();
        Ok(log_err!(self, result))
    }

    fn read_var_width_string(&mut self) -> PerResult<String> {
        let mut constraint = self.size_constraint.clone();
        let mut octets = Vec::new();
        loop {
            let determinant = self.decode_length()?;
            let count = determinant.count();
            if char_string_needs_alignment(constraint.as_ref(), count, 8) {
                self.buffer.align();
            }
            let start = octets.len();
            self.buffer.ensure_readable(count * 8)?;
            octets.resize(start + count, 0);
            self.buffer.read_octets(&mut octets[start..], count * 8)?;
            constraint = None;
            if let LengthDeterminant::Complete(_) = determinant {
                break;
            }
        }
        if self.config().trace {
            trace!(octets = octets.len(), "var-width string decoded");
        }
        String::from_utf8(octets).map_err(|_| PerError::InvalidFormat("string is not valid UTF-8"))
    }
}
