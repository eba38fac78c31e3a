//! Bit-level primitives on a session's buffer.

use bitstream::BitMark;

use crate::diag::log_err;
use crate::error::PerResult;
use crate::session::Session;

impl Session<'_> {
    pub fn encode_bit(&mut self, value: bool) -> PerResult<()> {
        log_err!(self, self.buffer.write_bit(value));
        Ok(())
    }

    pub fn decode_bit(&mut self) -> PerResult<bool> {
        Ok(log_err!(self, self.buffer.read_bit()))
    }

    /// Writes the low `bits` bits of `value` (at most 64).
    pub fn encode_bits(&mut self, value: u64, bits: u8) -> PerResult<()> {
        log_err!(self, self.buffer.write_bits(value, bits));
        Ok(())
    }

    /// Reads `bits` bits (at most 64). Zero bits read as 0.
    pub fn decode_bits(&mut self, bits: u8) -> PerResult<u64> {
        Ok(log_err!(self, self.buffer.read_bits(bits)))
    }

    /// Moves to the next octet boundary; a no-op when already there.
    pub fn byte_align(&mut self) {
        self.buffer.align();
    }

    /// Writes the first `bits` bits of `data`.
    pub fn encode_octets(&mut self, data: &[u8], bits: usize) -> PerResult<()> {
        log_err!(self, self.buffer.write_octets(data, bits));
        Ok(())
    }

    /// Reads `bits` bits into `dst`.
    pub fn decode_octets(&mut self, dst: &mut [u8], bits: usize) -> PerResult<()> {
        log_err!(self, self.buffer.read_octets(dst, bits));
        Ok(())
    }

    /// Moves the cursor forward without decoding.
    pub fn skip_bits(&mut self, bits: usize) -> PerResult<()> {
        log_err!(self, self.buffer.skip_bits(bits));
        Ok(())
    }

    #[must_use]
    pub const fn mark(&self) -> BitMark {
        self.buffer.mark()
    }

    pub fn restore(&mut self, mark: BitMark) -> PerResult<()> {
        log_err!(self, self.buffer.restore(mark));
        Ok(())
    }

    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.buffer.bit_position()
    }

    /// Bits left to decode.
    #[must_use]
    pub fn bits_remaining(&self) -> usize {
        self.buffer.bits_remaining()
    }
}
