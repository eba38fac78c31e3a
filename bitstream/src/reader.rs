//! Bit-level reads.

use crate::buffer::{low_mask, BitBuffer};
use crate::error::{BitError, BitResult};

impl BitBuffer<'_> {
    /// Reads a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::EndOfBuffer`] if no bits remain.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads up to 64 bits, most significant first.
    ///
    /// Reading zero bits returns 0 and leaves the cursor untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`, or
    /// [`BitError::EndOfBuffer`] if fewer than `bits` remain. Nothing is
    /// consumed on error.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_readable(bits as usize)?;

        let mut value = 0u64;
        let mut remaining = bits;
        while remaining > 0 {
            let free = self.bit_offset();
            let take = remaining.min(free);
            let byte = self.as_slice()[self.byte_index()];
            let chunk = (byte >> (free - take)) & low_mask(take);
            value = (value << take) | u64::from(chunk);
            remaining -= take;
            self.advance(take);
        }
        Ok(value)
    }

    /// Reads `bits` bits into `dst`, most significant first.
    ///
    /// Copies whole bytes directly when the cursor is aligned and shifts
    /// each byte otherwise. A trailing partial byte lands in the high bits
    /// of its slot with the low bits cleared.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `dst` is too small, or
    /// [`BitError::EndOfBuffer`] if fewer than `bits` remain.
    pub fn read_octets(&mut self, dst: &mut [u8], bits: usize) -> BitResult<()> {
        if bits.div_ceil(8) > dst.len() {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: dst.len() * 8,
            });
        }
        self.ensure_readable(bits)?;

        let full = bits / 8;
        let partial = (bits % 8) as u8;
        if self.is_aligned() {
            let start = self.byte_index();
            dst[..full].copy_from_slice(&self.as_slice()[start..start + full]);
            self.set_position(self.bit_position() + full * 8);
        } else {
            for slot in &mut dst[..full] {
                *slot = self.read_bits(8)? as u8;
            }
        }
        if partial > 0 {
            dst[full] = (self.read_bits(partial)? as u8) << (8 - partial);
        }
        Ok(())
    }
}
