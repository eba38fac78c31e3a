//! Bit-level writes.

use crate::buffer::{low_mask, BitBuffer};
use crate::error::{BitError, BitResult};

impl BitBuffer<'_> {
    /// Writes a single bit.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is read-only, full, or cannot grow.
    pub fn write_bit(&mut self, value: bool) -> BitResult<()> {
        self.write_bits(u64::from(value), 1)
    }

    /// Writes the low `bits` bits of `value`, most significant first.
    ///
    /// Writing zero bits is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`,
    /// [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`, or a
    /// capacity error from the buffer.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >> bits != 0 {
            return Err(BitError::ValueOutOfRange {
                value,
                bits: bits as usize,
            });
        }
        self.ensure_writable(bits as usize)?;

        let mut remaining = bits;
        while remaining > 0 {
            let free = self.bit_offset();
            let take = remaining.min(free);
            let chunk = (value >> (remaining - take)) as u8 & low_mask(take);
            let index = self.byte_index();
            let byte = &mut self.data_mut()?[index];
            *byte &= !low_mask(free);
            *byte |= chunk << (free - take);
            remaining -= take;
            self.advance(take);
        }
        Ok(())
    }

    /// Writes the first `bits` bits of `src`.
    ///
    /// Copies whole bytes directly when the cursor is aligned and shifts
    /// each byte otherwise. For a trailing partial byte the most significant
    /// bits are written.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `src` holds fewer than `bits`
    /// bits, or a capacity error from the buffer.
    pub fn write_octets(&mut self, src: &[u8], bits: usize) -> BitResult<()> {
        if bits.div_ceil(8) > src.len() {
            return Err(BitError::InvalidBitCount {
                bits,
                max_bits: src.len() * 8,
            });
        }
        if bits == 0 {
            return Ok(());
        }
        self.ensure_writable(bits)?;

        let full = bits / 8;
        let partial = (bits % 8) as u8;
        if self.is_aligned() {
            let start = self.byte_index();
            self.data_mut()?[start..start + full].copy_from_slice(&src[..full]);
            self.set_position(self.bit_position() + full * 8);
        } else {
            for &byte in &src[..full] {
                self.write_bits(u64::from(byte), 8)?;
            }
        }
        if partial > 0 {
            self.write_bits(u64::from(src[full] >> (8 - partial)), partial)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> BitBuffer<'static> {
        BitBuffer::with_capacity(0, usize::MAX)
    }

    #[test]
    fn write_single_bit_true() {
        let mut buffer = writer();
        buffer.write_bit(true).unwrap();
        assert_eq!(buffer.bit_position(), 1);
        assert_eq!(buffer.written(), &[0b1000_0000]);
    }

    #[test]
    fn write_full_byte() {
        let mut buffer = writer();
        for bit in [true, false, true, false, true, false, true, false] {
            buffer.write_bit(bit).unwrap();
        }
        assert_eq!(buffer.written(), &[0b1010_1010]);
        assert!(buffer.is_aligned());
    }

    #[test]
    fn write_bits_across_boundary() {
        let mut buffer = writer();
        buffer.write_bits(0b101, 3).unwrap();
        buffer.write_bits(0b1_1111_1111, 9).unwrap();
        assert_eq!(buffer.written(), &[0b1011_1111, 0b1111_0000]);
    }

    #[test]
    fn write_zero_bits_is_noop() {
        let mut buffer = writer();
        buffer.write_bits(0, 0).unwrap();
        assert_eq!(buffer.bit_position(), 0);
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn write_value_too_wide() {
        let mut buffer = writer();
        assert_eq!(
            buffer.write_bits(256, 8),
            Err(BitError::ValueOutOfRange { value: 256, bits: 8 })
        );
    }

    #[test]
    fn write_full_word() {
        let mut buffer = writer();
        buffer.write_bits(u64::MAX, 64).unwrap();
        assert_eq!(buffer.written(), &[0xFF; 8]);
    }

    #[test]
    fn align_pads_with_zero() {
        let mut storage = [0xFFu8; 2];
        let mut buffer = BitBuffer::from_mut_slice(&mut storage);
        buffer.write_bit(true).unwrap();
        buffer.align();
        buffer.write_bits(0x0F, 8).unwrap();
        assert_eq!(buffer.written(), &[0b1000_0000, 0x0F]);
    }

    #[test]
    fn static_overflow_writes_nothing() {
        let mut storage = [0u8; 1];
        let mut buffer = BitBuffer::from_mut_slice(&mut storage);
        buffer.write_bits(0b11, 2).unwrap();
        assert!(matches!(
            buffer.write_bits(0x7F, 7),
            Err(BitError::BufferOverflow { attempted: 7, .. })
        ));
        assert_eq!(buffer.bit_position(), 2);
    }

    #[test]
    fn write_into_decode_buffer_fails() {
        let data = [0u8; 4];
        let mut buffer = BitBuffer::from_slice(&data);
        assert_eq!(buffer.write_bit(true), Err(BitError::ReadOnly));
    }

    #[test]
    fn write_octets_aligned() {
        let mut buffer = writer();
        buffer.write_octets(&[0xDE, 0xAD, 0xBE], 24).unwrap();
        assert_eq!(buffer.written(), &[0xDE, 0xAD, 0xBE]);
    }

    #[test]
    fn write_octets_unaligned() {
        let mut buffer = writer();
        buffer.write_bits(0, 4).unwrap();
        buffer.write_octets(&[0xAB, 0xCD], 16).unwrap();
        assert_eq!(buffer.written(), &[0x0A, 0xBC, 0xD0]);
    }

    #[test]
    fn write_octets_partial_tail() {
        let mut buffer = writer();
        buffer.write_octets(&[0xFF, 0b1011_1111], 11).unwrap();
        assert_eq!(buffer.written(), &[0xFF, 0b1010_0000]);
        assert_eq!(buffer.bit_position(), 11);
    }

    #[test]
    fn write_octets_short_source() {
        let mut buffer = writer();
        assert!(matches!(
            buffer.write_octets(&[0xFF], 9),
            Err(BitError::InvalidBitCount { bits: 9, max_bits: 8 })
        ));
    }

    #[test]
    fn rewrite_after_restore_clears_stale_bits() {
        let mut buffer = writer();
        let mark = buffer.mark();
        buffer.write_bits(0xFF, 8).unwrap();
        buffer.restore(mark).unwrap();
        buffer.write_bits(0b01, 2).unwrap();
        assert_eq!(buffer.written(), &[0b0100_0000]);
    }
}
