//! The bit buffer, its cursor, and the growth policy.

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{BitError, BitResult};

/// Minimum number of bytes a dynamic buffer grows by.
pub const DYNAMIC_GROWTH_BYTES: usize = 2 * 1024;

#[derive(Debug)]
enum Storage<'a> {
    /// Decode input. Never written.
    Borrowed(&'a [u8]),
    /// Caller-supplied encode buffer. Overflows instead of growing.
    Static(&'a mut [u8]),
    /// Owned encode buffer, grows up to `limit` bytes.
    Dynamic { bytes: BytesMut, limit: usize },
}

/// A saved cursor position, see [`BitBuffer::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitMark {
    byte_index: usize,
    bit_offset: u8,
}

impl BitMark {
    /// Absolute bit position of the mark.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.byte_index * 8 + (8 - self.bit_offset as usize)
    }
}

/// A byte array with a bit-granular cursor.
///
/// The cursor is a byte index plus a bit offset in `1..=8` counting the bits
/// still free in the current byte, so `8` means byte-aligned. Bits are
/// written and read most significant first. The byte index only equals the
/// buffer size when the cursor sits exactly at the end with `bit_offset == 8`.
///
/// All capacity checks live in this type: a decode buffer is read-only, a
/// static buffer reports [`BitError::BufferOverflow`], and a dynamic buffer
/// grows by at least [`DYNAMIC_GROWTH_BYTES`] until its limit.
#[derive(Debug)]
pub struct BitBuffer<'a> {
    storage: Storage<'a>,
    byte_index: usize,
    bit_offset: u8,
}

impl Default for BitBuffer<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> BitBuffer<'a> {
    /// Creates an empty, read-only buffer.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_slice(&[])
    }

    /// Binds an immutable byte range for decoding.
    #[must_use]
    pub const fn from_slice(data: &'a [u8]) -> Self {
        Self {
            storage: Storage::Borrowed(data),
            byte_index: 0,
            bit_offset: 8,
        }
    }

    /// Binds a caller-supplied buffer for encoding. Writes past its end fail.
    #[must_use]
    pub fn from_mut_slice(data: &'a mut [u8]) -> Self {
        Self {
            storage: Storage::Static(data),
            byte_index: 0,
            bit_offset: 8,
        }
    }

    /// Creates a growable encode buffer over `bytes`, never exceeding `limit` bytes.
    ///
    /// The initial size is `bytes.len()`; the contents are overwritten.
    #[must_use]
    pub fn dynamic(bytes: BytesMut, limit: usize) -> Self {
        Self {
            storage: Storage::Dynamic { bytes, limit },
            byte_index: 0,
            bit_offset: 8,
        }
    }

    /// Creates a growable encode buffer with `capacity` zeroed bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize, limit: usize) -> Self {
        Self::dynamic(BytesMut::zeroed(capacity.min(limit)), limit)
    }

    fn data(&self) -> &[u8] {
        match &self.storage {
            Storage::Borrowed(data) => *data,
            Storage::Static(data) => &**data,
            Storage::Dynamic { bytes, .. } => &bytes[..],
        }
    }

    pub(crate) fn data_mut(&mut self) -> BitResult<&mut [u8]> {
        match &mut self.storage {
            Storage::Borrowed(_) => Err(BitError::ReadOnly),
            Storage::Static(data) => Ok(&mut **data),
            Storage::Dynamic { bytes, .. } => Ok(&mut bytes[..]),
        }
    }

    /// Current size of the underlying byte array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data().len()
    }

    /// Index of the byte under the cursor.
    #[must_use]
    pub const fn byte_index(&self) -> usize {
        self.byte_index
    }

    /// Bits still free in the current byte (`8` when aligned).
    #[must_use]
    pub const fn bit_offset(&self) -> u8 {
        self.bit_offset
    }

    /// Absolute cursor position in bits.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.byte_index * 8 + (8 - self.bit_offset as usize)
    }

    /// Bits between the cursor and the end of the byte array.
    #[must_use]
    pub fn bits_remaining(&self) -> usize {
        (self.capacity() * 8).saturating_sub(self.bit_position())
    }

    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_offset == 8
    }

    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self.storage, Storage::Dynamic { .. })
    }

    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !matches!(self.storage, Storage::Borrowed(_))
    }

    /// Number of bytes touched by the cursor: the bit position rounded up.
    #[must_use]
    pub const fn message_len(&self) -> usize {
        if self.bit_offset == 8 {
            self.byte_index
        } else {
            self.byte_index + 1
        }
    }

    /// The bytes written so far, including a zero-padded trailing byte.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        let len = self.message_len().min(self.capacity());
        &self.data()[..len]
    }

    /// The whole underlying byte array.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.data()
    }

    /// Moves the cursor back to the start without touching the bytes.
    pub fn rewind(&mut self) {
        self.byte_index = 0;
        self.bit_offset = 8;
    }

    /// Saves the cursor position.
    #[must_use]
    pub const fn mark(&self) -> BitMark {
        BitMark {
            byte_index: self.byte_index,
            bit_offset: self.bit_offset,
        }
    }

    /// Restores a position previously returned by [`mark`](Self::mark).
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidMark`] if the mark lies outside this buffer.
    pub fn restore(&mut self, mark: BitMark) -> BitResult<()> {
        let size = self.capacity() * 8;
        if mark.bit_position() > size || !(1..=8).contains(&mark.bit_offset) {
            return Err(BitError::InvalidMark {
                position: mark.bit_position(),
                size,
            });
        }
        self.byte_index = mark.byte_index;
        self.bit_offset = mark.bit_offset;
        Ok(())
    }

    /// Moves the cursor forward by `bits` without reading them.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::EndOfBuffer`] if fewer than `bits` remain.
    pub fn skip_bits(&mut self, bits: usize) -> BitResult<()> {
        self.ensure_readable(bits)?;
        self.set_position(self.bit_position() + bits);
        Ok(())
    }

    /// Advances to the next byte boundary. A no-op when already aligned.
    ///
    /// Padding bits of a written byte are already zero.
    pub fn align(&mut self) {
        if self.bit_offset != 8 {
            self.byte_index += 1;
            self.bit_offset = 8;
        }
    }

    /// A read-only view of this buffer positioned at the same cursor.
    ///
    /// For writable buffers only the written bytes are visible.
    #[must_use]
    pub fn view(&self) -> BitBuffer<'_> {
        let data = if self.is_writable() {
            self.written()
        } else {
            self.data()
        };
        BitBuffer {
            storage: Storage::Borrowed(data),
            byte_index: self.byte_index,
            bit_offset: self.bit_offset,
        }
    }

    /// Borrows the next `bits` directly from a decode input.
    ///
    /// Returns `Ok(None)` without moving the cursor unless the buffer borrows
    /// its bytes and the cursor is aligned. A trailing partial byte is
    /// included in the returned slice.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::EndOfBuffer`] if fewer than `bits` remain.
    pub fn take_borrowed(&mut self, bits: usize) -> BitResult<Option<&'a [u8]>> {
        let Storage::Borrowed(data) = self.storage else {
            return Ok(None);
        };
        if !self.is_aligned() {
            return Ok(None);
        }
        self.ensure_readable(bits)?;
        let start = self.byte_index;
        let end = start + bits.div_ceil(8);
        self.set_position(self.bit_position() + bits);
        Ok(Some(&data[start..end]))
    }

    /// Consumes the buffer, returning the written bytes of a dynamic buffer.
    ///
    /// Static and decode buffers belong to the caller and yield `None`.
    #[must_use]
    pub fn into_bytes(self) -> Option<Bytes> {
        let len = self.message_len();
        match self.storage {
            Storage::Dynamic { mut bytes, .. } => {
                bytes.truncate(len);
                Some(bytes.freeze())
            }
            Storage::Borrowed(_) | Storage::Static(_) => None,
        }
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.byte_index = position / 8;
        self.bit_offset = 8 - (position % 8) as u8;
    }

    /// Moves the cursor within the current byte. `bits` must not exceed `bit_offset`.
    pub(crate) fn advance(&mut self, bits: u8) {
        self.bit_offset -= bits;
        if self.bit_offset == 0 {
            self.bit_offset = 8;
            self.byte_index += 1;
        }
    }

    /// Checks that `bits` more bits can be read without consuming them.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::EndOfBuffer`] if fewer than `bits` remain.
    pub fn ensure_readable(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::EndOfBuffer {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    /// Makes room for `bits` more bits, growing a dynamic buffer if needed.
    pub(crate) fn ensure_writable(&mut self, bits: usize) -> BitResult<()> {
        let needed = (self.bit_position() + bits).div_ceil(8);
        let remaining = self.bits_remaining();
        match &mut self.storage {
            Storage::Borrowed(_) => Err(BitError::ReadOnly),
            Storage::Static(data) => {
                if needed > data.len() {
                    return Err(BitError::BufferOverflow {
                        attempted: bits,
                        capacity: remaining,
                    });
                }
                Ok(())
            }
            Storage::Dynamic { bytes, limit } => {
                let len = bytes.len();
                if needed <= len {
                    return Ok(());
                }
                if needed > *limit {
                    return Err(BitError::OutOfMemory {
                        requested: needed,
                        limit: *limit,
                    });
                }
                let grown = (len + (needed - len).max(DYNAMIC_GROWTH_BYTES)).min(*limit);
                trace!(from = len, to = grown, "growing dynamic bit buffer");
                bytes.resize(grown, 0);
                Ok(())
            }
        }
    }
}

/// Mask of the `bits` low-order bits of a byte.
pub(crate) const fn low_mask(bits: u8) -> u8 {
    if bits >= 8 {
        0xFF
    } else {
        (1u8 << bits) - 1
    }
}
