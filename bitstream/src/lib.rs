//! Bit buffer for the aligned PER runtime.
//!
//! This crate provides [`BitBuffer`], a byte array with a bit-granular cursor
//! used by every PER encode and decode primitive. It is designed for bounded,
//! panic-free operation with explicit error handling.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **One place for capacity** - Growth, overflow and end-of-buffer checks
//!   all live in [`BitBuffer`], never at call sites.
//! - **No partial operations** - A read or write that does not fit fails
//!   before touching the cursor.
//! - **No domain knowledge** - This crate knows nothing about ASN.1 types.
//!
//! # Example
//!
//! ```
//! use bitstream::BitBuffer;
//!
//! let mut writer = BitBuffer::with_capacity(16, 1024);
//! writer.write_bit(true).unwrap();
//! writer.write_bits(42, 7).unwrap();
//!
//! let bytes = writer.into_bytes().unwrap();
//!
//! let mut reader = BitBuffer::from_slice(&bytes);
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! ```

mod buffer;
mod error;
mod reader;
mod writer;

pub use buffer::{BitBuffer, BitMark, DYNAMIC_GROWTH_BYTES};
pub use error::{BitError, BitResult};
