//! ASN.1 aligned PER (X.691) encoding and decoding runtime.
//!
//! Generated or hand-written message code drives a [`Session`]: it binds a
//! buffer, attaches size constraints, and calls one encode or decode
//! operation per field. The session owns the bit cursor, the arenas that
//! hold decoded values, and an [`ErrorStack`] describing the first failure.
//!
//! # Features
//!
//! - Constrained, semi-constrained and unconstrained integers
//! - Length determinants with fragmentation of values of 16K items or more
//! - Octet strings, bit strings and open types, borrowed from the input
//!   when possible
//! - Known-multiplier character strings with permitted alphabets
//! - Object identifiers
//!
//! # Design Principles
//!
//! - **Bit exact** - Output matches X.691 aligned PER octet for octet.
//! - **No panics** - Every failure is a returned [`PerError`] plus a
//!   recorded [`Status`].
//! - **Explicit configuration** - Behavior flags live in [`SessionConfig`]
//!   and are fixed at creation.
//!
//! # Example
//!
//! ```
//! use codec::{Session, SessionConfig, SizeConstraint};
//!
//! let mut enc = Session::encoder(SessionConfig::default()).unwrap();
//! enc.encode_constrained_integer(5, 0, 7).unwrap();
//! enc.set_size_constraint(SizeConstraint::range(1, 4));
//! enc.encode_octet_string(b"abc").unwrap();
//! let bytes = enc.encoded().to_vec();
//!
//! let mut dec = Session::decoder(&bytes, SessionConfig::default());
//! assert_eq!(dec.decode_constrained_integer(0, 7).unwrap(), 5);
//! dec.set_size_constraint(SizeConstraint::range(1, 4));
//! assert_eq!(&*dec.decode_octet_string().unwrap(), b"abc");
//! ```

mod arena;
mod charstring;
mod config;
mod constraint;
mod diag;
mod error;
mod integer;
mod length;
mod list;
mod oid;
mod open_type;
mod primitive;
mod session;
mod string;

pub use arena::{Arena, ArenaStats};
pub use bitstream::{BitBuffer, BitError, BitMark};
pub use charstring::{CharSet, WideCharSet};
pub use config::{SessionConfig, DEFAULT_ARENA_BLOCK_BYTES, DEFAULT_BUFFER_BYTES};
pub use constraint::{SizeConstraint, SizeRange};
pub use diag::{ErrorFrame, ErrorStack, MAX_ERROR_FRAMES, MAX_ERROR_PARAMS};
pub use error::{OidReason, PerError, PerResult, Status, Violation};
pub use length::{LengthDeterminant, FRAGMENT_UNIT};
pub use list::{DList, Iter as DListIter, NodeId};
pub use oid::{ObjectIdentifier, MAX_OID_ARCS};
pub use session::Session;
pub use string::{BitString, Octets};
