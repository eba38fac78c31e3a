//! Encode/decode sessions: buffer binding, arenas and lifecycle.

use bitstream::BitBuffer;
use bytes::Bytes;
use tracing::trace;

use crate::arena::Arena;
use crate::config::SessionConfig;
use crate::constraint::SizeConstraint;
use crate::diag::{log_err, ErrorStack};
use crate::error::{PerResult, Status};

/// State for one top-level encode or decode pass.
///
/// A session owns its [`BitBuffer`], the active [`SizeConstraint`], an
/// [`ErrorStack`], and two [`Arena`] handles: the type arena holds decoded
/// values, the message arena holds the encode buffer. Both handles point
/// at the same arena unless [`SessionConfig::separate_message_arena`] is set.
///
/// The lifetime `'a` is that of the bound input or caller-supplied output
/// buffer. Values decoded without copying borrow from it.
#[derive(Debug)]
pub struct Session<'a> {
    pub(crate) buffer: BitBuffer<'a>,
    pub(crate) size_constraint: Option<SizeConstraint>,
    pub(crate) errors: ErrorStack,
    config: SessionConfig,
    type_arena: Arena,
    msg_arena: Arena,
}

impl Default for Session<'_> {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl<'a> Session<'a> {
    /// Creates a session with fresh arenas and no buffer bound.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let type_arena = Arena::from_config(&config);
        let msg_arena = if config.separate_message_arena {
            Arena::from_config(&config)
        } else {
            type_arena.clone()
        };
        if config.trace {
            trace!(
                separate_message_arena = config.separate_message_arena,
                "session created"
            );
        }
        Self {
            buffer: BitBuffer::empty(),
            size_constraint: None,
            errors: ErrorStack::new(),
            config,
            type_arena,
            msg_arena,
        }
    }

    /// Creates a session decoding `data`.
    #[must_use]
    pub fn decoder(data: &'a [u8], config: SessionConfig) -> Self {
        let mut session = Self::new(config);
        session.attach_decode_buffer(data);
        session
    }

    /// Creates a session encoding into a dynamic buffer of the configured size.
    pub fn encoder(config: SessionConfig) -> PerResult<Self> {
        let mut session = Self::new(config);
        session.attach_dynamic_buffer(0)?;
        Ok(session)
    }

    /// Binds input for decoding and rewinds the cursor.
    pub fn attach_decode_buffer(&mut self, data: &'a [u8]) {
        self.buffer = BitBuffer::from_slice(data);
    }

    /// Binds a caller-supplied encode buffer. Encoding past its end fails
    /// with a buffer overflow instead of growing.
    pub fn attach_encode_buffer(&mut self, data: &'a mut [u8]) {
        self.buffer = BitBuffer::from_mut_slice(data);
    }

    /// Binds a growable encode buffer carved from the message arena.
    ///
    /// A `capacity` of 0 selects [`SessionConfig::initial_buffer_bytes`].
    pub fn attach_dynamic_buffer(&mut self, capacity: usize) -> PerResult<()> {
        let capacity = if capacity == 0 {
            self.config.initial_buffer_bytes
        } else {
            capacity
        };
        let limit = self.config.max_message_bytes;
        let bytes = log_err!(self, self.msg_arena.alloc(capacity.min(limit)));
        self.buffer = BitBuffer::dynamic(bytes, limit);
        Ok(())
    }

    /// Creates a read-only session positioned at this session's cursor.
    ///
    /// The sub-session shares both arenas, copies the configuration and the
    /// active size constraint, and keeps its own error stack. Reading from it
    /// never moves this session's cursor.
    #[must_use]
    pub fn sub_session(&self) -> Session<'_> {
        if self.config.trace {
            trace!(
                bit_position = self.buffer.bit_position(),
                arena_handles = self.type_arena.handle_count(),
                "sub-session created"
            );
        }
        Session {
            buffer: self.buffer.view(),
            size_constraint: self.size_constraint.clone(),
            errors: ErrorStack::new(),
            config: self.config.clone(),
            type_arena: self.type_arena.clone(),
            msg_arena: self.msg_arena.clone(),
        }
    }

    /// Tears the session down.
    ///
    /// Returns the encoded message when the buffer is dynamic and
    /// [`SessionConfig::preserve_buffer`] is set; otherwise the buffer is
    /// released with the session. Arena handles are released either way.
    pub fn destroy(self) -> Option<Bytes> {
        if self.config.trace {
            trace!(
                message_len = self.buffer.message_len(),
                preserved = self.config.preserve_buffer,
                "session destroyed"
            );
        }
        if self.config.preserve_buffer {
            self.buffer.into_bytes()
        } else {
            None
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn buffer(&self) -> &BitBuffer<'a> {
        &self.buffer
    }

    #[must_use]
    pub const fn type_arena(&self) -> &Arena {
        &self.type_arena
    }

    #[must_use]
    pub const fn message_arena(&self) -> &Arena {
        &self.msg_arena
    }

    #[must_use]
    pub const fn errors(&self) -> &ErrorStack {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorStack {
        &mut self.errors
    }

    /// First status recorded, [`Status::Ok`] when nothing failed.
    #[must_use]
    pub fn status(&self) -> Status {
        self.errors.status()
    }

    /// Adds a parameter for the error message template.
    pub fn add_error_param(&mut self, param: impl Into<String>) -> bool {
        self.errors.add_param(param)
    }

    /// Full error report: status, message and stack trace.
    #[must_use]
    pub fn error_text(&self) -> String {
        self.errors.to_string()
    }

    /// Bytes encoded so far.
    #[must_use]
    pub fn encoded(&self) -> &[u8] {
        self.buffer.written()
    }

    /// Encoded length in whole octets.
    #[must_use]
    pub const fn message_len(&self) -> usize {
        self.buffer.message_len()
    }

    /// Exact number of bits encoded (or consumed) so far.
    #[must_use]
    pub const fn encoded_bit_count(&self) -> usize {
        self.buffer.bit_position()
    }

    /// Attaches the constraint for the next length-bearing value,
    /// replacing any pending one.
    pub fn set_size_constraint(&mut self, constraint: SizeConstraint) {
        self.size_constraint = Some(constraint);
    }

    /// Attaches `constraint`, merging it with a pending one.
    pub fn add_size_constraint(&mut self, constraint: &SizeConstraint) -> PerResult<()> {
        if let Some(pending) = self.size_constraint.as_mut() {
            let result = pending.merge(constraint);
            log_err!(self, result);
        } else {
            self.size_constraint = Some(constraint.clone());
        }
        Ok(())
    }

    /// The constraint waiting for the next length determinant.
    #[must_use]
    pub const fn size_constraint(&self) -> Option<&SizeConstraint> {
        self.size_constraint.as_ref()
    }

    pub fn clear_size_constraint(&mut self) {
        self.size_constraint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PerError;
    use bitstream::BitError;

    #[test]
    fn new_session_is_clean() {
        let session = Session::new(SessionConfig::default());
        assert_eq!(session.status(), Status::Ok);
        assert_eq!(session.message_len(), 0);
        assert!(session.size_constraint().is_none());
        assert!(session.type_arena().shares_with(session.message_arena()));
    }

    #[test]
    fn separate_message_arena() {
        let config = SessionConfig::default().with_separate_message_arena(true);
        let session = Session::new(config);
        assert!(!session.type_arena().shares_with(session.message_arena()));
    }

    #[test]
    fn dynamic_buffer_uses_default_size() {
        let session = Session::encoder(SessionConfig::default()).unwrap();
        assert_eq!(session.buffer().capacity(), 2048);
        assert!(session.buffer().is_dynamic());
        assert_eq!(session.message_arena().stats().allocated_bytes, 2048);
    }

    #[test]
    fn dynamic_buffer_over_arena_limit_is_out_of_memory() {
        let config = SessionConfig::default().with_max_arena_bytes(16);
        let mut session = Session::new(config);
        let err = session.attach_dynamic_buffer(64).unwrap_err();
        assert!(matches!(err, PerError::OutOfMemory { .. }));
        assert_eq!(session.status(), Status::OutOfMemory);
    }

    #[test]
    fn sub_session_shares_arenas_and_cursor() {
        let data = [0xAB, 0xCD];
        let mut session = Session::decoder(&data, SessionConfig::default());
        session.decode_bits(4).unwrap();
        session.set_size_constraint(SizeConstraint::fixed(1));
        {
            let mut sub = session.sub_session();
            assert_eq!(session.type_arena().handle_count(), 4);
            assert_eq!(sub.encoded_bit_count(), 4);
            assert_eq!(sub.size_constraint(), session.size_constraint());
            assert_eq!(sub.decode_bits(8).unwrap(), 0xBC);
        }
        assert_eq!(session.type_arena().handle_count(), 2);
        assert_eq!(session.encoded_bit_count(), 4);
    }

    #[test]
    fn destroy_preserves_when_asked() {
        let config = SessionConfig::default().with_preserve_buffer(true);
        let mut session = Session::encoder(config).unwrap();
        session.encode_bits(0b1011, 4).unwrap();
        let bytes = session.destroy().unwrap();
        assert_eq!(&bytes[..], &[0b1011_0000]);
    }

    #[test]
    fn destroy_releases_by_default() {
        let mut session = Session::encoder(SessionConfig::default()).unwrap();
        session.encode_bit(true).unwrap();
        assert!(session.destroy().is_none());
    }

    #[test]
    fn static_buffer_overflow_is_recorded() {
        let mut storage = [0u8; 1];
        let mut session = Session::new(SessionConfig::default());
        session.attach_encode_buffer(&mut storage);
        session.encode_bits(0xFF, 8).unwrap();
        let err = session.encode_bit(true).unwrap_err();
        assert!(matches!(
            err,
            PerError::Bitstream(BitError::BufferOverflow { .. })
        ));
        assert_eq!(session.status(), Status::BufferOverflow);
        assert_eq!(session.status().code(), -1);
    }

    #[test]
    fn add_size_constraint_merges() {
        let mut session = Session::new(SessionConfig::default());
        session
            .add_size_constraint(&SizeConstraint::range(1, 10))
            .unwrap();
        session
            .add_size_constraint(&SizeConstraint::range(0, 100))
            .unwrap();
        assert_eq!(
            session.size_constraint(),
            Some(&SizeConstraint::range(1, 10))
        );
        assert!(session
            .add_size_constraint(&SizeConstraint::range(3, 4))
            .is_err());
        assert_eq!(session.status(), Status::ConstraintViolation);
    }

    #[test]
    fn error_text_reports_frames() {
        let data = [0u8; 1];
        let mut session = Session::decoder(&data, SessionConfig::default());
        assert!(session.decode_bits(9).is_err());
        let text = session.error_text();
        assert!(text.starts_with("ASN.1 ERROR: Status -2\nUnexpected end of buffer on decode"));
        assert!(text.contains("primitive.rs"));
    }
}
