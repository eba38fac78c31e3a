//! Error stack: status, call-site frames and message parameters.

use std::fmt;

use tracing::debug;

use crate::error::{PerError, Status};

/// Maximum number of frames kept on the stack.
pub const MAX_ERROR_FRAMES: usize = 8;

/// Maximum number of message parameters.
pub const MAX_ERROR_PARAMS: usize = 5;

/// One propagation step of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFrame {
    pub location: &'static str,
    pub line: u32,
}

/// Diagnostics recorded while a session encodes or decodes.
///
/// The first status recorded wins; later pushes only add frames. Frames
/// and parameters beyond their limits are dropped silently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorStack {
    status: Option<Status>,
    frames: Vec<ErrorFrame>,
    params: Vec<String>,
}

impl ErrorStack {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: None,
            frames: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Records `status` (unless one is already pending) and a frame.
    pub fn push(&mut self, status: Status, location: &'static str, line: u32) {
        debug!(status = status.code(), location, line, "per error");
        if self.status.is_none() {
            self.status = Some(status);
        }
        if self.frames.len() < MAX_ERROR_FRAMES {
            self.frames.push(ErrorFrame { location, line });
        }
    }

    pub(crate) fn log(&mut self, err: &PerError, location: &'static str, line: u32) {
        self.push(err.status(), location, line);
    }

    /// Adds a message parameter. Returns `false` once the limit is reached.
    pub fn add_param(&mut self, param: impl Into<String>) -> bool {
        if self.params.len() >= MAX_ERROR_PARAMS {
            return false;
        }
        self.params.push(param.into());
        true
    }

    /// Pending status, [`Status::Ok`] when none.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status.unwrap_or(Status::Ok)
    }

    /// Returns and clears the pending status.
    pub fn take_status(&mut self) -> Status {
        self.status.take().unwrap_or(Status::Ok)
    }

    #[must_use]
    pub fn frames(&self) -> &[ErrorFrame] {
        &self.frames
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.frames.is_empty()
    }

    /// Clears frames and parameters. The pending status survives.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.params.clear();
    }

    /// Renders the status template, filling `%s` with parameters in order
    /// and `?` once they run out.
    #[must_use]
    pub fn message(&self) -> String {
        let template = self.status().template();
        let mut params = self.params.iter();
        let mut out = String::with_capacity(template.len());
        let mut pieces = template.split("%s");
        if let Some(first) = pieces.next() {
            out.push_str(first);
        }
        for piece in pieces {
            out.push_str(params.next().map_or("?", String::as_str));
            out.push_str(piece);
        }
        out
    }
}

/// Full report: status line, message and stack trace.
impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ASN.1 ERROR: Status {}", self.status().code())?;
        writeln!(f, "{}", self.message())?;
        write!(f, "Stack trace:")?;
        for frame in &self.frames {
            write!(f, "\n  Module: {}, Line {}", frame.location, frame.line)?;
        }
        Ok(())
    }
}

/// Unwraps a result, recording a frame on `$session`'s error stack on failure.
macro_rules! log_err {
    ($session:expr, $result:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                let err = $crate::error::PerError::from(err);
                $session.errors.log(&err, file!(), line!());
                return Err(err);
            }
        }
    };
}

/// Records `$err` on `$session`'s error stack and returns it.
macro_rules! log_fail {
    ($session:expr, $err:expr) => {{
        let err = $crate::error::PerError::from($err);
        $session.errors.log(&err, file!(), line!());
        return Err(err);
    }};
}

pub(crate) use log_err;
pub(crate) use log_fail;
