//! Error Handling.
//!
//! This is a private module. Its public content is being re-exported by the
//! parent module.

use std::{error, fmt};
use super::Pos;


//------------ Reason --------------------------------------------------------

/// The broad category of a content error.
///
/// Most callers only need to know that decoding failed. The reason is there
/// for those that need to react differently to, say, a constraint violation
/// than to garbage on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Reason {
    /// The data is not correctly encoded.
    Malformed,

    /// The data is correctly encoded but uses a feature we don’t support.
    Unsupported,

    /// A value does not fit into the target representation.
    Overflow,

    /// A value violates a constraint of its type.
    Constraint,

    /// The data ended before the value was complete.
    ///
    /// This is the reason given when a resumable decode is turned into a
    /// final answer while more data was still needed.
    Incomplete,

    /// An open type left more than seven bits unclaimed.
    TooLargePadding,

    /// An open type’s unclaimed trailing bits are not all zero.
    NonZeroPadding,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Reason::Malformed => "malformed data",
            Reason::Unsupported => "unsupported encoding",
            Reason::Overflow => "value out of range",
            Reason::Constraint => "constraint violated",
            Reason::Incomplete => "unexpected end of data",
            Reason::TooLargePadding => "too large padding",
            Reason::NonZeroPadding => "non-zero padding",
        })
    }
}


//------------ ContentError --------------------------------------------------

/// An error happened while interpreting encoded data.
pub struct ContentError {
    /// The category of the error.
    reason: Reason,

    /// The error message.
    message: ErrorMessage,
}

impl ContentError {
    /// Creates a malformed-data error from a static message.
    pub fn from_static(msg: &'static str) -> Self {
        Self::with_reason(Reason::Malformed, msg)
    }

    /// Creates a malformed-data error from a boxed message.
    pub fn from_boxed(
        msg: Box<dyn fmt::Display + Send + Sync + 'static>
    ) -> Self {
        ContentError {
            reason: Reason::Malformed,
            message: ErrorMessage::Boxed(msg),
        }
    }

    /// Creates an error with the given reason and static message.
    pub fn with_reason(reason: Reason, msg: &'static str) -> Self {
        ContentError { reason, message: ErrorMessage::Static(msg) }
    }

    /// Creates an error with the given reason and a formatted message.
    pub fn with_reason_boxed(
        reason: Reason,
        msg: Box<dyn fmt::Display + Send + Sync + 'static>
    ) -> Self {
        ContentError { reason, message: ErrorMessage::Boxed(msg) }
    }

    /// Creates an error signalling that more data is needed.
    pub fn incomplete() -> Self {
        Self::with_reason(Reason::Incomplete, "unexpected end of data")
    }

    /// Returns the reason for the error.
    pub fn reason(&self) -> Reason {
        self.reason
    }
}

impl From<&'static str> for ContentError {
    fn from(msg: &'static str) -> Self {
        Self::from_static(msg)
    }
}

impl From<String> for ContentError {
    fn from(msg: String) -> Self {
        Self::from_boxed(Box::new(msg))
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl fmt::Debug for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ContentError")
            .field("reason", &self.reason)
            .field("message", &format_args!("{}", self.message))
            .finish()
    }
}

impl error::Error for ContentError { }


//------------ ErrorMessage --------------------------------------------------

/// The message of a content error.
enum ErrorMessage {
    Static(&'static str),
    Boxed(Box<dyn fmt::Display + Send + Sync + 'static>),
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorMessage::Static(msg) => f.write_str(msg),
            ErrorMessage::Boxed(ref msg) => msg.fmt(f),
        }
    }
}


//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding data.
///
/// Decode errors are final. Once a decoder has returned one, it will not
/// recover by being fed more data.
#[derive(Debug)]
pub struct DecodeError {
    /// The actual error.
    error: ContentError,

    /// The position in the input where the error was detected.
    pos: Pos,
}

impl DecodeError {
    /// Creates a decode error from a content error and a position.
    pub fn content(error: impl Into<ContentError>, pos: Pos) -> Self {
        DecodeError { error: error.into(), pos }
    }

    /// Creates an error signalling the data ended too early.
    pub fn incomplete(pos: Pos) -> Self {
        Self::content(ContentError::incomplete(), pos)
    }

    /// Returns the reason for the error.
    pub fn reason(&self) -> Reason {
        self.error.reason()
    }

    /// Returns the position where the error happened.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Returns the underlying content error.
    pub fn content_error(&self) -> &ContentError {
        &self.error
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}) at position {}", self.error, self.reason(), self.pos)
    }
}

impl error::Error for DecodeError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        let err = DecodeError::content("bad tag", Pos::from(12));
        assert_eq!(err.reason(), Reason::Malformed);
        assert_eq!(
            err.to_string(),
            "bad tag (malformed data) at position 12"
        );

        let err = DecodeError::content(
            ContentError::with_reason(
                Reason::NonZeroPadding, "open type padding"
            ),
            Pos::from(3)
        );
        assert_eq!(err.reason(), Reason::NonZeroPadding);
        assert_eq!(err.pos(), Pos::from(3));
    }

    #[test]
    fn boxed_message() {
        let err = ContentError::from(format!("unknown member {}", 7));
        assert_eq!(err.to_string(), "unknown member 7");
        assert_eq!(err.reason(), Reason::Malformed);
    }
}
