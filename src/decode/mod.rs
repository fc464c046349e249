//! Decoding data.
//!
//! This module contains the pieces shared by all the decoders: the error
//! types, the [`Decoded`] outcome that allows a decoder to ask for more
//! data, and the [`Options`] that limit how much a decoder is willing to
//! take on.
//!
//! The actual decoders live in the modules for the individual encoding
//! rules: [`ber`][crate::ber], [`per`][crate::per], and
//! [`xer`][crate::xer].

pub use self::error::{ContentError, DecodeError, Reason};

use std::{fmt, ops};

mod error;


//------------ Decoded -------------------------------------------------------

/// The outcome of a decode call that did not fail.
///
/// Decoders return `Result<Decoded<T>, DecodeError>`. Together, the two
/// types cover the three possible outcomes: a complete value, a request for
/// more data, and a final failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Decoded<T> {
    /// A value has been decoded completely.
    Complete {
        /// The decoded value.
        value: T,

        /// The number of octets that were consumed by this call.
        consumed: usize,
    },

    /// The data ended before the value was complete.
    ///
    /// The decoder has kept all its progress. Call it again with the
    /// unconsumed rest of the data followed by more data.
    WantMore {
        /// The number of octets consumed by this call.
        consumed: usize,
    },
}

impl<T> Decoded<T> {
    /// Returns the number of octets consumed by the call.
    pub fn consumed(&self) -> usize {
        match *self {
            Decoded::Complete { consumed, .. } => consumed,
            Decoded::WantMore { consumed } => consumed,
        }
    }

    /// Returns whether the value is complete.
    pub fn is_complete(&self) -> bool {
        matches!(*self, Decoded::Complete { .. })
    }

    /// Converts the outcome into the value.
    ///
    /// Returns an error with [`Reason::Incomplete`] if the value isn’t
    /// complete. The error will be reported at `pos`.
    pub fn into_value(self, pos: Pos) -> Result<T, DecodeError> {
        match self {
            Decoded::Complete { value, .. } => Ok(value),
            Decoded::WantMore { .. } => Err(DecodeError::incomplete(pos)),
        }
    }

    /// Converts the complete value into something else.
    pub fn map<U, F: FnOnce(T) -> U>(self, op: F) -> Decoded<U> {
        match self {
            Decoded::Complete { value, consumed } => {
                Decoded::Complete { value: op(value), consumed }
            }
            Decoded::WantMore { consumed } => Decoded::WantMore { consumed }
        }
    }
}


//------------ Options -------------------------------------------------------

/// Limits applied while decoding.
///
/// Decoders work on data from untrusted peers. These limits keep a decoder
/// from exhausting the stack or memory on hostile input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Options {
    /// The maximum nesting depth of constructed values.
    pub max_depth: usize,

    /// The maximum number of content octets of a single value.
    ///
    /// The PER decoder also counts the memory taken up by list items
    /// against this limit.
    pub max_size: usize,
}

impl Options {
    /// The default maximum nesting depth.
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// The default maximum value size.
    pub const DEFAULT_MAX_SIZE: usize = 16 * 1024 * 1024;

    /// Returns options with a different maximum depth.
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Options { max_depth, ..self }
    }

    /// Returns options with a different maximum size.
    pub fn with_max_size(self, max_size: usize) -> Self {
        Options { max_size, ..self }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_size: Self::DEFAULT_MAX_SIZE,
        }
    }
}


//------------ Pos -----------------------------------------------------------

/// The logical position within a source.
///
/// Values of this type can only be used for diagnostics. For the octet
/// based rules, this is an octet offset. The PER decoder reports bit
/// offsets.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Pos(usize);

impl From<usize> for Pos {
    fn from(pos: usize) -> Pos {
        Pos(pos)
    }
}

impl From<Pos> for usize {
    fn from(pos: Pos) -> usize {
        pos.0
    }
}

impl ops::Add for Pos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Pos(self.0 + rhs.0)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}
