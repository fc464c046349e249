//! Encoding data.
//!
//! All encoders write their output into a [`Target`], a simplified version
//! of `io::Write` that lets the target pick its own error type. Encoding
//! into a `Vec<u8>` can’t fail because of the target, so its error type is
//! `Infallible`. Encoders may hand the data to the target in pieces of any
//! size.
//!
//! An encoder can fail for one of two reasons: the target refused the data
//! or the value can’t be encoded at all. The [`EncodeError`] type covers
//! both.

pub use self::target::{
    Counted, CountTarget, FnTarget, IoTarget, Refused, Target, infallible
};

use std::{error, fmt};
use std::convert::Infallible;
use crate::decode::ContentError;

mod target;


//------------ EncodeError ---------------------------------------------------

/// An error happened while encoding a value.
pub enum EncodeError<E> {
    /// The target returned an error.
    Target(E),

    /// The value can’t be encoded.
    ///
    /// This happens if the value doesn’t fit its type descriptor, violates
    /// a constraint that the encoding rules depend on, or if the encoder
    /// wrote a different amount of data than it announced.
    Invalid {
        /// The name of the type whose value failed.
        type_name: &'static str,

        /// What went wrong.
        error: ContentError,
    },
}

impl<E> EncodeError<E> {
    /// Creates an error for an invalid value.
    pub fn invalid(
        type_name: &'static str, error: impl Into<ContentError>
    ) -> Self {
        EncodeError::Invalid { type_name, error: error.into() }
    }

    /// Returns whether the error was caused by the target.
    pub fn is_target(&self) -> bool {
        matches!(*self, EncodeError::Target(_))
    }

    /// Converts the target error into a different type.
    pub fn map_target<F, U>(self, op: F) -> EncodeError<U>
    where F: FnOnce(E) -> U {
        match self {
            EncodeError::Target(err) => EncodeError::Target(op(err)),
            EncodeError::Invalid { type_name, error } => {
                EncodeError::Invalid { type_name, error }
            }
        }
    }
}

impl EncodeError<Infallible> {
    /// Converts an error from an infallible target into any other.
    pub fn widen<E>(self) -> EncodeError<E> {
        self.map_target(|err| match err { })
    }
}

impl<E> From<E> for EncodeError<E> {
    fn from(err: E) -> Self {
        EncodeError::Target(err)
    }
}

impl<E: fmt::Display> fmt::Display for EncodeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodeError::Target(ref err) => err.fmt(f),
            EncodeError::Invalid { type_name, ref error } => {
                write!(f, "cannot encode {}: {}", type_name, error)
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for EncodeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodeError::Target(ref err) => {
                f.debug_tuple("Target").field(err).finish()
            }
            EncodeError::Invalid { type_name, ref error } => {
                f.debug_struct("Invalid")
                    .field("type_name", &type_name)
                    .field("error", error)
                    .finish()
            }
        }
    }
}

impl<E: fmt::Display + fmt::Debug> error::Error for EncodeError<E> { }
