//! Encoding and decoding ASN.1 values.
//!
//! This crate is a runtime for ASN.1 codecs. Rather than having code
//! generated for every type, a schema is described by a set of static
//! [type descriptors][descriptor::TypeDescriptor]. The drivers for the
//! individual encoding rules walk these descriptors to translate between
//! a dynamic [`Value`] and its encoded form.
//!
//! The following encoding rules are supported:
//!
//! * [`ber`]: decoding of the Basic Encoding Rules and the Distinguished
//!   Encoding Rules. Decoding is resumable: a decoder can be fed data as
//!   it arrives and asks for more when it runs out.
//! * [`der`]: encoding with the Distinguished Encoding Rules.
//! * [`per`]: encoding and decoding with the unaligned variant of the
//!   Packed Encoding Rules.
//! * [`xer`]: encoding and decoding with the XML Encoding Rules, both the
//!   basic and the canonical variant.
//!
//! The [`constraints`] module allows checking values against the
//! constraints of their types independently of any encoding.
//!
//! Decoders report the outcome as a `Result<Decoded<T>, DecodeError>`.
//! A [`Decoded::WantMore`] signals that the data ended before the value
//! was complete. Errors are final. Encoders write to a
//! [`Target`][encode::Target] and fail with an
//! [`EncodeError`][encode::EncodeError].
//!
//! The crate uses the `log` crate for diagnostics. Decoding failures are
//! logged at debug level, the progress of the drivers at trace level.

//--- Re-exports

pub use self::containers::{SequenceOf, SetOf};
pub use self::decode::{Decoded, DecodeError};
pub use self::enumerated::EnumSpec;
pub use self::int::Integer;
pub use self::length::Length;
pub use self::mode::Mode;
pub use self::oid::Oid;
pub use self::string::{BitString, OctetString, StringKind};
pub use self::tag::{Class, Tag};
pub use self::value::Value;


//--- Public modules

pub mod ber;
pub mod constraints;
pub mod containers;
pub mod decode;
pub mod der;
pub mod descriptor;
pub mod encode;
pub mod oid;
pub mod per;
pub mod string;
pub mod value;
pub mod xer;


//--- Private modules

mod enumerated;
mod int;
mod length;
mod mode;
mod tag;
