//! Encoding and decoding with the unaligned Packed Encoding Rules.
//!
//! PER produces a compact encoding by leaving out everything the receiver
//! already knows from the type definition. Tags are never encoded, values
//! within a constrained range only take as many bits as the range requires,
//! and nothing is aligned to octet boundaries. The constraints used for
//! this are the [`PerConstraints`] of a type descriptor or of the member
//! that refers to it.
//!
//! A complete encoding is padded to a full octet with zero bits. It always
//! has at least one octet, even if the value itself takes no bits at all.
//!
//! ```
//! use asncodec::{per, Value};
//! use asncodec::constraints::{PerConstraints, Range};
//! use asncodec::descriptor::{TypeDescriptor, TypeKind};
//! use asncodec::Tag;
//!
//! static SMALL: PerConstraints = PerConstraints::value(
//!     Range::constrained(0, 15)
//! );
//! static NIBBLE: TypeDescriptor = TypeDescriptor::new(
//!     "Nibble", &[Tag::INTEGER], TypeKind::Integer
//! ).with_per(&SMALL);
//!
//! let data = per::encode_to_vec(&NIBBLE, &Value::integer(10)).unwrap();
//! assert_eq!(data, b"\xA0");
//! let (value, consumed) = per::decode(&NIBBLE, &data).unwrap();
//! assert_eq!(value, Value::integer(10));
//! assert_eq!(consumed, 1);
//! ```
//!
//! The building blocks of the encoding are available, too. A [`BitWriter`]
//! collects bits while a [`BitCursor`] reads them. Functions for length
//! determinants and open types operate on those.
//!
//! [`PerConstraints`]: crate::constraints::PerConstraints

//--- Re-exports

pub use self::bits::{BitCursor, BitWriter, Refill};
pub use self::number::{get_length, put_length, FRAGMENT};
pub use self::open::{decode_open_type, encode_open_type};


//--- Private modules

mod bits;
mod chars;
mod decode;
mod encode;
mod number;
mod open;


use std::convert::Infallible;
use bytes::Bytes;
use log::{debug, trace};
use crate::decode::{Decoded, DecodeError, Options, Reason};
use crate::descriptor::{Member, TypeDescriptor};
use crate::encode::{EncodeError, Target};
use crate::value::Value;
use self::decode::ValueDecoder;
use self::encode::encode_value;


//------------ Public Functions ----------------------------------------------

/// Encodes a value of the given type into a target.
///
/// A value that violates a constraint visible to PER can’t be encoded and
/// results in an [`EncodeError::Invalid`].
pub fn encode<T: Target>(
    desc: &TypeDescriptor, value: &Value, target: &mut T
) -> Result<(), EncodeError<T::Error>> {
    trace!("PER: encoding {}", desc.name);
    let mut writer = BitWriter::new();
    if let Err(err) = encode_value(
        &mut writer, desc, &desc.per_constraints(), value
    ) {
        if let EncodeError::Invalid { type_name, ref error } = err {
            debug!("PER: cannot encode {}: {}", type_name, error);
        }
        return Err(err.widen())
    }
    writer.flush(target)?;
    Ok(())
}

/// Encodes a value of the given type into a new vec.
pub fn encode_to_vec(
    desc: &TypeDescriptor, value: &Value
) -> Result<Vec<u8>, EncodeError<Infallible>> {
    let mut res = Vec::new();
    encode(desc, value, &mut res)?;
    Ok(res)
}

/// Decodes a value from the start of `data`.
///
/// Returns the value and the number of octets it occupied, including the
/// padding of the last octet. If `data` ends before the value is complete,
/// an error with [`Reason::Incomplete`] is returned.
pub fn decode(
    desc: &'static TypeDescriptor, data: &[u8]
) -> Result<(Value, usize), DecodeError> {
    match Decoder::new(desc).decode(data)? {
        Decoded::Complete { value, consumed } => Ok((value, consumed)),
        Decoded::WantMore { .. } => {
            Err(DecodeError::incomplete((data.len() * 8).into()))
        }
    }
}


//------------ Decoder -------------------------------------------------------

/// A decoder for a PER encoded value.
///
/// Since a PER encoding contains no framing of its own, the decoder can’t
/// tell how much data it needs before it has tried. If the data runs out,
/// the decoder asks for more by returning [`Decoded::WantMore`] without
/// consuming anything. The caller should then try again with all of the
/// data plus more.
///
/// Positions in errors returned by the decoder are bit offsets.
#[derive(Clone, Copy, Debug)]
pub struct Decoder {
    /// The type to decode.
    desc: &'static TypeDescriptor,

    /// The limits to apply.
    options: Options,
}

impl Decoder {
    /// Creates a new decoder for the given type with default options.
    pub fn new(desc: &'static TypeDescriptor) -> Self {
        Self::with_options(desc, Options::default())
    }

    /// Creates a new decoder with the given options.
    pub fn with_options(
        desc: &'static TypeDescriptor, options: Options
    ) -> Self {
        Decoder { desc, options }
    }

    /// Decodes a value from the start of `data`.
    pub fn decode(
        &self, data: &[u8]
    ) -> Result<Decoded<Value>, DecodeError> {
        if data.is_empty() {
            return Ok(Decoded::WantMore { consumed: 0 })
        }
        trace!("PER: decoding {} from {} octets", self.desc.name, data.len());
        let mut cursor = BitCursor::new(Bytes::copy_from_slice(data));
        let res = ValueDecoder::new(self.options).decode_value(
            &mut cursor, self.desc, &self.desc.per_constraints()
        );
        match res {
            Ok(value) => {
                Ok(Decoded::Complete {
                    value,
                    consumed: cursor.pos().div_ceil(8).max(1)
                })
            }
            Err(err) if err.reason() == Reason::Incomplete => {
                Ok(Decoded::WantMore { consumed: 0 })
            }
            Err(err) => {
                debug!(
                    "PER: failed to decode {} at bit {}: {}",
                    self.desc.name, cursor.pos(), err
                );
                Err(DecodeError::content(err, cursor.pos().into()))
            }
        }
    }
}


//------------ Helpers -------------------------------------------------------

/// Returns the indexes of members sorted canonically by their tags.
///
/// Both the root members of a SET and the alternatives of a CHOICE are
/// encoded in this order.
fn canonical_order(members: &[Member]) -> Vec<usize> {
    let mut res: Vec<usize> = (0..members.len()).collect();
    res.sort_by_key(|&idx| members[idx].least_outer_tag());
    res
}


//============ Tests =========================================================
