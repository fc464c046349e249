//! Decoding BER and DER.
//!
//! The Basic Encoding Rules encode every value as a triple of tag, length,
//! and content. The Distinguished Encoding Rules are a restricted form of
//! BER that allows only one encoding for every value. Which of the two is
//! accepted is selected by the [`Mode`] passed to the decoder.
//!
//! Decoding is driven by a type descriptor. The [`Decoder`] is resumable:
//! it can be fed the encoded data in pieces of arbitrary size as it
//! arrives. If all the data is available at once, the [`decode`] function
//! is more convenient.
//!
//! ```
//! use asncodec::{ber, Mode, Value};
//! use asncodec::descriptor::INTEGER;
//!
//! let (value, consumed) = ber::decode(
//!     &INTEGER, Mode::Der, b"\x02\x01\x2A"
//! ).unwrap();
//! assert_eq!(value, Value::integer(42));
//! assert_eq!(consumed, 3);
//! ```
//!
//! Encoding is always done in DER and lives in [`der`][crate::der].

pub use self::decoder::Decoder;

use crate::decode::{Decoded, DecodeError};
use crate::descriptor::TypeDescriptor;
use crate::mode::Mode;
use crate::value::Value;

mod decoder;


//------------ decode --------------------------------------------------------

/// Decodes a single value from the start of `data`.
///
/// Returns the value and the number of octets it occupied. Any data
/// following the value is ignored. If `data` ends before the value is
/// complete, an error with [`Reason::Incomplete`] is returned.
///
/// [`Reason::Incomplete`]: crate::decode::Reason::Incomplete
pub fn decode(
    desc: &'static TypeDescriptor, mode: Mode, data: &[u8]
) -> Result<(Value, usize), DecodeError> {
    let mut decoder = Decoder::new(desc, mode);
    match decoder.decode(data)? {
        Decoded::Complete { value, consumed } => Ok((value, consumed)),
        Decoded::WantMore { consumed } => {
            Err(DecodeError::incomplete(consumed.into()))
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::{Options, Reason};
    use crate::descriptor::{
        BIT_STRING, BOOLEAN, ChoiceSpec, INTEGER, IA5_STRING, Member, NULL,
        OCTET_STRING, SequenceSpec, TypeKind, UTF8_STRING,
    };
    use crate::enumerated::EnumSpec;
    use crate::int::Integer;
    use crate::string::{BitString, OctetString};
    use crate::tag::Tag;

    fn default_flag() -> Value {
        Value::Boolean(false)
    }

    static RECORD_MEMBERS: [Member; 4] = [
        Member::new("id", &INTEGER),
        Member::new("name", &UTF8_STRING).implicit(Tag::ctx(0)).optional(),
        Member::new("flag", &BOOLEAN).with_default(default_flag),
        Member::new("note", &OCTET_STRING).explicit(Tag::ctx(1)).optional(),
    ];

    static RECORD_SPEC: SequenceSpec = SequenceSpec::new(&RECORD_MEMBERS);

    static RECORD: TypeDescriptor = TypeDescriptor::new(
        "Record", &[Tag::SEQUENCE], TypeKind::Sequence(&RECORD_SPEC)
    );

    static EXT_MEMBERS: [Member; 1] = [Member::new("id", &INTEGER)];

    static EXT_SPEC: SequenceSpec = SequenceSpec::extensible(&EXT_MEMBERS, 1);

    static EXT_RECORD: TypeDescriptor = TypeDescriptor::new(
        "ExtRecord", &[Tag::SEQUENCE], TypeKind::Sequence(&EXT_SPEC)
    );

    static SET_MEMBERS: [Member; 2] = [
        Member::new("a", &INTEGER).implicit(Tag::ctx(0)),
        Member::new("b", &NULL).implicit(Tag::ctx(1)),
    ];

    static SET_SPEC: SequenceSpec = SequenceSpec::new(&SET_MEMBERS);

    static SET: TypeDescriptor = TypeDescriptor::new(
        "Pair", &[Tag::SET], TypeKind::Set(&SET_SPEC)
    );

    static LIST_ELEM: Member = Member::new("item", &INTEGER);

    static LIST: TypeDescriptor = TypeDescriptor::new(
        "List", &[Tag::SEQUENCE], TypeKind::SequenceOf(&LIST_ELEM)
    );

    static ALTS: [Member; 2] = [
        Member::new("number", &INTEGER),
        Member::new("text", &IA5_STRING),
    ];

    static ALTS_SPEC: ChoiceSpec = ChoiceSpec::new(&ALTS);

    static ALT: TypeDescriptor = TypeDescriptor::new(
        "Alt", &[], TypeKind::Choice(&ALTS_SPEC)
    );

    static TAGGED_ALT: TypeDescriptor = TypeDescriptor::new(
        "TaggedAlt", &[Tag::ctx(5)], TypeKind::Choice(&ALTS_SPEC)
    );

    static COLOR_SPEC: EnumSpec = EnumSpec::new(&[(0, "red"), (1, "green")]);

    static COLOR: TypeDescriptor = TypeDescriptor::new(
        "Color", &[Tag::ENUMERATED], TypeKind::Enumerated(&COLOR_SPEC)
    );

    fn reason(
        desc: &'static TypeDescriptor, mode: Mode, data: &[u8]
    ) -> Reason {
        match decode(desc, mode, data) {
            Ok(value) => panic!("unexpectedly decoded {:?}", value),
            Err(err) => err.reason()
        }
    }

    #[test]
    fn decode_sequence() {
        let data = b"\x30\x0C\x02\x01\x05\x80\x02hi\xA1\x03\x04\x01\xFF";
        let (value, consumed) = decode(&RECORD, Mode::Der, data).unwrap();
        assert_eq!(consumed, data.len());
        assert_eq!(value, Value::Sequence(vec![
            Some(Value::integer(5)),
            Some(Value::string("hi")),
            Some(Value::Boolean(false)),
            Some(Value::string(&b"\xFF"[..])),
        ]));
    }

    #[test]
    fn missing_optional_members() {
        let (value, _) = decode(
            &RECORD, Mode::Der, b"\x30\x03\x02\x01\x05"
        ).unwrap();
        assert_eq!(value, Value::Sequence(vec![
            Some(Value::integer(5)), None, Some(Value::Boolean(false)), None
        ]));

        // Mandatory member missing.
        assert_eq!(
            reason(&RECORD, Mode::Der, b"\x30\x04\x80\x02hi"),
            Reason::Malformed
        );
    }

    #[test]
    fn unknown_members() {
        let data = b"\x30\x07\x02\x01\x05\x85\x02\x01\x02";
        assert!(decode(&RECORD, Mode::Der, data).is_err());
        let (value, consumed) = decode(&EXT_RECORD, Mode::Der, data).unwrap();
        assert_eq!(consumed, 9);
        assert_eq!(value, Value::Sequence(vec![Some(Value::integer(5))]));
    }

    #[test]
    fn indefinite_length() {
        let data = b"\x30\x80\x02\x01\x05\xA1\x80\x04\x01\x01\x00\x00\x00\x00";
        let (value, consumed) = decode(&RECORD, Mode::Ber, data).unwrap();
        assert_eq!(consumed, data.len());
        assert_eq!(value, Value::Sequence(vec![
            Some(Value::integer(5)),
            None,
            Some(Value::Boolean(false)),
            Some(Value::string(&b"\x01"[..])),
        ]));
        assert_eq!(reason(&RECORD, Mode::Der, data), Reason::Malformed);
    }

    #[test]
    fn resume_on_every_split() {
        let data = b"\x30\x80\x02\x01\x05\x80\x02hi\x01\x01\xFF\
                     \xA1\x80\x24\x80\x04\x01\x01\x04\x02\x02\x03\x00\x00\
                     \x00\x00\x00\x00";
        let (expected, _) = decode(&RECORD, Mode::Ber, data).unwrap();
        for split in 0..data.len() {
            let mut decoder = Decoder::new(&RECORD, Mode::Ber);
            let first = decoder.decode(&data[..split]).unwrap();
            let consumed = match first {
                Decoded::WantMore { consumed } => consumed,
                Decoded::Complete { .. } => panic!("complete at {}", split),
            };
            assert!(consumed <= split);
            match decoder.decode(&data[consumed..]).unwrap() {
                Decoded::Complete { value, consumed: rest } => {
                    assert_eq!(value, expected);
                    assert_eq!(consumed + rest, data.len());
                }
                Decoded::WantMore { .. } => panic!("incomplete at {}", split)
            }
        }
    }

    #[test]
    fn byte_by_byte() {
        let data = b"\x30\x09\x02\x01\x01\x02\x01\x02\x02\x01\x00";
        let mut decoder = Decoder::new(&LIST, Mode::Der);
        let mut pending = Vec::new();
        let mut result = None;
        for octet in data.iter() {
            pending.push(*octet);
            match decoder.decode(&pending).unwrap() {
                Decoded::Complete { value, consumed } => {
                    assert_eq!(consumed, pending.len());
                    result = Some(value);
                }
                Decoded::WantMore { consumed } => {
                    pending.drain(..consumed);
                }
            }
        }
        assert_eq!(result, Some(Value::SequenceOf(vec![
            Value::integer(1), Value::integer(2), Value::integer(0)
        ].into())));
        assert!(decoder.decode(b"").is_err());
    }

    #[test]
    fn incomplete() {
        let err = decode(&LIST, Mode::Der, b"\x30\x06\x02\x01\x01").unwrap_err();
        assert_eq!(err.reason(), Reason::Incomplete);
        let err = decode(&INTEGER, Mode::Der, b"").unwrap_err();
        assert_eq!(err.reason(), Reason::Incomplete);
    }

    #[test]
    fn set_members() {
        let (value, _) = decode(
            &SET, Mode::Der, b"\x31\x05\x81\x00\x80\x01\x07"
        ).unwrap();
        assert_eq!(value, Value::Sequence(vec![
            Some(Value::integer(7)), Some(Value::Null)
        ]));
        assert!(decode(
            &SET, Mode::Der, b"\x31\x06\x80\x01\x07\x80\x01\x07"
        ).is_err());
    }

    #[test]
    fn choice() {
        let (value, _) = decode(&ALT, Mode::Der, b"\x16\x02ab").unwrap();
        assert_eq!(value, Value::choice(1, Value::string("ab")));
        let (value, _) = decode(
            &TAGGED_ALT, Mode::Der, b"\xA5\x03\x02\x01\x09"
        ).unwrap();
        assert_eq!(value, Value::choice(0, Value::integer(9)));
        assert!(decode(&ALT, Mode::Der, b"\x04\x00").is_err());
    }

    #[test]
    fn constructed_strings() {
        let data = b"\x24\x80\x04\x02ab\x24\x04\x04\x02cd\x00\x00";
        let (value, _) = decode(&OCTET_STRING, Mode::Ber, data).unwrap();
        assert_eq!(value, Value::OctetString(OctetString::from("abcd")));
        assert_eq!(reason(&OCTET_STRING, Mode::Der, data), Reason::Malformed);

        let data = b"\x23\x09\x03\x02\x00\xF0\x03\x03\x04\x0F\xA0";
        let (value, _) = decode(&BIT_STRING, Mode::Ber, data).unwrap();
        assert_eq!(
            value,
            Value::BitString(BitString::from_slice(4, b"\xF0\x0F\xA0").unwrap())
        );

        // Only the last fragment may have unused bits.
        let data = b"\x23\x09\x03\x02\x04\xF0\x03\x03\x00\x0F\xA0";
        assert!(decode(&BIT_STRING, Mode::Ber, data).is_err());
    }

    #[test]
    fn der_restrictions() {
        // Long form length for a short value.
        assert!(decode(&INTEGER, Mode::Der, b"\x02\x81\x01\x05").is_err());
        assert!(decode(&INTEGER, Mode::Ber, b"\x02\x81\x01\x05").is_ok());

        // Booleans.
        assert!(decode(&BOOLEAN, Mode::Der, b"\x01\x01\x01").is_err());
        assert_eq!(
            decode(&BOOLEAN, Mode::Ber, b"\x01\x01\x01").unwrap().0,
            Value::Boolean(true)
        );

        // Unused bits must be zero.
        assert!(decode(&BIT_STRING, Mode::Der, b"\x03\x02\x04\xF1").is_err());
        assert!(decode(&BIT_STRING, Mode::Ber, b"\x03\x02\x04\xF1").is_ok());
    }

    #[test]
    fn integers() {
        assert!(decode(&INTEGER, Mode::Der, b"\x02\x03\x00\x00\x7F").is_err());
        let (value, _) = decode(
            &INTEGER, Mode::Ber, b"\x02\x03\x00\x00\x7F"
        ).unwrap();
        assert_eq!(value, Value::Integer(Integer::from(0x7F)));
        assert_eq!(reason(&INTEGER, Mode::Ber, b"\x02\x00"), Reason::Malformed);
    }

    #[test]
    fn primitive_checks() {
        assert!(decode(&NULL, Mode::Der, b"\x05\x00").is_ok());
        assert!(decode(&NULL, Mode::Der, b"\x05\x01\x00").is_err());
        assert!(decode(&BIT_STRING, Mode::Der, b"\x03\x01\x08").is_err());
        assert!(decode(&BIT_STRING, Mode::Der, b"\x03\x02\x08\x00").is_err());
        assert!(decode(&IA5_STRING, Mode::Der, b"\x16\x01\x80").is_err());
        assert_eq!(
            decode(&COLOR, Mode::Der, b"\x0A\x01\x01").unwrap().0,
            Value::Enumerated(1)
        );
        assert_eq!(
            reason(&COLOR, Mode::Der, b"\x0A\x01\x02"), Reason::Constraint
        );
    }

    #[test]
    fn nested_length_overrun() {
        // The inner integer claims more than the sequence holds.
        assert!(decode(
            &LIST, Mode::Der, b"\x30\x03\x02\x02\x01\x02\x02"
        ).is_err());
    }

    #[test]
    fn limits() {
        let data = b"\x30\x80\x02\x01\x05\xA1\x80\x04\x01\x01\x00\x00\x00\x00";
        let options = Options::default().with_max_depth(2);
        let mut decoder = Decoder::with_options(&RECORD, Mode::Ber, options);
        assert!(decoder.decode(data).unwrap().is_complete());
        let options = Options::default().with_max_depth(1);
        let mut decoder = Decoder::with_options(&RECORD, Mode::Ber, options);
        assert_eq!(
            decoder.decode(data).unwrap_err().reason(), Reason::Overflow
        );

        let options = Options::default().with_max_size(4);
        let mut decoder = Decoder::with_options(
            &OCTET_STRING, Mode::Ber, options
        );
        assert_eq!(
            decoder.decode(b"\x04\x05abcde").unwrap_err().reason(),
            Reason::Overflow
        );
    }
}
