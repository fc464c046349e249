//! Encoding and decoding with the XML Encoding Rules.
//!
//! XER represents a value as an XML element named after its type. The
//! members of a SEQUENCE or SET and the alternative of a CHOICE become
//! child elements named after the member. Simple values are written as
//! text: decimal numbers for INTEGER, hex digits for OCTET STRING, and
//! zeros and ones for BIT STRING. BOOLEAN values and ENUMERATED items are
//! written as empty elements such as `<true/>`.
//!
//! There are two flavours selected via [`Flags`]. Basic XER is indented
//! for human readers. Canonical XER contains no white space outside of
//! values, leaves out members that have their default value, and sorts
//! the items of a SET OF so that every value has exactly one encoding.
//!
//! ```
//! use asncodec::{xer, Value};
//! use asncodec::descriptor::INTEGER;
//!
//! let text = xer::encode_to_string(
//!     &INTEGER, &Value::integer(-7), xer::Flags::Canonical
//! ).unwrap();
//! assert_eq!(text, "<INTEGER>-7</INTEGER>");
//! assert_eq!(xer::decode(&INTEGER, &text).unwrap(), Value::integer(-7));
//! ```
//!
//! The decoder accepts either flavour. It only understands the subset of
//! XML that XER needs and doesn’t validate the document beyond that.

use std::convert::Infallible;
use log::{debug, trace};
use crate::decode::{ContentError, DecodeError, Options, Reason};
use crate::descriptor::TypeDescriptor;
use crate::encode::{EncodeError, Target};
use crate::value::Value;
use self::decode::XmlReader;
use self::encode::XmlWriter;


//--- Private modules

mod decode;
mod encode;
mod lexer;


//------------ Flags ---------------------------------------------------------

/// The flavour of XER to produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flags {
    /// Basic XER with one element per line, indented by nesting level.
    Basic,

    /// Canonical XER.
    Canonical,
}


//------------ Public Functions ----------------------------------------------

/// Encodes a value of the given type into a target.
///
/// The text is written as UTF-8 without an XML declaration.
pub fn encode<T: Target>(
    desc: &TypeDescriptor, value: &Value, flags: Flags, target: &mut T
) -> Result<(), EncodeError<T::Error>> {
    trace!("XER: encoding {} ({:?})", desc.name, flags);
    let mut writer = XmlWriter::new(flags);
    if let Err(err) = writer.element(desc.xml_tag, desc, value, 0) {
        if let EncodeError::Invalid { type_name, ref error } = err {
            debug!("XER: cannot encode {}: {}", type_name, error);
        }
        return Err(err.widen())
    }
    target.write_all(writer.into_string().as_bytes())?;
    Ok(())
}

/// Encodes a value of the given type into a new string.
pub fn encode_to_string(
    desc: &TypeDescriptor, value: &Value, flags: Flags
) -> Result<String, EncodeError<Infallible>> {
    let mut writer = XmlWriter::new(flags);
    writer.element(desc.xml_tag, desc, value, 0)?;
    Ok(writer.into_string())
}

/// Decodes a value of the given type from XML text.
///
/// The text must contain exactly one element for the value. It may be
/// surrounded by white space, comments, and an XML declaration. Positions
/// in errors are byte offsets into the text.
pub fn decode(
    desc: &'static TypeDescriptor, text: &str
) -> Result<Value, DecodeError> {
    decode_with(desc, text, Options::default())
}

/// Decodes a value with the given limits.
///
/// The text as a whole must not be longer than the maximum size.
pub fn decode_with(
    desc: &'static TypeDescriptor, text: &str, options: Options
) -> Result<Value, DecodeError> {
    trace!("XER: decoding {} from {} octets", desc.name, text.len());
    if text.len() > options.max_size {
        return Err(DecodeError::content(
            ContentError::with_reason(
                Reason::Overflow, "value exceeds maximum size"
            ),
            0usize.into()
        ))
    }
    let mut reader = XmlReader::new(text, options);
    reader.document(desc).map_err(|err| {
        debug!(
            "XER: failed to decode {} at offset {}: {}",
            desc.name, reader.pos(), err
        );
        DecodeError::content(err, reader.pos().into())
    })
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::containers::{SequenceOf, SetOf};
    use crate::descriptor::{
        BIT_STRING, BOOLEAN, ChoiceSpec, IA5_STRING, INTEGER, Member, NULL,
        OBJECT_IDENTIFIER, OCTET_STRING, SequenceSpec, TypeKind, UTF8_STRING,
    };
    use crate::enumerated::EnumSpec;
    use crate::oid::Oid;
    use crate::string::BitString;
    use crate::tag::Tag;

    fn default_level() -> Value {
        Value::integer(1)
    }

    static COLORS: EnumSpec = EnumSpec::new(&[(0, "red"), (1, "green")]);

    static COLOR: TypeDescriptor = TypeDescriptor::new(
        "Color", &[Tag::ENUMERATED], TypeKind::Enumerated(&COLORS)
    );

    static NUMBERS_ELEM: Member = Member::new("INTEGER", &INTEGER);

    static NUMBERS: TypeDescriptor = TypeDescriptor::new(
        "Numbers", &[Tag::SET], TypeKind::SetOf(&NUMBERS_ELEM)
    );

    static ITEM_MEMBERS: [Member; 5] = [
        Member::new("name", &UTF8_STRING),
        Member::new("level", &INTEGER).implicit(Tag::ctx(0))
            .with_default(default_level),
        Member::new("active", &BOOLEAN).implicit(Tag::ctx(1)).optional(),
        Member::new("color", &COLOR).implicit(Tag::ctx(2)),
        Member::new("numbers", &NUMBERS).implicit(Tag::ctx(3)),
    ];

    static ITEM_SPEC: SequenceSpec = SequenceSpec::new(&ITEM_MEMBERS);

    static ITEM: TypeDescriptor = TypeDescriptor::new(
        "Item", &[Tag::SEQUENCE], TypeKind::Sequence(&ITEM_SPEC)
    );

    static OPEN_MEMBERS: [Member; 1] = [
        Member::new("flag", &BOOLEAN),
    ];

    static OPEN_SPEC: SequenceSpec = SequenceSpec::extensible(
        &OPEN_MEMBERS, 1
    );

    static OPEN: TypeDescriptor = TypeDescriptor::new(
        "Open", &[Tag::SEQUENCE], TypeKind::Sequence(&OPEN_SPEC)
    );

    static ALTS: [Member; 2] = [
        Member::new("none", &NULL).implicit(Tag::ctx(0)),
        Member::new("data", &OCTET_STRING).implicit(Tag::ctx(1)),
    ];

    static ALTS_SPEC: ChoiceSpec = ChoiceSpec::new(&ALTS);

    static ALT: TypeDescriptor = TypeDescriptor::new(
        "Alt", &[], TypeKind::Choice(&ALTS_SPEC)
    );

    fn item(level: i64, numbers: &[i64]) -> Value {
        Value::Sequence(vec![
            Some(Value::string("a<b")),
            Some(Value::integer(level)),
            Some(Value::Boolean(true)),
            Some(Value::Enumerated(1)),
            Some(Value::SetOf(SetOf::from(
                numbers.iter().copied().map(Value::integer).collect::<Vec<_>>()
            ))),
        ])
    }

    fn round_trip(desc: &'static TypeDescriptor, value: &Value) {
        for &flags in &[Flags::Basic, Flags::Canonical] {
            let text = encode_to_string(desc, value, flags).unwrap();
            assert_eq!(decode(desc, &text).unwrap(), *value, "{}", text);
        }
    }

    #[test]
    fn basic() {
        assert_eq!(
            encode_to_string(&ITEM, &item(1, &[3, 2]), Flags::Basic).unwrap(),
            "<Item>\n\
             \x20   <name>a&lt;b</name>\n\
             \x20   <level>1</level>\n\
             \x20   <active><true/></active>\n\
             \x20   <color><green/></color>\n\
             \x20   <numbers>\n\
             \x20       <INTEGER>3</INTEGER>\n\
             \x20       <INTEGER>2</INTEGER>\n\
             \x20   </numbers>\n\
             </Item>\n"
        );
    }

    #[test]
    fn canonical() {
        assert_eq!(
            encode_to_string(
                &ITEM, &item(1, &[3, 2]), Flags::Canonical
            ).unwrap(),
            "<Item><name>a&lt;b</name><active><true/></active>\
             <color><green/></color><numbers><INTEGER>2</INTEGER>\
             <INTEGER>3</INTEGER></numbers></Item>"
        );
        assert_eq!(
            encode_to_string(
                &ITEM, &item(1, &[2, 3]), Flags::Canonical
            ).unwrap(),
            encode_to_string(
                &ITEM, &item(1, &[3, 2]), Flags::Canonical
            ).unwrap(),
        );
    }

    #[test]
    fn round_trips() {
        // Canonical decoding returns SET OF items in sorted order.
        round_trip(&ITEM, &item(1, &[2, 3]));
        round_trip(&ITEM, &item(-12345678901234, &[]));
        round_trip(&ALT, &Value::choice(0, Value::Null));
        round_trip(&ALT, &Value::choice(1, Value::string(&b"\x00\xAB"[..])));
        round_trip(&ALT, &Value::choice(1, Value::string(&b""[..])));
        round_trip(&IA5_STRING, &Value::string(" tab\there & \x01 "));
        round_trip(&UTF8_STRING, &Value::string("grüß"));
        let mut bits = BitString::with_bit_len(5);
        bits.set_bit(1, true);
        bits.set_bit(4, true);
        round_trip(&BIT_STRING, &Value::BitString(bits));
        round_trip(
            &OBJECT_IDENTIFIER,
            &Value::Oid(Oid::from_arcs(&[1, 3, 6, 1]).unwrap())
        );
        round_trip(&COLOR, &Value::Enumerated(0));
    }

    #[test]
    fn decode_leniently() {
        let value = decode(
            &ITEM,
            "<?xml version=\"1.0\"?>\n<!-- an item -->\n<Item>\
             <numbers/><color> <red/> </color><name>x</name></Item>\n"
        ).unwrap();
        assert_eq!(
            value,
            Value::Sequence(vec![
                Some(Value::string("x")),
                Some(Value::integer(1)),
                None,
                Some(Value::Enumerated(0)),
                Some(Value::SetOf(SetOf::from(Vec::new()))),
            ])
        );
        assert_eq!(
            decode(&BOOLEAN, "<BOOLEAN>true</BOOLEAN>").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            decode(&OCTET_STRING, "<OCTET_STRING>0a 0B</OCTET_STRING>")
                .unwrap(),
            Value::string(&b"\x0A\x0B"[..])
        );
        assert_eq!(
            decode(&OPEN, "<Open><flag><false/></flag><new>1</new></Open>")
                .unwrap(),
            Value::Sequence(vec![Some(Value::Boolean(false))])
        );
    }

    #[test]
    fn errors() {
        let reason = |desc: &'static TypeDescriptor, text: &str| {
            decode(desc, text).unwrap_err().reason()
        };
        assert_eq!(reason(&INTEGER, "<INTEGER>1</INTEGR>"), Reason::Malformed);
        assert_eq!(reason(&INTEGER, "<INTEGER>1"), Reason::Incomplete);
        assert_eq!(reason(&INTEGER, "<INTEGER>x</INTEGER>"), Reason::Malformed);
        assert_eq!(
            reason(&INTEGER, "<INTEGER>1</INTEGER><INTEGER>"),
            Reason::Malformed
        );
        // Unknown members are only allowed if the type is extensible.
        assert!(decode(
            &ITEM,
            "<Item><name>x</name><color><red/></color><numbers/>\
             <extra/></Item>"
        ).is_err());
        // Missing mandatory member.
        assert!(decode(&ITEM, "<Item><name>x</name></Item>").is_err());
        // Duplicate member.
        assert!(decode(
            &ITEM,
            "<Item><name>x</name><name>y</name><color><red/></color>\
             <numbers/></Item>"
        ).is_err());
        assert!(decode(&COLOR, "<Color><blue/></Color>").is_err());
        assert!(decode(&ALT, "<Alt></Alt>").is_err());
    }

    #[test]
    fn limits() {
        static NESTED_ELEM: Member = Member::new("Numbers", &NUMBERS);
        static NESTED: TypeDescriptor = TypeDescriptor::new(
            "Nested", &[Tag::SEQUENCE], TypeKind::SequenceOf(&NESTED_ELEM)
        );
        let value = Value::SequenceOf(SequenceOf::from(vec![
            Value::SetOf(SetOf::from(vec![Value::integer(1)]))
        ]));
        let text = encode_to_string(&NESTED, &value, Flags::Basic).unwrap();
        assert_eq!(
            decode_with(
                &NESTED, &text, Options::default().with_max_depth(2)
            ).unwrap(),
            value
        );
        assert_eq!(
            decode_with(
                &NESTED, &text, Options::default().with_max_depth(1)
            ).unwrap_err().reason(),
            Reason::Overflow
        );
        assert_eq!(
            decode_with(
                &NESTED, &text, Options::default().with_max_size(10)
            ).unwrap_err().reason(),
            Reason::Overflow
        );
    }

    #[test]
    fn encode_errors() {
        assert!(
            encode_to_string(&ITEM, &Value::Null, Flags::Basic).is_err()
        );
        assert!(
            encode_to_string(&COLOR, &Value::Enumerated(4), Flags::Basic)
                .is_err()
        );
        let mut target = Vec::new();
        encode(&BOOLEAN, &Value::Boolean(false), Flags::Canonical, &mut target)
            .unwrap();
        assert_eq!(target, b"<BOOLEAN><false/></BOOLEAN>");
    }
}
