//! Encoding in DER.
//!
//! Values are always encoded using the Distinguished Encoding Rules. Since
//! DER is a valid form of BER, the result can be decoded in either
//! [`Mode`][crate::Mode].
//!
//! DER requires definite lengths which have to be known before the content
//! of a value is written. Encoding therefore happens in two passes: the
//! length of every constructed value is calculated first and then the
//! value is written. As a sanity check, the encoder compares the amount of
//! content actually written for each value with the calculated length.
//!
//! ```
//! use asncodec::{der, Value};
//! use asncodec::descriptor::INTEGER;
//!
//! let data = der::encode_to_vec(&INTEGER, &Value::integer(300)).unwrap();
//! assert_eq!(data, b"\x02\x02\x01\x2C");
//! ```

use std::convert::Infallible;
use log::{debug, trace};
use crate::decode::ContentError;
use crate::descriptor::{Member, SequenceSpec, TypeDescriptor, TypeKind};
use crate::encode::{Counted, EncodeError, Target};
use crate::int::Integer;
use crate::length::Length;
use crate::tag::Tag;
use crate::value::Value;


//------------ Public Functions ----------------------------------------------

/// Encodes a value of the given type in DER into a target.
pub fn encode<T: Target>(
    desc: &TypeDescriptor, value: &Value, target: &mut T
) -> Result<(), EncodeError<T::Error>> {
    trace!("DER: encoding {}", desc.name);
    let mut target = Counted::new(target);
    let res = write_tagged(desc.tags, desc, value, &mut target);
    if let Err(EncodeError::Invalid { type_name, error }) = &res {
        debug!("DER: cannot encode {}: {}", type_name, error);
    }
    res
}

/// Returns the length of the DER encoding of a value.
pub fn encoded_len(
    desc: &TypeDescriptor, value: &Value
) -> Result<usize, EncodeError<Infallible>> {
    tagged_len(desc.tags, desc, value)
}

/// Encodes a value of the given type in DER into a new vec.
pub fn encode_to_vec(
    desc: &TypeDescriptor, value: &Value
) -> Result<Vec<u8>, EncodeError<Infallible>> {
    let mut res = Vec::with_capacity(encoded_len(desc, value)?);
    encode(desc, value, &mut res)?;
    Ok(res)
}


//------------ Length Calculation --------------------------------------------

/// Returns the length of a value encoded with the given tag chain.
fn tagged_len(
    tags: &[Tag], ty: &TypeDescriptor, value: &Value
) -> Result<usize, EncodeError<Infallible>> {
    let mut len = if ty.is_choice() {
        let (alt, inner) = alternative(ty, value)?;
        tagged_len(&alt.tags(), alt.ty, inner)?
    }
    else {
        if tags.is_empty() {
            return Err(EncodeError::invalid(ty.name, "type without tag"))
        }
        content_len(ty, value)?
    };
    for tag in tags.iter().rev() {
        len += tag.encoded_len() + Length::definite(len).encoded_len();
    }
    Ok(len)
}

/// Returns the length of the content octets of a value.
fn content_len(
    ty: &TypeDescriptor, value: &Value
) -> Result<usize, EncodeError<Infallible>> {
    match (ty.kind, value) {
        (TypeKind::Boolean, Value::Boolean(_)) => Ok(1),
        (TypeKind::Null, Value::Null) => Ok(0),
        (TypeKind::Integer, Value::Integer(int)) => Ok(int.as_slice().len()),
        (TypeKind::Enumerated(_), Value::Enumerated(_)) => {
            Ok(enumerated(ty, value)?.as_slice().len())
        }
        (TypeKind::OctetString(kind), Value::OctetString(octets)) => {
            kind.check(octets.as_slice()).map_err(|err| {
                EncodeError::invalid(ty.name, err)
            })?;
            Ok(octets.len())
        }
        (TypeKind::BitString, Value::BitString(bits)) => {
            Ok(bits.octet_len() + 1)
        }
        (TypeKind::ObjectIdentifier, Value::Oid(oid)) => {
            Ok(oid.as_slice().len())
        }
        (TypeKind::Sequence(spec), Value::Sequence(slots))
        | (TypeKind::Set(spec), Value::Sequence(slots)) => {
            let mut len = 0;
            for (member, value) in present_members(ty, spec, slots)? {
                len += tagged_len(&member.tags(), member.ty, value)?;
            }
            Ok(len)
        }
        (TypeKind::SequenceOf(elem), Value::SequenceOf(items)) => {
            elements_len(elem, items.as_slice())
        }
        (TypeKind::SetOf(elem), Value::SetOf(items)) => {
            elements_len(elem, items.as_slice())
        }
        _ => Err(mismatch(ty, value))
    }
}

fn elements_len(
    elem: &Member, items: &[Value]
) -> Result<usize, EncodeError<Infallible>> {
    let tags = elem.tags();
    let mut len = 0;
    for item in items {
        len += tagged_len(&tags, elem.ty, item)?;
    }
    Ok(len)
}


//------------ Writing -------------------------------------------------------

/// Writes a value with the given tag chain.
fn write_tagged<T: Target>(
    tags: &[Tag], ty: &TypeDescriptor, value: &Value,
    target: &mut Counted<T>
) -> Result<(), EncodeError<T::Error>> {
    let (tag, rest) = match tags.split_first() {
        Some(some) => some,
        None => {
            // Only an untagged CHOICE gets here.
            let (alt, inner) = alternative(ty, value).map_err(
                EncodeError::widen
            )?;
            return write_tagged(&alt.tags(), alt.ty, inner, target)
        }
    };
    if !rest.is_empty() || ty.is_choice() {
        let len = tagged_len(rest, ty, value).map_err(EncodeError::widen)?;
        tag.write_encoded(true, target)?;
        Length::definite(len).write_encoded(target)?;
        let start = target.count();
        write_tagged(rest, ty, value, target)?;
        check_written(ty, len, target.count() - start)
    }
    else {
        let len = content_len(ty, value).map_err(EncodeError::widen)?;
        tag.write_encoded(ty.is_constructed(), target)?;
        Length::definite(len).write_encoded(target)?;
        let start = target.count();
        write_content(ty, value, target)?;
        check_written(ty, len, target.count() - start)
    }
}

/// Writes the content octets of a value.
fn write_content<T: Target>(
    ty: &TypeDescriptor, value: &Value, target: &mut Counted<T>
) -> Result<(), EncodeError<T::Error>> {
    match (ty.kind, value) {
        (TypeKind::Boolean, Value::Boolean(flag)) => {
            target.write_all(if *flag { b"\xFF" } else { b"\x00" })?;
        }
        (TypeKind::Null, Value::Null) => { }
        (TypeKind::Integer, Value::Integer(int)) => {
            target.write_all(int.as_slice())?;
        }
        (TypeKind::Enumerated(_), Value::Enumerated(_)) => {
            let int = enumerated(ty, value).map_err(EncodeError::widen)?;
            target.write_all(int.as_slice())?;
        }
        (TypeKind::OctetString(_), Value::OctetString(octets)) => {
            target.write_all(octets.as_slice())?;
        }
        (TypeKind::BitString, Value::BitString(bits)) => {
            target.write_all(&[bits.unused()])?;
            target.write_all(&bits.masked())?;
        }
        (TypeKind::ObjectIdentifier, Value::Oid(oid)) => {
            target.write_all(oid.as_slice())?;
        }
        (TypeKind::Sequence(spec), Value::Sequence(slots))
        | (TypeKind::Set(spec), Value::Sequence(slots)) => {
            let members = present_members(ty, spec, slots).map_err(
                EncodeError::widen
            )?;
            for (member, value) in members {
                write_tagged(&member.tags(), member.ty, value, target)?;
            }
        }
        (TypeKind::SequenceOf(elem), Value::SequenceOf(items)) => {
            let tags = elem.tags();
            for item in items {
                write_tagged(&tags, elem.ty, item, target)?;
            }
        }
        (TypeKind::SetOf(elem), Value::SetOf(items)) => {
            // The elements are ordered by their encodings. Shorter ones
            // sort as if padded with zero octets, which is exactly how
            // slices compare.
            let tags = elem.tags();
            let mut encoded = Vec::with_capacity(items.len());
            for item in items {
                let mut buf = Counted::new(Vec::new());
                write_tagged(&tags, elem.ty, item, &mut buf).map_err(
                    EncodeError::widen
                )?;
                encoded.push(buf.into_target());
            }
            encoded.sort();
            for item in encoded {
                target.write_all(&item)?;
            }
        }
        _ => return Err(mismatch(ty, value).widen())
    }
    Ok(())
}

fn check_written<E>(
    ty: &TypeDescriptor, expected: usize, written: usize
) -> Result<(), EncodeError<E>> {
    if expected == written {
        Ok(())
    }
    else {
        Err(EncodeError::invalid(
            ty.name,
            format!(
                "announced {} content octets but wrote {}", expected, written
            )
        ))
    }
}


//------------ Helpers -------------------------------------------------------

/// Returns the chosen alternative of a CHOICE value.
fn alternative<'a>(
    ty: &'a TypeDescriptor, value: &'a Value
) -> Result<(&'a Member, &'a Value), EncodeError<Infallible>> {
    match (ty.kind, value) {
        (TypeKind::Choice(spec), Value::Choice(idx, inner)) => {
            match spec.alternatives.get(*idx) {
                Some(alt) => Ok((alt, inner)),
                None => {
                    Err(EncodeError::invalid(
                        ty.name,
                        format!("no alternative with index {}", idx)
                    ))
                }
            }
        }
        _ => Err(mismatch(ty, value))
    }
}

/// Returns the members of a SEQUENCE or SET to encode in order.
///
/// Absent members and members with their default value are left out. The
/// members of a SET are sorted by their tags.
fn present_members<'a>(
    ty: &TypeDescriptor, spec: &'a SequenceSpec, slots: &'a [Option<Value>]
) -> Result<Vec<(&'a Member, &'a Value)>, EncodeError<Infallible>> {
    if slots.len() != spec.members.len() {
        return Err(EncodeError::invalid(
            ty.name,
            format!(
                "expected {} members, got {}",
                spec.members.len(), slots.len()
            )
        ))
    }
    let root_len = spec.root_len();
    let mut res = Vec::with_capacity(slots.len());
    for (idx, (member, slot)) in spec.members.iter().zip(slots).enumerate() {
        match slot {
            Some(value) if !member.is_default(value) => {
                res.push((member, value))
            }
            Some(_) => { }
            None if member.is_optional() || idx >= root_len => { }
            None => {
                return Err(EncodeError::invalid(
                    ty.name, format!("missing member {}", member.name)
                ))
            }
        }
    }
    if matches!(ty.kind, TypeKind::Set(_)) {
        res.sort_by_key(|(member, _)| member.least_outer_tag());
    }
    Ok(res)
}

/// Returns the integer for an ENUMERATED value.
fn enumerated(
    ty: &TypeDescriptor, value: &Value
) -> Result<Integer, EncodeError<Infallible>> {
    match (ty.kind, value) {
        (TypeKind::Enumerated(spec), Value::Enumerated(int)) => {
            if spec.accepts(*int) {
                Ok(Integer::from(*int))
            }
            else {
                Err(EncodeError::invalid(
                    ty.name, format!("unknown value {}", int)
                ))
            }
        }
        _ => Err(mismatch(ty, value))
    }
}

fn mismatch(ty: &TypeDescriptor, value: &Value) -> EncodeError<Infallible> {
    EncodeError::invalid(
        ty.name,
        ContentError::from(format!(
            "{} value for {}", value.variant_name(), ty.name
        ))
    )
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::ber;
    use crate::descriptor::{
        BIT_STRING, BOOLEAN, ChoiceSpec, INTEGER, NULL, OBJECT_IDENTIFIER,
        OCTET_STRING, PRINTABLE_STRING,
    };
    use crate::encode::{FnTarget, Refused};
    use crate::mode::Mode;
    use crate::oid::Oid;
    use crate::string::BitString;

    fn default_version() -> Value {
        Value::integer(0)
    }

    static RECORD_MEMBERS: [Member; 3] = [
        Member::new("version", &INTEGER)
            .explicit(Tag::ctx(0)).with_default(default_version),
        Member::new("name", &PRINTABLE_STRING),
        Member::new("flag", &BOOLEAN).implicit(Tag::ctx(1)).optional(),
    ];

    static RECORD_SPEC: SequenceSpec = SequenceSpec::new(&RECORD_MEMBERS);

    static RECORD: TypeDescriptor = TypeDescriptor::new(
        "Record", &[Tag::SEQUENCE], TypeKind::Sequence(&RECORD_SPEC)
    );

    static SET_MEMBERS: [Member; 3] = [
        Member::new("z", &NULL).implicit(Tag::ctx(2)),
        Member::new("a", &INTEGER),
        Member::new("m", &BOOLEAN).implicit(Tag::ctx(0)),
    ];

    static SET_SPEC: SequenceSpec = SequenceSpec::new(&SET_MEMBERS);

    static SET: TypeDescriptor = TypeDescriptor::new(
        "Unordered", &[Tag::SET], TypeKind::Set(&SET_SPEC)
    );

    static SET_OF_ELEM: Member = Member::new("item", &OCTET_STRING);

    static SET_OF: TypeDescriptor = TypeDescriptor::new(
        "Bag", &[Tag::SET], TypeKind::SetOf(&SET_OF_ELEM)
    );

    static ALTS: [Member; 2] = [
        Member::new("id", &OBJECT_IDENTIFIER),
        Member::new("bits", &BIT_STRING).implicit(Tag::ctx(7)),
    ];

    static ALTS_SPEC: ChoiceSpec = ChoiceSpec::new(&ALTS);

    static ALT: TypeDescriptor = TypeDescriptor::new(
        "Alt", &[], TypeKind::Choice(&ALTS_SPEC)
    );

    static TAGGED_ALT: TypeDescriptor = TypeDescriptor::new(
        "TaggedAlt", &[Tag::application(1)], TypeKind::Choice(&ALTS_SPEC)
    );

    #[test]
    fn encode_sequence() {
        let value = Value::Sequence(vec![
            Some(Value::integer(2)),
            Some(Value::string("ab")),
            Some(Value::Boolean(true)),
        ]);
        let data = encode_to_vec(&RECORD, &value).unwrap();
        assert_eq!(
            data,
            b"\x30\x0C\xA0\x03\x02\x01\x02\x13\x02ab\x81\x01\xFF"
        );
        assert_eq!(encoded_len(&RECORD, &value).unwrap(), data.len());
        assert_eq!(ber::decode(&RECORD, Mode::Der, &data).unwrap().0, value);
    }

    #[test]
    fn default_members_are_omitted() {
        let value = Value::Sequence(vec![
            Some(Value::integer(0)), Some(Value::string("ab")), None
        ]);
        let data = encode_to_vec(&RECORD, &value).unwrap();
        assert_eq!(data, b"\x30\x04\x13\x02ab");
    }

    #[test]
    fn invalid_values() {
        // Missing mandatory member.
        let value = Value::Sequence(vec![None, None, None]);
        assert!(!encode_to_vec(&RECORD, &value).unwrap_err().is_target());

        // Wrong number of slots.
        let value = Value::Sequence(vec![None]);
        assert!(encode_to_vec(&RECORD, &value).is_err());

        // Character outside the alphabet.
        let value = Value::Sequence(vec![
            None, Some(Value::string("a@b")), None
        ]);
        assert!(encode_to_vec(&RECORD, &value).is_err());

        // Wrong value kind.
        assert!(encode_to_vec(&INTEGER, &Value::Null).is_err());
    }

    #[test]
    fn set_member_order() {
        let value = Value::Sequence(vec![
            Some(Value::Null),
            Some(Value::integer(1)),
            Some(Value::Boolean(false)),
        ]);
        let data = encode_to_vec(&SET, &value).unwrap();
        assert_eq!(
            data,
            b"\x31\x08\x02\x01\x01\x80\x01\x00\x82\x00"
        );
        assert_eq!(ber::decode(&SET, Mode::Der, &data).unwrap().0, value);
    }

    #[test]
    fn set_of_order() {
        let items = [&b"\x02"[..], &b"\x01\x01"[..], &b"\x01"[..], &b""[..]];
        let forward = Value::SetOf(items.iter().map(|item| {
            Value::string(*item)
        }).collect());
        let backward = Value::SetOf(items.iter().rev().map(|item| {
            Value::string(*item)
        }).collect());
        let data = encode_to_vec(&SET_OF, &forward).unwrap();
        assert_eq!(data, encode_to_vec(&SET_OF, &backward).unwrap());
        assert_eq!(
            data,
            b"\x31\x0C\x04\x00\x04\x01\x01\x04\x01\x02\x04\x02\x01\x01"
        );
    }

    #[test]
    fn choice() {
        let oid = Oid::from_arcs(&[1, 2, 840]).unwrap();
        let value = Value::choice(0, Value::Oid(oid));
        assert_eq!(
            encode_to_vec(&ALT, &value).unwrap(),
            b"\x06\x03\x2A\x86\x48"
        );
        assert_eq!(
            encode_to_vec(&TAGGED_ALT, &value).unwrap(),
            b"\x61\x05\x06\x03\x2A\x86\x48"
        );
        assert!(encode_to_vec(&ALT, &Value::choice(2, Value::Null)).is_err());
    }

    #[test]
    fn bit_string_is_masked() {
        let bits = BitString::from_slice(4, b"\xAB\xCD").unwrap();
        let value = Value::choice(1, Value::BitString(bits));
        assert_eq!(
            encode_to_vec(&ALT, &value).unwrap(),
            b"\x87\x03\x04\xAB\xC0"
        );
    }

    #[test]
    fn target_errors() {
        let mut target = FnTarget::new(|_: &[u8]| false);
        let err = encode(&INTEGER, &Value::integer(1), &mut target);
        assert!(matches!(err, Err(EncodeError::Target(Refused))));
    }

    #[test]
    fn long_content() {
        let value = Value::string(vec![0x55u8; 300]);
        let data = encode_to_vec(&OCTET_STRING, &value).unwrap();
        assert_eq!(&data[..4], b"\x04\x82\x01\x2C");
        assert_eq!(data.len(), 304);
    }
}
