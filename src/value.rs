//! Values of ASN.1 types.
//!
//! The drivers don’t work on Rust types directly. Instead, they encode and
//! decode a [`Value`], a dynamic representation of a value of any type
//! described by a [`TypeDescriptor`]. The [`print`] function renders such a
//! value in a human readable form.

use std::fmt;
use crate::containers::{SequenceOf, SetOf};
use crate::descriptor::{Member, TypeDescriptor, TypeKind};
use crate::int::Integer;
use crate::oid::Oid;
use crate::string::{BitString, OctetString};


//------------ Value ---------------------------------------------------------

/// A value of some ASN.1 type.
///
/// Which variant is used for a type is determined by the
/// [`TypeKind`] of its descriptor. Both SEQUENCE and SET values use the
/// `Sequence` variant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// A BOOLEAN value.
    Boolean(bool),

    /// The NULL value.
    Null,

    /// An INTEGER value.
    Integer(Integer),

    /// An ENUMERATED value.
    Enumerated(i64),

    /// An OCTET STRING or character string value.
    OctetString(OctetString),

    /// A BIT STRING value.
    BitString(BitString),

    /// An OBJECT IDENTIFIER value.
    Oid(Oid),

    /// A SEQUENCE or SET value.
    ///
    /// There is one slot per member of the type, in the order of
    /// definition. Absent members are `None`.
    Sequence(Vec<Option<Value>>),

    /// A SEQUENCE OF value.
    SequenceOf(SequenceOf<Value>),

    /// A SET OF value.
    SetOf(SetOf<Value>),

    /// A CHOICE value: the index of the alternative and its value.
    Choice(usize, Box<Value>),
}

impl Value {
    /// Creates an INTEGER value from a native integer.
    pub fn integer(value: i64) -> Self {
        Value::Integer(value.into())
    }

    /// Creates a string value.
    pub fn string(value: impl Into<OctetString>) -> Self {
        Value::OctetString(value.into())
    }

    /// Creates a CHOICE value.
    pub fn choice(index: usize, value: Value) -> Self {
        Value::Choice(index, Box::new(value))
    }

    /// Returns a short name of the variant for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match *self {
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Enumerated(_) => "enumerated",
            Value::OctetString(_) => "octet string",
            Value::BitString(_) => "bit string",
            Value::Oid(_) => "object identifier",
            Value::Sequence(_) => "sequence",
            Value::SequenceOf(_) => "sequence of",
            Value::SetOf(_) => "set of",
            Value::Choice(..) => "choice",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Integer> for Value {
    fn from(value: Integer) -> Self {
        Value::Integer(value)
    }
}

impl From<OctetString> for Value {
    fn from(value: OctetString) -> Self {
        Value::OctetString(value)
    }
}

impl From<BitString> for Value {
    fn from(value: BitString) -> Self {
        Value::BitString(value)
    }
}

impl From<Oid> for Value {
    fn from(value: Oid) -> Self {
        Value::Oid(value)
    }
}


//------------ print ---------------------------------------------------------

/// Returns a displayable rendering of a value.
///
/// The output looks roughly like ASN.1 value notation with one member per
/// line. It is meant for humans and may change.
pub fn print<'a>(desc: &'a TypeDescriptor, value: &'a Value) -> Print<'a> {
    Print { desc, value }
}

/// A value ready for printing.
pub struct Print<'a> {
    desc: &'a TypeDescriptor,
    value: &'a Value,
}

impl fmt::Display for Print<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        print_value(self.desc, self.value, 0, f)
    }
}

fn indent(level: usize, f: &mut fmt::Formatter) -> fmt::Result {
    for _ in 0..level {
        f.write_str("    ")?;
    }
    Ok(())
}

fn print_value(
    desc: &TypeDescriptor, value: &Value, level: usize,
    f: &mut fmt::Formatter
) -> fmt::Result {
    match (desc.kind, value) {
        (_, Value::Boolean(true)) => f.write_str("TRUE"),
        (_, Value::Boolean(false)) => f.write_str("FALSE"),
        (_, Value::Null) => f.write_str("NULL"),
        (_, Value::Integer(int)) => write!(f, "{}", int),
        (TypeKind::Enumerated(spec), Value::Enumerated(int)) => {
            match spec.value_to_name(*int) {
                Some(name) => write!(f, "{} ({})", int, name),
                None => write!(f, "{}", int),
            }
        }
        (_, Value::Enumerated(int)) => write!(f, "{}", int),
        (TypeKind::OctetString(kind), Value::OctetString(octets))
            if kind.is_text() =>
        {
            match kind.to_text(octets.as_slice()) {
                Ok(text) => f.write_str(&text),
                Err(_) => print_hex(octets.as_slice(), f),
            }
        }
        (_, Value::OctetString(octets)) => print_hex(octets.as_slice(), f),
        (_, Value::BitString(bits)) => {
            print_hex(&bits.masked(), f)?;
            write!(f, " ({} bits)", bits.bit_len())
        }
        (_, Value::Oid(oid)) => write!(f, "{}", oid),
        (TypeKind::Sequence(spec), Value::Sequence(members))
        | (TypeKind::Set(spec), Value::Sequence(members)) => {
            f.write_str(desc.name)?;
            f.write_str(" ::= {\n")?;
            for (member, slot) in spec.members.iter().zip(members) {
                if let Some(inner) = slot {
                    print_member(member, inner, level + 1, f)?;
                }
            }
            indent(level, f)?;
            f.write_str("}")
        }
        (TypeKind::SequenceOf(elem), Value::SequenceOf(items)) => {
            print_list(desc, elem, items.as_slice(), level, f)
        }
        (TypeKind::SetOf(elem), Value::SetOf(items)) => {
            print_list(desc, elem, items.as_slice(), level, f)
        }
        (TypeKind::Choice(spec), Value::Choice(idx, inner)) => {
            match spec.alternatives.get(*idx) {
                Some(alt) => {
                    write!(f, "{}: ", alt.name)?;
                    print_value(alt.ty, inner, level, f)
                }
                None => f.write_str("<unknown alternative>")
            }
        }
        _ => write!(f, "<{} value for {}>", value.variant_name(), desc.name)
    }
}

fn print_member(
    member: &Member, value: &Value, level: usize, f: &mut fmt::Formatter
) -> fmt::Result {
    indent(level, f)?;
    write!(f, "{}: ", member.name)?;
    print_value(member.ty, value, level, f)?;
    f.write_str("\n")
}

fn print_list(
    desc: &TypeDescriptor, elem: &Member, items: &[Value], level: usize,
    f: &mut fmt::Formatter
) -> fmt::Result {
    f.write_str(desc.name)?;
    f.write_str(" ::= {\n")?;
    for item in items {
        indent(level + 1, f)?;
        print_value(elem.ty, item, level + 1, f)?;
        f.write_str("\n")?;
    }
    indent(level, f)?;
    f.write_str("}")
}

fn print_hex(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    for (i, octet) in data.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{:02X}", octet)?;
    }
    Ok(())
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{
        BOOLEAN, INTEGER, OCTET_STRING, SequenceSpec, UTF8_STRING
    };
    use crate::tag::Tag;

    static MEMBERS: [Member; 4] = [
        Member::new("name", &UTF8_STRING),
        Member::new("age", &INTEGER),
        Member::new("data", &OCTET_STRING).optional(),
        Member::new("ok", &BOOLEAN),
    ];

    static SPEC: SequenceSpec = SequenceSpec::new(&MEMBERS);

    static RECORD: TypeDescriptor = TypeDescriptor::new(
        "Record", &[Tag::SEQUENCE], TypeKind::Sequence(&SPEC)
    );

    #[test]
    fn print_record() {
        let value = Value::Sequence(vec![
            Some(Value::string("Zoë")),
            Some(Value::integer(-12)),
            Some(Value::string(&b"\x01\xAB"[..])),
            Some(Value::Boolean(true)),
        ]);
        assert_eq!(
            print(&RECORD, &value).to_string(),
            "Record ::= {\n    name: Zoë\n    age: -12\n    \
             data: 01 AB\n    ok: TRUE\n}"
        );
    }

    #[test]
    fn print_mismatch() {
        assert_eq!(
            print(&INTEGER, &Value::Sequence(Vec::new())).to_string(),
            "<sequence value for INTEGER>"
        );
    }
}
