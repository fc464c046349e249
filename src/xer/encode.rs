//! The XER encoder.
//!
//! This is a private module.

use std::convert::Infallible;
use std::fmt::Write;
use crate::decode::ContentError;
use crate::descriptor::{Member, SequenceSpec, TypeDescriptor, TypeKind};
use crate::encode::EncodeError;
use crate::value::Value;
use super::Flags;


type Error = EncodeError<Infallible>;


//------------ XmlWriter -----------------------------------------------------

/// Produces the XML text of a value.
pub struct XmlWriter {
    /// The text produced so far.
    out: String,

    /// Which flavour of XER to produce.
    flags: Flags,
}

impl XmlWriter {
    pub fn new(flags: Flags) -> Self {
        XmlWriter { out: String::new(), flags }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Writes a value as an element with the given name.
    pub fn element(
        &mut self, name: &str, ty: &TypeDescriptor, value: &Value,
        level: usize
    ) -> Result<(), Error> {
        self.indent(level);
        if is_structured(ty) {
            self.out.push('<');
            self.out.push_str(name);
            self.out.push('>');
            self.newline();
            self.children(ty, value, level + 1)?;
            self.indent(level);
        }
        else {
            let start = self.out.len();
            self.out.push('<');
            self.out.push_str(name);
            self.out.push('>');
            let content = self.out.len();
            self.content(ty, value)?;
            if self.out.len() == content {
                // No content: use an empty element tag instead.
                self.out.truncate(start);
                self.out.push('<');
                self.out.push_str(name);
                self.out.push_str("/>");
                self.newline();
                return Ok(())
            }
        }
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self.newline();
        Ok(())
    }

    /// Writes the elements of a constructed value.
    fn children(
        &mut self, ty: &TypeDescriptor, value: &Value, level: usize
    ) -> Result<(), Error> {
        match (ty.kind, value) {
            (TypeKind::Sequence(spec), Value::Sequence(slots))
            | (TypeKind::Set(spec), Value::Sequence(slots)) => {
                for (member, value) in self.members(ty, spec, slots)? {
                    self.element(member.name, member.ty, value, level)?;
                }
            }
            (TypeKind::SequenceOf(elem), Value::SequenceOf(items)) => {
                for item in items {
                    self.element(elem.name, elem.ty, item, level)?;
                }
            }
            (TypeKind::SetOf(elem), Value::SetOf(items)) => {
                if self.flags == Flags::Canonical {
                    let mut encoded = Vec::with_capacity(items.len());
                    for item in items {
                        let mut writer = XmlWriter::new(self.flags);
                        writer.element(elem.name, elem.ty, item, level)?;
                        encoded.push(writer.into_string());
                    }
                    encoded.sort();
                    for item in encoded {
                        self.out.push_str(&item);
                    }
                }
                else {
                    for item in items {
                        self.element(elem.name, elem.ty, item, level)?;
                    }
                }
            }
            (TypeKind::Choice(spec), Value::Choice(idx, inner)) => {
                let alt = spec.alternatives.get(*idx).ok_or_else(|| {
                    EncodeError::invalid(
                        ty.name,
                        format!("no alternative with index {}", idx)
                    )
                })?;
                self.element(alt.name, alt.ty, inner, level)?;
            }
            _ => return Err(mismatch(ty, value))
        }
        Ok(())
    }

    /// Returns the members of a SEQUENCE or SET to write in order.
    fn members<'a>(
        &self, ty: &TypeDescriptor, spec: &'a SequenceSpec,
        slots: &'a [Option<Value>]
    ) -> Result<Vec<(&'a Member, &'a Value)>, Error> {
        if slots.len() != spec.members.len() {
            return Err(EncodeError::invalid(
                ty.name,
                format!(
                    "expected {} members, got {}",
                    spec.members.len(), slots.len()
                )
            ))
        }
        let canonical = self.flags == Flags::Canonical;
        let root_len = spec.root_len();
        let mut res = Vec::with_capacity(slots.len());
        for (idx, (member, slot)) in spec.members.iter().zip(slots).enumerate() {
            match slot {
                Some(value) if canonical && member.is_default(value) => { }
                Some(value) => res.push((member, value)),
                None if member.is_optional() || idx >= root_len => { }
                None => {
                    return Err(EncodeError::invalid(
                        ty.name, format!("missing member {}", member.name)
                    ))
                }
            }
        }
        if canonical && matches!(ty.kind, TypeKind::Set(_)) {
            res.sort_by_key(|(member, _)| member.least_outer_tag());
        }
        Ok(res)
    }

    /// Writes the content of a simple value.
    fn content(
        &mut self, ty: &TypeDescriptor, value: &Value
    ) -> Result<(), Error> {
        let invalid = |err: ContentError| EncodeError::invalid(ty.name, err);
        match (ty.kind, value) {
            (TypeKind::Boolean, Value::Boolean(true)) => {
                self.out.push_str("<true/>")
            }
            (TypeKind::Boolean, Value::Boolean(false)) => {
                self.out.push_str("<false/>")
            }
            (TypeKind::Null, Value::Null) => { }
            (TypeKind::Integer, Value::Integer(int)) => {
                self.out.push_str(&int.to_decimal())
            }
            (TypeKind::Enumerated(spec), Value::Enumerated(int)) => {
                let name = spec.value_to_name(*int).ok_or_else(|| {
                    EncodeError::invalid(
                        ty.name, format!("no name for value {}", int)
                    )
                })?;
                self.out.push('<');
                self.out.push_str(name);
                self.out.push_str("/>");
            }
            (TypeKind::OctetString(kind), Value::OctetString(octets)) => {
                if kind.is_text() {
                    let text = kind.to_text(
                        octets.as_slice()
                    ).map_err(invalid)?;
                    escape(&text, &mut self.out);
                }
                else {
                    for octet in octets.as_slice() {
                        // Writing to a string never fails.
                        let _ = write!(self.out, "{:02X}", octet);
                    }
                }
            }
            (TypeKind::BitString, Value::BitString(bits)) => {
                for idx in 0..bits.bit_len() {
                    self.out.push(if bits.bit(idx) { '1' } else { '0' });
                }
            }
            (TypeKind::ObjectIdentifier, Value::Oid(oid)) => {
                let _ = write!(self.out, "{}", oid);
            }
            _ => return Err(mismatch(ty, value))
        }
        Ok(())
    }

    fn indent(&mut self, level: usize) {
        if self.flags == Flags::Basic {
            for _ in 0..level {
                self.out.push_str("    ");
            }
        }
    }

    fn newline(&mut self) {
        if self.flags == Flags::Basic {
            self.out.push('\n');
        }
    }
}


//------------ Helpers -------------------------------------------------------

/// Returns whether a value of the type is written as nested elements.
pub fn is_structured(ty: &TypeDescriptor) -> bool {
    matches!(
        ty.kind,
        TypeKind::Sequence(_) | TypeKind::Set(_) | TypeKind::SequenceOf(_) |
        TypeKind::SetOf(_) | TypeKind::Choice(_)
    )
}

/// Appends text with the XML special characters escaped.
///
/// Control characters are written as character references.
fn escape(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            ch if (ch as u32) < 0x20 && ch != '\n' && ch != '\t' => {
                let _ = write!(out, "&#{};", ch as u32);
            }
            ch => out.push(ch)
        }
    }
}

fn mismatch(ty: &TypeDescriptor, value: &Value) -> Error {
    EncodeError::invalid(
        ty.name,
        format!("{} value for {}", value.variant_name(), ty.name)
    )
}
