//! The PER encoder.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::convert::Infallible;
use std::ops;
use crate::constraints::{PerConstraints, Range};
use crate::decode::{ContentError, Reason};
use crate::descriptor::{Member, SequenceSpec, TypeDescriptor, TypeKind};
use crate::encode::EncodeError;
use crate::string::StringKind;
use crate::value::Value;
use super::bits::BitWriter;
use super::chars::CharCoding;
use super::canonical_order;
use super::number::{
    put_fragmented, put_index, put_integer, put_normally_small,
    put_octets_with_length, put_small_length,
};
use super::open::encode_open_type;


/// The error type of the encoder’s internal functions.
type Error = EncodeError<Infallible>;


//------------ encode_value --------------------------------------------------

/// Writes a value of the given type with the given constraints.
pub fn encode_value(
    writer: &mut BitWriter, ty: &TypeDescriptor, per: &PerConstraints,
    value: &Value
) -> Result<(), Error> {
    let invalid = |err: ContentError| EncodeError::invalid(ty.name, err);
    match (ty.kind, value) {
        (TypeKind::Boolean, Value::Boolean(flag)) => {
            writer.put_bit(*flag);
        }
        (TypeKind::Null, Value::Null) => { }
        (TypeKind::Integer, Value::Integer(int)) => {
            put_integer(writer, int, &per.value).map_err(invalid)?;
        }
        (TypeKind::Enumerated(spec), Value::Enumerated(int)) => {
            let idx = spec.value_to_index(*int).ok_or_else(|| {
                EncodeError::invalid(
                    ty.name, format!("unknown value {}", int)
                )
            })?;
            if spec.extensible {
                writer.put_bit(idx >= spec.root_count);
            }
            if idx < spec.root_count {
                put_index(writer, idx, spec.root_count);
            }
            else {
                put_normally_small(writer, (idx - spec.root_count) as u64);
            }
        }
        (TypeKind::OctetString(kind), Value::OctetString(octets)) => {
            encode_string(writer, ty, kind, per, octets.as_slice())?;
        }
        (TypeKind::BitString, Value::BitString(bits)) => {
            let data = bits.masked();
            put_sized(writer, ty, &per.size, bits.bit_len(), |writer, range| {
                writer.put_bit_range(&data, range);
                Ok(())
            })?;
        }
        (TypeKind::ObjectIdentifier, Value::Oid(oid)) => {
            put_octets_with_length(writer, oid.as_slice());
        }
        (TypeKind::Sequence(spec), Value::Sequence(slots))
        | (TypeKind::Set(spec), Value::Sequence(slots)) => {
            encode_sequence(writer, ty, spec, slots)?;
        }
        (TypeKind::SequenceOf(elem), Value::SequenceOf(items)) => {
            encode_list(writer, ty, elem, per, items.as_slice())?;
        }
        (TypeKind::SetOf(elem), Value::SetOf(items)) => {
            encode_list(writer, ty, elem, per, items.as_slice())?;
        }
        (TypeKind::Choice(spec), Value::Choice(idx, inner)) => {
            let alt = spec.alternatives.get(*idx).ok_or_else(|| {
                EncodeError::invalid(
                    ty.name, format!("no alternative with index {}", idx)
                )
            })?;
            let root_len = spec.root_len();
            if spec.extension.is_some() {
                writer.put_bit(*idx >= root_len);
            }
            if *idx < root_len {
                let order = canonical_order(spec.root());
                let pos = order.iter().position(|x| x == idx).unwrap_or(0);
                put_index(writer, pos, root_len);
                encode_member(writer, alt, inner)?;
            }
            else {
                let order = canonical_order(spec.additions());
                let pos = order.iter().position(|x| {
                    x + root_len == *idx
                }).unwrap_or(0);
                put_normally_small(writer, pos as u64);
                encode_open_type(writer, |writer| {
                    encode_member(writer, alt, inner)
                })?;
            }
        }
        _ => {
            return Err(EncodeError::invalid(
                ty.name,
                format!("{} value for {}", value.variant_name(), ty.name)
            ))
        }
    }
    Ok(())
}

/// Writes the value of a member with the member’s constraints.
fn encode_member(
    writer: &mut BitWriter, member: &Member, value: &Value
) -> Result<(), Error> {
    encode_value(writer, member.ty, &member.per_constraints(), value)
}


//------------ Strings -------------------------------------------------------

fn encode_string(
    writer: &mut BitWriter, ty: &TypeDescriptor, kind: StringKind,
    per: &PerConstraints, data: &[u8]
) -> Result<(), Error> {
    let invalid = |err: ContentError| EncodeError::invalid(ty.name, err);
    if !kind.is_known_multiplier() {
        kind.check(data).map_err(invalid)?;
        // Size constraints on UTF8String count characters and aren’t
        // visible to PER.
        let size = match kind {
            StringKind::Octet => per.size,
            _ => Range::unconstrained(),
        };
        return put_sized(writer, ty, &size, data.len(), |writer, range| {
            writer.put_octets(&data[range]);
            Ok(())
        })
    }
    let chars = kind.decode_chars(data).map_err(invalid)?;
    if let Some(ch) = chars.iter().find(|&&ch| !per.permits_char(ch)) {
        return Err(EncodeError::invalid(
            ty.name,
            ContentError::with_reason_boxed(
                Reason::Constraint,
                Box::new(format!("character 0x{:X} not permitted", ch))
            )
        ))
    }
    let coding = CharCoding::new(kind, per);
    put_sized(writer, ty, &per.size, chars.len(), |writer, range| {
        for &ch in &chars[range] {
            coding.put_char(writer, ch).map_err(invalid)?;
        }
        Ok(())
    })
}


//------------ Constructed Values --------------------------------------------

fn encode_sequence(
    writer: &mut BitWriter, ty: &TypeDescriptor, spec: &SequenceSpec,
    slots: &[Option<Value>]
) -> Result<(), Error> {
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
    let present = |idx: usize| {
        let member = spec.members.get(idx)?;
        slots.get(idx)?.as_ref().filter(|value| !member.is_default(value))
    };
    let order = root_order(ty, spec);
    let has_additions = (root_len..slots.len()).any(|idx| {
        present(idx).is_some()
    });

    if spec.extension.is_some() {
        writer.put_bit(has_additions);
    }
    for &idx in &order {
        if spec.members[idx].is_optional() {
            writer.put_bit(present(idx).is_some());
        }
    }
    for &idx in &order {
        let member = &spec.members[idx];
        match present(idx) {
            Some(value) => encode_member(writer, member, value)?,
            None if member.is_optional() => { }
            None => {
                return Err(EncodeError::invalid(
                    ty.name, format!("missing member {}", member.name)
                ))
            }
        }
    }
    if !has_additions {
        return Ok(())
    }

    let additions = spec.additions();
    put_small_length(writer, additions.len());
    for idx in root_len..slots.len() {
        writer.put_bit(present(idx).is_some());
    }
    for (idx, member) in additions.iter().enumerate() {
        if let Some(value) = present(root_len + idx) {
            encode_open_type(writer, |writer| {
                encode_member(writer, member, value)
            })?;
        }
    }
    Ok(())
}

/// Returns the indexes of the root members in the order they are encoded.
///
/// The members of a SEQUENCE are encoded in order of definition, those of
/// a SET in the canonical order of their tags.
pub fn root_order(ty: &TypeDescriptor, spec: &SequenceSpec) -> Vec<usize> {
    match ty.kind {
        TypeKind::Set(_) => canonical_order(spec.root()),
        _ => (0..spec.root_len()).collect()
    }
}

fn encode_list(
    writer: &mut BitWriter, ty: &TypeDescriptor, elem: &Member,
    per: &PerConstraints, items: &[Value]
) -> Result<(), Error> {
    let elem_per = elem.per_constraints();
    put_sized(writer, ty, &per.size, items.len(), |writer, range| {
        for item in &items[range] {
            encode_value(writer, elem.ty, &elem_per, item)?;
        }
        Ok(())
    })
}


//------------ put_sized -----------------------------------------------------

/// Writes a count of units followed by the units.
///
/// If the size range has a small upper bound, the count is written as a
/// fixed-width number. Otherwise, length determinants are used and the
/// units may be split into fragments.
fn put_sized<F>(
    writer: &mut BitWriter, ty: &TypeDescriptor, size: &Range, count: usize,
    mut emit: F
) -> Result<(), Error>
where F: FnMut(&mut BitWriter, ops::Range<usize>) -> Result<(), Error> {
    let in_root = size.contains_size(count);
    if size.extensible {
        writer.put_bit(!in_root);
    }
    else if !in_root {
        return Err(EncodeError::invalid(
            ty.name,
            ContentError::with_reason_boxed(
                Reason::Constraint,
                Box::new(format!("size {} out of range {}", count, size))
            )
        ))
    }
    match size.effective_bits {
        Some(bits) if in_root => {
            let offset = count as u64 - size.lower as u64;
            writer.put_bits(offset, bits);
            emit(writer, 0..count)
        }
        _ => put_fragmented(writer, count, emit)
    }
}
