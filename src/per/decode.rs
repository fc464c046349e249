//! The PER decoder.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::mem;
use crate::constraints::{PerConstraints, Range};
use crate::decode::{ContentError, Options, Reason};
use crate::descriptor::{Member, SequenceSpec, TypeDescriptor, TypeKind};
use crate::containers::{SequenceOf, SetOf};
use crate::oid::Oid;
use crate::string::{BitString, OctetString, StringKind};
use crate::value::Value;
use super::bits::{BitCursor, BitWriter};
use super::canonical_order;
use super::chars::CharCoding;
use super::encode::root_order;
use super::number::{
    get_fragmented, get_index, get_integer, get_normally_small,
    get_octets_with_length, get_small_length,
};
use super::open::decode_open_type;


//------------ ValueDecoder --------------------------------------------------

/// Decodes values while keeping track of nesting.
pub struct ValueDecoder {
    /// The limits to apply.
    options: Options,

    /// The number of constructed values currently being decoded.
    depth: usize,

    /// The octets taken up by list items decoded so far.
    ///
    /// Items of some types take no bits at all, so the input doesn’t bound
    /// the number of items. This is charged against the maximum size.
    allocated: usize,
}

impl ValueDecoder {
    pub fn new(options: Options) -> Self {
        ValueDecoder { options, depth: 0, allocated: 0 }
    }

    /// Reads a value of the given type with the given constraints.
    pub fn decode_value(
        &mut self, cursor: &mut BitCursor, ty: &'static TypeDescriptor,
        per: &PerConstraints,
    ) -> Result<Value, ContentError> {
        match ty.kind {
            TypeKind::Boolean => Ok(Value::Boolean(cursor.get_bit()?)),
            TypeKind::Null => Ok(Value::Null),
            TypeKind::Integer => {
                get_integer(cursor, &per.value).map(Value::Integer)
            }
            TypeKind::Enumerated(spec) => {
                let extended = spec.extensible && cursor.get_bit()?;
                let idx = if extended {
                    let idx = get_normally_small(cursor)?;
                    usize::try_from(idx).ok().and_then(|idx| {
                        idx.checked_add(spec.root_count)
                    }).unwrap_or(usize::MAX)
                }
                else {
                    get_index(cursor, spec.root_count)?
                };
                spec.index_to_value(idx).map(Value::Enumerated).ok_or_else(|| {
                    ContentError::with_reason(
                        Reason::Unsupported, "unknown enumeration extension"
                    )
                })
            }
            TypeKind::OctetString(kind) => {
                self.decode_string(cursor, kind, per)
            }
            TypeKind::BitString => {
                let mut bits = BitWriter::new();
                let len = self.get_sized(
                    cursor, &per.size, |cursor, count| {
                        for _ in 0..count {
                            bits.put_bit(cursor.get_bit()?);
                        }
                        Ok(())
                    }
                )?;
                let unused = ((8 - len % 8) % 8) as u8;
                BitString::from_slice(
                    unused, &bits.into_octets()
                ).map(Value::BitString)
            }
            TypeKind::ObjectIdentifier => {
                let octets = get_octets_with_length(
                    cursor, self.options.max_size
                )?;
                Oid::from_content(octets.into()).map(Value::Oid)
            }
            TypeKind::Sequence(spec) | TypeKind::Set(spec) => {
                self.enter()?;
                let res = self.decode_sequence(cursor, ty, spec);
                self.depth -= 1;
                res
            }
            TypeKind::SequenceOf(elem) => {
                self.enter()?;
                let res = self.decode_list(cursor, elem, per);
                self.depth -= 1;
                res.map(|items| {
                    Value::SequenceOf(SequenceOf::from(items))
                })
            }
            TypeKind::SetOf(elem) => {
                self.enter()?;
                let res = self.decode_list(cursor, elem, per);
                self.depth -= 1;
                res.map(|items| Value::SetOf(SetOf::from(items)))
            }
            TypeKind::Choice(_) => {
                self.enter()?;
                let res = self.decode_choice(cursor, ty);
                self.depth -= 1;
                res
            }
        }
    }

    fn decode_member(
        &mut self, cursor: &mut BitCursor, member: &'static Member
    ) -> Result<Value, ContentError> {
        self.decode_value(cursor, member.ty, &member.per_constraints())
    }

    fn enter(&mut self) -> Result<(), ContentError> {
        if self.depth >= self.options.max_depth {
            return Err(ContentError::with_reason(
                Reason::Overflow, "maximum nesting depth exceeded"
            ))
        }
        self.depth += 1;
        Ok(())
    }


    //--- Strings

    fn decode_string(
        &mut self, cursor: &mut BitCursor, kind: StringKind,
        per: &PerConstraints,
    ) -> Result<Value, ContentError> {
        let mut data = Vec::new();
        if !kind.is_known_multiplier() {
            let size = match kind {
                StringKind::Octet => per.size,
                _ => Range::unconstrained(),
            };
            self.get_sized(cursor, &size, |cursor, count| {
                data.extend_from_slice(&cursor.get_octets(count)?);
                Ok(())
            })?;
            kind.check(&data)?;
            return Ok(Value::OctetString(OctetString::from(data)))
        }
        let coding = CharCoding::new(kind, per);
        self.get_sized(cursor, &per.size, |cursor, count| {
            for _ in 0..count {
                let ch = coding.get_char(cursor)?;
                if !per.permits_char(ch) {
                    return Err(ContentError::with_reason_boxed(
                        Reason::Constraint,
                        Box::new(format!(
                            "character 0x{:X} not permitted", ch
                        ))
                    ))
                }
                kind.push_char(ch, &mut data)?;
            }
            Ok(())
        })?;
        Ok(Value::OctetString(OctetString::from(data)))
    }


    //--- Constructed Values

    fn decode_sequence(
        &mut self, cursor: &mut BitCursor, ty: &'static TypeDescriptor,
        spec: &'static SequenceSpec,
    ) -> Result<Value, ContentError> {
        let members: &'static [Member] = spec.members;
        let extended = spec.extension.is_some() && cursor.get_bit()?;
        let order = root_order(ty, spec);

        let mut present = Vec::with_capacity(order.len());
        for &idx in &order {
            let optional = members.get(idx).map(Member::is_optional);
            present.push(match optional {
                Some(true) => cursor.get_bit()?,
                _ => true
            });
        }

        let mut slots: Vec<Option<Value>> = Vec::with_capacity(members.len());
        slots.resize_with(members.len(), || None);
        for (&idx, &present) in order.iter().zip(&present) {
            if !present {
                continue
            }
            if let Some(member) = members.get(idx) {
                slots[idx] = Some(self.decode_member(cursor, member)?);
            }
        }

        if extended {
            let root_len = spec.root_len();
            let count = get_small_length(cursor)?;
            let mut flags = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                flags.push(cursor.get_bit()?);
            }
            for (idx, flag) in flags.into_iter().enumerate() {
                if !flag {
                    continue
                }
                match members.get(root_len + idx) {
                    Some(member) => {
                        let max = self.options.max_size;
                        let value = decode_open_type(cursor, max, |inner| {
                            self.decode_member(inner, member)
                        })?;
                        slots[root_len + idx] = Some(value);
                    }
                    None => {
                        // Unknown addition: skip the open type.
                        get_octets_with_length(
                            cursor, self.options.max_size
                        )?;
                    }
                }
            }
        }

        for (member, slot) in members.iter().zip(slots.iter_mut()) {
            if slot.is_none() {
                if let Some(default) = member.default {
                    *slot = Some(default());
                }
            }
        }
        Ok(Value::Sequence(slots))
    }

    fn decode_list(
        &mut self, cursor: &mut BitCursor, elem: &'static Member,
        per: &PerConstraints,
    ) -> Result<Vec<Value>, ContentError> {
        let elem_per = elem.per_constraints();
        let mut items = Vec::new();
        get_sized(cursor, &per.size, self.options.max_size, |cursor, count| {
            for _ in 0..count {
                self.allocated = self.allocated.saturating_add(
                    mem::size_of::<Value>()
                );
                if self.allocated > self.options.max_size {
                    return Err(ContentError::with_reason(
                        Reason::Overflow, "too many list items"
                    ))
                }
                items.push(self.decode_value(cursor, elem.ty, &elem_per)?);
            }
            Ok(())
        })?;
        Ok(items)
    }

    fn decode_choice(
        &mut self, cursor: &mut BitCursor, ty: &'static TypeDescriptor,
    ) -> Result<Value, ContentError> {
        let spec = match ty.kind {
            TypeKind::Choice(spec) => spec,
            _ => return Err(ContentError::from_static("not a CHOICE"))
        };
        let root_len = spec.root_len();
        let extended = spec.extension.is_some() && cursor.get_bit()?;
        if !extended {
            let pos = get_index(cursor, root_len)?;
            let idx = canonical_order(spec.root()).get(pos).copied();
            let alt = idx.and_then(|idx| spec.root().get(idx));
            let (idx, alt) = match (idx, alt) {
                (Some(idx), Some(alt)) => (idx, alt),
                _ => {
                    return Err(ContentError::from_static(
                        "invalid CHOICE index"
                    ))
                }
            };
            return Ok(Value::choice(idx, self.decode_member(cursor, alt)?))
        }
        let pos = get_normally_small(cursor)?;
        let additions = spec.additions();
        let idx = usize::try_from(pos).ok().and_then(|pos| {
            canonical_order(additions).get(pos).copied()
        });
        match idx.and_then(|idx| additions.get(idx).map(|alt| (idx, alt))) {
            Some((idx, alt)) => {
                let max = self.options.max_size;
                let value = decode_open_type(cursor, max, |inner| {
                    self.decode_member(inner, alt)
                })?;
                Ok(Value::choice(root_len + idx, value))
            }
            None => {
                Err(ContentError::with_reason(
                    Reason::Unsupported, "unknown CHOICE extension"
                ))
            }
        }
    }


    //--- Sizes

    fn get_sized<'a, F>(
        &self, cursor: &mut BitCursor<'a>, size: &Range, take: F
    ) -> Result<usize, ContentError>
    where F: FnMut(&mut BitCursor<'a>, usize) -> Result<(), ContentError> {
        get_sized(cursor, size, self.options.max_size, take)
    }
}


//------------ get_sized -----------------------------------------------------

/// Reads a count of units and the units themselves.
///
/// This is the reverse of the encoder’s `put_sized`. Returns the number of
/// units read.
fn get_sized<'a, F>(
    cursor: &mut BitCursor<'a>, size: &Range, max: usize, mut take: F
) -> Result<usize, ContentError>
where F: FnMut(&mut BitCursor<'a>, usize) -> Result<(), ContentError> {
    let extended = size.extensible && cursor.get_bit()?;
    let count = match size.effective_bits {
        Some(bits) if !extended => {
            let offset = cursor.get_bits(bits)?;
            let count = usize::try_from(offset).ok().and_then(|offset| {
                offset.checked_add(size.lower as usize)
            }).ok_or_else(|| ContentError::from_static("invalid size"))?;
            if count > max {
                return Err(ContentError::with_reason(
                    Reason::Overflow, "value exceeds maximum size"
                ))
            }
            take(cursor, count)?;
            count
        }
        _ => get_fragmented(cursor, max, take)?
    };
    if !extended && !size.contains_size(count) {
        return Err(ContentError::with_reason_boxed(
            Reason::Constraint,
            Box::new(format!("size {} out of range {}", count, size))
        ))
    }
    Ok(count)
}
