//! Length determinants and whole numbers.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::ops;
use crate::constraints::{Range, RangeKind};
use crate::decode::{ContentError, Reason};
use crate::int::Integer;
use super::bits::{BitCursor, BitWriter};


//------------ Constants -----------------------------------------------------

/// The number of units in a fragment of a length determined encoding.
pub const FRAGMENT: usize = 16384;

/// The largest number of fragments announced by a single length octet.
const MAX_FRAGMENTS: usize = 4;


//------------ Length Determinants -------------------------------------------

/// Writes a length determinant for `len` units.
///
/// Returns the number of units that may follow the determinant. If this is
/// less than `len`, the determinant announced fragments and another
/// determinant must follow them. This is the case whenever the returned
/// count is at least [`FRAGMENT`].
pub fn put_length(writer: &mut BitWriter, len: usize) -> usize {
    if len < 0x80 {
        writer.put_bits(len as u64, 8);
        len
    }
    else if len < FRAGMENT {
        writer.put_bits(0x8000 | len as u64, 16);
        len
    }
    else {
        let count = (len / FRAGMENT).min(MAX_FRAGMENTS);
        writer.put_bits(0xC0 | count as u64, 8);
        count * FRAGMENT
    }
}

/// Reads a length determinant.
///
/// Returns the number of units following and whether another determinant
/// will follow those units.
pub fn get_length(
    cursor: &mut BitCursor
) -> Result<(usize, bool), ContentError> {
    let first = cursor.get_bits(8)? as usize;
    if first & 0x80 == 0 {
        Ok((first, false))
    }
    else if first & 0x40 == 0 {
        let second = cursor.get_bits(8)? as usize;
        Ok((((first & 0x3F) << 8) | second, false))
    }
    else {
        let count = first & 0x3F;
        if count == 0 || count > MAX_FRAGMENTS {
            return Err(ContentError::from_static(
                "invalid fragment count in length determinant"
            ))
        }
        Ok((count * FRAGMENT, true))
    }
}

/// Writes `total` units with length determinants, fragmenting if needed.
///
/// The closure is called for each run of units that follows a determinant
/// with the range of the units to write.
pub fn put_fragmented<E, F>(
    writer: &mut BitWriter, total: usize, mut emit: F
) -> Result<(), E>
where F: FnMut(&mut BitWriter, ops::Range<usize>) -> Result<(), E> {
    let mut start = 0;
    loop {
        let count = put_length(writer, total - start);
        emit(writer, start..start + count)?;
        start += count;
        if count < FRAGMENT {
            return Ok(())
        }
    }
}

/// Reads units preceded by length determinants, following fragments.
///
/// The closure is called with the number of units following each
/// determinant. Returns the total number of units. If this would exceed
/// `max`, an error is returned.
pub fn get_fragmented<'a, F>(
    cursor: &mut BitCursor<'a>, max: usize, mut take: F
) -> Result<usize, ContentError>
where F: FnMut(&mut BitCursor<'a>, usize) -> Result<(), ContentError> {
    let mut total = 0usize;
    loop {
        let (count, more) = get_length(cursor)?;
        total = total.saturating_add(count);
        if total > max {
            return Err(ContentError::with_reason(
                Reason::Overflow, "value exceeds maximum size"
            ))
        }
        take(cursor, count)?;
        if !more {
            return Ok(total)
        }
    }
}

/// Writes octets preceded by their length.
pub fn put_octets_with_length(writer: &mut BitWriter, data: &[u8]) {
    let mut start = 0;
    loop {
        let count = put_length(writer, data.len() - start);
        writer.put_octets(&data[start..start + count]);
        start += count;
        if count < FRAGMENT {
            return
        }
    }
}

/// Reads octets preceded by their length.
pub fn get_octets_with_length(
    cursor: &mut BitCursor, max: usize
) -> Result<Vec<u8>, ContentError> {
    let mut res = Vec::new();
    get_fragmented(cursor, max, |cursor, count| {
        res.extend_from_slice(&cursor.get_octets(count)?);
        Ok(())
    })?;
    Ok(res)
}


//------------ Normally Small Numbers ----------------------------------------

/// Writes a normally small non-negative whole number.
pub fn put_normally_small(writer: &mut BitWriter, value: u64) {
    if value < 64 {
        writer.put_bit(false);
        writer.put_bits(value, 6);
    }
    else {
        writer.put_bit(true);
        put_octets_with_length(writer, &unsigned_octets(value));
    }
}

/// Reads a normally small non-negative whole number.
pub fn get_normally_small(cursor: &mut BitCursor) -> Result<u64, ContentError> {
    if !cursor.get_bit()? {
        return cursor.get_bits(6)
    }
    let octets = get_octets_with_length(cursor, 8)?;
    octets_to_u64(&octets)
}

/// Writes a normally small length, i.e., a count of at least one.
pub fn put_small_length(writer: &mut BitWriter, len: usize) {
    if (1..=64).contains(&len) {
        writer.put_bit(false);
        writer.put_bits(len as u64 - 1, 6);
    }
    else {
        writer.put_bit(true);
        let count = put_length(writer, len);
        debug_assert_eq!(count, len);
    }
}

/// Reads a normally small length.
pub fn get_small_length(cursor: &mut BitCursor) -> Result<usize, ContentError> {
    if !cursor.get_bit()? {
        return Ok(cursor.get_bits(6)? as usize + 1)
    }
    match get_length(cursor)? {
        (len, false) if len > 0 => Ok(len),
        _ => Err(ContentError::from_static("invalid normally small length"))
    }
}


//------------ Whole Numbers -------------------------------------------------

/// Writes an integer with the given value range.
///
/// A value outside a non-extensible range is an error with reason
/// [`Reason::Constraint`].
pub fn put_integer(
    writer: &mut BitWriter, value: &Integer, range: &Range
) -> Result<(), ContentError> {
    let in_root = range.contains_integer(value);
    if range.extensible {
        writer.put_bit(!in_root);
        if !in_root {
            put_octets_with_length(writer, value.as_slice());
            return Ok(())
        }
    }
    else if !in_root {
        return Err(ContentError::with_reason_boxed(
            Reason::Constraint,
            Box::new(format!("value {} out of range {}", value, range))
        ))
    }
    match range.kind {
        RangeKind::Constrained => {
            let offset = offset_u64(value, range.lower)?;
            writer.put_bits(offset, range.range_bits.unwrap_or(0));
        }
        RangeKind::SemiConstrained => {
            let offset = value.offset_from(range.lower).ok_or(
                "value below lower bound"
            )?;
            put_octets_with_length(writer, &offset);
        }
        RangeKind::Unconstrained => {
            put_octets_with_length(writer, value.as_slice());
        }
    }
    Ok(())
}

/// Reads an integer with the given value range.
pub fn get_integer(
    cursor: &mut BitCursor, range: &Range
) -> Result<Integer, ContentError> {
    if range.extensible && cursor.get_bit()? {
        return Integer::from_slice(&get_octets_with_length(cursor, 1024)?)
    }
    match range.kind {
        RangeKind::Constrained => {
            let offset = cursor.get_bits(range.range_bits.unwrap_or(0))?;
            let res = Integer::from_offset(&offset.to_be_bytes(), range.lower);
            if !range.contains_integer(&res) {
                return Err(ContentError::with_reason_boxed(
                    Reason::Constraint,
                    Box::new(format!("value {} out of range {}", res, range))
                ))
            }
            Ok(res)
        }
        RangeKind::SemiConstrained => {
            let octets = get_octets_with_length(cursor, 1024)?;
            if octets.is_empty() {
                return Err(ContentError::from_static("empty integer"))
            }
            Ok(Integer::from_offset(&octets, range.lower))
        }
        RangeKind::Unconstrained => {
            Integer::from_slice(&get_octets_with_length(cursor, 1024)?)
        }
    }
}

/// Writes a number constrained to `0..count`.
pub fn put_index(writer: &mut BitWriter, index: usize, count: usize) {
    writer.put_bits(index as u64, index_bits(count))
}

/// Reads a number constrained to `0..count`.
pub fn get_index(
    cursor: &mut BitCursor, count: usize
) -> Result<usize, ContentError> {
    let res = cursor.get_bits(index_bits(count))? as usize;
    if res >= count {
        return Err(ContentError::from_static("index out of range"))
    }
    Ok(res)
}

/// Returns the number of bits for a number constrained to `0..count`.
pub fn index_bits(count: usize) -> u32 {
    bits_for(count.saturating_sub(1) as u64)
}

/// Returns the number of bits needed for values up to `max`.
pub fn bits_for(max: u64) -> u32 {
    u64::BITS - max.leading_zeros()
}


//------------ Helpers -------------------------------------------------------

/// Returns the offset of a value from a lower bound as a `u64`.
fn offset_u64(value: &Integer, lower: i64) -> Result<u64, ContentError> {
    let offset = value.offset_from(lower).ok_or("value below lower bound")?;
    octets_to_u64(&offset)
}

/// Converts unsigned big-endian octets into a `u64`.
fn octets_to_u64(octets: &[u8]) -> Result<u64, ContentError> {
    let octets = match octets.iter().position(|&x| x != 0) {
        Some(start) => &octets[start..],
        None => return Ok(0)
    };
    if octets.len() > 8 {
        return Err(ContentError::with_reason(
            Reason::Overflow, "number too large"
        ))
    }
    Ok(octets.iter().fold(0, |acc, &x| (acc << 8) | u64::from(x)))
}

/// Returns the minimal unsigned big-endian octets of a value.
fn unsigned_octets(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&x| x != 0).unwrap_or(7);
    bytes[start..].to_vec()
}


//============ Tests =========================================================
