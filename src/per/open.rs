//! Open types.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use bytes::Bytes;
use crate::decode::{ContentError, Reason};
use super::bits::{BitCursor, BitWriter, Refill};
use super::number::{get_length, put_octets_with_length};


//------------ encode_open_type ----------------------------------------------

/// Writes an open type.
///
/// The closure writes the inner value into a writer of its own. The
/// resulting bits are padded to full octets and written as an octet string
/// with a length determinant. An empty inner encoding becomes a single zero
/// octet.
pub fn encode_open_type<E, F>(writer: &mut BitWriter, op: F) -> Result<(), E>
where F: FnOnce(&mut BitWriter) -> Result<(), E> {
    let mut inner = BitWriter::new();
    op(&mut inner)?;
    let octets = if inner.is_empty() {
        vec![0]
    }
    else {
        inner.into_octets()
    };
    put_octets_with_length(writer, &octets);
    Ok(())
}


//------------ decode_open_type ----------------------------------------------

/// Reads an open type.
///
/// The closure is given a cursor that ends where the open type ends. If
/// the inner decoder tries to read beyond that point, the open type is
/// malformed. [`Reason::Incomplete`] is only returned if the outer data
/// ends before the open type does. The inner cursor follows fragments on its own, so
/// the closure never sees the length determinants.
///
/// After the closure returns, the bits it left unread are checked. At most
/// seven bits of padding are allowed, unless the inner value took no bits
/// at all and the encoding is the single zero octet. More padding results
/// in an error with reason [`Reason::TooLargePadding`]. Padding bits that
/// aren’t zero result in [`Reason::NonZeroPadding`].
pub fn decode_open_type<T, F>(
    cursor: &mut BitCursor, max: usize, op: F
) -> Result<T, ContentError>
where F: FnOnce(&mut BitCursor) -> Result<T, ContentError> {
    let (count, more) = get_length(cursor)?;
    if count > max {
        return Err(ContentError::with_reason(
            Reason::Overflow, "open type exceeds maximum size"
        ))
    }
    let first = Bytes::from(cursor.get_octets(count)?);
    let mut refill = FragmentRefill {
        cursor, more, total: count, max, starved: false
    };
    let res = {
        let mut inner = BitCursor::with_refill(first, &mut refill);
        op(&mut inner).and_then(|res| {
            check_padding(&mut inner)?;
            Ok(res)
        })
    };
    let res = match res {
        // The inner value ran past the end of the open type. More data
        // won’t fix that.
        Err(err) if err.reason() == Reason::Incomplete && !refill.starved => {
            return Err(ContentError::from_static(
                "open type content overruns its length"
            ))
        }
        res => res?
    };
    // Any fragments the inner decoder didn’t ask for must be empty.
    while let Some(chunk) = refill.refill()? {
        if !chunk.is_empty() {
            return Err(ContentError::with_reason(
                Reason::TooLargePadding, "unread data in open type"
            ))
        }
    }
    Ok(res)
}

/// Checks the bits the inner decoder left unread.
fn check_padding(inner: &mut BitCursor) -> Result<(), ContentError> {
    let leftover = inner.remaining();
    let empty_value = inner.pos() == 0 && leftover == 8;
    if leftover > 7 && !empty_value {
        return Err(ContentError::with_reason(
            Reason::TooLargePadding, "too large padding in open type"
        ))
    }
    if inner.get_bits(leftover as u32)? != 0 {
        return Err(ContentError::with_reason(
            Reason::NonZeroPadding, "non-zero padding in open type"
        ))
    }
    Ok(())
}


//------------ FragmentRefill ------------------------------------------------

/// Provides the fragments of an open type to an inner cursor.
struct FragmentRefill<'c, 'a> {
    /// The outer cursor positioned after the current fragment.
    cursor: &'c mut BitCursor<'a>,

    /// Whether another length determinant follows.
    more: bool,

    /// The number of octets read so far.
    total: usize,

    /// The maximum number of octets.
    max: usize,

    /// Whether the outer data ended before the next fragment.
    starved: bool,
}

impl FragmentRefill<'_, '_> {
    fn next_fragment(&mut self) -> Result<Bytes, ContentError> {
        let (count, more) = get_length(self.cursor)?;
        self.total = self.total.saturating_add(count);
        if self.total > self.max {
            return Err(ContentError::with_reason(
                Reason::Overflow, "open type exceeds maximum size"
            ))
        }
        self.more = more;
        Ok(Bytes::from(self.cursor.get_octets(count)?))
    }
}

impl Refill for FragmentRefill<'_, '_> {
    fn refill(&mut self) -> Result<Option<Bytes>, ContentError> {
        if !self.more {
            return Ok(None)
        }
        let res = self.next_fragment();
        if let Err(ref err) = res {
            if err.reason() == Reason::Incomplete {
                self.starved = true
            }
        }
        res.map(Some)
    }
}


//============ Tests =========================================================
