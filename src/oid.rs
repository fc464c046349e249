//! ASN.1 Object Identifiers.
//!
//! This module contains the [`Oid`] type that implements object identifiers,
//! a construct used by ANS.1 to uniquely identify all sorts of things. The
//! type is also re-exported at the top-level.

use std::{fmt, str};
use bytes::Bytes;
use crate::decode::{ContentError, Reason};
use crate::int::Integer;


//------------ Oid -----------------------------------------------------------

/// An object identifer.
///
/// Object identifiers are globally unique, hierarchical values that are used
/// to identify objects or their type. When written, they are presented as a
/// sequence of integers separated by dots such as ‘1.3.6.1.5.5.7.1’ or with
/// the integers separated by white space and enclosed in curly braces such
/// as ‘{ 1 3 6 1 5 5 7 1 }’. The integers are called arcs.
///
/// Values of this type keep a single object identifer in its BER encoding.
/// The first two arcs are folded into a single subidentifier with the value
/// `40 * first + second`. Each subidentifier is encoded in base 128 with the
/// most significant bit of each octet set for all octets but the last.
///
/// The crate ships with a `mkoid` binary which accepts object identifiers
/// in ‘dot integer’ notation and produces the `u8` array for their encoded
/// value.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Oid(Bytes);

impl Oid {
    /// Creates an object identifier from its encoded octets.
    ///
    /// The octets must be a non-empty sequence of subidentifiers each in
    /// their shortest form.
    pub fn from_content(data: Bytes) -> Result<Self, ContentError> {
        Self::check_content(&data)?;
        Ok(Oid(data))
    }

    /// Checks that a slice is a correctly encoded object identifier.
    pub fn check_content(data: &[u8]) -> Result<(), ContentError> {
        match data.last() {
            None => {
                return Err(ContentError::from_static(
                    "empty object identifier"
                ))
            }
            Some(last) if last & 0x80 != 0 => {
                return Err(ContentError::from_static(
                    "truncated object identifier"
                ))
            }
            _ => { }
        }
        let mut start = true;
        for &octet in data {
            if start && octet == 0x80 {
                return Err(ContentError::from_static(
                    "subidentifier with leading zero octet"
                ))
            }
            start = octet & 0x80 == 0;
        }
        Ok(())
    }

    /// Creates an object identifier from a sequence of arcs.
    ///
    /// There must be at least two arcs. The first must be 0, 1, or 2 and,
    /// unless the first is 2, the second must be less than 40.
    pub fn from_arcs(arcs: &[u64]) -> Result<Self, ContentError> {
        let (first, second, rest) = match arcs {
            [first, second, rest @ ..] => (*first, *second, rest),
            _ => {
                return Err(ContentError::from_static(
                    "object identifier needs at least two arcs"
                ))
            }
        };
        if first > 2 || (first < 2 && second >= 40) {
            return Err(ContentError::from_static(
                "invalid leading arcs in object identifier"
            ))
        }
        let folded = (first * 40).checked_add(second).ok_or_else(|| {
            ContentError::with_reason(
                Reason::Overflow, "object identifier arc too large"
            )
        })?;
        let mut res = Vec::new();
        push_subidentifier(&mut res, folded);
        for &arc in rest {
            push_subidentifier(&mut res, arc);
        }
        Ok(Oid(res.into()))
    }

    /// Returns the encoded octets.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns the encoded octets as a bytes value.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Returns the arcs of the object identifier.
    ///
    /// Fails with an overflow error if any arc doesn’t fit a `u64`.
    pub fn arcs(&self) -> Result<Vec<u64>, ContentError> {
        self.iter().map(Component::to_u64).collect::<Option<_>>().ok_or_else(
            || ContentError::with_reason(
                Reason::Overflow, "object identifier arc too large"
            )
        )
    }

    /// Returns an iterator to the components of this object identifiers.
    pub fn iter(&self) -> Iter {
        Iter::new(self.0.as_ref())
    }
}

/// Appends a subidentifier in base 128.
fn push_subidentifier(target: &mut Vec<u8>, value: u64) {
    let groups = (64 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let mut octet = ((value >> (7 * i)) & 0x7F) as u8;
        if i != 0 {
            octet |= 0x80;
        }
        target.push(octet);
    }
}


//--- AsRef

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}


//--- FromStr and Display

impl str::FromStr for Oid {
    type Err = ContentError;

    /// Parses an object identifier in ‘dot integer’ notation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s.split('.').map(|arc| {
            arc.parse::<u64>().map_err(|_| {
                ContentError::from_static("invalid arc in object identifier")
            })
        }).collect::<Result<Vec<_>, _>>()?;
        Self::from_arcs(&arcs)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for component in self.iter() {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            match component.to_u64() {
                Some(value) => write!(f, "{}", value)?,
                None => write!(f, "{}", component.to_integer())?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}


//------------ Component -----------------------------------------------------

/// A component of an object identifier.
///
/// Although these components are integers, they are encoded in a slightly
/// inconvenient way. Because of this we don’t convert them to native integers
/// but rather keep them as references to the underlying octets.
///
/// The method `to_u64` tries to convert a component to a native integer
/// while `to_integer` works for components of any size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Component<'a> {
    /// The position of the component in the object identifer.
    position: Position,

    /// The octets of the subidentifer.
    ///
    /// The most significant bit of each octet indicates whether there are
    /// more octets to follow, the lower seven bits are then shifted
    /// accordingly to make up an unsigned integer in big endian notation.
    slice: &'a [u8],
}

/// The position of the component in the object identifier.
///
/// As the first two components of the object identifer are encoded in the
/// first subidentifier of the encoded value, we have three different cases.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Position {
    /// This is the first component of the identifier.
    ///
    /// This is 0 if the integer value of the subidentifer is 0..39,
    /// 1 for 40..79, and 2 for anything else.
    First,

    /// This is the second component of the identifier.
    ///
    /// This is the integer value of the subidentifer module 40 if the value
    /// is below 80 and otherwise the value minus 80.
    Second,

    /// This is any later component of the identifier.
    Other,
}

impl<'a> Component<'a> {
    fn new(slice: &'a [u8], position: Position) -> Self {
        Component { slice, position }
    }

    /// Returns the integer value of the subidentifier if it fits a `u64`.
    fn subidentifier(self) -> Option<u64> {
        let mut res = 0u64;
        for &ch in self.slice {
            if res > (u64::MAX >> 7) {
                return None
            }
            res = (res << 7) | u64::from(ch & 0x7F);
        }
        Some(res)
    }

    /// Attempts to convert the component to `u64`.
    ///
    /// Since the component’s value can be larger than the maximum value of
    /// a `u64`, this may fail in which case the method will return `None`.
    pub fn to_u64(self) -> Option<u64> {
        match self.position {
            Position::First => {
                // A subidentifier too large for a u64 still starts with 2.
                match self.subidentifier() {
                    Some(res) if res < 40 => Some(0),
                    Some(res) if res < 80 => Some(1),
                    _ => Some(2)
                }
            }
            Position::Second => {
                let res = self.subidentifier()?;
                if res < 80 {
                    Some(res % 40)
                }
                else {
                    Some(res - 80)
                }
            }
            Position::Other => self.subidentifier()
        }
    }

    /// Converts the component into an integer of arbitrary size.
    pub fn to_integer(self) -> Integer {
        if let Some(value) = self.to_u64() {
            return Integer::from(value)
        }
        let mut res = Vec::new();
        let mut acc = 0u32;
        let mut bits = 0;
        for &octet in self.slice.iter().rev() {
            acc |= u32::from(octet & 0x7F) << bits;
            bits += 7;
            while bits >= 8 {
                res.push(acc as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
        if bits > 0 {
            res.push(acc as u8);
        }
        res.reverse();
        let value = Integer::from_unsigned_slice(&res);
        match self.position {
            // Only reachable for values of 80 and more.
            Position::Second => {
                value.offset_from(80).map(|offset| {
                    Integer::from_unsigned_slice(&offset)
                }).unwrap_or(value)
            }
            _ => value
        }
    }
}


//------------ Iter ----------------------------------------------------------

/// An iterator over the sub-identifiers in an object identifier.
pub struct Iter<'a> {
    /// The remainder of the object identifier’s encoded octets.
    slice: &'a [u8],

    /// The position of the next component.
    position: Position,

    /// The first subidentifier which still needs to produce the second arc.
    first: Option<&'a [u8]>,
}

impl<'a> Iter<'a> {
    fn new(slice: &'a [u8]) -> Self {
        Iter { slice, position: Position::First, first: None }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(first) = self.first.take() {
            self.position = Position::Other;
            return Some(Component::new(first, Position::Second))
        }
        if self.slice.is_empty() {
            return None
        }
        // A trailing octet with bit 8 set is rejected by `check_content`,
        // so a missing end takes the rest.
        let end = self.slice.iter().position(|x| x & 0x80 == 0).map(|i| {
            i + 1
        }).unwrap_or(self.slice.len());
        let (res, tail) = self.slice.split_at(end);
        self.slice = tail;
        if self.position == Position::First {
            self.first = Some(res);
        }
        Some(Component::new(res, self.position))
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rsa_arcs() {
        let oid = Oid::from_arcs(&[1, 2, 840, 113549]).unwrap();
        assert_eq!(oid.as_slice(), b"\x2a\x86\x48\x86\xf7\x0d");
        assert_eq!(oid.arcs().unwrap(), [1, 2, 840, 113549]);
        assert_eq!(oid.to_string(), "1.2.840.113549");
        assert_eq!("1.2.840.113549".parse::<Oid>().unwrap(), oid);
    }

    #[test]
    fn first_arc_folding() {
        for (subid, arcs) in [
            (0u8, [0u64, 0u64]),
            (39, [0, 39]),
            (40, [1, 0]),
            (79, [1, 39]),
            (80, [2, 0]),
        ] {
            let oid = Oid::from_content(Bytes::copy_from_slice(&[subid]));
            let oid = oid.unwrap();
            assert_eq!(oid.arcs().unwrap(), arcs);
            assert_eq!(Oid::from_arcs(&arcs).unwrap(), oid);
        }
        let oid = Oid::from_arcs(&[2, 999, 3]).unwrap();
        assert_eq!(oid.as_slice(), b"\x88\x37\x03");
        assert_eq!(oid.arcs().unwrap(), [2, 999, 3]);
    }

    #[test]
    fn invalid_arcs() {
        assert!(Oid::from_arcs(&[1]).is_err());
        assert!(Oid::from_arcs(&[3, 1]).is_err());
        assert!(Oid::from_arcs(&[1, 40]).is_err());
        assert_eq!(
            Oid::from_arcs(&[2, u64::MAX]).unwrap_err().reason(),
            Reason::Overflow
        );
        assert!("1.2.x".parse::<Oid>().is_err());
        assert!("".parse::<Oid>().is_err());
    }

    #[test]
    fn check_content() {
        assert!(Oid::check_content(b"").is_err());
        assert!(Oid::check_content(b"\x2a\x86").is_err());
        assert!(Oid::check_content(b"\x2a\x80\x01").is_err());
        assert!(Oid::check_content(b"\x2a\x86\x48").is_ok());
    }

    #[test]
    fn overflowing_arc() {
        // 2.1.(2^70)
        let mut data = vec![0x51];
        data.extend_from_slice(b"\x81\x80\x80\x80\x80\x80\x80\x80\x80\x80\x00");
        let oid = Oid::from_content(data.into()).unwrap();
        assert_eq!(oid.arcs().unwrap_err().reason(), Reason::Overflow);
        assert_eq!(oid.to_string(), "2.1.1180591620717411303424");
    }
}
