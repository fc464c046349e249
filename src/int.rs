//! Arbitrary length integers.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::{cmp, fmt, str};
use bytes::Bytes;
use crate::decode::{ContentError, Reason};
use crate::mode::Mode;


//------------ Integer -------------------------------------------------------

/// An integer of arbitrary length.
///
/// As integers are variable length in ASN.1, this type is just a simple
/// wrapper atop the underlying `Bytes` value containing the big-endian,
/// two’s complement byte sequence of the integer. The wrapped sequence is
/// always in its shortest form: there is at least one octet and the first
/// nine bits of a multi-octet integer are never all the same. Because of
/// this, two integers are equal if and only if their octets are.
///
/// Conversions into Rust’s primitive integer types are provided by
/// methods such as [`to_i64`][Self::to_i64]. They fail with an overflow
/// error if the value doesn’t fit.
///
/// # BER Encoding
///
/// In BER, an INTEGER is encoded as a primitive value with the content octets
/// providing a variable-length, big-endian, two‘s complement byte sequence of
/// that integer. Thus, the most-significant bit of the first octet serves as
/// the sign bit. BER tolerates redundant leading sign octets, DER doesn’t.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Integer(Bytes);

impl Integer {
    /// Creates an integer from its two’s complement octets.
    ///
    /// Redundant leading `0x00` or `0xFF` octets are stripped while the
    /// sign is preserved. An empty slice is an error.
    pub fn from_slice(data: &[u8]) -> Result<Self, ContentError> {
        if data.is_empty() {
            return Err(ContentError::from_static("empty integer"))
        }
        Ok(Integer(Bytes::copy_from_slice(Self::trim(data))))
    }

    /// Creates an integer from its octets as found in content.
    ///
    /// In DER mode, the octets must already be in their shortest form.
    pub fn from_content(
        data: &[u8], mode: Mode
    ) -> Result<Self, ContentError> {
        if mode.is_restricted() && !Self::is_canonical(data) {
            return Err(ContentError::from_static(
                "non-minimal integer in DER"
            ))
        }
        Self::from_slice(data)
    }

    /// Creates an integer from its two’s complement octets.
    ///
    /// This is like `from_slice` but avoids copying if the octets are
    /// already in shortest form.
    pub fn from_bytes(data: Bytes) -> Result<Self, ContentError> {
        if Self::is_canonical(&data) {
            Ok(Integer(data))
        }
        else {
            Self::from_slice(&data)
        }
    }

    /// Creates an integer from unsigned big-endian octets.
    pub fn from_unsigned_slice(data: &[u8]) -> Self {
        let mut res = Vec::with_capacity(data.len() + 1);
        res.push(0);
        res.extend_from_slice(data);
        Integer(Bytes::copy_from_slice(Self::trim(&res)))
    }

    /// Returns whether the octets are a shortest form integer.
    ///
    /// Specifically, checks that there is at least one octet and that the
    /// first nine bits of a multi-octet integer are not all the same.
    pub fn is_canonical(data: &[u8]) -> bool {
        match (data.first(), data.get(1).map(|x| x & 0x80 != 0)) {
            (None, _) => false,
            (Some(0), Some(false)) => false,
            (Some(0xFF), Some(true)) => false,
            _ => true
        }
    }

    /// Returns the slice of `data` without redundant sign octets.
    fn trim(mut data: &[u8]) -> &[u8] {
        while let [first, second, ..] = data {
            if (*first == 0 && second & 0x80 == 0)
                || (*first == 0xFF && second & 0x80 != 0)
            {
                data = &data[1..];
            }
            else {
                break
            }
        }
        data
    }

    /// Returns the octets of the integer.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns the bytes value of the integer.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Returns whether the integer is negative.
    pub fn is_negative(&self) -> bool {
        self.0.first().map(|x| x & 0x80 != 0).unwrap_or(false)
    }

    /// Returns whether the integer is zero.
    pub fn is_zero(&self) -> bool {
        self.0.as_ref() == b"\0"
    }
}

/// # Conversion into Native Integers
///
impl Integer {
    /// Converts the integer into an `i128`.
    pub fn to_i128(&self) -> Result<i128, ContentError> {
        if self.0.len() > 16 {
            return Err(Self::overflow())
        }
        let mut res: i128 = if self.is_negative() { -1 } else { 0 };
        for &octet in self.0.iter() {
            res = (res << 8) | i128::from(octet);
        }
        Ok(res)
    }

    /// Converts the integer into an `i64`.
    pub fn to_i64(&self) -> Result<i64, ContentError> {
        i64::try_from(self.to_i128()?).map_err(|_| Self::overflow())
    }

    /// Converts the integer into a `u64`.
    pub fn to_u64(&self) -> Result<u64, ContentError> {
        if self.is_negative() {
            return Err(Self::overflow())
        }
        u64::try_from(self.to_i128()?).map_err(|_| Self::overflow())
    }

    fn overflow() -> ContentError {
        ContentError::with_reason(
            Reason::Overflow, "integer does not fit native type"
        )
    }

    /// Compares the integer with a native integer.
    pub fn cmp_i64(&self, other: i64) -> cmp::Ordering {
        match self.to_i64() {
            Ok(value) => value.cmp(&other),
            // Too long for an i64, so the sign decides.
            Err(_) if self.is_negative() => cmp::Ordering::Less,
            Err(_) => cmp::Ordering::Greater,
        }
    }
}

/// # Offset Arithmetic
///
/// PER encodes constrained integers as their offset from the lower bound.
/// These methods convert between an integer and such an offset without
/// limiting the size of the integer.
impl Integer {
    /// Returns `self - lower` as unsigned big-endian octets.
    ///
    /// Returns `None` if `self` is less than `lower`. The result has at
    /// least one octet.
    pub fn offset_from(&self, lower: i64) -> Option<Vec<u8>> {
        let width = cmp::max(self.0.len(), 8) + 1;
        let mut res = Self::extend(&self.0, width);
        let mut neg = Self::extend(&lower.to_be_bytes(), width);
        negate(&mut neg);
        add_assign(&mut res, &neg);
        if res.first().map(|x| x & 0x80 != 0).unwrap_or(false) {
            return None
        }
        let start = res.iter().position(|&x| x != 0).unwrap_or(
            res.len() - 1
        );
        res.drain(..start);
        Some(res)
    }

    /// Creates the integer `lower + offset` from unsigned offset octets.
    pub fn from_offset(offset: &[u8], lower: i64) -> Self {
        let width = cmp::max(offset.len(), 8) + 2;
        let mut res = vec![0; width - offset.len()];
        res.extend_from_slice(offset);
        add_assign(&mut res, &Self::extend(&lower.to_be_bytes(), width));
        Integer(Bytes::copy_from_slice(Self::trim(&res)))
    }

    /// Returns the two’s complement octets sign-extended to `width`.
    fn extend(data: &[u8], width: usize) -> Vec<u8> {
        let fill = match data.first() {
            Some(x) if x & 0x80 != 0 => 0xFF,
            _ => 0
        };
        let mut res = vec![fill; width.saturating_sub(data.len())];
        res.extend_from_slice(data);
        res
    }
}

/// # Decimal Representation
///
impl Integer {
    /// Returns the decimal representation of the integer.
    pub fn to_decimal(&self) -> String {
        let mut magnitude = self.0.to_vec();
        let negative = self.is_negative();
        if negative {
            negate(&mut magnitude);
        }
        let mut digits = Vec::new();
        loop {
            let mut rem = 0u32;
            let mut nonzero = false;
            for octet in magnitude.iter_mut() {
                let cur = (rem << 8) | u32::from(*octet);
                *octet = (cur / 10) as u8;
                rem = cur % 10;
                nonzero |= *octet != 0;
            }
            digits.push(b'0' + rem as u8);
            if !nonzero {
                break
            }
        }
        if negative {
            digits.push(b'-');
        }
        digits.reverse();
        String::from_utf8_lossy(&digits).into_owned()
    }

    /// Parses an integer from its decimal representation.
    ///
    /// An optional leading `+` or `-` is allowed. The digits can’t be
    /// empty.
    pub fn from_decimal(s: &str) -> Result<Self, ContentError> {
        let (negative, digits) = match s.as_bytes() {
            [b'-', rest @ ..] => (true, rest),
            [b'+', rest @ ..] => (false, rest),
            rest => (false, rest)
        };
        if digits.is_empty() {
            return Err(ContentError::from_static("empty integer"))
        }
        // One leading zero octet keeps the magnitude positive.
        let mut res = vec![0u8];
        for &ch in digits {
            if !ch.is_ascii_digit() {
                return Err(ContentError::from_static(
                    "invalid character in integer"
                ))
            }
            let mut carry = u32::from(ch - b'0');
            for octet in res.iter_mut().rev() {
                let cur = u32::from(*octet) * 10 + carry;
                *octet = cur as u8;
                carry = cur >> 8;
            }
            if carry != 0 || res[0] & 0x80 != 0 {
                res.insert(0, carry as u8);
                if res[0] & 0x80 != 0 {
                    res.insert(0, 0);
                }
            }
        }
        if negative {
            negate(&mut res);
        }
        Ok(Integer(Bytes::copy_from_slice(Self::trim(&res))))
    }
}


//--- From

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer(Bytes::copy_from_slice(Self::trim(&value.to_be_bytes())))
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        i64::from(value).into()
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Self::from_unsigned_slice(&value.to_be_bytes())
    }
}

impl From<i128> for Integer {
    fn from(value: i128) -> Self {
        Integer(Bytes::copy_from_slice(Self::trim(&value.to_be_bytes())))
    }
}


//--- PartialOrd and Ord

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match (self.is_negative(), other.is_negative()) {
            (true, false) => cmp::Ordering::Less,
            (false, true) => cmp::Ordering::Greater,
            // Same sign and shortest form: the longer one is further away
            // from zero. With equal length, octets compare as unsigned.
            (negative, _) => {
                let by_len = self.0.len().cmp(&other.0.len());
                let by_len = if negative { by_len.reverse() } else { by_len };
                by_len.then_with(|| self.0.as_ref().cmp(other.0.as_ref()))
            }
        }
    }
}


//--- FromStr, Display, and Debug

impl str::FromStr for Integer {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Integer({})", self)
    }
}


//------------ Helper Functions ----------------------------------------------

/// Negates a two’s complement number in place.
fn negate(data: &mut [u8]) {
    for octet in data.iter_mut() {
        *octet = !*octet;
    }
    add_one(data)
}

/// Adds one to a two’s complement number in place, wrapping around.
fn add_one(data: &mut [u8]) {
    for octet in data.iter_mut().rev() {
        let (sum, carry) = octet.overflowing_add(1);
        *octet = sum;
        if !carry {
            break
        }
    }
}

/// Adds two numbers of equal width in place, wrapping around.
fn add_assign(data: &mut [u8], other: &[u8]) {
    let mut carry = 0u16;
    for (left, right) in data.iter_mut().rev().zip(other.iter().rev()) {
        let sum = u16::from(*left) + u16::from(*right) + carry;
        *left = sum as u8;
        carry = sum >> 8;
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonicalize() {
        let int = Integer::from_content(b"\x00\x00\x7F", Mode::Ber).unwrap();
        assert_eq!(int.as_slice(), b"\x7F");
        assert_eq!(int.to_i64().unwrap(), 127);
        assert_eq!(
            Integer::from_content(b"\x7F", Mode::Der).unwrap(), int
        );
        assert!(Integer::from_content(b"\x00\x00\x7F", Mode::Der).is_err());
        assert_eq!(
            Integer::from_slice(b"\xFF\xFF\x80").unwrap().as_slice(),
            b"\x80"
        );
        assert_eq!(
            Integer::from_slice(b"\x00\x80").unwrap().as_slice(),
            b"\x00\x80"
        );
        assert!(Integer::from_slice(b"").is_err());
    }

    #[test]
    fn is_canonical() {
        assert!(Integer::is_canonical(b"\x00"));
        assert!(Integer::is_canonical(b"\xFF"));
        assert!(Integer::is_canonical(b"\x00\x80"));
        assert!(Integer::is_canonical(b"\xFF\x7F"));
        assert!(!Integer::is_canonical(b""));
        assert!(!Integer::is_canonical(b"\x00\x7F"));
        assert!(!Integer::is_canonical(b"\xFF\x80"));
    }

    #[test]
    fn native_conversion() {
        for value in [
            0, 1, -1, 127, 128, -128, -129, 255, 256, i64::MIN, i64::MAX
        ] {
            assert_eq!(Integer::from(value).to_i64().unwrap(), value);
        }
        assert_eq!(Integer::from(-32513i64).as_slice(), b"\x80\xFF");
        assert_eq!(Integer::from(128i64).as_slice(), b"\x00\x80");
        assert_eq!(Integer::from(u64::MAX).to_u64().unwrap(), u64::MAX);
        assert_eq!(
            Integer::from(u64::MAX).to_i64().unwrap_err().reason(),
            Reason::Overflow
        );
        assert!(Integer::from(-1i64).to_u64().is_err());
        assert_eq!(
            Integer::from(i128::MIN).to_i128().unwrap(), i128::MIN
        );
        assert!(Integer::from_slice(&[0x01; 17]).unwrap().to_i128().is_err());
    }

    #[test]
    fn decimal() {
        for value in [0i64, 7, -7, 10, 1234567890, i64::MIN, i64::MAX] {
            let int = Integer::from(value);
            assert_eq!(int.to_decimal(), value.to_string());
            assert_eq!(Integer::from_decimal(&value.to_string()).unwrap(), int);
        }
        let big = "123456789012345678901234567890123456789012345678901234567890";
        assert_eq!(Integer::from_decimal(big).unwrap().to_decimal(), big);
        let neg = format!("-{}", big);
        let int = Integer::from_decimal(&neg).unwrap();
        assert!(int.is_negative());
        assert_eq!(int.to_string(), neg);
        assert_eq!(Integer::from_decimal("+12").unwrap(), Integer::from(12i64));
        assert_eq!(Integer::from_decimal("-0").unwrap(), Integer::from(0i64));
        assert!(Integer::from_decimal("").is_err());
        assert!(Integer::from_decimal("-").is_err());
        assert!(Integer::from_decimal("12a").is_err());
    }

    #[test]
    fn ordering() {
        let mut values: Vec<i128> = vec![
            0, 1, -1, 127, 128, -128, -129, 65536, -65536,
            i128::from(i64::MIN) - 1, i128::from(u64::MAX) + 5
        ];
        let mut ints: Vec<Integer> = values.iter().map(|&x| x.into()).collect();
        values.sort();
        ints.sort();
        let back: Vec<i128> = ints.iter().map(|x| x.to_i128().unwrap()).collect();
        assert_eq!(values, back);
        assert_eq!(
            Integer::from(i128::MAX).cmp_i64(i64::MAX), cmp::Ordering::Greater
        );
        assert_eq!(Integer::from(-3i64).cmp_i64(-2), cmp::Ordering::Less);
    }

    #[test]
    fn offsets() {
        assert_eq!(Integer::from(10i64).offset_from(3).unwrap(), b"\x07");
        assert_eq!(Integer::from(3i64).offset_from(3).unwrap(), b"\x00");
        assert_eq!(Integer::from(2i64).offset_from(3), None);
        assert_eq!(Integer::from(0i64).offset_from(-256).unwrap(), b"\x01\x00");
        assert_eq!(
            Integer::from(i64::MAX).offset_from(i64::MIN).unwrap(),
            b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF"
        );
        for (value, lower) in [(5i64, 0i64), (-5, -10), (1000, -1000)] {
            let offset = Integer::from(value).offset_from(lower).unwrap();
            assert_eq!(
                Integer::from_offset(&offset, lower), Integer::from(value)
            );
        }
        assert_eq!(
            Integer::from_offset(b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF", i64::MIN),
            Integer::from(i64::MAX)
        );
    }
}
