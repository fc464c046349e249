//! The length octets.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use crate::decode::{ContentError, Reason};
use crate::encode::Target;
use crate::mode::Mode;


//------------ Length -------------------------------------------------------

/// The length octets of an encoded value.
///
/// A length value can either be definite, meaning it provides the actual
/// number of content octets in the value, or indefinite, in which case the
/// content is delimited by a special end-of-value marker.
///
/// # BER Encoding
///
/// The length can be encoded in one of two basic ways. Which one is used is
/// determined by the most significant bit of the first octet. If it is not
/// set, the length octets is one octet long and the remaining bits of this
/// first octet provide the definite length. Thus, if the first octet is
/// less than 128, it provides the definite length already.
///
/// If the most significant bit is set, the remaining bits of the first
/// octet specify the number of octets that follow to encode the actual
/// length. If they specify that there are zero more octets, i.e., the
/// value of the first octet is 128, the length is indefinite. Otherwise,
/// those following octets give the big-endian encoding of the definite
/// length of the content octets.
///
/// Under DER rules, a definite length must be encoded in the minimum
/// number of octets and indefinite lengths are not allowed at all.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Length(Option<usize>);

impl Length {
    /// The indefinite length.
    pub const INDEFINITE: Self = Length(None);

    /// Creates a definite length.
    pub const fn definite(len: usize) -> Self {
        Length(Some(len))
    }

    /// Returns the length if it is definite.
    pub fn get(self) -> Option<usize> {
        self.0
    }

    /// Returns whether the length is indefinite.
    pub fn is_indefinite(self) -> bool {
        self.0.is_none()
    }

    /// Takes length octets from the beginning of a slice.
    ///
    /// Returns the length and the number of octets it occupied. If the
    /// slice ends before all length octets are available, returns
    /// `Ok(None)`. A length that doesn’t fit into a `usize` is an error as
    /// is, in DER mode, any length not in its shortest form.
    pub fn take_from(
        data: &[u8], mode: Mode
    ) -> Result<Option<(Self, usize)>, ContentError> {
        let first = match data.first() {
            Some(first) => *first,
            None => return Ok(None)
        };
        let count = match first {
            n if n & 0x80 == 0 => {
                return Ok(Some((Length::definite(n.into()), 1)))
            }
            0x80 => {
                if !mode.allows_indefinite() {
                    return Err(ContentError::from_static(
                        "indefinite length in DER"
                    ))
                }
                return Ok(Some((Length::INDEFINITE, 1)))
            }
            0xFF => {
                return Err(ContentError::from_static(
                    "illegal length octets"
                ))
            }
            n => usize::from(n & 0x7F)
        };
        let octets = match data.get(1..=count) {
            Some(octets) => octets,
            None => return Ok(None)
        };
        if mode.is_restricted() {
            // The second octet can’t be zero and it can’t be less than 0x80
            // if it is the only one. In both cases there is a shorter
            // encoding.
            if octets[0] == 0 || (octets[0] < 0x80 && count == 1) {
                return Err(ContentError::from_static(
                    "illegal length in DER"
                ))
            }
        }
        let mut res = 0usize;
        for &octet in octets {
            if res > (usize::MAX >> 8) {
                return Err(ContentError::with_reason(
                    Reason::Overflow, "excessive length"
                ))
            }
            res = (res << 8) | usize::from(octet);
        }
        Ok(Some((Length::definite(res), count + 1)))
    }

    /// Returns the length of the encoded representation of the value.
    pub fn encoded_len(self) -> usize {
        match self.0 {
            Some(len) if len > 0x7F => 1 + Self::octet_count(len),
            _ => 1
        }
    }

    /// Appends the encoded length to the end of `target`.
    pub fn append_encoded(self, target: &mut Vec<u8>) {
        match self.0 {
            Some(len) if len > 0x7F => {
                let count = Self::octet_count(len);
                // A usize has at most 16 octets, so this can’t overflow.
                target.push(0x80 | count as u8);
                let bytes = len.to_be_bytes();
                target.extend_from_slice(
                    bytes.get(bytes.len() - count..).unwrap_or(&bytes)
                );
            }
            Some(len) => target.push(len as u8),
            None => target.push(0x80)
        }
    }

    /// Writes the encoded length to the given target.
    pub fn write_encoded<T: Target>(
        self, target: &mut T
    ) -> Result<(), T::Error> {
        let mut buf = Vec::with_capacity(9);
        self.append_encoded(&mut buf);
        target.write_all(&buf)
    }

    /// Returns the number of octets needed for a long form length.
    fn octet_count(len: usize) -> usize {
        (usize::BITS - len.leading_zeros()).div_ceil(8) as usize
    }
}

impl From<usize> for Length {
    fn from(len: usize) -> Self {
        Length::definite(len)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn take_from(
        src: &[u8], mode: Mode
    ) -> Result<Option<usize>, ContentError> {
        let (res, len) = Length::take_from(src, mode)?.unwrap();
        if len == src.len() {
            Ok(res.get())
        }
        else {
            Err(ContentError::from_static("TRAILING DATA"))
        }
    }

    #[test]
    fn ber_take_from() {
        let ber = Mode::Ber;
        assert_eq!(take_from(b"\x00", ber).unwrap(), Some(0x00));
        assert_eq!(take_from(b"\x12", ber).unwrap(), Some(0x12));
        assert_eq!(take_from(b"\x7f", ber).unwrap(), Some(0x7f));
        assert_eq!(take_from(b"\x80", ber).unwrap(), None);
        assert_eq!(take_from(b"\x81\x00", ber).unwrap(), Some(0));
        assert_eq!(take_from(b"\x81\xF0", ber).unwrap(), Some(0xF0));
        assert_eq!(take_from(b"\x82\x00\x00", ber).unwrap(), Some(0));
        assert_eq!(take_from(b"\x82\xF0\x0E", ber).unwrap(), Some(0xF00E));
        assert_eq!(take_from(b"\x82\x00\x0E", ber).unwrap(), Some(0x0E));
        assert!(take_from(b"\xFF", ber).is_err());
    }

    #[test]
    fn der_take_from() {
        let der = Mode::Der;
        assert_eq!(take_from(b"\x00", der).unwrap(), Some(0x00));
        assert_eq!(take_from(b"\x7f", der).unwrap(), Some(0x7f));
        assert!(take_from(b"\x80", der).is_err());
        assert!(take_from(b"\x81\x00", der).is_err());
        assert!(take_from(b"\x81\x7f", der).is_err());
        assert_eq!(take_from(b"\x81\x80", der).unwrap(), Some(0x80));
        assert_eq!(take_from(b"\x81\xF0", der).unwrap(), Some(0xF0));
        assert!(take_from(b"\x82\x00\x00", der).is_err());
        assert_eq!(take_from(b"\x82\xF0\x0E", der).unwrap(), Some(0xF00E));
        assert!(take_from(b"\x82\x00\x0E", der).is_err());
    }

    #[test]
    fn short_data() {
        assert_eq!(Length::take_from(b"", Mode::Ber).unwrap(), None);
        assert_eq!(Length::take_from(b"\x82\x01", Mode::Ber).unwrap(), None);
        assert_eq!(Length::take_from(b"\x81", Mode::Der).unwrap(), None);
    }

    #[test]
    fn excessive_length() {
        let mut data = vec![0x80 | 17];
        data.extend_from_slice(&[0xFF; 17]);
        let err = Length::take_from(&data, Mode::Ber).unwrap_err();
        assert_eq!(err.reason(), Reason::Overflow);
    }

    #[test]
    fn encode() {
        fn encode(len: Length) -> Vec<u8> {
            let mut res = Vec::new();
            len.append_encoded(&mut res);
            assert_eq!(res.len(), len.encoded_len());
            res
        }

        assert_eq!(encode(Length::INDEFINITE), b"\x80");
        assert_eq!(encode(Length::definite(0)), b"\x00");
        assert_eq!(encode(Length::definite(0x7F)), b"\x7F");
        assert_eq!(encode(Length::definite(0x80)), b"\x81\x80");
        assert_eq!(encode(Length::definite(0xF00E)), b"\x82\xF0\x0E");
        assert_eq!(encode(Length::definite(0x10000)), b"\x83\x01\x00\x00");
    }
}
