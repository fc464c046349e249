//! Bit strings.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use bytes::{Bytes, BytesMut};
use crate::decode::ContentError;


//------------ BitString -----------------------------------------------------

/// A bit string value.
///
/// Bit strings are a sequence of bits. Unlike
/// [`OctetString`][super::OctetString]s, they do not need to contain a
/// multiple of eight bits. The bits are kept in octets with the first bit
/// in the most significant bit of the first octet. The number of unused
/// bits at the end of the last octet is kept alongside. It is always in
/// the range 0 to 7 and zero for an empty bit string.
///
/// The content of the unused bits is not part of the value. Comparisons
/// ignore them and all encoders write them as zero.
///
/// There are two types of methods for accessing the data in a bit string.
/// Methods starting with `bit` operate on the individual bits while those
/// prefixed with `octet` access entire octets and ignore the fact that there
/// may be unused bits in the final octet.
///
/// # BER Encoding
///
/// When encoded in BER, bit strings can either be a primitive or
/// constructed value.
///
/// If encoded as a primitive value, the first octet of the
/// content contains the number of unused bits in the last octet and the
/// following octets contain the bits with the first bit in the most
/// significant bit of the octet.
///
/// In the constructed encoding, the bit string is represented as a sequence
/// of bit strings which in turn may either be constructed or primitive
/// encodings. The only limitation in this nesting is that only the last
/// primitively encoded bit string may have a non-zero number of unused bits.
/// With DER, only the primitive form is allowed.
#[derive(Clone, Default)]
pub struct BitString {
    /// The number of unused bits in the last byte.
    unused: u8,

    /// The bytes of the bit string.
    bits: BytesMut,
}

impl BitString {
    /// Creates a new bit string.
    ///
    /// Fails if `unused` is larger than 7 or if it isn’t zero for an empty
    /// bit string.
    pub fn new(unused: u8, bits: Bytes) -> Result<Self, ContentError> {
        Self::from_slice(unused, bits.as_ref())
    }

    /// Creates a new bit string by copying a slice of octets.
    pub fn from_slice(
        unused: u8, bits: &[u8]
    ) -> Result<Self, ContentError> {
        if unused > 7 || (bits.is_empty() && unused != 0) {
            return Err(ContentError::from_static(
                "invalid unused bits in bit string"
            ))
        }
        Ok(BitString { unused, bits: BytesMut::from(bits) })
    }

    /// Creates a bit string of the given length with all bits cleared.
    pub fn with_bit_len(len: usize) -> Self {
        BitString {
            unused: ((8 - len % 8) % 8) as u8,
            bits: BytesMut::zeroed(len.div_ceil(8)),
        }
    }

    /// Returns the value of the given bit.
    ///
    /// Bits beyond the end of the bit string are `false`.
    pub fn bit(&self, bit: usize) -> bool {
        if bit >= self.bit_len() {
            return false
        }
        self.bits[bit >> 3] & (0x80 >> (bit & 7)) != 0
    }

    /// Sets the given bit.
    ///
    /// If the bit is beyond the end of the bit string, the string grows to
    /// include it with all new bits cleared.
    pub fn set_bit(&mut self, bit: usize, value: bool) {
        if bit >= self.bit_len() {
            let old_len = self.bits.len();
            let new_len = bit / 8 + 1;
            if new_len > old_len {
                self.bits.resize(new_len, 0);
            }
            // Clear previously unused bits so they read as zero now.
            if let Some(last) = old_len.checked_sub(1) {
                self.bits[last] &= Self::mask(self.unused);
            }
            self.unused = (7 - bit % 8) as u8;
        }
        let mask = 0x80 >> (bit & 7);
        if value {
            self.bits[bit >> 3] |= mask;
        }
        else {
            self.bits[bit >> 3] &= !mask;
        }
    }

    /// Returns the number of bits in the bit string.
    pub fn bit_len(&self) -> usize {
        (self.bits.len() << 3) - usize::from(self.unused)
    }

    /// Returns the number of unused bits in the last octet.
    pub fn unused(&self) -> u8 {
        self.unused
    }

    /// Returns the number of octets in the bit string.
    pub fn octet_len(&self) -> usize {
        self.bits.len()
    }

    /// Returns the octets of the bit string as stored.
    ///
    /// The unused bits of the last octet may have any value.
    pub fn octet_slice(&self) -> &[u8] {
        self.bits.as_ref()
    }

    /// Returns the octets with the unused bits cleared.
    pub fn masked(&self) -> Vec<u8> {
        let mut res = self.bits.to_vec();
        if let Some(last) = res.last_mut() {
            *last &= Self::mask(self.unused);
        }
        res
    }

    /// Returns the mask that clears `unused` trailing bits of an octet.
    fn mask(unused: u8) -> u8 {
        0xFFu8 << unused
    }
}


//--- PartialEq and Eq

impl PartialEq for BitString {
    fn eq(&self, other: &Self) -> bool {
        self.unused == other.unused && self.masked() == other.masked()
    }
}

impl Eq for BitString { }


//--- Debug

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("BitString(")?;
        for i in 0..self.bit_len() {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        f.write_str(")")
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bits() {
        let bits = BitString::from_slice(3, b"\xA5\xFF").unwrap();
        assert_eq!(bits.bit_len(), 13);
        assert!(bits.bit(0));
        assert!(!bits.bit(1));
        assert!(bits.bit(12));
        assert!(!bits.bit(13));
        assert!(!bits.bit(100));
        assert_eq!(bits.masked(), b"\xA5\xF8");
    }

    #[test]
    fn unused_bits_ignored() {
        assert_eq!(
            BitString::from_slice(3, b"\xF0\xFF").unwrap(),
            BitString::from_slice(3, b"\xF0\xF8").unwrap()
        );
        assert_ne!(
            BitString::from_slice(3, b"\xF0\xF8").unwrap(),
            BitString::from_slice(2, b"\xF0\xF8").unwrap()
        );
    }

    #[test]
    fn set_bit_grows() {
        let mut bits = BitString::default();
        bits.set_bit(2, true);
        assert_eq!(bits.bit_len(), 3);
        assert_eq!(bits.unused(), 5);
        assert_eq!(bits.octet_slice(), b"\x20");
        bits.set_bit(9, true);
        assert_eq!(bits.bit_len(), 10);
        assert_eq!(bits.masked(), b"\x20\x40");
        bits.set_bit(2, false);
        assert!(!bits.bit(2));
    }

    #[test]
    fn invalid_unused() {
        assert!(BitString::from_slice(8, b"\x00").is_err());
        assert!(BitString::from_slice(1, b"").is_err());
        assert_eq!(BitString::with_bit_len(9).octet_len(), 2);
        assert_eq!(BitString::with_bit_len(9).unused(), 7);
        assert_eq!(BitString::with_bit_len(0).unused(), 0);
    }
}
