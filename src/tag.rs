//! The identifier octets of a BER encoded value.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use crate::decode::{ContentError, Reason};
use crate::encode::Target;


//------------ Class ---------------------------------------------------------

/// The class of a tag.
///
/// The order of the variants is the canonical order used by DER when
/// sorting the members of a SET.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Class {
    /// The universal class, used for the built-in types.
    Universal,

    /// The application class.
    Application,

    /// The context specific class.
    Context,

    /// The private class.
    Private,
}

impl Class {
    /// The mask for checking the class in the first identifier octet.
    const MASK: u8 = 0xc0;

    /// Returns the bits of the class in the first identifier octet.
    const fn bits(self) -> u8 {
        match self {
            Class::Universal => 0x00,
            Class::Application => 0x40,
            Class::Context => 0x80,
            Class::Private => 0xc0,
        }
    }

    /// Returns the class encoded in the first identifier octet.
    const fn from_octet(octet: u8) -> Self {
        match octet & Class::MASK {
            0x00 => Class::Universal,
            0x40 => Class::Application,
            0x80 => Class::Context,
            _ => Class::Private,
        }
    }
}


//------------ Tag -----------------------------------------------------------

/// The tag of a BER encoded value.
///
/// Each BER encoded value starts with a sequence of one or more octets
/// called the _identifier octets._ They encode both the tag of the value as
/// well as whether the value uses primitive or constructed encoding. The
/// `Tag` type represents the tag only. Whether a value is constructed is
/// returned separately when decoding and given separately when encoding.
///
/// The tag in turn consists of two parts: the class and the number – the
/// `Tag` type includes both of them.
///
/// # Limitations
///
/// We only support tag numbers that fit into a `u32`. Larger numbers are
/// rejected with an overflow error when decoding.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag {
    class: Class,
    number: u32,
}

/// # Constants for Often Used Tag Values
///
impl Tag {
    /// The mask for checking whether the value is constructed.
    const CONSTRUCTED_MASK: u8 = 0x20;

    /// The mask for the tag number in the first octet.
    const SINGLEBYTE_DATA_MASK: u8 = 0x1f;

    /// The mask for the tag number in subsequent octets.
    const MULTIBYTE_DATA_MASK: u8 = 0x7f;

    /// The bit marking that more octets follow.
    const LAST_OCTET_MASK: u8 = 0x80;

    /// The largest tag number that fits into the first octet.
    const MAX_VAL_FIRST_OCTET: u32 = 0x1e;

    /// The tag marking the end-of-value in an indefinite length value.
    ///
    /// This is UNIVERSAL 0.
    pub const END_OF_VALUE: Self = Self::universal(0);

    //--- Universal Tags
    //
    // See clause 8.4 of X.690.

    /// The tag for the BOOLEAN type, UNIVERSAL 1.
    pub const BOOLEAN: Self = Self::universal(1);

    /// The tag for the INTEGER type, UNIVERSAL 2.
    pub const INTEGER: Self = Self::universal(2);

    /// The tag for the BIT STRING type, UNIVERSAL 3.
    pub const BIT_STRING: Self = Self::universal(3);

    /// The tag for the OCTET STRING type, UNIVERSAL 4.
    pub const OCTET_STRING: Self = Self::universal(4);

    /// The tag for the NULL type, UNIVERSAL 5.
    pub const NULL: Self = Self::universal(5);

    /// The tag for the OBJECT IDENTIFIER type, UNIVERSAL 6.
    pub const OID: Self = Self::universal(6);

    /// The tag for the ENUMERATED type, UNIVERSAL 10.
    pub const ENUMERATED: Self = Self::universal(10);

    /// The tag for the UTF8String type, UNIVERSAL 12
    pub const UTF8_STRING: Self = Self::universal(12);

    /// The tag for the SEQUENCE and SEQUENCE OF types, UNIVERSAL 16.
    pub const SEQUENCE: Self = Self::universal(16);

    /// The tag for the SET and SET OF types, UNIVERSAL 17.
    pub const SET: Self = Self::universal(17);

    /// The tag for the NumericString type, UNIVERSAL 18.
    pub const NUMERIC_STRING: Self = Self::universal(18);

    /// The tag for the PrintableString type, UNIVERSAL 19.
    pub const PRINTABLE_STRING: Self = Self::universal(19);

    /// The tag for the IA5String type, UNIVERSAL 22.
    pub const IA5_STRING: Self = Self::universal(22);

    /// The tag for the VisibleString type, UNIVERSAL 26.
    pub const VISIBLE_STRING: Self = Self::universal(26);

    /// The tag for the UniversalString type, UNIVERSAL 28.
    pub const UNIVERSAL_STRING: Self = Self::universal(28);

    /// The tag for the BMPString type, UNIVERSAL 30.
    pub const BMP_STRING: Self = Self::universal(30);
}

impl Tag {
    /// Creates a tag from a class and number.
    pub const fn new(class: Class, number: u32) -> Self {
        Tag { class, number }
    }

    /// Creates a new tag in the universal class with the given tag number.
    pub const fn universal(number: u32) -> Self {
        Tag::new(Class::Universal, number)
    }

    /// Creates a new tag in the application class with the given tag number.
    pub const fn application(number: u32) -> Self {
        Tag::new(Class::Application, number)
    }

    /// Creates a new tag in the context specific class.
    pub const fn ctx(number: u32) -> Self {
        Tag::new(Class::Context, number)
    }

    /// Creates a new tag in the private class with the given tag number.
    pub const fn private(number: u32) -> Self {
        Tag::new(Class::Private, number)
    }

    /// Returns the class of the tag.
    pub const fn class(self) -> Class {
        self.class
    }

    /// Returns the number of the tag.
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Takes a tag from the beginning of a slice.
    ///
    /// Upon success, returns the tag, whether the value is constructed, and
    /// the number of identifier octets. If the slice ends before the
    /// identifier octets are complete, returns `Ok(None)` so the caller can
    /// try again with more data. A tag number that doesn’t fit a `u32` or
    /// that isn’t encoded in the shortest form is an error.
    pub fn take_from(
        data: &[u8]
    ) -> Result<Option<(Self, bool, usize)>, ContentError> {
        let first = match data.first() {
            Some(first) => *first,
            None => return Ok(None)
        };
        let class = Class::from_octet(first);
        let constructed = first & Tag::CONSTRUCTED_MASK != 0;
        let low = first & Tag::SINGLEBYTE_DATA_MASK;
        if low != Tag::SINGLEBYTE_DATA_MASK {
            return Ok(Some((Tag::new(class, low.into()), constructed, 1)))
        }
        let mut number = 0u32;
        for (i, &octet) in data.iter().enumerate().skip(1) {
            if i == 1 && octet == Tag::LAST_OCTET_MASK {
                return Err(ContentError::from_static(
                    "tag number with leading zero octet"
                ))
            }
            if number > (u32::MAX >> 7) {
                return Err(ContentError::with_reason(
                    Reason::Overflow, "tag number too large"
                ))
            }
            number = (number << 7)
                | u32::from(octet & Tag::MULTIBYTE_DATA_MASK);
            if octet & Tag::LAST_OCTET_MASK == 0 {
                if number <= Tag::MAX_VAL_FIRST_OCTET {
                    return Err(ContentError::from_static(
                        "tag number in long form"
                    ))
                }
                return Ok(Some((Tag::new(class, number), constructed, i + 1)))
            }
        }
        Ok(None)
    }

    /// Returns the number of octets of the encoded form of the tag.
    pub fn encoded_len(self) -> usize {
        if self.number <= Tag::MAX_VAL_FIRST_OCTET {
            1
        }
        else {
            1 + Self::base128_len(self.number)
        }
    }

    /// Appends the identifier octets to a vec.
    pub fn append_encoded(self, constructed: bool, target: &mut Vec<u8>) {
        let (buf, len) = self.to_encoded(constructed);
        target.extend_from_slice(&buf[..len])
    }

    /// Encodes the tag into a target.
    ///
    /// If `constructed` is `true`, the encoded tag will signal a value in
    /// constructed encoding and primitive encoding otherwise.
    pub fn write_encoded<T: Target>(
        self,
        constructed: bool,
        target: &mut T
    ) -> Result<(), T::Error> {
        let (buf, len) = self.to_encoded(constructed);
        target.write_all(&buf[..len])
    }

    /// Returns the identifier octets and their number.
    ///
    /// A `u32` tag number takes at most five base 128 digits, so six octets
    /// always suffice.
    fn to_encoded(self, constructed: bool) -> ([u8; 6], usize) {
        let mut buf = [0u8; 6];
        buf[0] = self.class.bits();
        if constructed {
            buf[0] |= Tag::CONSTRUCTED_MASK
        }
        if self.number <= Tag::MAX_VAL_FIRST_OCTET {
            buf[0] |= self.number as u8;
            return (buf, 1)
        }
        buf[0] |= Tag::SINGLEBYTE_DATA_MASK;
        let len = Self::base128_len(self.number);
        for i in 0..len {
            let shift = 7 * (len - 1 - i);
            let mut octet = ((self.number >> shift) as u8)
                & Tag::MULTIBYTE_DATA_MASK;
            if i + 1 != len {
                octet |= Tag::LAST_OCTET_MASK
            }
            buf[1 + i] = octet;
        }
        (buf, 1 + len)
    }

    /// Returns the number of base 128 digits needed for `number`.
    fn base128_len(number: u32) -> usize {
        let bits = 32 - number.leading_zeros() as usize;
        bits.div_ceil(7).max(1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Tag::BOOLEAN => write!(f, "BOOLEAN"),
            Tag::INTEGER => write!(f, "INTEGER"),
            Tag::BIT_STRING => write!(f, "BIT STRING"),
            Tag::OCTET_STRING => write!(f, "OCTET STRING"),
            Tag::NULL => write!(f, "NULL"),
            Tag::OID => write!(f, "OBJECT IDENTIFIER"),
            Tag::ENUMERATED => write!(f, "ENUMERATED"),
            Tag::UTF8_STRING => write!(f, "UTF8String"),
            Tag::SEQUENCE => write!(f, "SEQUENCE"),
            Tag::SET => write!(f, "SET"),
            Tag::NUMERIC_STRING => write!(f, "NumericString"),
            Tag::PRINTABLE_STRING => write!(f, "PrintableString"),
            Tag::IA5_STRING => write!(f, "IA5String"),
            Tag::VISIBLE_STRING => write!(f, "VisibleString"),
            Tag::UNIVERSAL_STRING => write!(f, "UniversalString"),
            Tag::BMP_STRING => write!(f, "BMPString"),
            tag => {
                match tag.class {
                    Class::Universal => write!(f, "[UNIVERSAL ")?,
                    Class::Application => write!(f, "[APPLICATION ")?,
                    Class::Context => write!(f, "[")?,
                    Class::Private => write!(f, "[PRIVATE ")?,
                }
                write!(f, "{}]", tag.number)
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    const CLASSES: &[Class] = &[
        Class::Universal, Class::Application, Class::Context, Class::Private
    ];

    fn round_trip(tag: Tag, constructed: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        tag.append_encoded(constructed, &mut buf);
        assert_eq!(buf.len(), tag.encoded_len());
        let mut written = Vec::new();
        tag.write_encoded(constructed, &mut written).unwrap();
        assert_eq!(written, buf);
        let (decoded, cons, len) = Tag::take_from(&buf).unwrap().unwrap();
        assert_eq!(decoded, tag);
        assert_eq!(cons, constructed);
        assert_eq!(len, buf.len());
        buf
    }

    #[test]
    fn single_octet_tags() {
        for &class in CLASSES {
            for number in 0..=30 {
                let buf = round_trip(Tag::new(class, number), false);
                assert_eq!(buf, [class.bits() | number as u8]);
            }
        }
        assert_eq!(round_trip(Tag::SEQUENCE, true), [0x30]);
        assert_eq!(round_trip(Tag::ctx(3), true), [0xa3]);
    }

    #[test]
    fn multi_octet_tags() {
        assert_eq!(round_trip(Tag::ctx(31), false), [0x9f, 0x1f]);
        assert_eq!(round_trip(Tag::application(127), true), [0x7f, 0x7f]);
        assert_eq!(round_trip(Tag::ctx(128), false), [0x9f, 0x81, 0x00]);
        assert_eq!(
            round_trip(Tag::private(0x3fff), false), [0xdf, 0xff, 0x7f]
        );
        assert_eq!(
            round_trip(Tag::ctx(u32::MAX), false),
            [0x9f, 0x8f, 0xff, 0xff, 0xff, 0x7f]
        );
        for &class in CLASSES {
            for number in [31, 100, 0x4000, 0x1f_ffff, 0x20_0000] {
                round_trip(Tag::new(class, number), true);
            }
        }
    }

    #[test]
    fn short_data() {
        assert_eq!(Tag::take_from(b"").unwrap(), None);
        assert_eq!(Tag::take_from(b"\x9f").unwrap(), None);
        assert_eq!(Tag::take_from(b"\x9f\x81").unwrap(), None);
    }

    #[test]
    fn failures() {
        // Leading zero octet.
        assert!(Tag::take_from(b"\x9f\x80\x01").is_err());
        // Low number in long form.
        assert!(Tag::take_from(b"\x9f\x05").is_err());
        // Number too large for a u32.
        let err = Tag::take_from(
            b"\x9f\x90\x80\x80\x80\x80\x00"
        ).unwrap_err();
        assert_eq!(err.reason(), Reason::Overflow);
    }

    #[test]
    fn ordering() {
        assert!(Tag::INTEGER < Tag::SEQUENCE);
        assert!(Tag::SEQUENCE < Tag::application(0));
        assert!(Tag::application(5) < Tag::ctx(0));
        assert!(Tag::ctx(40) < Tag::private(0));
    }

    #[test]
    fn display() {
        assert_eq!(Tag::SEQUENCE.to_string(), "SEQUENCE");
        assert_eq!(Tag::ctx(2).to_string(), "[2]");
        assert_eq!(Tag::application(7).to_string(), "[APPLICATION 7]");
    }
}
