//! The flavours of string types.
//!
//! This is a private module. Its public items are re-exported by the parent.

use crate::decode::ContentError;
use crate::tag::Tag;


//------------ StringKind ----------------------------------------------------

/// The flavour of a string type.
///
/// All string types are kept as a sequence of octets in an
/// [`OctetString`][super::OctetString]. The kind determines the universal
/// tag of the type, which octet sequences are valid, how many octets make
/// up a character, and whether the XML representation is text or
/// hexadecimal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StringKind {
    /// OCTET STRING: arbitrary octets.
    Octet,

    /// UTF8String: Unicode code points encoded in UTF-8.
    Utf8,

    /// IA5String: ASCII characters.
    Ia5,

    /// PrintableString: letters, digits, and a handful of symbols.
    Printable,

    /// NumericString: digits and space.
    Numeric,

    /// VisibleString: printing ASCII characters and space.
    Visible,

    /// BMPString: characters of the Basic Multilingual Plane in two octets.
    Bmp,

    /// UniversalString: Unicode code points in four octets.
    Universal,
}

impl StringKind {
    /// Returns the universal tag of the string type.
    pub fn tag(self) -> Tag {
        match self {
            StringKind::Octet => Tag::OCTET_STRING,
            StringKind::Utf8 => Tag::UTF8_STRING,
            StringKind::Ia5 => Tag::IA5_STRING,
            StringKind::Printable => Tag::PRINTABLE_STRING,
            StringKind::Numeric => Tag::NUMERIC_STRING,
            StringKind::Visible => Tag::VISIBLE_STRING,
            StringKind::Bmp => Tag::BMP_STRING,
            StringKind::Universal => Tag::UNIVERSAL_STRING,
        }
    }

    /// Returns the number of octets per character.
    pub fn char_width(self) -> usize {
        match self {
            StringKind::Bmp => 2,
            StringKind::Universal => 4,
            _ => 1
        }
    }

    /// Returns whether each character has a fixed width.
    ///
    /// Only for these types do permitted alphabet constraints affect the
    /// packed encoding.
    pub fn is_known_multiplier(self) -> bool {
        !matches!(self, StringKind::Octet | StringKind::Utf8)
    }

    /// Returns whether the XML representation of the type is text.
    pub fn is_text(self) -> bool {
        !matches!(self, StringKind::Octet)
    }

    /// Returns whether `ch` is a permitted character.
    pub fn permits(self, ch: u32) -> bool {
        match self {
            StringKind::Octet => ch <= 0xFF,
            StringKind::Utf8 | StringKind::Universal => {
                char::from_u32(ch).is_some()
            }
            StringKind::Ia5 => ch < 0x80,
            StringKind::Printable => {
                u8::try_from(ch).map(is_printable).unwrap_or(false)
            }
            StringKind::Numeric => {
                ch == u32::from(b' ')
                    || (u32::from(b'0')..=u32::from(b'9')).contains(&ch)
            }
            StringKind::Visible => (0x20..0x7F).contains(&ch),
            StringKind::Bmp => {
                ch <= 0xFFFF && !(0xD800..0xE000).contains(&ch)
            }
        }
    }

    /// Checks that the octets are valid content for the type.
    pub fn check(self, data: &[u8]) -> Result<(), ContentError> {
        self.decode_chars(data).map(|_| ())
    }

    /// Splits the octets into characters.
    ///
    /// For UTF8String, the characters are the code points. For all other
    /// types, they are the fixed width units of the type.
    pub fn decode_chars(self, data: &[u8]) -> Result<Vec<u32>, ContentError> {
        let res: Vec<u32> = match self {
            StringKind::Utf8 => {
                std::str::from_utf8(data).map_err(|_| {
                    ContentError::from_static("invalid UTF-8 string")
                })?.chars().map(u32::from).collect()
            }
            StringKind::Bmp | StringKind::Universal => {
                let width = self.char_width();
                if data.len() % width != 0 {
                    return Err(ContentError::from_static(
                        "string length not a multiple of character width"
                    ))
                }
                data.chunks(width).map(|chunk| {
                    chunk.iter().fold(0u32, |acc, &x| {
                        (acc << 8) | u32::from(x)
                    })
                }).collect()
            }
            _ => data.iter().map(|&x| u32::from(x)).collect()
        };
        if let Some(ch) = res.iter().find(|&&ch| !self.permits(ch)) {
            return Err(ContentError::from(format!(
                "invalid character 0x{:X} in {:?} string", ch, self
            )))
        }
        Ok(res)
    }

    /// Appends the octets for a character.
    pub fn push_char(
        self, ch: u32, target: &mut Vec<u8>
    ) -> Result<(), ContentError> {
        if !self.permits(ch) {
            return Err(ContentError::from(format!(
                "invalid character 0x{:X} in {:?} string", ch, self
            )))
        }
        match self {
            StringKind::Utf8 => {
                // `permits` has checked that this is a char.
                if let Some(ch) = char::from_u32(ch) {
                    let mut buf = [0; 4];
                    target.extend_from_slice(
                        ch.encode_utf8(&mut buf).as_bytes()
                    );
                }
            }
            StringKind::Bmp => {
                target.extend_from_slice(&(ch as u16).to_be_bytes())
            }
            StringKind::Universal => {
                target.extend_from_slice(&ch.to_be_bytes())
            }
            _ => target.push(ch as u8)
        }
        Ok(())
    }

    /// Converts the octets of a text type into a string.
    pub fn to_text(self, data: &[u8]) -> Result<String, ContentError> {
        self.decode_chars(data)?.into_iter().map(|ch| {
            char::from_u32(ch).ok_or_else(|| {
                ContentError::from_static("character not representable")
            })
        }).collect()
    }

    /// Converts a string into the octets of a text type.
    pub fn from_text(self, text: &str) -> Result<Vec<u8>, ContentError> {
        let mut res = Vec::with_capacity(text.len() * self.char_width());
        for ch in text.chars() {
            self.push_char(ch.into(), &mut res)?;
        }
        Ok(res)
    }
}

/// Returns whether an octet is a PrintableString character.
fn is_printable(x: u8) -> bool {
    x.is_ascii_alphanumeric() ||
    x == b' ' || x == b'\'' || x == b'(' || x == b')' ||
    x == b'+' || x == b',' || x == b'-' || x == b'.' ||
    x == b'/' || x == b':' || x == b'=' || x == b'?'
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn check_content() {
        assert!(StringKind::Ia5.check(b"hello\x7f").is_ok());
        assert!(StringKind::Ia5.check(b"hello\x80").is_err());
        assert!(StringKind::Printable.check(b"Foo (bar)?").is_ok());
        assert!(StringKind::Printable.check(b"foo@bar").is_err());
        assert!(StringKind::Numeric.check(b"12 34").is_ok());
        assert!(StringKind::Numeric.check(b"12a").is_err());
        assert!(StringKind::Visible.check(b"~!").is_ok());
        assert!(StringKind::Visible.check(b"\t").is_err());
        assert!(StringKind::Utf8.check("grüß".as_bytes()).is_ok());
        assert!(StringKind::Utf8.check(b"\xC3").is_err());
        assert!(StringKind::Bmp.check(b"\x00a\x00").is_err());
        assert!(StringKind::Bmp.check(b"\xD8\x00").is_err());
        assert!(StringKind::Octet.check(b"\xff\x00").is_ok());
    }

    #[test]
    fn text_conversion() {
        let bmp = StringKind::Bmp.from_text("aé").unwrap();
        assert_eq!(bmp, b"\x00a\x00\xe9");
        assert_eq!(StringKind::Bmp.to_text(&bmp).unwrap(), "aé");

        let universal = StringKind::Universal.from_text("\u{1F600}").unwrap();
        assert_eq!(universal, b"\x00\x01\xF6\x00");
        assert_eq!(
            StringKind::Universal.decode_chars(&universal).unwrap(),
            [0x1F600]
        );

        assert!(StringKind::Bmp.from_text("\u{1F600}").is_err());
        assert!(StringKind::Numeric.from_text("12x").is_err());
        assert_eq!(StringKind::Utf8.from_text("ß").unwrap(), "ß".as_bytes());
    }
}
