//! Packing the characters of restricted strings.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use crate::constraints::{PerConstraints, RangeKind};
use crate::decode::{ContentError, Reason};
use crate::string::StringKind;
use super::bits::{BitCursor, BitWriter};
use super::number::{bits_for, index_bits};


//------------ CharCoding ----------------------------------------------------

/// How the characters of a known-multiplier string are packed.
///
/// Each character takes the same number of bits. If the largest permitted
/// character code fits into these bits, the code itself is written.
/// Otherwise, the character’s index into the sorted permitted alphabet is
/// written instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CharCoding {
    /// The number of bits per character.
    bits: u32,

    /// How a character is mapped to the value written.
    map: CharMap,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CharMap {
    /// The character code is written as is.
    Raw,

    /// The index into an explicit alphabet is written.
    Alphabet(&'static [u32]),

    /// The offset from the lowest permitted code is written.
    Offset(u32),
}

impl CharCoding {
    /// Determines the coding for a string type and its constraints.
    pub fn new(kind: StringKind, per: &PerConstraints) -> Self {
        let native = 8 * kind.char_width() as u32;
        if let Some(alphabet) = per.alphabet {
            let bits = index_bits(alphabet.len());
            let max = alphabet.last().copied().unwrap_or(0);
            return if bits_for(u64::from(max)) <= bits {
                CharCoding { bits, map: CharMap::Raw }
            }
            else {
                CharCoding { bits, map: CharMap::Alphabet(alphabet) }
            }
        }
        let range = per.value;
        if range.kind != RangeKind::Constrained || range.extensible {
            return CharCoding { bits: native, map: CharMap::Raw }
        }
        let bits = range.range_bits.unwrap_or(native);
        if bits_for(range.upper.max(0) as u64) <= bits {
            CharCoding { bits, map: CharMap::Raw }
        }
        else {
            CharCoding {
                bits, map: CharMap::Offset(range.lower.max(0) as u32)
            }
        }
    }

    /// Returns the number of bits per character.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Writes a character.
    ///
    /// The character must have been checked against the constraints.
    pub fn put_char(
        &self, writer: &mut BitWriter, ch: u32
    ) -> Result<(), ContentError> {
        let value = match self.map {
            CharMap::Raw => ch,
            CharMap::Alphabet(alphabet) => {
                alphabet.binary_search(&ch).map_err(|_| {
                    not_permitted(ch)
                })? as u32
            }
            CharMap::Offset(lower) => {
                ch.checked_sub(lower).ok_or_else(|| not_permitted(ch))?
            }
        };
        writer.put_bits(u64::from(value), self.bits);
        Ok(())
    }

    /// Reads a character.
    pub fn get_char(&self, cursor: &mut BitCursor) -> Result<u32, ContentError> {
        let value = cursor.get_bits(self.bits)?;
        match self.map {
            CharMap::Raw => u32::try_from(value).map_err(|_| {
                ContentError::from_static("invalid character code")
            }),
            CharMap::Alphabet(alphabet) => {
                alphabet.get(value as usize).copied().ok_or_else(|| {
                    ContentError::from_static(
                        "character index beyond alphabet"
                    )
                })
            }
            CharMap::Offset(lower) => {
                u32::try_from(value).ok().and_then(|value| {
                    value.checked_add(lower)
                }).ok_or_else(|| {
                    ContentError::from_static("invalid character code")
                })
            }
        }
    }
}

fn not_permitted(ch: u32) -> ContentError {
    ContentError::with_reason_boxed(
        Reason::Constraint,
        Box::new(format!("character 0x{:X} not permitted", ch))
    )
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;
    use crate::constraints::Range;

    #[test]
    fn codings() {
        assert_eq!(
            CharCoding::new(StringKind::Ia5, &PerConstraints::IA5_STRING),
            CharCoding { bits: 7, map: CharMap::Raw }
        );
        assert_eq!(
            CharCoding::new(
                StringKind::Printable, &PerConstraints::PRINTABLE_STRING
            ).bits(),
            7
        );
        assert_eq!(
            CharCoding::new(StringKind::Bmp, &PerConstraints::NONE),
            CharCoding { bits: 16, map: CharMap::Raw }
        );
        assert!(matches!(
            CharCoding::new(
                StringKind::Numeric, &PerConstraints::NUMERIC_STRING
            ),
            CharCoding { bits: 4, map: CharMap::Alphabet(_) }
        ));
        assert_eq!(
            CharCoding::new(
                StringKind::Ia5,
                &PerConstraints::value(Range::constrained(65, 70))
            ),
            CharCoding { bits: 3, map: CharMap::Offset(65) }
        );
    }

    #[test]
    fn numeric_chars() {
        let coding = CharCoding::new(
            StringKind::Numeric, &PerConstraints::NUMERIC_STRING
        );
        let mut writer = BitWriter::new();
        for &ch in b"1 9" {
            coding.put_char(&mut writer, ch.into()).unwrap();
        }
        assert!(coding.put_char(&mut writer, u32::from(b'A')).is_err());
        let data = writer.into_octets();
        assert_eq!(data, b"\x20\xA0");

        let mut cursor = BitCursor::new(Bytes::from(data));
        assert_eq!(coding.get_char(&mut cursor).unwrap(), u32::from(b'1'));
        assert_eq!(coding.get_char(&mut cursor).unwrap(), u32::from(b' '));
        assert_eq!(coding.get_char(&mut cursor).unwrap(), u32::from(b'9'));
        // Index 0 is the space again.
        assert_eq!(coding.get_char(&mut cursor).unwrap(), u32::from(b' '));
    }
}
