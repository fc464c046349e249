//! The OCTET STRING and the character string types built atop it.
//!
//! This is an internal module. It’s public types are re-exported by the
//! parent.

use std::{fmt, ops};
use bytes::Bytes;


//------------ OctetString ---------------------------------------------------

/// An octet string value.
///
/// An octet string is a sequence of octets, i.e., a glorified `[u8]`. The
/// type is used for the OCTET STRING type itself as well as for all the
/// character string types. For those, the octets are the characters in the
/// fixed width or UTF-8 encoding of the type. The
/// [`StringKind`][super::StringKind] of the type descriptor says which.
///
/// # BER Encoding
///
/// Octet strings are either encoded as a primitive or a constructed value.
/// In the primitive form, the content octets are the string’s octets. In a
/// constructed form, the content is a sequence of encoded octets strings
/// which in turn may be primitive or constructed. In this case, the string’s
/// octets are the concatenation of all the content octets of the primitive
/// forms in the order as encountered.
///
/// In DER, only the primitive form is allowed.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OctetString(Bytes);

impl OctetString {
    /// Creates an octet string from a bytes value.
    pub fn new(bytes: Bytes) -> Self {
        OctetString(bytes)
    }

    /// Creates an octet string by copying a slice.
    pub fn from_slice(slice: &[u8]) -> Self {
        OctetString(Bytes::copy_from_slice(slice))
    }

    /// Returns the octets as a slice.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns a reference to the underlying bytes value.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Converts the octet string into its bytes value.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Returns the number of octets in the string.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the content as a string slice if it is valid UTF-8.
    pub fn to_utf8(&self) -> Option<&str> {
        std::str::from_utf8(self.as_slice()).ok()
    }
}


//--- From

impl From<Bytes> for OctetString {
    fn from(bytes: Bytes) -> Self {
        Self::new(bytes)
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(vec: Vec<u8>) -> Self {
        Self::new(vec.into())
    }
}

impl From<&[u8]> for OctetString {
    fn from(slice: &[u8]) -> Self {
        Self::from_slice(slice)
    }
}

impl From<&str> for OctetString {
    fn from(s: &str) -> Self {
        Self::from_slice(s.as_bytes())
    }
}

impl From<String> for OctetString {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes().into())
    }
}


//--- Deref and AsRef

impl ops::Deref for OctetString {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for OctetString {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}


//--- Debug

impl fmt::Debug for OctetString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_utf8() {
            Some(s) if s.chars().all(|ch| !ch.is_control()) => {
                write!(f, "OctetString({:?})", s)
            }
            _ => {
                f.write_str("OctetString(")?;
                for octet in self.as_slice() {
                    write!(f, "{:02X}", octet)?;
                }
                f.write_str(")")
            }
        }
    }
}
