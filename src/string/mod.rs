//! String types.
//!
//! There are two types of strings for binary data. [`OctetString`]s contain
//! a unrestricted sequence of octets while [`BitString`]s contain a sequence
//! of bits that does not need to be of a length divisible by eight.
//!
//! In addition, there are a number of so-called restricted character strings
//! that each contain a sequence of characters according to a pre-defined
//! character set. Values of these are kept in an [`OctetString`] as well.
//! The [`StringKind`] of the type says how to interpret the octets.

//--- Re-exports

pub use self::bit::BitString;
pub use self::kind::StringKind;
pub use self::octet::OctetString;

//--- Private modules

mod bit;
mod kind;
mod octet;
