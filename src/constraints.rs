//! Constraints on values.
//!
//! This module provides two things. [`Range`] and [`PerConstraints`]
//! describe the value and size constraints that are visible to the packed
//! encoding rules. The PER driver uses them to pick the shortest encoding.
//!
//! The [`check`] function validates a value against all the constraints of
//! its type, independently of any encoding. Violations are reported through
//! a callback.

use std::{error, fmt};
use log::debug;
use crate::descriptor::{Member, TypeDescriptor, TypeKind};
use crate::int::Integer;
use crate::string::StringKind;
use crate::value::Value;


//------------ RangeKind -----------------------------------------------------

/// How much a range is constrained.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RangeKind {
    /// There are no bounds.
    Unconstrained,

    /// There is a lower bound only.
    SemiConstrained,

    /// There are both lower and upper bounds.
    Constrained,
}


//------------ Range ---------------------------------------------------------

/// A value or size range.
///
/// In addition to the bounds, the range keeps the number of bits needed
/// to encode a value within it as an offset from the lower bound.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Range {
    /// How much the range is constrained.
    pub kind: RangeKind,

    /// Whether the type is extensible beyond the range.
    pub extensible: bool,

    /// The lower bound. Only valid unless unconstrained.
    pub lower: i64,

    /// The upper bound. Only valid if constrained.
    pub upper: i64,

    /// The number of bits to encode an offset within the range.
    ///
    /// This is `None` unless the range is constrained.
    pub range_bits: Option<u32>,

    /// The number of bits of a constrained length field.
    ///
    /// This is `None` if a size in this range needs a general length
    /// determinant, i.e., if the range isn’t constrained or the upper bound
    /// is 64K or more.
    pub effective_bits: Option<u32>,
}

impl Range {
    /// The largest upper bound for which lengths use a fixed width field.
    const MAX_EFFECTIVE: i64 = 65535;

    /// An unconstrained range.
    pub const fn unconstrained() -> Self {
        Range {
            kind: RangeKind::Unconstrained, extensible: false,
            lower: 0, upper: 0, range_bits: None, effective_bits: None,
        }
    }

    /// A range with a lower bound only.
    pub const fn semi(lower: i64) -> Self {
        Range {
            kind: RangeKind::SemiConstrained, extensible: false,
            lower, upper: 0, range_bits: None, effective_bits: None,
        }
    }

    /// A range with both bounds.
    ///
    /// # Panics
    ///
    /// The function panics if `upper` is less than `lower`. Since it is
    /// used to build static tables, this happens at compile time.
    pub const fn constrained(lower: i64, upper: i64) -> Self {
        assert!(lower <= upper, "range with upper below lower bound");
        let span = (upper as i128 - lower as i128) as u64;
        let bits = u64::BITS - span.leading_zeros();
        Range {
            kind: RangeKind::Constrained, extensible: false,
            lower, upper,
            range_bits: Some(bits),
            effective_bits: if upper <= Self::MAX_EFFECTIVE {
                Some(bits)
            } else {
                None
            },
        }
    }

    /// Returns the same range marked as extensible.
    pub const fn extensible(self) -> Self {
        Range { extensible: true, ..self }
    }

    /// Returns whether the range is unconstrained.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self.kind, RangeKind::Unconstrained)
    }

    /// Returns whether the range has an upper bound.
    pub fn is_constrained(&self) -> bool {
        matches!(self.kind, RangeKind::Constrained)
    }

    /// Returns whether `value` is within the range.
    pub fn contains(&self, value: i64) -> bool {
        match self.kind {
            RangeKind::Unconstrained => true,
            RangeKind::SemiConstrained => value >= self.lower,
            RangeKind::Constrained => {
                value >= self.lower && value <= self.upper
            }
        }
    }

    /// Returns whether an integer of arbitrary size is within the range.
    pub fn contains_integer(&self, value: &Integer) -> bool {
        match self.kind {
            RangeKind::Unconstrained => true,
            RangeKind::SemiConstrained => value.cmp_i64(self.lower).is_ge(),
            RangeKind::Constrained => {
                value.cmp_i64(self.lower).is_ge()
                    && value.cmp_i64(self.upper).is_le()
            }
        }
    }

    /// Returns whether a size is within the range.
    pub fn contains_size(&self, size: usize) -> bool {
        match i64::try_from(size) {
            Ok(size) => self.contains(size),
            Err(_) => !self.is_constrained(),
        }
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::unconstrained()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            RangeKind::Unconstrained => f.write_str("(MIN..MAX")?,
            RangeKind::SemiConstrained => write!(f, "({}..MAX", self.lower)?,
            RangeKind::Constrained => {
                write!(f, "({}..{}", self.lower, self.upper)?
            }
        }
        if self.extensible {
            f.write_str(",...")?;
        }
        f.write_str(")")
    }
}


//------------ PerConstraints ------------------------------------------------

/// The constraints of a type visible to the packed encoding rules.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PerConstraints {
    /// The value range.
    ///
    /// For INTEGER, this is the range of the value. For the known-multiplier
    /// character strings, it is the range of permitted character codes.
    pub value: Range,

    /// The size range.
    ///
    /// This is the range of the number of characters, bits, or elements.
    pub size: Range,

    /// The permitted alphabet as a sorted list of character codes.
    ///
    /// If present, characters are encoded as their index into this list.
    pub alphabet: Option<&'static [u32]>,
}

impl PerConstraints {
    /// No constraints at all.
    pub const NONE: Self = PerConstraints::new(
        Range::unconstrained(), Range::unconstrained()
    );

    /// The effective permitted alphabet of IA5String.
    pub const IA5_STRING: Self = PerConstraints::new(
        Range::constrained(0, 127), Range::unconstrained()
    );

    /// The effective permitted alphabet of PrintableString.
    pub const PRINTABLE_STRING: Self = PerConstraints::new(
        Range::constrained(32, 122), Range::unconstrained()
    );

    /// The effective permitted alphabet of VisibleString.
    pub const VISIBLE_STRING: Self = PerConstraints::new(
        Range::constrained(32, 126), Range::unconstrained()
    );

    /// The permitted alphabet of NumericString.
    pub const NUMERIC_STRING: Self = PerConstraints::new(
        Range::constrained(32, 57), Range::unconstrained()
    ).with_alphabet(&[
        0x20, 0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39
    ]);

    /// Creates constraints from a value and size range.
    pub const fn new(value: Range, size: Range) -> Self {
        PerConstraints { value, size, alphabet: None }
    }

    /// Creates constraints with only a value range.
    pub const fn value(value: Range) -> Self {
        Self::new(value, Range::unconstrained())
    }

    /// Creates constraints with only a size range.
    pub const fn size(size: Range) -> Self {
        Self::new(Range::unconstrained(), size)
    }

    /// Returns the constraints with a permitted alphabet.
    pub const fn with_alphabet(self, alphabet: &'static [u32]) -> Self {
        PerConstraints { alphabet: Some(alphabet), ..self }
    }

    /// Returns whether a character is permitted.
    pub fn permits_char(&self, ch: u32) -> bool {
        match self.alphabet {
            Some(alphabet) => alphabet.binary_search(&ch).is_ok(),
            None => {
                self.value.extensible || self.value.contains(i64::from(ch))
            }
        }
    }
}


//------------ ConstraintViolation -------------------------------------------

/// A value violated a constraint of its type.
#[derive(Clone, Debug)]
pub struct ConstraintViolation {
    /// The name of the type of the value.
    type_name: &'static str,

    /// A description of the problem.
    message: String,
}

impl ConstraintViolation {
    /// Returns the name of the type whose constraint was violated.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the description of the violation.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl error::Error for ConstraintViolation { }


//------------ check ---------------------------------------------------------

/// Checks a value against the constraints of its type.
///
/// The function walks the value and checks value ranges of INTEGER and
/// ENUMERATED values, size ranges and permitted characters of strings,
/// size ranges of SEQUENCE OF and SET OF values, presence of mandatory
/// members, and any additional check of the type descriptors.
///
/// The first violation is reported to `on_fail` with the descriptor of
/// the offending type, the offending value, and a message. It is then
/// returned as an error.
pub fn check<F>(
    desc: &TypeDescriptor, value: &Value, mut on_fail: F
) -> Result<(), ConstraintViolation>
where F: FnMut(&TypeDescriptor, &Value, fmt::Arguments) {
    Checker { on_fail: &mut on_fail }.check(
        desc, desc.per_constraints(), value
    )
}

/// Checks a value and returns the violation without a callback.
pub fn validate(
    desc: &TypeDescriptor, value: &Value
) -> Result<(), ConstraintViolation> {
    check(desc, value, |_, _, _| { })
}

struct Checker<'a> {
    on_fail: &'a mut dyn FnMut(&TypeDescriptor, &Value, fmt::Arguments),
}

impl Checker<'_> {
    fn fail(
        &mut self, desc: &TypeDescriptor, value: &Value, args: fmt::Arguments
    ) -> Result<(), ConstraintViolation> {
        debug!("constraint check of {} failed: {}", desc.name, args);
        (self.on_fail)(desc, value, args);
        Err(ConstraintViolation {
            type_name: desc.name,
            message: args.to_string(),
        })
    }

    fn check(
        &mut self,
        desc: &TypeDescriptor,
        per: PerConstraints,
        value: &Value
    ) -> Result<(), ConstraintViolation> {
        match (desc.kind, value) {
            (TypeKind::Boolean, Value::Boolean(_)) => { }
            (TypeKind::Null, Value::Null) => { }
            (TypeKind::Integer, Value::Integer(int)) => {
                if !per.value.extensible && !per.value.contains_integer(int) {
                    return self.fail(desc, value, format_args!(
                        "value {} out of range {}", int, per.value
                    ))
                }
            }
            (TypeKind::Enumerated(spec), Value::Enumerated(int)) => {
                if !spec.accepts(*int) {
                    return self.fail(desc, value, format_args!(
                        "unknown enumeration value {}", int
                    ))
                }
            }
            (TypeKind::OctetString(kind), Value::OctetString(octets)) => {
                let chars = match kind.decode_chars(octets.as_slice()) {
                    Ok(chars) => chars,
                    Err(err) => {
                        return self.fail(desc, value, format_args!("{}", err))
                    }
                };
                let size = match kind {
                    StringKind::Octet | StringKind::Utf8 => octets.len(),
                    _ => chars.len()
                };
                if !per.size.extensible && !per.size.contains_size(size) {
                    return self.fail(desc, value, format_args!(
                        "size {} out of range {}", size, per.size
                    ))
                }
                if kind.is_known_multiplier() {
                    if let Some(ch) = chars.iter().find(|&&ch| {
                        !per.permits_char(ch)
                    }) {
                        return self.fail(desc, value, format_args!(
                            "character 0x{:X} not permitted", ch
                        ))
                    }
                }
            }
            (TypeKind::BitString, Value::BitString(bits)) => {
                let size = bits.bit_len();
                if !per.size.extensible && !per.size.contains_size(size) {
                    return self.fail(desc, value, format_args!(
                        "size {} out of range {}", size, per.size
                    ))
                }
            }
            (TypeKind::ObjectIdentifier, Value::Oid(_)) => { }
            (TypeKind::Sequence(spec), Value::Sequence(members))
            | (TypeKind::Set(spec), Value::Sequence(members)) => {
                if members.len() != spec.members.len() {
                    return self.fail(desc, value, format_args!(
                        "expected {} members, found {}",
                        spec.members.len(), members.len()
                    ))
                }
                for (i, (member, slot)) in spec.members.iter().zip(
                    members
                ).enumerate() {
                    match slot {
                        Some(inner) => self.check_member(member, inner)?,
                        None if member.is_optional() || i >= spec.root_len() => {
                        }
                        None => {
                            return self.fail(desc, value, format_args!(
                                "mandatory member {} missing", member.name
                            ))
                        }
                    }
                }
            }
            (TypeKind::SequenceOf(elem), Value::SequenceOf(items)) => {
                self.check_size(desc, value, per, items.len())?;
                for item in items {
                    self.check_member(elem, item)?;
                }
            }
            (TypeKind::SetOf(elem), Value::SetOf(items)) => {
                self.check_size(desc, value, per, items.len())?;
                for item in items {
                    self.check_member(elem, item)?;
                }
            }
            (TypeKind::Choice(spec), Value::Choice(idx, inner)) => {
                match spec.alternatives.get(*idx) {
                    Some(alt) => self.check_member(alt, inner)?,
                    None => {
                        return self.fail(desc, value, format_args!(
                            "invalid alternative {}", idx
                        ))
                    }
                }
            }
            _ => {
                return self.fail(desc, value, format_args!(
                    "value does not match type"
                ))
            }
        }
        if let Some(constraint) = desc.constraint {
            if let Err(err) = constraint(value) {
                return self.fail(desc, value, format_args!("{}", err))
            }
        }
        Ok(())
    }

    fn check_member(
        &mut self, member: &Member, value: &Value
    ) -> Result<(), ConstraintViolation> {
        self.check(member.ty, member.per_constraints(), value)
    }

    fn check_size(
        &mut self,
        desc: &TypeDescriptor,
        value: &Value,
        per: PerConstraints,
        size: usize
    ) -> Result<(), ConstraintViolation> {
        if !per.size.extensible && !per.size.contains_size(size) {
            return self.fail(desc, value, format_args!(
                "size {} out of range {}", size, per.size
            ))
        }
        Ok(())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::containers::SequenceOf;
    use crate::descriptor::{INTEGER, IA5_STRING, NUMERIC_STRING};

    static SMALL: PerConstraints = PerConstraints::value(
        Range::constrained(0, 7)
    );

    static SMALL_INT: TypeDescriptor = TypeDescriptor::new(
        "Small", &[crate::tag::Tag::INTEGER], TypeKind::Integer
    ).with_per(&SMALL);

    static LIST_ELEMENT: Member = Member::new("item", &INTEGER);

    static LIST_SIZE: PerConstraints = PerConstraints::size(
        Range::constrained(1, 2)
    );

    static LIST: TypeDescriptor = TypeDescriptor::new(
        "List", &[crate::tag::Tag::SEQUENCE],
        TypeKind::SequenceOf(&LIST_ELEMENT)
    ).with_per(&LIST_SIZE);

    #[test]
    fn range_bits() {
        assert_eq!(Range::constrained(0, 0).range_bits, Some(0));
        assert_eq!(Range::constrained(0, 1).range_bits, Some(1));
        assert_eq!(Range::constrained(0, 7).range_bits, Some(3));
        assert_eq!(Range::constrained(0, 8).range_bits, Some(4));
        assert_eq!(Range::constrained(-128, 127).range_bits, Some(8));
        assert_eq!(
            Range::constrained(i64::MIN, i64::MAX).range_bits, Some(64)
        );
        assert_eq!(Range::constrained(0, 65535).effective_bits, Some(16));
        assert_eq!(Range::constrained(0, 65536).effective_bits, None);
        assert_eq!(Range::semi(0).range_bits, None);
    }

    #[test]
    fn contains() {
        assert!(Range::constrained(3, 5).contains(3));
        assert!(!Range::constrained(3, 5).contains(6));
        assert!(Range::semi(-2).contains(i64::MAX));
        assert!(!Range::semi(-2).contains(-3));
        assert!(Range::unconstrained().contains(i64::MIN));
        assert!(
            !Range::constrained(0, 7).contains_integer(
                &Integer::from(u64::MAX)
            )
        );
    }

    #[test]
    fn check_integer() {
        assert!(validate(&SMALL_INT, &Value::Integer(5i64.into())).is_ok());
        let mut reported = Vec::new();
        let res = check(&SMALL_INT, &Value::Integer(8i64.into()), |d, _, msg| {
            reported.push(format!("{}: {}", d.name, msg))
        });
        assert!(res.is_err());
        assert_eq!(reported, ["Small: value 8 out of range (0..7)"]);
    }

    #[test]
    fn check_sizes_and_strings() {
        let list = |n: i64| Value::SequenceOf(
            (0..n).map(|i| Value::Integer(i.into())).collect::<SequenceOf<_>>()
        );
        assert!(validate(&LIST, &list(1)).is_ok());
        assert!(validate(&LIST, &list(2)).is_ok());
        assert!(validate(&LIST, &list(3)).is_err());
        assert!(validate(&LIST, &list(0)).is_err());

        assert!(
            validate(&NUMERIC_STRING, &Value::OctetString("12 3".into())).is_ok()
        );
        assert!(
            validate(&NUMERIC_STRING, &Value::OctetString("12a".into())).is_err()
        );
        assert!(
            validate(&IA5_STRING, &Value::OctetString("\u{e9}".into())).is_err()
        );
        assert!(validate(&LIST, &Value::Null).is_err());
    }
}
