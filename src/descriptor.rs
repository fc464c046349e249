//! Type descriptors.
//!
//! A type descriptor is the static description of an ASN.1 type that the
//! encoding rule drivers walk when encoding or decoding a [`Value`]. A
//! schema is a set of `static` descriptors referring to each other. Since
//! they are never changed, they can be shared freely between threads.
//!
//! A descriptor for a structured type is built from its members:
//!
//! ```
//! use asncodec::descriptor::{
//!     Member, SequenceSpec, TypeDescriptor, TypeKind, INTEGER, UTF8_STRING
//! };
//! use asncodec::Tag;
//!
//! static PERSON_MEMBERS: [Member; 2] = [
//!     Member::new("name", &UTF8_STRING),
//!     Member::new("age", &INTEGER).implicit(Tag::ctx(0)).optional(),
//! ];
//!
//! static PERSON_SPEC: SequenceSpec = SequenceSpec::new(&PERSON_MEMBERS);
//!
//! static PERSON: TypeDescriptor = TypeDescriptor::new(
//!     "Person", &[Tag::SEQUENCE], TypeKind::Sequence(&PERSON_SPEC),
//! );
//! # let _ = &PERSON;
//! ```
//!
//! [`Value`]: crate::value::Value

use std::fmt;
use smallvec::{SmallVec, smallvec};
use crate::constraints::PerConstraints;
use crate::decode::ContentError;
use crate::enumerated::EnumSpec;
use crate::string::StringKind;
use crate::tag::Tag;
use crate::value::Value;


//------------ TagChain ------------------------------------------------------

/// The full chain of tags of a type, outermost first.
pub type TagChain = SmallVec<[Tag; 4]>;


//------------ TypeDescriptor ------------------------------------------------

/// The description of an ASN.1 type.
pub struct TypeDescriptor {
    /// The name of the type.
    pub name: &'static str,

    /// The name of the XML element for a value of this type.
    pub xml_tag: &'static str,

    /// The full chain of tags, outermost first.
    ///
    /// All but the last tag are explicit tags. For a CHOICE, all tags are
    /// explicit and the chain of an untagged CHOICE is empty.
    pub tags: &'static [Tag],

    /// What kind of type this is.
    pub kind: TypeKind,

    /// The PER-visible constraints of the type.
    pub per: Option<&'static PerConstraints>,

    /// An additional check for values of the type.
    pub constraint: Option<fn(&Value) -> Result<(), ContentError>>,
}

impl TypeDescriptor {
    /// Creates a new descriptor.
    ///
    /// The XML tag is the type’s name.
    pub const fn new(
        name: &'static str, tags: &'static [Tag], kind: TypeKind
    ) -> Self {
        TypeDescriptor {
            name, xml_tag: name, tags, kind, per: None, constraint: None
        }
    }

    /// Returns the descriptor with different PER-visible constraints.
    pub const fn with_per(self, per: &'static PerConstraints) -> Self {
        TypeDescriptor { per: Some(per), ..self }
    }

    /// Returns the descriptor with a different XML tag.
    pub const fn with_xml_tag(self, xml_tag: &'static str) -> Self {
        TypeDescriptor { xml_tag, ..self }
    }

    /// Returns the descriptor with an additional value check.
    pub const fn with_constraint(
        self, check: fn(&Value) -> Result<(), ContentError>
    ) -> Self {
        TypeDescriptor { constraint: Some(check), ..self }
    }

    /// Returns whether values of the type use the constructed encoding.
    ///
    /// This is about the innermost tag. Strings are primitive in DER.
    pub fn is_constructed(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Sequence(_) | TypeKind::Set(_) |
            TypeKind::SequenceOf(_) | TypeKind::SetOf(_) |
            TypeKind::Choice(_)
        )
    }

    /// Returns whether the type is a CHOICE.
    pub fn is_choice(&self) -> bool {
        matches!(self.kind, TypeKind::Choice(_))
    }

    /// Returns the number of leading tags that are explicit wrappers.
    pub fn explicit_count(chain: &[Tag], ty: &TypeDescriptor) -> usize {
        if ty.is_choice() {
            chain.len()
        }
        else {
            chain.len().saturating_sub(1)
        }
    }

    /// Returns the effective tag chain of a member.
    ///
    /// An IMPLICIT tag replaces the outermost tag of the member’s type, an
    /// EXPLICIT tag is prepended. Since an untagged CHOICE has no tag to
    /// replace, an IMPLICIT tag on it is applied as EXPLICIT.
    pub fn effective_tags(member: &Member) -> TagChain {
        let ty = member.ty;
        match member.tag {
            None => ty.tags.iter().copied().collect(),
            Some(tag) => {
                let mut res: TagChain = smallvec![tag];
                match member.mode {
                    TagMode::Implicit if !ty.tags.is_empty() => {
                        res.extend(ty.tags.iter().skip(1).copied())
                    }
                    _ => res.extend(ty.tags.iter().copied())
                }
                res
            }
        }
    }

    /// Returns whether a value of this type may start with `tag`.
    ///
    /// For a type with tags, this is the outermost tag. For an untagged
    /// CHOICE, it is any of the outermost tags of its alternatives.
    pub fn matches_outer_tag(&self, tag: Tag) -> bool {
        match self.tags.first() {
            Some(first) => *first == tag,
            None => match self.kind {
                TypeKind::Choice(spec) => spec.select(tag).is_some(),
                // An untagged non-CHOICE type can’t appear on the wire.
                _ => false
            }
        }
    }

    /// Returns the smallest outermost tag of the type.
    ///
    /// This is used for ordering SET members canonically.
    pub fn least_outer_tag(&self) -> Option<Tag> {
        match self.tags.first() {
            Some(first) => Some(*first),
            None => match self.kind {
                TypeKind::Choice(spec) => {
                    spec.alternatives.iter().filter_map(|alt| {
                        alt.least_outer_tag()
                    }).min()
                }
                _ => None
            }
        }
    }

    /// Returns the PER constraints of the type.
    pub fn per_constraints(&self) -> PerConstraints {
        self.per.copied().unwrap_or_default()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("kind", &self.kind)
            .finish()
    }
}


//------------ TypeKind ------------------------------------------------------

/// The family of an ASN.1 type.
///
/// The kind selects how the drivers encode and decode a value and carries
/// any family specific information.
#[derive(Clone, Copy, Debug)]
pub enum TypeKind {
    /// BOOLEAN.
    Boolean,

    /// NULL.
    Null,

    /// INTEGER of arbitrary size.
    Integer,

    /// ENUMERATED with the given items.
    Enumerated(&'static EnumSpec),

    /// OCTET STRING or one of the character string types.
    OctetString(StringKind),

    /// BIT STRING.
    BitString,

    /// OBJECT IDENTIFIER.
    ObjectIdentifier,

    /// SEQUENCE with the given members.
    Sequence(&'static SequenceSpec),

    /// SET with the given members.
    Set(&'static SequenceSpec),

    /// SEQUENCE OF the given element.
    SequenceOf(&'static Member),

    /// SET OF the given element.
    SetOf(&'static Member),

    /// CHOICE between the given alternatives.
    Choice(&'static ChoiceSpec),
}


//------------ TagMode -------------------------------------------------------

/// How a member’s tag is applied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TagMode {
    /// The tag replaces the outermost tag of the type.
    Implicit,

    /// The tag is added in front of the type’s tags.
    Explicit,
}


//------------ Member --------------------------------------------------------

/// A member of a SEQUENCE or SET, an alternative of a CHOICE, or the
/// element of a SEQUENCE OF or SET OF.
pub struct Member {
    /// The name of the member.
    pub name: &'static str,

    /// The member’s own tag, if it has one.
    pub tag: Option<Tag>,

    /// How the member’s own tag is applied.
    pub mode: TagMode,

    /// Whether the member is OPTIONAL.
    pub optional: bool,

    /// The DEFAULT value of the member.
    pub default: Option<fn() -> Value>,

    /// The type of the member.
    pub ty: &'static TypeDescriptor,

    /// PER-visible constraints replacing those of the type.
    pub per: Option<&'static PerConstraints>,
}

impl Member {
    /// Creates a new untagged, mandatory member.
    pub const fn new(name: &'static str, ty: &'static TypeDescriptor) -> Self {
        Member {
            name, tag: None, mode: TagMode::Implicit, optional: false,
            default: None, ty, per: None
        }
    }

    /// Returns the member with an IMPLICIT tag.
    pub const fn implicit(self, tag: Tag) -> Self {
        Member { tag: Some(tag), mode: TagMode::Implicit, ..self }
    }

    /// Returns the member with an EXPLICIT tag.
    pub const fn explicit(self, tag: Tag) -> Self {
        Member { tag: Some(tag), mode: TagMode::Explicit, ..self }
    }

    /// Returns the member marked as OPTIONAL.
    pub const fn optional(self) -> Self {
        Member { optional: true, ..self }
    }

    /// Returns the member with a DEFAULT value.
    pub const fn with_default(self, default: fn() -> Value) -> Self {
        Member { default: Some(default), ..self }
    }

    /// Returns the member with its own PER-visible constraints.
    pub const fn with_per(self, per: &'static PerConstraints) -> Self {
        Member { per: Some(per), ..self }
    }

    /// Returns whether the member may be absent from the encoding.
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }

    /// Returns whether `value` is the member’s default value.
    pub fn is_default(&self, value: &Value) -> bool {
        match self.default {
            Some(default) => default() == *value,
            None => false
        }
    }

    /// Returns the effective PER constraints of the member.
    pub fn per_constraints(&self) -> PerConstraints {
        self.per.or(self.ty.per).copied().unwrap_or_default()
    }

    /// Returns the effective tag chain of the member.
    pub fn tags(&self) -> TagChain {
        TypeDescriptor::effective_tags(self)
    }

    /// Returns whether the member’s encoding may start with `tag`.
    pub fn matches_outer_tag(&self, tag: Tag) -> bool {
        match self.tag {
            Some(own) => own == tag,
            None => self.ty.matches_outer_tag(tag)
        }
    }

    /// Returns the smallest outermost tag of the member.
    pub fn least_outer_tag(&self) -> Option<Tag> {
        match self.tag {
            Some(own) => Some(own),
            None => self.ty.least_outer_tag()
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("mode", &self.mode)
            .field("optional", &self.optional)
            .field("ty", &self.ty.name)
            .finish()
    }
}


//------------ SequenceSpec --------------------------------------------------

/// The members of a SEQUENCE or SET.
#[derive(Debug)]
pub struct SequenceSpec {
    /// The members in order of definition.
    pub members: &'static [Member],

    /// The index of the first member after the extension marker.
    ///
    /// If this is `None`, the type isn’t extensible. Members from this
    /// index on are extension additions.
    pub extension: Option<usize>,
}

impl SequenceSpec {
    /// Creates a non-extensible member list.
    pub const fn new(members: &'static [Member]) -> Self {
        SequenceSpec { members, extension: None }
    }

    /// Creates an extensible member list.
    ///
    /// The first `root` members form the extension root.
    pub const fn extensible(members: &'static [Member], root: usize) -> Self {
        SequenceSpec { members, extension: Some(root) }
    }

    /// Returns the number of members in the extension root.
    pub fn root_len(&self) -> usize {
        self.extension.unwrap_or(self.members.len())
    }

    /// Returns the members of the extension root.
    pub fn root(&self) -> &'static [Member] {
        let members = self.members;
        members.get(..self.root_len()).unwrap_or(members)
    }

    /// Returns the extension additions.
    pub fn additions(&self) -> &'static [Member] {
        let members = self.members;
        members.get(self.root_len()..).unwrap_or(&[])
    }
}


//------------ ChoiceSpec ----------------------------------------------------

/// The alternatives of a CHOICE.
#[derive(Debug)]
pub struct ChoiceSpec {
    /// The alternatives in order of definition.
    pub alternatives: &'static [Member],

    /// The index of the first alternative after the extension marker.
    pub extension: Option<usize>,
}

impl ChoiceSpec {
    /// Creates a non-extensible CHOICE.
    pub const fn new(alternatives: &'static [Member]) -> Self {
        ChoiceSpec { alternatives, extension: None }
    }

    /// Creates an extensible CHOICE with `root` alternatives in the root.
    pub const fn extensible(
        alternatives: &'static [Member], root: usize
    ) -> Self {
        ChoiceSpec { alternatives, extension: Some(root) }
    }

    /// Returns the number of alternatives in the extension root.
    pub fn root_len(&self) -> usize {
        self.extension.unwrap_or(self.alternatives.len())
    }

    /// Returns the alternatives of the extension root.
    pub fn root(&self) -> &'static [Member] {
        let alternatives = self.alternatives;
        alternatives.get(..self.root_len()).unwrap_or(alternatives)
    }

    /// Returns the alternatives added as extensions.
    pub fn additions(&self) -> &'static [Member] {
        let alternatives = self.alternatives;
        alternatives.get(self.root_len()..).unwrap_or(&[])
    }

    /// Returns the index of the alternative whose encoding starts with
    /// `tag`.
    pub fn select(&self, tag: Tag) -> Option<usize> {
        self.alternatives.iter().position(|alt| alt.matches_outer_tag(tag))
    }
}


//------------ Built-in Types ------------------------------------------------

/// The BOOLEAN type.
pub static BOOLEAN: TypeDescriptor = TypeDescriptor::new(
    "BOOLEAN", &[Tag::BOOLEAN], TypeKind::Boolean
);

/// The NULL type.
pub static NULL: TypeDescriptor = TypeDescriptor::new(
    "NULL", &[Tag::NULL], TypeKind::Null
);

/// The unconstrained INTEGER type.
pub static INTEGER: TypeDescriptor = TypeDescriptor::new(
    "INTEGER", &[Tag::INTEGER], TypeKind::Integer
);

/// The OCTET STRING type.
pub static OCTET_STRING: TypeDescriptor = TypeDescriptor::new(
    "OCTET STRING", &[Tag::OCTET_STRING],
    TypeKind::OctetString(StringKind::Octet)
).with_xml_tag("OCTET_STRING");

/// The BIT STRING type.
pub static BIT_STRING: TypeDescriptor = TypeDescriptor::new(
    "BIT STRING", &[Tag::BIT_STRING], TypeKind::BitString
).with_xml_tag("BIT_STRING");

/// The OBJECT IDENTIFIER type.
pub static OBJECT_IDENTIFIER: TypeDescriptor = TypeDescriptor::new(
    "OBJECT IDENTIFIER", &[Tag::OID], TypeKind::ObjectIdentifier
).with_xml_tag("OBJECT_IDENTIFIER");

/// The UTF8String type.
pub static UTF8_STRING: TypeDescriptor = TypeDescriptor::new(
    "UTF8String", &[Tag::UTF8_STRING], TypeKind::OctetString(StringKind::Utf8)
);

/// The IA5String type.
pub static IA5_STRING: TypeDescriptor = TypeDescriptor::new(
    "IA5String", &[Tag::IA5_STRING], TypeKind::OctetString(StringKind::Ia5)
).with_per(&PerConstraints::IA5_STRING);

/// The PrintableString type.
pub static PRINTABLE_STRING: TypeDescriptor = TypeDescriptor::new(
    "PrintableString", &[Tag::PRINTABLE_STRING],
    TypeKind::OctetString(StringKind::Printable)
).with_per(&PerConstraints::PRINTABLE_STRING);

/// The NumericString type.
pub static NUMERIC_STRING: TypeDescriptor = TypeDescriptor::new(
    "NumericString", &[Tag::NUMERIC_STRING],
    TypeKind::OctetString(StringKind::Numeric)
).with_per(&PerConstraints::NUMERIC_STRING);

/// The VisibleString type.
pub static VISIBLE_STRING: TypeDescriptor = TypeDescriptor::new(
    "VisibleString", &[Tag::VISIBLE_STRING],
    TypeKind::OctetString(StringKind::Visible)
).with_per(&PerConstraints::VISIBLE_STRING);

/// The BMPString type.
pub static BMP_STRING: TypeDescriptor = TypeDescriptor::new(
    "BMPString", &[Tag::BMP_STRING], TypeKind::OctetString(StringKind::Bmp)
);

/// The UniversalString type.
pub static UNIVERSAL_STRING: TypeDescriptor = TypeDescriptor::new(
    "UniversalString", &[Tag::UNIVERSAL_STRING],
    TypeKind::OctetString(StringKind::Universal)
);


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    static CHOICE_ALTS: [Member; 2] = [
        Member::new("number", &INTEGER),
        Member::new("text", &UTF8_STRING).implicit(Tag::ctx(3)),
    ];

    static CHOICE_SPEC: ChoiceSpec = ChoiceSpec::new(&CHOICE_ALTS);

    static CHOICE: TypeDescriptor = TypeDescriptor::new(
        "Alt", &[], TypeKind::Choice(&CHOICE_SPEC)
    );

    #[test]
    fn effective_tags() {
        let plain = Member::new("a", &INTEGER);
        assert_eq!(plain.tags().as_slice(), [Tag::INTEGER]);

        let implicit = Member::new("a", &INTEGER).implicit(Tag::ctx(0));
        assert_eq!(implicit.tags().as_slice(), [Tag::ctx(0)]);

        let explicit = Member::new("a", &INTEGER).explicit(Tag::ctx(0));
        assert_eq!(explicit.tags().as_slice(), [Tag::ctx(0), Tag::INTEGER]);

        let choice = Member::new("c", &CHOICE);
        assert!(choice.tags().is_empty());

        let implicit_choice = Member::new("c", &CHOICE).implicit(Tag::ctx(1));
        assert_eq!(implicit_choice.tags().as_slice(), [Tag::ctx(1)]);
        assert_eq!(
            TypeDescriptor::explicit_count(&implicit_choice.tags(), &CHOICE),
            1
        );
    }

    #[test]
    fn choice_tags() {
        assert!(CHOICE.matches_outer_tag(Tag::INTEGER));
        assert!(CHOICE.matches_outer_tag(Tag::ctx(3)));
        assert!(!CHOICE.matches_outer_tag(Tag::UTF8_STRING));
        assert_eq!(CHOICE.least_outer_tag(), Some(Tag::INTEGER));
        if let TypeKind::Choice(spec) = CHOICE.kind {
            assert_eq!(spec.select(Tag::ctx(3)), Some(1));
            assert_eq!(spec.select(Tag::NULL), None);
        }
    }

    #[test]
    fn sequence_spec_split() {
        static MEMBERS: [Member; 3] = [
            Member::new("a", &INTEGER),
            Member::new("b", &BOOLEAN),
            Member::new("c", &NULL).optional(),
        ];
        let spec = SequenceSpec::extensible(&MEMBERS, 2);
        assert_eq!(spec.root().len(), 2);
        assert_eq!(spec.additions().len(), 1);
        assert_eq!(spec.additions()[0].name, "c");
        assert_eq!(SequenceSpec::new(&MEMBERS).additions().len(), 0);
    }
}
