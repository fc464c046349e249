#![no_main]

use libfuzzer_sys::fuzz_target;
use asncodec::per;
use asncodec::constraints::{PerConstraints, Range};
use asncodec::descriptor::{
    ChoiceSpec, Member, SequenceSpec, TypeDescriptor, TypeKind, BOOLEAN,
    IA5_STRING, INTEGER, OCTET_STRING,
};
use asncodec::Tag;

static SMALL: PerConstraints = PerConstraints::value(
    Range::constrained(-5, 1000)
);

static ALTS: [Member; 3] = [
    Member::new("number", &INTEGER).implicit(Tag::ctx(0)),
    Member::new("text", &IA5_STRING).implicit(Tag::ctx(1)),
    Member::new("data", &OCTET_STRING).implicit(Tag::ctx(2)),
];

static ALTS_SPEC: ChoiceSpec = ChoiceSpec::extensible(&ALTS, 2);

static ALT: TypeDescriptor = TypeDescriptor::new(
    "Alt", &[], TypeKind::Choice(&ALTS_SPEC)
);

static MEMBERS: [Member; 4] = [
    Member::new("small", &INTEGER).with_per(&SMALL),
    Member::new("flag", &BOOLEAN).implicit(Tag::ctx(0)).optional(),
    Member::new("alt", &ALT).explicit(Tag::ctx(1)),
    Member::new("more", &OCTET_STRING).implicit(Tag::ctx(2)).optional(),
];

static SPEC: SequenceSpec = SequenceSpec::extensible(&MEMBERS, 3);

static RECORD: TypeDescriptor = TypeDescriptor::new(
    "Record", &[Tag::SEQUENCE], TypeKind::Sequence(&SPEC)
);

fuzz_target!(|data: &[u8]| {
    if let Ok((value, _)) = per::decode(&RECORD, data) {
        // Anything decoded must re-encode to something that decodes the
        // same.
        let encoded = per::encode_to_vec(&RECORD, &value).unwrap();
        let (again, _) = per::decode(&RECORD, &encoded).unwrap();
        assert_eq!(again, value);
    }
});
