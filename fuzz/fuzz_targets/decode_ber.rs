#![no_main]

use libfuzzer_sys::fuzz_target;
use asncodec::{ber, der, Mode};
use asncodec::descriptor::{
    Member, SequenceSpec, TypeDescriptor, TypeKind, BIT_STRING, BOOLEAN,
    INTEGER, OBJECT_IDENTIFIER, OCTET_STRING, UTF8_STRING,
};
use asncodec::Tag;

static MEMBERS: [Member; 6] = [
    Member::new("int", &INTEGER),
    Member::new("flag", &BOOLEAN).optional(),
    Member::new("data", &OCTET_STRING).implicit(Tag::ctx(0)).optional(),
    Member::new("bits", &BIT_STRING).explicit(Tag::ctx(1)).optional(),
    Member::new("text", &UTF8_STRING).optional(),
    Member::new("oid", &OBJECT_IDENTIFIER).optional(),
];

static SPEC: SequenceSpec = SequenceSpec::new(&MEMBERS);

static RECORD: TypeDescriptor = TypeDescriptor::new(
    "Record", &[Tag::SEQUENCE], TypeKind::Sequence(&SPEC)
);

static LIST_ELEM: Member = Member::new("record", &RECORD);

static LIST: TypeDescriptor = TypeDescriptor::new(
    "List", &[Tag::SEQUENCE], TypeKind::SequenceOf(&LIST_ELEM)
);

fuzz_target!(|data: &[u8]| {
    let ber = ber::decode(&LIST, Mode::Ber, data);
    if let Ok((value, _)) = ber {
        // Anything decoded must re-encode and decode as DER.
        let encoded = der::encode_to_vec(&LIST, &value).unwrap();
        let (again, _) = ber::decode(&LIST, Mode::Der, &encoded).unwrap();
        assert_eq!(again, value);
    }
    let _ = ber::decode(&LIST, Mode::Der, data);
});
