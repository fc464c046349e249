//! Round trips of a sample schema through all encoding rules.

use asncodec::{ber, der, per, xer, BitString, Decoded, Mode, Oid, Value};
use asncodec::constraints::{validate, PerConstraints, Range};
use asncodec::descriptor::{
    ChoiceSpec, Member, SequenceSpec, TypeDescriptor, TypeKind, BIT_STRING,
    BOOLEAN, IA5_STRING, INTEGER, NULL, OBJECT_IDENTIFIER, OCTET_STRING,
    PRINTABLE_STRING, UTF8_STRING,
};
use asncodec::{EnumSpec, SequenceOf, SetOf, Tag};
use hex_literal::hex;
use proptest::prelude::*;


//------------ Schema --------------------------------------------------------

static ID_RANGE: PerConstraints = PerConstraints::value(
    Range::constrained(0, 65535)
);

static CODE_CONSTRAINTS: PerConstraints = PerConstraints::new(
    Range::constrained(32, 122), Range::constrained(1, 8)
);

static PRIORITIES: EnumSpec = EnumSpec::extensible(
    &[(0, "low"), (1, "mid"), (2, "high"), (10, "urgent")], 3
);

static PRIORITY: TypeDescriptor = TypeDescriptor::new(
    "Priority", &[Tag::ENUMERATED], TypeKind::Enumerated(&PRIORITIES)
);

static ITEMS_ELEM: Member = Member::new("INTEGER", &INTEGER);

static ITEMS: TypeDescriptor = TypeDescriptor::new(
    "Items", &[Tag::SEQUENCE], TypeKind::SequenceOf(&ITEMS_ELEM)
);

static LABELS_ELEM: Member = Member::new("IA5String", &IA5_STRING);

static LABELS: TypeDescriptor = TypeDescriptor::new(
    "Labels", &[Tag::SET], TypeKind::SetOf(&LABELS_ELEM)
);

static BODY_ALTS: [Member; 3] = [
    Member::new("text", &IA5_STRING).implicit(Tag::ctx(0)),
    Member::new("number", &INTEGER).implicit(Tag::ctx(1)),
    Member::new("nothing", &NULL).implicit(Tag::ctx(2)),
];

static BODY_SPEC: ChoiceSpec = ChoiceSpec::new(&BODY_ALTS);

static BODY: TypeDescriptor = TypeDescriptor::new(
    "Body", &[], TypeKind::Choice(&BODY_SPEC)
);

fn default_flag() -> Value {
    Value::Boolean(false)
}

static MESSAGE_MEMBERS: [Member; 11] = [
    Member::new("id", &INTEGER).with_per(&ID_RANGE),
    Member::new("name", &UTF8_STRING),
    Member::new("code", &PRINTABLE_STRING).with_per(&CODE_CONSTRAINTS),
    Member::new("flag", &BOOLEAN).with_default(default_flag),
    Member::new("priority", &PRIORITY),
    Member::new("data", &OCTET_STRING).implicit(Tag::ctx(0)).optional(),
    Member::new("bits", &BIT_STRING).implicit(Tag::ctx(1)).optional(),
    Member::new("oid", &OBJECT_IDENTIFIER).implicit(Tag::ctx(2)).optional(),
    Member::new("items", &ITEMS).implicit(Tag::ctx(3)),
    Member::new("labels", &LABELS).implicit(Tag::ctx(4)),
    Member::new("body", &BODY).explicit(Tag::ctx(5)),
];

static MESSAGE_SPEC: SequenceSpec = SequenceSpec::new(&MESSAGE_MEMBERS);

static MESSAGE: TypeDescriptor = TypeDescriptor::new(
    "Message", &[Tag::SEQUENCE], TypeKind::Sequence(&MESSAGE_SPEC)
);


//------------ Strategies ----------------------------------------------------

fn oid() -> impl Strategy<Value = Oid> {
    (0u64..3, 0u64..40, prop::collection::vec(0u64..100_000, 0..5)).prop_map(
        |(first, second, rest)| {
            let mut arcs = vec![first, second];
            arcs.extend(rest);
            Oid::from_arcs(&arcs).unwrap()
        }
    )
}

fn bits() -> impl Strategy<Value = BitString> {
    prop::collection::vec(any::<bool>(), 0..40).prop_map(|flags| {
        let mut res = BitString::with_bit_len(flags.len());
        for (idx, flag) in flags.into_iter().enumerate() {
            res.set_bit(idx, flag);
        }
        res
    })
}

fn labels() -> impl Strategy<Value = Value> {
    // Labels of equal length sort the same in DER and canonical XER.
    prop::collection::vec("[a-z]{3}", 0..5).prop_map(|mut labels| {
        labels.sort();
        Value::SetOf(SetOf::from(
            labels.into_iter().map(Value::string).collect::<Vec<_>>()
        ))
    })
}

fn body() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,12}".prop_map(|text| Value::choice(0, Value::string(text))),
        any::<i64>().prop_map(|n| Value::choice(1, Value::integer(n))),
        Just(Value::choice(2, Value::Null)),
    ]
}

prop_compose! {
    fn head()(
        id in 0i64..=65535,
        name in "[a-zA-Z0-9 äöü€<>&]{0,20}",
        code in "[A-Za-z0-9 ]{1,8}",
        flag in any::<bool>(),
        priority in prop::sample::select(vec![0i64, 1, 2, 10]),
    ) -> Vec<Option<Value>> {
        vec![
            Some(Value::integer(id)),
            Some(Value::string(name)),
            Some(Value::string(code)),
            // Decoders fill in the default, so always have the flag.
            Some(Value::Boolean(flag)),
            Some(Value::Enumerated(priority)),
        ]
    }
}

prop_compose! {
    fn message()(
        head in head(),
        data in prop::option::of(prop::collection::vec(any::<u8>(), 0..64)),
        bits in prop::option::of(bits()),
        oid in prop::option::of(oid()),
        items in prop::collection::vec(any::<i64>(), 0..10),
        labels in labels(),
        body in body(),
    ) -> Value {
        let mut slots = head;
        slots.push(data.map(Value::string));
        slots.push(bits.map(Value::BitString));
        slots.push(oid.map(Value::Oid));
        slots.push(Some(Value::SequenceOf(SequenceOf::from(
            items.into_iter().map(Value::integer).collect::<Vec<_>>()
        ))));
        slots.push(Some(labels));
        slots.push(Some(body));
        Value::Sequence(slots)
    }
}


//------------ Properties ----------------------------------------------------

proptest! {
    #[test]
    fn generated_values_are_valid(value in message()) {
        prop_assert!(validate(&MESSAGE, &value).is_ok());
    }

    #[test]
    fn der_round_trip(value in message()) {
        let data = der::encode_to_vec(&MESSAGE, &value).unwrap();
        prop_assert_eq!(data.len(), der::encoded_len(&MESSAGE, &value).unwrap());
        for &mode in &[Mode::Ber, Mode::Der] {
            let (decoded, consumed) = ber::decode(
                &MESSAGE, mode, &data
            ).unwrap();
            prop_assert_eq!(&decoded, &value);
            prop_assert_eq!(consumed, data.len());
        }
    }

    #[test]
    fn der_is_idempotent(value in message()) {
        let data = der::encode_to_vec(&MESSAGE, &value).unwrap();
        let (decoded, _) = ber::decode(&MESSAGE, Mode::Der, &data).unwrap();
        prop_assert_eq!(der::encode_to_vec(&MESSAGE, &decoded).unwrap(), data);
    }

    #[test]
    fn ber_resumes_anywhere(value in message(), split in any::<prop::sample::Index>()) {
        let data = der::encode_to_vec(&MESSAGE, &value).unwrap();
        let split = split.index(data.len());
        let mut decoder = ber::Decoder::new(&MESSAGE, Mode::Ber);
        let consumed = match decoder.decode(&data[..split]).unwrap() {
            Decoded::WantMore { consumed } => consumed,
            Decoded::Complete { .. } => {
                return Err(TestCaseError::fail("complete on partial data"))
            }
        };
        match decoder.decode(&data[consumed..]).unwrap() {
            Decoded::Complete { value: decoded, consumed: rest } => {
                prop_assert_eq!(decoded, value);
                prop_assert_eq!(consumed + rest, data.len());
            }
            Decoded::WantMore { .. } => {
                return Err(TestCaseError::fail("incomplete on full data"))
            }
        }
    }

    #[test]
    fn per_round_trip(value in message()) {
        let data = per::encode_to_vec(&MESSAGE, &value).unwrap();
        let (decoded, consumed) = per::decode(&MESSAGE, &data).unwrap();
        prop_assert_eq!(&decoded, &value);
        prop_assert_eq!(consumed, data.len());
    }

    #[test]
    fn per_wants_more_on_prefix(value in message(), split in any::<prop::sample::Index>()) {
        let data = per::encode_to_vec(&MESSAGE, &value).unwrap();
        let split = split.index(data.len());
        let decoder = per::Decoder::new(&MESSAGE);
        prop_assert_eq!(
            decoder.decode(&data[..split]).unwrap(),
            Decoded::WantMore { consumed: 0 }
        );
    }

    #[test]
    fn xer_round_trip(value in message()) {
        for &flags in &[xer::Flags::Basic, xer::Flags::Canonical] {
            let text = xer::encode_to_string(&MESSAGE, &value, flags).unwrap();
            prop_assert_eq!(&xer::decode(&MESSAGE, &text).unwrap(), &value);
        }
    }
}


//------------ Fixtures ------------------------------------------------------

fn sample() -> Value {
    Value::Sequence(vec![
        Some(Value::integer(5)),
        Some(Value::string("Al")),
        Some(Value::string("X1")),
        Some(Value::Boolean(false)),
        Some(Value::Enumerated(1)),
        None,
        None,
        None,
        Some(Value::SequenceOf(SequenceOf::from(vec![Value::integer(1)]))),
        Some(Value::SetOf(SetOf::from(Vec::new()))),
        Some(Value::choice(1, Value::integer(3))),
    ])
}

const SAMPLE_DER: [u8; 28] = hex!(
    "30 1A 02 01 05 0C 02 41 6C 13 02 58 31 0A 01 01
     A3 03 02 01 01 A4 00 A5 03 81 01 03"
);

#[test]
fn der_fixture() {
    assert_eq!(der::encode_to_vec(&MESSAGE, &sample()).unwrap(), SAMPLE_DER);
    let (value, consumed) = ber::decode(
        &MESSAGE, Mode::Der, &SAMPLE_DER
    ).unwrap();
    assert_eq!(value, sample());
    assert_eq!(consumed, SAMPLE_DER.len());
}

#[test]
fn ber_accepts_what_der_rejects() {
    // The same value with an indefinite length and the default encoded.
    let data = hex!(
        "30 80 02 01 05 0C 02 41 6C 13 02 58 31 01 01 00 0A 01 01
         A3 03 02 01 01 A4 00 A5 03 81 01 03 00 00"
    );
    let (value, consumed) = ber::decode(&MESSAGE, Mode::Ber, &data).unwrap();
    assert_eq!(value, sample());
    assert_eq!(consumed, data.len());
    assert!(ber::decode(&MESSAGE, Mode::Der, &data).is_err());
}

#[test]
fn set_of_order_does_not_matter() {
    let labels = |items: &[&str]| {
        let mut value = match sample() {
            Value::Sequence(slots) => slots,
            _ => unreachable!(),
        };
        value[9] = Some(Value::SetOf(SetOf::from(
            items.iter().map(|item| Value::string(*item)).collect::<Vec<_>>()
        )));
        Value::Sequence(value)
    };
    let sorted = labels(&["ab", "b", "ba"]);
    let shuffled = labels(&["ba", "ab", "b"]);
    assert_eq!(
        der::encode_to_vec(&MESSAGE, &sorted).unwrap(),
        der::encode_to_vec(&MESSAGE, &shuffled).unwrap()
    );
    assert_eq!(
        xer::encode_to_string(&MESSAGE, &sorted, xer::Flags::Canonical)
            .unwrap(),
        xer::encode_to_string(&MESSAGE, &shuffled, xer::Flags::Canonical)
            .unwrap()
    );
}
