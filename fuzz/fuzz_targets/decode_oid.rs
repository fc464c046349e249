#![no_main]

use std::str::FromStr;
use libfuzzer_sys::fuzz_target;
use asncodec::{ber, Mode, Oid, Value};
use asncodec::descriptor::OBJECT_IDENTIFIER;

fuzz_target!(|data: &[u8]| {
    let _ = Oid::from_content(data.to_vec().into());

    if let Ok((Value::Oid(oid), _)) = ber::decode(
        &OBJECT_IDENTIFIER, Mode::Ber, data
    ) {
        // Whatever decodes must survive the trip through its text form.
        let text = oid.to_string();
        assert_eq!(Oid::from_str(&text).unwrap(), oid);
    }
});
