//! Generates the content octets of object identifiers.
//!
//! Provide a sequence of object identifiers in ‘dot integer’ notation and
//! you will receive the octet array of the DER content for each of them.
//! This is handy for defining object identifier constants.

use std::env;
use std::process;
use std::str::FromStr;
use asncodec::Oid;

fn process_one(arg: &str) -> Result<String, String> {
    let oid = Oid::from_str(arg).map_err(|err| err.to_string())?;
    let octets: Vec<_> = oid.as_slice().iter().map(|octet| {
        octet.to_string()
    }).collect();
    Ok(format!("[{}]", octets.join(", ")))
}

fn main() {
    let mut failed = false;
    for arg in env::args().skip(1) {
        match process_one(&arg) {
            Ok(octets) => println!("{}", octets),
            Err(err) => {
                eprintln!("{}: {}.", arg, err);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1)
    }
}
