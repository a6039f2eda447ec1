#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pgasync_types::{Oid, ValueCodec};

/// Fuzz input combining a type OID with raw bytes.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    oid: u32,
    null: bool,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let codec = ValueCodec::new();
    let oid = Oid::from_code(input.oid);
    let raw = (!input.null).then_some(input.data.as_slice());

    // Decoding must fail cleanly, never panic
    let Ok(value) = codec.decode_value(oid, raw) else {
        return;
    };

    // Whatever decoded must encode again
    let _ = codec.encode(&value);
});
