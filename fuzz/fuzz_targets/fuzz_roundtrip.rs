#![no_main]

use libfuzzer_sys::fuzz_target;
use sz::{decode, encode, max_encoded_len};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 {
        return;
    }

    let compressed = encode(data).expect("encode failed");
    assert!(compressed.len() <= max_encoded_len(data.len()).unwrap());

    let decompressed = decode(&compressed).expect("decode failed");
    assert_eq!(data, &decompressed[..], "roundtrip failed");
});
