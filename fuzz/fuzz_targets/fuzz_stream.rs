#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::{Read, Write};
use sz::{Reader, Writer, MAGIC_CHUNK};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000_000 {
        return;
    }

    let mut writer = Writer::new(Vec::new()).expect("create failed");
    writer.write_all(data).expect("write failed");
    let compressed = writer.close().expect("close failed");

    let mut reader = Reader::new_strict(&compressed[..]).expect("open failed");
    let mut decompressed = Vec::new();
    reader.read_to_end(&mut decompressed).expect("read failed");
    assert_eq!(data, &decompressed[..], "stream roundtrip failed");

    // Arbitrary chunk sequences behind a valid signature must not panic
    let mut hostile = MAGIC_CHUNK.to_vec();
    hostile.extend_from_slice(data);
    if let Ok(mut reader) = Reader::new_strict(&hostile[..]) {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
    }
});
