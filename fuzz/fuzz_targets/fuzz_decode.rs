#![no_main]

use libfuzzer_sys::fuzz_target;
use sz::decode;

fuzz_target!(|data: &[u8]| {
    // Arbitrary blocks must decode or fail, never panic
    let _ = decode(data);
});
