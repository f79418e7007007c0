// Copyright 2024 Karpeles Lab Inc.
// Comprehensive tests for sz streams

use std::io::{self, Read, Write as _};

use sz::{decode, encode, Error, Reader, Writer, BLOCK_SIZE, MAGIC_CHUNK};

fn compress(data: &[u8]) -> Vec<u8> {
    let mut writer = Writer::new(Vec::new()).expect("create writer");
    writer.write_all(data).expect("write failed");
    writer.close().expect("close failed")
}

fn decompress(stream: &[u8]) -> io::Result<Vec<u8>> {
    let mut reader = Reader::new(stream)?;
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

fn random_bytes(seed: u32, len: usize) -> Vec<u8> {
    let mut x = seed;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x as u8
        })
        .collect()
}

/// (type, offset of payload, payload length) for every chunk after the signature
fn chunks(stream: &[u8]) -> Vec<(u8, usize, usize)> {
    let mut out = Vec::new();
    let mut s = MAGIC_CHUNK.len();
    while s < stream.len() {
        let len = u32::from_le_bytes([stream[s + 1], stream[s + 2], stream[s + 3], 0]) as usize;
        out.push((stream[s], s + 4, len));
        s += 4 + len;
    }
    out
}

fn sz_error(err: &io::Error) -> Error {
    Error::from_io(err).cloned().expect("not an sz error")
}

#[test]
fn test_round_trip_cases() {
    let test_cases = vec![
        ("empty", Vec::new()),
        ("single_byte", vec![b'x']),
        ("small_text", b"Hello, World!".to_vec()),
        ("repeated", vec![b'a'; 1000]),
        ("pattern", (0..1000).map(|i| (i % 256) as u8).collect()),
        (
            "lorem",
            b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(100),
        ),
        ("multi_block", b"0123456789abcdef".repeat(BLOCK_SIZE / 4)),
    ];

    for (name, data) in test_cases {
        let compressed = encode(&data).unwrap();
        let decompressed =
            decode(&compressed).unwrap_or_else(|_| panic!("{}: block decode failed", name));
        assert_eq!(data, decompressed, "{}: block round-trip failed", name);

        let stream = compress(&data);
        let decompressed = decompress(&stream).unwrap();
        assert_eq!(data, decompressed, "{}: stream round-trip failed", name);
    }
}

#[test]
fn test_empty_stream_is_signature_only() {
    let stream = compress(&[]);
    assert_eq!(stream, MAGIC_CHUNK.to_vec());
    assert_eq!(decompress(&stream).unwrap(), b"");
}

#[test]
fn test_write_splits_do_not_matter() {
    let data = b"Second chunk with more information. ".repeat(5000);
    let whole = compress(&data);

    for piece in [1usize, 7, 4096, BLOCK_SIZE - 1, BLOCK_SIZE + 3] {
        let mut writer = Writer::new(Vec::new()).unwrap();
        for part in data.chunks(piece) {
            writer.write_all(part).unwrap();
        }
        let stream = writer.close().unwrap();
        assert_eq!(stream, whole, "piece size {}", piece);
    }
}

#[test]
fn test_explicit_flushes_still_round_trip() {
    let parts: Vec<Vec<u8>> = vec![
        b"First chunk of data. ".to_vec(),
        b"Second chunk with more information. ".repeat(10),
        vec![b'x'; 1000],
        (0..500).map(|i| (i % 256) as u8).collect(),
    ];

    let mut writer = Writer::new(Vec::new()).unwrap();
    for part in &parts {
        writer.write_all(part).unwrap();
        writer.flush().unwrap();
    }
    let stream = writer.close().unwrap();

    assert_eq!(chunks(&stream).len(), parts.len());
    assert_eq!(decompress(&stream).unwrap(), parts.concat());
}

#[test]
fn test_random_blocks_stored_uncompressed() {
    let data = random_bytes(0x9e3779b9, BLOCK_SIZE * 2 + 500);
    let stream = compress(&data);

    let found = chunks(&stream);
    assert_eq!(found.len(), 3);
    for (chunk_type, _, len) in &found {
        assert_eq!(*chunk_type, 0x01);
        assert!(*len <= BLOCK_SIZE + 4);
    }
    assert_eq!(decompress(&stream).unwrap(), data);
}

#[test]
fn test_compressible_blocks_stored_compressed() {
    let data = b"abcdefgh".repeat(BLOCK_SIZE / 4);
    let stream = compress(&data);

    let found = chunks(&stream);
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|(t, _, len)| *t == 0x00 && *len < 4096));
}

#[test]
fn test_bit_flip_never_yields_wrong_bytes() {
    let data = b"The quick brown fox jumps over the lazy dog. ".repeat(50);
    let stream = compress(&data);
    let (chunk_type, payload, len) = chunks(&stream)[0];
    assert_eq!(chunk_type, 0x00);

    for byte in payload + 4..payload + len {
        for bit in 0..8 {
            let mut corrupt = stream.clone();
            corrupt[byte] ^= 1 << bit;
            if let Ok(out) = decompress(&corrupt) {
                assert_eq!(out, data, "byte {} bit {} decoded to wrong bytes", byte, bit);
            }
        }
    }
}

#[test]
fn test_bit_flip_in_literal_is_checksum_error() {
    let data = b"The quick brown fox jumps over the lazy dog. ".repeat(50);
    let stream = compress(&data);
    let (_, payload, _) = chunks(&stream)[0];

    // Skip the checksum and the block's varint length to reach the first tag.
    let mut tag = payload + 4;
    while stream[tag] & 0x80 != 0 {
        tag += 1;
    }
    tag += 1;
    assert_eq!(stream[tag] & 0x03, 0x00, "block should open with a literal");
    let literal_len = (stream[tag] >> 2) as usize + 1;

    for byte in tag + 1..tag + 1 + literal_len {
        for bit in 0..8 {
            let mut corrupt = stream.clone();
            corrupt[byte] ^= 1 << bit;
            let err = decompress(&corrupt).unwrap_err();
            assert!(
                matches!(sz_error(&err), Error::ChecksumMismatch { .. }),
                "byte {} bit {}",
                byte,
                bit
            );
        }
    }
}

#[test]
fn test_bit_flip_in_raw_chunk_is_checksum_error() {
    let data = random_bytes(7, 300);
    let stream = compress(&data);
    let (chunk_type, payload, len) = chunks(&stream)[0];
    assert_eq!(chunk_type, 0x01);

    for byte in payload + 4..payload + len {
        let mut corrupt = stream.clone();
        corrupt[byte] ^= 0x10;
        let err = decompress(&corrupt).unwrap_err();
        assert!(matches!(sz_error(&err), Error::ChecksumMismatch { .. }));
    }
}

#[test]
fn test_truncation_is_unexpected_eof() {
    let stream = compress(&b"some data worth compressing ".repeat(50));

    for cut in MAGIC_CHUNK.len() + 1..stream.len() {
        let err = decompress(&stream[..cut]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof, "cut at {}", cut);
    }

    for cut in 0..MAGIC_CHUNK.len() {
        let err = Reader::new(&stream[..cut]).err().unwrap();
        assert_eq!(sz_error(&err), Error::UnexpectedEof);
    }
}

#[test]
fn test_wrong_signature() {
    let mut stream = compress(b"payload");
    stream[4] = b'S';
    let err = Reader::new(&stream[..]).err().unwrap();
    assert_eq!(sz_error(&err), Error::FramingCorrupt);
}

#[test]
fn test_strict_reader_accepts_own_output() {
    let data = random_bytes(1234, BLOCK_SIZE * 3);
    let stream = compress(&data);

    let mut reader = Reader::new_strict(&stream[..]).unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_strict_reader_rejects_before_payload() {
    // A source that errors if anything past the chunk header is requested.
    struct Guarded<'a> {
        data: &'a [u8],
        limit: usize,
    }
    impl Read for Guarded<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Ok(0);
            }
            if self.limit == 0 {
                panic!("payload was requested");
            }
            let n = buf.len().min(self.data.len()).min(self.limit);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            self.limit -= n;
            Ok(n)
        }
    }

    let mut stream = MAGIC_CHUNK.to_vec();
    stream.extend_from_slice(&[0x00, 0xff, 0xff, 0xff]);
    stream.extend(vec![0u8; 64]);

    let mut reader = Reader::new_strict(Guarded {
        data: &stream,
        limit: MAGIC_CHUNK.len() + 4,
    })
    .unwrap();
    let err = reader.read(&mut [0u8; 8]).unwrap_err();
    assert!(matches!(
        sz_error(&err),
        Error::StrictMemLimitExceeded { len: 0xffffff, .. }
    ));
}

#[test]
fn test_reader_stops_after_error() {
    let mut stream = compress(b"first block");
    let mut second = Writer::new(Vec::new()).unwrap();
    second.write_all(b"second block").unwrap();
    let second = second.close().unwrap();
    let mut body = second[MAGIC_CHUNK.len()..].to_vec();
    let last = body.len() - 1;
    body[last] ^= 0xff;
    stream.extend_from_slice(&body);
    stream.extend_from_slice(&compress(b"third")[MAGIC_CHUNK.len()..]);

    let mut reader = Reader::new(&stream[..]).unwrap();
    let mut out = Vec::new();
    assert!(reader.read_to_end(&mut out).is_err());
    assert_eq!(out, b"first block");

    let mut buf = [0u8; 32];
    assert!(reader.read(&mut buf).is_err());
    assert!(reader.read(&mut buf).is_err());
}

#[test]
fn test_concatenated_streams() {
    let mut stream = compress(b"one ");
    stream.extend_from_slice(&compress(b"two"));
    assert_eq!(decompress(&stream).unwrap(), b"one two");
}

#[test]
fn test_stream_incremental_read() {
    let data = b"Test data for incremental reading. ".repeat(3000);
    let stream = compress(&data);

    let mut reader = Reader::new(&stream[..]).unwrap();
    let mut decompressed = Vec::new();
    let mut buffer = [0u8; 61];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => decompressed.extend_from_slice(&buffer[..n]),
            Err(e) => panic!("incremental read failed: {}", e),
        }
    }

    assert_eq!(data, decompressed);
}

#[test]
fn test_sink_errors_propagate() {
    struct Broken;
    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let err = Writer::new(Broken).err().unwrap();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}
