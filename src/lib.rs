// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! # sz
//!
//! A Snappy block compressor paired with a reader and writer for the
//! Snappy framing format.
//!
//! - Block format: a varint length followed by literal and copy tags,
//!   produced by a greedy single-hash-table match finder
//! - Stream format: 64KB blocks framed as chunks with masked CRC-32C
//!   checksums, stored raw when compression does not help
//! - Strict-memory reading for untrusted streams
//!
//! ## Block Format Example
//!
//! ```rust
//! use sz::{decode, encode};
//!
//! let data = b"Hello, World! Hello, World! Hello, World!";
//! let compressed = encode(data).expect("compression failed");
//! let decompressed = decode(&compressed).expect("decompression failed");
//! assert_eq!(data, &decompressed[..]);
//! ```
//!
//! ## Stream Format Example
//!
//! ```rust
//! use sz::{Reader, Writer};
//! use std::io::{Read, Write};
//!
//! let mut writer = Writer::new(Vec::new()).unwrap();
//! writer.write_all(b"streamed bytes").unwrap();
//! let stream = writer.close().unwrap();
//!
//! let mut reader = Reader::new_strict(&stream[..]).unwrap();
//! let mut out = Vec::new();
//! reader.read_to_end(&mut out).unwrap();
//! assert_eq!(out, b"streamed bytes");
//! ```

mod constants;
mod crc;
mod decode;
mod encode;
mod error;
mod reader;
mod varint;
mod writer;

#[cfg(feature = "concurrent")]
mod concurrent;

pub use constants::{BLOCK_SIZE, MAGIC_CHUNK, MAX_ENCODED_BLOCK_LEN, STRICT_CHUNK_LIMIT};
pub use crc::{crc32c, masked_crc, Crc32c};
pub use decode::{decode, decode_into, decode_len};
pub use encode::{encode, encode_into, max_encoded_len};
pub use error::{Error, Result};
pub use reader::Reader;
pub use writer::Writer;

#[cfg(feature = "concurrent")]
pub use concurrent::ConcurrentWriter;
