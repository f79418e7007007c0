// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io;

use thiserror::Error;

/// Result type for sz operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the block codec and the framing reader
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The compressed block is corrupt
    #[error("sz: corrupt input")]
    Corrupt,

    /// The input is longer than a block encoding can describe
    #[error("sz: input too large")]
    TooLarge,

    /// Destination buffer cannot hold the output
    #[error("sz: buffer too small")]
    BufferTooSmall,

    /// Bad stream identifier or a chunk inconsistent with its type
    #[error("sz: snappy framing corrupt")]
    FramingCorrupt,

    /// Chunk type in the reserved unskippable range
    #[error("sz: unexpected chunk type 0x{0:02x}")]
    UnexpectedChunkType(u8),

    /// Recomputed masked checksum disagrees with the stored one
    #[error("sz: CRC mismatch (stored {expected:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// Chunk length above the strict-memory bound
    #[error("sz: oversized chunk in strict-memory-usage mode ({len} > {limit})")]
    StrictMemLimitExceeded { len: usize, limit: usize },

    /// Stream ended in the middle of the signature or a chunk
    #[error("sz: unexpected end of stream")]
    UnexpectedEof,

    /// The underlying source failed earlier with this kind
    #[error("sz: source failed: {0}")]
    Source(io::ErrorKind),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::UnexpectedEof => io::ErrorKind::UnexpectedEof,
            Error::BufferTooSmall | Error::TooLarge => io::ErrorKind::InvalidInput,
            Error::Source(kind) => kind,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

impl Error {
    /// Recover the sz error carried inside an `io::Error`, if there is one.
    pub fn from_io(err: &io::Error) -> Option<&Error> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Error>())
    }
}
