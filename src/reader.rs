// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Stream reader for the Snappy framing format

use std::io::{self, Read};

use tracing::{debug, trace, warn};

use crate::constants::*;
use crate::crc::masked_crc;
use crate::decode::{decode_into, decode_len};
use crate::error::Error;

/// Reader decompresses data in the Snappy framing format
///
/// Construction consumes and checks the 10-byte stream identifier. Chunks
/// are then pulled one at a time as the caller drains decoded bytes.
/// Skippable and padding chunks are discarded; every data chunk has its
/// masked CRC-32C verified before any of its bytes are handed out.
///
/// Any error is terminal: later calls to `read` return the same error.
///
/// # Example
///
/// ```
/// use sz::{Reader, Writer};
/// use std::io::{Read, Write};
///
/// let mut writer = Writer::new(Vec::new()).unwrap();
/// writer.write_all(b"Hello, World!").unwrap();
/// let compressed = writer.close().unwrap();
///
/// let mut reader = Reader::new(&compressed[..]).unwrap();
/// let mut decompressed = Vec::new();
/// reader.read_to_end(&mut decompressed).unwrap();
///
/// assert_eq!(decompressed, b"Hello, World!");
/// ```
pub struct Reader<R: Read> {
    reader: R,
    chunk: Vec<u8>,
    decoded: Box<[u8]>,
    pos: usize,
    end: usize,
    strict: bool,
    failed: Option<Error>,
}

impl<R: Read> Reader<R> {
    /// Create a new Reader, checking the stream identifier.
    pub fn new(reader: R) -> io::Result<Self> {
        Self::open(reader, false)
    }

    /// Create a Reader that rejects any chunk larger than this crate's
    /// writer could produce for a worst-case block.
    ///
    /// The framing format allows chunks up to 16MB; the strict bound keeps a
    /// hostile stream from forcing large allocations before any payload has
    /// arrived. Streams written by [`crate::Writer`] always pass.
    pub fn new_strict(reader: R) -> io::Result<Self> {
        Self::open(reader, true)
    }

    fn open(mut reader: R, strict: bool) -> io::Result<Self> {
        let mut magic = [0u8; MAGIC_CHUNK.len()];
        if read_full(&mut reader, &mut magic)? < magic.len() {
            return Err(Error::UnexpectedEof.into());
        }
        if magic != *MAGIC_CHUNK {
            return Err(Error::FramingCorrupt.into());
        }
        debug!(strict, "opened stream");

        Ok(Reader {
            reader,
            chunk: Vec::new(),
            decoded: vec![0u8; BLOCK_SIZE].into_boxed_slice(),
            pos: 0,
            end: 0,
            strict,
            failed: None,
        })
    }

    /// Whether the strict chunk-size bound is enforced
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Get a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwrap the underlying reader, dropping any undelivered bytes
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Pull chunks until one yields decoded bytes.
    /// Returns false at a clean end of stream.
    fn fill(&mut self) -> io::Result<bool> {
        loop {
            let mut header = [0u8; CHUNK_HEADER_SIZE];
            match read_full(&mut self.reader, &mut header)? {
                0 => return Ok(false),
                CHUNK_HEADER_SIZE => {}
                _ => return Err(Error::UnexpectedEof.into()),
            }

            let chunk_type = header[0];
            let len = u32::from_le_bytes([header[1], header[2], header[3], 0]) as usize;
            trace!(chunk_type, len, "chunk header");

            if self.strict && len > STRICT_CHUNK_LIMIT {
                warn!(len, limit = STRICT_CHUNK_LIMIT, "rejecting oversized chunk");
                return Err(Error::StrictMemLimitExceeded {
                    len,
                    limit: STRICT_CHUNK_LIMIT,
                }
                .into());
            }

            if self.chunk.len() < len {
                self.chunk.resize(len, 0);
            }
            if read_full(&mut self.reader, &mut self.chunk[..len])? < len {
                return Err(Error::UnexpectedEof.into());
            }
            let payload = &self.chunk[..len];

            let n = match chunk_type {
                CHUNK_TYPE_COMPRESSED_DATA => {
                    if len < CHECKSUM_SIZE {
                        return Err(Error::FramingCorrupt.into());
                    }
                    let body = &payload[CHECKSUM_SIZE..];
                    match decode_len(body) {
                        Ok((dlen, _)) if dlen <= BLOCK_SIZE => {}
                        _ => return Err(Error::FramingCorrupt.into()),
                    }
                    decode_into(&mut self.decoded[..], body)?
                }
                CHUNK_TYPE_UNCOMPRESSED_DATA => {
                    if len < CHECKSUM_SIZE || len > BLOCK_SIZE + CHECKSUM_SIZE {
                        return Err(Error::FramingCorrupt.into());
                    }
                    let body = &payload[CHECKSUM_SIZE..];
                    self.decoded[..body.len()].copy_from_slice(body);
                    body.len()
                }
                CHUNK_TYPE_STREAM_IDENTIFIER => {
                    if payload != MAGIC_BODY {
                        return Err(Error::FramingCorrupt.into());
                    }
                    continue;
                }
                CHUNK_TYPE_FIRST_SKIPPABLE..=CHUNK_TYPE_PADDING => {
                    debug!(chunk_type, len, "skipped chunk");
                    continue;
                }
                _ => return Err(Error::UnexpectedChunkType(chunk_type).into()),
            };

            let expected = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            let computed = masked_crc(&self.decoded[..n]);
            if expected != computed {
                warn!(expected, computed, "chunk checksum mismatch");
                return Err(Error::ChecksumMismatch { expected, computed }.into());
            }

            self.pos = 0;
            self.end = n;
            if n > 0 {
                return Ok(true);
            }
        }
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = &self.failed {
            return Err(err.clone().into());
        }
        if buf.is_empty() {
            return Ok(0);
        }

        if self.pos == self.end {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return Ok(0),
                Err(err) => {
                    let sticky = Error::from_io(&err)
                        .cloned()
                        .unwrap_or(Error::Source(err.kind()));
                    self.failed = Some(sticky);
                    return Err(err);
                }
            }
        }

        let copied = (self.end - self.pos).min(buf.len());
        buf[..copied].copy_from_slice(&self.decoded[self.pos..self.pos + copied]);
        self.pos += copied;

        Ok(copied)
    }
}

/// Read until `buf` is full or the source is exhausted.
/// Returns how many bytes arrived.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
