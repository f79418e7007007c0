// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Stream writer for the Snappy framing format

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::constants::*;
use crate::crc::masked_crc;
use crate::encode::encode_into;

/// Bytes in front of every data chunk body: header plus checksum
pub(crate) const FRAME_PREFIX: usize = CHUNK_HEADER_SIZE + CHECKSUM_SIZE;

/// Scratch space needed to frame one full block in place
pub(crate) const FRAME_SCRATCH_LEN: usize = FRAME_PREFIX + MAX_ENCODED_BLOCK_LEN;

/// Where a framed block ended up after [`frame_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framed {
    /// `scratch[..len]` holds header, checksum and compressed body
    Compressed(usize),
    /// `scratch[..FRAME_PREFIX]` holds header and checksum; the raw block
    /// is the body
    Uncompressed,
}

impl Framed {
    /// Write the framed chunk to `w`.
    pub(crate) fn write_to<W: Write>(self, w: &mut W, scratch: &[u8], block: &[u8]) -> io::Result<()> {
        match self {
            Framed::Compressed(len) => w.write_all(&scratch[..len]),
            Framed::Uncompressed => {
                w.write_all(&scratch[..FRAME_PREFIX])?;
                w.write_all(block)
            }
        }
    }
}

/// Compress `block` into `scratch[FRAME_PREFIX..]` and fill in the chunk
/// header and masked checksum in front of it.
///
/// Falls back to an uncompressed chunk when compression does not shrink
/// the block. `block` must not exceed `BLOCK_SIZE` and `scratch` must be
/// at least `FRAME_SCRATCH_LEN` long.
pub(crate) fn frame_block(block: &[u8], scratch: &mut [u8]) -> io::Result<Framed> {
    let encoded = encode_into(&mut scratch[FRAME_PREFIX..], block)?;

    let (chunk_type, body_len, framed) = if encoded >= block.len() {
        debug!(
            len = block.len(),
            encoded, "block did not compress, storing uncompressed"
        );
        (CHUNK_TYPE_UNCOMPRESSED_DATA, block.len(), Framed::Uncompressed)
    } else {
        (
            CHUNK_TYPE_COMPRESSED_DATA,
            encoded,
            Framed::Compressed(FRAME_PREFIX + encoded),
        )
    };

    let chunk_len = body_len + CHECKSUM_SIZE;
    scratch[0] = chunk_type;
    scratch[1..4].copy_from_slice(&(chunk_len as u32).to_le_bytes()[..3]);
    scratch[4..8].copy_from_slice(&masked_crc(block).to_le_bytes());

    trace!(chunk_type, chunk_len, raw = block.len(), "framed block");
    Ok(framed)
}

/// Writer compresses data into the Snappy framing format
///
/// The stream identifier is written as soon as the writer is created.
/// Input is gathered into 64KB blocks; each full block is compressed and
/// written out immediately. The writer never flushes on drop: call
/// [`Writer::close`] (or `flush`) to emit the final partial block.
///
/// # Example
///
/// ```
/// use sz::Writer;
/// use std::io::Write;
///
/// let mut writer = Writer::new(Vec::new()).unwrap();
/// writer.write_all(b"Hello, World!").unwrap();
/// let compressed = writer.close().unwrap();
///
/// assert_eq!(&compressed[..10], b"\xff\x06\x00\x00sNaPpY");
/// ```
pub struct Writer<W: Write> {
    writer: W,
    block: Box<[u8]>,
    n: usize,
    scratch: Vec<u8>,
}

impl<W: Write> Writer<W> {
    /// Create a new Writer, writing the stream identifier to `writer`.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writer.write_all(MAGIC_CHUNK)?;
        debug!("wrote stream identifier");

        Ok(Writer {
            writer,
            block: vec![0u8; BLOCK_SIZE].into_boxed_slice(),
            n: 0,
            scratch: vec![0u8; FRAME_SCRATCH_LEN],
        })
    }

    /// Compress and write out the buffered block, if any.
    ///
    /// This does not flush the underlying writer. Snappy keeps no context
    /// across blocks, so flushing often hurts the compression ratio. An
    /// empty buffer writes nothing.
    pub fn flush_block(&mut self) -> io::Result<()> {
        if self.n == 0 {
            return Ok(());
        }

        let block = &self.block[..self.n];
        let framed = frame_block(block, &mut self.scratch)?;
        framed.write_to(&mut self.writer, &self.scratch, block)?;

        self.n = 0;
        Ok(())
    }

    /// Write the final block, flush the underlying writer and return it.
    pub fn close(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    /// Number of bytes waiting for the next block flush
    pub fn buffered(&self) -> usize {
        self.n
    }

    /// Get a reference to the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the underlying writer
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;

        while written < buf.len() {
            let copied = (BLOCK_SIZE - self.n).min(buf.len() - written);
            self.block[self.n..self.n + copied].copy_from_slice(&buf[written..written + copied]);
            self.n += copied;
            written += copied;

            if self.n == BLOCK_SIZE {
                self.flush_block()?;
            }
        }

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_block()?;
        self.writer.flush()
    }
}
