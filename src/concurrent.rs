// Copyright 2024 Karpeles Lab Inc.
// Concurrent compression support using Rayon

use std::io::{self, Write};

use rayon::prelude::*;
use tracing::debug;

use crate::constants::*;
use crate::writer::{frame_block, Framed, FRAME_SCRATCH_LEN};

/// Concurrent writer that compresses blocks in parallel
///
/// Full 64KB blocks are collected until `concurrency` of them are waiting,
/// then compressed together on the Rayon pool and written in input order.
/// Blocks are independent, so the output is byte-for-byte what
/// [`crate::Writer`] produces for the same writes and flushes.
///
/// Like `Writer`, nothing is flushed on drop; call [`ConcurrentWriter::close`].
///
/// # Example
///
/// ```
/// use sz::ConcurrentWriter;
/// use std::io::Write;
///
/// let mut writer = ConcurrentWriter::new(Vec::new(), 4).unwrap();
/// writer.write_all(&vec![0u8; 1024 * 1024]).unwrap();
/// let compressed = writer.close().unwrap();
/// assert!(compressed.len() < 1024 * 1024);
/// ```
pub struct ConcurrentWriter<W: Write> {
    writer: W,
    blocks: Vec<Vec<u8>>,
    scratch: Vec<Vec<u8>>,
    used: usize,
    concurrency: usize,
}

impl<W: Write> ConcurrentWriter<W> {
    /// Create a new concurrent writer with `concurrency` blocks per batch,
    /// writing the stream identifier immediately.
    pub fn new(mut writer: W, concurrency: usize) -> io::Result<Self> {
        writer.write_all(MAGIC_CHUNK)?;
        let concurrency = concurrency.max(1);
        debug!(concurrency, "wrote stream identifier");

        Ok(ConcurrentWriter {
            writer,
            blocks: Vec::with_capacity(concurrency),
            scratch: Vec::with_capacity(concurrency),
            used: 0,
            concurrency,
        })
    }

    /// Compress and write every pending block, including a partial last one.
    pub fn flush_blocks(&mut self) -> io::Result<()> {
        let used = self.used;
        if used == 0 {
            return Ok(());
        }

        let framed: Vec<io::Result<Framed>> = self.blocks[..used]
            .par_iter()
            .zip(self.scratch[..used].par_iter_mut())
            .map(|(block, scratch)| frame_block(block, scratch))
            .collect();

        for (i, framed) in framed.into_iter().enumerate() {
            framed?.write_to(&mut self.writer, &self.scratch[i], &self.blocks[i])?;
        }

        for block in &mut self.blocks[..used] {
            block.clear();
        }
        self.used = 0;
        Ok(())
    }

    /// Write pending blocks, flush the underlying writer and return it.
    pub fn close(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    /// Get a reference to the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> Write for ConcurrentWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut remaining = buf;

        while !remaining.is_empty() {
            if self.used == 0 || self.blocks[self.used - 1].len() == BLOCK_SIZE {
                if self.used == self.blocks.len() {
                    self.blocks.push(Vec::with_capacity(BLOCK_SIZE));
                    self.scratch.push(vec![0u8; FRAME_SCRATCH_LEN]);
                }
                self.used += 1;
            }

            let block = &mut self.blocks[self.used - 1];
            let take = (BLOCK_SIZE - block.len()).min(remaining.len());
            block.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];

            if block.len() == BLOCK_SIZE && self.used == self.concurrency {
                self.flush_blocks()?;
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_blocks()?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reader, Writer};
    use std::io::Read;

    fn mixed_data(len: usize) -> Vec<u8> {
        let mut x = 7u32;
        (0..len)
            .map(|i| {
                if (i / 5000) % 2 == 0 {
                    (i % 13) as u8
                } else {
                    x = x.wrapping_mul(1103515245).wrapping_add(12345);
                    (x >> 16) as u8
                }
            })
            .collect()
    }

    #[test]
    fn test_matches_serial_writer() {
        let data = mixed_data(BLOCK_SIZE * 5 + 1234);

        let mut serial = Writer::new(Vec::new()).unwrap();
        serial.write_all(&data).unwrap();
        let serial = serial.close().unwrap();

        let mut concurrent = ConcurrentWriter::new(Vec::new(), 3).unwrap();
        for piece in data.chunks(10_000) {
            concurrent.write_all(piece).unwrap();
        }
        let concurrent = concurrent.close().unwrap();

        assert_eq!(serial, concurrent);
    }

    #[test]
    fn test_roundtrip() {
        let data = mixed_data(BLOCK_SIZE * 4);
        let mut writer = ConcurrentWriter::new(Vec::new(), 2).unwrap();
        writer.write_all(&data).unwrap();
        let compressed = writer.close().unwrap();

        let mut reader = Reader::new(&compressed[..]).unwrap();
        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_zero_concurrency_and_empty_close() {
        let writer = ConcurrentWriter::new(Vec::new(), 0).unwrap();
        assert_eq!(writer.close().unwrap(), MAGIC_CHUNK.to_vec());
    }
}
