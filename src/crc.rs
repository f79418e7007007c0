// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! CRC-32C checksums for framed streams
//!
//! Data chunks carry a masked CRC-32C (Castagnoli polynomial) of their
//! uncompressed bytes, as described in section 3 of
//! https://github.com/google/snappy/blob/master/framing_format.txt

/// Reflected Castagnoli polynomial
const CASTAGNOLI: u32 = 0x82f6_3b78;

/// Constant added after rotation
const MASK_DELTA: u32 = 0xa282_ead8;

const CRC32C_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ CASTAGNOLI;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Incremental CRC-32C hasher.
#[derive(Debug, Clone)]
pub struct Crc32c {
    state: u32,
}

impl Crc32c {
    pub fn new() -> Self {
        Crc32c { state: 0xffff_ffff }
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;
        for &byte in data {
            crc = CRC32C_TABLE[((crc ^ byte as u32) & 0xff) as usize] ^ (crc >> 8);
        }
        self.state = crc;
    }

    pub fn reset(&mut self) {
        self.state = 0xffff_ffff;
    }

    pub fn finalize(&self) -> u32 {
        self.state ^ 0xffff_ffff
    }
}

impl Default for Crc32c {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain CRC-32C of `data`.
pub fn crc32c(data: &[u8]) -> u32 {
    let mut hasher = Crc32c::new();
    hasher.update(data);
    hasher.finalize()
}

/// Apply the framing-format mask to a raw CRC.
#[inline]
pub fn mask(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Masked CRC-32C of `data`, as stored in data chunks.
pub fn masked_crc(data: &[u8]) -> u32 {
    mask(crc32c(data))
}
