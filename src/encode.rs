// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::constants::*;
use crate::error::{Error, Result};
use crate::varint::put_uvarint;

/// Marks an empty hash table slot
const NO_CANDIDATE: usize = usize::MAX;

/// Encode returns the encoded form of src.
///
/// The block starts with the varint-encoded length of `src`, followed by
/// the literal/copy tag stream.
pub fn encode(src: &[u8]) -> Result<Vec<u8>> {
    let mut dst = vec![0u8; max_encoded_len(src.len())?];
    let n = encode_into(&mut dst, src)?;
    dst.truncate(n);
    Ok(dst)
}

/// Encode src into dst and return the number of bytes written.
///
/// A `dst` of at least `max_encoded_len(src.len())` bytes always suffices.
/// A shorter buffer fails with `BufferTooSmall` as soon as output would
/// run past its end.
pub fn encode_into(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    if src.len() as u64 > u64::from(u32::MAX) {
        return Err(Error::TooLarge);
    }

    let d = put_uvarint(dst, src.len() as u64)?;
    if src.is_empty() {
        return Ok(d);
    }

    let n = encode_block(&mut dst[d..], src)?;
    Ok(d + n)
}

/// Returns the maximum length of an encoded block.
///
/// Every literal header costs at most 5 bytes and copies never outgrow the
/// bytes they replace, so `32 + n + n/6` is a comfortable ceiling.
pub fn max_encoded_len(src_len: usize) -> Result<usize> {
    if src_len as u64 > u64::from(u32::MAX) {
        return Err(Error::TooLarge);
    }

    let n = 32 + src_len + src_len / 6;

    #[cfg(target_pointer_width = "32")]
    {
        if n > 0x7fffffff {
            return Err(Error::TooLarge);
        }
    }

    Ok(n)
}

/// Emit a literal run and return the number of bytes written
fn emit_literal(dst: &mut [u8], lit: &[u8]) -> Result<usize> {
    let len = lit.len();
    let n = len - 1;

    let i = if len < 60 {
        if dst.is_empty() {
            return Err(Error::BufferTooSmall);
        }
        dst[0] = ((n as u8) << 2) | TAG_LITERAL;
        1
    } else {
        let extra = match len {
            60..=255 => 1,
            256..=65535 => 2,
            65536..=16777215 => 3,
            _ => 4,
        };
        if dst.len() < 1 + extra {
            return Err(Error::BufferTooSmall);
        }
        dst[0] = ((59 + extra as u8) << 2) | TAG_LITERAL;
        dst[1..1 + extra].copy_from_slice(&(n as u32).to_le_bytes()[..extra]);
        1 + extra
    };

    if dst.len() - i < len {
        return Err(Error::BufferTooSmall);
    }
    dst[i..i + len].copy_from_slice(lit);
    Ok(i + len)
}

/// Emit a back-reference and return the number of bytes written.
///
/// Long copies are split into 64-byte COPY2 pieces. A 60-byte piece is
/// used instead when a 64-byte one would leave fewer than 4 bytes.
fn emit_copy(dst: &mut [u8], offset: usize, mut length: usize) -> Result<usize> {
    let mut d = 0;

    while length > 0 {
        if length >= 4 && length - 4 < 8 && offset < 2048 {
            if dst.len() - d < 2 {
                return Err(Error::BufferTooSmall);
            }
            dst[d] = (((offset >> 8) & 0x07) << 5 | (length - 4) << 2) as u8 | TAG_COPY1;
            dst[d + 1] = offset as u8;
            return Ok(d + 2);
        }

        let piece = match length {
            0..=MAX_COPY_LEN => length,
            65..=67 => 60,
            _ => MAX_COPY_LEN,
        };
        if dst.len() - d < 3 {
            return Err(Error::BufferTooSmall);
        }
        dst[d] = ((piece - 1) << 2) as u8 | TAG_COPY2;
        dst[d + 1..d + 3].copy_from_slice(&(offset as u16).to_le_bytes());
        d += 3;
        length -= piece;
    }

    Ok(d)
}

#[inline]
fn load32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
fn hash(u: u32) -> usize {
    (u.wrapping_mul(HASH_MUL) >> (32 - HASH_BITS)) as usize
}

/// Greedy single-table match finder over a non-empty `src`.
///
/// Each slot remembers the latest position whose 4 bytes hashed there.
/// Candidates are verified byte-for-byte and limited to `MAX_OFFSET`.
fn encode_block(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    let mut table = vec![NO_CANDIDATE; HASH_TABLE_SIZE];

    let mut d = 0;
    let mut lit = 0;
    let mut s = 0;

    while s + 3 < src.len() {
        let cv = load32(src, s);
        let slot = hash(cv);
        let candidate = table[slot];
        table[slot] = s;

        if candidate == NO_CANDIDATE || s - candidate > MAX_OFFSET || load32(src, candidate) != cv
        {
            s += 1;
            continue;
        }

        let base = s;
        let mut t = candidate + 4;
        s += 4;
        while s < src.len() && src[s] == src[t] {
            s += 1;
            t += 1;
        }

        if lit != base {
            d += emit_literal(&mut dst[d..], &src[lit..base])?;
        }
        d += emit_copy(&mut dst[d..], base - candidate, s - base)?;
        lit = s;
    }

    if lit != src.len() {
        d += emit_literal(&mut dst[d..], &src[lit..])?;
    }

    Ok(d)
}
