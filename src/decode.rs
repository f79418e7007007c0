// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::constants::*;
use crate::error::{Error, Result};
use crate::varint::get_uvarint;

/// Decode returns the decoded form of src.
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    let (dlen, header_len) = decode_len(src)?;

    let mut dst = vec![0u8; dlen];
    decode_tags(&mut dst, &src[header_len..])?;

    Ok(dst)
}

/// Decode into a pre-allocated destination buffer.
/// Returns the number of bytes written to dst.
pub fn decode_into(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    let (dlen, header_len) = decode_len(src)?;

    if dst.len() < dlen {
        return Err(Error::BufferTooSmall);
    }

    decode_tags(&mut dst[..dlen], &src[header_len..])?;

    Ok(dlen)
}

/// Returns the length of the decoded block and the number of bytes
/// that the length header occupied.
pub fn decode_len(src: &[u8]) -> Result<(usize, usize)> {
    let (v, n) = get_uvarint(src)?;

    #[cfg(target_pointer_width = "32")]
    {
        if v > 0x7fffffff {
            return Err(Error::TooLarge);
        }
    }

    Ok((v as usize, n))
}

/// Run the tag stream in `src`, filling `dst` exactly.
fn decode_tags(dst: &mut [u8], src: &[u8]) -> Result<()> {
    let mut d = 0;
    let mut s = 0;

    while s < src.len() {
        let tag = src[s];

        let (offset, length) = match tag & 0x03 {
            TAG_LITERAL => {
                let (length, header) = literal_len(&src[s..])?;
                s += header;

                if length > dst.len() - d || length > src.len() - s {
                    return Err(Error::Corrupt);
                }

                dst[d..d + length].copy_from_slice(&src[s..s + length]);
                d += length;
                s += length;
                continue;
            }
            TAG_COPY1 => {
                if src.len() - s < 2 {
                    return Err(Error::Corrupt);
                }
                let offset = ((tag as usize & 0xe0) << 3) | src[s + 1] as usize;
                let length = 4 + ((tag >> 2) & 0x07) as usize;
                s += 2;
                (offset, length)
            }
            TAG_COPY2 => {
                if src.len() - s < 3 {
                    return Err(Error::Corrupt);
                }
                let offset = u16::from_le_bytes([src[s + 1], src[s + 2]]) as usize;
                let length = 1 + (tag >> 2) as usize;
                s += 3;
                (offset, length)
            }
            _ => {
                if src.len() - s < 5 {
                    return Err(Error::Corrupt);
                }
                let offset =
                    u32::from_le_bytes([src[s + 1], src[s + 2], src[s + 3], src[s + 4]]) as usize;
                let length = 1 + (tag >> 2) as usize;
                s += 5;
                (offset, length)
            }
        };

        if offset == 0 || offset > d || length > dst.len() - d {
            return Err(Error::Corrupt);
        }

        copy_within(dst, d, offset, length);
        d += length;
    }

    if d != dst.len() {
        return Err(Error::Corrupt);
    }

    Ok(())
}

/// Decode the length of a literal run.
/// Returns (length, header_bytes)
fn literal_len(src: &[u8]) -> Result<(usize, usize)> {
    let x = (src[0] >> 2) as usize;
    if x < 60 {
        return Ok((x + 1, 1));
    }

    let extra = x - 59;
    if src.len() < 1 + extra {
        return Err(Error::Corrupt);
    }
    let mut buf = [0u8; 4];
    buf[..extra].copy_from_slice(&src[1..1 + extra]);
    let n = u32::from_le_bytes(buf) as usize;

    // n + 1 must not wrap on 32-bit targets
    n.checked_add(1)
        .map(|len| (len, 1 + extra))
        .ok_or(Error::Corrupt)
}

/// Copy `length` bytes from `offset` back, repeating the pattern when
/// source and destination overlap.
#[inline]
fn copy_within(dst: &mut [u8], d: usize, offset: usize, length: usize) {
    let start = d - offset;

    if offset >= length {
        dst.copy_within(start..start + length, d);
    } else {
        for i in 0..length {
            dst[d + i] = dst[start + i];
        }
    }
}
