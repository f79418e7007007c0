// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{Error, Result};

/// Longest varint a block length prefix may use (u32 range)
pub const MAX_VARINT_LEN32: usize = 5;

/// Read a u32-ranged varint from the front of `src`.
/// Returns (value, bytes_read)
pub fn get_uvarint(src: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;

    for (i, &byte) in src.iter().take(MAX_VARINT_LEN32).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            if value > u64::from(u32::MAX) {
                return Err(Error::Corrupt);
            }
            return Ok((value, i + 1));
        }
    }

    Err(Error::Corrupt)
}

/// Write `value` as a varint at the front of `dst`.
/// Returns the number of bytes written, or `BufferTooSmall`.
pub fn put_uvarint(dst: &mut [u8], mut value: u64) -> Result<usize> {
    let n = uvarint_len(value);
    if dst.len() < n {
        return Err(Error::BufferTooSmall);
    }

    for byte in dst.iter_mut().take(n - 1) {
        *byte = (value as u8) | 0x80;
        value >>= 7;
    }
    dst[n - 1] = value as u8;
    Ok(n)
}

/// Number of bytes `value` occupies as a varint
pub fn uvarint_len(mut value: u64) -> usize {
    let mut n = 1;
    while value >= 0x80 {
        value >>= 7;
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        let mut buf = [0u8; 8];
        assert_eq!(put_uvarint(&mut buf, 0).unwrap(), 1);
        assert_eq!(buf[0], 0x00);

        assert_eq!(put_uvarint(&mut buf, 300).unwrap(), 2);
        assert_eq!(&buf[..2], &[0xac, 0x02]);

        assert_eq!(put_uvarint(&mut buf, 65536).unwrap(), 3);
        assert_eq!(&buf[..3], &[0x80, 0x80, 0x04]);
        assert_eq!(get_uvarint(&buf).unwrap(), (65536, 3));
    }

    #[test]
    fn test_u32_limit() {
        let mut buf = [0u8; 8];
        let n = put_uvarint(&mut buf, u64::from(u32::MAX)).unwrap();
        assert_eq!(n, 5);
        assert_eq!(get_uvarint(&buf[..n]).unwrap(), (u64::from(u32::MAX), 5));

        let n = put_uvarint(&mut buf, u64::from(u32::MAX) + 1).unwrap();
        assert_eq!(get_uvarint(&buf[..n]), Err(Error::Corrupt));
    }

    #[test]
    fn test_truncated_and_overlong() {
        assert_eq!(get_uvarint(&[]), Err(Error::Corrupt));
        assert_eq!(get_uvarint(&[0x80, 0x80]), Err(Error::Corrupt));
        assert_eq!(get_uvarint(&[0x80; 6]), Err(Error::Corrupt));
    }

    #[test]
    fn test_put_short_buffer() {
        let mut buf = [0u8; 1];
        assert_eq!(put_uvarint(&mut buf, 128), Err(Error::BufferTooSmall));
    }
}
