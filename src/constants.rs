// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Tag for literal runs
pub const TAG_LITERAL: u8 = 0x00;

/// Tag for copy with 11-bit offset and 3-bit length
pub const TAG_COPY1: u8 = 0x01;

/// Tag for copy with 16-bit offset
pub const TAG_COPY2: u8 = 0x02;

/// Tag for copy with 32-bit offset (decoded, never emitted)
pub const TAG_COPY4: u8 = 0x03;

/// Uncompressed size of one framed block (64KB)
pub const BLOCK_SIZE: usize = 1 << 16;

/// Match finder hash table size, in bits and slots
pub const HASH_BITS: u32 = 14;
pub const HASH_TABLE_SIZE: usize = 1 << HASH_BITS;

/// Multiplier for the 4-byte match hash
pub const HASH_MUL: u32 = 0x1e35a7bd;

/// Furthest back-reference the encoder will emit
pub const MAX_OFFSET: usize = 1 << 15;

/// Longest copy a single COPY2 tag can carry
pub const MAX_COPY_LEN: usize = 64;

/// Chunk types for the framing format
pub const CHUNK_TYPE_COMPRESSED_DATA: u8 = 0x00;
pub const CHUNK_TYPE_UNCOMPRESSED_DATA: u8 = 0x01;
pub const CHUNK_TYPE_FIRST_SKIPPABLE: u8 = 0x80;
pub const CHUNK_TYPE_PADDING: u8 = 0xfe;
pub const CHUNK_TYPE_STREAM_IDENTIFIER: u8 = 0xff;

/// Stream identifier payload
pub const MAGIC_BODY: &[u8] = b"sNaPpY";

/// Full stream identifier chunk that opens every stream
pub const MAGIC_CHUNK: &[u8; 10] = b"\xff\x06\x00\x00sNaPpY";

/// Checksum size
pub const CHECKSUM_SIZE: usize = 4;

/// Chunk header size (type + 24-bit length)
pub const CHUNK_HEADER_SIZE: usize = 4;

/// Worst-case encoded size of one full block, `32 + n + n/6`
pub const MAX_ENCODED_BLOCK_LEN: usize = 32 + BLOCK_SIZE + BLOCK_SIZE / 6;

/// Largest chunk length a strict reader will accept
pub const STRICT_CHUNK_LIMIT: usize = MAX_ENCODED_BLOCK_LEN + CHUNK_HEADER_SIZE + CHECKSUM_SIZE;
