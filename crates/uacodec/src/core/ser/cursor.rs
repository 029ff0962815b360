// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked read cursor for the OPC UA binary encoding.
//!
//! Every multi-byte read is little-endian. Bit reads consume bytes LSB-first;
//! any byte-level read discards the unread remainder of a partially consumed
//! bit byte.

use super::{CodecError, CodecResult};
use crate::config::EncodingLimits;

/// Generate read methods for fixed-width little-endian primitives.
///
/// Each generated method:
/// 1. Checks buffer bounds (returns `CodecError::TruncatedInput` if short)
/// 2. Resets pending bit state
/// 3. Converts bytes to value via `from_le_bytes()`
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> CodecResult<$type> {
            let slice = self.take($size)?;
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(slice);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Read cursor over a borrowed message body.
pub struct BinaryDecoder<'a> {
    buffer: &'a [u8],
    offset: usize,
    limits: EncodingLimits,
    bit_byte: u8,
    bit_pos: u8,
    depth: usize,
}

impl<'a> BinaryDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_limits(buffer, EncodingLimits::default())
    }

    pub fn with_limits(buffer: &'a [u8], limits: EncodingLimits) -> Self {
        Self {
            buffer,
            offset: 0,
            limits,
            bit_byte: 0,
            bit_pos: 0,
            depth: 0,
        }
    }

    pub fn limits(&self) -> &EncodingLimits {
        &self.limits
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buffer[self.offset.min(self.buffer.len())..]
    }

    /// Run `f` one nesting level deeper; fails past `max_recursion_depth`.
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<T> {
        let limit = self.limits.max_recursion_depth;
        if self.depth >= limit {
            return Err(CodecError::LengthOutOfRange {
                length: i64::try_from(self.depth + 1).unwrap_or(i64::MAX),
                limit,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        self.bit_pos = 0;
        if len > self.remaining() {
            return Err(CodecError::TruncatedInput {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i64, i64, 8);
    impl_read_le!(read_f32, f32, 4);
    impl_read_le!(read_f64, f64, 8);

    /// Any non-zero byte decodes as `true`.
    pub fn read_bool(&mut self) -> CodecResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        self.take(len)
    }

    /// Read an Int32 length prefix. `-1` yields `None`; other negatives and
    /// values above `limit` fail with `LengthOutOfRange`.
    pub fn read_length(&mut self, limit: usize) -> CodecResult<Option<usize>> {
        let raw = self.read_i32()?;
        checked_length(raw, limit)
    }

    /// Element count of an array, bounded by `max_array_length`.
    pub fn read_array_length(&mut self) -> CodecResult<Option<usize>> {
        self.read_length(self.limits.max_array_length)
    }

    /// Length-prefixed UTF-8 string; `None` is the null string.
    pub fn read_string(&mut self) -> CodecResult<Option<String>> {
        let Some(len) = self.read_length(self.limits.max_string_length)? else {
            return Ok(None);
        };
        let offset = self.offset;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| CodecError::invalid(format!("string at offset {}: {}", offset, e)))
    }

    /// Length-prefixed opaque bytes; `None` is the null byte string.
    pub fn read_byte_string(&mut self) -> CodecResult<Option<Vec<u8>>> {
        match self.read_length(self.limits.max_string_length)? {
            Some(len) => Ok(Some(self.take(len)?.to_vec())),
            None => Ok(None),
        }
    }

    pub fn read_bit(&mut self) -> CodecResult<bool> {
        if self.bit_pos == 0 {
            if self.remaining() == 0 {
                return Err(CodecError::TruncatedInput {
                    offset: self.offset,
                    needed: 1,
                    remaining: 0,
                });
            }
            self.bit_byte = self.buffer[self.offset];
            self.offset += 1;
        }
        let bit = (self.bit_byte >> self.bit_pos) & 1 == 1;
        self.bit_pos = (self.bit_pos + 1) % 8;
        Ok(bit)
    }

    /// Read `width` bits (at most 32), first bit read lands in bit 0.
    pub fn read_bits(&mut self, width: u32) -> CodecResult<u32> {
        if width > 32 {
            return Err(CodecError::invalid(format!("bit field width {} exceeds 32", width)));
        }
        let mut value = 0u32;
        for i in 0..width {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        Ok(value)
    }

    /// Consume reserved padding bits of any width.
    pub fn skip_bits(&mut self, width: u32) -> CodecResult<()> {
        for _ in 0..width {
            self.read_bit()?;
        }
        Ok(())
    }
}

/// Validate a raw Int32 length against the null sentinel and a limit.
fn checked_length(raw: i32, limit: usize) -> CodecResult<Option<usize>> {
    if raw == -1 {
        return Ok(None);
    }
    match usize::try_from(raw) {
        Ok(len) if len <= limit => Ok(Some(len)),
        _ => Err(CodecError::LengthOutOfRange {
            length: i64::from(raw),
            limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives_le() {
        let bytes = [
            0x2A, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        let mut dec = BinaryDecoder::new(&bytes);
        assert_eq!(dec.read_u8().expect("u8"), 0x2A);
        assert_eq!(dec.read_u16().expect("u16"), 0x1234);
        assert_eq!(dec.read_u32().expect("u32"), 0x1234_5678);
        assert_eq!(dec.read_i32().expect("i32"), -1);
        assert!(dec.is_exhausted());
    }

    #[test]
    fn test_truncated_reports_offset_and_need() {
        let bytes = [0x01, 0x02, 0x03];
        let mut dec = BinaryDecoder::new(&bytes);
        dec.read_u8().expect("first byte");
        match dec.read_u32() {
            Err(CodecError::TruncatedInput {
                offset,
                needed,
                remaining,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_string_null_empty_and_value() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&5i32.to_le_bytes());
        bytes.extend_from_slice(b"hello");
        let mut dec = BinaryDecoder::new(&bytes);
        assert_eq!(dec.read_string().expect("null"), None);
        assert_eq!(dec.read_string().expect("empty"), Some(String::new()));
        assert_eq!(dec.read_string().expect("value"), Some("hello".to_string()));
    }

    #[test]
    fn test_negative_length_rejected() {
        let bytes = (-2i32).to_le_bytes();
        let mut dec = BinaryDecoder::new(&bytes);
        assert!(matches!(
            dec.read_array_length(),
            Err(CodecError::LengthOutOfRange { length: -2, .. })
        ));
    }

    #[test]
    fn test_length_over_limit_rejected() {
        let limits = EncodingLimits {
            max_string_length: 3,
            ..EncodingLimits::default()
        };
        let mut bytes = 4i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abcd");
        let mut dec = BinaryDecoder::with_limits(&bytes, limits);
        assert!(matches!(
            dec.read_string(),
            Err(CodecError::LengthOutOfRange { length: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_declared_length_beyond_buffer_is_truncated() {
        let mut bytes = 10i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let mut dec = BinaryDecoder::new(&bytes);
        assert!(matches!(
            dec.read_byte_string(),
            Err(CodecError::TruncatedInput { needed: 10, .. })
        ));
    }

    #[test]
    fn test_bits_lsb_first_and_byte_read_realigns() {
        // 0b1000_1111 then a plain byte
        let bytes = [0x8F, 0x07, 0xAA];
        let mut dec = BinaryDecoder::new(&bytes);
        assert!(dec.read_bit().expect("b0"));
        assert!(dec.read_bit().expect("b1"));
        assert_eq!(dec.read_bits(6).expect("rest"), 0b10_0011);
        assert_eq!(dec.read_bits(2).expect("two"), 0b11);
        // Remaining bits of 0x07 are discarded by the byte read.
        assert_eq!(dec.read_u8().expect("aligned"), 0xAA);
    }

    #[test]
    fn test_bits_width_over_32_rejected() {
        let bytes = [0u8; 8];
        let mut dec = BinaryDecoder::new(&bytes);
        assert!(dec.read_bits(33).is_err());
    }
}
