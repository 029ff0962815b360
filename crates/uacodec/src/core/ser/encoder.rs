// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Growable write buffer for the OPC UA binary encoding.

use super::{CodecError, CodecResult};
use crate::config::EncodingLimits;

/// Generate write methods for fixed-width little-endian primitives.
///
/// Each generated method flushes a pending partial bit byte first, so bit
/// groups never share a byte with the value that follows them.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.flush_bits();
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Write side of the primitive codec.
#[derive(Debug, Default)]
pub struct BinaryEncoder {
    buffer: Vec<u8>,
    limits: EncodingLimits,
    bit_acc: u8,
    bit_pos: u8,
    depth: usize,
}

impl BinaryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: EncodingLimits) -> Self {
        Self::from_vec(Vec::new(), limits)
    }

    /// Reuse an existing allocation (cleared before use).
    pub fn from_vec(mut buffer: Vec<u8>, limits: EncodingLimits) -> Self {
        buffer.clear();
        Self {
            buffer,
            limits,
            bit_acc: 0,
            bit_pos: 0,
            depth: 0,
        }
    }

    pub fn limits(&self) -> &EncodingLimits {
        &self.limits
    }

    /// Bytes written so far, counting a pending partial bit byte.
    pub fn len(&self) -> usize {
        self.buffer.len() + usize::from(self.bit_pos > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush pending bits and hand back the buffer.
    pub fn into_inner(mut self) -> Vec<u8> {
        self.flush_bits();
        self.buffer
    }

    /// Run `f` one nesting level deeper; fails past `max_recursion_depth`.
    pub fn nested(&mut self, f: impl FnOnce(&mut Self) -> CodecResult<()>) -> CodecResult<()> {
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

    impl_write_le!(write_u8, u8);
    impl_write_le!(write_i8, i8);
    impl_write_le!(write_u16, u16);
    impl_write_le!(write_i16, i16);
    impl_write_le!(write_u32, u32);
    impl_write_le!(write_i32, i32);
    impl_write_le!(write_u64, u64);
    impl_write_le!(write_i64, i64);
    impl_write_le!(write_f32, f32);
    impl_write_le!(write_f64, f64);

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.flush_bits();
        self.buffer.extend_from_slice(data);
    }

    /// Write an Int32 length prefix; `None` writes the `-1` null sentinel.
    pub fn write_length(&mut self, len: Option<usize>, limit: usize) -> CodecResult<()> {
        let raw = match len {
            None => -1,
            Some(n) => match i32::try_from(n) {
                Ok(v) if n <= limit => v,
                _ => {
                    return Err(CodecError::LengthOutOfRange {
                        length: i64::try_from(n).unwrap_or(i64::MAX),
                        limit,
                    })
                }
            },
        };
        self.write_i32(raw);
        Ok(())
    }

    pub fn write_array_length(&mut self, len: Option<usize>) -> CodecResult<()> {
        self.write_length(len, self.limits.max_array_length)
    }

    pub fn write_string(&mut self, value: Option<&str>) -> CodecResult<()> {
        self.write_byte_string(value.map(str::as_bytes))
    }

    pub fn write_byte_string(&mut self, value: Option<&[u8]>) -> CodecResult<()> {
        self.write_length(value.map(<[u8]>::len), self.limits.max_string_length)?;
        if let Some(bytes) = value {
            self.write_bytes(bytes);
        }
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.bit_acc |= 1 << self.bit_pos;
        }
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.buffer.push(self.bit_acc);
            self.bit_acc = 0;
            self.bit_pos = 0;
        }
    }

    /// Write the low `width` bits of `value`, bit 0 first.
    pub fn write_bits(&mut self, value: u32, width: u32) -> CodecResult<()> {
        if width > 32 {
            return Err(CodecError::invalid(format!("bit field width {} exceeds 32", width)));
        }
        for i in 0..width {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Zero-valued padding bits of any width.
    pub fn write_reserved_bits(&mut self, width: u32) {
        for _ in 0..width {
            self.write_bit(false);
        }
    }

    /// Emit a partially filled bit byte, zero-padded in its high bits.
    pub fn flush_bits(&mut self) {
        if self.bit_pos > 0 {
            self.buffer.push(self.bit_acc);
            self.bit_acc = 0;
            self.bit_pos = 0;
        }
    }
}
