// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary encoding traits
//!
//! Defines the encode/decode contract shared by builtin values, compiled
//! structures (`#[derive(UaStructure)]`) and enumerations (`#[derive(UaEnum)]`).
//!
//! Nullability follows the wire: `String` and `Vec<T>` are never null on
//! encode (a null on decode becomes empty), while `Option<String>` and
//! `Option<Vec<T>>` keep the null / empty distinction.

use super::{BinaryDecoder, BinaryEncoder, CodecError, CodecResult};
use crate::config::EncodingLimits;
use crate::core::types::node_id::{read_guid, write_guid};
use crate::core::types::scalar::element_count;
use crate::core::types::{ByteString, DateTime, Guid, Matrix, NodeId, StatusCode};

/// Types that can be written in the OPC UA binary encoding.
pub trait BinaryEncode {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()>;
}

/// Types that can be read from the OPC UA binary encoding.
pub trait BinaryDecode: Sized {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self>;
}

/// Encode `value` into a fresh buffer with default limits.
pub fn encode_to_vec<T: BinaryEncode + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut enc = BinaryEncoder::new();
    value.encode(&mut enc)?;
    Ok(enc.into_inner())
}

/// Decode a `T` from `bytes`; trailing bytes are an error.
pub fn decode_from_slice<T: BinaryDecode>(bytes: &[u8]) -> CodecResult<T> {
    decode_with_limits(bytes, EncodingLimits::default())
}

pub fn decode_with_limits<T: BinaryDecode>(bytes: &[u8], limits: EncodingLimits) -> CodecResult<T> {
    let mut dec = BinaryDecoder::with_limits(bytes, limits);
    let value = T::decode(&mut dec)?;
    if !dec.is_exhausted() {
        return Err(CodecError::invalid(format!(
            "{} trailing bytes after value",
            dec.remaining()
        )));
    }
    Ok(value)
}

macro_rules! impl_primitive {
    ($type:ty, $write:ident, $read:ident) => {
        impl BinaryEncode for $type {
            fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
                enc.$write(*self);
                Ok(())
            }
        }

        impl BinaryDecode for $type {
            fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
                dec.$read()
            }
        }
    };
}

impl_primitive!(bool, write_bool, read_bool);
impl_primitive!(i8, write_i8, read_i8);
impl_primitive!(u8, write_u8, read_u8);
impl_primitive!(i16, write_i16, read_i16);
impl_primitive!(u16, write_u16, read_u16);
impl_primitive!(i32, write_i32, read_i32);
impl_primitive!(u32, write_u32, read_u32);
impl_primitive!(i64, write_i64, read_i64);
impl_primitive!(u64, write_u64, read_u64);
impl_primitive!(f32, write_f32, read_f32);
impl_primitive!(f64, write_f64, read_f64);

impl BinaryEncode for String {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_string(Some(self.as_str()))
    }
}

impl BinaryDecode for String {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        Ok(dec.read_string()?.unwrap_or_default())
    }
}

impl BinaryEncode for str {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_string(Some(self))
    }
}

impl BinaryEncode for Option<String> {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_string(self.as_deref())
    }
}

impl BinaryDecode for Option<String> {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        dec.read_string()
    }
}

impl BinaryEncode for ByteString {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_byte_string(self.as_bytes())
    }
}

impl BinaryDecode for ByteString {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        Ok(ByteString(dec.read_byte_string()?))
    }
}

impl BinaryEncode for DateTime {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_i64(self.0);
        Ok(())
    }
}

impl BinaryDecode for DateTime {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        Ok(DateTime(dec.read_i64()?))
    }
}

impl BinaryEncode for StatusCode {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_u32(self.0);
        Ok(())
    }
}

impl BinaryDecode for StatusCode {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        Ok(StatusCode(dec.read_u32()?))
    }
}

impl BinaryEncode for Guid {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        write_guid(enc, self);
        Ok(())
    }
}

impl BinaryDecode for Guid {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        read_guid(dec)
    }
}

impl BinaryEncode for NodeId {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        NodeId::encode(self, enc)
    }
}

impl BinaryDecode for NodeId {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        NodeId::decode(dec)
    }
}

impl<T: BinaryEncode> BinaryEncode for [T] {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_array_length(Some(self.len()))?;
        for item in self {
            item.encode(enc)?;
        }
        Ok(())
    }
}

impl<T: BinaryEncode> BinaryEncode for Vec<T> {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        self.as_slice().encode(enc)
    }
}

impl<T: BinaryDecode> BinaryDecode for Vec<T> {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        Ok(Option::<Vec<T>>::decode(dec)?.unwrap_or_default())
    }
}

impl<T: BinaryEncode> BinaryEncode for Option<Vec<T>> {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        match self {
            Some(items) => items.encode(enc),
            None => enc.write_array_length(None),
        }
    }
}

impl<T: BinaryDecode> BinaryDecode for Option<Vec<T>> {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let Some(len) = dec.read_array_length()? else {
            return Ok(None);
        };
        // Each element needs at least one byte; don't trust len for capacity.
        let mut items = Vec::with_capacity(len.min(dec.remaining()));
        for _ in 0..len {
            items.push(T::decode(dec)?);
        }
        Ok(Some(items))
    }
}

/// Dimension count, dimension sizes, then the row-major elements.
impl<T: BinaryEncode> BinaryEncode for Matrix<T> {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        write_dimensions(enc, self.dimensions())?;
        for item in self.elements() {
            item.encode(enc)?;
        }
        Ok(())
    }
}

impl<T: BinaryDecode> BinaryDecode for Matrix<T> {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let Some((dimensions, count)) = read_dimensions(dec)? else {
            return Matrix::new(Vec::new(), Vec::new());
        };
        let mut elements = Vec::with_capacity(count.min(dec.remaining()));
        for _ in 0..count {
            elements.push(T::decode(dec)?);
        }
        Matrix::new(dimensions, elements)
    }
}

pub(crate) fn write_dimensions(enc: &mut BinaryEncoder, dimensions: &[i32]) -> CodecResult<()> {
    enc.write_array_length(Some(dimensions.len()))?;
    for dim in dimensions {
        enc.write_i32(*dim);
    }
    Ok(())
}

/// Reads the dimension header; `None` for a null matrix. Returns the
/// dimensions and the total element count, bounded by `max_array_length`.
pub(crate) fn read_dimensions(
    dec: &mut BinaryDecoder<'_>,
) -> CodecResult<Option<(Vec<i32>, usize)>> {
    let Some(rank) = dec.read_array_length()? else {
        return Ok(None);
    };
    let mut dimensions = Vec::with_capacity(rank.min(dec.remaining() / 4));
    for _ in 0..rank {
        dimensions.push(dec.read_i32()?);
    }
    let count = element_count(&dimensions)?;
    let limit = dec.limits().max_array_length;
    if count > limit {
        return Err(CodecError::LengthOutOfRange {
            length: i64::try_from(count).unwrap_or(i64::MAX),
            limit,
        });
    }
    Ok(Some((dimensions, count)))
}

impl<T: BinaryEncode + ?Sized> BinaryEncode for &T {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        (**self).encode(enc)
    }
}

impl<T: BinaryEncode + ?Sized> BinaryEncode for Box<T> {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        (**self).encode(enc)
    }
}

impl<T: BinaryDecode> BinaryDecode for Box<T> {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        T::decode(dec).map(Box::new)
    }
}
