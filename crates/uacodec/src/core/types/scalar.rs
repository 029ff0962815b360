// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builtin scalar wrappers with OPC UA specific wire layouts.

use crate::core::ser::{CodecError, CodecResult};
use std::fmt;
use std::str::FromStr;

/// 128-bit GUID. `data1..data3` are little-endian on the wire, `data4` is raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const NULL: Guid = Guid {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl FromStr for Guid {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CodecError::invalid(format!("malformed guid '{}'", s));
        let parts: Vec<&str> = s.trim().split('-').collect();
        let [p1, p2, p3, p4, p5] = parts.as_slice() else {
            return Err(bad());
        };
        if p1.len() != 8 || p2.len() != 4 || p3.len() != 4 || p4.len() != 4 || p5.len() != 12 {
            return Err(bad());
        }
        let data1 = u32::from_str_radix(p1, 16).map_err(|_| bad())?;
        let data2 = u16::from_str_radix(p2, 16).map_err(|_| bad())?;
        let data3 = u16::from_str_radix(p3, 16).map_err(|_| bad())?;
        let tail = format!("{}{}", p4, p5);
        let mut data4 = [0u8; 8];
        for (i, slot) in data4.iter_mut().enumerate() {
            let pair = tail.get(i * 2..i * 2 + 2).ok_or_else(bad)?;
            *slot = u8::from_str_radix(pair, 16).map_err(|_| bad())?;
        }
        Ok(Guid::new(data1, data2, data3, data4))
    }
}

/// Timestamp as 100 ns ticks since 1601-01-01 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DateTime(pub i64);

impl DateTime {
    pub const MIN: DateTime = DateTime(0);

    /// Ticks between 1601-01-01 and the Unix epoch.
    pub const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> i64 {
        self.0
    }

    pub fn from_unix_millis(millis: i64) -> Self {
        Self(
            millis
                .saturating_mul(10_000)
                .saturating_add(Self::UNIX_EPOCH_TICKS),
        )
    }

    pub fn unix_millis(self) -> i64 {
        (self.0 - Self::UNIX_EPOCH_TICKS) / 10_000
    }
}

/// Raw 32-bit status code; the top two bits carry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const GOOD: StatusCode = StatusCode(0);
    pub const BAD_DECODING_ERROR: StatusCode = StatusCode(0x8007_0000);
    pub const BAD_ENCODING_LIMITS_EXCEEDED: StatusCode = StatusCode(0x8008_0000);
    pub const BAD_DATA_TYPE_ID_UNKNOWN: StatusCode = StatusCode(0x8011_0000);
    pub const BAD_TYPE_MISMATCH: StatusCode = StatusCode(0x8074_0000);

    pub fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    pub fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }
}

impl From<&CodecError> for StatusCode {
    fn from(err: &CodecError) -> Self {
        match err {
            CodecError::LengthOutOfRange { .. } => StatusCode::BAD_ENCODING_LIMITS_EXCEEDED,
            CodecError::UnknownType { .. } => StatusCode::BAD_DATA_TYPE_ID_UNKNOWN,
            CodecError::TypeMismatch { .. } => StatusCode::BAD_TYPE_MISMATCH,
            _ => StatusCode::BAD_DECODING_ERROR,
        }
    }
}

/// Opaque byte sequence; `None` is the null byte string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteString(pub Option<Vec<u8>>);

impl ByteString {
    pub const fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Some(bytes))
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self(Some(bytes.to_vec()))
    }
}

/// Multi-dimensional array stored flattened in row-major order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix<T> {
    dimensions: Vec<i32>,
    elements: Vec<T>,
}

impl<T> Matrix<T> {
    /// Element count must equal the product of the dimensions.
    pub fn new(dimensions: Vec<i32>, elements: Vec<T>) -> CodecResult<Self> {
        let expected = element_count(&dimensions)?;
        if expected != elements.len() {
            return Err(CodecError::invalid(format!(
                "matrix {:?} needs {} elements, got {}",
                dimensions,
                expected,
                elements.len()
            )));
        }
        Ok(Self {
            dimensions,
            elements,
        })
    }

    pub fn dimensions(&self) -> &[i32] {
        &self.dimensions
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Row-major lookup.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.dimensions.len() {
            return None;
        }
        let mut flat = 0usize;
        for (i, dim) in index.iter().zip(&self.dimensions) {
            let dim = usize::try_from(*dim).ok()?;
            if *i >= dim {
                return None;
            }
            flat = flat * dim + i;
        }
        self.elements.get(flat)
    }

    pub fn into_parts(self) -> (Vec<i32>, Vec<T>) {
        (self.dimensions, self.elements)
    }
}

/// Product of matrix dimensions, rejecting negatives and overflow.
pub(crate) fn element_count(dimensions: &[i32]) -> CodecResult<usize> {
    if dimensions.is_empty() {
        return Ok(0);
    }
    let mut total = 1usize;
    for dim in dimensions {
        let d = usize::try_from(*dim).map_err(|_| CodecError::LengthOutOfRange {
            length: i64::from(*dim),
            limit: i32::MAX as usize,
        })?;
        total = total
            .checked_mul(d)
            .ok_or_else(|| CodecError::invalid("matrix element count overflows"))?;
    }
    Ok(total)
}
