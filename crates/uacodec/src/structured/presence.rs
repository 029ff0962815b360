// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Presence bitmap for structures with optional fields.
//!
//! One bit per optional field in declaration order, packed LSB-first into
//! 32-bit groups. Bits past the last optional field are written as zero and
//! ignored on decode. A group written as a little-endian UInt32 is the same
//! byte sequence as its 32 bits written one at a time.

use crate::core::ser::{BinaryDecoder, BinaryEncoder, CodecResult};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresenceMask {
    groups: Vec<u32>,
    count: usize,
}

impl PresenceMask {
    /// Empty mask for `count` optional fields.
    pub fn new(count: usize) -> Self {
        Self {
            groups: vec![0; Self::group_count(count)],
            count,
        }
    }

    /// Number of 32-bit groups needed for `count` presence bits.
    pub fn group_count(count: usize) -> usize {
        (count + 31) / 32
    }

    /// Width of the zero padding after the last presence bit.
    pub fn padding_bits(count: usize) -> u32 {
        match count % 32 {
            0 => 0,
            rem => 32 - rem as u32,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn set(&mut self, index: usize, present: bool) {
        if index >= self.count {
            return;
        }
        let bit = 1u32 << (index % 32);
        if present {
            self.groups[index / 32] |= bit;
        } else {
            self.groups[index / 32] &= !bit;
        }
    }

    pub fn is_set(&self, index: usize) -> bool {
        index < self.count && self.groups[index / 32] & (1 << (index % 32)) != 0
    }

    pub fn present_count(&self) -> usize {
        self.groups.iter().map(|g| g.count_ones() as usize).sum()
    }

    pub fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        for group in &self.groups {
            enc.write_u32(*group);
        }
        Ok(())
    }

    pub fn decode(dec: &mut BinaryDecoder<'_>, count: usize) -> CodecResult<Self> {
        let mut mask = Self::new(count);
        let last = mask.groups.len().saturating_sub(1);
        for (i, group) in mask.groups.iter_mut().enumerate() {
            let raw = dec.read_u32()?;
            *group = if i == last { raw & low_bits(count) } else { raw };
        }
        Ok(mask)
    }
}

/// Mask of the bits used in the final group.
fn low_bits(count: usize) -> u32 {
    match count % 32 {
        0 => u32::MAX,
        rem => (1u32 << rem) - 1,
    }
}
