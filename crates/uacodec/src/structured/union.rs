// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Union discriminant framing: a UInt32 holding the 1-based position of the
//! active field, `0` when no field is set.

use crate::core::ser::{BinaryDecoder, BinaryEncoder, CodecError, CodecResult};

/// Discriminant meaning "no value".
pub const NULL_DISCRIMINANT: u32 = 0;

pub fn write_discriminant(enc: &mut BinaryEncoder, discriminant: u32) {
    enc.write_u32(discriminant);
}

/// Read a discriminant and check it against the number of variants.
pub fn read_discriminant(
    dec: &mut BinaryDecoder<'_>,
    type_name: &str,
    variant_count: usize,
) -> CodecResult<u32> {
    let discriminant = dec.read_u32()?;
    if discriminant as usize > variant_count {
        return Err(unknown_discriminant(type_name, discriminant, variant_count));
    }
    Ok(discriminant)
}

pub fn unknown_discriminant(type_name: &str, discriminant: u32, variants: usize) -> CodecError {
    CodecError::UnknownUnionDiscriminant {
        type_name: type_name.to_string(),
        discriminant,
        variants,
    }
}
