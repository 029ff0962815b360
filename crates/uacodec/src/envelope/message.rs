// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message bodies framed as a single leading envelope.
//!
//! The transport hands over a message body and gets one back; the encoding
//! id at the front selects the codec.

use super::registry::CodecRegistry;
use super::Envelope;
use crate::core::ser::{BinaryDecoder, BinaryEncoder, CodecError, CodecResult};
use crate::structured::UaStructure;
use std::fmt;

/// Encode `envelope` as a message body, bounded by the registry limits.
pub fn encode_message(registry: &CodecRegistry, envelope: &Envelope) -> CodecResult<Vec<u8>> {
    let limits = *registry.limits();
    let mut enc = BinaryEncoder::with_limits(limits);
    envelope.encode(&mut enc)?;
    let bytes = enc.into_inner();
    if bytes.len() > limits.max_message_size {
        return Err(CodecError::LengthOutOfRange {
            length: i64::try_from(bytes.len()).unwrap_or(i64::MAX),
            limit: limits.max_message_size,
        });
    }
    Ok(bytes)
}

/// Encode a compiled value as a message body.
pub fn encode_structure_message<T>(registry: &CodecRegistry, value: T) -> CodecResult<Vec<u8>>
where
    T: UaStructure + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    encode_message(registry, &Envelope::from_structure(value))
}

/// Decode a message body and materialize it.
///
/// A body whose type the registry does not know comes back raw rather than
/// failing; any other decode error is returned.
pub fn decode_message(registry: &CodecRegistry, bytes: &[u8]) -> CodecResult<Envelope> {
    let limits = *registry.limits();
    if bytes.len() > limits.max_message_size {
        return Err(CodecError::LengthOutOfRange {
            length: i64::try_from(bytes.len()).unwrap_or(i64::MAX),
            limit: limits.max_message_size,
        });
    }
    let mut dec = BinaryDecoder::with_limits(bytes, limits);
    let mut envelope = Envelope::decode(&mut dec)?;
    if !dec.is_exhausted() {
        return Err(CodecError::invalid(format!(
            "{} trailing bytes after message body",
            dec.remaining()
        )));
    }
    match registry.materialize(&mut envelope) {
        Ok(()) => Ok(envelope),
        Err(e) if e.is_recoverable() => {
            log::debug!("[message] keeping body raw: {}", e);
            Ok(envelope)
        }
        Err(e) => Err(e),
    }
}
