// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OPC UA binary serialization: cursors, primitive codecs and the error taxonomy.

pub mod cursor;
pub mod encoder;
pub mod traits;

pub use cursor::BinaryDecoder;
pub use encoder::BinaryEncoder;
pub use traits::{decode_from_slice, decode_with_limits, encode_to_vec, BinaryDecode, BinaryEncode};

use crate::core::types::NodeId;
use std::fmt;

/// Error raised by every encode/decode path in the crate.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Buffer exhausted before a declared length could be satisfied.
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// Negative non-sentinel length, or a length above the configured limit.
    LengthOutOfRange { length: i64, limit: usize },
    UnknownUnionDiscriminant {
        type_name: String,
        discriminant: u32,
        variants: usize,
    },
    /// A schema or definition references a type absent from the active catalog.
    UnresolvableFieldType { type_name: String, field: String },
    /// Envelope encoding id has no registered codec.
    UnknownType { type_id: NodeId },
    /// Value representation does not match its declared type.
    TypeMismatch { expected: String, actual: String },
    UnsupportedValueRank { field: String, value_rank: i32 },
    /// Structure shape the generator refuses to describe (nested unions, cycles).
    UnsupportedStructure { type_name: String, reason: String },
    MalformedSchema { reason: String },
    InvalidData { reason: String },
}

impl CodecError {
    /// Errors a caller may absorb by treating the payload as opaque.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodecError::UnknownType { .. })
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CodecError::InvalidData {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CodecError::MalformedSchema {
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        CodecError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::TruncatedInput {
                offset,
                needed,
                remaining,
            } => write!(
                f,
                "truncated input at offset {}: need {} bytes, {} remaining",
                offset, needed, remaining
            ),
            CodecError::LengthOutOfRange { length, limit } => {
                write!(f, "length {} out of range (limit {})", length, limit)
            }
            CodecError::UnknownUnionDiscriminant {
                type_name,
                discriminant,
                variants,
            } => write!(
                f,
                "unknown discriminant {} for union {} ({} variants)",
                discriminant, type_name, variants
            ),
            CodecError::UnresolvableFieldType { type_name, field } => {
                write!(f, "field '{}' references unknown type {}", field, type_name)
            }
            CodecError::UnknownType { type_id } => {
                write!(f, "no codec registered for {}", type_id)
            }
            CodecError::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {}, got {}", expected, actual)
            }
            CodecError::UnsupportedValueRank { field, value_rank } => {
                write!(f, "field '{}' has unsupported value rank {}", field, value_rank)
            }
            CodecError::UnsupportedStructure { type_name, reason } => {
                write!(f, "unsupported structure {}: {}", type_name, reason)
            }
            CodecError::MalformedSchema { reason } => write!(f, "malformed schema: {}", reason),
            CodecError::InvalidData { reason } => write!(f, "invalid data: {}", reason),
        }
    }
}

impl std::error::Error for CodecError {}

pub type CodecResult<T> = core::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_display_variants() {
        let err = CodecError::TruncatedInput {
            offset: 12,
            needed: 4,
            remaining: 1,
        };
        assert_eq!(
            err.to_string(),
            "truncated input at offset 12: need 4 bytes, 1 remaining"
        );

        let err = CodecError::LengthOutOfRange {
            length: -7,
            limit: 65535,
        };
        assert_eq!(err.to_string(), "length -7 out of range (limit 65535)");

        let err = CodecError::UnknownType {
            type_id: NodeId::numeric(2, 5001),
        };
        assert_eq!(err.to_string(), "no codec registered for ns=2;i=5001");
    }

    #[test]
    fn test_only_unknown_type_is_recoverable() {
        assert!(CodecError::UnknownType {
            type_id: NodeId::numeric(0, 1)
        }
        .is_recoverable());
        assert!(!CodecError::invalid("bad").is_recoverable());
        assert!(!CodecError::UnknownUnionDiscriminant {
            type_name: "U".into(),
            discriminant: 9,
            variants: 2,
        }
        .is_recoverable());
    }
}
