// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Polymorphic envelopes (ExtensionObject).
//!
//! Wire layout: encoding NodeId, one encoding byte (0 empty, 1 binary,
//! 2 xml), then an Int32 length and the body bytes when the body is not
//! empty.
//!
//! Decoding an envelope never needs a codec: the body is kept as raw bytes
//! until [`CodecRegistry::materialize`] turns it into a decoded value. A raw
//! envelope re-encodes to exactly the bytes it was read from.

pub mod message;
pub mod registry;

#[cfg(test)]
mod tests;

pub use message::{decode_message, encode_message, encode_structure_message};
pub use registry::{CodecHandle, CodecRegistry, CompiledCodec, ErasedCodec, RegistryHandle};

use crate::core::ser::{BinaryDecode, BinaryDecoder, BinaryEncode, BinaryEncoder};
use crate::core::ser::{CodecError, CodecResult};
use crate::core::types::{EncodingFormat, NodeId, TypeId};
use crate::dynamic::{DynamicStructCodec, GenericStruct, Value};
use crate::pool::BufferPool;
use crate::structured::UaStructure;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Value held by a materialized envelope.
#[derive(Clone)]
pub enum DecodedValue {
    /// Output of a compiled codec; see [`Envelope::decoded_as`].
    Compiled(Arc<dyn Any + Send + Sync>),
    /// Output of a schema-driven codec, always a `Value::Struct`.
    Dynamic(Value),
}

impl fmt::Debug for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Compiled(_) => f.write_str("Compiled(..)"),
            DecodedValue::Dynamic(value) => f.debug_tuple("Dynamic").field(value).finish(),
        }
    }
}

/// Body of an envelope: nothing, undecoded bytes, or a decoded value.
#[derive(Clone)]
pub enum EnvelopeBody {
    Empty,
    Raw {
        format: EncodingFormat,
        bytes: Vec<u8>,
    },
    Decoded {
        value: DecodedValue,
        codec: CodecHandle,
    },
}

impl fmt::Debug for EnvelopeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct DecodedDebug<'a>(&'a CodecHandle, &'a DecodedValue);

        impl fmt::Debug for DecodedDebug<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt_value(self.1, f)
            }
        }

        match self {
            EnvelopeBody::Empty => f.write_str("Empty"),
            EnvelopeBody::Raw { format, bytes } => f
                .debug_struct("Raw")
                .field("format", format)
                .field("len", &bytes.len())
                .finish(),
            EnvelopeBody::Decoded { value, codec } => f
                .debug_struct("Decoded")
                .field("codec", codec)
                .field("value", &DecodedDebug(codec, value))
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct Envelope {
    encoding_id: NodeId,
    /// Data type behind `encoding_id`, known once decoded.
    type_id: Option<TypeId>,
    body: EnvelopeBody,
    /// Encoding id bytes as read, when they differ from the canonical form.
    wire_id: Option<Vec<u8>>,
}

impl Envelope {
    /// The null envelope: null encoding id and no body.
    pub fn null() -> Self {
        Self::empty(NodeId::default())
    }

    /// An envelope with an encoding id and no body.
    pub fn empty(encoding_id: NodeId) -> Self {
        Self {
            encoding_id,
            type_id: None,
            body: EnvelopeBody::Empty,
            wire_id: None,
        }
    }

    /// An undecoded body.
    pub fn raw(encoding_id: NodeId, format: EncodingFormat, bytes: Vec<u8>) -> Self {
        Self {
            encoding_id,
            type_id: None,
            body: EnvelopeBody::Raw { format, bytes },
            wire_id: None,
        }
    }

    pub fn from_structure<T>(value: T) -> Self
    where
        T: UaStructure + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            encoding_id: T::binary_encoding_id(),
            type_id: Some(T::data_type_id()),
            body: EnvelopeBody::Decoded {
                value: DecodedValue::Compiled(Arc::new(value)),
                codec: CodecHandle::compiled::<T>(),
            },
            wire_id: None,
        }
    }

    pub fn from_generic(
        type_id: TypeId,
        encoding_id: NodeId,
        value: GenericStruct,
        codec: DynamicStructCodec,
    ) -> Self {
        Self {
            encoding_id,
            type_id: Some(type_id),
            body: EnvelopeBody::Decoded {
                value: DecodedValue::Dynamic(Value::Struct(value)),
                codec: CodecHandle::Dynamic(codec),
            },
            wire_id: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.encoding_id.is_null() && matches!(self.body, EnvelopeBody::Empty)
    }

    pub fn encoding_id(&self) -> &NodeId {
        &self.encoding_id
    }

    /// Data type id; `None` until the envelope is decoded.
    pub fn type_id(&self) -> Option<&TypeId> {
        self.type_id.as_ref()
    }

    pub fn body(&self) -> &EnvelopeBody {
        &self.body
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.body, EnvelopeBody::Raw { .. })
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self.body, EnvelopeBody::Decoded { .. })
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            EnvelopeBody::Raw { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// The compiled value, if the envelope holds a `T`.
    pub fn decoded_as<T: Any>(&self) -> Option<&T> {
        match &self.body {
            EnvelopeBody::Decoded {
                value: DecodedValue::Compiled(value),
                ..
            } => (**value).downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The schema-driven value, if the envelope holds one.
    pub fn decoded_value(&self) -> Option<&Value> {
        match &self.body {
            EnvelopeBody::Decoded {
                value: DecodedValue::Dynamic(value),
                ..
            } => Some(value),
            _ => None,
        }
    }

    pub fn decoded_struct(&self) -> Option<&GenericStruct> {
        self.decoded_value().and_then(Value::as_struct)
    }

    /// Decode the raw body with `registry`; see [`CodecRegistry::materialize`].
    pub fn materialize(&mut self, registry: &CodecRegistry) -> CodecResult<()> {
        registry.materialize(self)
    }

    pub fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        match &self.wire_id {
            Some(bytes) => enc.write_bytes(bytes),
            None => self.encoding_id.encode(enc)?,
        }
        let limit = enc.limits().max_message_size;
        match &self.body {
            EnvelopeBody::Empty => enc.write_u8(0x00),
            EnvelopeBody::Raw { format, bytes } => {
                let byte = format.encoding_byte().ok_or_else(|| {
                    CodecError::invalid(format!("{} bodies have no binary framing", format))
                })?;
                enc.write_u8(byte);
                enc.write_length(Some(bytes.len()), limit)?;
                enc.write_bytes(bytes);
            }
            EnvelopeBody::Decoded { value, codec } => {
                let limits = *enc.limits();
                let mut scratch = BufferPool::shared().acquire();
                let body = scratch.encode_with(limits, |body| codec.encode(value, body))?;
                enc.write_u8(0x01);
                enc.write_length(Some(body.len()), limit)?;
                enc.write_bytes(body);
            }
        }
        Ok(())
    }

    pub fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let start = dec.rest();
        let encoding_id = NodeId::decode(dec)?;
        let id_bytes = &start[..start.len() - dec.remaining()];

        let offset = dec.offset();
        let body = match dec.read_u8()? {
            0x00 => EnvelopeBody::Empty,
            byte => {
                let format = EncodingFormat::from_encoding_byte(byte).ok_or_else(|| {
                    CodecError::invalid(format!(
                        "invalid extension object encoding 0x{:02x} at offset {}",
                        byte, offset
                    ))
                })?;
                let len = dec
                    .read_length(dec.limits().max_message_size)?
                    .ok_or_else(|| {
                        CodecError::invalid(format!("null body for {}", encoding_id))
                    })?;
                EnvelopeBody::Raw {
                    format,
                    bytes: dec.read_bytes(len)?.to_vec(),
                }
            }
        };

        let mut canonical = BinaryEncoder::with_limits(*dec.limits());
        encoding_id.encode(&mut canonical)?;
        let wire_id = (canonical.into_inner() != id_bytes).then(|| id_bytes.to_vec());

        Ok(Self {
            encoding_id,
            type_id: None,
            body,
            wire_id,
        })
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::null()
    }
}

impl BinaryEncode for Envelope {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        Envelope::encode(self, enc)
    }
}

impl BinaryDecode for Envelope {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        Envelope::decode(dec)
    }
}

/// Envelopes compare by encoding id and body; a raw and a decoded envelope
/// are never equal.
impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        if self.encoding_id != other.encoding_id {
            return false;
        }
        match (&self.body, &other.body) {
            (EnvelopeBody::Empty, EnvelopeBody::Empty) => true,
            (
                EnvelopeBody::Raw { format, bytes },
                EnvelopeBody::Raw {
                    format: other_format,
                    bytes: other_bytes,
                },
            ) => format == other_format && bytes == other_bytes,
            (
                EnvelopeBody::Decoded { value, codec },
                EnvelopeBody::Decoded {
                    value: other_value, ..
                },
            ) => codec.eq_values(value, other_value),
            _ => false,
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("encoding_id", &self.encoding_id)
            .field("type_id", &self.type_id)
            .field("body", &self.body)
            .finish()
    }
}
