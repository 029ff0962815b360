// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-describing values: `Variant`, `DataValue`, `DiagnosticInfo`.
//!
//! A Variant starts with an encoding mask:
//!
//! | Bits | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0-5  | builtin type id (0 = empty Variant)       |
//! | 6    | array dimensions follow the elements      |
//! | 7    | Int32 element count, then the elements    |
//!
//! Nested Variants and DiagnosticInfos count against `max_recursion_depth`.

use super::builtin::BuiltinKind;
use super::node_id::NodeId;
use super::qualified::{ExpandedNodeId, LocalizedText, QualifiedName};
use super::scalar::{element_count, ByteString, DateTime, Guid, StatusCode};
use crate::core::ser::{BinaryDecode, BinaryDecoder, BinaryEncode, BinaryEncoder};
use crate::core::ser::{CodecError, CodecResult};
use crate::envelope::Envelope;

const TYPE_ID_MASK: u8 = 0x3F;
const DIMENSIONS_FLAG: u8 = 0x40;
const ARRAY_FLAG: u8 = 0x80;

/// One builtin value held by a [`Variant`].
#[derive(Debug, Clone, PartialEq)]
pub enum VariantValue {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(Option<String>),
    DateTime(DateTime),
    Guid(Guid),
    ByteString(ByteString),
    XmlElement(Option<String>),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    ExtensionObject(Box<Envelope>),
    DataValue(Box<DataValue>),
    /// Only valid as an array element.
    Variant(Box<Variant>),
    DiagnosticInfo(Box<DiagnosticInfo>),
}

impl VariantValue {
    pub fn kind(&self) -> BuiltinKind {
        match self {
            VariantValue::Boolean(_) => BuiltinKind::Boolean,
            VariantValue::SByte(_) => BuiltinKind::SByte,
            VariantValue::Byte(_) => BuiltinKind::Byte,
            VariantValue::Int16(_) => BuiltinKind::Int16,
            VariantValue::UInt16(_) => BuiltinKind::UInt16,
            VariantValue::Int32(_) => BuiltinKind::Int32,
            VariantValue::UInt32(_) => BuiltinKind::UInt32,
            VariantValue::Int64(_) => BuiltinKind::Int64,
            VariantValue::UInt64(_) => BuiltinKind::UInt64,
            VariantValue::Float(_) => BuiltinKind::Float,
            VariantValue::Double(_) => BuiltinKind::Double,
            VariantValue::String(_) => BuiltinKind::String,
            VariantValue::DateTime(_) => BuiltinKind::DateTime,
            VariantValue::Guid(_) => BuiltinKind::Guid,
            VariantValue::ByteString(_) => BuiltinKind::ByteString,
            VariantValue::XmlElement(_) => BuiltinKind::XmlElement,
            VariantValue::NodeId(_) => BuiltinKind::NodeId,
            VariantValue::ExpandedNodeId(_) => BuiltinKind::ExpandedNodeId,
            VariantValue::StatusCode(_) => BuiltinKind::StatusCode,
            VariantValue::QualifiedName(_) => BuiltinKind::QualifiedName,
            VariantValue::LocalizedText(_) => BuiltinKind::LocalizedText,
            VariantValue::ExtensionObject(_) => BuiltinKind::ExtensionObject,
            VariantValue::DataValue(_) => BuiltinKind::DataValue,
            VariantValue::Variant(_) => BuiltinKind::Variant,
            VariantValue::DiagnosticInfo(_) => BuiltinKind::DiagnosticInfo,
        }
    }

    fn encode_body(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        match self {
            VariantValue::Boolean(v) => enc.write_bool(*v),
            VariantValue::SByte(v) => enc.write_i8(*v),
            VariantValue::Byte(v) => enc.write_u8(*v),
            VariantValue::Int16(v) => enc.write_i16(*v),
            VariantValue::UInt16(v) => enc.write_u16(*v),
            VariantValue::Int32(v) => enc.write_i32(*v),
            VariantValue::UInt32(v) => enc.write_u32(*v),
            VariantValue::Int64(v) => enc.write_i64(*v),
            VariantValue::UInt64(v) => enc.write_u64(*v),
            VariantValue::Float(v) => enc.write_f32(*v),
            VariantValue::Double(v) => enc.write_f64(*v),
            VariantValue::String(v) | VariantValue::XmlElement(v) => {
                enc.write_string(v.as_deref())?
            }
            VariantValue::DateTime(v) => v.encode(enc)?,
            VariantValue::Guid(v) => v.encode(enc)?,
            VariantValue::ByteString(v) => v.encode(enc)?,
            VariantValue::NodeId(v) => v.encode(enc)?,
            VariantValue::ExpandedNodeId(v) => v.encode(enc)?,
            VariantValue::StatusCode(v) => v.encode(enc)?,
            VariantValue::QualifiedName(v) => v.encode(enc)?,
            VariantValue::LocalizedText(v) => v.encode(enc)?,
            VariantValue::ExtensionObject(v) => v.encode(enc)?,
            VariantValue::DataValue(v) => v.encode(enc)?,
            VariantValue::Variant(v) => v.encode(enc)?,
            VariantValue::DiagnosticInfo(v) => v.encode(enc)?,
        }
        Ok(())
    }

    fn decode_body(kind: BuiltinKind, dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let value = match kind {
            BuiltinKind::Boolean => VariantValue::Boolean(dec.read_bool()?),
            BuiltinKind::SByte => VariantValue::SByte(dec.read_i8()?),
            BuiltinKind::Byte => VariantValue::Byte(dec.read_u8()?),
            BuiltinKind::Int16 => VariantValue::Int16(dec.read_i16()?),
            BuiltinKind::UInt16 => VariantValue::UInt16(dec.read_u16()?),
            BuiltinKind::Int32 => VariantValue::Int32(dec.read_i32()?),
            BuiltinKind::UInt32 => VariantValue::UInt32(dec.read_u32()?),
            BuiltinKind::Int64 => VariantValue::Int64(dec.read_i64()?),
            BuiltinKind::UInt64 => VariantValue::UInt64(dec.read_u64()?),
            BuiltinKind::Float => VariantValue::Float(dec.read_f32()?),
            BuiltinKind::Double => VariantValue::Double(dec.read_f64()?),
            BuiltinKind::String => VariantValue::String(dec.read_string()?),
            BuiltinKind::DateTime => VariantValue::DateTime(DateTime::decode(dec)?),
            BuiltinKind::Guid => VariantValue::Guid(Guid::decode(dec)?),
            BuiltinKind::ByteString => VariantValue::ByteString(ByteString::decode(dec)?),
            BuiltinKind::XmlElement => VariantValue::XmlElement(dec.read_string()?),
            BuiltinKind::NodeId => VariantValue::NodeId(NodeId::decode(dec)?),
            BuiltinKind::ExpandedNodeId => {
                VariantValue::ExpandedNodeId(ExpandedNodeId::decode(dec)?)
            }
            BuiltinKind::StatusCode => VariantValue::StatusCode(StatusCode::decode(dec)?),
            BuiltinKind::QualifiedName => VariantValue::QualifiedName(QualifiedName::decode(dec)?),
            BuiltinKind::LocalizedText => VariantValue::LocalizedText(LocalizedText::decode(dec)?),
            BuiltinKind::ExtensionObject => {
                VariantValue::ExtensionObject(Box::new(Envelope::decode(dec)?))
            }
            BuiltinKind::DataValue => VariantValue::DataValue(Box::new(DataValue::decode(dec)?)),
            BuiltinKind::Variant => VariantValue::Variant(Box::new(Variant::decode(dec)?)),
            BuiltinKind::DiagnosticInfo => {
                VariantValue::DiagnosticInfo(Box::new(DiagnosticInfo::decode(dec)?))
            }
        };
        Ok(value)
    }
}

/// A value that carries its own builtin type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    #[default]
    Empty,
    Scalar(VariantValue),
    /// Elements of one kind; `dimensions` is written when present and
    /// describes a matrix over the flat element list.
    Array {
        kind: BuiltinKind,
        elements: Vec<VariantValue>,
        dimensions: Option<Vec<i32>>,
    },
}

impl Variant {
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// Builtin kind of the held value; `None` when empty.
    pub fn kind(&self) -> Option<BuiltinKind> {
        match self {
            Variant::Empty => None,
            Variant::Scalar(v) => Some(v.kind()),
            Variant::Array { kind, .. } => Some(*kind),
        }
    }

    pub fn array(kind: BuiltinKind, elements: Vec<VariantValue>) -> Self {
        Variant::Array {
            kind,
            elements,
            dimensions: None,
        }
    }
}

impl From<VariantValue> for Variant {
    fn from(v: VariantValue) -> Self {
        Variant::Scalar(v)
    }
}

impl BinaryEncode for Variant {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.nested(|enc| match self {
            Variant::Empty => {
                enc.write_u8(0);
                Ok(())
            }
            Variant::Scalar(VariantValue::Variant(_)) => Err(CodecError::invalid(
                "a Variant cannot hold a scalar Variant",
            )),
            Variant::Scalar(value) => {
                enc.write_u8(value.kind().id() as u8);
                value.encode_body(enc)
            }
            Variant::Array {
                kind,
                elements,
                dimensions,
            } => {
                if let Some(stray) = elements.iter().find(|e| e.kind() != *kind) {
                    return Err(CodecError::mismatch(kind.name(), stray.kind().name()));
                }
                if let Some(dimensions) = dimensions {
                    let count = element_count(dimensions)?;
                    if count != elements.len() {
                        return Err(CodecError::invalid(format!(
                            "Variant dimensions describe {} elements, got {}",
                            count,
                            elements.len()
                        )));
                    }
                }
                let mut mask = kind.id() as u8 | ARRAY_FLAG;
                if dimensions.is_some() {
                    mask |= DIMENSIONS_FLAG;
                }
                enc.write_u8(mask);
                enc.write_array_length(Some(elements.len()))?;
                for element in elements {
                    element.encode_body(enc)?;
                }
                if let Some(dimensions) = dimensions {
                    enc.write_array_length(Some(dimensions.len()))?;
                    for dim in dimensions {
                        enc.write_i32(*dim);
                    }
                }
                Ok(())
            }
        })
    }
}

impl BinaryDecode for Variant {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        dec.nested(|dec| {
            let offset = dec.offset();
            let mask = dec.read_u8()?;
            if mask == 0 {
                return Ok(Variant::Empty);
            }
            let type_id = mask & TYPE_ID_MASK;
            let kind = BuiltinKind::from_id(u32::from(type_id)).ok_or_else(|| {
                CodecError::invalid(format!(
                    "Variant at offset {} has unknown type id {}",
                    offset, type_id
                ))
            })?;
            if mask & ARRAY_FLAG == 0 {
                if kind == BuiltinKind::Variant {
                    return Err(CodecError::invalid(format!(
                        "Variant at offset {} holds a scalar Variant",
                        offset
                    )));
                }
                return VariantValue::decode_body(kind, dec).map(Variant::Scalar);
            }

            let Some(count) = dec.read_array_length()? else {
                return Ok(Variant::Empty);
            };
            let mut elements = Vec::with_capacity(count.min(dec.remaining()));
            for _ in 0..count {
                elements.push(VariantValue::decode_body(kind, dec)?);
            }
            let dimensions = if mask & DIMENSIONS_FLAG != 0 {
                let rank = dec.read_array_length()?.unwrap_or(0);
                let mut dimensions = Vec::with_capacity(rank.min(dec.remaining() / 4));
                for _ in 0..rank {
                    dimensions.push(dec.read_i32()?);
                }
                if element_count(&dimensions)? != count {
                    return Err(CodecError::invalid(format!(
                        "Variant at offset {}: dimensions do not match {} elements",
                        offset, count
                    )));
                }
                Some(dimensions)
            } else {
                None
            };
            Ok(Variant::Array {
                kind,
                elements,
                dimensions,
            })
        })
    }
}

/// A value with its status and timestamps; every part is optional.
///
/// The leading mask byte flags value (0x01), status (0x02), source
/// timestamp (0x04), server timestamp (0x08), source picoseconds (0x10) and
/// server picoseconds (0x20). Source fields precede server fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    pub value: Option<Variant>,
    pub status: Option<StatusCode>,
    pub source_timestamp: Option<DateTime>,
    pub source_picoseconds: Option<u16>,
    pub server_timestamp: Option<DateTime>,
    pub server_picoseconds: Option<u16>,
}

impl DataValue {
    pub fn new(value: Variant) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    fn mask(&self) -> u8 {
        let mut mask = 0;
        for (set, bit) in [
            (self.value.is_some(), 0x01),
            (self.status.is_some(), 0x02),
            (self.source_timestamp.is_some(), 0x04),
            (self.server_timestamp.is_some(), 0x08),
            (self.source_picoseconds.is_some(), 0x10),
            (self.server_picoseconds.is_some(), 0x20),
        ] {
            if set {
                mask |= bit;
            }
        }
        mask
    }
}

impl BinaryEncode for DataValue {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_u8(self.mask());
        if let Some(value) = &self.value {
            value.encode(enc)?;
        }
        if let Some(status) = self.status {
            status.encode(enc)?;
        }
        if let Some(ts) = self.source_timestamp {
            ts.encode(enc)?;
        }
        if let Some(ps) = self.source_picoseconds {
            enc.write_u16(ps);
        }
        if let Some(ts) = self.server_timestamp {
            ts.encode(enc)?;
        }
        if let Some(ps) = self.server_picoseconds {
            enc.write_u16(ps);
        }
        Ok(())
    }
}

impl BinaryDecode for DataValue {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let mask = dec.read_u8()?;
        let value = if mask & 0x01 != 0 {
            Some(Variant::decode(dec)?)
        } else {
            None
        };
        let status = if mask & 0x02 != 0 {
            Some(StatusCode::decode(dec)?)
        } else {
            None
        };
        let source_timestamp = if mask & 0x04 != 0 {
            Some(DateTime::decode(dec)?)
        } else {
            None
        };
        let source_picoseconds = if mask & 0x10 != 0 {
            Some(dec.read_u16()?)
        } else {
            None
        };
        let server_timestamp = if mask & 0x08 != 0 {
            Some(DateTime::decode(dec)?)
        } else {
            None
        };
        let server_picoseconds = if mask & 0x20 != 0 {
            Some(dec.read_u16()?)
        } else {
            None
        };
        Ok(Self {
            value,
            status,
            source_timestamp,
            source_picoseconds,
            server_timestamp,
            server_picoseconds,
        })
    }
}

/// Vendor diagnostics attached to a status; string fields are indexes into
/// a response-level string table. A mask byte of 0 is the empty value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticInfo {
    pub symbolic_id: Option<i32>,
    pub namespace_uri: Option<i32>,
    pub localized_text: Option<i32>,
    pub locale: Option<i32>,
    pub additional_info: Option<String>,
    pub inner_status_code: Option<StatusCode>,
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

impl DiagnosticInfo {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl BinaryEncode for DiagnosticInfo {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.nested(|enc| {
            let mut mask = 0u8;
            for (set, bit) in [
                (self.symbolic_id.is_some(), 0x01),
                (self.namespace_uri.is_some(), 0x02),
                (self.localized_text.is_some(), 0x04),
                (self.locale.is_some(), 0x08),
                (self.additional_info.is_some(), 0x10),
                (self.inner_status_code.is_some(), 0x20),
                (self.inner_diagnostic_info.is_some(), 0x40),
            ] {
                if set {
                    mask |= bit;
                }
            }
            enc.write_u8(mask);
            for index in [
                self.symbolic_id,
                self.namespace_uri,
                self.localized_text,
                self.locale,
            ]
            .into_iter()
            .flatten()
            {
                enc.write_i32(index);
            }
            if let Some(info) = &self.additional_info {
                enc.write_string(Some(info.as_str()))?;
            }
            if let Some(status) = self.inner_status_code {
                status.encode(enc)?;
            }
            if let Some(inner) = &self.inner_diagnostic_info {
                inner.encode(enc)?;
            }
            Ok(())
        })
    }
}

impl BinaryDecode for DiagnosticInfo {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        dec.nested(|dec| {
            let mask = dec.read_u8()?;
            let symbolic_id = read_index(dec, mask, 0x01)?;
            let namespace_uri = read_index(dec, mask, 0x02)?;
            let localized_text = read_index(dec, mask, 0x04)?;
            let locale = read_index(dec, mask, 0x08)?;
            let additional_info = if mask & 0x10 != 0 {
                dec.read_string()?
            } else {
                None
            };
            let inner_status_code = if mask & 0x20 != 0 {
                Some(StatusCode::decode(dec)?)
            } else {
                None
            };
            let inner_diagnostic_info = if mask & 0x40 != 0 {
                Some(Box::new(DiagnosticInfo::decode(dec)?))
            } else {
                None
            };
            Ok(Self {
                symbolic_id,
                namespace_uri,
                localized_text,
                locale,
                additional_info,
                inner_status_code,
                inner_diagnostic_info,
            })
        })
    }
}

fn read_index(dec: &mut BinaryDecoder<'_>, mask: u8, bit: u8) -> CodecResult<Option<i32>> {
    if mask & bit != 0 {
        dec.read_i32().map(Some)
    } else {
        Ok(None)
    }
}
