// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use crate::core::types::{
    DataValue, DateTime, DiagnosticInfo, ExpandedNodeId, Guid, LocalizedText, NodeId,
    QualifiedName, Representation, StatusCode, Variant,
};
use crate::envelope::Envelope;

/// A value decoded without compiled type knowledge.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    // Builtins
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
    String(String),
    ByteString(Vec<u8>),
    XmlElement(String),
    DateTime(DateTime),
    Guid(Guid),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    DataValue(Box<DataValue>),
    Variant(Box<Variant>),
    DiagnosticInfo(Box<DiagnosticInfo>),
    /// `Char` or `WideChar` schema field.
    Char(char),

    /// Raw bit field, low bits first.
    Bits(u32),
    /// Enumeration value.
    Enum(i32),

    // Composites
    Array(Vec<Value>),
    Matrix {
        dimensions: Vec<i32>,
        elements: Vec<Value>,
    },
    Struct(GenericStruct),
    Envelope(Box<Envelope>),

    /// Bytes of a type the schema only describes by width.
    Opaque(Vec<u8>),
}

impl Value {
    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_array_like(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Matrix { .. })
    }

    /// Name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::SByte(_) => "SByte",
            Self::Byte(_) => "Byte",
            Self::Int16(_) => "Int16",
            Self::UInt16(_) => "UInt16",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Int64(_) => "Int64",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::ByteString(_) => "ByteString",
            Self::XmlElement(_) => "XmlElement",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::NodeId(_) => "NodeId",
            Self::ExpandedNodeId(_) => "ExpandedNodeId",
            Self::StatusCode(_) => "StatusCode",
            Self::QualifiedName(_) => "QualifiedName",
            Self::LocalizedText(_) => "LocalizedText",
            Self::DataValue(_) => "DataValue",
            Self::Variant(_) => "Variant",
            Self::DiagnosticInfo(_) => "DiagnosticInfo",
            Self::Char(_) => "Char",
            Self::Bits(_) => "Bits",
            Self::Enum(_) => "Enum",
            Self::Array(_) => "Array",
            Self::Matrix { .. } => "Matrix",
            Self::Struct(_) => "Struct",
            Self::Envelope(_) => "Envelope",
            Self::Opaque(_) => "Opaque",
        }
    }

    /// Shape for rank checks: "scalar", "array" or "matrix of rank n".
    pub fn shape_name(&self) -> String {
        match self {
            Self::Array(_) => "array".to_string(),
            Self::Matrix { dimensions, .. } => format!("matrix of rank {}", dimensions.len()),
            _ => "scalar".to_string(),
        }
    }

    /// Host representation of a scalar; `None` for null, composites and raw bits.
    pub fn representation(&self) -> Option<Representation> {
        let repr = match self {
            Self::Boolean(_) => Representation::Boolean,
            Self::SByte(_) => Representation::SByte,
            Self::Byte(_) => Representation::Byte,
            Self::Int16(_) => Representation::Int16,
            Self::UInt16(_) => Representation::UInt16,
            Self::Int32(_) | Self::Enum(_) => Representation::Int32,
            Self::UInt32(_) => Representation::UInt32,
            Self::Int64(_) => Representation::Int64,
            Self::UInt64(_) => Representation::UInt64,
            Self::Float(_) => Representation::Float,
            Self::Double(_) => Representation::Double,
            Self::String(_) => Representation::String,
            Self::ByteString(_) => Representation::ByteString,
            Self::XmlElement(_) => Representation::XmlElement,
            Self::DateTime(_) => Representation::DateTime,
            Self::Guid(_) => Representation::Guid,
            Self::NodeId(_) => Representation::NodeId,
            Self::ExpandedNodeId(_) => Representation::ExpandedNodeId,
            Self::StatusCode(_) => Representation::StatusCode,
            Self::QualifiedName(_) => Representation::QualifiedName,
            Self::LocalizedText(_) => Representation::LocalizedText,
            Self::DataValue(_) => Representation::DataValue,
            Self::Variant(_) => Representation::Variant,
            Self::DiagnosticInfo(_) => Representation::DiagnosticInfo,
            Self::Struct(_) | Self::Envelope(_) => Representation::ExtensionObject,
            Self::Null
            | Self::Char(_)
            | Self::Bits(_)
            | Self::Array(_)
            | Self::Matrix { .. }
            | Self::Opaque(_) => return None,
        };
        Some(repr)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) | Self::Enum(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) | Self::Bits(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::XmlElement(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::ByteString(v) | Self::Opaque(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&GenericStruct> {
        match self {
            Self::Struct(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Envelope(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($type:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from!(
    bool => Boolean,
    i8 => SByte,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    DateTime => DateTime,
    Guid => Guid,
    NodeId => NodeId,
    ExpandedNodeId => ExpandedNodeId,
    StatusCode => StatusCode,
    QualifiedName => QualifiedName,
    LocalizedText => LocalizedText,
    char => Char,
    GenericStruct => Struct,
    Vec<Value> => Array,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Envelope> for Value {
    fn from(v: Envelope) -> Self {
        Self::Envelope(Box::new(v))
    }
}

impl From<DataValue> for Value {
    fn from(v: DataValue) -> Self {
        Self::DataValue(Box::new(v))
    }
}

impl From<Variant> for Value {
    fn from(v: Variant) -> Self {
        Self::Variant(Box::new(v))
    }
}

impl From<DiagnosticInfo> for Value {
    fn from(v: DiagnosticInfo) -> Self {
        Self::DiagnosticInfo(Box::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Ordered name to value mapping standing in for a compiled structure.
///
/// Member order is insertion order; the codec reads members by name, so
/// order only matters for display and equality.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericStruct {
    pub type_name: String,
    members: Vec<(String, Value)>,
}

impl GenericStruct {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a member, replacing an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.members.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.members.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.members
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.members.iter().position(|(n, _)| n == name)?;
        Some(self.members.remove(index).1)
    }

    /// Present with a non-null value.
    pub fn is_specified(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.members.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
