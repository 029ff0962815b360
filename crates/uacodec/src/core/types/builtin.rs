// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The 25 builtin data types and the host representations that back them.

use super::node_id::NodeId;

/// Builtin type kinds, numbered as their namespace-0 node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BuiltinKind {
    Boolean = 1,
    SByte = 2,
    Byte = 3,
    Int16 = 4,
    UInt16 = 5,
    Int32 = 6,
    UInt32 = 7,
    Int64 = 8,
    UInt64 = 9,
    Float = 10,
    Double = 11,
    String = 12,
    DateTime = 13,
    Guid = 14,
    ByteString = 15,
    XmlElement = 16,
    NodeId = 17,
    ExpandedNodeId = 18,
    StatusCode = 19,
    QualifiedName = 20,
    LocalizedText = 21,
    ExtensionObject = 22,
    DataValue = 23,
    Variant = 24,
    DiagnosticInfo = 25,
}

const ALL: [BuiltinKind; 25] = [
    BuiltinKind::Boolean,
    BuiltinKind::SByte,
    BuiltinKind::Byte,
    BuiltinKind::Int16,
    BuiltinKind::UInt16,
    BuiltinKind::Int32,
    BuiltinKind::UInt32,
    BuiltinKind::Int64,
    BuiltinKind::UInt64,
    BuiltinKind::Float,
    BuiltinKind::Double,
    BuiltinKind::String,
    BuiltinKind::DateTime,
    BuiltinKind::Guid,
    BuiltinKind::ByteString,
    BuiltinKind::XmlElement,
    BuiltinKind::NodeId,
    BuiltinKind::ExpandedNodeId,
    BuiltinKind::StatusCode,
    BuiltinKind::QualifiedName,
    BuiltinKind::LocalizedText,
    BuiltinKind::ExtensionObject,
    BuiltinKind::DataValue,
    BuiltinKind::Variant,
    BuiltinKind::DiagnosticInfo,
];

impl BuiltinKind {
    pub fn from_id(id: u32) -> Option<Self> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        ALL.get(index).copied()
    }

    /// Builtin kind of a namespace-0 node id, if it is one.
    pub fn from_node_id(id: &NodeId) -> Option<Self> {
        id.as_ns0().and_then(Self::from_id)
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn type_id(self) -> NodeId {
        NodeId::ns0(self.id())
    }

    /// Name used by the binary schema vocabulary.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Boolean => "Boolean",
            BuiltinKind::SByte => "SByte",
            BuiltinKind::Byte => "Byte",
            BuiltinKind::Int16 => "Int16",
            BuiltinKind::UInt16 => "UInt16",
            BuiltinKind::Int32 => "Int32",
            BuiltinKind::UInt32 => "UInt32",
            BuiltinKind::Int64 => "Int64",
            BuiltinKind::UInt64 => "UInt64",
            BuiltinKind::Float => "Float",
            BuiltinKind::Double => "Double",
            BuiltinKind::String => "String",
            BuiltinKind::DateTime => "DateTime",
            BuiltinKind::Guid => "Guid",
            BuiltinKind::ByteString => "ByteString",
            BuiltinKind::XmlElement => "XmlElement",
            BuiltinKind::NodeId => "NodeId",
            BuiltinKind::ExpandedNodeId => "ExpandedNodeId",
            BuiltinKind::StatusCode => "StatusCode",
            BuiltinKind::QualifiedName => "QualifiedName",
            BuiltinKind::LocalizedText => "LocalizedText",
            BuiltinKind::ExtensionObject => "ExtensionObject",
            BuiltinKind::DataValue => "DataValue",
            BuiltinKind::Variant => "Variant",
            BuiltinKind::DiagnosticInfo => "DiagnosticInfo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Host representation backing values of this kind.
    pub fn representation(self) -> Representation {
        match self {
            BuiltinKind::Boolean => Representation::Boolean,
            BuiltinKind::SByte => Representation::SByte,
            BuiltinKind::Byte => Representation::Byte,
            BuiltinKind::Int16 => Representation::Int16,
            BuiltinKind::UInt16 => Representation::UInt16,
            BuiltinKind::Int32 => Representation::Int32,
            BuiltinKind::UInt32 => Representation::UInt32,
            BuiltinKind::Int64 => Representation::Int64,
            BuiltinKind::UInt64 => Representation::UInt64,
            BuiltinKind::Float => Representation::Float,
            BuiltinKind::Double => Representation::Double,
            BuiltinKind::String => Representation::String,
            BuiltinKind::DateTime => Representation::DateTime,
            BuiltinKind::Guid => Representation::Guid,
            BuiltinKind::ByteString => Representation::ByteString,
            BuiltinKind::XmlElement => Representation::XmlElement,
            BuiltinKind::NodeId => Representation::NodeId,
            BuiltinKind::ExpandedNodeId => Representation::ExpandedNodeId,
            BuiltinKind::StatusCode => Representation::StatusCode,
            BuiltinKind::QualifiedName => Representation::QualifiedName,
            BuiltinKind::LocalizedText => Representation::LocalizedText,
            BuiltinKind::ExtensionObject => Representation::ExtensionObject,
            BuiltinKind::DataValue => Representation::DataValue,
            BuiltinKind::Variant => Representation::Variant,
            BuiltinKind::DiagnosticInfo => Representation::DiagnosticInfo,
        }
    }
}

/// Host-side shape of a value, as resolved by the type tree.
///
/// `Number` and `UnsignedNumber` are the abstract supertypes shared by the
/// concrete numeric kinds; `Any` is the representation of unrooted types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    Guid,
    ByteString,
    XmlElement,
    NodeId,
    ExpandedNodeId,
    StatusCode,
    QualifiedName,
    LocalizedText,
    ExtensionObject,
    DataValue,
    Variant,
    DiagnosticInfo,
    Number,
    UnsignedNumber,
    Any,
}

impl Representation {
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Representation::Byte
                | Representation::UInt16
                | Representation::UInt32
                | Representation::UInt64
                | Representation::UnsignedNumber
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_unsigned()
            || matches!(
                self,
                Representation::SByte
                    | Representation::Int16
                    | Representation::Int32
                    | Representation::Int64
                    | Representation::Float
                    | Representation::Double
                    | Representation::Number
            )
    }

    /// Supertype check: a value represented as `candidate` may be stored
    /// where `self` is expected.
    pub fn accepts(self, candidate: Representation) -> bool {
        match self {
            Representation::Any | Representation::Variant => true,
            Representation::Number => candidate.is_numeric(),
            Representation::UnsignedNumber => candidate.is_unsigned(),
            other => other == candidate,
        }
    }
}
