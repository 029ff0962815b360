// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured type codec protocol.
//!
//! Compiled structures implement [`UaStructure`], usually through
//! `#[derive(UaStructure)]`:
//!
//! - a plain struct writes its fields in order;
//! - a struct with `#[ua(optional)]` fields writes a [`PresenceMask`] first
//!   and then only the present fields;
//! - an enum with one unit variant and single-field tuple variants is a
//!   union, framed by a UInt32 discriminant (see [`union`]).
//!
//! Enumerations implement [`UaEnumeration`] (`#[derive(UaEnum)]`) and travel
//! as Int32.
//!
//! ```ignore
//! use uacodec::UaStructure;
//!
//! #[derive(UaStructure)]
//! #[ua(namespace = 2, id = 5001, encoding_id = 5002)]
//! struct Sample {
//!     foo: String,
//!     #[ua(optional)]
//!     bar: Option<u32>,
//! }
//! ```

pub mod flatten;
pub mod presence;
pub mod union;

pub use flatten::{flatten_definition, flatten_fields, is_structure_root, merge_fields};
pub use presence::PresenceMask;
pub use union::{read_discriminant, unknown_discriminant, write_discriminant};

use crate::config::STRUCTURE_TYPE_ID;
use crate::core::ser::{BinaryDecode, BinaryEncode};
use crate::core::types::{
    BuiltinKind, ByteString, DataValue, DateTime, DiagnosticInfo, ExpandedNodeId, Guid,
    LocalizedText, Matrix, NodeId, QualifiedName, StatusCode, TypeId, Variant,
};
use crate::envelope::Envelope;
use crate::typetree::{EnumDefinition, StructureDefinition, StructureField, TypeNode, ValueRank};

/// Data type id and value rank of a Rust type used as a structure field.
pub trait UaDataType {
    fn data_type_id() -> TypeId;

    /// Raw value rank: -1 scalar, 1 array, n > 1 matrix.
    const VALUE_RANK: i32 = -1;
}

/// A compiled structured type or union.
pub trait UaStructure: BinaryEncode + BinaryDecode + UaDataType {
    const TYPE_NAME: &'static str;

    fn binary_encoding_id() -> NodeId;

    /// Field set in wire order, including fields held for a base type.
    fn definition() -> StructureDefinition;

    fn type_node() -> TypeNode {
        TypeNode::structure(
            Self::data_type_id(),
            Self::TYPE_NAME,
            Self::binary_encoding_id(),
            Self::definition(),
        )
    }
}

/// A compiled enumeration.
pub trait UaEnumeration: BinaryEncode + BinaryDecode + UaDataType {
    const TYPE_NAME: &'static str;

    fn definition() -> EnumDefinition;

    fn type_node() -> TypeNode {
        TypeNode::enumeration(Self::data_type_id(), Self::TYPE_NAME, Self::definition())
    }
}

/// Field descriptor for a member of Rust type `T`.
pub fn field_of<T: UaDataType + ?Sized>(name: &str) -> StructureField {
    let rank = ValueRank::from_i32(T::VALUE_RANK).unwrap_or(ValueRank::Scalar);
    StructureField::new(name, T::data_type_id()).rank(rank)
}

macro_rules! impl_builtin_data_type {
    ($($type:ty => $kind:ident),* $(,)?) => {
        $(
            impl UaDataType for $type {
                fn data_type_id() -> TypeId {
                    BuiltinKind::$kind.type_id()
                }
            }
        )*
    };
}

impl_builtin_data_type!(
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
    Option<String> => String,
    ByteString => ByteString,
    DateTime => DateTime,
    Guid => Guid,
    StatusCode => StatusCode,
    NodeId => NodeId,
    ExpandedNodeId => ExpandedNodeId,
    QualifiedName => QualifiedName,
    LocalizedText => LocalizedText,
    DataValue => DataValue,
    Variant => Variant,
    DiagnosticInfo => DiagnosticInfo,
);

impl<T: UaDataType> UaDataType for Vec<T> {
    fn data_type_id() -> TypeId {
        T::data_type_id()
    }

    const VALUE_RANK: i32 = 1;
}

impl<T: UaDataType> UaDataType for Option<Vec<T>> {
    fn data_type_id() -> TypeId {
        T::data_type_id()
    }

    const VALUE_RANK: i32 = 1;
}

/// Two dimensions unless the field overrides it with `#[ua(rank = n)]`.
impl<T: UaDataType> UaDataType for Matrix<T> {
    fn data_type_id() -> TypeId {
        T::data_type_id()
    }

    const VALUE_RANK: i32 = 2;
}

impl<T: UaDataType> UaDataType for Box<T> {
    fn data_type_id() -> TypeId {
        T::data_type_id()
    }

    const VALUE_RANK: i32 = T::VALUE_RANK;
}

/// Envelope fields are declared as the abstract `Structure`.
impl UaDataType for Envelope {
    fn data_type_id() -> TypeId {
        NodeId::ns0(STRUCTURE_TYPE_ID)
    }
}
