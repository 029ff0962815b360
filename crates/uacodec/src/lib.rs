// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # uacodec - OPC UA binary encoding
//!
//! Converts typed values (scalars, arrays, matrices, nested structures,
//! unions and extension objects) to and from the OPC UA binary encoding,
//! resolving types through a hierarchical data type tree.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use uacodec::{decode_from_slice, encode_to_vec, UaStructure};
//!
//! #[derive(Debug, PartialEq, UaStructure)]
//! #[ua(namespace = 2, id = 5001, encoding_id = 5002)]
//! struct Sample {
//!     foo: String,
//!     #[ua(optional)]
//!     bar: Option<u32>,
//! }
//!
//! fn main() -> uacodec::CodecResult<()> {
//!     let bytes = encode_to_vec(&Sample { foo: "hi".into(), bar: Some(7) })?;
//!     let back: Sample = decode_from_slice(&bytes)?;
//!     assert_eq!(back.bar, Some(7));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                    Envelope dispatch (envelope)                     |
//! |   CodecRegistry (EncodingFormat, TypeId) -> compiled | dynamic      |
//! +---------------------------------------------------------------------+
//! |   Compiled codecs (structured)   |   Schema-driven codecs (dynamic) |
//! |   #[derive(UaStructure/UaEnum)]  |   SchemaDocument -> GenericStruct |
//! +---------------------------------------------------------------------+
//! |                 Primitive codec (core::ser, core::types)            |
//! |   little-endian scalars | Int32 lengths (-1 = null) | LSB-first bits|
//! +---------------------------------------------------------------------+
//! |                    Data type tree (typetree)                        |
//! +---------------------------------------------------------------------+
//! ```
//!
//! Both codec paths produce identical bytes for the same value: a Schema
//! Document produced by [`schema::SchemaGenerator`] from compiled
//! definitions drives [`dynamic::DynamicStructCodec`] to the same wire form.
//!
//! ## Modules Overview
//!
//! - [`core`] - cursors, builtin value types, error taxonomy
//! - [`typetree`] - data type hierarchy and value validation
//! - [`structured`] - compiled structure and union protocol
//! - [`dynamic`] - schema-driven codec and generic values
//! - [`schema`] - Schema Documents, XML form, generator
//! - [`envelope`] - extension objects and the codec registry
//! - [`config`] - wire constants and encoding limits

// Allow the derive macros to work inside this crate's tests
extern crate self as uacodec;

/// Wire constants and encoding limits.
pub mod config;
/// Primitive codec and builtin value types.
pub mod core;
/// Schema-driven structure codec.
pub mod dynamic;
/// Extension objects and codec registry.
pub mod envelope;
/// Scratch buffer pool.
pub mod pool;
/// Schema Documents and the schema generator.
pub mod schema;
/// Compiled structure and union protocol.
pub mod structured;
/// Data type tree and validation.
pub mod typetree;

pub use crate::config::EncodingLimits;
pub use crate::core::ser::{
    decode_from_slice, decode_with_limits, encode_to_vec, BinaryDecode, BinaryDecoder,
    BinaryEncode, BinaryEncoder, CodecError, CodecResult,
};
pub use crate::core::types::{
    BuiltinKind, ByteString, DataValue, DateTime, DiagnosticInfo, EncodingFormat, ExpandedNodeId,
    Guid, LocalizedText, Matrix, NamespaceTable, NodeId, QualifiedName, StatusCode, TypeId,
    Variant, VariantValue,
};
pub use crate::dynamic::{DynamicStructCodec, GenericStruct, SchemaSet, Value};
pub use crate::envelope::{CodecRegistry, Envelope, RegistryHandle};
pub use crate::schema::{SchemaDocument, SchemaGenerator};
pub use crate::structured::{UaDataType, UaEnumeration, UaStructure};
pub use crate::typetree::DataTypeTree;

pub use uacodec_codegen::{UaEnum, UaStructure};
