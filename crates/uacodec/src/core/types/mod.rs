// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builtin OPC UA value types.

pub mod builtin;
pub mod encoding;
pub mod namespace;
pub mod node_id;
pub mod qualified;
pub mod scalar;
pub mod variant;

pub use builtin::{BuiltinKind, Representation};
pub use encoding::EncodingFormat;
pub use namespace::NamespaceTable;
pub use node_id::{Identifier, NodeId, TypeId};
pub use qualified::{ExpandedNodeId, LocalizedText, QualifiedName};
pub use scalar::{ByteString, DateTime, Guid, Matrix, StatusCode};
pub use variant::{DataValue, DiagnosticInfo, Variant, VariantValue};
