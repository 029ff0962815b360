// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data type tree.
//!
//! An immutable hierarchy of [`TypeNode`]s keyed by [`TypeId`]. Parents are
//! stored as ids and resolved through the flat table, so the tree owns no
//! cycles and can be cloned and replaced wholesale when the server's type
//! catalog changes.
//!
//! # Queries
//!
//! - [`DataTypeTree::is_subtype_of`] - strict ancestry through parent links
//! - [`DataTypeTree::builtin_type`] - nearest builtin ancestor (`Variant` if none)
//! - [`DataTypeTree::backing_representation`] - host representation of values
//! - [`DataTypeTree::is_assignable`] - may a value of some representation be stored here
//!
//! `builtin_type` and `backing_representation` deliberately disagree for
//! enumerations: their builtin ancestor is `Variant` (through `BaseDataType`)
//! while their values are backed by `Int32`.

pub mod builder;
pub mod node;
pub mod validate;

#[cfg(test)]
mod tests;

pub use builder::{DataTypeCatalog, DataTypeTreeBuilder, InMemoryCatalog, StandardCatalog};
pub use node::{
    DataTypeDefinition, EnumDefinition, EnumField, StructureDefinition, StructureField,
    StructureKind, TypeNode, ValueRank,
};

use crate::config::{
    BASE_DATA_TYPE_ID, ENUMERATION_TYPE_ID, INTEGER_TYPE_ID, NUMBER_TYPE_ID, STRUCTURE_TYPE_ID,
    UINTEGER_TYPE_ID,
};
use crate::core::ser::CodecResult;
use crate::core::types::{BuiltinKind, EncodingFormat, NodeId, Representation, TypeId};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct DataTypeTree {
    nodes: HashMap<TypeId, TypeNode>,
    children: HashMap<TypeId, Vec<TypeId>>,
    encodings: HashMap<NodeId, (EncodingFormat, TypeId)>,
}

impl DataTypeTree {
    /// Namespace-0 base hierarchy only.
    pub fn standard() -> Self {
        DataTypeTreeBuilder::new()
            .browse(&StandardCatalog, &NodeId::ns0(BASE_DATA_TYPE_ID))
            .build()
    }

    pub(crate) fn from_nodes(nodes: impl IntoIterator<Item = TypeNode>) -> Self {
        let mut tree = DataTypeTree::default();
        for node in nodes {
            tree.insert(node);
        }
        tree
    }

    fn insert(&mut self, node: TypeNode) {
        let id = node.type_id.clone();
        if let Some(previous) = self.nodes.get(&id) {
            if let Some(parent) = &previous.parent {
                if let Some(siblings) = self.children.get_mut(parent) {
                    siblings.retain(|c| c != &id);
                }
            }
            self.encodings.retain(|_, (_, owner)| owner != &id);
        }
        if let Some(parent) = &node.parent {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(id.clone());
        }
        let encodings = [
            (EncodingFormat::Binary, &node.binary_encoding_id),
            (EncodingFormat::Xml, &node.xml_encoding_id),
            (EncodingFormat::Json, &node.json_encoding_id),
        ];
        for (format, encoding_id) in encodings {
            if let Some(encoding_id) = encoding_id {
                self.encodings
                    .insert(encoding_id.clone(), (format, id.clone()));
            }
        }
        self.nodes.insert(id, node);
    }

    pub fn get_node(&self, id: &TypeId) -> Option<&TypeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &TypeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.values()
    }

    pub fn parent(&self, id: &TypeId) -> Option<&TypeId> {
        self.nodes.get(id).and_then(|n| n.parent.as_ref())
    }

    pub fn children(&self, id: &TypeId) -> &[TypeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when `ancestor` is a strict ancestor of `id`.
    pub fn is_subtype_of(&self, id: &TypeId, ancestor: &TypeId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Nearest builtin at or above `id`; `Variant` when the walk runs out.
    pub fn builtin_type(&self, id: &TypeId) -> BuiltinKind {
        let mut current = Some(id);
        while let Some(type_id) = current {
            if let Some(kind) = BuiltinKind::from_node_id(type_id) {
                return kind;
            }
            current = self.parent(type_id);
        }
        BuiltinKind::Variant
    }

    pub fn backing_representation(&self, id: &TypeId) -> Representation {
        let mut current = Some(id);
        while let Some(type_id) = current {
            if let Some(repr) = intrinsic_representation(type_id) {
                return repr;
            }
            current = self.parent(type_id);
        }
        Representation::Any
    }

    /// Whether a value represented as `candidate` may be stored under `id`.
    ///
    /// The signed and unsigned integer families share no concrete supertype,
    /// so they enumerate their members instead of using a supertype check.
    pub fn is_assignable(&self, id: &TypeId, candidate: Representation) -> bool {
        match id.as_ns0() {
            Some(INTEGER_TYPE_ID) => matches!(
                candidate,
                Representation::SByte
                    | Representation::Int16
                    | Representation::Int32
                    | Representation::Int64
            ),
            Some(UINTEGER_TYPE_ID) => candidate.is_unsigned(),
            _ => self.backing_representation(id).accepts(candidate),
        }
    }

    pub fn is_enum_type(&self, id: &TypeId) -> bool {
        self.is_subtype_of(id, &NodeId::ns0(ENUMERATION_TYPE_ID))
    }

    /// Structures and unions (unions derive from `Structure`).
    pub fn is_struct_type(&self, id: &TypeId) -> bool {
        self.is_subtype_of(id, &NodeId::ns0(STRUCTURE_TYPE_ID))
    }

    pub fn encoding_id(&self, id: &TypeId, format: EncodingFormat) -> Option<&NodeId> {
        let node = self.nodes.get(id)?;
        match format {
            EncodingFormat::Binary => node.binary_encoding_id.as_ref(),
            EncodingFormat::Xml => node.xml_encoding_id.as_ref(),
            EncodingFormat::Json => node.json_encoding_id.as_ref(),
        }
    }

    /// Reverse lookup from an encoding node id to its data type.
    pub fn node_for_encoding(&self, encoding_id: &NodeId) -> Option<(EncodingFormat, &TypeNode)> {
        let (format, type_id) = self.encodings.get(encoding_id)?;
        self.nodes.get(type_id).map(|n| (*format, n))
    }

    pub fn find_by_name(&self, namespace: u16, browse_name: &str) -> Option<&TypeNode> {
        self.nodes
            .values()
            .find(|n| n.type_id.namespace() == namespace && n.browse_name == browse_name)
    }

    /// Field set of a structured type including inherited fields.
    pub fn structure_fields(&self, id: &TypeId) -> CodecResult<Vec<StructureField>> {
        crate::structured::flatten_fields(self, id)
    }
}

/// Representation of ids that need no parent walk.
fn intrinsic_representation(id: &TypeId) -> Option<Representation> {
    let numeric = id.as_ns0()?;
    match numeric {
        ENUMERATION_TYPE_ID => Some(Representation::Int32),
        NUMBER_TYPE_ID | INTEGER_TYPE_ID => Some(Representation::Number),
        UINTEGER_TYPE_ID => Some(Representation::UnsignedNumber),
        _ => BuiltinKind::from_id(numeric).map(BuiltinKind::representation),
    }
}
