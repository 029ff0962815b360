// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type tree construction.
//!
//! A tree is built by walking "has subtype" edges down from a root through a
//! [`DataTypeCatalog`] (a remote address space, an embedded table, a test
//! fixture), and can be extended with locally known nodes before it is
//! frozen by [`DataTypeTreeBuilder::build`].

use super::node::TypeNode;
use super::DataTypeTree;
use crate::config::{
    BASE_DATA_TYPE_ID, DURATION_TYPE_ID, ENUMERATION_TYPE_ID, INTEGER_TYPE_ID, NUMBER_TYPE_ID,
    STRUCTURE_TYPE_ID, UINTEGER_TYPE_ID, UNION_TYPE_ID, UTC_TIME_TYPE_ID,
};
use crate::core::types::{BuiltinKind, NodeId, TypeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Source of data type nodes and their subtype edges.
pub trait DataTypeCatalog {
    /// Node description; the builder overwrites `parent` from the edge walked.
    fn describe(&self, id: &TypeId) -> Option<TypeNode>;

    /// Direct subtypes of `id`.
    fn subtypes(&self, id: &TypeId) -> Vec<TypeId>;
}

#[derive(Debug, Default)]
pub struct DataTypeTreeBuilder {
    nodes: Vec<TypeNode>,
}

impl DataTypeTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from every node of an existing tree.
    pub fn from_tree(tree: &DataTypeTree) -> Self {
        Self {
            nodes: tree.iter().cloned().collect(),
        }
    }

    /// Breadth-first walk of `catalog` from `root`. Ids already visited are
    /// skipped, so a catalog that reports an edge twice cannot loop.
    pub fn browse(mut self, catalog: &dyn DataTypeCatalog, root: &TypeId) -> Self {
        let Some(root_node) = catalog.describe(root) else {
            log::warn!("[typetree] catalog has no root {}", root);
            return self;
        };
        let mut visited: HashSet<TypeId> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(root.clone());
        self.nodes.push(root_node);
        queue.push_back(root.clone());

        while let Some(parent) = queue.pop_front() {
            for child in catalog.subtypes(&parent) {
                if !visited.insert(child.clone()) {
                    continue;
                }
                match catalog.describe(&child) {
                    Some(mut node) => {
                        node.parent = Some(parent.clone());
                        self.nodes.push(node);
                        queue.push_back(child);
                    }
                    None => log::debug!("[typetree] skipping undescribed subtype {}", child),
                }
            }
        }
        log::debug!("[typetree] browsed {} nodes from {}", visited.len(), root);
        self
    }

    /// Add or replace a node; the last insertion of an id wins.
    pub fn with_node(mut self, node: TypeNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = TypeNode>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    pub fn build(self) -> DataTypeTree {
        DataTypeTree::from_nodes(self.nodes)
    }
}

/// Embedded namespace-0 hierarchy: builtins, the abstract numeric families,
/// `Structure`/`Union`, `Enumeration` and the common scalar subtypes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCatalog;

/// (id, browse name, parent, abstract)
const STANDARD_TYPES: &[(u32, &str, Option<u32>, bool)] = &[
    (BASE_DATA_TYPE_ID, "BaseDataType", None, true),
    (1, "Boolean", Some(BASE_DATA_TYPE_ID), false),
    (NUMBER_TYPE_ID, "Number", Some(BASE_DATA_TYPE_ID), true),
    (INTEGER_TYPE_ID, "Integer", Some(NUMBER_TYPE_ID), true),
    (2, "SByte", Some(INTEGER_TYPE_ID), false),
    (4, "Int16", Some(INTEGER_TYPE_ID), false),
    (6, "Int32", Some(INTEGER_TYPE_ID), false),
    (8, "Int64", Some(INTEGER_TYPE_ID), false),
    (UINTEGER_TYPE_ID, "UInteger", Some(NUMBER_TYPE_ID), true),
    (3, "Byte", Some(UINTEGER_TYPE_ID), false),
    (5, "UInt16", Some(UINTEGER_TYPE_ID), false),
    (7, "UInt32", Some(UINTEGER_TYPE_ID), false),
    (9, "UInt64", Some(UINTEGER_TYPE_ID), false),
    (10, "Float", Some(NUMBER_TYPE_ID), false),
    (11, "Double", Some(NUMBER_TYPE_ID), false),
    (DURATION_TYPE_ID, "Duration", Some(11), false),
    (12, "String", Some(BASE_DATA_TYPE_ID), false),
    (13, "DateTime", Some(BASE_DATA_TYPE_ID), false),
    (UTC_TIME_TYPE_ID, "UtcTime", Some(13), false),
    (14, "Guid", Some(BASE_DATA_TYPE_ID), false),
    (15, "ByteString", Some(BASE_DATA_TYPE_ID), false),
    (16, "XmlElement", Some(BASE_DATA_TYPE_ID), false),
    (17, "NodeId", Some(BASE_DATA_TYPE_ID), false),
    (18, "ExpandedNodeId", Some(BASE_DATA_TYPE_ID), false),
    (19, "StatusCode", Some(BASE_DATA_TYPE_ID), false),
    (20, "QualifiedName", Some(BASE_DATA_TYPE_ID), false),
    (21, "LocalizedText", Some(BASE_DATA_TYPE_ID), false),
    (STRUCTURE_TYPE_ID, "Structure", Some(BASE_DATA_TYPE_ID), true),
    (UNION_TYPE_ID, "Union", Some(STRUCTURE_TYPE_ID), true),
    (23, "DataValue", Some(BASE_DATA_TYPE_ID), false),
    (25, "DiagnosticInfo", Some(BASE_DATA_TYPE_ID), false),
    (ENUMERATION_TYPE_ID, "Enumeration", Some(BASE_DATA_TYPE_ID), true),
];

impl DataTypeCatalog for StandardCatalog {
    fn describe(&self, id: &TypeId) -> Option<TypeNode> {
        let numeric = id.as_ns0()?;
        let (_, name, parent, is_abstract) =
            STANDARD_TYPES.iter().find(|(n, ..)| *n == numeric)?;
        let mut node = TypeNode::new(id.clone(), *name);
        node.parent = parent.map(NodeId::ns0);
        node.is_abstract = *is_abstract;
        Some(node)
    }

    fn subtypes(&self, id: &TypeId) -> Vec<TypeId> {
        let Some(numeric) = id.as_ns0() else {
            return Vec::new();
        };
        STANDARD_TYPES
            .iter()
            .filter(|(_, _, parent, _)| *parent == Some(numeric))
            .map(|(n, ..)| NodeId::ns0(*n))
            .collect()
    }
}

impl StandardCatalog {
    /// Every builtin id is present in the embedded table.
    pub fn covers_builtins() -> bool {
        (1..=25u32).all(|id| {
            BuiltinKind::from_id(id).is_some() && STANDARD_TYPES.iter().any(|(n, ..)| *n == id)
        })
    }
}

/// Catalog backed by maps, layered over the standard hierarchy. Used to model
/// a server's address space (vendor namespaces on top of namespace 0).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    nodes: HashMap<TypeId, TypeNode>,
    subtypes: HashMap<TypeId, Vec<TypeId>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` as a subtype of `parent`.
    pub fn insert(&mut self, parent: TypeId, node: TypeNode) {
        self.subtypes
            .entry(parent)
            .or_default()
            .push(node.type_id.clone());
        self.nodes.insert(node.type_id.clone(), node);
    }
}

impl DataTypeCatalog for InMemoryCatalog {
    fn describe(&self, id: &TypeId) -> Option<TypeNode> {
        self.nodes
            .get(id)
            .cloned()
            .or_else(|| StandardCatalog.describe(id))
    }

    fn subtypes(&self, id: &TypeId) -> Vec<TypeId> {
        let mut out = StandardCatalog.subtypes(id);
        if let Some(extra) = self.subtypes.get(id) {
            out.extend(extra.iter().cloned());
        }
        out
    }
}
