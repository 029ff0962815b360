// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type tree entries and the structure / enumeration definitions they carry.

use crate::config::{ENUMERATION_TYPE_ID, STRUCTURE_TYPE_ID, UNION_TYPE_ID};
use crate::core::types::{NodeId, TypeId};

/// Array dimensionality of a field or variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRank {
    /// -3: scalar or one-dimensional array.
    ScalarOrOneDimension,
    /// -2: any shape.
    Any,
    /// -1
    Scalar,
    /// 0: one or more dimensions.
    OneOrMoreDimensions,
    /// 1
    OneDimension,
    /// n > 1
    Matrix(u32),
}

impl ValueRank {
    pub fn from_i32(raw: i32) -> Option<Self> {
        match raw {
            -3 => Some(ValueRank::ScalarOrOneDimension),
            -2 => Some(ValueRank::Any),
            -1 => Some(ValueRank::Scalar),
            0 => Some(ValueRank::OneOrMoreDimensions),
            1 => Some(ValueRank::OneDimension),
            n if n > 1 => Some(ValueRank::Matrix(n as u32)),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            ValueRank::ScalarOrOneDimension => -3,
            ValueRank::Any => -2,
            ValueRank::Scalar => -1,
            ValueRank::OneOrMoreDimensions => 0,
            ValueRank::OneDimension => 1,
            ValueRank::Matrix(n) => n as i32,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, ValueRank::OneDimension | ValueRank::Matrix(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Plain,
    WithOptionalFields,
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureField {
    pub name: String,
    pub data_type: TypeId,
    pub value_rank: ValueRank,
    pub is_optional: bool,
}

impl StructureField {
    pub fn new(name: impl Into<String>, data_type: TypeId) -> Self {
        Self {
            name: name.into(),
            data_type,
            value_rank: ValueRank::Scalar,
            is_optional: false,
        }
    }

    pub fn array(mut self) -> Self {
        self.value_rank = ValueRank::OneDimension;
        self
    }

    pub fn rank(mut self, value_rank: ValueRank) -> Self {
        self.value_rank = value_rank;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureDefinition {
    pub base_type: Option<TypeId>,
    pub structure_kind: StructureKind,
    pub fields: Vec<StructureField>,
}

impl StructureDefinition {
    pub fn new(structure_kind: StructureKind) -> Self {
        let root = match structure_kind {
            StructureKind::Union => UNION_TYPE_ID,
            _ => STRUCTURE_TYPE_ID,
        };
        Self {
            base_type: Some(NodeId::ns0(root)),
            structure_kind,
            fields: Vec::new(),
        }
    }

    pub fn base(mut self, base_type: TypeId) -> Self {
        self.base_type = Some(base_type);
        self
    }

    pub fn field(mut self, field: StructureField) -> Self {
        self.fields.push(field);
        self
    }

    /// Optional fields in declaration order; index `i` owns presence bit `i`.
    pub fn optional_fields(&self) -> impl Iterator<Item = &StructureField> {
        self.fields.iter().filter(|f| f.is_optional)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumField {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumDefinition {
    pub fields: Vec<EnumField>,
}

impl EnumDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.fields.push(EnumField {
            name: name.into(),
            value,
        });
        self
    }

    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.value == value)
            .map(|f| f.name.as_str())
    }

    pub fn contains(&self, value: i64) -> bool {
        self.fields.iter().any(|f| f.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataTypeDefinition {
    Structure(StructureDefinition),
    Enum(EnumDefinition),
}

/// One data type in the tree. `parent` is a lookup key, never a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub type_id: TypeId,
    pub browse_name: String,
    pub parent: Option<TypeId>,
    pub binary_encoding_id: Option<NodeId>,
    pub xml_encoding_id: Option<NodeId>,
    pub json_encoding_id: Option<NodeId>,
    pub definition: Option<DataTypeDefinition>,
    pub is_abstract: bool,
}

impl TypeNode {
    pub fn new(type_id: TypeId, browse_name: impl Into<String>) -> Self {
        Self {
            type_id,
            browse_name: browse_name.into(),
            parent: None,
            binary_encoding_id: None,
            xml_encoding_id: None,
            json_encoding_id: None,
            definition: None,
            is_abstract: false,
        }
    }

    /// Structured type; parent defaults to the definition's base type.
    pub fn structure(
        type_id: TypeId,
        browse_name: impl Into<String>,
        binary_encoding_id: NodeId,
        definition: StructureDefinition,
    ) -> Self {
        let mut node = Self::new(type_id, browse_name);
        node.parent = definition.base_type.clone();
        node.binary_encoding_id = Some(binary_encoding_id);
        node.definition = Some(DataTypeDefinition::Structure(definition));
        node
    }

    /// Enumerated type, parented under `Enumeration`.
    pub fn enumeration(
        type_id: TypeId,
        browse_name: impl Into<String>,
        definition: EnumDefinition,
    ) -> Self {
        let mut node = Self::new(type_id, browse_name);
        node.parent = Some(NodeId::ns0(ENUMERATION_TYPE_ID));
        node.definition = Some(DataTypeDefinition::Enum(definition));
        node
    }

    pub fn with_parent(mut self, parent: TypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn structure_definition(&self) -> Option<&StructureDefinition> {
        match &self.definition {
            Some(DataTypeDefinition::Structure(def)) => Some(def),
            _ => None,
        }
    }

    pub fn enum_definition(&self) -> Option<&EnumDefinition> {
        match &self.definition {
            Some(DataTypeDefinition::Enum(def)) => Some(def),
            _ => None,
        }
    }
}
