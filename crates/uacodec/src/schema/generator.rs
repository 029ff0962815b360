// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema Document generation from compiled definitions.
//!
//! Field layout per structure kind:
//!
//! - `WithOptionalFields`: one `<Name>Present` bit per optional field, then a
//!   single `Reserved1` bit field padding the count to a multiple of 32;
//!   optional fields switch on their presence bit.
//! - `Union`: a leading UInt32 `SwitchField`; the n-th member carries
//!   `SwitchValue = n`, counting from 1.
//! - Rank-1 fields get a preceding Int32 `<Name>Length` field that shares the
//!   data field's switch; rank > 1 fields carry a `ValueRank` attribute.

use super::{
    EnumeratedType, EnumeratedValue, FieldType, QualifiedTypeName, SchemaDocument, SchemaType,
    StructuredType,
};
use crate::config::{
    BINARY_SCHEMA_NAMESPACE, ENUMERATION_TYPE_ID, INTEGER_TYPE_ID, NUMBER_TYPE_ID,
    OPC_UA_NAMESPACE, UINTEGER_TYPE_ID, UNION_TYPE_ID,
};
use crate::core::ser::{CodecError, CodecResult};
use crate::core::types::{BuiltinKind, NamespaceTable, NodeId, TypeId};
use crate::structured::{flatten_definition, PresenceMask};
use crate::typetree::{
    DataTypeTree, EnumDefinition, StructureDefinition, StructureField, StructureKind, ValueRank,
};
use std::collections::HashSet;

/// Where a data type is described: its name inside a dictionary namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeLocation {
    pub type_name: String,
    pub namespace_uri: String,
}

impl DataTypeLocation {
    fn opc(name: &str) -> Self {
        Self {
            type_name: name.to_string(),
            namespace_uri: BINARY_SCHEMA_NAMESPACE.to_string(),
        }
    }

    fn ua(name: &str) -> Self {
        Self {
            type_name: name.to_string(),
            namespace_uri: OPC_UA_NAMESPACE.to_string(),
        }
    }

    fn qualified(&self) -> QualifiedTypeName {
        QualifiedTypeName::new(&self.namespace_uri, &self.type_name)
    }
}

pub struct SchemaGenerator<'a> {
    namespace_uri: String,
    tree: &'a DataTypeTree,
    namespaces: &'a NamespaceTable,
    imports: Vec<String>,
    enumerated: Vec<EnumeratedType>,
    structured: Vec<StructuredType>,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(
        namespace_uri: impl Into<String>,
        tree: &'a DataTypeTree,
        namespaces: &'a NamespaceTable,
    ) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            tree,
            namespaces,
            imports: Vec::new(),
            enumerated: Vec::new(),
            structured: Vec::new(),
        }
    }

    /// Add the tree's structure or enumeration `id`.
    pub fn add_type(&mut self, id: &TypeId) -> CodecResult<()> {
        let tree = self.tree;
        let node = tree.get_node(id).ok_or_else(|| CodecError::UnknownType {
            type_id: id.clone(),
        })?;
        if let Some(def) = node.enum_definition() {
            return self.add_enum(&node.browse_name, def);
        }
        if let Some(def) = node.structure_definition() {
            return self.add_structure(&node.browse_name, def);
        }
        Err(CodecError::UnsupportedStructure {
            type_name: node.browse_name.clone(),
            reason: "neither a structure nor an enumeration".to_string(),
        })
    }

    pub fn add_enum(&mut self, name: &str, def: &EnumDefinition) -> CodecResult<()> {
        let mut values = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            let value = i32::try_from(field.value).map_err(|_| CodecError::UnsupportedStructure {
                type_name: name.to_string(),
                reason: format!("value {} of '{}' exceeds Int32", field.value, field.name),
            })?;
            values.push(EnumeratedValue {
                name: field.name.clone(),
                value,
            });
        }
        self.enumerated.push(EnumeratedType {
            name: name.to_string(),
            length_in_bits: 32,
            values,
        });
        Ok(())
    }

    pub fn add_structure(&mut self, name: &str, def: &StructureDefinition) -> CodecResult<()> {
        if def.structure_kind == StructureKind::Union {
            self.check_union(name, def)?;
        }
        let fields = flatten_definition(self.tree, name, def)?;
        self.import(OPC_UA_NAMESPACE);
        let mut st = StructuredType::new(name);
        st.base_type = Some(match def.structure_kind {
            StructureKind::Union => QualifiedTypeName::ua("Union"),
            _ => QualifiedTypeName::ua("ExtensionObject"),
        });

        match def.structure_kind {
            StructureKind::WithOptionalFields => {
                let optional: Vec<&StructureField> =
                    fields.iter().filter(|f| f.is_optional).collect();
                for field in &optional {
                    st.fields.push(FieldType::new(
                        presence_name(&field.name),
                        QualifiedTypeName::opc("Bit"),
                    ));
                }
                let padding = PresenceMask::padding_bits(optional.len());
                if padding > 0 {
                    st.fields.push(
                        FieldType::new("Reserved1", QualifiedTypeName::opc("Bit"))
                            .with_length(padding),
                    );
                }
            }
            StructureKind::Union => {
                st.fields.push(FieldType::new(
                    "SwitchField",
                    QualifiedTypeName::opc("UInt32"),
                ));
            }
            StructureKind::Plain => {}
        }

        for (index, field) in fields.iter().enumerate() {
            let location = self.locate(&field.data_type, name, &field.name)?;
            self.import(&location.namespace_uri);

            let switch = match def.structure_kind {
                StructureKind::WithOptionalFields if field.is_optional => {
                    Some((presence_name(&field.name), None))
                }
                StructureKind::Union => Some(("SwitchField".to_string(), Some(index as u32 + 1))),
                _ => None,
            };
            let with_switch = |f: FieldType| match &switch {
                Some((switch_field, value)) => f.with_switch(switch_field.clone(), *value),
                None => f,
            };

            let mut data = with_switch(FieldType::new(&field.name, location.qualified()));
            match field.value_rank {
                ValueRank::Scalar => {}
                ValueRank::OneDimension => {
                    let length_name = format!("{}Length", field.name);
                    st.fields.push(with_switch(FieldType::new(
                        &length_name,
                        QualifiedTypeName::opc("Int32"),
                    )));
                    data = data.with_length_field(length_name);
                }
                ValueRank::Matrix(rank) => data = data.with_value_rank(rank as i32),
                other => {
                    return Err(CodecError::UnsupportedValueRank {
                        field: format!("{}.{}", name, field.name),
                        value_rank: other.as_i32(),
                    })
                }
            }
            st.fields.push(data);
        }

        log::debug!(
            "[schema] generated {} with {} wire fields",
            name,
            st.fields.len()
        );
        self.structured.push(st);
        Ok(())
    }

    /// Finish the document; enumerations precede structures.
    pub fn generate(self) -> CodecResult<SchemaDocument> {
        let mut doc = SchemaDocument::new(self.namespace_uri);
        doc.imports = self.imports;
        doc.types.extend(self.enumerated.into_iter().map(SchemaType::Enumerated));
        doc.types.extend(self.structured.into_iter().map(SchemaType::Structured));
        doc.validate()?;
        Ok(doc)
    }

    /// Dictionary location of a field's data type.
    pub fn locate(&self, id: &TypeId, type_name: &str, field: &str) -> CodecResult<DataTypeLocation> {
        let unresolvable = || CodecError::UnresolvableFieldType {
            type_name: id.to_string(),
            field: format!("{}.{}", type_name, field),
        };
        if let Some(numeric) = id.as_ns0() {
            if let Some(kind) = BuiltinKind::from_id(numeric) {
                return Ok(builtin_location(kind));
            }
            return match numeric {
                ENUMERATION_TYPE_ID => Ok(DataTypeLocation::opc("Int32")),
                NUMBER_TYPE_ID | INTEGER_TYPE_ID | UINTEGER_TYPE_ID => {
                    Ok(DataTypeLocation::ua("Variant"))
                }
                _ => {
                    let node = self.tree.get_node(id).ok_or_else(unresolvable)?;
                    if self.tree.is_enum_type(id) {
                        Ok(DataTypeLocation::opc("Int32"))
                    } else if self.tree.is_struct_type(id) {
                        Ok(DataTypeLocation::ua(&node.browse_name))
                    } else {
                        Ok(builtin_location(self.tree.builtin_type(id)))
                    }
                }
            };
        }

        let node = self.tree.get_node(id).ok_or_else(unresolvable)?;
        if node.definition.is_none() && !self.tree.is_struct_type(id) && !self.tree.is_enum_type(id)
        {
            return Ok(builtin_location(self.tree.builtin_type(id)));
        }
        let uri = self.namespaces.uri(id.namespace()).ok_or_else(unresolvable)?;
        Ok(DataTypeLocation {
            type_name: node.browse_name.clone(),
            namespace_uri: uri.to_string(),
        })
    }

    fn import(&mut self, namespace: &str) {
        if namespace == BINARY_SCHEMA_NAMESPACE || namespace == self.namespace_uri {
            return;
        }
        if !self.imports.iter().any(|ns| ns == namespace) {
            self.imports.push(namespace.to_string());
        }
    }

    /// Unions may not derive from another union nor contain one at any depth.
    fn check_union(&self, name: &str, def: &StructureDefinition) -> CodecResult<()> {
        let nested = |reason: String| CodecError::UnsupportedStructure {
            type_name: name.to_string(),
            reason,
        };
        if let Some(base) = &def.base_type {
            if base.as_ns0() != Some(UNION_TYPE_ID) && self.is_union(base) {
                return Err(nested(format!("derives from union {}", base)));
            }
        }
        let mut visited: HashSet<TypeId> = HashSet::new();
        let mut pending: Vec<TypeId> = def.fields.iter().map(|f| f.data_type.clone()).collect();
        while let Some(id) = pending.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if self.is_union(&id) {
                return Err(nested(format!("contains union {}", id)));
            }
            if let Some(inner) = self.tree.get_node(&id).and_then(|n| n.structure_definition()) {
                pending.extend(inner.fields.iter().map(|f| f.data_type.clone()));
            }
        }
        Ok(())
    }

    fn is_union(&self, id: &TypeId) -> bool {
        let declared_union = self
            .tree
            .get_node(id)
            .and_then(|n| n.structure_definition())
            .is_some_and(|d| d.structure_kind == StructureKind::Union);
        declared_union || self.tree.is_subtype_of(id, &NodeId::ns0(UNION_TYPE_ID))
    }
}

fn presence_name(field: &str) -> String {
    format!("{}Present", field)
}

/// Builtins up to ByteString live in the binary schema vocabulary, the rest
/// in the base model.
fn builtin_location(kind: BuiltinKind) -> DataTypeLocation {
    if kind <= BuiltinKind::ByteString {
        DataTypeLocation::opc(kind.name())
    } else {
        DataTypeLocation::ua(kind.name())
    }
}
