// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Inherited field sets.
//!
//! A subtype's fields are its ancestors' fields followed by its own, stopping
//! at the `Structure` and `Union` roots. A name declared again closer to the
//! type replaces the earlier declaration in its original position.

use crate::config::{STRUCTURE_TYPE_ID, UNION_TYPE_ID};
use crate::core::ser::{CodecError, CodecResult};
use crate::core::types::TypeId;
use crate::typetree::{DataTypeTree, StructureDefinition, StructureField};

/// True for the two roots where field inheritance stops.
pub fn is_structure_root(id: &TypeId) -> bool {
    matches!(id.as_ns0(), Some(STRUCTURE_TYPE_ID) | Some(UNION_TYPE_ID))
}

/// Flattened field set of the structured type `id`.
pub fn flatten_fields(tree: &DataTypeTree, id: &TypeId) -> CodecResult<Vec<StructureField>> {
    let node = tree.get_node(id).ok_or_else(|| CodecError::UnknownType {
        type_id: id.clone(),
    })?;
    let def = node
        .structure_definition()
        .ok_or_else(|| CodecError::UnsupportedStructure {
            type_name: node.browse_name.clone(),
            reason: "no structure definition".to_string(),
        })?;
    flatten_definition(tree, &node.browse_name, def)
}

/// Flattened field set of `def`, resolving its base types through `tree`.
pub fn flatten_definition(
    tree: &DataTypeTree,
    type_name: &str,
    def: &StructureDefinition,
) -> CodecResult<Vec<StructureField>> {
    let mut chain: Vec<&StructureDefinition> = vec![def];
    let mut current = def.base_type.as_ref();
    while let Some(type_id) = current {
        if is_structure_root(type_id) {
            break;
        }
        if chain.len() > tree.len() {
            return Err(CodecError::UnsupportedStructure {
                type_name: type_name.to_string(),
                reason: "base type chain does not terminate".to_string(),
            });
        }
        let base = tree
            .get_node(type_id)
            .and_then(|n| n.structure_definition())
            .ok_or_else(|| CodecError::UnresolvableFieldType {
                type_name: type_id.to_string(),
                field: format!("{} (base type)", type_name),
            })?;
        chain.push(base);
        current = base.base_type.as_ref();
    }
    Ok(merge_fields(chain.iter().rev().map(|d| d.fields.as_slice())))
}

/// Merge field levels ordered from the furthest ancestor to the type itself.
pub fn merge_fields<'a>(
    levels: impl IntoIterator<Item = &'a [StructureField]>,
) -> Vec<StructureField> {
    let mut merged: Vec<StructureField> = Vec::new();
    for level in levels {
        for field in level {
            match merged.iter_mut().find(|f| f.name == field.name) {
                Some(slot) => *slot = field.clone(),
                None => merged.push(field.clone()),
            }
        }
    }
    merged
}
