// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::validate::{batch_status, check_batch, check_value, ValueCheck};
use super::*;
use crate::config::{DURATION_TYPE_ID, UNION_TYPE_ID, UTC_TIME_TYPE_ID};
use crate::core::ser::CodecError;
use crate::core::types::StatusCode;
use crate::dynamic::{GenericStruct, Value};

fn ns0(id: u32) -> NodeId {
    NodeId::ns0(id)
}

/// Standard tree plus a vendor enum, structure and union in namespace 2.
fn vendor_tree() -> DataTypeTree {
    let mut catalog = InMemoryCatalog::new();
    catalog.insert(
        ns0(ENUMERATION_TYPE_ID),
        TypeNode::new(NodeId::numeric(2, 3000), "Color").with_parent(ns0(ENUMERATION_TYPE_ID)),
    );
    let point = StructureDefinition::new(StructureKind::Plain)
        .field(StructureField::new("X", ns0(11)))
        .field(StructureField::new("Y", ns0(11)));
    catalog.insert(
        ns0(STRUCTURE_TYPE_ID),
        TypeNode::structure(NodeId::numeric(2, 3001), "Point", NodeId::numeric(2, 3002), point),
    );
    let shape = StructureDefinition::new(StructureKind::Union)
        .field(StructureField::new("Point", NodeId::numeric(2, 3001)))
        .field(StructureField::new("Label", ns0(12)));
    catalog.insert(
        ns0(UNION_TYPE_ID),
        TypeNode::structure(NodeId::numeric(2, 3003), "Shape", NodeId::numeric(2, 3004), shape),
    );
    let color_def = EnumDefinition::new().variant("Red", 0).variant("Green", 1);
    DataTypeTreeBuilder::new()
        .browse(&catalog, &ns0(BASE_DATA_TYPE_ID))
        .with_node(TypeNode::enumeration(
            NodeId::numeric(2, 3000),
            "Color",
            color_def,
        ))
        .build()
}

#[test]
fn test_standard_catalog_covers_builtins() {
    assert!(StandardCatalog::covers_builtins());
    let tree = DataTypeTree::standard();
    for id in 1..=25u32 {
        assert!(tree.contains(&ns0(id)), "missing builtin {}", id);
    }
}

#[test]
fn test_unknown_ids_are_not_errors() {
    let tree = DataTypeTree::standard();
    let unknown = NodeId::numeric(9, 42);
    assert!(tree.get_node(&unknown).is_none());
    assert!(!tree.is_subtype_of(&unknown, &ns0(BASE_DATA_TYPE_ID)));
    assert_eq!(tree.builtin_type(&unknown), BuiltinKind::Variant);
    assert_eq!(tree.backing_representation(&unknown), Representation::Any);
}

#[test]
fn test_subtype_is_strict() {
    let tree = DataTypeTree::standard();
    assert!(tree.is_subtype_of(&ns0(6), &ns0(INTEGER_TYPE_ID)));
    assert!(tree.is_subtype_of(&ns0(6), &ns0(NUMBER_TYPE_ID)));
    assert!(tree.is_subtype_of(&ns0(6), &ns0(BASE_DATA_TYPE_ID)));
    assert!(!tree.is_subtype_of(&ns0(6), &ns0(6)));
    assert!(!tree.is_subtype_of(&ns0(6), &ns0(UINTEGER_TYPE_ID)));
    assert!(tree.is_subtype_of(&ns0(UNION_TYPE_ID), &ns0(STRUCTURE_TYPE_ID)));
}

#[test]
fn test_builtin_ancestor_walks_to_nearest_builtin() {
    let tree = DataTypeTree::standard();
    assert_eq!(tree.builtin_type(&ns0(6)), BuiltinKind::Int32);
    assert_eq!(tree.builtin_type(&ns0(DURATION_TYPE_ID)), BuiltinKind::Double);
    assert_eq!(tree.builtin_type(&ns0(UTC_TIME_TYPE_ID)), BuiltinKind::DateTime);
    assert_eq!(
        tree.builtin_type(&ns0(UNION_TYPE_ID)),
        BuiltinKind::ExtensionObject
    );
}

#[test]
fn test_enumeration_ancestor_and_backing_disagree() {
    let tree = vendor_tree();
    let color = NodeId::numeric(2, 3000);
    assert!(tree.is_enum_type(&color));
    assert_eq!(tree.builtin_type(&color), BuiltinKind::Variant);
    assert_eq!(tree.backing_representation(&color), Representation::Int32);
    assert_eq!(
        tree.builtin_type(&ns0(ENUMERATION_TYPE_ID)),
        BuiltinKind::Variant
    );
}

#[test]
fn test_backing_of_abstract_numeric_families() {
    let tree = DataTypeTree::standard();
    assert_eq!(
        tree.backing_representation(&ns0(NUMBER_TYPE_ID)),
        Representation::Number
    );
    assert_eq!(
        tree.backing_representation(&ns0(INTEGER_TYPE_ID)),
        Representation::Number
    );
    assert_eq!(
        tree.backing_representation(&ns0(UINTEGER_TYPE_ID)),
        Representation::UnsignedNumber
    );
    assert_eq!(
        tree.backing_representation(&ns0(DURATION_TYPE_ID)),
        Representation::Double
    );
    assert_eq!(
        tree.backing_representation(&ns0(STRUCTURE_TYPE_ID)),
        Representation::ExtensionObject
    );
}

#[test]
fn test_integer_families_enumerate_members() {
    let tree = DataTypeTree::standard();
    let integer = ns0(INTEGER_TYPE_ID);
    assert!(tree.is_assignable(&integer, Representation::Int16));
    assert!(tree.is_assignable(&integer, Representation::Int64));
    assert!(!tree.is_assignable(&integer, Representation::Double));
    assert!(!tree.is_assignable(&integer, Representation::UInt32));

    let uinteger = ns0(UINTEGER_TYPE_ID);
    assert!(tree.is_assignable(&uinteger, Representation::Byte));
    assert!(!tree.is_assignable(&uinteger, Representation::SByte));

    let number = ns0(NUMBER_TYPE_ID);
    assert!(tree.is_assignable(&number, Representation::Float));
    assert!(tree.is_assignable(&number, Representation::UInt64));
    assert!(!tree.is_assignable(&number, Representation::String));
}

#[test]
fn test_encoding_reverse_lookup() {
    let tree = vendor_tree();
    let (format, node) = tree
        .node_for_encoding(&NodeId::numeric(2, 3002))
        .expect("point encoding");
    assert_eq!(format, EncodingFormat::Binary);
    assert_eq!(node.browse_name, "Point");
    assert_eq!(
        tree.encoding_id(&NodeId::numeric(2, 3003), EncodingFormat::Binary),
        Some(&NodeId::numeric(2, 3004))
    );
    assert!(tree.find_by_name(2, "Shape").is_some());
    assert!(tree.is_struct_type(&NodeId::numeric(2, 3003)));
}

#[test]
fn test_replacing_node_updates_children() {
    let tree = vendor_tree();
    let color = NodeId::numeric(2, 3000);
    let children = tree.children(&ns0(ENUMERATION_TYPE_ID));
    assert_eq!(children.iter().filter(|c| **c == color).count(), 1);
    assert!(tree.get_node(&color).and_then(|n| n.enum_definition()).is_some());
}

#[test]
fn test_rebuild_from_existing_tree() {
    let base = DataTypeTree::standard();
    let extended = DataTypeTreeBuilder::from_tree(&base)
        .with_node(TypeNode::new(NodeId::numeric(1, 7), "Percent").with_parent(ns0(11)))
        .build();
    assert_eq!(extended.len(), base.len() + 1);
    assert!(!base.contains(&NodeId::numeric(1, 7)));
    assert_eq!(
        extended.backing_representation(&NodeId::numeric(1, 7)),
        Representation::Double
    );
}

#[test]
fn test_validation_scalars_and_ranks() {
    let tree = vendor_tree();
    assert!(check_value(&tree, &ns0(6), ValueRank::Scalar, &Value::Int32(5)).is_ok());
    assert!(matches!(
        check_value(&tree, &ns0(6), ValueRank::Scalar, &Value::Double(5.0)),
        Err(CodecError::TypeMismatch { .. })
    ));
    let array = Value::Array(vec![Value::Int16(1), Value::Int16(2)]);
    assert!(check_value(&tree, &ns0(INTEGER_TYPE_ID), ValueRank::OneDimension, &array).is_ok());
    assert!(check_value(&tree, &ns0(INTEGER_TYPE_ID), ValueRank::Scalar, &array).is_err());
    let matrix = Value::Matrix {
        dimensions: vec![1, 2],
        elements: vec![Value::Double(1.0), Value::Double(2.0)],
    };
    assert!(check_value(&tree, &ns0(11), ValueRank::Matrix(2), &matrix).is_ok());
    assert!(check_value(&tree, &ns0(11), ValueRank::Matrix(3), &matrix).is_err());
    assert!(check_value(&tree, &ns0(11), ValueRank::OneOrMoreDimensions, &matrix).is_ok());
    assert!(check_value(&tree, &ns0(12), ValueRank::Scalar, &Value::Null).is_ok());
}

#[test]
fn test_validation_enums_and_structures() {
    let tree = vendor_tree();
    let color = NodeId::numeric(2, 3000);
    assert!(check_value(&tree, &color, ValueRank::Scalar, &Value::Enum(1)).is_ok());
    assert!(check_value(&tree, &color, ValueRank::Scalar, &Value::Enum(7)).is_err());
    let point = Value::Struct(
        GenericStruct::new("Point")
            .with("X", Value::Double(1.0))
            .with("Y", Value::Double(2.0)),
    );
    assert!(check_value(&tree, &NodeId::numeric(2, 3001), ValueRank::Scalar, &point).is_ok());
    assert!(check_value(&tree, &ns0(STRUCTURE_TYPE_ID), ValueRank::Scalar, &point).is_ok());
    assert!(check_value(&tree, &ns0(12), ValueRank::Scalar, &point).is_err());
}

#[test]
fn test_validation_int32_against_enumeration() {
    let tree = vendor_tree();
    let color = NodeId::numeric(2, 3000);
    assert!(check_value(&tree, &color, ValueRank::Scalar, &Value::Int32(0)).is_ok());
    assert!(matches!(
        check_value(&tree, &color, ValueRank::Scalar, &Value::Int32(99)),
        Err(CodecError::TypeMismatch { .. })
    ));
    let palette = Value::Array(vec![Value::Int32(1), Value::Int32(5)]);
    assert!(check_value(&tree, &color, ValueRank::OneDimension, &palette).is_err());
    // plain Int32 fields carry any value
    assert!(check_value(&tree, &ns0(6), ValueRank::Scalar, &Value::Int32(99)).is_ok());
}

#[test]
fn test_batch_reports_per_item() {
    let tree = DataTypeTree::standard();
    let items = vec![
        ValueCheck {
            data_type: ns0(12),
            value_rank: ValueRank::Scalar,
            value: Value::String("ok".into()),
        },
        ValueCheck {
            data_type: ns0(1),
            value_rank: ValueRank::Scalar,
            value: Value::UInt32(3),
        },
        ValueCheck {
            data_type: ns0(NUMBER_TYPE_ID),
            value_rank: ValueRank::Scalar,
            value: Value::Float(0.5),
        },
    ];
    let results = check_batch(&tree, &items);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    let status = batch_status(&tree, &items);
    assert_eq!(
        status,
        vec![
            StatusCode::GOOD,
            StatusCode::BAD_TYPE_MISMATCH,
            StatusCode::GOOD
        ]
    );
}
