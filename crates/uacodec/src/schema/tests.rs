// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::config::{ENUMERATION_TYPE_ID, STRUCTURE_TYPE_ID, UNION_TYPE_ID};
use crate::core::types::{NamespaceTable, NodeId};
use crate::typetree::{
    DataTypeTree, DataTypeTreeBuilder, EnumDefinition, StructureDefinition, StructureField,
    StructureKind, TypeNode, ValueRank,
};

const VENDOR: &str = "urn:vendor:types";

fn ns0(id: u32) -> NodeId {
    NodeId::ns0(id)
}

fn namespaces() -> NamespaceTable {
    let table = NamespaceTable::new();
    table.register("urn:vendor:server").expect("register");
    table.register(VENDOR).expect("register");
    table
}

fn opc(name: &str) -> QualifiedTypeName {
    QualifiedTypeName::opc(name)
}

fn field<'a>(st: &'a StructuredType, name: &str) -> &'a FieldType {
    st.fields
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("missing field {}", name))
}

fn names(st: &StructuredType) -> Vec<&str> {
    st.fields.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn test_optional_fields_layout() {
    let tree = DataTypeTree::standard();
    let table = namespaces();
    let def = StructureDefinition::new(StructureKind::WithOptionalFields)
        .field(StructureField::new("Foo", ns0(12)))
        .field(StructureField::new("Bar", ns0(7)).optional())
        .field(StructureField::new("Baz", ns0(1)).optional());

    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    generator.add_structure("Sample", &def).expect("generate");
    let doc = generator.generate().expect("valid document");

    let st = doc.structured("Sample").expect("Sample");
    assert_eq!(
        names(st),
        ["BarPresent", "BazPresent", "Reserved1", "Foo", "Bar", "Baz"]
    );
    assert_eq!(field(st, "Reserved1").length, Some(30));
    assert!(field(st, "Reserved1").is_bit());
    assert_eq!(field(st, "Foo").type_name, opc("String"));
    assert_eq!(field(st, "Foo").switch_field, None);
    assert_eq!(field(st, "Bar").switch_field.as_deref(), Some("BarPresent"));
    assert_eq!(field(st, "Bar").switch_value, None);
    assert_eq!(st.base_type, Some(QualifiedTypeName::ua("ExtensionObject")));
}

#[test]
fn test_thirty_two_optionals_need_no_padding() {
    let tree = DataTypeTree::standard();
    let table = namespaces();
    let mut def = StructureDefinition::new(StructureKind::WithOptionalFields);
    for i in 0..32 {
        def = def.field(StructureField::new(format!("F{}", i), ns0(6)).optional());
    }
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    generator.add_structure("Wide", &def).expect("generate");
    let doc = generator.generate().expect("valid document");
    let st = doc.structured("Wide").expect("Wide");
    assert!(st.field_index("Reserved1").is_none());
    assert_eq!(st.fields.len(), 64);
}

#[test]
fn test_union_layout_shares_switch_with_length() {
    let tree = DataTypeTree::standard();
    let table = namespaces();
    let def = StructureDefinition::new(StructureKind::Union)
        .field(StructureField::new("Number", ns0(6)))
        .field(StructureField::new("Names", ns0(12)).array());

    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    generator.add_structure("Choice", &def).expect("generate");
    let doc = generator.generate().expect("valid document");

    let st = doc.structured("Choice").expect("Choice");
    assert_eq!(names(st), ["SwitchField", "Number", "NamesLength", "Names"]);
    assert_eq!(field(st, "SwitchField").type_name, opc("UInt32"));
    assert_eq!(field(st, "Number").switch_value, Some(1));
    let length = field(st, "NamesLength");
    assert_eq!(length.switch_field.as_deref(), Some("SwitchField"));
    assert_eq!(length.switch_value, Some(2));
    assert_eq!(field(st, "Names").switch_value, Some(2));
    assert_eq!(field(st, "Names").length_field.as_deref(), Some("NamesLength"));
    assert_eq!(st.base_type, Some(QualifiedTypeName::ua("Union")));
}

#[test]
fn test_matrix_fields_carry_value_rank() {
    let tree = DataTypeTree::standard();
    let table = namespaces();
    let def = StructureDefinition::new(StructureKind::Plain)
        .field(StructureField::new("Grid", ns0(11)).rank(ValueRank::Matrix(3)));
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    generator.add_structure("Volume", &def).expect("generate");
    let doc = generator.generate().expect("valid document");
    let st = doc.structured("Volume").expect("Volume");
    assert_eq!(names(st), ["Grid"]);
    assert_eq!(field(st, "Grid").value_rank, Some(3));
    assert_eq!(field(st, "Grid").length_field, None);
}

#[test]
fn test_open_value_ranks_are_rejected() {
    let tree = DataTypeTree::standard();
    let table = namespaces();
    for rank in [
        ValueRank::Any,
        ValueRank::OneOrMoreDimensions,
        ValueRank::ScalarOrOneDimension,
    ] {
        let def = StructureDefinition::new(StructureKind::Plain)
            .field(StructureField::new("Data", ns0(6)).rank(rank));
        let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
        let err = generator.add_structure("Open", &def).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnsupportedValueRank {
                field: "Open.Data".into(),
                value_rank: rank.as_i32(),
            }
        );
    }
}

/// Vendor tree: `Inner` union, `Holder` plain struct wrapping it, `Mode` enum.
fn vendor_tree() -> DataTypeTree {
    let inner = StructureDefinition::new(StructureKind::Union)
        .field(StructureField::new("A", ns0(6)))
        .field(StructureField::new("B", ns0(12)));
    let holder = StructureDefinition::new(StructureKind::Plain)
        .field(StructureField::new("Inner", NodeId::numeric(2, 4003)));
    let point = StructureDefinition::new(StructureKind::Plain)
        .field(StructureField::new("X", ns0(11)))
        .field(StructureField::new("Y", ns0(11)));
    DataTypeTreeBuilder::from_tree(&DataTypeTree::standard())
        .with_node(TypeNode::structure(
            NodeId::numeric(2, 4003),
            "Inner",
            NodeId::numeric(2, 4004),
            inner,
        ))
        .with_node(TypeNode::structure(
            NodeId::numeric(2, 4005),
            "Holder",
            NodeId::numeric(2, 4006),
            holder,
        ))
        .with_node(TypeNode::structure(
            NodeId::numeric(2, 4007),
            "Point",
            NodeId::numeric(2, 4008),
            point,
        ))
        .with_node(TypeNode::enumeration(
            NodeId::numeric(2, 4009),
            "Mode",
            EnumDefinition::new().variant("Off", 0).variant("On", 1),
        ))
        .with_node(TypeNode::new(NodeId::numeric(2, 4010), "Percent").with_parent(ns0(11)))
        .build()
}

#[test]
fn test_nested_unions_are_rejected() {
    let tree = vendor_tree();
    let table = namespaces();

    let direct = StructureDefinition::new(StructureKind::Union)
        .field(StructureField::new("Nested", NodeId::numeric(2, 4003)));
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    assert!(matches!(
        generator.add_structure("Outer", &direct),
        Err(CodecError::UnsupportedStructure { .. })
    ));

    let transitive = StructureDefinition::new(StructureKind::Union)
        .field(StructureField::new("Holder", NodeId::numeric(2, 4005)));
    assert!(matches!(
        generator.add_structure("Outer", &transitive),
        Err(CodecError::UnsupportedStructure { .. })
    ));

    let derived = StructureDefinition::new(StructureKind::Union)
        .base(NodeId::numeric(2, 4003))
        .field(StructureField::new("C", ns0(1)));
    assert!(matches!(
        generator.add_structure("Derived", &derived),
        Err(CodecError::UnsupportedStructure { .. })
    ));

    // A plain struct may hold a union.
    assert!(generator.add_type(&NodeId::numeric(2, 4005)).is_ok());
}

#[test]
fn test_type_locations() {
    let tree = vendor_tree();
    let table = namespaces();
    let generator = SchemaGenerator::new(VENDOR, &tree, &table);
    let at = |id: NodeId| generator.locate(&id, "T", "f").expect("locatable");

    assert_eq!(at(ns0(6)).namespace_uri, BINARY_SCHEMA_NAMESPACE);
    assert_eq!(at(ns0(15)).type_name, "ByteString");
    let node_id = at(ns0(17));
    assert_eq!(node_id.namespace_uri, OPC_UA_NAMESPACE);
    assert_eq!(node_id.type_name, "NodeId");
    assert_eq!(at(ns0(STRUCTURE_TYPE_ID)).type_name, "ExtensionObject");
    assert_eq!(at(ns0(24)).type_name, "Variant");
    assert_eq!(at(ns0(27)).type_name, "Variant");
    assert_eq!(at(ns0(ENUMERATION_TYPE_ID)), at(ns0(6)));
    assert_eq!(at(ns0(290)).type_name, "Double");
    assert_eq!(at(ns0(294)).type_name, "DateTime");
    assert_eq!(at(ns0(UNION_TYPE_ID)).type_name, "Union");

    let point = at(NodeId::numeric(2, 4007));
    assert_eq!(point.namespace_uri, VENDOR);
    assert_eq!(point.type_name, "Point");
    assert_eq!(at(NodeId::numeric(2, 4009)).type_name, "Mode");
    assert_eq!(at(NodeId::numeric(2, 4010)).type_name, "Double");

    assert!(matches!(
        generator.locate(&NodeId::numeric(2, 9999), "T", "f"),
        Err(CodecError::UnresolvableFieldType { .. })
    ));
    assert!(matches!(
        generator.locate(&NodeId::numeric(7, 1), "T", "f"),
        Err(CodecError::UnresolvableFieldType { .. })
    ));
}

#[test]
fn test_enums_precede_structures() {
    let tree = vendor_tree();
    let table = namespaces();
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    let def = StructureDefinition::new(StructureKind::Plain)
        .field(StructureField::new("Where", NodeId::numeric(2, 4007)))
        .field(StructureField::new("Mode", NodeId::numeric(2, 4009)))
        .field(StructureField::new("Id", ns0(17)));
    generator.add_type(&NodeId::numeric(2, 4007)).expect("point");
    generator.add_structure("Placement", &def).expect("placement");
    generator.add_type(&NodeId::numeric(2, 4009)).expect("mode");
    let doc = generator.generate().expect("valid document");

    let order: Vec<&str> = doc.types.iter().map(SchemaType::name).collect();
    assert_eq!(order, ["Mode", "Point", "Placement"]);
    assert_eq!(doc.imports, [OPC_UA_NAMESPACE.to_string()]);
    match doc.find("Mode") {
        Some(SchemaType::Enumerated(et)) => {
            assert_eq!(et.length_in_bits, 32);
            assert_eq!(et.values.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_missing_target_type_fails_generation() {
    let tree = vendor_tree();
    let table = namespaces();
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    let def = StructureDefinition::new(StructureKind::Plain)
        .field(StructureField::new("Where", NodeId::numeric(2, 4007)));
    generator.add_structure("Placement", &def).expect("placement");
    assert!(matches!(
        generator.generate(),
        Err(CodecError::MalformedSchema { .. })
    ));
}

const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opc:TypeDictionary xmlns:opc="http://opcfoundation.org/BinarySchema/"
    xmlns:ua="http://opcfoundation.org/UA/"
    xmlns:tns="urn:vendor:types"
    DefaultByteOrder="LittleEndian" TargetNamespace="urn:vendor:types">
  <opc:Import Namespace="http://opcfoundation.org/UA/"/>
  <opc:EnumeratedType Name="Mode" LengthInBits="16">
    <opc:EnumeratedValue Name="Off" Value="0"/>
    <opc:EnumeratedValue Name="On" Value="1"/>
  </opc:EnumeratedType>
  <opc:OpaqueType Name="Hash" LengthInBits="128"/>
  <opc:StructuredType Name="Reading" BaseType="ua:ExtensionObject">
    <opc:Documentation>A sensor reading.</opc:Documentation>
    <opc:Field Name="NotePresent" TypeName="opc:Bit"/>
    <opc:Field Name="Reserved1" TypeName="opc:Bit" Length="31"/>
    <opc:Field Name="Mode" TypeName="tns:Mode"/>
    <opc:Field Name="SamplesLength" TypeName="opc:Int32"/>
    <opc:Field Name="Samples" TypeName="opc:Double" LengthField="SamplesLength"/>
    <opc:Field Name="Note" TypeName="opc:String" SwitchField="NotePresent"/>
    <opc:Field Name="Level" TypeName="opc:Int32" SwitchField="Mode" SwitchValue="0" SwitchOperand="NotEqual"/>
  </opc:StructuredType>
</opc:TypeDictionary>"#;

#[test]
fn test_parse_document() {
    let doc = SchemaDocument::parse_xml(SAMPLE_XML).expect("parse");
    assert_eq!(doc.target_namespace, VENDOR);
    assert_eq!(doc.imports, [OPC_UA_NAMESPACE.to_string()]);
    assert_eq!(doc.types.len(), 3);

    let st = doc.structured("Reading").expect("Reading");
    assert_eq!(st.documentation.as_deref(), Some("A sensor reading."));
    assert_eq!(st.base_type, Some(QualifiedTypeName::ua("ExtensionObject")));
    assert_eq!(field(st, "Reserved1").length, Some(31));
    assert_eq!(
        field(st, "Mode").type_name,
        QualifiedTypeName::new(VENDOR, "Mode")
    );
    assert_eq!(
        field(st, "Samples").length_field.as_deref(),
        Some("SamplesLength")
    );
    let level = field(st, "Level");
    assert_eq!(level.switch_operand, Some(SwitchOperand::NotEqual));
    assert_eq!(level.switch_value, Some(0));
    match doc.find("Hash") {
        Some(SchemaType::Opaque(ot)) => assert_eq!(ot.length_in_bits, Some(128)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_xml_output_parses_back() {
    let doc = SchemaDocument::parse_xml(SAMPLE_XML).expect("parse");
    let xml = doc.to_xml();
    assert!(xml.contains("TargetNamespace=\"urn:vendor:types\""));
    assert!(xml.contains("TypeName=\"tns:Mode\""));
    let reparsed = SchemaDocument::parse_xml(&xml).expect("reparse");
    assert_eq!(reparsed, doc);
}

#[test]
fn test_generated_document_survives_xml() {
    let tree = vendor_tree();
    let table = namespaces();
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    generator.add_type(&NodeId::numeric(2, 4009)).expect("mode");
    generator.add_type(&NodeId::numeric(2, 4007)).expect("point");
    let def = StructureDefinition::new(StructureKind::WithOptionalFields)
        .field(StructureField::new("Where", NodeId::numeric(2, 4007)).optional())
        .field(StructureField::new("Modes", NodeId::numeric(2, 4009)).array());
    generator.add_structure("Placement", &def).expect("placement");
    let doc = generator.generate().expect("generate");
    let reparsed = SchemaDocument::parse_xml(&doc.to_xml()).expect("reparse");
    assert_eq!(reparsed, doc);
}

#[test]
fn test_parse_rejects_bad_documents() {
    let wrong_root = r#"<TypeDictionary TargetNamespace="urn:x"/>"#;
    assert!(matches!(
        SchemaDocument::parse_xml(wrong_root),
        Err(CodecError::MalformedSchema { .. })
    ));
    assert!(SchemaDocument::parse_xml("<opc:TypeDictionary").is_err());

    let forward_switch = SAMPLE_XML.replace(
        r#"<opc:Field Name="NotePresent" TypeName="opc:Bit"/>"#,
        r#"<opc:Field Name="NotePresent" TypeName="opc:Bit" SwitchField="Level"/>"#,
    );
    assert!(matches!(
        SchemaDocument::parse_xml(&forward_switch),
        Err(CodecError::MalformedSchema { .. })
    ));

    let bad_operand = SAMPLE_XML.replace("NotEqual", "Sometimes");
    assert!(SchemaDocument::parse_xml(&bad_operand).is_err());
}

#[test]
fn test_validate_rejects_inconsistent_documents() {
    let duplicate = SchemaDocument::new(VENDOR)
        .with_type(SchemaType::Structured(StructuredType::new("A")))
        .with_type(SchemaType::Structured(StructuredType::new("A")));
    assert!(duplicate.validate().is_err());

    let unimported = SchemaDocument::new(VENDOR).with_type(SchemaType::Structured(
        StructuredType::new("A").field(FieldType::new(
            "Other",
            QualifiedTypeName::new("urn:elsewhere", "Thing"),
        )),
    ));
    assert!(unimported.validate().is_err());
    assert!(unimported
        .clone()
        .with_import("urn:elsewhere")
        .validate()
        .is_ok());

    let wide_bits = SchemaDocument::new(VENDOR).with_type(SchemaType::Structured(
        StructuredType::new("A").field(FieldType::new("Flags", opc("Bit")).with_length(33)),
    ));
    assert!(wide_bits.validate().is_err());

    let bad_rank = SchemaDocument::new(VENDOR).with_type(SchemaType::Structured(
        StructuredType::new("A")
            .field(FieldType::new("N", opc("Int32")))
            .field(
                FieldType::new("Grid", opc("Double"))
                    .with_length_field("N")
                    .with_value_rank(2),
            ),
    ));
    assert!(bad_rank.validate().is_err());

    let odd_enum = SchemaDocument::new(VENDOR).with_type(SchemaType::Enumerated(EnumeratedType {
        name: "E".into(),
        length_in_bits: 12,
        values: Vec::new(),
    }));
    assert!(odd_enum.validate().is_err());
}

#[test]
fn test_switch_operands() {
    assert!(SwitchOperand::Equals.evaluate(1, 1));
    assert!(SwitchOperand::NotEqual.evaluate(0, 1));
    assert!(SwitchOperand::GreaterThan.evaluate(2, 1));
    assert!(!SwitchOperand::LessThan.evaluate(1, 1));
    assert!(SwitchOperand::LessThanOrEqual.evaluate(1, 1));
    assert_eq!(
        SwitchOperand::parse("GreaterThanOrEqual"),
        Some(SwitchOperand::GreaterThanOrEqual)
    );
    assert_eq!(SwitchOperand::parse("equals"), None);
}
