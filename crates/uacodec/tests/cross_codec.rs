// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled and schema-driven codecs must agree byte for byte.
//!
//! Each compiled type is described to the schema generator, the generated
//! document drives a dynamic codec, and both encodings are compared.

use std::fmt::Debug;
use std::sync::Arc;

use uacodec::schema::SchemaGenerator;
use uacodec::typetree::{
    DataTypeTreeBuilder, StructureDefinition, StructureField, StructureKind, TypeNode,
};
use uacodec::{
    decode_from_slice, encode_to_vec, BinaryDecode, BinaryEncode, DataTypeTree, DataValue,
    DynamicStructCodec, Envelope, ExpandedNodeId, GenericStruct, LocalizedText, Matrix, NodeId,
    NamespaceTable, QualifiedName, SchemaSet, TypeId, UaDataType, UaEnum, UaEnumeration,
    UaStructure, Value, Variant, VariantValue,
};

const VENDOR: &str = "urn:vendor:types";

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5001, encoding_id = 5002)]
struct Sample {
    foo: String,
    bar: u32,
    baz: bool,
}

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5003, encoding_id = 5004)]
struct WithOptionalFields {
    foo: String,
    #[ua(optional)]
    bar: Option<i32>,
    #[ua(optional)]
    baz: Option<String>,
}

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5005, encoding_id = 5006)]
struct ArrayContainer {
    int_array: Vec<i32>,
    string_array: Vec<String>,
    samples: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5007, encoding_id = 5008)]
enum Choice {
    Null,
    Foo(i32),
    Bar(String),
    Many(Vec<u16>),
}

#[derive(Debug, Clone, Copy, PartialEq, UaEnum)]
#[ua(namespace = 2, id = 3001)]
enum Mode {
    Off = 0,
    Auto = 1,
    Manual = 4,
}

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5010, encoding_id = 5011)]
struct Reading {
    mode: Mode,
    grid: Matrix<f32>,
    #[ua(rank = 3)]
    cube: Matrix<u8>,
    inner: Sample,
    #[ua(optional)]
    extra: Option<Sample>,
    payload: Envelope,
}

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5020, encoding_id = 5021)]
struct Base {
    id: i32,
}

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5022, encoding_id = 5023, base = 5020)]
struct Derived {
    id: i32,
    #[ua(rename = "DisplayLabel")]
    label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5030, encoding_id = 5031)]
struct Annotation {
    label: LocalizedText,
    browse_name: QualifiedName,
    target: ExpandedNodeId,
    value: Variant,
    reading: DataValue,
}

fn namespaces() -> NamespaceTable {
    let table = NamespaceTable::new();
    table.register("urn:vendor:server").expect("register");
    table.register(VENDOR).expect("register");
    table
}

/// Generate a schema for `types` (the first is returned as a codec).
fn dynamic_codec(nodes: Vec<TypeNode>, name: &str) -> DynamicStructCodec {
    let tree = DataTypeTreeBuilder::from_tree(&DataTypeTree::standard())
        .with_nodes(nodes.clone())
        .build();
    let table = namespaces();
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &table);
    for node in &nodes {
        generator.add_type(&node.type_id).expect("generate");
    }
    let document = generator.generate().expect("valid document");
    let set: Arc<SchemaSet> = SchemaSet::single(document).expect("schema set");
    set.codec(VENDOR, name).expect("structured type")
}

fn assert_same_bytes<T>(value: &T, generic: &GenericStruct, codec: &DynamicStructCodec)
where
    T: BinaryEncode + BinaryDecode + PartialEq + Debug,
{
    let compiled = encode_to_vec(value).expect("compiled encode");
    let dynamic = codec.encode_to_vec(generic).expect("dynamic encode");
    assert_eq!(compiled, dynamic, "{:?}", value);

    assert_eq!(&codec.decode_from_slice(&compiled).expect("dynamic decode"), generic);
    let back: T = decode_from_slice(&dynamic).expect("compiled decode");
    assert_eq!(&back, value);
}

fn sample(foo: &str, bar: u32, baz: bool) -> (Sample, GenericStruct) {
    (
        Sample {
            foo: foo.to_string(),
            bar,
            baz,
        },
        GenericStruct::new("Sample")
            .with("Foo", foo)
            .with("Bar", bar)
            .with("Baz", baz),
    )
}

#[test]
fn plain_structure() {
    let codec = dynamic_codec(vec![Sample::type_node()], "Sample");
    let (value, generic) = sample("hello", 0, false);
    assert_same_bytes(&value, &generic, &codec);

    let (value, generic) = sample("", u32::MAX, true);
    assert_same_bytes(&value, &generic, &codec);
}

#[test]
fn optional_fields() {
    let codec = dynamic_codec(vec![WithOptionalFields::type_node()], "WithOptionalFields");
    let cases = [
        (None, None),
        (Some(-5), None),
        (None, Some("z")),
        (Some(1), Some("both")),
    ];
    for (bar, baz) in cases {
        let value = WithOptionalFields {
            foo: "f".to_string(),
            bar,
            baz: baz.map(str::to_string),
        };
        let mut generic = GenericStruct::new("WithOptionalFields").with("Foo", "f");
        if let Some(bar) = bar {
            generic.insert("Bar", bar);
        }
        if let Some(baz) = baz {
            generic.insert("Baz", baz);
        }
        assert_same_bytes(&value, &generic, &codec);
    }
}

#[test]
fn arrays_with_length_fields() {
    let codec = dynamic_codec(vec![ArrayContainer::type_node()], "ArrayContainer");
    let value = ArrayContainer {
        int_array: vec![1, 2, 3],
        string_array: vec!["hello".to_string(), "world".to_string()],
        samples: None,
    };
    let generic = GenericStruct::new("ArrayContainer")
        .with("IntArray", vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)])
        .with("StringArray", vec![Value::from("hello"), Value::from("world")])
        .with("Samples", Value::Null);
    assert_same_bytes(&value, &generic, &codec);

    let value = ArrayContainer {
        int_array: Vec::new(),
        string_array: Vec::new(),
        samples: Some(vec![0.5, -0.5]),
    };
    let generic = GenericStruct::new("ArrayContainer")
        .with("IntArray", Vec::<Value>::new())
        .with("StringArray", Vec::<Value>::new())
        .with("Samples", vec![Value::Double(0.5), Value::Double(-0.5)]);
    assert_same_bytes(&value, &generic, &codec);
}

#[test]
fn unions() {
    let codec = dynamic_codec(vec![Choice::type_node()], "Choice");
    assert_same_bytes(&Choice::Null, &GenericStruct::new("Choice"), &codec);
    assert_same_bytes(
        &Choice::Foo(-7),
        &GenericStruct::new("Choice").with("Foo", -7i32),
        &codec,
    );
    assert_same_bytes(
        &Choice::Bar("hi".to_string()),
        &GenericStruct::new("Choice").with("Bar", "hi"),
        &codec,
    );
    assert_same_bytes(
        &Choice::Many(vec![1, 2]),
        &GenericStruct::new("Choice").with("Many", vec![Value::UInt16(1), Value::UInt16(2)]),
        &codec,
    );
}

#[test]
fn nested_enum_matrix_and_envelope() {
    let codec = dynamic_codec(
        vec![Mode::type_node(), Sample::type_node(), Reading::type_node()],
        "Reading",
    );
    let (inner, inner_generic) = sample("in", 3, true);
    let value = Reading {
        mode: Mode::Manual,
        grid: Matrix::new(vec![2, 3], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).expect("matrix"),
        cube: Matrix::new(vec![1, 2, 2], vec![1, 2, 3, 4]).expect("matrix"),
        inner,
        extra: None,
        payload: Envelope::null(),
    };
    let generic = GenericStruct::new("Reading")
        .with("Mode", Value::Enum(4))
        .with(
            "Grid",
            Value::Matrix {
                dimensions: vec![2, 3],
                elements: (0..6).map(|i| Value::Float(i as f32)).collect(),
            },
        )
        .with(
            "Cube",
            Value::Matrix {
                dimensions: vec![1, 2, 2],
                elements: (1..=4).map(Value::Byte).collect(),
            },
        )
        .with("Inner", inner_generic)
        .with("Payload", Value::Null);
    assert_same_bytes(&value, &generic, &codec);
}

#[test]
fn inherited_fields() {
    let codec = dynamic_codec(vec![Base::type_node(), Derived::type_node()], "Derived");
    let value = Derived {
        id: 9,
        label: Some("nine".to_string()),
    };
    let generic = GenericStruct::new("Derived")
        .with("Id", 9i32)
        .with("DisplayLabel", "nine");
    assert_same_bytes(&value, &generic, &codec);

    let unlabeled = Derived { id: 1, label: None };
    let generic = GenericStruct::new("Derived")
        .with("Id", 1i32)
        .with("DisplayLabel", Value::Null);
    assert_same_bytes(&unlabeled, &generic, &codec);
}

#[test]
fn enum_decode_rejects_unknown_value() {
    assert_eq!(Mode::data_type_id(), TypeId::numeric(2, 3001));
    assert_eq!(Mode::definition().name_of(4), Some("Manual"));
    let bytes = encode_to_vec(&2i32).expect("encode");
    assert!(matches!(
        decode_from_slice::<Mode>(&bytes),
        Err(uacodec::CodecError::InvalidData { .. })
    ));
}

#[test]
fn non_primitive_builtins() {
    let codec = dynamic_codec(vec![Annotation::type_node()], "Annotation");
    let value = Annotation {
        label: LocalizedText::new("en", "Flow"),
        browse_name: QualifiedName::new(2, "Flow"),
        target: ExpandedNodeId {
            node_id: NodeId::numeric(2, 77),
            namespace_uri: Some(VENDOR.to_string()),
            server_index: 1,
        },
        value: Variant::from(VariantValue::Double(2.5)),
        reading: DataValue::new(Variant::from(VariantValue::Int32(7))),
    };
    let generic = GenericStruct::new("Annotation")
        .with("Label", value.label.clone())
        .with("BrowseName", value.browse_name.clone())
        .with("Target", value.target.clone())
        .with("Value", value.value.clone())
        .with("Reading", value.reading.clone());
    assert_same_bytes(&value, &generic, &codec);
}

#[test]
fn abstract_number_field_loads_as_variant() {
    const NUMBER: u32 = 26;
    let def = StructureDefinition::new(StructureKind::Plain)
        .field(StructureField::new("Label", NodeId::ns0(21)))
        .field(StructureField::new("Value", NodeId::ns0(NUMBER)));
    let node = TypeNode::structure(
        NodeId::numeric(2, 5040),
        "Measured",
        NodeId::numeric(2, 5041),
        def,
    );
    let codec = dynamic_codec(vec![node], "Measured");

    let generic = GenericStruct::new("Measured")
        .with("Label", LocalizedText::text("rpm"))
        .with("Value", Variant::from(VariantValue::UInt16(1200)));
    let bytes = codec.encode_to_vec(&generic).expect("encode");
    // mask 0x02, "rpm", then a UInt16 Variant
    assert_eq!(
        bytes,
        vec![0x02, 3, 0, 0, 0, b'r', b'p', b'm', 5, 0xB0, 0x04]
    );
    assert_eq!(codec.decode_from_slice(&bytes).expect("decode"), generic);

    let empty = GenericStruct::new("Measured")
        .with("Label", LocalizedText::default())
        .with("Value", Value::Null);
    let bytes = codec.encode_to_vec(&empty).expect("encode");
    assert_eq!(bytes, vec![0x00, 0x00]);
    assert_eq!(codec.decode_from_slice(&bytes).expect("decode"), empty);
}
