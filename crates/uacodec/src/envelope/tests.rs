// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::config::EncodingLimits;
use crate::core::ser::{decode_from_slice, encode_to_vec};
use crate::core::types::NamespaceTable;
use crate::dynamic::SchemaSet;
use crate::schema::{FieldType, QualifiedTypeName, SchemaDocument, SchemaType, StructuredType};
use crate::typetree::{DataTypeTree, DataTypeTreeBuilder, StructureDefinition, StructureKind, TypeNode};
use crate::UaStructure;

const NS: &str = "urn:vendor:types";

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 2, id = 5001, encoding_id = 5002)]
struct Probe {
    label: String,
    count: u32,
}

fn probe() -> Probe {
    Probe {
        label: "ab".to_string(),
        count: 7,
    }
}

/// Encoding id 2;5002 in four-byte form, then a binary body.
fn probe_message() -> Vec<u8> {
    vec![
        0x01, 0x02, 0x8A, 0x13, 0x01, 10, 0, 0, 0, 2, 0, 0, 0, b'a', b'b', 7, 0, 0, 0,
    ]
}

fn vendor_schema() -> Arc<SchemaSet> {
    let doc = SchemaDocument::new(NS)
        .with_type(SchemaType::Structured(
            StructuredType::new("Sample")
                .field(FieldType::new("Foo", QualifiedTypeName::opc("String")))
                .field(FieldType::new("Bar", QualifiedTypeName::opc("UInt32"))),
        ))
        .with_type(SchemaType::Structured(
            StructuredType::new("Holder").field(FieldType::new(
                "Body",
                QualifiedTypeName::ua("ExtensionObject"),
            )),
        ));
    SchemaSet::single(doc).expect("schema set")
}

fn vendor_tree(ns: u16) -> DataTypeTree {
    DataTypeTreeBuilder::new()
        .with_node(TypeNode::structure(
            NodeId::numeric(ns, 7001),
            "Sample",
            NodeId::numeric(ns, 7002),
            StructureDefinition::new(StructureKind::Plain),
        ))
        .with_node(TypeNode::structure(
            NodeId::numeric(ns, 7003),
            "Holder",
            NodeId::numeric(ns, 7004),
            StructureDefinition::new(StructureKind::Plain),
        ))
        .build()
}

fn dynamic_registry() -> (CodecRegistry, u16) {
    let namespaces = NamespaceTable::new();
    let ns = namespaces.register(NS).expect("register");
    let mut registry = CodecRegistry::new();
    let count = registry.register_schema(&vendor_schema(), &vendor_tree(ns), &namespaces);
    assert_eq!(count, 2);
    (registry, ns)
}

fn sample(foo: &str, bar: u32) -> GenericStruct {
    GenericStruct::new("Sample").with("Foo", foo).with("Bar", bar)
}

#[test]
fn test_null_envelope_bytes() {
    let bytes = encode_to_vec(&Envelope::null()).expect("encode");
    assert_eq!(bytes, vec![0x00, 0x00, 0x00]);

    let decoded: Envelope = decode_from_slice(&bytes).expect("decode");
    assert!(decoded.is_null());
    assert_eq!(decoded, Envelope::default());
}

#[test]
fn test_empty_body_with_id() {
    let envelope = Envelope::empty(NodeId::numeric(2, 5002));
    let bytes = encode_to_vec(&envelope).expect("encode");
    assert_eq!(bytes, vec![0x01, 0x02, 0x8A, 0x13, 0x00]);
    let decoded: Envelope = decode_from_slice(&bytes).expect("decode");
    assert!(!decoded.is_null());
    assert_eq!(decoded, envelope);
}

#[test]
fn test_raw_body_passes_through() {
    let bytes = probe_message();
    let decoded: Envelope = decode_from_slice(&bytes).expect("decode");
    assert!(decoded.is_raw());
    assert_eq!(decoded.encoding_id(), &NodeId::numeric(2, 5002));
    assert_eq!(decoded.raw_bytes().map(<[u8]>::len), Some(10));
    assert!(decoded.type_id().is_none());
    assert_eq!(encode_to_vec(&decoded).expect("re-encode"), bytes);
}

#[test]
fn test_non_canonical_id_reencodes_exactly() {
    // Full numeric form for an id that fits the four-byte form.
    let bytes = vec![
        0x02, 0x02, 0x00, 0x8A, 0x13, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0xEE,
    ];
    let decoded: Envelope = decode_from_slice(&bytes).expect("decode");
    assert_eq!(decoded.encoding_id(), &NodeId::numeric(2, 5002));
    assert_eq!(encode_to_vec(&decoded).expect("re-encode"), bytes);

    let rebuilt = Envelope::raw(NodeId::numeric(2, 5002), EncodingFormat::Binary, vec![0xEE]);
    assert_eq!(decoded, rebuilt);
    assert_ne!(encode_to_vec(&rebuilt).expect("encode"), bytes);
}

#[test]
fn test_malformed_envelopes() {
    let null_body = [0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF];
    assert!(matches!(
        decode_from_slice::<Envelope>(&null_body),
        Err(CodecError::InvalidData { .. })
    ));

    let bad_encoding = [0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x00];
    assert!(matches!(
        decode_from_slice::<Envelope>(&bad_encoding),
        Err(CodecError::InvalidData { .. })
    ));

    let short_body = [0x00, 0x00, 0x01, 0x04, 0x00, 0x00, 0x00, 0x01];
    assert!(matches!(
        decode_from_slice::<Envelope>(&short_body),
        Err(CodecError::TruncatedInput { .. })
    ));
}

#[test]
fn test_unknown_type_stays_raw() {
    let registry = CodecRegistry::new();
    let bytes = probe_message();

    let envelope = decode_message(&registry, &bytes).expect("decode");
    assert!(envelope.is_raw());
    assert_eq!(encode_message(&registry, &envelope).expect("encode"), bytes);

    let mut raw = envelope.clone();
    let err = raw.materialize(&registry).expect_err("unknown type");
    assert!(err.is_recoverable());
    assert!(matches!(err, CodecError::UnknownType { .. }));
    assert!(raw.is_raw());
}

#[test]
fn test_compiled_roundtrip() {
    let mut registry = CodecRegistry::new();
    registry.register_structure::<Probe>();
    assert!(registry.contains(EncodingFormat::Binary, &NodeId::numeric(2, 5001)));

    let bytes = encode_structure_message(&registry, probe()).expect("encode");
    assert_eq!(bytes, probe_message());

    let envelope = decode_message(&registry, &bytes).expect("decode");
    assert!(envelope.is_decoded());
    assert_eq!(envelope.type_id(), Some(&NodeId::numeric(2, 5001)));
    assert_eq!(envelope.decoded_as::<Probe>(), Some(&probe()));
    assert!(envelope.decoded_as::<String>().is_none());
    assert_eq!(envelope, Envelope::from_structure(probe()));

    assert_eq!(encode_message(&registry, &envelope).expect("re-encode"), bytes);
}

#[test]
fn test_materialize_in_place() {
    let mut registry = CodecRegistry::new();
    registry.register_structure::<Probe>();

    let mut envelope: Envelope = decode_from_slice(&probe_message()).expect("decode");
    envelope.materialize(&registry).expect("materialize");
    assert_eq!(envelope.decoded_as::<Probe>(), Some(&probe()));

    // Already decoded: nothing to do.
    envelope.materialize(&registry).expect("idempotent");
    assert!(envelope.is_decoded());
}

#[test]
fn test_materialize_rejects_bad_bodies() {
    let mut registry = CodecRegistry::new();
    registry.register_structure::<Probe>();
    let id = NodeId::numeric(2, 5002);

    let mut xml = Envelope::raw(id.clone(), EncodingFormat::Xml, b"<Probe/>".to_vec());
    assert!(matches!(
        xml.materialize(&registry),
        Err(CodecError::UnknownType { .. })
    ));
    assert!(xml.is_raw());

    let mut trailing = Envelope::raw(
        id,
        EncodingFormat::Binary,
        vec![0, 0, 0, 0, 1, 0, 0, 0, 0xFF],
    );
    assert!(matches!(
        trailing.materialize(&registry),
        Err(CodecError::InvalidData { .. })
    ));
    assert!(trailing.is_raw());
}

#[test]
fn test_message_with_foreign_body_format_stays_raw() {
    let mut registry = CodecRegistry::new();
    registry.register_structure::<Probe>();

    // binary encoding id 2;5002 carrying an XML body
    let mut bytes = vec![0x01, 0x02, 0x8A, 0x13, 0x02, 8, 0, 0, 0];
    bytes.extend_from_slice(b"<Sample>");
    let envelope = decode_message(&registry, &bytes).expect("decode");
    assert!(envelope.is_raw());
    assert_eq!(envelope.encoding_id, NodeId::numeric(2, 5002));
    assert_eq!(encode_message(&registry, &envelope).expect("re-encode"), bytes);
}

#[test]
fn test_reregistration_replaces_encoding() {
    let mut registry = CodecRegistry::new();
    registry.register_structure::<Probe>();
    let type_id = NodeId::numeric(2, 5001);
    registry.register(
        EncodingFormat::Binary,
        type_id.clone(),
        NodeId::numeric(2, 6000),
        CodecHandle::compiled::<Probe>(),
    );

    assert_eq!(registry.len(), 1);
    assert!(registry.resolve(&NodeId::numeric(2, 5002)).is_none());
    let (format, resolved, codec) = registry
        .resolve(&NodeId::numeric(2, 6000))
        .expect("new encoding");
    assert_eq!(format, EncodingFormat::Binary);
    assert_eq!(resolved, &type_id);
    assert_eq!(codec.type_name(), "Probe");
    assert_eq!(
        registry.encoding_id(EncodingFormat::Binary, &type_id),
        Some(&NodeId::numeric(2, 6000))
    );
}

#[test]
fn test_dynamic_roundtrip() {
    let (registry, ns) = dynamic_registry();
    let type_id = NodeId::numeric(ns, 7001);
    let handle = registry
        .lookup(EncodingFormat::Binary, &type_id)
        .expect("registered");
    assert!(handle.is_dynamic());
    assert_eq!(handle.type_name(), "Sample");

    let envelope = registry
        .wrap_generic(&type_id, sample("hi", 3))
        .expect("wrap");
    let bytes = encode_message(&registry, &envelope).expect("encode");
    assert_eq!(&bytes[..4], &[0x01, 0x01, 0x5A, 0x1B]);

    let decoded = decode_message(&registry, &bytes).expect("decode");
    assert_eq!(decoded.type_id(), Some(&type_id));
    assert_eq!(decoded.decoded_struct(), Some(&sample("hi", 3)));
    assert_eq!(decoded, envelope);
}

#[test]
fn test_wrap_generic_errors() {
    let (mut registry, _) = dynamic_registry();
    registry.register_structure::<Probe>();

    assert!(matches!(
        registry.wrap_generic(&NodeId::numeric(2, 5001), sample("x", 1)),
        Err(CodecError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.wrap_generic(&NodeId::numeric(9, 1), sample("x", 1)),
        Err(CodecError::UnknownType { .. })
    ));
}

#[test]
fn test_register_schema_skips_unknown_types() {
    let namespaces = NamespaceTable::new();
    let mut registry = CodecRegistry::new();
    // Namespace not in the table.
    assert_eq!(
        registry.register_schema(&vendor_schema(), &vendor_tree(1), &namespaces),
        0
    );

    let ns = namespaces.register(NS).expect("register");
    let partial = DataTypeTreeBuilder::new()
        .with_node(TypeNode::new(NodeId::numeric(ns, 7001), "Sample"))
        .build();
    assert_eq!(
        registry.register_schema(&vendor_schema(), &partial, &namespaces),
        0
    );
    assert!(registry.is_empty());
}

#[test]
fn test_nested_envelopes_materialized() {
    let (registry, ns) = dynamic_registry();
    let inner = registry
        .wrap_generic(&NodeId::numeric(ns, 7001), sample("in", 1))
        .expect("wrap inner");
    let outer = registry
        .wrap_generic(
            &NodeId::numeric(ns, 7003),
            GenericStruct::new("Holder").with("Body", inner.clone()),
        )
        .expect("wrap outer");

    let bytes = encode_message(&registry, &outer).expect("encode");
    let decoded = decode_message(&registry, &bytes).expect("decode");
    let body = decoded
        .decoded_struct()
        .and_then(|s| s.get("Body"))
        .and_then(Value::as_envelope)
        .expect("nested envelope");
    assert!(body.is_decoded());
    assert_eq!(body, &inner);
}

#[test]
fn test_nested_unknown_type_left_raw() {
    let (registry, ns) = dynamic_registry();
    let foreign = Envelope::raw(NodeId::numeric(5, 1), EncodingFormat::Binary, vec![1, 2]);
    let outer = registry
        .wrap_generic(
            &NodeId::numeric(ns, 7003),
            GenericStruct::new("Holder").with("Body", foreign.clone()),
        )
        .expect("wrap");

    let bytes = encode_message(&registry, &outer).expect("encode");
    let decoded = decode_message(&registry, &bytes).expect("decode");
    assert!(decoded.is_decoded());
    let body = decoded
        .decoded_struct()
        .and_then(|s| s.get("Body"))
        .and_then(Value::as_envelope)
        .expect("nested envelope");
    assert!(body.is_raw());
    assert_eq!(body, &foreign);
    assert_eq!(encode_message(&registry, &decoded).expect("re-encode"), bytes);
}

#[test]
fn test_message_limits() {
    let limits = EncodingLimits {
        max_message_size: 16,
        ..EncodingLimits::default()
    };
    let mut registry = CodecRegistry::with_limits(limits);
    registry.register_structure::<Probe>();

    let long = Probe {
        label: "x".repeat(32),
        count: 0,
    };
    assert!(matches!(
        encode_structure_message(&registry, long),
        Err(CodecError::LengthOutOfRange { .. })
    ));
    assert!(matches!(
        decode_message(&registry, &[0u8; 32]),
        Err(CodecError::LengthOutOfRange { .. })
    ));

    let mut trailing = probe_message();
    trailing.push(0);
    assert!(matches!(
        decode_message(&CodecRegistry::new(), &trailing),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn test_handle_publishes_snapshots() {
    let handle = RegistryHandle::default();
    let before = handle.load();
    assert!(before.is_empty());

    let namespaces = NamespaceTable::new();
    let ns = namespaces.register(NS).expect("register");
    let added = handle.register_schema(&vendor_schema(), &vendor_tree(ns), &namespaces);
    assert_eq!(added, 2);
    handle.update(|registry| registry.register_structure::<Probe>());

    // Earlier snapshots are unaffected.
    assert!(before.is_empty());
    let after = handle.load();
    assert_eq!(after.len(), 3);
    assert!(after.resolve(&NodeId::numeric(2, 5002)).is_some());

    handle.replace(CodecRegistry::new());
    assert!(handle.load().is_empty());
    assert_eq!(after.len(), 3);
}
