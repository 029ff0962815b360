// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Bench parameters
#![allow(clippy::missing_panics_doc)] // Benches panic on failure

//! Codec benchmarks
//!
//! Compares the compiled and schema-driven paths on the same payload and
//! measures envelope dispatch through the registry.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use uacodec::envelope::{decode_message, encode_message};
use uacodec::schema::SchemaGenerator;
use uacodec::typetree::DataTypeTreeBuilder;
use uacodec::{
    decode_from_slice, encode_to_vec, CodecRegistry, DataTypeTree, DynamicStructCodec, Envelope,
    GenericStruct, NamespaceTable, SchemaSet, UaStructure, Value,
};

const VENDOR: &str = "urn:vendor:bench";

#[derive(Debug, Clone, PartialEq, UaStructure)]
#[ua(namespace = 1, id = 9001, encoding_id = 9002)]
struct Sample {
    name: String,
    #[ua(optional)]
    quality: Option<u32>,
    readings: Vec<f64>,
}

fn sample(len: usize) -> Sample {
    let mut rng = fastrand::Rng::with_seed(7);
    Sample {
        name: "sensor-42".to_string(),
        quality: Some(rng.u32(..)),
        readings: (0..len).map(|_| rng.f64()).collect(),
    }
}

fn generic(value: &Sample) -> GenericStruct {
    let mut out = GenericStruct::new("Sample").with("Name", value.name.as_str());
    if let Some(quality) = value.quality {
        out.insert("Quality", quality);
    }
    out.with(
        "Readings",
        value
            .readings
            .iter()
            .copied()
            .map(Value::Double)
            .collect::<Vec<_>>(),
    )
}

fn dynamic_codec() -> DynamicStructCodec {
    let tree = DataTypeTreeBuilder::from_tree(&DataTypeTree::standard())
        .with_node(Sample::type_node())
        .build();
    let namespaces = NamespaceTable::new();
    namespaces.register(VENDOR).expect("register");
    let mut generator = SchemaGenerator::new(VENDOR, &tree, &namespaces);
    generator
        .add_type(&Sample::type_node().type_id)
        .expect("generate");
    let set = SchemaSet::single(generator.generate().expect("document")).expect("schema set");
    set.codec(VENDOR, "Sample").expect("codec")
}

fn bench_compiled(c: &mut Criterion) {
    let mut group = c.benchmark_group("compiled");
    for len in [8usize, 256, 4096] {
        let value = sample(len);
        let bytes = encode_to_vec(&value).expect("encode");
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", len), &value, |b, v| {
            b.iter(|| encode_to_vec(black_box(v)).expect("encode"));
        });
        group.bench_with_input(BenchmarkId::new("decode", len), &bytes, |b, bytes| {
            b.iter(|| decode_from_slice::<Sample>(black_box(bytes)).expect("decode"));
        });
    }
    group.finish();
}

fn bench_dynamic(c: &mut Criterion) {
    let codec = dynamic_codec();
    let mut group = c.benchmark_group("dynamic");
    for len in [8usize, 256, 4096] {
        let value = generic(&sample(len));
        let bytes = codec.encode_to_vec(&value).expect("encode");
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", len), &value, |b, v| {
            b.iter(|| codec.encode_to_vec(black_box(v)).expect("encode"));
        });
        group.bench_with_input(BenchmarkId::new("decode", len), &bytes, |b, bytes| {
            b.iter(|| codec.decode_from_slice(black_box(bytes)).expect("decode"));
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut registry = CodecRegistry::new();
    registry.register_structure::<Sample>();
    let message = encode_message(&registry, &Envelope::from_structure(sample(64))).expect("encode");
    let empty = CodecRegistry::new();

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Bytes(message.len() as u64));
    group.bench_function("materialize", |b| {
        b.iter(|| decode_message(&registry, black_box(&message)).expect("decode"));
    });
    group.bench_function("pass_through", |b| {
        b.iter(|| {
            let envelope = decode_message(&empty, black_box(&message)).expect("decode");
            encode_message(&empty, &envelope).expect("encode")
        });
    });
    group.finish();
}

criterion_group!(benches, bench_compiled, bench_dynamic, bench_dispatch);
criterion_main!(benches);
