// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use uacodec::envelope::{decode_message, encode_message};
use uacodec::{decode_from_slice, CodecRegistry, Matrix, NodeId, UaStructure};

#[derive(Debug, PartialEq, UaStructure)]
#[ua(namespace = 1, id = 100, encoding_id = 101)]
struct Frame {
    name: String,
    #[ua(optional)]
    scale: Option<f64>,
    samples: Vec<i32>,
}

#[derive(Debug, PartialEq, UaStructure)]
#[ua(namespace = 1, id = 102, encoding_id = 103)]
enum Payload {
    None,
    Frame(Frame),
    Text(String),
}

fuzz_target!(|data: &[u8]| {
    let _ = decode_from_slice::<NodeId>(data);
    let _ = decode_from_slice::<Matrix<u16>>(data);
    let _ = decode_from_slice::<Payload>(data);

    let mut registry = CodecRegistry::new();
    registry.register_structure::<Frame>();
    registry.register_structure::<Payload>();

    // Whatever decodes must re-encode to the same bytes.
    if let Ok(envelope) = decode_message(&registry, data) {
        if envelope.is_raw() {
            let bytes = encode_message(&registry, &envelope).expect("raw re-encode");
            assert_eq!(bytes, data);
        }
    }
});
