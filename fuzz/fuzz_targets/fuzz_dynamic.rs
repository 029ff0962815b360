// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use uacodec::{DynamicStructCodec, SchemaDocument, SchemaSet};

const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opc:TypeDictionary xmlns:opc="http://opcfoundation.org/BinarySchema/"
    xmlns:ua="http://opcfoundation.org/UA/"
    xmlns:tns="urn:fuzz" DefaultByteOrder="LittleEndian" TargetNamespace="urn:fuzz">
  <opc:Import Namespace="http://opcfoundation.org/UA/"/>
  <opc:EnumeratedType Name="Mode" LengthInBits="8">
    <opc:EnumeratedValue Name="Off" Value="0"/>
    <opc:EnumeratedValue Name="On" Value="1"/>
  </opc:EnumeratedType>
  <opc:StructuredType Name="Node" BaseType="ua:ExtensionObject">
    <opc:Field Name="NextPresent" TypeName="opc:Bit"/>
    <opc:Field Name="Reserved1" TypeName="opc:Bit" Length="31"/>
    <opc:Field Name="Mode" TypeName="tns:Mode"/>
    <opc:Field Name="ValuesLength" TypeName="opc:Int32"/>
    <opc:Field Name="Values" TypeName="opc:String" LengthField="ValuesLength"/>
    <opc:Field Name="Grid" TypeName="opc:Int16" ValueRank="2"/>
    <opc:Field Name="Body" TypeName="ua:ExtensionObject" SwitchField="Mode" SwitchValue="1"/>
    <opc:Field Name="Next" TypeName="tns:Node" SwitchField="NextPresent"/>
  </opc:StructuredType>
</opc:TypeDictionary>"#;

fn codec() -> &'static DynamicStructCodec {
    static CODEC: OnceLock<DynamicStructCodec> = OnceLock::new();
    CODEC.get_or_init(|| {
        let doc = SchemaDocument::parse_xml(SCHEMA).expect("fuzz schema");
        let set = SchemaSet::single(doc).expect("fuzz schema set");
        set.codec("urn:fuzz", "Node").expect("Node codec")
    })
}

fuzz_target!(|data: &[u8]| {
    let codec = codec();
    if let Ok(value) = codec.decode_from_slice(data) {
        // A decoded value always encodes again.
        let _ = codec.encode_to_vec(&value).expect("re-encode");
    }
});
