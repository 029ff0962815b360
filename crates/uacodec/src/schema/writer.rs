// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `opc:TypeDictionary` XML output.
//!
//! Prefixes: `opc` for the binary schema vocabulary, `ua` for the base
//! model, `tns` for the target namespace and `ns1`, `ns2`, ... for the
//! remaining imports in declaration order.

use super::{FieldType, QualifiedTypeName, SchemaDocument, SchemaType, StructuredType};
use crate::config::{BINARY_SCHEMA_NAMESPACE, OPC_UA_NAMESPACE};
use std::fmt::Write;

struct Prefixes<'a> {
    target: &'a str,
    imports: Vec<(&'a str, String)>,
}

impl<'a> Prefixes<'a> {
    fn new(doc: &'a SchemaDocument) -> Self {
        let mut imports = Vec::new();
        let mut next = 1;
        for ns in &doc.imports {
            if ns == BINARY_SCHEMA_NAMESPACE || ns == OPC_UA_NAMESPACE || *ns == doc.target_namespace
            {
                continue;
            }
            imports.push((ns.as_str(), format!("ns{}", next)));
            next += 1;
        }
        Self {
            target: &doc.target_namespace,
            imports,
        }
    }

    fn qualify(&self, name: &QualifiedTypeName) -> String {
        let prefix = if name.namespace == BINARY_SCHEMA_NAMESPACE {
            "opc"
        } else if name.namespace == OPC_UA_NAMESPACE {
            "ua"
        } else if name.namespace == self.target {
            "tns"
        } else {
            match self.imports.iter().find(|(ns, _)| *ns == name.namespace) {
                Some((_, prefix)) => prefix.as_str(),
                None => return name.name.clone(),
            }
        };
        format!("{}:{}", prefix, name.name)
    }
}

pub fn write(doc: &SchemaDocument) -> String {
    let prefixes = Prefixes::new(doc);
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = write!(
        out,
        "<opc:TypeDictionary xmlns:opc=\"{}\" xmlns:ua=\"{}\" xmlns:tns=\"{}\"",
        BINARY_SCHEMA_NAMESPACE,
        OPC_UA_NAMESPACE,
        escape(&doc.target_namespace)
    );
    for (ns, prefix) in &prefixes.imports {
        let _ = write!(out, " xmlns:{}=\"{}\"", prefix, escape(ns));
    }
    let _ = writeln!(
        out,
        " DefaultByteOrder=\"LittleEndian\" TargetNamespace=\"{}\">",
        escape(&doc.target_namespace)
    );

    for ns in &doc.imports {
        let _ = writeln!(out, "  <opc:Import Namespace=\"{}\"/>", escape(ns));
    }
    for ty in &doc.types {
        match ty {
            SchemaType::Enumerated(et) => {
                let _ = writeln!(
                    out,
                    "  <opc:EnumeratedType Name=\"{}\" LengthInBits=\"{}\">",
                    escape(&et.name),
                    et.length_in_bits
                );
                for v in &et.values {
                    let _ = writeln!(
                        out,
                        "    <opc:EnumeratedValue Name=\"{}\" Value=\"{}\"/>",
                        escape(&v.name),
                        v.value
                    );
                }
                out.push_str("  </opc:EnumeratedType>\n");
            }
            SchemaType::Opaque(ot) => {
                let _ = write!(out, "  <opc:OpaqueType Name=\"{}\"", escape(&ot.name));
                if let Some(bits) = ot.length_in_bits {
                    let _ = write!(out, " LengthInBits=\"{}\"", bits);
                }
                out.push_str("/>\n");
            }
            SchemaType::Structured(st) => write_structured(&mut out, &prefixes, st),
        }
    }
    out.push_str("</opc:TypeDictionary>\n");
    out
}

fn write_structured(out: &mut String, prefixes: &Prefixes<'_>, st: &StructuredType) {
    let _ = write!(out, "  <opc:StructuredType Name=\"{}\"", escape(&st.name));
    if let Some(base) = &st.base_type {
        let _ = write!(out, " BaseType=\"{}\"", escape(&prefixes.qualify(base)));
    }
    out.push_str(">\n");
    if let Some(doc) = &st.documentation {
        let _ = writeln!(out, "    <opc:Documentation>{}</opc:Documentation>", escape(doc));
    }
    for field in &st.fields {
        write_field(out, prefixes, field);
    }
    out.push_str("  </opc:StructuredType>\n");
}

fn write_field(out: &mut String, prefixes: &Prefixes<'_>, field: &FieldType) {
    let _ = write!(
        out,
        "    <opc:Field Name=\"{}\" TypeName=\"{}\"",
        escape(&field.name),
        escape(&prefixes.qualify(&field.type_name))
    );
    if let Some(length) = field.length {
        let _ = write!(out, " Length=\"{}\"", length);
    }
    if let Some(length_field) = &field.length_field {
        let _ = write!(out, " LengthField=\"{}\"", escape(length_field));
    }
    if field.is_length_in_bytes {
        out.push_str(" IsLengthInBytes=\"true\"");
    }
    if let Some(switch) = &field.switch_field {
        let _ = write!(out, " SwitchField=\"{}\"", escape(switch));
    }
    if let Some(value) = field.switch_value {
        let _ = write!(out, " SwitchValue=\"{}\"", value);
    }
    if let Some(op) = field.switch_operand {
        let _ = write!(out, " SwitchOperand=\"{}\"", op.as_str());
    }
    if let Some(rank) = field.value_rank {
        let _ = write!(out, " ValueRank=\"{}\"", rank);
    }
    out.push_str("/>\n");
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
