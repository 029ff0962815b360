// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `opc:TypeDictionary` XML parsing.

use super::{
    EnumeratedType, EnumeratedValue, FieldType, OpaqueType, QualifiedTypeName, SchemaDocument,
    SchemaType, StructuredType, SwitchOperand,
};
use crate::config::BINARY_SCHEMA_NAMESPACE;
use crate::core::ser::{CodecError, CodecResult};
use roxmltree::{Document, Node};
use std::str::FromStr;

/// Parse a document without the cross-field checks of
/// [`SchemaDocument::validate`].
pub fn parse(xml: &str) -> CodecResult<SchemaDocument> {
    let doc = Document::parse(xml)
        .map_err(|e| CodecError::malformed(format!("failed to parse XML: {}", e)))?;
    let root = doc.root_element();
    if root.tag_name().name() != "TypeDictionary"
        || root.tag_name().namespace() != Some(BINARY_SCHEMA_NAMESPACE)
    {
        return Err(CodecError::malformed(format!(
            "root element is <{}>, expected opc:TypeDictionary",
            root.tag_name().name()
        )));
    }
    let target = required(&root, "TargetNamespace")?;
    let mut schema = SchemaDocument::new(target);

    for child in root.children().filter(|n| is_schema_element(n)) {
        match child.tag_name().name() {
            "Import" => {
                let namespace = required(&child, "Namespace")?;
                schema = schema.with_import(namespace);
            }
            "StructuredType" => {
                let st = parse_structured(&child, &schema.target_namespace)?;
                schema.types.push(SchemaType::Structured(st));
            }
            "EnumeratedType" => schema.types.push(SchemaType::Enumerated(parse_enumerated(&child)?)),
            "OpaqueType" => schema.types.push(SchemaType::Opaque(OpaqueType {
                name: required(&child, "Name")?.to_string(),
                length_in_bits: optional_number(&child, "LengthInBits")?,
            })),
            "Documentation" => {}
            other => log::debug!("[schema] ignoring <{}> in {}", other, schema.target_namespace),
        }
    }
    Ok(schema)
}

fn is_schema_element(node: &Node) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(BINARY_SCHEMA_NAMESPACE)
}

fn parse_structured(node: &Node, target: &str) -> CodecResult<StructuredType> {
    let mut st = StructuredType::new(required(node, "Name")?);
    st.base_type = node
        .attribute("BaseType")
        .map(|qname| resolve_qname(node, qname, target))
        .transpose()?;
    for child in node.children().filter(|n| is_schema_element(n)) {
        match child.tag_name().name() {
            "Documentation" => st.documentation = child.text().map(|t| t.trim().to_string()),
            "Field" => st.fields.push(parse_field(&child, target)?),
            other => {
                return Err(CodecError::malformed(format!(
                    "unexpected <{}> in structured type '{}'",
                    other, st.name
                )))
            }
        }
    }
    Ok(st)
}

fn parse_field(node: &Node, target: &str) -> CodecResult<FieldType> {
    let name = required(node, "Name")?;
    let type_name = resolve_qname(node, required(node, "TypeName")?, target)?;
    let mut field = FieldType::new(name, type_name);
    field.length = optional_number(node, "Length")?;
    field.length_field = node.attribute("LengthField").map(str::to_string);
    field.is_length_in_bytes = optional_bool(node, "IsLengthInBytes")?;
    field.switch_field = node.attribute("SwitchField").map(str::to_string);
    field.switch_value = optional_number(node, "SwitchValue")?;
    field.switch_operand = node
        .attribute("SwitchOperand")
        .map(|op| {
            SwitchOperand::parse(op)
                .ok_or_else(|| CodecError::malformed(format!("unknown SwitchOperand '{}'", op)))
        })
        .transpose()?;
    field.value_rank = optional_number(node, "ValueRank")?;
    Ok(field)
}

fn parse_enumerated(node: &Node) -> CodecResult<EnumeratedType> {
    let name = required(node, "Name")?.to_string();
    let length_in_bits = optional_number(node, "LengthInBits")?.unwrap_or(32);
    let mut values = Vec::new();
    for child in node
        .children()
        .filter(|n| is_schema_element(n) && n.tag_name().name() == "EnumeratedValue")
    {
        values.push(EnumeratedValue {
            name: required(&child, "Name")?.to_string(),
            value: optional_number(&child, "Value")?.ok_or_else(|| {
                CodecError::malformed(format!("enumerated value in '{}' has no Value", name))
            })?,
        });
    }
    Ok(EnumeratedType {
        name,
        length_in_bits,
        values,
    })
}

/// Resolve `prefix:Name` against the namespaces in scope at `node`.
/// An unprefixed name uses the default namespace, else the target namespace.
fn resolve_qname(node: &Node, qname: &str, target: &str) -> CodecResult<QualifiedTypeName> {
    let (prefix, local) = match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    };
    if local.is_empty() {
        return Err(CodecError::malformed(format!("empty type name '{}'", qname)));
    }
    let namespace = match prefix {
        Some(prefix) => node.lookup_namespace_uri(Some(prefix)).ok_or_else(|| {
            CodecError::malformed(format!("undeclared namespace prefix '{}'", prefix))
        })?,
        None => node.lookup_namespace_uri(None).unwrap_or(target),
    };
    Ok(QualifiedTypeName::new(namespace, local))
}

fn required<'a>(node: &Node<'a, '_>, attr: &str) -> CodecResult<&'a str> {
    match node.attribute(attr) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CodecError::malformed(format!(
            "<{}> is missing attribute {}",
            node.tag_name().name(),
            attr
        ))),
    }
}

fn optional_number<T: FromStr>(node: &Node, attr: &str) -> CodecResult<Option<T>> {
    node.attribute(attr)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                CodecError::malformed(format!("{}=\"{}\" is not a valid number", attr, raw))
            })
        })
        .transpose()
}

fn optional_bool(node: &Node, attr: &str) -> CodecResult<bool> {
    match node.attribute(attr).map(str::trim) {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(CodecError::malformed(format!(
            "{}=\"{}\" is not a boolean",
            attr, other
        ))),
    }
}
