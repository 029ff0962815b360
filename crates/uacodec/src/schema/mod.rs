// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema Documents in the OPC Binary Schema vocabulary.
//!
//! A document is a named collection of structured, enumerated and opaque
//! type descriptions, keyed by its target namespace URI. Documents are
//! produced by [`SchemaGenerator`] from compiled definitions, parsed from
//! XML (`opc:TypeDictionary`) with [`SchemaDocument::parse_xml`], and
//! interpreted by the dynamic codec.
//!
//! Every document is checked by [`SchemaDocument::validate`] when it is
//! loaded, so a malformed document is rejected before any decode runs.

pub mod generator;
pub mod parser;
pub mod writer;

pub use generator::{DataTypeLocation, SchemaGenerator};

use crate::config::{BINARY_SCHEMA_NAMESPACE, OPC_UA_NAMESPACE};
use crate::core::ser::{CodecError, CodecResult};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Namespace-qualified type reference (`opc:Int32`, `tns:Point`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedTypeName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedTypeName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Type from the binary schema vocabulary.
    pub fn opc(name: impl Into<String>) -> Self {
        Self::new(BINARY_SCHEMA_NAMESPACE, name)
    }

    /// Type from the OPC UA base model (`ua:ExtensionObject`).
    pub fn ua(name: impl Into<String>) -> Self {
        Self::new(OPC_UA_NAMESPACE, name)
    }

    /// Defined by the standard rather than by a loaded document.
    pub fn is_standard(&self) -> bool {
        self.namespace == BINARY_SCHEMA_NAMESPACE || self.namespace == OPC_UA_NAMESPACE
    }
}

impl fmt::Display for QualifiedTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)
    }
}

/// Comparison applied between a switch field's value and `SwitchValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwitchOperand {
    #[default]
    Equals,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl SwitchOperand {
    pub fn evaluate(self, actual: i64, expected: i64) -> bool {
        match self {
            SwitchOperand::Equals => actual == expected,
            SwitchOperand::NotEqual => actual != expected,
            SwitchOperand::GreaterThan => actual > expected,
            SwitchOperand::GreaterThanOrEqual => actual >= expected,
            SwitchOperand::LessThan => actual < expected,
            SwitchOperand::LessThanOrEqual => actual <= expected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwitchOperand::Equals => "Equals",
            SwitchOperand::NotEqual => "NotEqual",
            SwitchOperand::GreaterThan => "GreaterThan",
            SwitchOperand::GreaterThanOrEqual => "GreaterThanOrEqual",
            SwitchOperand::LessThan => "LessThan",
            SwitchOperand::LessThanOrEqual => "LessThanOrEqual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            SwitchOperand::Equals,
            SwitchOperand::NotEqual,
            SwitchOperand::GreaterThan,
            SwitchOperand::GreaterThanOrEqual,
            SwitchOperand::LessThan,
            SwitchOperand::LessThanOrEqual,
        ]
        .into_iter()
        .find(|op| op.as_str() == s)
    }
}

/// One field of a structured type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub name: String,
    pub type_name: QualifiedTypeName,
    /// Bit width for `opc:Bit`, element count for fixed arrays.
    pub length: Option<u32>,
    pub length_field: Option<String>,
    pub is_length_in_bytes: bool,
    pub switch_field: Option<String>,
    pub switch_value: Option<u32>,
    pub switch_operand: Option<SwitchOperand>,
    /// Matrix rank (> 1); absent for scalars and length-framed arrays.
    pub value_rank: Option<i32>,
}

impl FieldType {
    pub fn new(name: impl Into<String>, type_name: QualifiedTypeName) -> Self {
        Self {
            name: name.into(),
            type_name,
            length: None,
            length_field: None,
            is_length_in_bytes: false,
            switch_field: None,
            switch_value: None,
            switch_operand: None,
            value_rank: None,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_length_field(mut self, field: impl Into<String>) -> Self {
        self.length_field = Some(field.into());
        self
    }

    pub fn with_switch(mut self, field: impl Into<String>, value: Option<u32>) -> Self {
        self.switch_field = Some(field.into());
        self.switch_value = value;
        self
    }

    pub fn with_operand(mut self, operand: SwitchOperand) -> Self {
        self.switch_operand = Some(operand);
        self
    }

    pub fn with_value_rank(mut self, rank: i32) -> Self {
        self.value_rank = Some(rank);
        self
    }

    pub fn is_bit(&self) -> bool {
        self.type_name.namespace == BINARY_SCHEMA_NAMESPACE && self.type_name.name == "Bit"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredType {
    pub name: String,
    pub base_type: Option<QualifiedTypeName>,
    pub documentation: Option<String>,
    pub fields: Vec<FieldType>,
}

impl StructuredType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_type: None,
            documentation: None,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldType) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedValue {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedType {
    pub name: String,
    pub length_in_bits: u32,
    pub values: Vec<EnumeratedValue>,
}

/// A type described only by its width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueType {
    pub name: String,
    pub length_in_bits: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Structured(StructuredType),
    Enumerated(EnumeratedType),
    Opaque(OpaqueType),
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::Structured(t) => &t.name,
            SchemaType::Enumerated(t) => &t.name,
            SchemaType::Opaque(t) => &t.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub target_namespace: String,
    pub imports: Vec<String>,
    pub types: Vec<SchemaType>,
}

impl SchemaDocument {
    pub fn new(target_namespace: impl Into<String>) -> Self {
        Self {
            target_namespace: target_namespace.into(),
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn with_import(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !self.imports.contains(&namespace) {
            self.imports.push(namespace);
        }
        self
    }

    pub fn with_type(mut self, ty: SchemaType) -> Self {
        self.types.push(ty);
        self
    }

    pub fn find(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().find(|t| t.name() == name)
    }

    pub fn structured(&self, name: &str) -> Option<&StructuredType> {
        match self.find(name) {
            Some(SchemaType::Structured(t)) => Some(t),
            _ => None,
        }
    }

    pub fn structured_types(&self) -> impl Iterator<Item = &StructuredType> {
        self.types.iter().filter_map(|t| match t {
            SchemaType::Structured(s) => Some(s),
            _ => None,
        })
    }

    /// Parse and validate an `opc:TypeDictionary` document.
    pub fn parse_xml(xml: &str) -> CodecResult<Self> {
        let doc = parser::parse(xml)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> CodecResult<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| {
            CodecError::malformed(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse_xml(&xml)
    }

    pub fn to_xml(&self) -> String {
        writer::write(self)
    }

    /// Load-time checks that do not need other documents: unique names,
    /// switch and length references to earlier fields, bit widths, local
    /// type references, declared imports.
    pub fn validate(&self) -> CodecResult<()> {
        let mut names = HashSet::new();
        for ty in &self.types {
            if ty.name().is_empty() {
                return Err(CodecError::malformed("type without a name"));
            }
            if !names.insert(ty.name()) {
                return Err(CodecError::malformed(format!(
                    "duplicate type name '{}'",
                    ty.name()
                )));
            }
        }
        for ty in &self.types {
            match ty {
                SchemaType::Structured(st) => self.validate_structured(st)?,
                SchemaType::Enumerated(et) => {
                    if !matches!(et.length_in_bits, 8 | 16 | 32) {
                        return Err(CodecError::malformed(format!(
                            "enumeration '{}' has unsupported width {}",
                            et.name, et.length_in_bits
                        )));
                    }
                }
                SchemaType::Opaque(_) => {}
            }
        }
        Ok(())
    }

    fn validate_structured(&self, st: &StructuredType) -> CodecResult<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for field in &st.fields {
            let context = |what: &str| {
                CodecError::malformed(format!("{}.{}: {}", st.name, field.name, what))
            };
            if field.name.is_empty() {
                return Err(CodecError::malformed(format!(
                    "field without a name in '{}'",
                    st.name
                )));
            }
            if seen.contains(field.name.as_str()) {
                return Err(context("duplicate field name"));
            }
            if let Some(switch) = &field.switch_field {
                if !seen.contains(switch.as_str()) {
                    return Err(context(&format!("unknown switch field '{}'", switch)));
                }
            }
            if let Some(length) = &field.length_field {
                if !seen.contains(length.as_str()) {
                    return Err(context(&format!("unknown length field '{}'", length)));
                }
            }
            if field.is_length_in_bytes {
                return Err(context("IsLengthInBytes is not supported"));
            }
            if field.is_bit() && field.length.unwrap_or(1) > 32 {
                return Err(context("bit field wider than 32 bits"));
            }
            if let Some(rank) = field.value_rank {
                if rank < 2 || field.length_field.is_some() || field.length.is_some() {
                    return Err(context(&format!("invalid ValueRank {}", rank)));
                }
            }
            let ns = &field.type_name.namespace;
            if ns == &self.target_namespace {
                if self.find(&field.type_name.name).is_none() {
                    return Err(context(&format!(
                        "unknown type '{}'",
                        field.type_name.name
                    )));
                }
            } else if !field.type_name.is_standard() && !self.imports.contains(ns) {
                return Err(context(&format!("namespace '{}' is not imported", ns)));
            }
            seen.insert(field.name.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
