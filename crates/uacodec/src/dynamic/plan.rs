// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolved field layouts for the dynamic codec.
//!
//! A [`StructPlan`] is built once per structured type when a schema set is
//! loaded. Every type reference is resolved to a [`FieldCodec`] up front, so
//! the encode and decode loops never look at the schema again.

use crate::config::{BINARY_SCHEMA_NAMESPACE, OPC_UA_NAMESPACE};
use crate::core::ser::{CodecError, CodecResult};
use crate::core::types::BuiltinKind;
use crate::schema::{
    FieldType, QualifiedTypeName, SchemaDocument, SchemaType, StructuredType, SwitchOperand,
};
use std::collections::HashMap;

/// How a field takes part in the surfaced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldRole {
    /// Surfaced as a member of the decoded structure.
    Data,
    /// Padding bits; written as zeros and skipped on decode.
    Reserved,
    /// Element count of later array fields; derived from their lengths.
    Length,
    /// Presence bit or union selector; derived from which members are set.
    Selector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldCodec {
    /// `opc:Bit` with its width.
    Bit(u32),
    Builtin(BuiltinKind),
    /// One Latin-1 byte.
    Char,
    /// One UTF-16 code unit.
    WideChar,
    /// Int32 byte count, then UTF-16LE code units.
    WideString,
    Enumerated { width: u32 },
    /// Index of another plan in the same set.
    Structured(usize),
    /// Fixed-size payload, in bytes.
    Opaque(usize),
}

impl FieldCodec {
    /// Inclusive range of integers the field can carry as a control value.
    pub(crate) fn control_range(&self) -> Option<(i64, i64)> {
        let range = match self {
            FieldCodec::Bit(width) => (0, (1i64 << width) - 1),
            FieldCodec::Builtin(kind) => match kind {
                BuiltinKind::Boolean => (0, 1),
                BuiltinKind::SByte => (i64::from(i8::MIN), i64::from(i8::MAX)),
                BuiltinKind::Byte => (0, i64::from(u8::MAX)),
                BuiltinKind::Int16 => (i64::from(i16::MIN), i64::from(i16::MAX)),
                BuiltinKind::UInt16 => (0, i64::from(u16::MAX)),
                BuiltinKind::Int32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
                BuiltinKind::UInt32 => (0, i64::from(u32::MAX)),
                BuiltinKind::Int64 => (i64::MIN, i64::MAX),
                BuiltinKind::UInt64 => (0, i64::MAX),
                _ => return None,
            },
            FieldCodec::Enumerated { width: 32 } => (i64::from(i32::MIN), i64::from(i32::MAX)),
            FieldCodec::Enumerated { width } => (0, (1i64 << width) - 1),
            FieldCodec::Structured(_)
            | FieldCodec::Opaque(_)
            | FieldCodec::Char
            | FieldCodec::WideChar
            | FieldCodec::WideString => return None,
        };
        Some(range)
    }

    fn is_integer(&self) -> bool {
        match self {
            FieldCodec::Bit(_) => true,
            FieldCodec::Builtin(_) => self.control_range().is_some(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldShape {
    Scalar,
    /// Count held by the field at this index.
    LengthField(usize),
    /// Count fixed by the `Length` attribute.
    Fixed(usize),
    Matrix(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Switch {
    pub field: usize,
    pub value: i64,
    pub operand: SwitchOperand,
}

impl Switch {
    pub(crate) fn is_active(&self, control: Option<i64>) -> bool {
        control.is_some_and(|c| self.operand.evaluate(c, self.value))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PlanField {
    pub name: String,
    pub role: FieldRole,
    pub codec: FieldCodec,
    pub shape: FieldShape,
    pub switch: Option<Switch>,
    /// Another field switches on this one's value.
    pub is_switch_target: bool,
    /// Distinct member switch values when this selector frames a union.
    pub union_variants: Option<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct StructPlan {
    pub type_name: QualifiedTypeName,
    pub fields: Vec<PlanField>,
}

impl StructPlan {
    pub(crate) fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Fields whose count is held by field `control`.
    pub(crate) fn length_dependents(&self, control: usize) -> impl Iterator<Item = &PlanField> {
        self.fields
            .iter()
            .filter(move |f| f.shape == FieldShape::LengthField(control))
    }

    /// Fields switched by field `control`, with their indexes.
    pub(crate) fn switch_dependents(
        &self,
        control: usize,
    ) -> impl Iterator<Item = (usize, &PlanField)> {
        self.fields
            .iter()
            .enumerate()
            .filter(move |(_, f)| f.switch.is_some_and(|s| s.field == control))
    }
}

/// Builds plans for every structured type of a document set.
pub(crate) struct PlanBuilder<'a> {
    documents: &'a [SchemaDocument],
    indexes: HashMap<QualifiedTypeName, usize>,
}

impl<'a> PlanBuilder<'a> {
    pub(crate) fn new(documents: &'a [SchemaDocument]) -> Self {
        let mut indexes = HashMap::new();
        for doc in documents {
            for st in doc.structured_types() {
                let next = indexes.len();
                indexes.insert(QualifiedTypeName::new(&doc.target_namespace, &st.name), next);
            }
        }
        Self { documents, indexes }
    }

    pub(crate) fn into_indexes(self) -> HashMap<QualifiedTypeName, usize> {
        self.indexes
    }

    /// Plans in index order.
    pub(crate) fn build(&self) -> CodecResult<Vec<StructPlan>> {
        let mut plans = Vec::with_capacity(self.indexes.len());
        for doc in self.documents {
            for st in doc.structured_types() {
                plans.push(self.plan(&doc.target_namespace, st)?);
            }
        }
        Ok(plans)
    }

    fn plan(&self, namespace: &str, st: &StructuredType) -> CodecResult<StructPlan> {
        let malformed = |field: &FieldType, what: &str| {
            CodecError::malformed(format!("{}.{}: {}", st.name, field.name, what))
        };

        let mut fields: Vec<PlanField> = Vec::with_capacity(st.fields.len());
        for field in &st.fields {
            let codec = self.field_codec(st, field)?;
            let shape = if field.is_bit() {
                if field.length_field.is_some() || field.value_rank.is_some() {
                    return Err(malformed(field, "bit fields cannot be arrays"));
                }
                FieldShape::Scalar
            } else if let Some(rank) = field.value_rank {
                FieldShape::Matrix(rank as u32)
            } else if let Some(length_field) = &field.length_field {
                FieldShape::LengthField(position(&fields, st, length_field)?)
            } else if let Some(length) = field.length {
                FieldShape::Fixed(length as usize)
            } else {
                FieldShape::Scalar
            };

            let switch = match &field.switch_field {
                Some(switch_field) => Some(Switch {
                    field: position(&fields, st, switch_field)?,
                    value: i64::from(field.switch_value.unwrap_or(1)),
                    operand: field.switch_operand.unwrap_or_default(),
                }),
                None => None,
            };

            let role = if field.is_bit() && field.name.starts_with("Reserved") {
                FieldRole::Reserved
            } else {
                FieldRole::Data
            };

            if let FieldShape::LengthField(control) = shape {
                let target = &mut fields[control];
                if !target.codec.is_integer() || target.shape != FieldShape::Scalar {
                    return Err(malformed(field, "length field is not a scalar integer"));
                }
                target.role = FieldRole::Length;
            }
            if let Some(switch) = switch {
                let target = &mut fields[switch.field];
                if target.codec.control_range().is_none() || target.shape != FieldShape::Scalar {
                    return Err(malformed(field, "switch field is not a scalar integer"));
                }
                target.is_switch_target = true;
                if target.role == FieldRole::Data && target.codec.is_integer() {
                    target.role = FieldRole::Selector;
                }
            }

            fields.push(PlanField {
                name: field.name.clone(),
                role,
                codec,
                shape,
                switch,
                is_switch_target: false,
                union_variants: None,
            });
        }

        for i in 0..fields.len() {
            fields[i].union_variants = union_variants(&fields, i);
        }

        Ok(StructPlan {
            type_name: QualifiedTypeName::new(namespace, &st.name),
            fields,
        })
    }

    fn field_codec(&self, st: &StructuredType, field: &FieldType) -> CodecResult<FieldCodec> {
        let unresolvable = || CodecError::UnresolvableFieldType {
            type_name: field.type_name.to_string(),
            field: format!("{}.{}", st.name, field.name),
        };
        let qname = &field.type_name;
        if field.is_bit() {
            let width = field.length.unwrap_or(1);
            if width == 0 || width > 32 {
                return Err(CodecError::malformed(format!(
                    "{}.{}: bit width {} outside 1..=32",
                    st.name, field.name, width
                )));
            }
            return Ok(FieldCodec::Bit(width));
        }
        if qname.namespace == BINARY_SCHEMA_NAMESPACE || qname.namespace == OPC_UA_NAMESPACE {
            if let Some(codec) = builtin_codec(&qname.name) {
                return Ok(codec);
            }
            if qname.namespace == BINARY_SCHEMA_NAMESPACE {
                return Err(unresolvable());
            }
        }
        let doc = self
            .documents
            .iter()
            .find(|d| d.target_namespace == qname.namespace)
            .ok_or_else(unresolvable)?;
        match doc.find(&qname.name).ok_or_else(unresolvable)? {
            SchemaType::Structured(_) => self
                .indexes
                .get(qname)
                .map(|index| FieldCodec::Structured(*index))
                .ok_or_else(unresolvable),
            SchemaType::Enumerated(et) => Ok(FieldCodec::Enumerated {
                width: et.length_in_bits,
            }),
            SchemaType::Opaque(ot) => match ot.length_in_bits {
                Some(bits) if bits > 0 && bits % 8 == 0 => Ok(FieldCodec::Opaque(bits as usize / 8)),
                _ => Err(unresolvable()),
            },
        }
    }
}

/// Schema vocabulary the dynamic codec reads natively; `CharArray` is a
/// String and `WideCharArray` a WideString.
fn builtin_codec(name: &str) -> Option<FieldCodec> {
    let codec = match name {
        "CharArray" => FieldCodec::Builtin(BuiltinKind::String),
        "Char" => FieldCodec::Char,
        "WideChar" => FieldCodec::WideChar,
        "WideString" | "WideCharArray" => FieldCodec::WideString,
        name => FieldCodec::Builtin(BuiltinKind::from_name(name)?),
    };
    Some(codec)
}

/// A non-bit selector whose dependents all switch on equality is a union
/// discriminant; returns its number of distinct switch values.
fn union_variants(fields: &[PlanField], control: usize) -> Option<usize> {
    let field = &fields[control];
    if field.role != FieldRole::Selector || field.codec == FieldCodec::Bit(1) {
        return None;
    }
    let mut values = Vec::new();
    for switch in fields.iter().filter_map(|f| f.switch).filter(|s| s.field == control) {
        if switch.operand != SwitchOperand::Equals {
            return None;
        }
        if !values.contains(&switch.value) {
            values.push(switch.value);
        }
    }
    Some(values.len())
}

/// Index of an earlier field of `st`.
fn position(fields: &[PlanField], st: &StructuredType, name: &str) -> CodecResult<usize> {
    fields.iter().position(|f| f.name == name).ok_or_else(|| {
        CodecError::malformed(format!("{}: '{}' is not an earlier field", st.name, name))
    })
}
