// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema-driven structure codec.
//!
//! Control fields (length prefixes, presence bits, union selectors) never
//! appear in a [`GenericStruct`]: decode consumes them, encode derives them
//! from the members that are set. Reserved padding is written as zeros and
//! skipped on read.

use super::plan::{FieldCodec, FieldRole, FieldShape, PlanField, StructPlan, Switch};
use super::schema_set::SchemaSet;
use super::value::{GenericStruct, Value};
use crate::core::ser::traits::{read_dimensions, write_dimensions};
use crate::core::ser::{BinaryDecode, BinaryDecoder, BinaryEncode, BinaryEncoder};
use crate::core::ser::{CodecError, CodecResult};
use crate::core::types::scalar::element_count;
use crate::core::types::{
    BuiltinKind, DataValue, DateTime, DiagnosticInfo, ExpandedNodeId, Guid, LocalizedText, NodeId,
    QualifiedName, StatusCode, Variant,
};
use crate::envelope::Envelope;
use crate::schema::QualifiedTypeName;
use std::sync::Arc;

/// Codec for one structured type of a [`SchemaSet`].
#[derive(Debug, Clone)]
pub struct DynamicStructCodec {
    set: Arc<SchemaSet>,
    index: usize,
}

impl DynamicStructCodec {
    pub(crate) fn new(set: Arc<SchemaSet>, index: usize) -> Self {
        Self { set, index }
    }

    pub fn type_name(&self) -> &QualifiedTypeName {
        &self.set.plans()[self.index].type_name
    }

    pub fn schema_set(&self) -> &Arc<SchemaSet> {
        &self.set
    }

    pub fn encode(&self, value: &GenericStruct, enc: &mut BinaryEncoder) -> CodecResult<()> {
        encode_struct(self.set.plans(), self.index, value, enc, 0)
    }

    pub fn decode(&self, dec: &mut BinaryDecoder<'_>) -> CodecResult<GenericStruct> {
        decode_struct(self.set.plans(), self.index, dec, 0)
    }

    pub fn encode_to_vec(&self, value: &GenericStruct) -> CodecResult<Vec<u8>> {
        let mut enc = BinaryEncoder::new();
        self.encode(value, &mut enc)?;
        Ok(enc.into_inner())
    }

    /// Decode a whole buffer; trailing bytes are an error.
    pub fn decode_from_slice(&self, bytes: &[u8]) -> CodecResult<GenericStruct> {
        let mut dec = BinaryDecoder::new(bytes);
        let value = self.decode(&mut dec)?;
        if !dec.is_exhausted() {
            return Err(CodecError::invalid(format!(
                "{} trailing bytes after {}",
                dec.remaining(),
                self.type_name().name
            )));
        }
        Ok(value)
    }
}

fn check_depth(depth: usize, limit: usize) -> CodecResult<()> {
    if depth >= limit {
        return Err(CodecError::LengthOutOfRange {
            length: i64::try_from(depth + 1).unwrap_or(i64::MAX),
            limit,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

fn decode_struct(
    plans: &[StructPlan],
    index: usize,
    dec: &mut BinaryDecoder<'_>,
    depth: usize,
) -> CodecResult<GenericStruct> {
    check_depth(depth, dec.limits().max_recursion_depth)?;
    let plan = &plans[index];
    log::trace!(
        "[dynamic] decode {} at offset {}",
        plan.type_name.name,
        dec.offset()
    );

    let mut controls: Vec<Option<i64>> = vec![None; plan.fields.len()];
    let mut out = GenericStruct::new(plan.type_name.name.clone());
    for (i, field) in plan.fields.iter().enumerate() {
        if let Some(switch) = field.switch {
            if !switch.is_active(controls[switch.field]) {
                continue;
            }
        }
        match field.role {
            FieldRole::Reserved => {
                if let FieldCodec::Bit(width) = field.codec {
                    dec.skip_bits(width)?;
                }
            }
            FieldRole::Length | FieldRole::Selector => {
                let control = read_control(&field.codec, dec)?;
                if let Some(variants) = field.union_variants {
                    check_discriminant(plan, i, control, variants)?;
                }
                controls[i] = Some(control);
            }
            FieldRole::Data => {
                let value = decode_field(plans, field, &controls, dec, depth)?;
                if field.is_switch_target {
                    controls[i] = control_number(&value);
                }
                out.insert(field.name.clone(), value);
            }
        }
    }
    Ok(out)
}

/// A non-zero union discriminant must select one of the members.
fn check_discriminant(
    plan: &StructPlan,
    control: usize,
    value: i64,
    variants: usize,
) -> CodecResult<()> {
    let selects = plan
        .switch_dependents(control)
        .any(|(_, f)| f.switch.is_some_and(|s| s.is_active(Some(value))));
    if value == 0 || selects {
        return Ok(());
    }
    Err(CodecError::UnknownUnionDiscriminant {
        type_name: plan.type_name.name.clone(),
        discriminant: u32::try_from(value).unwrap_or(u32::MAX),
        variants,
    })
}

fn decode_field(
    plans: &[StructPlan],
    field: &PlanField,
    controls: &[Option<i64>],
    dec: &mut BinaryDecoder<'_>,
    depth: usize,
) -> CodecResult<Value> {
    let limit = dec.limits().max_array_length;
    match field.shape {
        FieldShape::Scalar => decode_scalar(plans, &field.codec, dec, depth),
        FieldShape::LengthField(control) => match controls[control] {
            None | Some(-1) => Ok(Value::Null),
            Some(n) => {
                let count = usize::try_from(n)
                    .ok()
                    .filter(|count| *count <= limit)
                    .ok_or(CodecError::LengthOutOfRange { length: n, limit })?;
                decode_elements(plans, &field.codec, count, dec, depth).map(Value::Array)
            }
        },
        FieldShape::Fixed(count) => {
            if count > limit {
                return Err(CodecError::LengthOutOfRange {
                    length: i64::try_from(count).unwrap_or(i64::MAX),
                    limit,
                });
            }
            decode_elements(plans, &field.codec, count, dec, depth).map(Value::Array)
        }
        FieldShape::Matrix(rank) => {
            let Some((dimensions, count)) = read_dimensions(dec)? else {
                return Ok(Value::Null);
            };
            if dimensions.len() != rank as usize {
                return Err(CodecError::invalid(format!(
                    "{}: expected {} dimensions, found {}",
                    field.name,
                    rank,
                    dimensions.len()
                )));
            }
            let elements = decode_elements(plans, &field.codec, count, dec, depth)?;
            Ok(Value::Matrix {
                dimensions,
                elements,
            })
        }
    }
}

fn decode_elements(
    plans: &[StructPlan],
    codec: &FieldCodec,
    count: usize,
    dec: &mut BinaryDecoder<'_>,
    depth: usize,
) -> CodecResult<Vec<Value>> {
    let mut items = Vec::with_capacity(count.min(dec.remaining()));
    for _ in 0..count {
        items.push(decode_scalar(plans, codec, dec, depth)?);
    }
    Ok(items)
}

fn decode_scalar(
    plans: &[StructPlan],
    codec: &FieldCodec,
    dec: &mut BinaryDecoder<'_>,
    depth: usize,
) -> CodecResult<Value> {
    let value = match codec {
        FieldCodec::Bit(width) => Value::Bits(dec.read_bits(*width)?),
        FieldCodec::Builtin(kind) => decode_builtin(*kind, dec)?,
        FieldCodec::Char => Value::Char(char::from(dec.read_u8()?)),
        FieldCodec::WideChar => {
            let unit = dec.read_u16()?;
            Value::Char(char::from_u32(u32::from(unit)).ok_or_else(|| {
                CodecError::invalid(format!("WideChar 0x{:04x} is a lone surrogate", unit))
            })?)
        }
        FieldCodec::WideString => read_wide_string(dec)?,
        FieldCodec::Enumerated { width } => Value::Enum(read_enum(*width, dec)?),
        FieldCodec::Structured(index) => {
            Value::Struct(decode_struct(plans, *index, dec, depth + 1)?)
        }
        FieldCodec::Opaque(len) => Value::Opaque(dec.read_bytes(*len)?.to_vec()),
    };
    Ok(value)
}

fn decode_builtin(kind: BuiltinKind, dec: &mut BinaryDecoder<'_>) -> CodecResult<Value> {
    let value = match kind {
        BuiltinKind::Boolean => Value::Boolean(dec.read_bool()?),
        BuiltinKind::SByte => Value::SByte(dec.read_i8()?),
        BuiltinKind::Byte => Value::Byte(dec.read_u8()?),
        BuiltinKind::Int16 => Value::Int16(dec.read_i16()?),
        BuiltinKind::UInt16 => Value::UInt16(dec.read_u16()?),
        BuiltinKind::Int32 => Value::Int32(dec.read_i32()?),
        BuiltinKind::UInt32 => Value::UInt32(dec.read_u32()?),
        BuiltinKind::Int64 => Value::Int64(dec.read_i64()?),
        BuiltinKind::UInt64 => Value::UInt64(dec.read_u64()?),
        BuiltinKind::Float => Value::Float(dec.read_f32()?),
        BuiltinKind::Double => Value::Double(dec.read_f64()?),
        BuiltinKind::String => dec.read_string()?.map_or(Value::Null, Value::String),
        BuiltinKind::ByteString => dec.read_byte_string()?.map_or(Value::Null, Value::ByteString),
        BuiltinKind::XmlElement => dec.read_string()?.map_or(Value::Null, Value::XmlElement),
        BuiltinKind::DateTime => Value::DateTime(DateTime::decode(dec)?),
        BuiltinKind::Guid => Value::Guid(Guid::decode(dec)?),
        BuiltinKind::NodeId => Value::NodeId(NodeId::decode(dec)?),
        BuiltinKind::StatusCode => Value::StatusCode(StatusCode::decode(dec)?),
        BuiltinKind::ExtensionObject => {
            let envelope = Envelope::decode(dec)?;
            if envelope.is_null() {
                Value::Null
            } else {
                Value::Envelope(Box::new(envelope))
            }
        }
        BuiltinKind::ExpandedNodeId => Value::ExpandedNodeId(ExpandedNodeId::decode(dec)?),
        BuiltinKind::QualifiedName => Value::QualifiedName(QualifiedName::decode(dec)?),
        BuiltinKind::LocalizedText => Value::LocalizedText(LocalizedText::decode(dec)?),
        BuiltinKind::DataValue => Value::DataValue(Box::new(DataValue::decode(dec)?)),
        BuiltinKind::Variant => {
            let variant = Variant::decode(dec)?;
            if variant.is_empty() {
                Value::Null
            } else {
                Value::Variant(Box::new(variant))
            }
        }
        BuiltinKind::DiagnosticInfo => {
            let info = DiagnosticInfo::decode(dec)?;
            if info.is_empty() {
                Value::Null
            } else {
                Value::DiagnosticInfo(Box::new(info))
            }
        }
    };
    Ok(value)
}

fn read_control(codec: &FieldCodec, dec: &mut BinaryDecoder<'_>) -> CodecResult<i64> {
    let value = match codec {
        FieldCodec::Bit(width) => i64::from(dec.read_bits(*width)?),
        FieldCodec::Enumerated { width } => i64::from(read_enum(*width, dec)?),
        FieldCodec::Builtin(BuiltinKind::Boolean) => i64::from(dec.read_bool()?),
        FieldCodec::Builtin(BuiltinKind::SByte) => i64::from(dec.read_i8()?),
        FieldCodec::Builtin(BuiltinKind::Byte) => i64::from(dec.read_u8()?),
        FieldCodec::Builtin(BuiltinKind::Int16) => i64::from(dec.read_i16()?),
        FieldCodec::Builtin(BuiltinKind::UInt16) => i64::from(dec.read_u16()?),
        FieldCodec::Builtin(BuiltinKind::Int32) => i64::from(dec.read_i32()?),
        FieldCodec::Builtin(BuiltinKind::UInt32) => i64::from(dec.read_u32()?),
        FieldCodec::Builtin(BuiltinKind::Int64) => dec.read_i64()?,
        FieldCodec::Builtin(BuiltinKind::UInt64) => {
            let raw = dec.read_u64()?;
            i64::try_from(raw)
                .map_err(|_| CodecError::invalid(format!("control value {} out of range", raw)))?
        }
        other => {
            return Err(CodecError::invalid(format!(
                "{:?} cannot hold a control value",
                other
            )))
        }
    };
    Ok(value)
}

fn read_enum(width: u32, dec: &mut BinaryDecoder<'_>) -> CodecResult<i32> {
    match width {
        8 => Ok(i32::from(dec.read_u8()?)),
        16 => Ok(i32::from(dec.read_u16()?)),
        _ => dec.read_i32(),
    }
}

/// Int32 byte count (-1 null), then UTF-16LE code units.
fn read_wide_string(dec: &mut BinaryDecoder<'_>) -> CodecResult<Value> {
    let offset = dec.offset();
    let limit = dec.limits().max_string_length;
    let Some(len) = dec.read_length(limit)? else {
        return Ok(Value::Null);
    };
    if len % 2 != 0 {
        return Err(CodecError::invalid(format!(
            "WideString at offset {} has odd byte count {}",
            offset, len
        )));
    }
    let units: Vec<u16> = dec
        .read_bytes(len)?
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map(Value::String)
        .map_err(|e| CodecError::invalid(format!("WideString at offset {}: {}", offset, e)))
}

fn write_wide_string(value: Option<&str>, enc: &mut BinaryEncoder) -> CodecResult<()> {
    let limit = enc.limits().max_string_length;
    let Some(text) = value else {
        return enc.write_length(None, limit);
    };
    let units: Vec<u16> = text.encode_utf16().collect();
    enc.write_length(Some(units.len() * 2), limit)?;
    for unit in units {
        enc.write_u16(unit);
    }
    Ok(())
}

/// Integer view of a value used to evaluate switches.
fn control_number(value: &Value) -> Option<i64> {
    match value {
        Value::Boolean(v) => Some(i64::from(*v)),
        Value::SByte(v) => Some(i64::from(*v)),
        Value::Byte(v) => Some(i64::from(*v)),
        Value::Int16(v) => Some(i64::from(*v)),
        Value::UInt16(v) => Some(i64::from(*v)),
        Value::Int32(v) | Value::Enum(v) => Some(i64::from(*v)),
        Value::UInt32(v) | Value::Bits(v) => Some(i64::from(*v)),
        Value::Int64(v) => Some(*v),
        Value::UInt64(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

fn encode_struct(
    plans: &[StructPlan],
    index: usize,
    value: &GenericStruct,
    enc: &mut BinaryEncoder,
    depth: usize,
) -> CodecResult<()> {
    check_depth(depth, enc.limits().max_recursion_depth)?;
    let plan = &plans[index];
    log::trace!("[dynamic] encode {}", plan.type_name.name);

    for (name, _) in value.iter() {
        let known = plan
            .field_index(name)
            .is_some_and(|i| plan.fields[i].role == FieldRole::Data);
        if !known {
            return Err(CodecError::invalid(format!(
                "{} has no member '{}'",
                plan.type_name.name, name
            )));
        }
    }

    let mut controls = derive_controls(plan, value)?;
    for (i, field) in plan.fields.iter().enumerate() {
        if let Some(switch) = field.switch {
            if !switch.is_active(controls[switch.field]) {
                if field.role == FieldRole::Data && value.is_specified(&field.name) {
                    return Err(CodecError::invalid(format!(
                        "{}.{} is set but its switch is off",
                        plan.type_name.name, field.name
                    )));
                }
                controls[i] = None;
                continue;
            }
        }
        match field.role {
            FieldRole::Reserved => {
                if let FieldCodec::Bit(width) = field.codec {
                    enc.write_reserved_bits(width);
                }
            }
            FieldRole::Length | FieldRole::Selector => {
                let control = controls[i].ok_or_else(|| {
                    CodecError::invalid(format!("no value for control {}", field.name))
                })?;
                write_control(&field.codec, control, enc)?;
            }
            FieldRole::Data => {
                if field.switch.is_some() && !value.is_specified(&field.name) {
                    return Err(CodecError::invalid(format!(
                        "{}.{} is selected by its switch but not set",
                        plan.type_name.name, field.name
                    )));
                }
                let member = value.get(&field.name).unwrap_or(&Value::Null);
                encode_field(plans, field, member, enc, depth)?;
                if field.is_switch_target {
                    controls[i] = control_number(member);
                }
            }
        }
    }
    Ok(())
}

/// Values of the length and selector fields implied by `value`.
fn derive_controls(plan: &StructPlan, value: &GenericStruct) -> CodecResult<Vec<Option<i64>>> {
    let mut controls = vec![None; plan.fields.len()];
    for (i, field) in plan.fields.iter().enumerate() {
        match field.role {
            FieldRole::Length => controls[i] = Some(derive_length(plan, i, value)?),
            FieldRole::Selector => controls[i] = Some(derive_selector(plan, i, field, value)?),
            FieldRole::Data | FieldRole::Reserved => {}
        }
    }
    Ok(controls)
}

fn derive_length(plan: &StructPlan, control: usize, value: &GenericStruct) -> CodecResult<i64> {
    let mut length: Option<i64> = None;
    for dependent in plan.length_dependents(control) {
        let n = match value.get(&dependent.name) {
            Some(Value::Array(items)) => i64::try_from(items.len()).unwrap_or(i64::MAX),
            Some(Value::Null) | None => -1,
            Some(other) => return Err(CodecError::mismatch("array", other.kind_name())),
        };
        match length {
            Some(previous) if previous != n => {
                return Err(CodecError::invalid(format!(
                    "arrays sharing {}.{} differ in length",
                    plan.type_name.name, plan.fields[control].name
                )))
            }
            _ => length = Some(n),
        }
    }
    Ok(length.unwrap_or(-1))
}

/// Smallest-surprise value of a presence bit or union selector: one that
/// switches on exactly the dependents that are set.
fn derive_selector(
    plan: &StructPlan,
    control: usize,
    field: &PlanField,
    value: &GenericStruct,
) -> CodecResult<i64> {
    let (min, max) = field.codec.control_range().unwrap_or((0, 0));
    let constraints: Vec<(Switch, bool)> = plan
        .switch_dependents(control)
        .filter_map(|(j, dependent)| Some((dependent.switch?, wants(plan, j, value)?)))
        .collect();

    let mut candidates: Vec<i64> = constraints
        .iter()
        .filter(|(_, wanted)| *wanted)
        .map(|(switch, _)| switch.value)
        .collect();
    candidates.push(0);
    for (switch, _) in &constraints {
        candidates.extend([
            switch.value,
            switch.value.saturating_add(1),
            switch.value.saturating_sub(1),
        ]);
    }
    candidates.extend([1, max, min]);

    candidates
        .into_iter()
        .filter(|c| (min..=max).contains(c))
        .find(|c| {
            constraints
                .iter()
                .all(|(switch, wanted)| switch.operand.evaluate(*c, switch.value) == *wanted)
        })
        .ok_or_else(|| {
            CodecError::invalid(format!(
                "{}: no value of {} selects exactly the members that are set",
                plan.type_name.name, field.name
            ))
        })
}

/// Whether field `index` should be on the wire; `None` when it has no say.
fn wants(plan: &StructPlan, index: usize, value: &GenericStruct) -> Option<bool> {
    let field = &plan.fields[index];
    match field.role {
        FieldRole::Data => Some(value.is_specified(&field.name)),
        FieldRole::Length => Some(
            plan.length_dependents(index)
                .any(|d| value.is_specified(&d.name)),
        ),
        FieldRole::Reserved | FieldRole::Selector => None,
    }
}

fn write_control(codec: &FieldCodec, control: i64, enc: &mut BinaryEncoder) -> CodecResult<()> {
    let out_of_range = || CodecError::invalid(format!("control value {} out of range", control));
    match codec {
        FieldCodec::Bit(width) => {
            let bits = u32::try_from(control).map_err(|_| out_of_range())?;
            enc.write_bits(bits, *width)?;
        }
        FieldCodec::Enumerated { width } => {
            let raw = i32::try_from(control).map_err(|_| out_of_range())?;
            write_enum(*width, raw, enc)?;
        }
        FieldCodec::Builtin(BuiltinKind::Boolean) => enc.write_bool(control != 0),
        FieldCodec::Builtin(BuiltinKind::SByte) => {
            enc.write_i8(i8::try_from(control).map_err(|_| out_of_range())?)
        }
        FieldCodec::Builtin(BuiltinKind::Byte) => {
            enc.write_u8(u8::try_from(control).map_err(|_| out_of_range())?)
        }
        FieldCodec::Builtin(BuiltinKind::Int16) => {
            enc.write_i16(i16::try_from(control).map_err(|_| out_of_range())?)
        }
        FieldCodec::Builtin(BuiltinKind::UInt16) => {
            enc.write_u16(u16::try_from(control).map_err(|_| out_of_range())?)
        }
        FieldCodec::Builtin(BuiltinKind::Int32) => {
            enc.write_i32(i32::try_from(control).map_err(|_| out_of_range())?)
        }
        FieldCodec::Builtin(BuiltinKind::UInt32) => {
            enc.write_u32(u32::try_from(control).map_err(|_| out_of_range())?)
        }
        FieldCodec::Builtin(BuiltinKind::Int64) => enc.write_i64(control),
        FieldCodec::Builtin(BuiltinKind::UInt64) => {
            enc.write_u64(u64::try_from(control).map_err(|_| out_of_range())?)
        }
        other => {
            return Err(CodecError::invalid(format!(
                "{:?} cannot hold a control value",
                other
            )))
        }
    }
    Ok(())
}

fn write_enum(width: u32, raw: i32, enc: &mut BinaryEncoder) -> CodecResult<()> {
    let out_of_range = || {
        CodecError::invalid(format!(
            "enumeration value {} does not fit in {} bits",
            raw, width
        ))
    };
    match width {
        8 => enc.write_u8(u8::try_from(raw).map_err(|_| out_of_range())?),
        16 => enc.write_u16(u16::try_from(raw).map_err(|_| out_of_range())?),
        _ => enc.write_i32(raw),
    }
    Ok(())
}

fn encode_field(
    plans: &[StructPlan],
    field: &PlanField,
    member: &Value,
    enc: &mut BinaryEncoder,
    depth: usize,
) -> CodecResult<()> {
    let limit = enc.limits().max_array_length;
    let too_long = |len: usize| CodecError::LengthOutOfRange {
        length: i64::try_from(len).unwrap_or(i64::MAX),
        limit,
    };
    match (field.shape, member) {
        (FieldShape::Scalar, member) => encode_scalar(plans, &field.codec, member, enc, depth),
        // The count was written by the length field.
        (FieldShape::LengthField(_), Value::Null) => Ok(()),
        (FieldShape::LengthField(_), Value::Array(items)) => {
            if items.len() > limit {
                return Err(too_long(items.len()));
            }
            encode_elements(plans, &field.codec, items, enc, depth)
        }
        (FieldShape::Fixed(count), Value::Array(items)) => {
            if items.len() != count {
                return Err(CodecError::invalid(format!(
                    "{} holds exactly {} elements, got {}",
                    field.name,
                    count,
                    items.len()
                )));
            }
            encode_elements(plans, &field.codec, items, enc, depth)
        }
        (FieldShape::Matrix(_), Value::Null) => enc.write_array_length(None),
        (
            FieldShape::Matrix(rank),
            Value::Matrix {
                dimensions,
                elements,
            },
        ) => {
            if dimensions.len() != rank as usize {
                return Err(CodecError::mismatch(
                    format!("matrix of rank {}", rank),
                    member.shape_name(),
                ));
            }
            let count = element_count(dimensions)?;
            if count != elements.len() {
                return Err(CodecError::invalid(format!(
                    "{}: dimensions describe {} elements, got {}",
                    field.name,
                    count,
                    elements.len()
                )));
            }
            if count > limit {
                return Err(too_long(count));
            }
            write_dimensions(enc, dimensions)?;
            encode_elements(plans, &field.codec, elements, enc, depth)
        }
        (FieldShape::Matrix(rank), other) => Err(CodecError::mismatch(
            format!("matrix of rank {}", rank),
            other.shape_name(),
        )),
        (_, other) => Err(CodecError::mismatch("array", other.kind_name())),
    }
}

fn encode_elements(
    plans: &[StructPlan],
    codec: &FieldCodec,
    items: &[Value],
    enc: &mut BinaryEncoder,
    depth: usize,
) -> CodecResult<()> {
    for item in items {
        encode_scalar(plans, codec, item, enc, depth)?;
    }
    Ok(())
}

fn encode_scalar(
    plans: &[StructPlan],
    codec: &FieldCodec,
    value: &Value,
    enc: &mut BinaryEncoder,
    depth: usize,
) -> CodecResult<()> {
    match (codec, value) {
        (FieldCodec::Bit(width), Value::Bits(bits)) => {
            if *width < 32 && bits >> width != 0 {
                return Err(CodecError::invalid(format!(
                    "{:#x} does not fit in {} bits",
                    bits, width
                )));
            }
            enc.write_bits(*bits, *width)
        }
        (FieldCodec::Bit(1), Value::Boolean(bit)) => {
            enc.write_bit(*bit);
            Ok(())
        }
        (FieldCodec::Builtin(kind), value) => encode_builtin(*kind, value, enc),
        (FieldCodec::Char, Value::Char(c)) => {
            let byte = u8::try_from(u32::from(*c))
                .map_err(|_| CodecError::invalid(format!("'{}' is not a one-byte Char", c)))?;
            enc.write_u8(byte);
            Ok(())
        }
        (FieldCodec::WideChar, Value::Char(c)) => {
            let unit = u16::try_from(u32::from(*c))
                .map_err(|_| CodecError::invalid(format!("'{}' needs two UTF-16 units", c)))?;
            enc.write_u16(unit);
            Ok(())
        }
        (FieldCodec::WideString, Value::String(s)) => write_wide_string(Some(s.as_str()), enc),
        (FieldCodec::WideString, Value::Null) => write_wide_string(None, enc),
        (FieldCodec::Enumerated { width }, Value::Enum(raw) | Value::Int32(raw)) => {
            write_enum(*width, *raw, enc)
        }
        (FieldCodec::Structured(index), Value::Struct(inner)) => {
            encode_struct(plans, *index, inner, enc, depth + 1)
        }
        (FieldCodec::Opaque(len), Value::Opaque(bytes) | Value::ByteString(bytes)) => {
            if bytes.len() != *len {
                return Err(CodecError::invalid(format!(
                    "opaque value holds {} bytes, expected {}",
                    bytes.len(),
                    len
                )));
            }
            enc.write_bytes(bytes);
            Ok(())
        }
        (codec, value) => Err(CodecError::mismatch(
            codec_name(plans, codec),
            value.kind_name(),
        )),
    }
}

fn encode_builtin(kind: BuiltinKind, value: &Value, enc: &mut BinaryEncoder) -> CodecResult<()> {
    match (kind, value) {
        (BuiltinKind::Boolean, Value::Boolean(v)) => enc.write_bool(*v),
        (BuiltinKind::SByte, Value::SByte(v)) => enc.write_i8(*v),
        (BuiltinKind::Byte, Value::Byte(v)) => enc.write_u8(*v),
        (BuiltinKind::Int16, Value::Int16(v)) => enc.write_i16(*v),
        (BuiltinKind::UInt16, Value::UInt16(v)) => enc.write_u16(*v),
        (BuiltinKind::Int32, Value::Int32(v)) => enc.write_i32(*v),
        (BuiltinKind::UInt32, Value::UInt32(v)) => enc.write_u32(*v),
        (BuiltinKind::Int64, Value::Int64(v)) => enc.write_i64(*v),
        (BuiltinKind::UInt64, Value::UInt64(v)) => enc.write_u64(*v),
        (BuiltinKind::Float, Value::Float(v)) => enc.write_f32(*v),
        (BuiltinKind::Double, Value::Double(v)) => enc.write_f64(*v),
        (BuiltinKind::String, Value::String(s)) => enc.write_string(Some(s.as_str()))?,
        (BuiltinKind::XmlElement, Value::XmlElement(s) | Value::String(s)) => {
            enc.write_string(Some(s.as_str()))?
        }
        (BuiltinKind::ByteString, Value::ByteString(b)) => enc.write_byte_string(Some(b.as_slice()))?,
        (
            BuiltinKind::String | BuiltinKind::ByteString | BuiltinKind::XmlElement,
            Value::Null,
        ) => enc.write_byte_string(None)?,
        (BuiltinKind::DateTime, Value::DateTime(v)) => v.encode(enc)?,
        (BuiltinKind::Guid, Value::Guid(v)) => v.encode(enc)?,
        (BuiltinKind::NodeId, Value::NodeId(v)) => v.encode(enc)?,
        (BuiltinKind::StatusCode, Value::StatusCode(v)) => v.encode(enc)?,
        (BuiltinKind::ExtensionObject, Value::Envelope(v)) => v.encode(enc)?,
        (BuiltinKind::ExtensionObject, Value::Null) => Envelope::null().encode(enc)?,
        (BuiltinKind::ExpandedNodeId, Value::ExpandedNodeId(v)) => v.encode(enc)?,
        (BuiltinKind::QualifiedName, Value::QualifiedName(v)) => v.encode(enc)?,
        (BuiltinKind::LocalizedText, Value::LocalizedText(v)) => v.encode(enc)?,
        (BuiltinKind::DataValue, Value::DataValue(v)) => v.encode(enc)?,
        (BuiltinKind::DataValue, Value::Null) => DataValue::default().encode(enc)?,
        (BuiltinKind::Variant, Value::Variant(v)) => v.encode(enc)?,
        (BuiltinKind::Variant, Value::Null) => Variant::Empty.encode(enc)?,
        (BuiltinKind::DiagnosticInfo, Value::DiagnosticInfo(v)) => v.encode(enc)?,
        (BuiltinKind::DiagnosticInfo, Value::Null) => DiagnosticInfo::default().encode(enc)?,
        (kind, value) => return Err(CodecError::mismatch(kind.name(), value.kind_name())),
    }
    Ok(())
}

fn codec_name(plans: &[StructPlan], codec: &FieldCodec) -> String {
    match codec {
        FieldCodec::Bit(width) => format!("Bit({})", width),
        FieldCodec::Builtin(kind) => kind.name().to_string(),
        FieldCodec::Char => "Char".to_string(),
        FieldCodec::WideChar => "WideChar".to_string(),
        FieldCodec::WideString => "WideString".to_string(),
        FieldCodec::Enumerated { .. } => "Enum".to_string(),
        FieldCodec::Structured(index) => plans[*index].type_name.name.clone(),
        FieldCodec::Opaque(len) => format!("Opaque({} bytes)", len),
    }
}
