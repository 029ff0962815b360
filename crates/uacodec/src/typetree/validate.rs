// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value-against-declaration checks for write and method-call arguments.
//!
//! Every check yields its own status; a mismatch on one item never prevents
//! the others in a batch from being checked.

use super::{DataTypeTree, ValueRank};
use crate::core::ser::{CodecError, CodecResult};
use crate::core::types::{StatusCode, TypeId};
use crate::dynamic::Value;

/// One declared slot plus the value offered for it.
#[derive(Debug, Clone)]
pub struct ValueCheck {
    pub data_type: TypeId,
    pub value_rank: ValueRank,
    pub value: Value,
}

/// Check `value` against a declared data type and value rank.
pub fn check_value(
    tree: &DataTypeTree,
    data_type: &TypeId,
    value_rank: ValueRank,
    value: &Value,
) -> CodecResult<()> {
    if value.is_null() {
        return Ok(());
    }
    check_rank(value_rank, value)?;
    match value {
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| check_scalar(tree, data_type, item)),
        Value::Matrix { elements, .. } => elements
            .iter()
            .try_for_each(|item| check_scalar(tree, data_type, item)),
        scalar => check_scalar(tree, data_type, scalar),
    }
}

/// Per-item results, in input order.
pub fn check_batch(tree: &DataTypeTree, items: &[ValueCheck]) -> Vec<CodecResult<()>> {
    items
        .iter()
        .map(|item| check_value(tree, &item.data_type, item.value_rank, &item.value))
        .collect()
}

/// Status codes for a batch, `Good` where the item passed.
pub fn batch_status(tree: &DataTypeTree, items: &[ValueCheck]) -> Vec<StatusCode> {
    check_batch(tree, items)
        .iter()
        .map(|r| match r {
            Ok(()) => StatusCode::GOOD,
            Err(e) => StatusCode::from(e),
        })
        .collect()
}

fn check_rank(value_rank: ValueRank, value: &Value) -> CodecResult<()> {
    let ok = match (value_rank, value) {
        (ValueRank::Any, _) => true,
        (ValueRank::Scalar, v) => !v.is_array_like(),
        (ValueRank::ScalarOrOneDimension, Value::Matrix { .. }) => false,
        (ValueRank::ScalarOrOneDimension, _) => true,
        (ValueRank::OneOrMoreDimensions, v) => v.is_array_like(),
        (ValueRank::OneDimension, Value::Array(_)) => true,
        (ValueRank::OneDimension, _) => false,
        (ValueRank::Matrix(n), Value::Matrix { dimensions, .. }) => dimensions.len() == n as usize,
        (ValueRank::Matrix(_), _) => false,
    };
    if ok {
        Ok(())
    } else {
        Err(CodecError::mismatch(
            format!("value rank {}", value_rank.as_i32()),
            value.shape_name(),
        ))
    }
}

fn check_scalar(tree: &DataTypeTree, data_type: &TypeId, value: &Value) -> CodecResult<()> {
    if value.is_null() {
        return Ok(());
    }
    let Some(candidate) = value.representation() else {
        return Err(CodecError::mismatch(data_type.to_string(), value.kind_name()));
    };
    if !tree.is_assignable(data_type, candidate) {
        return Err(CodecError::mismatch(
            format!("{} ({:?})", data_type, tree.backing_representation(data_type)),
            value.kind_name(),
        ));
    }
    let member = match value {
        Value::Enum(v) | Value::Int32(v) => Some(*v),
        _ => None,
    };
    if let (Some(v), Some(def)) = (
        member,
        tree.get_node(data_type).and_then(|n| n.enum_definition()),
    ) {
        if !def.contains(i64::from(v)) {
            return Err(CodecError::mismatch(
                format!("member of {}", data_type),
                format!("enum value {}", v),
            ));
        }
    }
    Ok(())
}
