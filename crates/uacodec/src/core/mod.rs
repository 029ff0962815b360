// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire primitives and builtin value types.

pub mod ser;
pub mod types;
