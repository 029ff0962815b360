// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic structure codec.
//!
//! Encodes and decodes structured types described only by loaded
//! [`SchemaDocument`](crate::schema::SchemaDocument)s, with values held as
//! [`GenericStruct`]s. For a type that also has a compiled codec the bytes
//! are identical in both directions.
//!
//! ```ignore
//! let set = SchemaSet::single(SchemaDocument::parse_xml(xml)?)?;
//! let codec = set.codec("urn:vendor:types", "Sample").unwrap();
//! let value = codec.decode_from_slice(&bytes)?;
//! ```

pub mod codec;
pub(crate) mod plan;
pub mod schema_set;
pub mod value;

pub use codec::DynamicStructCodec;
pub use schema_set::SchemaSet;
pub use value::{GenericStruct, Value};
