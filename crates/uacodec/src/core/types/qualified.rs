// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Names and texts: `QualifiedName`, `LocalizedText`, `ExpandedNodeId`.

use super::node_id::NodeId;
use crate::core::ser::{BinaryDecode, BinaryDecoder, BinaryEncode, BinaryEncoder};
use crate::core::ser::{CodecError, CodecResult};
use std::fmt;

/// A browse name: namespace index plus a nullable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QualifiedName {
    pub namespace: u16,
    pub name: Option<String>,
}

impl QualifiedName {
    pub fn new(namespace: u16, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name.as_deref().unwrap_or(""))
    }
}

impl BinaryEncode for QualifiedName {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        enc.write_u16(self.namespace);
        enc.write_string(self.name.as_deref())
    }
}

impl BinaryDecode for QualifiedName {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            namespace: dec.read_u16()?,
            name: dec.read_string()?,
        })
    }
}

const LOCALE_BIT: u8 = 0x01;
const TEXT_BIT: u8 = 0x02;

/// Human-readable text with an optional locale.
///
/// The wire form is a mask byte (bit 0 locale, bit 1 text) followed by the
/// strings that are present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LocalizedText {
    pub locale: Option<String>,
    pub text: Option<String>,
}

impl LocalizedText {
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            text: Some(text.into()),
        }
    }

    /// Text without a locale.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            locale: None,
            text: Some(text.into()),
        }
    }
}

impl BinaryEncode for LocalizedText {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        let mut mask = 0u8;
        if self.locale.is_some() {
            mask |= LOCALE_BIT;
        }
        if self.text.is_some() {
            mask |= TEXT_BIT;
        }
        enc.write_u8(mask);
        if let Some(locale) = &self.locale {
            enc.write_string(Some(locale.as_str()))?;
        }
        if let Some(text) = &self.text {
            enc.write_string(Some(text.as_str()))?;
        }
        Ok(())
    }
}

impl BinaryDecode for LocalizedText {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let mask = dec.read_u8()?;
        let locale = if mask & LOCALE_BIT != 0 {
            dec.read_string()?
        } else {
            None
        };
        let text = if mask & TEXT_BIT != 0 {
            dec.read_string()?
        } else {
            None
        };
        Ok(Self { locale, text })
    }
}

const NAMESPACE_URI_FLAG: u8 = 0x80;
const SERVER_INDEX_FLAG: u8 = 0x40;

/// A [`NodeId`] that may name its namespace by URI and live on another server.
///
/// Encoded as a NodeId whose format byte carries two flags: 0x80 when a
/// namespace URI String follows, 0x40 when a UInt32 server index follows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ExpandedNodeId {
    pub node_id: NodeId,
    pub namespace_uri: Option<String>,
    pub server_index: u32,
}

impl ExpandedNodeId {
    pub fn local(node_id: NodeId) -> Self {
        Self {
            node_id,
            namespace_uri: None,
            server_index: 0,
        }
    }

    pub fn is_local(&self) -> bool {
        self.server_index == 0
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        Self::local(node_id)
    }
}

impl BinaryEncode for ExpandedNodeId {
    fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        let mut flags = 0u8;
        if self.namespace_uri.is_some() {
            flags |= NAMESPACE_URI_FLAG;
        }
        if self.server_index != 0 {
            flags |= SERVER_INDEX_FLAG;
        }
        self.node_id.encode_flagged(enc, flags)?;
        if let Some(uri) = &self.namespace_uri {
            enc.write_string(Some(uri.as_str()))?;
        }
        if self.server_index != 0 {
            enc.write_u32(self.server_index);
        }
        Ok(())
    }
}

impl BinaryDecode for ExpandedNodeId {
    fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let offset = dec.offset();
        let (node_id, flags) = NodeId::decode_flagged(dec)?;
        if flags & !(NAMESPACE_URI_FLAG | SERVER_INDEX_FLAG) != 0 {
            return Err(CodecError::invalid(format!(
                "ExpandedNodeId at offset {} has undefined flags 0x{:02x}",
                offset, flags
            )));
        }
        let namespace_uri = if flags & NAMESPACE_URI_FLAG != 0 {
            dec.read_string()?
        } else {
            None
        };
        let server_index = if flags & SERVER_INDEX_FLAG != 0 {
            dec.read_u32()?
        } else {
            0
        };
        Ok(Self {
            node_id,
            namespace_uri,
            server_index,
        })
    }
}
