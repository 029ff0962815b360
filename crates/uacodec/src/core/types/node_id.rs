// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Namespace-qualified node identifiers.
//!
//! A [`NodeId`] identifies data types, encodings and every other node of the
//! address space. The binary form picks the most compact of six layouts:
//!
//! | Tag  | Layout                              |
//! |------|-------------------------------------|
//! | 0x00 | two-byte: ns 0, numeric id <= 255    |
//! | 0x01 | four-byte: ns <= 255, id <= 65535    |
//! | 0x02 | numeric: u16 ns, u32 id              |
//! | 0x03 | string: u16 ns, String              |
//! | 0x04 | guid: u16 ns, Guid                  |
//! | 0x05 | opaque: u16 ns, ByteString          |

use super::scalar::Guid;
use crate::core::ser::{BinaryDecoder, BinaryEncoder, CodecError, CodecResult};
use std::fmt;
use std::str::FromStr;

/// Identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(Guid),
    Opaque(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    namespace: u16,
    identifier: Identifier,
}

/// Data types are identified by their node id.
pub type TypeId = NodeId;

impl NodeId {
    pub const NULL: NodeId = NodeId::numeric(0, 0);

    pub const fn numeric(namespace: u16, id: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(id),
        }
    }

    /// Namespace-0 numeric id.
    pub const fn ns0(id: u32) -> Self {
        Self::numeric(0, id)
    }

    pub fn string(namespace: u16, id: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(id.into()),
        }
    }

    pub fn guid(namespace: u16, id: Guid) -> Self {
        Self {
            namespace,
            identifier: Identifier::Guid(id),
        }
    }

    pub fn opaque(namespace: u16, id: Vec<u8>) -> Self {
        Self {
            namespace,
            identifier: Identifier::Opaque(id),
        }
    }

    pub fn namespace(&self) -> u16 {
        self.namespace
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            Identifier::Numeric(id) => Some(id),
            _ => None,
        }
    }

    /// Namespace-0 numeric id, if that is what this is.
    pub fn as_ns0(&self) -> Option<u32> {
        if self.namespace == 0 {
            self.as_numeric()
        } else {
            None
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn encode(&self, enc: &mut BinaryEncoder) -> CodecResult<()> {
        self.encode_flagged(enc, 0)
    }

    /// Encode with `flags` OR-ed into the format byte (ExpandedNodeId bits).
    pub(crate) fn encode_flagged(&self, enc: &mut BinaryEncoder, flags: u8) -> CodecResult<()> {
        match &self.identifier {
            Identifier::Numeric(id) => {
                if self.namespace == 0 && *id <= 0xFF {
                    enc.write_u8(flags);
                    enc.write_u8(*id as u8);
                } else if self.namespace <= 0xFF && *id <= 0xFFFF {
                    enc.write_u8(0x01 | flags);
                    enc.write_u8(self.namespace as u8);
                    enc.write_u16(*id as u16);
                } else {
                    enc.write_u8(0x02 | flags);
                    enc.write_u16(self.namespace);
                    enc.write_u32(*id);
                }
            }
            Identifier::String(s) => {
                enc.write_u8(0x03 | flags);
                enc.write_u16(self.namespace);
                enc.write_string(Some(s.as_str()))?;
            }
            Identifier::Guid(g) => {
                enc.write_u8(0x04 | flags);
                enc.write_u16(self.namespace);
                write_guid(enc, g);
            }
            Identifier::Opaque(b) => {
                enc.write_u8(0x05 | flags);
                enc.write_u16(self.namespace);
                enc.write_byte_string(Some(b.as_slice()))?;
            }
        }
        Ok(())
    }

    pub fn decode(dec: &mut BinaryDecoder<'_>) -> CodecResult<Self> {
        let offset = dec.offset();
        let (id, flags) = Self::decode_flagged(dec)?;
        if flags != 0 {
            return Err(CodecError::invalid(format!(
                "NodeId at offset {} carries ExpandedNodeId flags 0x{:02x}",
                offset, flags
            )));
        }
        Ok(id)
    }

    /// Decode a node id, returning the high bits of the format byte apart.
    pub(crate) fn decode_flagged(dec: &mut BinaryDecoder<'_>) -> CodecResult<(Self, u8)> {
        let offset = dec.offset();
        let byte = dec.read_u8()?;
        let flags = byte & 0xF0;
        let id = match byte & 0x0F {
            0x00 => NodeId::numeric(0, u32::from(dec.read_u8()?)),
            0x01 => {
                let ns = u16::from(dec.read_u8()?);
                NodeId::numeric(ns, u32::from(dec.read_u16()?))
            }
            0x02 => {
                let ns = dec.read_u16()?;
                NodeId::numeric(ns, dec.read_u32()?)
            }
            0x03 => {
                let ns = dec.read_u16()?;
                let s = dec.read_string()?.unwrap_or_default();
                NodeId::string(ns, s)
            }
            0x04 => {
                let ns = dec.read_u16()?;
                NodeId::guid(ns, read_guid(dec)?)
            }
            0x05 => {
                let ns = dec.read_u16()?;
                let b = dec.read_byte_string()?.unwrap_or_default();
                NodeId::opaque(ns, b)
            }
            _ => {
                return Err(CodecError::invalid(format!(
                    "invalid NodeId format 0x{:02x} at offset {}",
                    byte, offset
                )))
            }
        };
        Ok((id, flags))
    }
}

pub(crate) fn write_guid(enc: &mut BinaryEncoder, g: &Guid) {
    enc.write_u32(g.data1);
    enc.write_u16(g.data2);
    enc.write_u16(g.data3);
    enc.write_bytes(&g.data4);
}

pub(crate) fn read_guid(dec: &mut BinaryDecoder<'_>) -> CodecResult<Guid> {
    let data1 = dec.read_u32()?;
    let data2 = dec.read_u16()?;
    let data3 = dec.read_u16()?;
    let mut data4 = [0u8; 8];
    data4.copy_from_slice(dec.read_bytes(8)?);
    Ok(Guid::new(data1, data2, data3, data4))
}

impl Default for NodeId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(id) => write!(f, "i={}", id),
            Identifier::String(s) => write!(f, "s={}", s),
            Identifier::Guid(g) => write!(f, "g={}", g),
            Identifier::Opaque(b) => {
                f.write_str("b=")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for NodeId {
    type Err = CodecError;

    /// Parses `ns=<n>;i=<n>`, `s=<text>`, `g=<guid>` or `b=<hex>`; the
    /// namespace part is optional and defaults to 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |why: &str| CodecError::invalid(format!("malformed NodeId '{}': {}", s, why));
        let text = s.trim();
        let (namespace, rest) = match text.strip_prefix("ns=") {
            Some(tail) => {
                let (ns, rest) = tail.split_once(';').ok_or_else(|| bad("missing ';'"))?;
                let ns = ns.parse::<u16>().map_err(|_| bad("namespace index"))?;
                (ns, rest)
            }
            None => (0, text),
        };
        let (kind, value) = rest.split_once('=').ok_or_else(|| bad("missing identifier"))?;
        match kind {
            "i" => value
                .parse::<u32>()
                .map(|id| NodeId::numeric(namespace, id))
                .map_err(|_| bad("numeric identifier")),
            "s" => Ok(NodeId::string(namespace, value)),
            "g" => Ok(NodeId::guid(namespace, value.parse()?)),
            "b" => {
                if value.len() % 2 != 0 {
                    return Err(bad("odd hex length"));
                }
                let mut bytes = Vec::with_capacity(value.len() / 2);
                for i in (0..value.len()).step_by(2) {
                    let pair = value.get(i..i + 2).ok_or_else(|| bad("hex"))?;
                    bytes.push(u8::from_str_radix(pair, 16).map_err(|_| bad("hex"))?);
                }
                Ok(NodeId::opaque(namespace, bytes))
            }
            _ => Err(bad("unknown identifier kind")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(id: &NodeId) -> Vec<u8> {
        let mut enc = BinaryEncoder::new();
        id.encode(&mut enc).expect("encode");
        enc.into_inner()
    }

    #[test]
    fn test_compact_numeric_layouts() {
        assert_eq!(encoded(&NodeId::ns0(13)), vec![0x00, 13]);
        assert_eq!(encoded(&NodeId::numeric(2, 5001)), vec![0x01, 2, 0x89, 0x13]);
        assert_eq!(
            encoded(&NodeId::numeric(0, 12756)),
            vec![0x01, 0, 0xD4, 0x31]
        );
        assert_eq!(
            encoded(&NodeId::numeric(300, 70_000)),
            vec![0x02, 0x2C, 0x01, 0x70, 0x11, 0x01, 0x00]
        );
    }

    #[test]
    fn test_every_layout_decodes_back() {
        let guid: Guid = "72962b91-fa75-4ae6-8d28-b404dc7daf63".parse().expect("guid");
        let ids = [
            NodeId::ns0(1),
            NodeId::numeric(1, 1000),
            NodeId::numeric(7, 1 << 20),
            NodeId::string(3, "Demo.Static"),
            NodeId::guid(4, guid),
            NodeId::opaque(5, vec![0xde, 0xad]),
        ];
        for id in ids {
            let bytes = encoded(&id);
            let mut dec = BinaryDecoder::new(&bytes);
            assert_eq!(NodeId::decode(&mut dec).expect("decode"), id);
            assert!(dec.is_exhausted());
        }
    }

    #[test]
    fn test_invalid_format_byte() {
        let bytes = [0x09, 0x00];
        let mut dec = BinaryDecoder::new(&bytes);
        assert!(matches!(
            NodeId::decode(&mut dec),
            Err(CodecError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_text_form_roundtrip() {
        for text in ["i=24", "ns=2;i=5001", "ns=1;s=Pump.Speed", "ns=3;b=cafe"] {
            let id: NodeId = text.parse().expect("parse");
            assert_eq!(id.to_string(), text);
        }
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("q=1".parse::<NodeId>().is_err());
    }
}
