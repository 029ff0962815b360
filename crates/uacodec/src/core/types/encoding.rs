// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;

/// Encoding family of an extension object body or registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingFormat {
    Binary,
    Xml,
    Json,
}

impl EncodingFormat {
    /// Extension object encoding byte; JSON bodies have none in the binary encoding.
    pub fn encoding_byte(self) -> Option<u8> {
        match self {
            EncodingFormat::Binary => Some(0x01),
            EncodingFormat::Xml => Some(0x02),
            EncodingFormat::Json => None,
        }
    }

    pub fn from_encoding_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(EncodingFormat::Binary),
            0x02 => Some(EncodingFormat::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncodingFormat::Binary => "Default Binary",
            EncodingFormat::Xml => "Default XML",
            EncodingFormat::Json => "Default JSON",
        })
    }
}
