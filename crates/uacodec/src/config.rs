// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration - single source of truth for wire constants and limits.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time constants (namespace URIs, builtin ids, defaults)
//! - **Level 2 (Dynamic)**: [`EncodingLimits`] supplied by the transport layer, loadable
//!   from YAML and overridable from the environment
//!
//! # Example
//!
//! ```ignore
//! use uacodec::config::*;
//!
//! let limits = EncodingLimits::from_yaml_str("max_array_length: 1024")?
//!     .with_env_overrides();
//! let dec = uacodec::BinaryDecoder::with_limits(&bytes, limits);
//! ```

use std::fmt;
#[cfg(feature = "yaml-config")]
use std::path::Path;

// =======================================================================
// Namespaces
// =======================================================================

/// Namespace URI of the OPC UA base information model (namespace index 0).
pub const OPC_UA_NAMESPACE: &str = "http://opcfoundation.org/UA/";

/// Namespace URI of the OPC Binary Schema vocabulary (`opc:` prefix).
pub const BINARY_SCHEMA_NAMESPACE: &str = "http://opcfoundation.org/BinarySchema/";

// =======================================================================
// Namespace-0 data type ids that carry meaning beyond the builtins
// =======================================================================

pub const STRUCTURE_TYPE_ID: u32 = 22;
pub const BASE_DATA_TYPE_ID: u32 = 24;
pub const NUMBER_TYPE_ID: u32 = 26;
pub const INTEGER_TYPE_ID: u32 = 27;
pub const UINTEGER_TYPE_ID: u32 = 28;
pub const ENUMERATION_TYPE_ID: u32 = 29;
pub const DURATION_TYPE_ID: u32 = 290;
pub const UTC_TIME_TYPE_ID: u32 = 294;
pub const UNION_TYPE_ID: u32 = 12756;

// =======================================================================
// Default limits
// =======================================================================

pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 65_535;
pub const DEFAULT_MAX_STRING_LENGTH: usize = 65_535;
/// Nesting bound for schema-driven structures (guards self-referencing schemas).
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 64;

pub const ENV_MAX_MESSAGE_SIZE: &str = "UACODEC_MAX_MESSAGE_SIZE";
pub const ENV_MAX_ARRAY_LENGTH: &str = "UACODEC_MAX_ARRAY_LENGTH";
pub const ENV_MAX_STRING_LENGTH: &str = "UACODEC_MAX_STRING_LENGTH";

/// Allocation bounds applied while encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "yaml-config",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct EncodingLimits {
    pub max_message_size: usize,
    pub max_array_length: usize,
    pub max_string_length: usize,
    pub max_recursion_depth: usize,
}

impl Default for EncodingLimits {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl EncodingLimits {
    /// Limits that never reject a length (test harnesses, trusted local files).
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_message_size: usize::MAX,
            max_array_length: usize::MAX,
            max_string_length: usize::MAX,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }

    /// Parse limits from a YAML mapping; absent keys keep their defaults.
    #[cfg(feature = "yaml-config")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    #[cfg(feature = "yaml-config")]
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::Io(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `UACODEC_MAX_*` overrides; unparsable values are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut usize); 3] = [
            (ENV_MAX_MESSAGE_SIZE, &mut self.max_message_size),
            (ENV_MAX_ARRAY_LENGTH, &mut self.max_array_length),
            (ENV_MAX_STRING_LENGTH, &mut self.max_string_length),
        ];
        for (key, slot) in targets {
            if let Some(raw) = lookup(key) {
                match raw.trim().parse::<usize>() {
                    Ok(v) => *slot = v,
                    Err(_) => log::warn!("[config] ignoring {}={:?}: not a size", key, raw),
                }
            }
        }
        self
    }
}

/// Failure loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(reason) => write!(f, "failed to read config: {}", reason),
            ConfigError::Parse(reason) => write!(f, "failed to parse config: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}
