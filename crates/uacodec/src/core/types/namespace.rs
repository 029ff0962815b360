// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Namespace index <-> URI table.
//!
//! Node ids carry a namespace *index*; schema documents and imports are keyed
//! by namespace *URI*. The table is shared between the schema generator and
//! registry construction and may be appended to concurrently.

use crate::config::OPC_UA_NAMESPACE;
use crate::core::ser::{CodecError, CodecResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Number of addressable namespace indexes.
const CAPACITY: usize = u16::MAX as usize + 1;

pub struct NamespaceTable {
    by_index: DashMap<u16, Arc<str>>,
    by_uri: DashMap<Arc<str>, u16>,
    next: AtomicU32,
}

impl NamespaceTable {
    /// Table with namespace 0 bound to the OPC UA base namespace.
    pub fn new() -> Self {
        std::iter::once(OPC_UA_NAMESPACE.to_string()).collect()
    }

    fn empty() -> Self {
        Self {
            by_index: DashMap::new(),
            by_uri: DashMap::new(),
            next: AtomicU32::new(0),
        }
    }

    /// Index for `uri`, assigning the next free index on first sight.
    ///
    /// Fails with `LengthOutOfRange` once all 65536 indexes are taken.
    pub fn register(&self, uri: &str) -> CodecResult<u16> {
        let key: Arc<str> = Arc::from(uri);
        let index = match self.by_uri.entry(key.clone()) {
            Entry::Occupied(entry) => return Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let raw = self.next.fetch_add(1, Ordering::Relaxed);
                let index = u16::try_from(raw).map_err(|_| CodecError::LengthOutOfRange {
                    length: i64::from(raw) + 1,
                    limit: CAPACITY,
                })?;
                entry.insert(index);
                index
            }
        };
        self.by_index.insert(index, key);
        Ok(index)
    }

    pub fn uri(&self, index: u16) -> Option<Arc<str>> {
        self.by_index.get(&index).map(|e| e.value().clone())
    }

    pub fn index(&self, uri: &str) -> Option<u16> {
        self.by_uri.get(uri).map(|e| *e.value())
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<String> for NamespaceTable {
    /// Builds a table from a server namespace array; entry `i` gets index `i`.
    ///
    /// A repeated URI keeps its slot but resolves to its first index, so later
    /// entries stay aligned with the server's array. Entries past the last
    /// addressable index are dropped.
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let table = Self::empty();
        let mut count = 0usize;
        for uri in iter {
            let Ok(index) = u16::try_from(count) else {
                log::warn!("[namespace] dropping '{}': table holds {} entries", uri, CAPACITY);
                continue;
            };
            let key: Arc<str> = Arc::from(uri);
            if let Some(first) = table.by_uri.get(&key).map(|e| *e.value()) {
                log::debug!("[namespace] '{}' repeated at {}, resolves to {}", key, index, first);
            } else {
                table.by_uri.insert(key.clone(), index);
            }
            table.by_index.insert(index, key);
            count += 1;
        }
        if count == 0 {
            table.by_uri.insert(Arc::from(OPC_UA_NAMESPACE), 0);
            table.by_index.insert(0, Arc::from(OPC_UA_NAMESPACE));
            count = 1;
        }
        table.next.store(count as u32, Ordering::Relaxed);
        table
    }
}
