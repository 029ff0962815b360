// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A loaded, fully resolved set of Schema Documents.

use super::codec::DynamicStructCodec;
use super::plan::{PlanBuilder, StructPlan};
use crate::core::ser::{CodecError, CodecResult};
use crate::schema::{QualifiedTypeName, SchemaDocument};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Documents that may reference each other's types.
///
/// Construction validates every document and resolves every field type, so
/// a set that builds never fails a decode on a missing type.
#[derive(Debug)]
pub struct SchemaSet {
    documents: Vec<SchemaDocument>,
    plans: Vec<StructPlan>,
    indexes: HashMap<QualifiedTypeName, usize>,
}

impl SchemaSet {
    pub fn build(documents: Vec<SchemaDocument>) -> CodecResult<Arc<Self>> {
        let mut namespaces = HashSet::new();
        for doc in &documents {
            if let Err(e) = doc.validate() {
                log::warn!("[dynamic] rejecting schema {}: {}", doc.target_namespace, e);
                return Err(e);
            }
            if !namespaces.insert(doc.target_namespace.as_str()) {
                return Err(CodecError::malformed(format!(
                    "two documents target {}",
                    doc.target_namespace
                )));
            }
        }

        let builder = PlanBuilder::new(&documents);
        let plans = builder.build().map_err(|e| {
            log::warn!("[dynamic] rejecting schema set: {}", e);
            e
        })?;
        let indexes = builder.into_indexes();
        log::debug!(
            "[dynamic] loaded {} documents with {} structured types",
            documents.len(),
            plans.len()
        );
        Ok(Arc::new(Self {
            documents,
            plans,
            indexes,
        }))
    }

    pub fn single(document: SchemaDocument) -> CodecResult<Arc<Self>> {
        Self::build(vec![document])
    }

    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    pub fn document(&self, namespace: &str) -> Option<&SchemaDocument> {
        self.documents
            .iter()
            .find(|d| d.target_namespace == namespace)
    }

    /// Number of structured types.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn codec(self: &Arc<Self>, namespace: &str, name: &str) -> Option<DynamicStructCodec> {
        self.codec_for(&QualifiedTypeName::new(namespace, name))
    }

    pub fn codec_for(self: &Arc<Self>, name: &QualifiedTypeName) -> Option<DynamicStructCodec> {
        let index = *self.indexes.get(name)?;
        Some(DynamicStructCodec::new(Arc::clone(self), index))
    }

    /// One codec per structured type, in document order.
    pub fn codecs(self: &Arc<Self>) -> impl Iterator<Item = DynamicStructCodec> + '_ {
        (0..self.plans.len()).map(move |index| DynamicStructCodec::new(Arc::clone(self), index))
    }

    pub(crate) fn plans(&self) -> &[StructPlan] {
        &self.plans
    }
}
