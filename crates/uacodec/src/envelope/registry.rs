// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec registry keyed by `(EncodingFormat, TypeId)`.
//!
//! A [`CodecRegistry`] is an immutable snapshot once shared. Newly discovered
//! types (a Schema Document delivered after a reconnect, say) are added by
//! building a new snapshot and swapping it into a [`RegistryHandle`], so
//! readers never see a half-updated catalog.

use super::{DecodedValue, Envelope, EnvelopeBody};
use crate::config::EncodingLimits;
use crate::core::ser::{BinaryDecoder, BinaryEncoder, CodecError, CodecResult};
use crate::core::types::{EncodingFormat, NamespaceTable, NodeId, TypeId};
use crate::dynamic::{DynamicStructCodec, GenericStruct, SchemaSet, Value};
use crate::structured::UaStructure;
use crate::typetree::DataTypeTree;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Type-erased compiled codec.
pub trait ErasedCodec: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn decode_any(&self, dec: &mut BinaryDecoder<'_>) -> CodecResult<Arc<dyn Any + Send + Sync>>;

    fn encode_any(&self, value: &(dyn Any + Send + Sync), enc: &mut BinaryEncoder)
        -> CodecResult<()>;

    fn eq_any(&self, a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool;

    fn debug_any(&self, value: &(dyn Any + Send + Sync), f: &mut fmt::Formatter<'_>)
        -> fmt::Result;
}

/// [`ErasedCodec`] over a compiled [`UaStructure`].
pub struct CompiledCodec<T>(PhantomData<fn() -> T>);

impl<T> CompiledCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for CompiledCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ErasedCodec for CompiledCodec<T>
where
    T: UaStructure + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn decode_any(&self, dec: &mut BinaryDecoder<'_>) -> CodecResult<Arc<dyn Any + Send + Sync>> {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(T::decode(dec)?);
        Ok(value)
    }

    fn encode_any(
        &self,
        value: &(dyn Any + Send + Sync),
        enc: &mut BinaryEncoder,
    ) -> CodecResult<()> {
        value
            .downcast_ref::<T>()
            .ok_or_else(|| CodecError::mismatch(T::TYPE_NAME, "value of another type"))?
            .encode(enc)
    }

    fn eq_any(&self, a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool {
        match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn debug_any(
        &self,
        value: &(dyn Any + Send + Sync),
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match value.downcast_ref::<T>() {
            Some(v) => fmt::Debug::fmt(v, f),
            None => write!(f, "<{}?>", T::TYPE_NAME),
        }
    }
}

/// A registered codec, compiled or schema-driven.
#[derive(Clone)]
pub enum CodecHandle {
    Compiled(Arc<dyn ErasedCodec>),
    Dynamic(DynamicStructCodec),
}

impl CodecHandle {
    pub fn compiled<T>() -> Self
    where
        T: UaStructure + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        CodecHandle::Compiled(Arc::new(CompiledCodec::<T>::new()))
    }

    pub fn type_name(&self) -> &str {
        match self {
            CodecHandle::Compiled(codec) => codec.type_name(),
            CodecHandle::Dynamic(codec) => &codec.type_name().name,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, CodecHandle::Dynamic(_))
    }

    pub(crate) fn decode(&self, dec: &mut BinaryDecoder<'_>) -> CodecResult<DecodedValue> {
        match self {
            CodecHandle::Compiled(codec) => codec.decode_any(dec).map(DecodedValue::Compiled),
            CodecHandle::Dynamic(codec) => codec
                .decode(dec)
                .map(|s| DecodedValue::Dynamic(Value::Struct(s))),
        }
    }

    pub(crate) fn encode(&self, value: &DecodedValue, enc: &mut BinaryEncoder) -> CodecResult<()> {
        match (self, value) {
            (CodecHandle::Compiled(codec), DecodedValue::Compiled(v)) => codec.encode_any(&**v, enc),
            (CodecHandle::Dynamic(codec), DecodedValue::Dynamic(Value::Struct(s))) => {
                codec.encode(s, enc)
            }
            (_, DecodedValue::Dynamic(other)) => {
                Err(CodecError::mismatch(self.type_name(), other.kind_name()))
            }
            (_, DecodedValue::Compiled(_)) => Err(CodecError::mismatch(
                self.type_name(),
                "compiled value",
            )),
        }
    }

    pub(crate) fn eq_values(&self, a: &DecodedValue, b: &DecodedValue) -> bool {
        match (self, a, b) {
            (CodecHandle::Compiled(codec), DecodedValue::Compiled(a), DecodedValue::Compiled(b)) => {
                codec.eq_any(&**a, &**b)
            }
            (_, DecodedValue::Dynamic(a), DecodedValue::Dynamic(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn fmt_value(&self, value: &DecodedValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, value) {
            (CodecHandle::Compiled(codec), DecodedValue::Compiled(v)) => codec.debug_any(&**v, f),
            (_, DecodedValue::Dynamic(v)) => fmt::Debug::fmt(v, f),
            (_, DecodedValue::Compiled(_)) => f.write_str("<compiled>"),
        }
    }
}

impl fmt::Debug for CodecHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecHandle::Compiled(codec) => write!(f, "Compiled({})", codec.type_name()),
            CodecHandle::Dynamic(codec) => write!(f, "Dynamic({})", codec.type_name()),
        }
    }
}

#[derive(Clone)]
struct Registration {
    encoding_id: NodeId,
    codec: CodecHandle,
}

/// Maps `(format, data type)` to a codec and encoding ids back to data types.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<(EncodingFormat, TypeId), Registration>,
    encodings: HashMap<NodeId, (EncodingFormat, TypeId)>,
    limits: EncodingLimits,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: EncodingLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &EncodingLimits {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: EncodingLimits) {
        self.limits = limits;
    }

    /// Register a codec. A second registration for the same key replaces the
    /// first.
    pub fn register(
        &mut self,
        format: EncodingFormat,
        type_id: TypeId,
        encoding_id: NodeId,
        codec: CodecHandle,
    ) {
        if let Some(previous) = self.codecs.get(&(format, type_id.clone())) {
            self.encodings.remove(&previous.encoding_id);
        }
        self.encodings
            .insert(encoding_id.clone(), (format, type_id.clone()));
        self.codecs
            .insert((format, type_id), Registration { encoding_id, codec });
    }

    pub fn register_structure<T>(&mut self)
    where
        T: UaStructure + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        self.register(
            EncodingFormat::Binary,
            T::data_type_id(),
            T::binary_encoding_id(),
            CodecHandle::compiled::<T>(),
        );
    }

    pub fn register_dynamic(
        &mut self,
        type_id: TypeId,
        encoding_id: NodeId,
        codec: DynamicStructCodec,
    ) {
        self.register(
            EncodingFormat::Binary,
            type_id,
            encoding_id,
            CodecHandle::Dynamic(codec),
        );
    }

    /// Register every structured type of `set` that the tree knows by browse
    /// name and binary encoding id. Returns how many were registered.
    pub fn register_schema(
        &mut self,
        set: &Arc<SchemaSet>,
        tree: &DataTypeTree,
        namespaces: &NamespaceTable,
    ) -> usize {
        let mut count = 0;
        for codec in set.codecs() {
            let qname = codec.type_name().clone();
            let Some(ns) = namespaces.index(&qname.namespace) else {
                log::debug!(
                    "[registry] namespace {} not in table, skipping {}",
                    qname.namespace,
                    qname.name
                );
                continue;
            };
            let Some(node) = tree.find_by_name(ns, &qname.name) else {
                log::debug!("[registry] {} has no node in the type tree", qname);
                continue;
            };
            let Some(encoding_id) = node.binary_encoding_id.clone() else {
                log::debug!("[registry] {} has no binary encoding id", qname);
                continue;
            };
            self.register_dynamic(node.type_id.clone(), encoding_id, codec);
            count += 1;
        }
        log::debug!("[registry] registered {} schema-driven codecs", count);
        count
    }

    pub fn lookup(&self, format: EncodingFormat, type_id: &TypeId) -> Option<&CodecHandle> {
        self.codecs
            .get(&(format, type_id.clone()))
            .map(|r| &r.codec)
    }

    /// Codec behind an encoding id, with its format and data type.
    pub fn resolve(&self, encoding_id: &NodeId) -> Option<(EncodingFormat, &TypeId, &CodecHandle)> {
        let (format, type_id) = self.encodings.get(encoding_id)?;
        let registration = self.codecs.get(&(*format, type_id.clone()))?;
        Some((*format, type_id, &registration.codec))
    }

    pub fn encoding_id(&self, format: EncodingFormat, type_id: &TypeId) -> Option<&NodeId> {
        self.codecs
            .get(&(format, type_id.clone()))
            .map(|r| &r.encoding_id)
    }

    pub fn contains(&self, format: EncodingFormat, type_id: &TypeId) -> bool {
        self.codecs.contains_key(&(format, type_id.clone()))
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Wrap a generic value in an envelope for the dynamic codec of `type_id`.
    pub fn wrap_generic(&self, type_id: &TypeId, value: GenericStruct) -> CodecResult<Envelope> {
        let registration = self
            .codecs
            .get(&(EncodingFormat::Binary, type_id.clone()))
            .ok_or_else(|| CodecError::UnknownType {
                type_id: type_id.clone(),
            })?;
        match &registration.codec {
            CodecHandle::Dynamic(codec) => Ok(Envelope::from_generic(
                type_id.clone(),
                registration.encoding_id.clone(),
                value,
                codec.clone(),
            )),
            CodecHandle::Compiled(codec) => {
                Err(CodecError::mismatch(codec.type_name(), "generic structure"))
            }
        }
    }

    /// Decode a raw envelope in place.
    ///
    /// An unregistered encoding id, or a body in a format other than the one
    /// registered for it, fails with `UnknownType` and leaves the envelope raw. Envelopes nested in a schema-driven value are
    /// materialized too; an unknown type there stays raw.
    pub fn materialize(&self, envelope: &mut Envelope) -> CodecResult<()> {
        self.materialize_at(envelope, 0)
    }

    fn materialize_at(&self, envelope: &mut Envelope, depth: usize) -> CodecResult<()> {
        let EnvelopeBody::Raw { format, bytes } = &envelope.body else {
            return Ok(());
        };
        let (registered_format, type_id, codec) = self
            .resolve(&envelope.encoding_id)
            .ok_or_else(|| CodecError::UnknownType {
                type_id: envelope.encoding_id.clone(),
            })?;
        if registered_format != *format {
            log::debug!(
                "[registry] {} is a {} encoding, body is {}",
                envelope.encoding_id,
                registered_format,
                format
            );
            return Err(CodecError::UnknownType {
                type_id: envelope.encoding_id.clone(),
            });
        }

        let mut dec = BinaryDecoder::with_limits(bytes, self.limits);
        let mut value = codec.decode(&mut dec)?;
        if !dec.is_exhausted() {
            return Err(CodecError::invalid(format!(
                "{} trailing bytes in {} body",
                dec.remaining(),
                codec.type_name()
            )));
        }
        if let DecodedValue::Dynamic(inner) = &mut value {
            self.materialize_nested(inner, depth + 1)?;
        }
        envelope.type_id = Some(type_id.clone());
        envelope.body = EnvelopeBody::Decoded {
            value,
            codec: codec.clone(),
        };
        Ok(())
    }

    fn materialize_nested(&self, value: &mut Value, depth: usize) -> CodecResult<()> {
        if depth >= self.limits.max_recursion_depth {
            return Err(CodecError::LengthOutOfRange {
                length: i64::try_from(depth + 1).unwrap_or(i64::MAX),
                limit: self.limits.max_recursion_depth,
            });
        }
        match value {
            Value::Envelope(inner) => match self.materialize_at(inner, depth) {
                Err(e) if e.is_recoverable() => {
                    log::debug!("[registry] nested envelope left raw: {}", e);
                    Ok(())
                }
                other => other,
            },
            Value::Struct(s) => s
                .iter_mut()
                .try_for_each(|v| self.materialize_nested(v, depth + 1)),
            Value::Array(items) | Value::Matrix { elements: items, .. } => items
                .iter_mut()
                .try_for_each(|v| self.materialize_nested(v, depth)),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.codecs.len())
            .field("limits", &self.limits)
            .finish()
    }
}

/// Shared registry with whole-snapshot replacement.
///
/// Readers [`load`](Self::load) a snapshot and keep using it for the whole
/// operation; writers build a complete new registry and swap it in. Writers
/// are serialized so two concurrent updates cannot lose each other's
/// registrations.
pub struct RegistryHandle {
    current: ArcSwap<CodecRegistry>,
    writer: Mutex<()>,
}

impl RegistryHandle {
    pub fn new(registry: CodecRegistry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<CodecRegistry> {
        self.current.load_full()
    }

    /// Replace the whole registry.
    pub fn replace(&self, registry: CodecRegistry) {
        let _guard = self.writer.lock();
        self.current.store(Arc::new(registry));
        log::debug!("[registry] snapshot replaced");
    }

    /// Apply `f` to a copy of the current snapshot and publish the result.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CodecRegistry) -> R,
    {
        let _guard = self.writer.lock();
        let mut next = CodecRegistry::clone(&self.current.load());
        let result = f(&mut next);
        let count = next.len();
        self.current.store(Arc::new(next));
        log::debug!("[registry] snapshot updated ({} codecs)", count);
        result
    }

    /// Publish a snapshot extended with the codecs of `set`.
    pub fn register_schema(
        &self,
        set: &Arc<SchemaSet>,
        tree: &DataTypeTree,
        namespaces: &NamespaceTable,
    ) -> usize {
        self.update(|registry| registry.register_schema(set, tree, namespaces))
    }
}

impl Default for RegistryHandle {
    fn default() -> Self {
        Self::new(CodecRegistry::new())
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegistryHandle").field(&*self.load()).finish()
    }
}
