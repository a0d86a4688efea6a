//! Identity-only cached wrapper around a raw type handle.

use std::sync::Arc;

use typectx_common::TypeDesc;

use crate::key::TypeKey;

/// A raw type plus its derived identity key. No nullability or attribute
/// enrichment; created once per distinct key and shared for the lifetime
/// of the owning cache.
#[derive(Clone, Debug)]
pub struct CachedType {
    ty: Arc<TypeDesc>,
    key: Option<TypeKey>,
}

impl CachedType {
    /// `key` is `None` only for open generic types, which are never
    /// stored in the cache.
    pub(crate) fn new(ty: Arc<TypeDesc>, key: Option<TypeKey>) -> Self {
        Self { ty, key }
    }

    pub fn type_desc(&self) -> &Arc<TypeDesc> {
        &self.ty
    }

    pub fn key(&self) -> Option<&TypeKey> {
        self.key.as_ref()
    }
}
