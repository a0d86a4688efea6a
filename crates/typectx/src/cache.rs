//! The memoization cache service.
//!
//! `ContextCache` is an explicitly owned service rather than implicit
//! process-wide state: hosts that want one cache for the whole process
//! share one instance, tests own their own. Each keyspace is a concurrent
//! map whose entry API gives atomic compute-if-absent, so at most one
//! computation runs per key under contention and readers never observe a
//! partially constructed node.
//!
//! Entries are never evicted individually; the cache grows monotonically
//! with distinct entities observed until `clear()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use tracing::trace;
use typectx_common::{Attribute, FieldDesc, MemberDesc, MethodDesc, PropertyDesc, TypeDesc};

use crate::cached::CachedType;
use crate::compose;
use crate::contextual::{
    ContextualFieldInfo, ContextualGenericInfo, ContextualMemberInfo, ContextualParameterInfo,
    ContextualPropertyInfo, ContextualType,
};
use crate::error::MetadataError;
use crate::key::{method_key, type_key};

/// Global counter for assigning unique instance IDs to `ContextCache`
/// instances. Used to tell cache lifetimes apart in trace output.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

type FxDashMap<V> = DashMap<String, V, FxBuildHasher>;

/// Concurrent memoization of contextual metadata, keyed by composite
/// strings rooted in type keys. Immutable values, `Arc`-shared.
pub struct ContextCache {
    instance_id: u64,

    /// `type:{key}` -> identity-only wrapper
    types: FxDashMap<Arc<CachedType>>,

    /// `ctx:{key}` -> whole-type contextual node
    contextual_types: FxDashMap<Arc<ContextualType>>,

    /// `prop:{declaring key}.{name}` -> property node
    properties: FxDashMap<Arc<ContextualPropertyInfo>>,

    /// `field:{declaring key}.{name}` -> field node
    fields: FxDashMap<Arc<ContextualFieldInfo>>,

    /// `params:{method key}` -> parameter node array
    parameters: FxDashMap<Arc<[Arc<ContextualParameterInfo>]>>,

    /// `generics:{method key}<args>` -> generic argument node array
    generics: FxDashMap<Arc<[Arc<ContextualGenericInfo>]>>,
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextCache {
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(instance_id, "ContextCache::new - creating new instance");
        Self {
            instance_id,
            types: FxDashMap::default(),
            contextual_types: FxDashMap::default(),
            properties: FxDashMap::default(),
            fields: FxDashMap::default(),
            parameters: FxDashMap::default(),
            generics: FxDashMap::default(),
        }
    }

    /// Identity-only wrapper for a type. Open generics are constructed
    /// fresh on every call and never stored.
    pub fn cached_type(&self, ty: &Arc<TypeDesc>) -> Arc<CachedType> {
        let Some(key) = type_key(ty) else {
            trace!(
                instance_id = self.instance_id,
                ty = ty.name(),
                "open generic type, bypassing cache"
            );
            return Arc::new(CachedType::new(ty.clone(), None));
        };
        self.types
            .entry(format!("type:{key}"))
            .or_insert_with(|| {
                trace!(instance_id = self.instance_id, %key, "caching type wrapper");
                Arc::new(CachedType::new(ty.clone(), Some(key.clone())))
            })
            .clone()
    }

    /// Contextual node for a bare type usage; context chain is the type
    /// itself, its enclosing chain and its assembly.
    pub fn contextual_type(&self, ty: &Arc<TypeDesc>) -> Arc<ContextualType> {
        let Some(key) = type_key(ty) else {
            return Arc::new(compose::compose(ty, &compose::type_chain(ty)));
        };
        self.contextual_types
            .entry(format!("ctx:{key}"))
            .or_insert_with(|| {
                trace!(instance_id = self.instance_id, %key, "composing contextual type");
                Arc::new(compose::compose(ty, &compose::type_chain(ty)))
            })
            .clone()
    }

    /// Contextual node with caller-supplied ad-hoc attributes. Never
    /// memoized: the attribute set is not derivable from a stable key.
    pub fn contextual_type_with(
        &self,
        ty: &Arc<TypeDesc>,
        attributes: Vec<Attribute>,
    ) -> Arc<ContextualType> {
        Arc::new(compose::compose_with_supplied(
            ty,
            &compose::type_chain(ty),
            attributes,
        ))
    }

    pub fn contextual_property(&self, property: &Arc<PropertyDesc>) -> Arc<ContextualPropertyInfo> {
        let build = || {
            Arc::new(ContextualPropertyInfo::new(
                property.clone(),
                Arc::new(compose::build_property(property)),
            ))
        };
        let Some(declaring) = type_key(property.declaring()) else {
            return build();
        };
        self.properties
            .entry(format!("prop:{declaring}.{}", property.name()))
            .or_insert_with(|| {
                trace!(
                    instance_id = self.instance_id,
                    %declaring,
                    property = property.name(),
                    "composing contextual property"
                );
                build()
            })
            .clone()
    }

    pub fn contextual_field(&self, field: &Arc<FieldDesc>) -> Arc<ContextualFieldInfo> {
        let build = || {
            Arc::new(ContextualFieldInfo::new(
                field.clone(),
                Arc::new(compose::build_field(field)),
            ))
        };
        let Some(declaring) = type_key(field.declaring()) else {
            return build();
        };
        self.fields
            .entry(format!("field:{declaring}.{}", field.name()))
            .or_insert_with(|| {
                trace!(
                    instance_id = self.instance_id,
                    %declaring,
                    field = field.name(),
                    "composing contextual field"
                );
                build()
            })
            .clone()
    }

    /// Dispatch over the closed member union. Methods carry no data slot
    /// and fail with `UnsupportedMemberKind`; nothing is inserted.
    pub fn contextual_member(
        &self,
        member: &MemberDesc,
    ) -> Result<ContextualMemberInfo, MetadataError> {
        match member {
            MemberDesc::Property(property) => Ok(ContextualMemberInfo::Property(
                self.contextual_property(property),
            )),
            MemberDesc::Field(field) => {
                Ok(ContextualMemberInfo::Field(self.contextual_field(field)))
            }
            MemberDesc::Method(method) => Err(MetadataError::UnsupportedMemberKind {
                name: method.name().to_string(),
                kind: "method",
            }),
        }
    }

    /// Union of the type's property and field nodes, declaration order.
    /// Non-data members enumerated by the host are skipped, not errors.
    pub fn contextual_properties_and_fields(
        &self,
        ty: &Arc<TypeDesc>,
    ) -> Vec<ContextualMemberInfo> {
        ty.members()
            .iter()
            .filter_map(|member| match member {
                MemberDesc::Property(property) => Some(ContextualMemberInfo::Property(
                    self.contextual_property(property),
                )),
                MemberDesc::Field(field) => {
                    Some(ContextualMemberInfo::Field(self.contextual_field(field)))
                }
                MemberDesc::Method(_) => None,
            })
            .collect()
    }

    /// Contextual nodes for all parameters of a method, cached as one
    /// array keyed by the overload-qualified method key.
    pub fn contextual_parameters(
        &self,
        method: &Arc<MethodDesc>,
    ) -> Arc<[Arc<ContextualParameterInfo>]> {
        let build = || -> Arc<[Arc<ContextualParameterInfo>]> {
            let nodes: Vec<_> = method
                .parameters()
                .iter()
                .map(|parameter| {
                    Arc::new(ContextualParameterInfo::new(
                        parameter.clone(),
                        method.clone(),
                        Arc::new(compose::build_parameter(parameter, method)),
                    ))
                })
                .collect();
            Arc::from(nodes)
        };
        let Some(key) = method_key(method) else {
            return build();
        };
        self.parameters
            .entry(format!("params:{key}"))
            .or_insert_with(|| {
                trace!(instance_id = self.instance_id, %key, "composing contextual parameters");
                build()
            })
            .clone()
    }

    /// Contextual nodes for a method's generic arguments, cached as one
    /// array. The key encodes the argument types so instantiations of the
    /// same method never collide.
    pub fn contextual_generics(
        &self,
        method: &Arc<MethodDesc>,
    ) -> Arc<[Arc<ContextualGenericInfo>]> {
        let build = || -> Arc<[Arc<ContextualGenericInfo>]> {
            let nodes: Vec<_> = method
                .generic_args()
                .iter()
                .enumerate()
                .map(|(position, argument)| {
                    Arc::new(ContextualGenericInfo::new(
                        method.clone(),
                        position,
                        Arc::new(compose::build_generic(argument, method)),
                    ))
                })
                .collect();
            Arc::from(nodes)
        };
        let Some(key) = self.generics_key(method) else {
            return build();
        };
        self.generics
            .entry(key)
            .or_insert_with(|| {
                trace!(
                    instance_id = self.instance_id,
                    method = method.name(),
                    "composing contextual generics"
                );
                build()
            })
            .clone()
    }

    fn generics_key(&self, method: &Arc<MethodDesc>) -> Option<String> {
        let base = method_key(method)?;
        let mut key = format!("generics:{base}<");
        for (i, argument) in method.generic_args().iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(type_key(argument)?.as_str());
        }
        key.push('>');
        Some(key)
    }

    /// Drop every entry. Intended for test isolation; subsequent queries
    /// recompute from scratch.
    pub fn clear(&self) {
        trace!(instance_id = self.instance_id, "ContextCache::clear");
        self.types.clear();
        self.contextual_types.clear();
        self.properties.clear();
        self.fields.clear();
        self.parameters.clear();
        self.generics.clear();
    }

    /// Total entries across all keyspaces.
    pub fn len(&self) -> usize {
        self.types.len()
            + self.contextual_types.len()
            + self.properties.len()
            + self.fields.len()
            + self.parameters.len()
            + self.generics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/cache_tests.rs"]
mod tests;
