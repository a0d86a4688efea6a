//! Contextual Type Metadata Cache
//!
//! This crate turns raw host descriptors (`typectx-common`) into enriched,
//! memoized metadata nodes for serializers, validators and schema
//! generators. It provides:
//!
//! - **Type keys**: deterministic string identity for closed types
//! - **Cached type wrappers**: identity-only, one per distinct key
//! - **Contextual nodes**: a type as seen at a usage site, with its
//!   composed attribute set and resolved nullability
//! - **Context chain composition**: member → declaring type → enclosing
//!   types → assembly, threading one cursor through a shared nullability
//!   flag sequence, depth-first left-to-right
//! - **`ContextCache`**: an explicitly owned concurrent memoization
//!   service with atomic compute-if-absent per key
//!
//! Key benefits:
//! - Expensive composition runs once per distinct entity
//! - Nodes are immutable and safe to share across threads
//! - Cache lifetimes are owned by the caller, so tests stay isolated

mod cache;
mod cached;
mod compose;
mod contextual;
mod error;
mod key;

pub use cache::ContextCache;
pub use cached::CachedType;
pub use contextual::{
    ContextualFieldInfo, ContextualGenericInfo, ContextualMemberInfo, ContextualParameterInfo,
    ContextualPropertyInfo, ContextualType, Nullability,
};
pub use error::MetadataError;
pub use key::{TypeKey, method_key, type_key};

pub use typectx_common::{
    AssemblyDesc, Attribute, AttributeSet, AttributeSource, FieldDesc, InheritedLookupUnsupported,
    MemberDesc, MethodDesc, ParameterDesc, PropertyDesc, TypeDesc, TypeFlags,
};
