//! Common types for the typectx contextual metadata crates.
//!
//! This crate provides the descriptor model that the host's own
//! introspection layer populates and hands to `typectx`:
//! - Annotation objects and retrieval seams (`Attribute`, `AttributeSource`)
//! - Type/member/method/parameter descriptors (`TypeDesc`, `PropertyDesc`, …)
//! - Raw nullability flag sequences as declared at each context
//!
//! Descriptors are deliberately dumb: they carry identity, structure and
//! declared annotations, and nothing derived. All composition (context
//! chains, flag cursors, caching) lives in the `typectx` crate.

// Annotation objects and the lookup seam the composer walks
pub mod attribute;
pub use attribute::{Attribute, AttributeSet, AttributeSource, InheritedLookupUnsupported};

// Host-supplied descriptors for types, members, methods and parameters
pub mod descriptor;
pub use descriptor::{
    AssemblyDesc, FieldDesc, MemberDesc, MethodDesc, ParameterDesc, PropertyDesc, TypeDesc,
    TypeFlags,
};
