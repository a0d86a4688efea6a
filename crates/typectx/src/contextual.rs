//! The contextual metadata node family.
//!
//! A contextual node describes a type as seen at one usage site: a
//! member's declared type, a parameter's type or a generic argument. It
//! carries the attribute set composed from the declaring context chain
//! and the nullability resolved from the shared flag sequence. Nodes are
//! immutable after construction and shared as `Arc`s.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use typectx_common::{Attribute, FieldDesc, MethodDesc, ParameterDesc, PropertyDesc, TypeDesc};

/// Whether a usage slot may hold null.
///
/// Plain value types are intrinsically `NotNullable`, nullable-value
/// wrappers intrinsically `Nullable`; everything else comes from the
/// declared flag sequence, defaulting to `NotNullable` when the sequence
/// is absent or too short.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Nullability {
    NotNullable,
    Nullable,
}

/// A type enriched with usage-site metadata.
pub struct ContextualType {
    ty: Arc<TypeDesc>,
    nullability: Nullability,
    attributes: Vec<Attribute>,
    generic_arguments: Vec<Arc<ContextualType>>,
    element_type: Option<Arc<ContextualType>>,
}

impl ContextualType {
    pub(crate) fn new(
        ty: Arc<TypeDesc>,
        nullability: Nullability,
        attributes: Vec<Attribute>,
        generic_arguments: Vec<Arc<ContextualType>>,
        element_type: Option<Arc<ContextualType>>,
    ) -> Self {
        Self {
            ty,
            nullability,
            attributes,
            generic_arguments,
            element_type,
        }
    }

    pub fn type_desc(&self) -> &Arc<TypeDesc> {
        &self.ty
    }

    pub fn nullability(&self) -> Nullability {
        self.nullability
    }

    pub fn is_nullable(&self) -> bool {
        self.nullability == Nullability::Nullable
    }

    /// Attributes visible at this context, nearest declarations first.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Nearest-declared attribute with the given path.
    pub fn attribute(&self, path: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.path() == path)
    }

    /// All attributes with the given path, nearest first.
    pub fn attributes_named<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Attribute> {
        self.attributes.iter().filter(move |a| a.path() == path)
    }

    /// Contextual nodes for the generic arguments, declaration order.
    pub fn generic_arguments(&self) -> &[Arc<ContextualType>] {
        &self.generic_arguments
    }

    /// Contextual node for the array element, when this is an array.
    pub fn element_type(&self) -> Option<&Arc<ContextualType>> {
        self.element_type.as_ref()
    }

    /// Human-readable name with nullability marks, e.g.
    /// `Mapping<Key, Value?>` or `Int32[]`.
    pub fn display_name(&self) -> String {
        if self.ty.is_array() {
            let element = self
                .element_type
                .as_ref()
                .map_or_else(|| "?".to_string(), |e| e.display_name());
            let suffix = if self.is_nullable() { "?" } else { "" };
            return format!("{element}[]{suffix}");
        }
        if self.ty.is_nullable_value() {
            // render the wrapper as its inner type plus a mark
            if let Some(inner) = self.generic_arguments.first() {
                return format!("{}?", inner.display_name());
            }
        }

        let mut out = String::from(self.ty.name());
        if !self.generic_arguments.is_empty() {
            out.push('<');
            for (i, arg) in self.generic_arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&arg.display_name());
            }
            out.push('>');
        }
        if self.is_nullable() && !self.ty.is_value_type() {
            out.push('?');
        }
        out
    }
}

impl fmt::Debug for ContextualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextualType({})", self.display_name())
    }
}

/// A property seen through its declaring context.
#[derive(Debug)]
pub struct ContextualPropertyInfo {
    desc: Arc<PropertyDesc>,
    ty: Arc<ContextualType>,
}

impl ContextualPropertyInfo {
    pub(crate) fn new(desc: Arc<PropertyDesc>, ty: Arc<ContextualType>) -> Self {
        Self { desc, ty }
    }

    pub fn name(&self) -> &str {
        self.desc.name()
    }

    pub fn declaring_type(&self) -> &Arc<TypeDesc> {
        self.desc.declaring()
    }

    pub fn property(&self) -> &Arc<PropertyDesc> {
        &self.desc
    }

    pub fn contextual_type(&self) -> &Arc<ContextualType> {
        &self.ty
    }

    pub fn nullability(&self) -> Nullability {
        self.ty.nullability()
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.ty.attributes()
    }
}

/// A field seen through its declaring context.
#[derive(Debug)]
pub struct ContextualFieldInfo {
    desc: Arc<FieldDesc>,
    ty: Arc<ContextualType>,
}

impl ContextualFieldInfo {
    pub(crate) fn new(desc: Arc<FieldDesc>, ty: Arc<ContextualType>) -> Self {
        Self { desc, ty }
    }

    pub fn name(&self) -> &str {
        self.desc.name()
    }

    pub fn declaring_type(&self) -> &Arc<TypeDesc> {
        self.desc.declaring()
    }

    pub fn field(&self) -> &Arc<FieldDesc> {
        &self.desc
    }

    pub fn contextual_type(&self) -> &Arc<ContextualType> {
        &self.ty
    }

    pub fn nullability(&self) -> Nullability {
        self.ty.nullability()
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.ty.attributes()
    }
}

/// A data-carrying member: property or field.
///
/// Closed set by design; method-like members are rejected with
/// [`crate::MetadataError::UnsupportedMemberKind`] at dispatch instead of
/// growing this union.
#[derive(Clone, Debug)]
pub enum ContextualMemberInfo {
    Property(Arc<ContextualPropertyInfo>),
    Field(Arc<ContextualFieldInfo>),
}

impl ContextualMemberInfo {
    pub fn name(&self) -> &str {
        match self {
            ContextualMemberInfo::Property(p) => p.name(),
            ContextualMemberInfo::Field(f) => f.name(),
        }
    }

    pub fn declaring_type(&self) -> &Arc<TypeDesc> {
        match self {
            ContextualMemberInfo::Property(p) => p.declaring_type(),
            ContextualMemberInfo::Field(f) => f.declaring_type(),
        }
    }

    pub fn contextual_type(&self) -> &Arc<ContextualType> {
        match self {
            ContextualMemberInfo::Property(p) => p.contextual_type(),
            ContextualMemberInfo::Field(f) => f.contextual_type(),
        }
    }

    pub fn nullability(&self) -> Nullability {
        self.contextual_type().nullability()
    }
}

/// A parameter seen through its owning method's context.
#[derive(Debug)]
pub struct ContextualParameterInfo {
    desc: Arc<ParameterDesc>,
    method: Arc<MethodDesc>,
    ty: Arc<ContextualType>,
}

impl ContextualParameterInfo {
    pub(crate) fn new(
        desc: Arc<ParameterDesc>,
        method: Arc<MethodDesc>,
        ty: Arc<ContextualType>,
    ) -> Self {
        Self { desc, method, ty }
    }

    pub fn name(&self) -> &str {
        self.desc.name()
    }

    pub fn position(&self) -> usize {
        self.desc.position()
    }

    pub fn parameter(&self) -> &Arc<ParameterDesc> {
        &self.desc
    }

    /// The method this parameter belongs to.
    pub fn method(&self) -> &Arc<MethodDesc> {
        &self.method
    }

    pub fn contextual_type(&self) -> &Arc<ContextualType> {
        &self.ty
    }

    pub fn nullability(&self) -> Nullability {
        self.ty.nullability()
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.ty.attributes()
    }
}

/// A method generic argument seen through the method's context.
#[derive(Debug)]
pub struct ContextualGenericInfo {
    method: Arc<MethodDesc>,
    position: usize,
    ty: Arc<ContextualType>,
    name: OnceCell<String>,
}

impl ContextualGenericInfo {
    pub(crate) fn new(method: Arc<MethodDesc>, position: usize, ty: Arc<ContextualType>) -> Self {
        Self {
            method,
            position,
            ty,
            name: OnceCell::new(),
        }
    }

    /// Display name, computed on first access and memoized per node.
    pub fn name(&self) -> &str {
        self.name.get_or_init(|| self.ty.display_name())
    }

    pub fn method(&self) -> &Arc<MethodDesc> {
        &self.method
    }

    /// Zero-based position among the method's generic arguments.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn contextual_type(&self) -> &Arc<ContextualType> {
        &self.ty
    }

    pub fn nullability(&self) -> Nullability {
        self.ty.nullability()
    }
}

#[cfg(test)]
#[path = "../tests/contextual_tests.rs"]
mod tests;
