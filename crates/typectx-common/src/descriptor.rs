//! Host-supplied descriptors for assemblies, types, members, methods and
//! parameters.
//!
//! The host's introspection layer builds these once and shares them as
//! `Arc`s; descriptors are immutable after construction except for the
//! member list of a type, which the host attaches once after the type
//! exists (members back-reference their declaring type, so the two sides
//! cannot be built in a single expression).
//!
//! Because of that back-reference the descriptor graph is cyclic; member
//! `Debug` impls are manual and shallow so formatting terminates.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use once_cell::sync::OnceCell;

use crate::attribute::{Attribute, AttributeSet, AttributeSource, InheritedLookupUnsupported};

bitflags! {
    /// Structural classification of a type descriptor.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// Value semantics: never null unless wrapped in a nullable-value type.
        const VALUE_TYPE = 1 << 0;
        /// Nullable-value wrapper around a value type; always nullable.
        const NULLABLE_VALUE = 1 << 1;
        /// Array type; the element lives in `element`, not `generic_args`.
        const ARRAY = 1 << 2;
        /// Open generic parameter (`T`); has no stable identity.
        const TYPE_PARAM = 1 << 3;
    }
}

// =============================================================================
// AssemblyDesc
// =============================================================================

/// The outermost declaration context: an assembly (compilation unit).
#[derive(Debug)]
pub struct AssemblyDesc {
    name: String,
    attributes: AttributeSet,
    nullability: Option<Vec<bool>>,
}

impl AssemblyDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeSet::default(),
            nullability: None,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Assembly-wide default nullability flag sequence.
    pub fn with_nullability(mut self, flags: Vec<bool>) -> Self {
        self.nullability = Some(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl AttributeSource for AssemblyDesc {
    fn declared_attributes(&self) -> &[Attribute] {
        self.attributes.declared()
    }

    fn inherited_attributes(&self) -> Result<&[Attribute], InheritedLookupUnsupported> {
        self.attributes.inherited()
    }

    fn nullability_flags(&self) -> Option<&[bool]> {
        self.nullability.as_deref()
    }

    fn context_name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// TypeDesc
// =============================================================================

/// A raw type handle: identity and structure, no derived metadata.
pub struct TypeDesc {
    name: String,
    namespace: Option<String>,
    assembly: Option<Arc<AssemblyDesc>>,
    flags: TypeFlags,
    generic_args: Vec<Arc<TypeDesc>>,
    element: Option<Arc<TypeDesc>>,
    enclosing: Option<Arc<TypeDesc>>,
    attributes: AttributeSet,
    nullability: Option<Vec<bool>>,
    members: OnceCell<Vec<MemberDesc>>,
}

impl TypeDesc {
    /// A reference type (class-like).
    pub fn class(name: impl Into<String>, assembly: &Arc<AssemblyDesc>) -> Self {
        Self::with_flags(name, Some(assembly.clone()), TypeFlags::empty())
    }

    /// A plain value type (struct-like). Intrinsically non-nullable.
    pub fn value_type(name: impl Into<String>, assembly: &Arc<AssemblyDesc>) -> Self {
        Self::with_flags(name, Some(assembly.clone()), TypeFlags::VALUE_TYPE)
    }

    /// An open generic parameter such as `T`. Carries no assembly and is
    /// excluded from every cache.
    pub fn type_param(name: impl Into<String>) -> Self {
        Self::with_flags(name, None, TypeFlags::TYPE_PARAM)
    }

    /// An array of `element`.
    pub fn array(element: &Arc<TypeDesc>) -> Self {
        let mut desc = Self::with_flags(
            format!("{}[]", element.name),
            element.assembly.clone(),
            TypeFlags::ARRAY,
        );
        desc.element = Some(element.clone());
        desc
    }

    /// A nullable-value wrapper around `inner` (e.g. `Option<i32>`-shaped
    /// host types). Intrinsically nullable.
    pub fn nullable_value(inner: &Arc<TypeDesc>) -> Self {
        let mut desc = Self::with_flags(
            "Nullable",
            inner.assembly.clone(),
            TypeFlags::VALUE_TYPE | TypeFlags::NULLABLE_VALUE,
        );
        desc.generic_args = vec![inner.clone()];
        desc
    }

    fn with_flags(
        name: impl Into<String>,
        assembly: Option<Arc<AssemblyDesc>>,
        flags: TypeFlags,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            assembly,
            flags,
            generic_args: Vec::new(),
            element: None,
            enclosing: None,
            attributes: AttributeSet::default(),
            nullability: None,
            members: OnceCell::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Close a generic type over the given arguments, declaration order.
    pub fn with_generic_args(mut self, args: Vec<Arc<TypeDesc>>) -> Self {
        self.generic_args = args;
        self
    }

    /// Record the directly enclosing (nesting) type. Deeper nesting is
    /// expressed by the enclosing type's own `enclosing` link.
    pub fn with_enclosing(mut self, enclosing: &Arc<TypeDesc>) -> Self {
        self.enclosing = Some(enclosing.clone());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_inherited_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes.set_inherited(attributes);
        self
    }

    pub fn with_inherited_unsupported(mut self) -> Self {
        self.attributes.set_inherited_unsupported();
        self
    }

    /// Nullability flag sequence declared at this type.
    pub fn with_nullability(mut self, flags: Vec<bool>) -> Self {
        self.nullability = Some(flags);
        self
    }

    /// Attach the host-enumerated member list. Members back-reference the
    /// declaring type, so this runs after the type is wrapped in an `Arc`.
    /// At most one attachment takes effect; later calls are ignored.
    pub fn attach_members(&self, members: Vec<MemberDesc>) {
        let _ = self.members.set(members);
    }

    /// Members attached by the host; empty until `attach_members` runs.
    pub fn members(&self) -> &[MemberDesc] {
        self.members.get().map_or(&[], Vec::as_slice)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn assembly(&self) -> Option<&Arc<AssemblyDesc>> {
        self.assembly.as_ref()
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn is_value_type(&self) -> bool {
        self.flags.contains(TypeFlags::VALUE_TYPE)
    }

    pub fn is_nullable_value(&self) -> bool {
        self.flags.contains(TypeFlags::NULLABLE_VALUE)
    }

    pub fn is_array(&self) -> bool {
        self.flags.contains(TypeFlags::ARRAY)
    }

    pub fn is_type_param(&self) -> bool {
        self.flags.contains(TypeFlags::TYPE_PARAM)
    }

    pub fn generic_args(&self) -> &[Arc<TypeDesc>] {
        &self.generic_args
    }

    pub fn element(&self) -> Option<&Arc<TypeDesc>> {
        self.element.as_ref()
    }

    pub fn enclosing(&self) -> Option<&Arc<TypeDesc>> {
        self.enclosing.as_ref()
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDesc")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("flags", &self.flags)
            .field("generic_args", &self.generic_args)
            .finish_non_exhaustive()
    }
}

impl AttributeSource for TypeDesc {
    fn declared_attributes(&self) -> &[Attribute] {
        self.attributes.declared()
    }

    fn inherited_attributes(&self) -> Result<&[Attribute], InheritedLookupUnsupported> {
        self.attributes.inherited()
    }

    fn nullability_flags(&self) -> Option<&[bool]> {
        self.nullability.as_deref()
    }

    fn context_name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// PropertyDesc / FieldDesc
// =============================================================================

/// A property handle: name, declared type and declaring type.
pub struct PropertyDesc {
    name: String,
    ty: Arc<TypeDesc>,
    declaring: Arc<TypeDesc>,
    attributes: AttributeSet,
    nullability: Option<Vec<bool>>,
}

impl PropertyDesc {
    pub fn new(name: impl Into<String>, ty: &Arc<TypeDesc>, declaring: &Arc<TypeDesc>) -> Self {
        Self {
            name: name.into(),
            ty: ty.clone(),
            declaring: declaring.clone(),
            attributes: AttributeSet::default(),
            nullability: None,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_inherited_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes.set_inherited(attributes);
        self
    }

    pub fn with_inherited_unsupported(mut self) -> Self {
        self.attributes.set_inherited_unsupported();
        self
    }

    pub fn with_nullability(mut self, flags: Vec<bool>) -> Self {
        self.nullability = Some(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Arc<TypeDesc> {
        &self.ty
    }

    pub fn declaring(&self) -> &Arc<TypeDesc> {
        &self.declaring
    }
}

impl fmt::Debug for PropertyDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyDesc({}.{})", self.declaring.name(), self.name)
    }
}

impl AttributeSource for PropertyDesc {
    fn declared_attributes(&self) -> &[Attribute] {
        self.attributes.declared()
    }

    fn inherited_attributes(&self) -> Result<&[Attribute], InheritedLookupUnsupported> {
        self.attributes.inherited()
    }

    fn nullability_flags(&self) -> Option<&[bool]> {
        self.nullability.as_deref()
    }

    fn context_name(&self) -> &str {
        &self.name
    }
}

/// A field handle. Same shape as a property; kept distinct because the
/// contextual layer exposes the two as separate node kinds.
pub struct FieldDesc {
    name: String,
    ty: Arc<TypeDesc>,
    declaring: Arc<TypeDesc>,
    attributes: AttributeSet,
    nullability: Option<Vec<bool>>,
}

impl FieldDesc {
    pub fn new(name: impl Into<String>, ty: &Arc<TypeDesc>, declaring: &Arc<TypeDesc>) -> Self {
        Self {
            name: name.into(),
            ty: ty.clone(),
            declaring: declaring.clone(),
            attributes: AttributeSet::default(),
            nullability: None,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_inherited_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes.set_inherited(attributes);
        self
    }

    pub fn with_inherited_unsupported(mut self) -> Self {
        self.attributes.set_inherited_unsupported();
        self
    }

    pub fn with_nullability(mut self, flags: Vec<bool>) -> Self {
        self.nullability = Some(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Arc<TypeDesc> {
        &self.ty
    }

    pub fn declaring(&self) -> &Arc<TypeDesc> {
        &self.declaring
    }
}

impl fmt::Debug for FieldDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldDesc({}.{})", self.declaring.name(), self.name)
    }
}

impl AttributeSource for FieldDesc {
    fn declared_attributes(&self) -> &[Attribute] {
        self.attributes.declared()
    }

    fn inherited_attributes(&self) -> Result<&[Attribute], InheritedLookupUnsupported> {
        self.attributes.inherited()
    }

    fn nullability_flags(&self) -> Option<&[bool]> {
        self.nullability.as_deref()
    }

    fn context_name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// MethodDesc / ParameterDesc
// =============================================================================

/// A method handle: identity, parameters and generic arguments.
///
/// Methods are not data-carrying members and have no contextual node of
/// their own; they appear as the owning context of parameters and generic
/// arguments, and as the unsupported case of member dispatch.
pub struct MethodDesc {
    name: String,
    declaring: Arc<TypeDesc>,
    parameters: Vec<Arc<ParameterDesc>>,
    generic_args: Vec<Arc<TypeDesc>>,
    attributes: AttributeSet,
    nullability: Option<Vec<bool>>,
}

impl MethodDesc {
    pub fn new(name: impl Into<String>, declaring: &Arc<TypeDesc>) -> Self {
        Self {
            name: name.into(),
            declaring: declaring.clone(),
            parameters: Vec::new(),
            generic_args: Vec::new(),
            attributes: AttributeSet::default(),
            nullability: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Arc<ParameterDesc>>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_generic_args(mut self, args: Vec<Arc<TypeDesc>>) -> Self {
        self.generic_args = args;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_inherited_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes.set_inherited(attributes);
        self
    }

    pub fn with_inherited_unsupported(mut self) -> Self {
        self.attributes.set_inherited_unsupported();
        self
    }

    /// Method-level nullability flag sequence, shared by all parameters
    /// and generic arguments that do not declare their own.
    pub fn with_nullability(mut self, flags: Vec<bool>) -> Self {
        self.nullability = Some(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring(&self) -> &Arc<TypeDesc> {
        &self.declaring
    }

    pub fn parameters(&self) -> &[Arc<ParameterDesc>] {
        &self.parameters
    }

    pub fn generic_args(&self) -> &[Arc<TypeDesc>] {
        &self.generic_args
    }
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MethodDesc({}.{}/{})",
            self.declaring.name(),
            self.name,
            self.parameters.len()
        )
    }
}

impl AttributeSource for MethodDesc {
    fn declared_attributes(&self) -> &[Attribute] {
        self.attributes.declared()
    }

    fn inherited_attributes(&self) -> Result<&[Attribute], InheritedLookupUnsupported> {
        self.attributes.inherited()
    }

    fn nullability_flags(&self) -> Option<&[bool]> {
        self.nullability.as_deref()
    }

    fn context_name(&self) -> &str {
        &self.name
    }
}

/// A parameter handle: name, zero-based position and declared type.
pub struct ParameterDesc {
    name: String,
    position: usize,
    ty: Arc<TypeDesc>,
    attributes: AttributeSet,
    nullability: Option<Vec<bool>>,
}

impl ParameterDesc {
    pub fn new(name: impl Into<String>, position: usize, ty: &Arc<TypeDesc>) -> Self {
        Self {
            name: name.into(),
            position,
            ty: ty.clone(),
            attributes: AttributeSet::default(),
            nullability: None,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_inherited_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes.set_inherited(attributes);
        self
    }

    pub fn with_inherited_unsupported(mut self) -> Self {
        self.attributes.set_inherited_unsupported();
        self
    }

    pub fn with_nullability(mut self, flags: Vec<bool>) -> Self {
        self.nullability = Some(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn ty(&self) -> &Arc<TypeDesc> {
        &self.ty
    }
}

impl fmt::Debug for ParameterDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterDesc(#{} {})", self.position, self.name)
    }
}

impl AttributeSource for ParameterDesc {
    fn declared_attributes(&self) -> &[Attribute] {
        self.attributes.declared()
    }

    fn inherited_attributes(&self) -> Result<&[Attribute], InheritedLookupUnsupported> {
        self.attributes.inherited()
    }

    fn nullability_flags(&self) -> Option<&[bool]> {
        self.nullability.as_deref()
    }

    fn context_name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// MemberDesc
// =============================================================================

/// A member of a type, as enumerated by the host.
///
/// Closed set: contextual dispatch matches exhaustively and treats
/// `Method` as the unsupported kind (methods carry no data slot).
#[derive(Clone)]
pub enum MemberDesc {
    Property(Arc<PropertyDesc>),
    Field(Arc<FieldDesc>),
    Method(Arc<MethodDesc>),
}

impl MemberDesc {
    pub fn name(&self) -> &str {
        match self {
            MemberDesc::Property(p) => p.name(),
            MemberDesc::Field(f) => f.name(),
            MemberDesc::Method(m) => m.name(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MemberDesc::Property(_) => "property",
            MemberDesc::Field(_) => "field",
            MemberDesc::Method(_) => "method",
        }
    }
}

impl fmt::Debug for MemberDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberDesc::{}({})", self.kind(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembly() -> Arc<AssemblyDesc> {
        Arc::new(AssemblyDesc::new("test.assembly"))
    }

    #[test]
    fn test_type_flags_classification() {
        let asm = assembly();
        let int = Arc::new(TypeDesc::value_type("Int32", &asm));
        let opt = Arc::new(TypeDesc::nullable_value(&int));
        let arr = Arc::new(TypeDesc::array(&int));
        let param = Arc::new(TypeDesc::type_param("T"));

        assert!(int.is_value_type() && !int.is_nullable_value());
        assert!(opt.is_value_type() && opt.is_nullable_value());
        assert_eq!(opt.generic_args().len(), 1);
        assert!(arr.is_array());
        assert_eq!(arr.element().map(|e| e.name()), Some("Int32"));
        assert_eq!(arr.name(), "Int32[]");
        assert!(param.is_type_param());
        assert!(param.assembly().is_none());
    }

    #[test]
    fn test_attach_members_is_write_once() {
        let asm = assembly();
        let ty = Arc::new(TypeDesc::class("Person", &asm));
        let name_ty = Arc::new(TypeDesc::class("String", &asm));

        assert!(ty.members().is_empty());

        let prop = Arc::new(PropertyDesc::new("Name", &name_ty, &ty));
        ty.attach_members(vec![MemberDesc::Property(prop)]);
        assert_eq!(ty.members().len(), 1);

        // second attachment is ignored
        ty.attach_members(Vec::new());
        assert_eq!(ty.members().len(), 1);
    }

    #[test]
    fn test_debug_is_shallow_on_cyclic_graph() {
        let asm = assembly();
        let ty = Arc::new(TypeDesc::class("Node", &asm));
        let prop = Arc::new(PropertyDesc::new("Next", &ty, &ty));
        ty.attach_members(vec![MemberDesc::Property(prop)]);

        // must terminate despite the member -> declaring type cycle
        let rendered = format!("{:?}", ty.members()[0]);
        assert_eq!(rendered, "MemberDesc::property(Next)");
    }
}
