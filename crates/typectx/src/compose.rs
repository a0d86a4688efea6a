//! Context chain composition and the nullability flag cursor.
//!
//! This is the core algorithm. A declaration site (member, parameter,
//! method) carries at most one nullability flag sequence covering every
//! slot of its type graph. Construction walks that graph depth-first,
//! left-to-right, consuming the sequence through a single cursor so
//! sibling and nested constructions never collide or skip positions.
//!
//! The context chain orders the annotation sources:
//! member/parameter → owning method (for parameters and generics) →
//! declaring type → each enclosing type outward → assembly.
//! Nullability resolution short-circuits on the first context declaring a
//! non-empty sequence; attribute composition accumulates across all
//! contexts, nearest first.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;
use typectx_common::{
    Attribute, AttributeSource, FieldDesc, MethodDesc, ParameterDesc, PropertyDesc, TypeDesc,
};

use crate::contextual::{ContextualType, Nullability};

/// Single-pass cursor over a resolved flag sequence.
///
/// Owns the sequence slice and the current index; borrowed mutably into
/// each recursive construction step. Construction-local: never shared
/// across threads or reused between passes.
pub(crate) struct NullabilityCursor<'a> {
    flags: &'a [bool],
    index: usize,
}

impl<'a> NullabilityCursor<'a> {
    pub(crate) fn new(flags: &'a [bool]) -> Self {
        Self { flags, index: 0 }
    }

    /// Consume one slot. Positions past the end of the sequence read as
    /// non-nullable; a short or absent sequence is not an error.
    fn next(&mut self) -> Nullability {
        let flag = self.flags.get(self.index).copied().unwrap_or(false);
        self.index += 1;
        if flag {
            Nullability::Nullable
        } else {
            Nullability::NotNullable
        }
    }

    #[cfg(test)]
    pub(crate) fn consumed(&self) -> usize {
        self.index
    }
}

/// Ordered annotation sources for one declaration site, nearest first.
pub(crate) type ContextChain<'a> = SmallVec<[&'a dyn AttributeSource; 6]>;

fn push_type_contexts<'a>(ty: &'a Arc<TypeDesc>, chain: &mut ContextChain<'a>) {
    chain.push(ty.as_ref());
    // full enclosing chain, not just one level
    let mut current: &TypeDesc = ty;
    while let Some(enclosing) = current.enclosing() {
        chain.push(enclosing.as_ref());
        current = enclosing.as_ref();
    }
    if let Some(assembly) = ty.assembly() {
        chain.push(assembly.as_ref());
    }
}

/// Chain for a property or field: member, declaring type and outward.
pub(crate) fn member_chain<'a>(
    member: &'a dyn AttributeSource,
    declaring: &'a Arc<TypeDesc>,
) -> ContextChain<'a> {
    let mut chain = ContextChain::new();
    chain.push(member);
    push_type_contexts(declaring, &mut chain);
    chain
}

/// Chain for a bare type usage: the type itself and outward.
pub(crate) fn type_chain(ty: &Arc<TypeDesc>) -> ContextChain<'_> {
    let mut chain = ContextChain::new();
    push_type_contexts(ty, &mut chain);
    chain
}

/// Chain for a parameter: the parameter, its method, then the method's
/// declaring type standing in for the member level.
pub(crate) fn parameter_chain<'a>(
    parameter: &'a ParameterDesc,
    method: &'a Arc<MethodDesc>,
) -> ContextChain<'a> {
    let mut chain = ContextChain::new();
    chain.push(parameter as &dyn AttributeSource);
    chain.push(method.as_ref());
    push_type_contexts(method.declaring(), &mut chain);
    chain
}

/// Chain for a method generic argument: the method substitutes the member
/// level, then its declaring type's chain.
pub(crate) fn generic_chain(method: &Arc<MethodDesc>) -> ContextChain<'_> {
    let mut chain = ContextChain::new();
    chain.push(method.as_ref() as &dyn AttributeSource);
    push_type_contexts(method.declaring(), &mut chain);
    chain
}

/// First context declaring a non-empty flag sequence wins; absence means
/// flag-free, i.e. every slot non-nullable.
pub(crate) fn resolve_flag_sequence<'a>(chain: &ContextChain<'a>) -> &'a [bool] {
    for context in chain {
        if let Some(flags) = context.nullability_flags()
            && !flags.is_empty()
        {
            trace!(
                context = context.context_name(),
                slots = flags.len(),
                "nullability flag sequence resolved"
            );
            return flags;
        }
    }
    &[]
}

/// Accumulate attributes across the whole chain, nearest contexts first.
///
/// Per context the inherited lookup is tried first; the explicit
/// unsupported signal downgrades to the declared-only lookup and is never
/// surfaced. Any other outcome passes through untouched.
pub(crate) fn compose_attributes(chain: &ContextChain<'_>) -> Vec<Attribute> {
    let mut composed = Vec::new();
    for context in chain {
        let attributes = match context.inherited_attributes() {
            Ok(attributes) => attributes,
            Err(unsupported) => {
                trace!(
                    context = context.context_name(),
                    %unsupported,
                    "falling back to declared-only attribute lookup"
                );
                context.declared_attributes()
            }
        };
        composed.extend_from_slice(attributes);
    }
    composed
}

/// Build the node tree for `ty`, consuming flags through `cursor`.
///
/// Slot rule: reference types, type parameters and arrays consume one
/// flag; plain value types are intrinsically non-nullable and nullable
/// wrappers intrinsically nullable, neither consuming a slot. Generic
/// arguments are visited in declaration order, then the array element,
/// all through the same cursor.
pub(crate) fn build_contextual_type(
    ty: &Arc<TypeDesc>,
    cursor: &mut NullabilityCursor<'_>,
    attributes: Vec<Attribute>,
) -> ContextualType {
    let nullability = if ty.is_nullable_value() {
        Nullability::Nullable
    } else if ty.is_value_type() {
        Nullability::NotNullable
    } else {
        cursor.next()
    };

    let generic_arguments = ty
        .generic_args()
        .iter()
        .map(|arg| Arc::new(build_contextual_type(arg, cursor, Vec::new())))
        .collect();
    let element_type = ty
        .element()
        .map(|element| Arc::new(build_contextual_type(element, cursor, Vec::new())));

    ContextualType::new(
        ty.clone(),
        nullability,
        attributes,
        generic_arguments,
        element_type,
    )
}

/// One full composition pass for a declaration site.
pub(crate) fn compose(ty: &Arc<TypeDesc>, chain: &ContextChain<'_>) -> ContextualType {
    let flags = resolve_flag_sequence(chain);
    let attributes = compose_attributes(chain);
    let mut cursor = NullabilityCursor::new(flags);
    build_contextual_type(ty, &mut cursor, attributes)
}

/// Composition pass with caller-supplied ad-hoc attributes prepended to
/// the composed set. Used by uncached construction only.
pub(crate) fn compose_with_supplied(
    ty: &Arc<TypeDesc>,
    chain: &ContextChain<'_>,
    supplied: Vec<Attribute>,
) -> ContextualType {
    let flags = resolve_flag_sequence(chain);
    let mut attributes = supplied;
    attributes.extend(compose_attributes(chain));
    let mut cursor = NullabilityCursor::new(flags);
    build_contextual_type(ty, &mut cursor, attributes)
}

pub(crate) fn build_property(property: &Arc<PropertyDesc>) -> ContextualType {
    let chain = member_chain(property.as_ref(), property.declaring());
    compose(property.ty(), &chain)
}

pub(crate) fn build_field(field: &Arc<FieldDesc>) -> ContextualType {
    let chain = member_chain(field.as_ref(), field.declaring());
    compose(field.ty(), &chain)
}

pub(crate) fn build_parameter(
    parameter: &Arc<ParameterDesc>,
    method: &Arc<MethodDesc>,
) -> ContextualType {
    let chain = parameter_chain(parameter, method);
    compose(parameter.ty(), &chain)
}

pub(crate) fn build_generic(argument: &Arc<TypeDesc>, method: &Arc<MethodDesc>) -> ContextualType {
    let chain = generic_chain(method);
    compose(argument, &chain)
}

#[cfg(test)]
#[path = "../tests/compose_tests.rs"]
mod tests;
