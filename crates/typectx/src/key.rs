//! Deterministic string identity for types and methods.
//!
//! Keys are the root of every cache key: equal descriptors yield equal
//! keys, distinct instantiations, nesting chains and arrays yield distinct
//! keys. Types containing an open generic parameter anywhere in their
//! graph have no stable identity and yield `None`; callers bypass the
//! cache for those.

use std::fmt;

use typectx_common::{MethodDesc, TypeDesc};

/// Interned-string identity of a closed type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the identity key for a type, or `None` if the type graph
/// contains an open generic parameter.
pub fn type_key(ty: &TypeDesc) -> Option<TypeKey> {
    if contains_type_param(ty) {
        return None;
    }
    let mut out = String::new();
    write_key(ty, &mut out);
    Some(TypeKey(out))
}

/// Identity key for a method: declaring-type key, name and the keys of
/// every parameter type, so overloads never collide. `None` when the
/// declaring type or any parameter type is open.
pub fn method_key(method: &MethodDesc) -> Option<String> {
    let declaring = type_key(method.declaring())?;
    let mut out = format!("{declaring}::{}", method.name());
    out.push('(');
    for (i, parameter) in method.parameters().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let key = type_key(parameter.ty())?;
        out.push_str(key.as_str());
    }
    out.push(')');
    Some(out)
}

pub(crate) fn contains_type_param(ty: &TypeDesc) -> bool {
    if ty.is_type_param() {
        return true;
    }
    if let Some(element) = ty.element()
        && contains_type_param(element)
    {
        return true;
    }
    ty.generic_args().iter().any(|arg| contains_type_param(arg))
}

fn write_key(ty: &TypeDesc, out: &mut String) {
    if ty.is_array() {
        if let Some(element) = ty.element() {
            write_key(element, out);
        }
        out.push_str("[]");
        return;
    }

    if let Some(assembly) = ty.assembly() {
        out.push_str(assembly.name());
        out.push('|');
    }
    if let Some(namespace) = ty.namespace() {
        out.push_str(namespace);
        out.push('.');
    }

    // nesting chain, outermost first, joined with '+'
    let mut chain = Vec::new();
    let mut current = ty;
    while let Some(enclosing) = current.enclosing() {
        chain.push(enclosing.name());
        current = enclosing.as_ref();
    }
    for name in chain.iter().rev() {
        out.push_str(name);
        out.push('+');
    }
    out.push_str(ty.name());

    if !ty.generic_args().is_empty() {
        out.push('<');
        for (i, arg) in ty.generic_args().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_key(arg, out);
        }
        out.push('>');
    }
}

#[cfg(test)]
#[path = "../tests/key_tests.rs"]
mod tests;
