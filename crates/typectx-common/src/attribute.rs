//! Annotation objects and the attribute retrieval seam.
//!
//! Attributes are opaque annotation objects collected from a declaration
//! context. Retrieval supports two strategies: the inherited lookup (walks
//! base declarations) and the declared-only lookup. Hosts that cannot walk
//! base declarations signal that with [`InheritedLookupUnsupported`]
//! instead of a general failure, so callers can fall back deliberately.

use thiserror::Error;

/// An annotation attached to a declaration context.
///
/// Identified by a path (e.g. `"validation.Required"`) plus ordered named
/// arguments. The library never interprets arguments; consumers match on
/// the path and read what they need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    path: String,
    args: Vec<(String, String)>,
}

impl Attribute {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Add a named argument. Arguments keep declaration order.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First argument with the given name, if any.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn args(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// The inherited attribute lookup is not available on this host.
///
/// This is the only signal that triggers the declared-only fallback;
/// it is absorbed inside the composer and never surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("inherited attribute lookup is not supported by this host")]
pub struct InheritedLookupUnsupported;

/// Attributes of one declaration context, under both retrieval strategies.
#[derive(Clone, Debug, Default)]
pub struct AttributeSet {
    declared: Vec<Attribute>,
    inherited: InheritedAttributes,
}

/// Result of the host's inherited-attribute resolution for a context.
#[derive(Clone, Debug, Default)]
enum InheritedAttributes {
    /// Nothing is visible beyond the declared set.
    #[default]
    SameAsDeclared,
    /// Full inherited set, nearest declarations first.
    Resolved(Vec<Attribute>),
    /// The host cannot walk base declarations (legacy runtime).
    Unsupported,
}

impl AttributeSet {
    pub fn declared(&self) -> &[Attribute] {
        &self.declared
    }

    pub fn inherited(&self) -> Result<&[Attribute], InheritedLookupUnsupported> {
        match &self.inherited {
            InheritedAttributes::SameAsDeclared => Ok(&self.declared),
            InheritedAttributes::Resolved(all) => Ok(all),
            InheritedAttributes::Unsupported => Err(InheritedLookupUnsupported),
        }
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.declared.push(attribute);
    }

    /// Record the host-resolved inherited set (declared + base declarations).
    pub fn set_inherited(&mut self, attributes: Vec<Attribute>) {
        self.inherited = InheritedAttributes::Resolved(attributes);
    }

    /// Mark the inherited lookup as unavailable for this context.
    pub fn set_inherited_unsupported(&mut self) {
        self.inherited = InheritedAttributes::Unsupported;
    }
}

/// A declaration context the composer can walk: a member, parameter,
/// method, type or assembly. Contexts expose their annotations under both
/// retrieval strategies plus the nullability flag sequence they declare.
pub trait AttributeSource {
    /// Attributes declared directly on this context.
    fn declared_attributes(&self) -> &[Attribute];

    /// Attributes visible through inheritance, when the host supports
    /// walking base declarations.
    fn inherited_attributes(&self) -> Result<&[Attribute], InheritedLookupUnsupported>;

    /// Nullability flag sequence declared at this context, if any.
    fn nullability_flags(&self) -> Option<&[bool]>;

    /// Short name used in trace events.
    fn context_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_args_keep_order() {
        let attr = Attribute::new("schema.Range")
            .with_arg("min", "0")
            .with_arg("max", "10");

        assert_eq!(attr.path(), "schema.Range");
        assert_eq!(attr.arg("min"), Some("0"));
        assert_eq!(attr.arg("missing"), None);
        let names: Vec<_> = attr.args().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["min", "max"]);
    }

    #[test]
    fn test_attribute_set_inherited_default_is_declared() {
        let mut set = AttributeSet::default();
        set.push(Attribute::new("a"));

        let inherited = set.inherited().expect("default lookup is supported");
        assert_eq!(inherited, set.declared());
    }

    #[test]
    fn test_attribute_set_unsupported_signal() {
        let mut set = AttributeSet::default();
        set.push(Attribute::new("a"));
        set.set_inherited_unsupported();

        assert_eq!(set.inherited(), Err(InheritedLookupUnsupported));
        assert_eq!(set.declared().len(), 1);
    }
}
