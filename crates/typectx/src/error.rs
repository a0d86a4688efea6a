//! Error taxonomy for contextual metadata queries.
//!
//! Only genuinely unsupported requests surface as errors; malformed
//! nullability metadata and legacy attribute-lookup failures are absorbed
//! with conservative fallbacks so queries stay total over valid handles.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// Member dispatch was given a member that carries no data slot.
    /// Fatal to that call only; nothing is inserted into the cache.
    #[error("unsupported member kind `{kind}` for `{name}`: only properties and fields have a contextual representation")]
    UnsupportedMemberKind { name: String, kind: &'static str },
}
