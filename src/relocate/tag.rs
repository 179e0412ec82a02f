//! Deterministic destination tags
//!
//! A relocated tag is `prefix + hex(sha256(name ":" tag))`. It depends on the
//! original name and tag only, so every relocation of the same image lands on
//! the same destination tag.

use crate::error::{RelocateError, Result};
use crate::image::reference::{MAX_TAG_LENGTH, is_valid_tag};
use sha2::{Digest, Sha256};

/// Prefix marking a tag as machine-generated by relocation
pub const DEFAULT_TAG_PREFIX: &str = "app.";

/// Length of a hex-encoded SHA-256 digest
pub const HASH_HEX_LENGTH: usize = 64;

/// Never part of a tag; in names only as a registry port separator
const SEPARATOR: u8 = b':';

/// Derive the destination tag for `(name, tag)` under `prefix`.
///
/// Pure: a fresh hasher is built per call, no state is shared between callers.
pub fn derive_tag(prefix: &str, name: &str, tag: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([SEPARATOR]);
    hasher.update(tag.as_bytes());

    let mut derived = String::with_capacity(prefix.len() + HASH_HEX_LENGTH);
    derived.push_str(prefix);
    derived.push_str(&hex::encode(hasher.finalize()));
    derived
}

/// Validate a tag prefix: the derived tag must remain a valid registry tag
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() + HASH_HEX_LENGTH > MAX_TAG_LENGTH {
        return Err(RelocateError::ContractViolation(format!(
            "Tag prefix '{}' is {} characters; at most {} fit before the {}-character hash",
            prefix,
            prefix.len(),
            MAX_TAG_LENGTH - HASH_HEX_LENGTH,
            HASH_HEX_LENGTH
        )));
    }
    // A prefix followed by hex must still form a tag
    let sample = format!("{}0", prefix);
    if !is_valid_tag(&sample) {
        return Err(RelocateError::ContractViolation(format!(
            "Tag prefix '{}' contains characters not allowed in a tag",
            prefix
        )));
    }
    Ok(())
}

/// Tag deriver bound to a validated prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDeriver {
    prefix: String,
}

impl TagDeriver {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn derive(&self, name: &str, tag: &str) -> String {
        derive_tag(&self.prefix, name, tag)
    }
}

impl Default for TagDeriver {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }
}
