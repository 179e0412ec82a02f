//! SHA256 digest utilities
//!
//! Centralized helpers for computing, validating and formatting the
//! `sha256:<hex>` digests that pin image content in a registry.

use crate::error::RegistryError;
use sha2::Digest;

/// Algorithm prefix of every content digest handled here
pub const SHA256_PREFIX: &str = "sha256:";

/// Utilities for working with SHA256 digests in registry context
pub struct DigestUtils;

impl DigestUtils {
    /// Compute SHA256 digest from byte data as lowercase hex
    pub fn compute_sha256(data: &[u8]) -> String {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Compute full registry digest (with sha256: prefix) from byte data
    pub fn compute_docker_digest(data: &[u8]) -> String {
        format!("{}{}", SHA256_PREFIX, Self::compute_sha256(data))
    }

    /// Validate SHA256 hex string (64 characters, all lowercase hex)
    pub fn is_valid_sha256_hex(digest: &str) -> bool {
        digest.len() == 64
            && digest
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    /// Validate full registry digest format (sha256:xxxxx)
    pub fn is_valid_docker_digest(digest: &str) -> bool {
        digest
            .strip_prefix(SHA256_PREFIX)
            .is_some_and(Self::is_valid_sha256_hex)
    }

    /// Extract SHA256 hex part from full registry digest
    pub fn extract_hex_part(digest: &str) -> Result<&str, RegistryError> {
        match digest.strip_prefix(SHA256_PREFIX) {
            Some(hex_part) if Self::is_valid_sha256_hex(hex_part) => Ok(hex_part),
            Some(_) => Err(RegistryError::Validation(format!(
                "Invalid SHA256 hex part in digest: {}",
                digest
            ))),
            None => Err(RegistryError::Validation(format!(
                "Unsupported digest algorithm (expected sha256): {}",
                digest
            ))),
        }
    }

    /// Verify data matches expected digest
    pub fn verify_data_integrity(data: &[u8], expected_digest: &str) -> Result<(), RegistryError> {
        let expected_hex = Self::extract_hex_part(expected_digest)?;
        let computed = Self::compute_sha256(data);

        if computed != expected_hex {
            return Err(RegistryError::DigestMismatch {
                expected: expected_digest.to_string(),
                actual: format!("{}{}", SHA256_PREFIX, computed),
            });
        }
        Ok(())
    }

    /// Format digest for display (truncated for readability)
    pub fn format_digest_short(digest: &str) -> String {
        if digest.len() > 19 {
            format!("{}...", &digest[..19])
        } else {
            digest.to_string()
        }
    }
}
