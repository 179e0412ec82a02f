//! Error types for image relocation and registry transfers
//!
//! [`RegistryError`] is what the transfer layer reports. [`RelocateError`] is the
//! error surfaced by the relocation core: contract violations, wrapped transfer
//! failures and cancellation are kept apart so callers can decide what to retry.

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelocateError>;

/// Errors raised while talking to a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Network related errors
    #[error("Network error: {0}")]
    Network(String),
    /// Unexpected registry response
    #[error("Registry error (status {status}): {message}")]
    Registry { status: u16, message: String },
    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),
    /// Manifest or blob not found at the source
    #[error("Not found: {0}")]
    NotFound(String),
    /// Pulled content does not match the pinned digest
    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
    /// Invalid reference or request
    #[error("Validation error: {0}")]
    Validation(String),
    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for RegistryError {
    fn from(err: url::ParseError) -> Self {
        RegistryError::Validation(err.to_string())
    }
}

/// Errors surfaced by the relocation core and the CLI around it
#[derive(Error, Debug)]
pub enum RelocateError {
    /// Input that violates the relocation contract; never retried
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Transfer of a single record failed, aborting the batch
    #[error("Failed to copy image {index} ({source_ref} -> {destination_ref}): {source}")]
    Transfer {
        /// 1-based position of the failing record in the batch
        index: usize,
        source_ref: String,
        destination_ref: String,
        #[source]
        source: RegistryError,
    },

    /// The caller's cancellation token fired
    #[error("Relocation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelocateError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RelocateError::Cancelled)
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, RelocateError::Transfer { .. })
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, RelocateError::ContractViolation(_))
    }
}
