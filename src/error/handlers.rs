//! Standardized mapping of registry HTTP failures to [`RegistryError`]

use crate::error::RegistryError;
use reqwest::StatusCode;

/// Standard error handler for registry HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Map a failed registry response to an error, keeping the registry's own message
    pub fn handle_registry_error(
        status: StatusCode,
        error_text: &str,
        operation: &str,
    ) -> RegistryError {
        match status.as_u16() {
            401 => RegistryError::Auth(format!(
                "Unauthorized to perform {}: {}",
                operation, error_text
            )),
            403 => RegistryError::Auth(format!(
                "Forbidden: insufficient permissions for {}: {}",
                operation, error_text
            )),
            404 => RegistryError::NotFound(format!("{}: {}", operation, error_text)),
            400 if error_text.contains("DIGEST_INVALID") => RegistryError::Registry {
                status: 400,
                message: format!(
                    "Registry rejected content digest during {}: {}",
                    operation, error_text
                ),
            },
            code => {
                let message = match code {
                    429 => format!("Rate limited during {}: {}", operation, error_text),
                    500 => format!("Registry server error during {}: {}", operation, error_text),
                    502 | 503 => format!("Registry unavailable for {}: {}", operation, error_text),
                    507 => format!("Registry out of storage during {}: {}", operation, error_text),
                    _ => format!("{} failed: {}", operation, error_text),
                };
                RegistryError::Registry {
                    status: code,
                    message,
                }
            }
        }
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Network(format!("{} timed out: {}", context, error))
        } else if error.is_connect() {
            RegistryError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            RegistryError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            RegistryError::Network(format!("{} network error: {}", context, error))
        }
    }
}
