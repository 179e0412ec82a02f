//! Configuration for relocation runs and registry access

use crate::error::{RelocateError, Result};
use crate::image::validate_destination;
use crate::relocate::tag::{DEFAULT_TAG_PREFIX, validate_prefix};
use serde::{Deserialize, Serialize};
use std::env;

/// Where relocated images go and how their tags are marked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationConfig {
    /// Registry/repository every image is copied into, without tag or digest
    pub destination: String,
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
}

fn default_tag_prefix() -> String {
    DEFAULT_TAG_PREFIX.to_string()
}

impl RelocationConfig {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            tag_prefix: default_tag_prefix(),
        }
    }

    pub fn with_tag_prefix(mut self, tag_prefix: impl Into<String>) -> Self {
        self.tag_prefix = tag_prefix.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_destination(&self.destination).map_err(|e| {
            RelocateError::ContractViolation(format!(
                "Invalid destination '{}': {}",
                self.destination, e
            ))
        })?;
        validate_prefix(&self.tag_prefix)
    }

    /// Overlay `RELOCATE_DESTINATION` and `RELOCATE_TAG_PREFIX`
    pub fn from_env(mut self) -> Self {
        if let Ok(destination) = env::var("RELOCATE_DESTINATION") {
            self.destination = destination;
        }
        if let Ok(prefix) = env::var("RELOCATE_TAG_PREFIX") {
            self.tag_prefix = prefix;
        }
        self
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn new(username: String, password: String) -> Self {
        Self {
            username: Some(username),
            password: Some(password),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (&self.username, &self.password) {
            (Some(_), None) => Err(RelocateError::Config(
                "Password is required when username is provided".to_string(),
            )),
            (None, Some(_)) => Err(RelocateError::Config(
                "Username is required when password is provided".to_string(),
            )),
            (Some(u), Some(_)) if u.is_empty() => Err(RelocateError::Config(
                "Username cannot be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Fill missing credentials from `RELOCATE_USERNAME` / `RELOCATE_PASSWORD`
    pub fn from_env(mut self) -> Self {
        if self.username.is_none() {
            self.username = env::var("RELOCATE_USERNAME").ok();
        }
        if self.password.is_none() {
            self.password = env::var("RELOCATE_PASSWORD").ok();
        }
        self
    }
}

/// Registry transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Talk plain http instead of https
    pub insecure: bool,
    pub skip_tls: bool,
    /// Per-request timeout in seconds
    pub timeout: u64,
    pub auth: AuthConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            insecure: false,
            skip_tls: false,
            timeout: 7200,
            auth: AuthConfig::anonymous(),
        }
    }
}

impl RegistryConfig {
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn scheme(&self) -> &'static str {
        if self.insecure { "http" } else { "https" }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(RelocateError::Config(
                "Timeout must be greater than 0".to_string(),
            ));
        }
        if self.timeout > 86400 {
            return Err(RelocateError::Config(
                "Timeout cannot exceed 24 hours (86400 seconds)".to_string(),
            ));
        }
        self.auth.validate()
    }

    /// Overlay transport settings and credentials from the environment
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = env::var("RELOCATE_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.timeout = timeout;
            }
        }
        if let Ok(val) = env::var("RELOCATE_INSECURE") {
            self.insecure = is_truthy(&val);
        }
        if let Ok(val) = env::var("RELOCATE_SKIP_TLS") {
            self.skip_tls = is_truthy(&val);
        }
        self.auth = self.auth.from_env();
        self
    }
}

fn is_truthy(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocation_config_defaults() {
        let config = RelocationConfig::new("registry.example.com/app");
        assert_eq!(config.tag_prefix, DEFAULT_TAG_PREFIX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relocation_config_rejects_bad_destination() {
        for destination in ["", "registry.example.com/App", "registry.example.com/app:v1"] {
            let err = RelocationConfig::new(destination).validate().unwrap_err();
            assert!(err.is_contract_violation(), "{destination}");
        }
    }

    #[test]
    fn test_relocation_config_rejects_long_prefix() {
        let config = RelocationConfig::new("registry.example.com/app").with_tag_prefix("p".repeat(65));
        assert!(config.validate().unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_relocation_config_prefix_defaults_when_deserialized() {
        let config: RelocationConfig =
            serde_json::from_str(r#"{"destination": "registry.example.com/app"}"#).unwrap();
        assert_eq!(config.tag_prefix, DEFAULT_TAG_PREFIX);
    }

    #[test]
    fn test_auth_config_validation() {
        assert!(AuthConfig::anonymous().validate().is_ok());
        assert!(AuthConfig::new("user".into(), "pass".into()).validate().is_ok());
        let half = AuthConfig {
            username: Some("user".into()),
            password: None,
        };
        assert!(half.validate().is_err());
        assert_eq!(half.credentials(), None);
    }

    #[test]
    fn test_registry_config_validation() {
        assert!(RegistryConfig::default().validate().is_ok());
        assert!(RegistryConfig::default().with_timeout(0).validate().is_err());
        assert_eq!(RegistryConfig::default().with_insecure(true).scheme(), "http");
        assert_eq!(RegistryConfig::default().scheme(), "https");
    }
}
