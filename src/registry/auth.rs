//! Token authentication for Docker registry access
//!
//! Registries answer unauthenticated requests with `401` and a
//! `WWW-Authenticate: Bearer realm="...",service="...",scope="..."` challenge.
//! [`Auth`] exchanges such a challenge for a token, with basic credentials when
//! configured, and caches the token per registry and scope.

use crate::config::AuthConfig;
use crate::error::RegistryError;
use crate::error::handlers::NetworkErrorHandler;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Parsed `WWW-Authenticate` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChallenge {
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
    Basic,
}

impl AuthChallenge {
    /// Parse a challenge header; unknown schemes yield `None`
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, params_str) = header.split_once(' ').unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("basic") {
            return Some(AuthChallenge::Basic);
        }
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let params = parse_params(params_str);
        let realm = params.get("realm")?.to_string();
        Some(AuthChallenge::Bearer {
            realm,
            service: params.get("service").map(|s| s.to_string()),
            scope: params.get("scope").map(|s| s.to_string()),
        })
    }
}

/// Split `key="value",key2="a,b"` respecting commas inside quotes
fn parse_params(params_str: &str) -> HashMap<&str, &str> {
    let mut params = HashMap::new();
    let mut rest = params_str.trim();

    while !rest.is_empty() {
        let Some(eq_pos) = rest.find('=') else { break };
        let key = rest[..eq_pos].trim().trim_start_matches(',').trim();
        let after = rest[eq_pos + 1..].trim_start();

        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim(), &after[end..]),
                None => (after.trim(), ""),
            }
        };

        params.insert(key, value);
        rest = remaining.trim_start().trim_start_matches(',').trim_start();
    }

    params
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Access scope requested for a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Pull,
    Push,
}

impl Access {
    pub fn scope(self, repository: &str) -> String {
        match self {
            Access::Pull => format!("repository:{}:pull", repository),
            Access::Push => format!("repository:{}:pull,push", repository),
        }
    }
}

pub struct Auth {
    client: Client,
    config: AuthConfig,
    tokens: Mutex<HashMap<String, String>>,
}

impl Auth {
    pub fn new(client: Client, config: AuthConfig) -> Self {
        Self {
            client,
            config,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.config.credentials()
    }

    fn cache_key(host: &str, scope: &str) -> String {
        format!("{}|{}", host, scope)
    }

    pub fn cached_token(&self, host: &str, scope: &str) -> Option<String> {
        self.tokens
            .lock()
            .ok()
            .and_then(|tokens| tokens.get(&Self::cache_key(host, scope)).cloned())
    }

    /// Exchange a bearer challenge for a token scoped to `scope` and cache it
    pub async fn fetch_token(
        &self,
        host: &str,
        realm: &str,
        service: Option<&str>,
        scope: &str,
    ) -> Result<String, RegistryError> {
        let mut url = url::Url::parse(realm)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = service {
                query.append_pair("service", service);
            }
            query.append_pair("scope", scope);
        }

        tracing::debug!(realm, scope, "Requesting registry token");

        let mut request = self.client.get(url);
        if let Some((username, password)) = self.credentials() {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, "token request"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(RegistryError::Auth(format!(
                "Token request to {} failed with status {}: {}",
                realm, status, error_text
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Parse(format!("Failed to parse token response: {}", e)))?;
        let token = token_response
            .token
            .or(token_response.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RegistryError::Auth(format!("Token response from {} carried no token", realm)))?;

        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(Self::cache_key(host, scope), token.clone());
        }
        Ok(token)
    }
}
