//! Image reference parsing and validation.
//!
//! Splits references like `ghcr.io/fluxcd/source-controller:v0.31.0@sha256:...`
//! into their components. Records keep the name exactly as written; the
//! Docker Hub defaults applied by [`ImageReference::parse`] only matter for
//! talking to a registry.

use crate::error::RegistryError;
use std::fmt;

/// Default registry when none is specified.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Host serving the registry API for [`DEFAULT_REGISTRY`].
const DEFAULT_REGISTRY_API_HOST: &str = "registry-1.docker.io";

/// Tag used when a reference carries neither tag nor digest.
pub const DEFAULT_TAG: &str = "latest";

/// Registries reject tags longer than this.
pub const MAX_TAG_LENGTH: usize = 128;

/// Registries reject repository names longer than this.
const MAX_NAME_LENGTH: usize = 255;

/// Split a reference into its name, tag and digest exactly as written.
///
/// The tag is looked for after the last `/` only, so registry ports are kept
/// inside the name: `localhost:5000/app:1.0` yields `("localhost:5000/app", Some("1.0"), None)`.
pub fn split_reference(reference: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, digest) = match reference.rsplit_once('@') {
        Some((rest, digest)) => (rest, Some(digest)),
        None => (reference, None),
    };

    let component_start = rest.rfind('/').map_or(0, |pos| pos + 1);
    match rest[component_start..].rfind(':') {
        Some(colon) => {
            let colon = component_start + colon;
            (&rest[..colon], Some(&rest[colon + 1..]), digest)
        }
        None => (rest, None, digest),
    }
}

/// Check a tag against the registry tag grammar `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => {}
        _ => return false,
    }
    tag.len() <= MAX_TAG_LENGTH
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn is_valid_path_component(component: &str) -> bool {
    let bytes = component.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) if alnum(first) && alnum(last) => bytes
            .iter()
            .all(|b| alnum(b) || matches!(b, b'.' | b'_' | b'-')),
        _ => false,
    }
}

fn is_valid_registry_host(host: &str) -> bool {
    let (name, port) = match host.split_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    };
    let name_ok = !name.is_empty()
        && name
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    let port_ok = port.is_none_or(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    name_ok && port_ok
}

fn looks_like_registry(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

/// Parsed image reference, resolved against the Docker Hub defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname, with port if any (e.g. "ghcr.io", "localhost:5000")
    pub registry: String,
    /// Repository path (e.g. "library/nginx", "fluxcd/source-controller")
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// - `nginx` → docker.io/library/nginx
    /// - `redis:7` → docker.io/library/redis:7
    /// - `ghcr.io/org/image:tag@sha256:abc...` → ghcr.io/org/image:tag@sha256:abc...
    pub fn parse(reference: &str) -> Result<Self, RegistryError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(RegistryError::Validation("Empty image reference".to_string()));
        }

        let (name, tag, digest) = split_reference(reference);

        if let Some(tag) = tag {
            if !is_valid_tag(tag) {
                return Err(RegistryError::Validation(format!(
                    "Invalid tag '{}' in reference '{}'",
                    tag, reference
                )));
            }
        }
        if let Some(digest) = digest {
            if !digest.contains(':') {
                return Err(RegistryError::Validation(format!(
                    "Invalid digest format in reference '{}': expected algorithm:hex",
                    reference
                )));
            }
        }

        let (registry, repository) = Self::split_registry_repository(name)?;

        Ok(ImageReference {
            registry,
            repository,
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
        })
    }

    /// Split a name into registry and repository components.
    fn split_registry_repository(name: &str) -> Result<(String, String), RegistryError> {
        if name.len() > MAX_NAME_LENGTH {
            return Err(RegistryError::Validation(format!(
                "Repository name exceeds {} characters: {}",
                MAX_NAME_LENGTH, name
            )));
        }

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if looks_like_registry(first) => {
                if !is_valid_registry_host(first) {
                    return Err(RegistryError::Validation(format!(
                        "Invalid registry host '{}' in '{}'",
                        first, name
                    )));
                }
                (first.to_string(), rest.to_string())
            }
            Some(_) => (DEFAULT_REGISTRY.to_string(), name.to_string()),
            // Single name like "nginx" → "library/nginx" for Docker Hub
            None => (DEFAULT_REGISTRY.to_string(), format!("library/{}", name)),
        };

        if !repository.split('/').all(is_valid_path_component) {
            return Err(RegistryError::Validation(format!(
                "Invalid repository name '{}'",
                name
            )));
        }

        Ok((registry, repository))
    }

    /// Tag or digest to request from the registry, preferring the digest
    pub fn manifest_reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }

    /// Host serving the registry HTTP API for this reference
    pub fn api_host(&self) -> &str {
        if self.registry == DEFAULT_REGISTRY {
            DEFAULT_REGISTRY_API_HOST
        } else {
            &self.registry
        }
    }

    /// Get the full reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}

/// Check that `name` is a bare registry/repository reference with no tag or digest.
pub fn validate_destination(name: &str) -> Result<ImageReference, RegistryError> {
    let parsed = ImageReference::parse(name)?;
    if parsed.tag.is_some() || parsed.digest.is_some() {
        return Err(RegistryError::Validation(format!(
            "Destination '{}' must not carry a tag or digest",
            name
        )));
    }
    Ok(parsed)
}
