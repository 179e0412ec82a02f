//! Registry client copying images between registries over the Registry HTTP API v2.
//!
//! A copy pulls the source manifest, verifies it against the pinned digest,
//! copies every referenced blob (and, for an index, every child manifest) and
//! finally pushes the unchanged manifest bytes under the destination tag, so
//! the destination keeps the source's manifest digest.

use crate::config::RegistryConfig;
use crate::digest::DigestUtils;
use crate::error::RegistryError;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::image::ImageReference;
use crate::registry::auth::{Access, Auth, AuthChallenge};
use crate::registry::transfer::ImageTransfer;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const DOCKER_MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

const MANIFEST_ACCEPT: [&str; 4] = [OCI_INDEX, DOCKER_MANIFEST_LIST, OCI_MANIFEST, DOCKER_MANIFEST_V2];

/// Layers registries refuse to host; they stay at their external URLs
const FOREIGN_LAYER_MARKERS: [&str; 2] = [".foreign.", ".nondistributable."];

#[derive(Debug, Deserialize)]
struct Descriptor {
    #[serde(rename = "mediaType", default)]
    media_type: String,
    digest: String,
}

impl Descriptor {
    fn is_foreign(&self) -> bool {
        FOREIGN_LAYER_MARKERS
            .iter()
            .any(|marker| self.media_type.contains(marker))
    }
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(rename = "mediaType")]
    media_type: Option<String>,
    config: Option<Descriptor>,
    #[serde(default)]
    layers: Vec<Descriptor>,
    #[serde(default)]
    manifests: Vec<Descriptor>,
}

/// Manifest as served by the registry
#[derive(Debug, Clone)]
pub struct RawManifest {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

fn is_index(media_type: &str) -> bool {
    media_type == OCI_INDEX || media_type == DOCKER_MANIFEST_LIST
}

/// Append `digest=<digest>` to an upload location, resolving relative locations against `base`
fn upload_url(base: &str, location: &str, digest: &str) -> Result<url::Url, RegistryError> {
    let mut url = url::Url::parse(base)?.join(location)?;
    url.query_pairs_mut().append_pair("digest", digest);
    Ok(url)
}

pub struct RegistryClient {
    client: Client,
    auth: Auth,
    scheme: &'static str,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout));
        if config.skip_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let client = builder
            .build()
            .map_err(|e| RegistryError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let auth = Auth::new(client.clone(), config.auth.clone());

        Ok(Self {
            client,
            auth,
            scheme: config.scheme(),
        })
    }

    fn base_url(&self, image: &ImageReference) -> String {
        format!("{}://{}", self.scheme, image.api_host())
    }

    fn api_url(&self, image: &ImageReference, path: &str) -> String {
        format!("{}/v2/{}/{}", self.base_url(image), image.repository, path)
    }

    /// Send a request, answering one auth challenge if the registry asks for it
    async fn send<F>(
        &self,
        image: &ImageReference,
        access: Access,
        operation: &str,
        build: F,
    ) -> Result<Response, RegistryError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let host = image.api_host();
        let scope = access.scope(&image.repository);

        let mut request = build(&self.client);
        if let Some(token) = self.auth.cached_token(host, &scope) {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .and_then(AuthChallenge::parse);

        let retry = match challenge {
            Some(AuthChallenge::Bearer { realm, service, .. }) => {
                let token = self
                    .auth
                    .fetch_token(host, &realm, service.as_deref(), &scope)
                    .await?;
                build(&self.client).bearer_auth(token)
            }
            Some(AuthChallenge::Basic) => match self.auth.credentials() {
                Some((username, password)) => build(&self.client).basic_auth(username, Some(password)),
                None => return Ok(response),
            },
            None => return Ok(response),
        };

        tracing::debug!(host, scope = %scope, operation, "Retrying request with credentials");
        retry
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation))
    }

    async fn check(response: Response, operation: &str) -> Result<Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        Err(HttpErrorHandler::handle_registry_error(status, &error_text, operation))
    }

    /// Pull a manifest by tag or digest
    pub async fn fetch_manifest(
        &self,
        image: &ImageReference,
        reference: &str,
    ) -> Result<RawManifest, RegistryError> {
        let url = self.api_url(image, &format!("manifests/{}", reference));
        let operation = format!("manifest pull {}", image);
        let response = self
            .send(image, Access::Pull, &operation, |c| {
                c.get(&url).header(ACCEPT, MANIFEST_ACCEPT.join(", "))
            })
            .await?;
        let response = Self::check(response, &operation).await?;

        let header_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(|h| h.split(';').next().unwrap_or(h).trim().to_string());
        let bytes = response.bytes().await?.to_vec();

        let content_type = match header_type {
            Some(t) if MANIFEST_ACCEPT.contains(&t.as_str()) => t,
            _ => serde_json::from_slice::<ManifestDocument>(&bytes)?
                .media_type
                .unwrap_or_else(|| DOCKER_MANIFEST_V2.to_string()),
        };

        tracing::debug!(image = %image, reference, content_type = %content_type, "Pulled manifest");
        Ok(RawManifest { bytes, content_type })
    }

    /// Push manifest bytes unchanged under `reference`
    pub async fn put_manifest(
        &self,
        image: &ImageReference,
        reference: &str,
        manifest: &RawManifest,
    ) -> Result<(), RegistryError> {
        let url = self.api_url(image, &format!("manifests/{}", reference));
        let operation = format!("manifest push {}:{}", image.repository, reference);
        let response = self
            .send(image, Access::Push, &operation, |c| {
                c.put(&url)
                    .header(CONTENT_TYPE, manifest.content_type.as_str())
                    .body(manifest.bytes.clone())
            })
            .await?;
        Self::check(response, &operation).await?;
        Ok(())
    }

    pub async fn blob_exists(&self, image: &ImageReference, digest: &str) -> Result<bool, RegistryError> {
        let url = self.api_url(image, &format!("blobs/{}", digest));
        let operation = format!("blob check {}", DigestUtils::format_digest_short(digest));
        let response = self.send(image, Access::Push, &operation, |c| c.head(&url)).await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Self::check(response, &operation).await.map(|_| false),
        }
    }

    pub async fn pull_blob(&self, image: &ImageReference, digest: &str) -> Result<Vec<u8>, RegistryError> {
        let url = self.api_url(image, &format!("blobs/{}", digest));
        let operation = format!("blob pull {}", DigestUtils::format_digest_short(digest));
        let response = self.send(image, Access::Pull, &operation, |c| c.get(&url)).await?;
        let response = Self::check(response, &operation).await?;
        let data = response.bytes().await?.to_vec();
        DigestUtils::verify_data_integrity(&data, digest)?;
        Ok(data)
    }

    /// Monolithic upload: start a session, then PUT the whole blob
    pub async fn push_blob(&self, image: &ImageReference, data: Vec<u8>, digest: &str) -> Result<(), RegistryError> {
        let start_url = self.api_url(image, "blobs/uploads/");
        let operation = format!("blob upload {}", DigestUtils::format_digest_short(digest));
        let response = self.send(image, Access::Push, &operation, |c| c.post(&start_url)).await?;
        let response = Self::check(response, &operation).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| RegistryError::Registry {
                status: response.status().as_u16(),
                message: "No Location header in upload response".to_string(),
            })?;
        let url = upload_url(&self.base_url(image), location, digest)?;

        let response = self
            .send(image, Access::Push, &operation, |c| {
                c.put(url.clone())
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(data.clone())
            })
            .await?;
        Self::check(response, &operation).await?;
        Ok(())
    }

    async fn copy_blob(
        &self,
        source: &ImageReference,
        destination: &ImageReference,
        digest: &str,
    ) -> Result<(), RegistryError> {
        if self.blob_exists(destination, digest).await? {
            tracing::debug!(digest, destination = %destination, "Blob already present");
            return Ok(());
        }
        let data = self.pull_blob(source, digest).await?;
        tracing::debug!(digest, size = data.len(), "Uploading blob");
        self.push_blob(destination, data, digest).await
    }

    /// Copy everything `manifest` references; child manifests of an index are pushed by digest
    fn copy_referenced<'a>(
        &'a self,
        source: &'a ImageReference,
        destination: &'a ImageReference,
        manifest: &'a RawManifest,
    ) -> BoxFuture<'a, Result<(), RegistryError>> {
        async move {
            let document: ManifestDocument = serde_json::from_slice(&manifest.bytes)?;

            if is_index(&manifest.content_type) || !document.manifests.is_empty() {
                for child in &document.manifests {
                    let child_manifest = self.fetch_manifest(source, &child.digest).await?;
                    DigestUtils::verify_data_integrity(&child_manifest.bytes, &child.digest)?;
                    self.copy_referenced(source, destination, &child_manifest).await?;
                    self.put_manifest(destination, &child.digest, &child_manifest).await?;
                }
                return Ok(());
            }

            for blob in document.config.iter().chain(document.layers.iter()) {
                if blob.is_foreign() {
                    tracing::debug!(digest = %blob.digest, "Skipping foreign layer");
                    continue;
                }
                self.copy_blob(source, destination, &blob.digest).await?;
            }
            Ok(())
        }
        .boxed()
    }
}

#[async_trait]
impl ImageTransfer for RegistryClient {
    async fn copy(
        &self,
        source_ref: &str,
        destination_ref: &str,
        digest: Option<&str>,
    ) -> Result<(), RegistryError> {
        let source = ImageReference::parse(source_ref)?;
        let destination = ImageReference::parse(destination_ref)?;
        let tag = destination.tag.clone().ok_or_else(|| {
            RegistryError::Validation(format!("Destination '{}' has no tag", destination_ref))
        })?;

        let manifest = self.fetch_manifest(&source, source.manifest_reference()).await?;
        if let Some(expected) = digest {
            DigestUtils::verify_data_integrity(&manifest.bytes, expected)?;
        }

        self.copy_referenced(&source, &destination, &manifest).await?;
        self.put_manifest(&destination, &tag, &manifest).await?;

        tracing::info!(
            source = %source,
            destination = %destination,
            digest = %DigestUtils::compute_docker_digest(&manifest.bytes),
            "Image copied"
        );
        Ok(())
    }
}
