//! Image reference records discovered in deployment manifests

use crate::digest::DigestUtils;
use crate::error::RegistryError;
use crate::image::reference::{ImageReference, split_reference};
use serde::{Deserialize, Serialize};

/// One occurrence of a container image reference inside a manifest.
///
/// Created by a manifest scanner with the `original_*` fields populated and
/// `new_name`/`new_tag` empty. The rewriter assigns the destination exactly
/// once; the copier only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Path or URI of the manifest the reference was found in
    #[serde(default)]
    pub manifest: String,
    /// Digest of the manifest document at scan time
    #[serde(default)]
    pub manifest_digest: String,
    /// Field names and indices locating the reference in the document tree
    #[serde(default)]
    pub node_path: Vec<String>,
    /// The reference exactly as written, `name[:tag][@digest]`
    #[serde(default)]
    pub original_ref: String,
    pub original_name: String,
    /// Empty for digest-only or untagged references
    #[serde(default)]
    pub original_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default)]
    pub new_name: String,
    #[serde(default)]
    pub new_tag: String,
}

impl ImageRecord {
    /// Build a record from a reference string as it appears in a manifest
    pub fn from_reference(
        manifest: impl Into<String>,
        manifest_digest: impl Into<String>,
        node_path: Vec<String>,
        reference: &str,
    ) -> Result<Self, RegistryError> {
        let reference = reference.trim();
        // Parsing validates the reference; the record keeps the verbatim parts
        ImageReference::parse(reference)?;
        let (name, tag, digest) = split_reference(reference);
        if let Some(digest) = digest {
            if !DigestUtils::is_valid_docker_digest(digest) {
                return Err(RegistryError::Validation(format!(
                    "Unsupported digest '{}' in reference '{}': expected sha256:<64 hex>",
                    digest, reference
                )));
            }
        }

        Ok(Self {
            manifest: manifest.into(),
            manifest_digest: manifest_digest.into(),
            node_path,
            original_ref: reference.to_string(),
            original_name: name.to_string(),
            original_tag: tag.unwrap_or_default().to_string(),
            digest: digest.map(str::to_string),
            new_name: String::new(),
            new_tag: String::new(),
        })
    }

    /// Reconstruct the original reference, pinned to the digest when requested and known
    pub fn reference(&self, pinned: bool) -> String {
        let mut reference = self.original_name.clone();
        if !self.original_tag.is_empty() {
            reference.push(':');
            reference.push_str(&self.original_tag);
        }
        if pinned {
            if let Some(digest) = self.digest.as_deref().filter(|d| !d.is_empty()) {
                reference.push('@');
                reference.push_str(digest);
            }
        }
        reference
    }

    /// Digest to verify pulled content against, if any
    pub fn pinned_digest(&self) -> Option<&str> {
        self.digest.as_deref().filter(|d| !d.is_empty())
    }

    /// Destination reference `new_name:new_tag`
    pub fn destination_ref(&self) -> String {
        format!("{}:{}", self.new_name, self.new_tag)
    }

    pub fn is_rewritten(&self) -> bool {
        !self.new_name.is_empty() && !self.new_tag.is_empty()
    }
}

/// Ordered batch of image records as produced by a manifest scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageList {
    items: Vec<ImageRecord>,
}

impl ImageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ImageRecord) {
        self.items.push(record);
    }

    pub fn items(&self) -> &[ImageRecord] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [ImageRecord] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct destination references, in first-seen order
    pub fn destinations(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.items
            .iter()
            .filter(|record| record.is_rewritten())
            .map(ImageRecord::destination_ref)
            .filter(|dest| seen.insert(dest.clone()))
            .collect()
    }
}

impl From<Vec<ImageRecord>> for ImageList {
    fn from(items: Vec<ImageRecord>) -> Self {
        Self { items }
    }
}

impl FromIterator<ImageRecord> for ImageList {
    fn from_iter<I: IntoIterator<Item = ImageRecord>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
