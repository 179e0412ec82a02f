//! Copy orchestration
//!
//! Rewrites a batch and then copies each image, in batch order, one at a time.
//! The first failure aborts the rest of the batch.

use crate::config::RelocationConfig;
use crate::error::{RelocateError, Result};
use crate::image::{ImageList, ImageRecord};
use crate::registry::ImageTransfer;
use crate::relocate::rewriter::ReferenceRewriter;
use crate::relocate::tag::TagDeriver;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Relocates the images of a scanned batch
#[async_trait]
pub trait ImageCopier: Send + Sync {
    async fn copy_images(&self, cancel: &CancellationToken, images: &mut ImageList) -> Result<()>;
}

/// Copies images through an [`ImageTransfer`] into a single destination repository
pub struct RegistryCopier<T> {
    transfer: T,
    rewriter: ReferenceRewriter,
}

impl<T: ImageTransfer> RegistryCopier<T> {
    /// Validates the configuration before any transfer can happen
    pub fn new(transfer: T, config: &RelocationConfig) -> Result<Self> {
        config.validate()?;
        let tags = TagDeriver::new(config.tag_prefix.clone())?;
        Ok(Self {
            transfer,
            rewriter: ReferenceRewriter::new(config.destination.clone(), tags),
        })
    }

    /// Rewrite every record, then copy them one by one.
    ///
    /// Records after a failed one are not attempted but keep their rewritten
    /// coordinates. Re-running the batch is safe: tags are deterministic and
    /// re-copying an existing destination is a no-op for the registry.
    pub async fn copy_all(
        &self,
        cancel: &CancellationToken,
        records: &mut [ImageRecord],
    ) -> Result<()> {
        self.rewriter.rewrite(records)?;

        let total = records.len();
        for (i, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(RelocateError::Cancelled);
            }

            let source_ref = record.reference(true);
            let destination_ref = record.destination_ref();
            tracing::info!(
                image = i + 1,
                total,
                source = %source_ref,
                destination = %destination_ref,
                "Copying image"
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(image = i + 1, source = %source_ref, "Copy cancelled");
                    return Err(RelocateError::Cancelled);
                }
                result = self.transfer.copy(&source_ref, &destination_ref, record.pinned_digest()) => result,
            };

            if let Err(source) = result {
                tracing::error!(
                    image = i + 1,
                    source = %source_ref,
                    destination = %destination_ref,
                    error = %source,
                    "Copy failed, aborting remaining images"
                );
                return Err(RelocateError::Transfer {
                    index: i + 1,
                    source_ref,
                    destination_ref,
                    source,
                });
            }
        }

        tracing::info!(total, destination = %self.rewriter.destination(), "All images copied");
        Ok(())
    }
}

#[async_trait]
impl<T: ImageTransfer> ImageCopier for RegistryCopier<T> {
    async fn copy_images(&self, cancel: &CancellationToken, images: &mut ImageList) -> Result<()> {
        self.copy_all(cancel, images.items_mut()).await
    }
}
