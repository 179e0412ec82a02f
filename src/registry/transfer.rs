//! Transfer primitive used by the copy orchestrator

use crate::error::RegistryError;
use async_trait::async_trait;

/// Copies one image from a source reference to a destination reference.
///
/// When `digest` is given the pulled source content must be verified against
/// it before anything is pushed. Copying onto a destination that already holds
/// the same content must succeed.
#[async_trait]
pub trait ImageTransfer: Send + Sync {
    async fn copy(
        &self,
        source_ref: &str,
        destination_ref: &str,
        digest: Option<&str>,
    ) -> Result<(), RegistryError>;
}

#[async_trait]
impl<T: ImageTransfer + ?Sized> ImageTransfer for std::sync::Arc<T> {
    async fn copy(
        &self,
        source_ref: &str,
        destination_ref: &str,
        digest: Option<&str>,
    ) -> Result<(), RegistryError> {
        (**self).copy(source_ref, destination_ref, digest).await
    }
}
