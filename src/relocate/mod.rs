//! Image relocation core
//!
//! - [`tag`]: deterministic destination tags derived from the original name and tag
//! - [`rewriter`]: assigns destination name and tag to every record of a batch
//! - [`copier`]: rewrites a batch and drives the transfer of every image, fail-fast

pub mod copier;
pub mod rewriter;
pub mod tag;

pub use copier::{ImageCopier, RegistryCopier};
pub use rewriter::ReferenceRewriter;
pub use tag::{DEFAULT_TAG_PREFIX, TagDeriver, derive_tag};
