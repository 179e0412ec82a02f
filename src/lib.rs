//! Image Relocator Library
//!
//! Relocates the container images referenced by deployment manifests into a
//! single destination repository. Every record gets a deterministic tag
//! derived from its original name and tag, so identical images converge on
//! one destination and re-runs are idempotent.
//!
//! - [`relocate`]: tag derivation, reference rewriting and the copy orchestrator
//! - [`registry`]: the transfer capability and a Registry HTTP API v2 client
//! - [`image`]: image records and reference parsing
//! - [`cli`]: the command line front end

pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod image;
pub mod logging;
pub mod registry;
pub mod relocate;

pub use config::{AuthConfig, RegistryConfig, RelocationConfig};
pub use error::{RegistryError, RelocateError, Result};
pub use image::{ImageList, ImageRecord, ImageReference};
pub use registry::{ImageTransfer, RegistryClient};
pub use relocate::{ImageCopier, ReferenceRewriter, RegistryCopier, TagDeriver, derive_tag};
