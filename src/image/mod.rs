//! Image reference handling
//!
//! This module provides the data model for image references discovered in
//! deployment manifests ([`ImageRecord`], [`ImageList`]) and the parsing and
//! validation of reference strings ([`ImageReference`]).

pub mod record;
pub mod reference;

pub use record::{ImageList, ImageRecord};
pub use reference::{ImageReference, is_valid_tag, split_reference, validate_destination};
