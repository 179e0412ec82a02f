//! Registry module for Docker registry interactions
//!
//! [`ImageTransfer`] is the narrow capability the relocation core copies
//! through; [`RegistryClient`] implements it against the Registry HTTP API v2
//! with token authentication.

pub mod auth;
pub mod client;
pub mod transfer;

pub use auth::{Access, Auth, AuthChallenge};
pub use client::RegistryClient;
pub use transfer::ImageTransfer;
