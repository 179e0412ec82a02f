//! Command line interface module
//!
//! Argument parsing and the runner that loads an image list, relocates it
//! and writes the rewritten list back out.

pub mod args;
pub mod runner;

pub use args::Args;
pub use runner::{Runner, load_images, write_images};
