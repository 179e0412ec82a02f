//! Runner driving one relocation from the command line

use crate::cli::args::Args;
use crate::config::{AuthConfig, RegistryConfig, RelocationConfig};
use crate::error::{RelocateError, Result};
use crate::image::{ImageList, ImageRecord};
use crate::logging::Logger;
use crate::registry::RegistryClient;
use crate::relocate::{ImageCopier, ReferenceRewriter, RegistryCopier, TagDeriver};
use serde_json::Value;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Read an image list from a JSON file.
///
/// Each entry is either a full record or a bare reference string.
pub fn load_images(path: &Path) -> Result<ImageList> {
    let content = std::fs::read_to_string(path)?;
    let entries: Vec<Value> = serde_json::from_str(&content)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i + 1, entry))
        .collect()
}

fn parse_entry(position: usize, entry: Value) -> Result<ImageRecord> {
    match entry {
        Value::String(reference) => ImageRecord::from_reference("", "", Vec::new(), &reference)
            .map_err(|e| {
                RelocateError::Config(format!(
                    "Invalid image reference '{}' at position {}: {}",
                    reference, position, e
                ))
            }),
        Value::Object(record) => serde_json::from_value(Value::Object(record)).map_err(|e| {
            RelocateError::Config(format!("Invalid image record at position {}: {}", position, e))
        }),
        other => Err(RelocateError::Config(format!(
            "Image list entry at position {} must be a record or a reference string, got {}",
            position, other
        ))),
    }
}

/// Write the image list as pretty JSON to `path`, or stdout when absent
pub fn write_images(images: &ImageList, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(images)?;
    match path {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => println!("{}", json),
    }
    Ok(())
}

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };
        Self { args, output }
    }

    pub fn logger(&self) -> &Logger {
        &self.output
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        self.output.section("Image Relocator");
        self.args.validate().map_err(RelocateError::Config)?;

        let relocation = self.relocation_config()?;
        let mut images = load_images(Path::new(&self.args.images))?;

        self.output.summary_kv(
            "Relocation",
            &[
                ("Images", self.args.images.clone()),
                ("Records", images.len().to_string()),
                ("Destination", relocation.destination.clone()),
                ("Tag prefix", relocation.tag_prefix.clone()),
            ],
        );

        if self.args.dry_run {
            self.output.info("Dry run mode - computing destinations only");
            let rewriter = ReferenceRewriter::new(
                relocation.destination.clone(),
                TagDeriver::new(relocation.tag_prefix.clone())?,
            );
            rewriter.rewrite(images.items_mut())?;
        } else {
            self.copy(&relocation, cancel, &mut images).await?;
        }

        self.report(&images);
        write_images(&images, self.args.output.as_deref().map(Path::new))?;

        self.output.success(&format!(
            "Relocated {} image references in {}",
            images.len(),
            self.output.format_duration(self.output.elapsed())
        ));
        Ok(())
    }

    fn relocation_config(&self) -> Result<RelocationConfig> {
        // Flags win over the environment
        let mut config = RelocationConfig::new(String::new()).from_env();
        if let Some(destination) = &self.args.destination {
            config.destination = destination.clone();
        }
        if let Some(prefix) = &self.args.tag_prefix {
            config.tag_prefix = prefix.clone();
        }
        if config.destination.is_empty() {
            return Err(RelocateError::Config(
                "No destination given; use --destination or RELOCATE_DESTINATION".to_string(),
            ));
        }
        config.validate()?;
        self.output.step("Configuration validated");
        Ok(config)
    }

    fn registry_config(&self) -> Result<RegistryConfig> {
        let auth = AuthConfig {
            username: self.args.username.clone(),
            password: self.args.password.clone(),
        };
        let config = RegistryConfig::default()
            .with_auth(auth)
            .with_timeout(self.args.timeout)
            .with_skip_tls(self.args.skip_tls)
            .with_insecure(self.args.insecure)
            .from_env();
        config.validate()?;

        if config.auth.credentials().is_some() {
            self.output.step("Using provided credentials");
        } else {
            self.output.step("No credentials provided - attempting anonymous access");
        }
        Ok(config)
    }

    async fn copy(
        &self,
        relocation: &RelocationConfig,
        cancel: &CancellationToken,
        images: &mut ImageList,
    ) -> Result<()> {
        let client = RegistryClient::new(self.registry_config()?).map_err(|e| {
            RelocateError::Config(format!("Failed to set up registry client: {}", e))
        })?;
        let copier = RegistryCopier::new(client, relocation)?;

        self.output.subsection("Copying images");
        copier.copy_images(cancel, images).await
    }

    fn report(&self, images: &ImageList) {
        for record in images.items() {
            self.output.detail(&format!(
                "{} ({}) -> {}",
                record.original_ref,
                record.manifest,
                record.destination_ref()
            ));
        }
        self.output.info(&format!(
            "{} references map to {} destination images",
            images.len(),
            images.destinations().len()
        ));
    }
}
