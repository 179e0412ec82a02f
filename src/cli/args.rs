//! Command-line argument parsing

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "image-relocator")]
#[command(about = "Copy the images referenced by deployment manifests into one destination repository")]
#[command(version)]
pub struct Args {
    /// Destination repository, e.g. registry.example.com/team/app
    #[arg(
        long = "destination",
        short = 'd',
        help = "Destination registry/repository (no tag); falls back to RELOCATE_DESTINATION"
    )]
    pub destination: Option<String>,

    /// Scanned image list
    #[arg(
        long = "images",
        short = 'i',
        help = "JSON file with the scanned image records or plain image references"
    )]
    pub images: String,

    #[arg(
        long = "output",
        short = 'o',
        help = "Write the rewritten image list to this file instead of stdout"
    )]
    pub output: Option<String>,

    #[arg(
        long = "tag-prefix",
        help = "Prefix marking relocated tags (default: app.)"
    )]
    pub tag_prefix: Option<String>,

    #[arg(
        long = "username",
        short = 'u',
        help = "Username for registry authentication"
    )]
    pub username: Option<String>,

    #[arg(
        long = "password",
        short = 'p',
        help = "Password for registry authentication"
    )]
    pub password: Option<String>,

    #[arg(
        long = "insecure",
        help = "Use plain HTTP to talk to registries"
    )]
    pub insecure: bool,

    #[arg(
        long = "skip-tls",
        short = 'k',
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    #[arg(
        long = "timeout",
        short = 't',
        default_value = "7200",
        help = "Timeout for network operations in seconds"
    )]
    pub timeout: u64,

    #[arg(
        long = "dry-run",
        short = 'n',
        help = "Only compute destination references, copy nothing"
    )]
    pub dry_run: bool,

    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long = "quiet", short = 'q', help = "Only print errors")]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if !std::path::Path::new(&self.images).is_file() {
            return Err(format!("Image list does not exist: {}", self.images));
        }
        if self.timeout == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet are mutually exclusive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from([
            "image-relocator",
            "-d",
            "registry.example.com/app",
            "-i",
            "images.json",
        ])
        .unwrap();
        assert_eq!(args.destination.as_deref(), Some("registry.example.com/app"));
        assert_eq!(args.images, "images.json");
        assert_eq!(args.timeout, 7200);
        assert!(!args.dry_run);
        assert!(args.tag_prefix.is_none());
    }

    #[test]
    fn test_parse_full() {
        let args = Args::try_parse_from([
            "image-relocator",
            "--destination",
            "localhost:5000/mirror",
            "--images",
            "images.json",
            "--output",
            "out.json",
            "--tag-prefix",
            "copied-",
            "-u",
            "user",
            "-p",
            "secret",
            "--insecure",
            "--dry-run",
            "--timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(args.tag_prefix.as_deref(), Some("copied-"));
        assert_eq!(args.output.as_deref(), Some("out.json"));
        assert!(args.insecure);
        assert!(args.dry_run);
        assert_eq!(args.timeout, 30);
    }

    #[test]
    fn test_images_is_required() {
        assert!(Args::try_parse_from(["image-relocator", "-d", "registry.example.com/app"]).is_err());
    }
}
