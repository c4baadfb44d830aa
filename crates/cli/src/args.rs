//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// alt-texter: fill in missing image alt text with an image captioning service
#[derive(Parser, Debug)]
#[command(name = "alt-texter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Caption alt-less images on the configured platform and write them back
    Run(RunArgs),

    /// Caption a single image URL
    Caption(CaptionArgs),

    /// Report image and alt text coverage without changing anything
    Audit(AuditArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Platform to process (ghost, wordpress, woocommerce, shopify)
    #[arg(long)]
    pub platform: Option<String>,

    /// Report what would change without writing
    #[arg(long, conflicts_with = "write")]
    pub dry_run: bool,

    /// Write changes even if the config defaults to dry-run
    #[arg(long)]
    pub write: bool,

    /// Re-caption images that already have alt text
    #[arg(long)]
    pub overwrite: bool,

    /// Process only these item ids (repeatable) instead of listing
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Content kind of the ids given with --id (post, page, media, product)
    #[arg(long, requires = "ids")]
    pub kind: Option<String>,

    /// Maximum number of items to list
    #[arg(long)]
    pub limit: Option<usize>,

    /// Status filter passed to the platform
    #[arg(long)]
    pub status: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Image URL or data URI
    pub image: String,

    /// Maximum caption length in characters
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Ask a free-form question about the image instead of captioning it
    #[arg(long)]
    pub prompt: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Platform to audit (ghost, wordpress, woocommerce, shopify)
    #[arg(long)]
    pub platform: Option<String>,

    /// Maximum number of items to inspect
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration (file plus environment overrides)
    Show,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
