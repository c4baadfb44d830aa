//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub captioning: CaptioningConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub ghost: GhostConfig,

    #[serde(default)]
    pub wordpress: WordPressConfig,

    #[serde(default)]
    pub woocommerce: WooCommerceConfig,

    #[serde(default)]
    pub shopify: ShopifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default = "default_true")]
    pub dry_run: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptioningConfig {
    #[serde(default = "default_caption_provider")]
    pub provider: String,

    #[serde(default = "default_caption_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_caption_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_max_tries")]
    pub max_tries: u32,

    #[serde(default = "default_caption_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub overwrite: bool,

    /// Platform status filter; unset uses the platform default
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub order: Option<String>,

    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Content kinds to list; empty uses the platform default
    #[serde(default)]
    pub content_types: Vec<String>,

    #[serde(default)]
    pub write_descriptions: bool,

    #[serde(default)]
    pub overwrite_descriptions: bool,

    #[serde(default = "default_description_max_length")]
    pub description_max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_ghost_admin_key_env")]
    pub admin_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default = "default_wordpress_password_env")]
    pub password_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WooCommerceConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_woocommerce_key_env")]
    pub consumer_key_env: String,

    #[serde(default = "default_woocommerce_secret_env")]
    pub consumer_secret_env: String,

    /// "basic" (HTTP basic auth) or "query" (query-string parameters)
    #[serde(default = "default_key_transport")]
    pub key_transport: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyConfig {
    #[serde(default)]
    pub shop: String,

    #[serde(default = "default_shopify_token_env")]
    pub access_token_env: String,
}

// Default value functions
fn default_platform() -> String {
    "ghost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_caption_provider() -> String {
    "scenexplain".to_string()
}

fn default_caption_endpoint() -> String {
    alt_texter_adapters::captioning::SCENEX_URL.to_string()
}

fn default_caption_api_key_env() -> String {
    "SCENEX_API_KEY".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_length() -> usize {
    alt_texter_domain::DEFAULT_ALT_MAX_LENGTH
}

fn default_max_tries() -> u32 {
    alt_texter_domain::DEFAULT_MAX_TRIES
}

fn default_caption_timeout() -> u64 {
    60
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_limit() -> usize {
    10_000
}

fn default_page_size() -> usize {
    100
}

fn default_description_max_length() -> usize {
    10_000
}

fn default_ghost_admin_key_env() -> String {
    "GHOST_ADMIN_API_KEY".to_string()
}

fn default_wordpress_password_env() -> String {
    "WORDPRESS_APP_PASSWORD".to_string()
}

fn default_woocommerce_key_env() -> String {
    "WOOCOMMERCE_CONSUMER_KEY".to_string()
}

fn default_woocommerce_secret_env() -> String {
    "WOOCOMMERCE_CONSUMER_SECRET".to_string()
}

fn default_key_transport() -> String {
    "basic".to_string()
}

fn default_shopify_token_env() -> String {
    "SHOPIFY_ACCESS_TOKEN".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            dry_run: default_true(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for CaptioningConfig {
    fn default() -> Self {
        Self {
            provider: default_caption_provider(),
            endpoint: default_caption_endpoint(),
            api_key_env: default_caption_api_key_env(),
            language: default_language(),
            max_length: default_max_length(),
            max_tries: default_max_tries(),
            timeout_secs: default_caption_timeout(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            status: None,
            order: None,
            limit: default_limit(),
            page_size: default_page_size(),
            content_types: vec![],
            write_descriptions: false,
            overwrite_descriptions: false,
            description_max_length: default_description_max_length(),
        }
    }
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            admin_key_env: default_ghost_admin_key_env(),
        }
    }
}

impl Default for WordPressConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password_env: default_wordpress_password_env(),
        }
    }
}

impl Default for WooCommerceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            consumer_key_env: default_woocommerce_key_env(),
            consumer_secret_env: default_woocommerce_secret_env(),
            key_transport: default_key_transport(),
        }
    }
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop: String::new(),
            access_token_env: default_shopify_token_env(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("ALT_TEXTER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# alt-texter configuration
#
# Secrets never live in this file: each *_env key names the environment
# variable that holds the value.

[general]
platform = "ghost"  # ghost, wordpress, woocommerce, shopify
dry_run = true
log_level = "info"
timeout_secs = 30

[captioning]
provider = "scenexplain"  # scenexplain, stub
endpoint = "https://api.scenex.jina.ai/v1/describe"
api_key_env = "SCENEX_API_KEY"
language = "en"
max_length = 125
max_tries = 3
timeout_secs = 60
# Base delay between empty-caption retries; 0 disables backoff
backoff_ms = 500

[processing]
overwrite = false
# status = "published"
# order = "published_at desc"
limit = 10000
page_size = 100
# content_types = ["posts", "pages"]
write_descriptions = false
overwrite_descriptions = false
description_max_length = 10000

[ghost]
url = "https://your-site.ghost.io"
admin_key_env = "GHOST_ADMIN_API_KEY"

[wordpress]
url = "https://your-site.example"
username = "editor"
password_env = "WORDPRESS_APP_PASSWORD"

[woocommerce]
url = "https://your-shop.example"
consumer_key_env = "WOOCOMMERCE_CONSUMER_KEY"
consumer_secret_env = "WOOCOMMERCE_CONSUMER_SECRET"
key_transport = "basic"  # basic, query

[shopify]
shop = "your-shop"
access_token_env = "SHOPIFY_ACCESS_TOKEN"
"#
        .to_string()
    }
}
