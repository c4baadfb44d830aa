//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{ContentItem, ContentKind, ItemUpdate, ListQuery, ListedItem};

/// Error type for captioning operations
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Captioning service returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Timeout")]
    Timeout,
}

/// Port for the vision-to-text captioning service
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Caption one image (URL or data URI), truncated to `max_length` chars.
    ///
    /// Returns `Ok(None)` when every attempt came back empty.
    async fn caption(
        &self,
        image: &str,
        max_length: usize,
        max_tries: u32,
    ) -> Result<Option<String>, CaptionError>;

    /// Answer a free-form prompt about an image (product descriptions)
    async fn describe(
        &self,
        image: &str,
        prompt: &str,
        max_length: usize,
    ) -> Result<Option<String>, CaptionError>;
}

#[async_trait]
impl<C: Captioner + ?Sized> Captioner for &C {
    async fn caption(
        &self,
        image: &str,
        max_length: usize,
        max_tries: u32,
    ) -> Result<Option<String>, CaptionError> {
        (*self).caption(image, max_length, max_tries).await
    }

    async fn describe(
        &self,
        image: &str,
        prompt: &str,
        max_length: usize,
    ) -> Result<Option<String>, CaptionError> {
        (*self).describe(image, prompt, max_length).await
    }
}

/// Error type for content platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("API returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Malformed body in item {id}: {message}")]
    MalformedBody { id: String, message: String },
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Port for a content platform (Ghost, WordPress, WooCommerce, Shopify)
#[async_trait]
pub trait ContentPlatform: Send + Sync {
    /// Platform name (e.g. "ghost", "shopify")
    fn name(&self) -> &'static str;

    /// Enumerate items, in the platform's listing order
    async fn list(&self, query: &ListQuery) -> Result<Vec<ListedItem>, PlatformError>;

    /// Fetch one full item, including its platform-specific body
    async fn fetch(&self, kind: ContentKind, id: &str) -> Result<ContentItem, PlatformError>;

    /// Push the populated fields of `update` for `item`
    async fn write(&self, item: &ContentItem, update: &ItemUpdate) -> Result<(), PlatformError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
