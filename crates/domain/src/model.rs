//! Domain models and value objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lexical::LexicalDocument;

/// Default alt text length, matching the most restrictive platform field
pub const DEFAULT_ALT_MAX_LENGTH: usize = 125;

/// Default number of captioning attempts per image
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Kind of content item across platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Post,
    Page,
    Media,
    Product,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Page => "page",
            ContentKind::Media => "media",
            ContentKind::Product => "product",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "post" | "posts" => Ok(ContentKind::Post),
            "page" | "pages" => Ok(ContentKind::Page),
            "media" | "attachment" => Ok(ContentKind::Media),
            "product" | "products" => Ok(ContentKind::Product),
            other => Err(format!("Unknown content kind: {}", other)),
        }
    }
}

/// Returns true when an alt value counts as missing (absent, null or empty)
pub fn alt_is_missing(alt: Option<&str>) -> bool {
    alt.is_none_or(str::is_empty)
}

/// An image record in a flat image list (product galleries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Platform-specific fields (id, position, ...) carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageRecord {
    pub fn new(src: impl Into<String>, alt: Option<&str>) -> Self {
        Self {
            src: Some(src.into()),
            alt: alt.map(String::from),
            extra: Map::new(),
        }
    }
}

/// A featured/cover image that lives outside the item body
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedImage {
    pub url: Option<String>,
    pub alt: Option<String>,
    /// Platform-imposed limit on the alt field, if any
    pub alt_limit: Option<usize>,
}

/// Body of a content item, one variant per platform representation
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBody {
    /// Nested rich-document tree (Ghost lexical)
    Lexical(LexicalDocument),
    /// Flat HTML markup
    Html(String),
    /// Flat list of image records
    Images(Vec<ImageRecord>),
    /// No body to walk (e.g. a media attachment)
    Empty,
}

impl ContentBody {
    pub fn shape(&self) -> &'static str {
        match self {
            ContentBody::Lexical(_) => "lexical",
            ContentBody::Html(_) => "html",
            ContentBody::Images(_) => "images",
            ContentBody::Empty => "empty",
        }
    }
}

/// A post, page, media asset or product fetched from a platform
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Platform-specific ID
    pub id: String,
    pub kind: ContentKind,
    /// Display-only title
    pub title: String,
    pub body: ContentBody,
    /// HTML product description (e-commerce only)
    pub description: Option<String>,
    pub featured_image: Option<FeaturedImage>,
    /// Opaque concurrency token the platform wants echoed on write
    pub revision: Option<String>,
}

/// Result of listing: either just an ID, or the full item when the
/// platform only paginates full objects
#[derive(Debug, Clone)]
pub struct ListedItem {
    pub id: String,
    pub kind: ContentKind,
    pub item: Option<ContentItem>,
}

impl ListedItem {
    pub fn id(id: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            item: None,
        }
    }

    pub fn loaded(item: ContentItem) -> Self {
        Self {
            id: item.id.clone(),
            kind: item.kind,
            item: Some(item),
        }
    }
}

/// Listing filters shared by all platforms
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Platform status filter (None = platform default)
    pub status: Option<String>,
    /// Platform order expression (None = platform default)
    pub order: Option<String>,
    /// Maximum items to return
    pub limit: usize,
    /// Items requested per page
    pub page_size: usize,
    /// Content types to list (empty = platform default)
    pub content_types: Vec<ContentKind>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            order: None,
            limit: 10_000,
            page_size: 100,
            content_types: vec![],
        }
    }
}

/// Fields populated by walking/detection; the only thing a writer sends
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub body: Option<ContentBody>,
    pub description: Option<String>,
    pub featured_image_alt: Option<String>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.description.is_none() && self.featured_image_alt.is_none()
    }

    /// Names of the fields carried by this update (for logging)
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = vec![];
        if self.body.is_some() {
            fields.push("body");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.featured_image_alt.is_some() {
            fields.push("featured_image_alt");
        }
        fields
    }
}

/// What one walk over an item captioned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Images (re)captioned inside the body
    pub body_images: usize,
    /// Images (re)captioned inside the product description
    pub description_images: usize,
    /// Whether the featured image alt was (re)captioned
    pub featured: bool,
    /// Whether a product description was generated
    pub description_generated: bool,
}

impl WalkReport {
    pub fn captioned(&self) -> usize {
        self.body_images + self.description_images + usize::from(self.featured)
    }
}

/// Processing result for a single item
#[derive(Debug)]
pub enum ProcessResult {
    /// Item changed and was written (or would have been, in dry-run)
    Updated {
        title: String,
        captioned: usize,
        fields: Vec<&'static str>,
        dry_run: bool,
    },
    /// Nothing changed; no write issued
    Unchanged { title: String },
    /// Fetching, captioning or writing failed
    Failed { error: String },
}

/// A per-item failure recorded in the run summary
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub error: String,
}

/// Aggregate outcome of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub unchanged: usize,
    pub images_captioned: usize,
    pub updated_titles: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl RunSummary {
    pub fn updated(&self) -> usize {
        self.updated_titles.len()
    }

    /// Fold a single item result into the summary
    pub fn record(&mut self, id: &str, result: &ProcessResult) {
        self.processed += 1;
        match result {
            ProcessResult::Updated {
                title, captioned, ..
            } => {
                self.images_captioned += captioned;
                self.updated_titles.push(title.clone());
            }
            ProcessResult::Unchanged { .. } => self.unchanged += 1,
            ProcessResult::Failed { error } => self.failures.push(ItemFailure {
                id: id.to_string(),
                error: error.clone(),
            }),
        }
    }
}
