//! Run use case - orchestrates listing, walking, change detection and writing

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    html,
    model::{
        ContentBody, ContentItem, ContentKind, ListQuery, ListedItem, ProcessResult, RunSummary,
        WalkReport,
    },
    ports::{CaptionError, Captioner, ContentPlatform, PlatformError},
    usecases::{
        detect::detect_changes,
        walk::{ImageWalker, WalkOptions, image_name},
    },
};

/// Prompt used to generate product descriptions from the first product image
pub const DEFAULT_DESCRIPTION_PROMPT: &str = "Create an attractive and SEO friendly product description for use on an ecommerce website. It should make the product sound attractive and entice users to purchase it. Don't talk about the backdrop, only the product itself.";

/// Product description generation settings
#[derive(Debug, Clone)]
pub struct DescribeConfig {
    /// Replace descriptions that already have text
    pub overwrite: bool,
    pub prompt: String,
    pub max_length: usize,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            prompt: DEFAULT_DESCRIPTION_PROMPT.to_string(),
            max_length: 10_000,
        }
    }
}

/// Configuration for a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub walk: WalkOptions,
    /// Dry run mode (report changes, never write)
    pub dry_run: bool,
    pub query: ListQuery,
    /// Generate product descriptions when set
    pub describe: Option<DescribeConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            dry_run: true,
            query: ListQuery::default(),
            describe: None,
        }
    }
}

/// Errors that abort a whole run (per-item errors never do)
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Listing failed: {0}")]
    List(#[source] PlatformError),
}

#[derive(Debug, thiserror::Error)]
enum ItemError {
    #[error("Fetch failed: {0}")]
    Fetch(#[source] PlatformError),
    #[error("Captioning failed: {0}")]
    Caption(#[from] CaptionError),
    #[error("Write failed: {0}")]
    Write(#[source] PlatformError),
}

/// Alt-text run orchestrator
pub struct AltTextRun<P, C>
where
    P: ContentPlatform + ?Sized,
    C: Captioner + ?Sized,
{
    platform: Arc<P>,
    captioner: Arc<C>,
    config: RunConfig,
    stop: Arc<AtomicBool>,
}

impl<P, C> AltTextRun<P, C>
where
    P: ContentPlatform + ?Sized,
    C: Captioner + ?Sized,
{
    pub fn new(platform: Arc<P>, captioner: Arc<C>, config: RunConfig) -> Self {
        Self {
            platform,
            captioner,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between items; once set, the run stops at the next boundary
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// List items on the platform and process each in listing order
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        tracing::info!(
            platform = self.platform.name(),
            status = ?self.config.query.status,
            limit = self.config.query.limit,
            dry_run = self.config.dry_run,
            "Listing items"
        );

        let items = self
            .platform
            .list(&self.config.query)
            .await
            .map_err(RunError::List)?;

        tracing::info!(count = items.len(), "Listed items");
        Ok(self.process_all(items).await)
    }

    /// Process an explicit set of item ids instead of listing
    pub async fn run_ids(&self, kind: ContentKind, ids: &[String]) -> RunSummary {
        let items = ids.iter().map(|id| ListedItem::id(id.as_str(), kind)).collect();
        self.process_all(items).await
    }

    async fn process_all(&self, items: Vec<ListedItem>) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = items.len();

        for (index, listed) in items.into_iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                tracing::warn!(remaining = total - index, "Stop requested, ending run");
                break;
            }

            let id = listed.id.clone();
            tracing::debug!(item = index + 1, total = total, id = %id, "Processing item");
            let result = self.process_item(listed).await;

            match &result {
                ProcessResult::Updated {
                    title,
                    captioned,
                    fields,
                    dry_run: true,
                } => {
                    tracing::info!(
                        id = %id,
                        title = %title,
                        captioned = captioned,
                        fields = ?fields,
                        "[DRY RUN] Would update item"
                    );
                }
                ProcessResult::Updated {
                    title,
                    captioned,
                    fields,
                    ..
                } => {
                    tracing::info!(
                        id = %id,
                        title = %title,
                        captioned = captioned,
                        fields = ?fields,
                        "Updated item"
                    );
                }
                ProcessResult::Unchanged { title } => {
                    tracing::info!(id = %id, title = %title, "No changes, skipping write");
                }
                ProcessResult::Failed { error } => {
                    tracing::error!(id = %id, error = %error, "Failed to process item");
                    // Continue with other items
                }
            }

            summary.record(&id, &result);
        }

        tracing::info!(
            processed = summary.processed,
            updated = summary.updated(),
            unchanged = summary.unchanged,
            failed = summary.failures.len(),
            images_captioned = summary.images_captioned,
            "Run complete"
        );

        summary
    }

    /// Process a single item; never fails the batch
    async fn process_item(&self, listed: ListedItem) -> ProcessResult {
        match self.try_process_item(listed).await {
            Ok(result) => result,
            Err(e) => ProcessResult::Failed {
                error: e.to_string(),
            },
        }
    }

    async fn try_process_item(&self, listed: ListedItem) -> Result<ProcessResult, ItemError> {
        let original = match listed.item {
            Some(item) => item,
            None => self
                .platform
                .fetch(listed.kind, &listed.id)
                .await
                .map_err(ItemError::Fetch)?,
        };

        tracing::info!(
            id = %original.id,
            title = %original.title,
            body = original.body.shape(),
            "Processing"
        );

        let (candidate, report) = self.walk_item(&original).await?;
        let update = detect_changes(&original, &candidate, &report);

        if update.is_empty() {
            return Ok(ProcessResult::Unchanged {
                title: original.title,
            });
        }

        if !self.config.dry_run {
            self.platform
                .write(&original, &update)
                .await
                .map_err(ItemError::Write)?;
        }

        Ok(ProcessResult::Updated {
            title: original.title,
            captioned: report.captioned(),
            fields: update.fields(),
            dry_run: self.config.dry_run,
        })
    }

    /// Walk an owned copy of the item; the original is never mutated
    async fn walk_item(
        &self,
        original: &ContentItem,
    ) -> Result<(ContentItem, WalkReport), ItemError> {
        let walker = ImageWalker::new(self.captioner.as_ref(), self.config.walk);
        let mut candidate = original.clone();
        let mut report = WalkReport::default();

        let body = std::mem::replace(&mut candidate.body, ContentBody::Empty);
        let (body, touched) = walker.walk(body).await?;
        candidate.body = body;
        report.body_images = touched;

        if let Some(description) = &candidate.description {
            let (rewritten, touched) = walker.walk_html(description).await?;
            candidate.description = Some(rewritten);
            report.description_images = touched;
        }

        if let Some(featured) = candidate.featured_image.as_mut() {
            report.featured = walker.walk_featured(featured).await?;
        }

        if let Some(describe) = &self.config.describe {
            report.description_generated = self.generate_description(&mut candidate, describe).await?;
        }

        Ok((candidate, report))
    }

    /// Write a product description from the first product image
    async fn generate_description(
        &self,
        item: &mut ContentItem,
        describe: &DescribeConfig,
    ) -> Result<bool, CaptionError> {
        if item.kind != ContentKind::Product {
            return Ok(false);
        }

        let has_text = item
            .description
            .as_deref()
            .is_some_and(|description| !html::strip_tags(description).trim().is_empty());
        if has_text && !describe.overwrite {
            tracing::debug!(id = %item.id, "Product already has a description, skipping");
            return Ok(false);
        }

        let Some(image) = first_image(&item.body) else {
            tracing::info!(id = %item.id, "Product has no images, cannot describe it");
            return Ok(false);
        };

        tracing::info!(id = %item.id, image = %image_name(&image), "Generating product description");
        let generated = self
            .captioner
            .describe(&image, &describe.prompt, describe.max_length)
            .await?;

        match generated.filter(|text| !text.trim().is_empty()) {
            Some(text) => {
                item.description = Some(text);
                Ok(true)
            }
            None => {
                tracing::warn!(id = %item.id, "No description returned");
                Ok(false)
            }
        }
    }
}

fn first_image(body: &ContentBody) -> Option<String> {
    match body {
        ContentBody::Images(images) => images.iter().find_map(|image| image.src.clone()),
        ContentBody::Html(markup) => html::img_tags(markup)
            .iter()
            .find_map(|tag| tag.src().map(String::from)),
        ContentBody::Lexical(document) => document
            .images()
            .into_iter()
            .find_map(|image| image.src.clone()),
        ContentBody::Empty => None,
    }
}
