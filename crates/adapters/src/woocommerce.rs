//! WooCommerce REST API adapter (products)

use alt_texter_domain::{
    ContentBody, ContentItem, ContentKind, ContentPlatform, ImageRecord, ItemUpdate, ListQuery,
    ListedItem, PlatformError,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::{AuthProvider, ConsumerKeyPair};
use crate::gallery::gallery_payload;
use crate::http::{self, DEFAULT_TIMEOUT_SECS};
use crate::pagination::collect_pages;

const DEFAULT_STATUS: &str = "publish";

/// WooCommerce content platform (product galleries and descriptions)
pub struct WooCommercePlatform {
    client: Client,
    auth: ConsumerKeyPair,
    api_url: String,
}

impl WooCommercePlatform {
    pub fn new(site_url: &str, auth: ConsumerKeyPair) -> Self {
        Self::with_timeout(site_url, auth, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(site_url: &str, auth: ConsumerKeyPair, timeout_secs: u64) -> Self {
        Self {
            client: http::build_client(timeout_secs),
            auth,
            api_url: format!("{}/wp-json/wc/v3", http::normalize_base(site_url)),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let request = self
            .auth
            .authorize(request)
            .map_err(|e| PlatformError::Auth(e.to_string()))?;
        request.send().await.map_err(http::network_error)
    }

    async fn list_page(
        &self,
        status: &str,
        page_size: usize,
        page: u32,
    ) -> Result<Vec<ContentItem>, PlatformError> {
        let url = format!("{}/products", self.api_url);
        let request = self.client.get(&url).query(&[
            ("per_page", page_size.to_string()),
            ("page", page.to_string()),
            ("status", status.to_string()),
        ]);

        let products: Vec<WooProduct> = http::read_json(self.send(request).await?).await?;
        Ok(products.into_iter().map(WooProduct::into_item).collect())
    }
}

fn ensure_product(kind: ContentKind) -> Result<(), PlatformError> {
    if kind == ContentKind::Product {
        Ok(())
    } else {
        Err(PlatformError::Unsupported(format!(
            "WooCommerce only manages products, not {}",
            kind.as_str()
        )))
    }
}

#[derive(Deserialize)]
struct WooProduct {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    images: Vec<ImageRecord>,
    #[serde(default)]
    date_modified_gmt: Option<String>,
}

impl WooProduct {
    fn into_item(self) -> ContentItem {
        let id = self.id.to_string();
        ContentItem {
            title: self.name.unwrap_or_else(|| id.clone()),
            id,
            kind: ContentKind::Product,
            body: ContentBody::Images(self.images),
            description: Some(self.description.unwrap_or_default()),
            featured_image: None,
            revision: self.date_modified_gmt,
        }
    }
}

#[async_trait]
impl ContentPlatform for WooCommercePlatform {
    fn name(&self) -> &'static str {
        "woocommerce"
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ListedItem>, PlatformError> {
        for kind in &query.content_types {
            ensure_product(*kind)?;
        }
        let status = query.status.as_deref().unwrap_or(DEFAULT_STATUS);

        tracing::info!(status = status, "Listing WooCommerce products");
        let products = collect_pages(query.page_size, query.limit, |page| {
            self.list_page(status, query.page_size, page)
        })
        .await?;

        Ok(products.into_iter().map(ListedItem::loaded).collect())
    }

    async fn fetch(&self, kind: ContentKind, id: &str) -> Result<ContentItem, PlatformError> {
        ensure_product(kind)?;
        let url = format!("{}/products/{}", self.api_url, id);

        let product: WooProduct = http::read_json(self.send(self.client.get(&url)).await?).await?;
        Ok(product.into_item())
    }

    async fn write(&self, item: &ContentItem, update: &ItemUpdate) -> Result<(), PlatformError> {
        ensure_product(item.kind)?;
        let mut payload = Map::new();

        match &update.body {
            Some(ContentBody::Images(images)) => {
                payload.insert("images".to_string(), gallery_payload(images, &["name"]));
            }
            Some(other) => {
                return Err(PlatformError::Unsupported(format!(
                    "WooCommerce cannot store a {} body",
                    other.shape()
                )));
            }
            None => {}
        }
        if let Some(description) = &update.description {
            payload.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }

        let url = format!("{}/products/{}", self.api_url, item.id);
        let request = self.client.put(&url).json(&payload);
        http::ensure_success(self.send(request).await?).await?;

        tracing::debug!(id = %item.id, fields = ?update.fields(), "Wrote WooCommerce product");
        Ok(())
    }
}
