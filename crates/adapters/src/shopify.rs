//! Shopify admin REST API adapter (products)

use alt_texter_domain::{
    ContentBody, ContentItem, ContentKind, ContentPlatform, ImageRecord, ItemUpdate, ListQuery,
    ListedItem, PlatformError,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::{AuthProvider, HeaderToken};
use crate::gallery::gallery_payload;
use crate::http::{self, DEFAULT_TIMEOUT_SECS};
use crate::pagination::collect_since;

/// Admin API version this adapter speaks
pub const API_VERSION: &str = "2024-01";

/// Header carrying the admin access token
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Shopify caps `limit` at 250 per page
const MAX_PAGE_SIZE: usize = 250;

/// Shopify content platform (product images and `body_html`)
pub struct ShopifyPlatform {
    client: Client,
    auth: HeaderToken,
    api_url: String,
}

impl ShopifyPlatform {
    pub fn new(shop: &str, auth: HeaderToken) -> Self {
        Self::with_timeout(shop, auth, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(shop: &str, auth: HeaderToken, timeout_secs: u64) -> Self {
        Self::with_base_url(
            auth,
            format!("https://{}.myshopify.com/admin/api/{}", shop, API_VERSION),
            timeout_secs,
        )
    }

    pub fn with_base_url(auth: HeaderToken, base_url: String, timeout_secs: u64) -> Self {
        Self {
            client: http::build_client(timeout_secs),
            auth,
            api_url: http::normalize_base(&base_url),
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
        status: Option<&str>,
        page_size: usize,
        since_id: Option<String>,
    ) -> Result<Vec<ContentItem>, PlatformError> {
        let url = format!("{}/products.json", self.api_url);
        let mut params = vec![("limit", page_size.to_string())];
        if let Some(since_id) = since_id {
            params.push(("since_id", since_id));
        }
        if let Some(status) = status {
            params.push(("status", status.to_string()));
        }

        let envelope: ProductsEnvelope =
            http::read_json(self.send(self.client.get(&url).query(&params)).await?).await?;
        Ok(envelope
            .products
            .into_iter()
            .map(ShopifyProduct::into_item)
            .collect())
    }
}

fn ensure_product(kind: ContentKind) -> Result<(), PlatformError> {
    if kind == ContentKind::Product {
        Ok(())
    } else {
        Err(PlatformError::Unsupported(format!(
            "Shopify only manages products, not {}",
            kind.as_str()
        )))
    }
}

/// Shopify ids are numeric; send them back as numbers when they parse
fn id_value(id: &str) -> Value {
    id.parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(id.to_string()))
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    products: Vec<ShopifyProduct>,
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: ShopifyProduct,
}

#[derive(Deserialize)]
struct ShopifyProduct {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    images: Vec<ImageRecord>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl ShopifyProduct {
    fn into_item(self) -> ContentItem {
        let id = self.id.to_string();
        ContentItem {
            title: self.title.unwrap_or_else(|| id.clone()),
            id,
            kind: ContentKind::Product,
            body: ContentBody::Images(self.images),
            description: Some(self.body_html.unwrap_or_default()),
            featured_image: None,
            revision: self.updated_at,
        }
    }
}

#[async_trait]
impl ContentPlatform for ShopifyPlatform {
    fn name(&self) -> &'static str {
        "shopify"
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ListedItem>, PlatformError> {
        for kind in &query.content_types {
            ensure_product(*kind)?;
        }
        let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
        let status = query.status.as_deref();

        tracing::info!(status = ?status, "Listing Shopify products");
        let products = collect_since(
            page_size,
            query.limit,
            |product: &ContentItem| product.id.clone(),
            |since_id| self.list_page(status, page_size, since_id),
        )
        .await?;

        Ok(products.into_iter().map(ListedItem::loaded).collect())
    }

    async fn fetch(&self, kind: ContentKind, id: &str) -> Result<ContentItem, PlatformError> {
        ensure_product(kind)?;
        let url = format!("{}/products/{}.json", self.api_url, id);

        let envelope: ProductEnvelope =
            http::read_json(self.send(self.client.get(&url)).await?).await?;
        Ok(envelope.product.into_item())
    }

    async fn write(&self, item: &ContentItem, update: &ItemUpdate) -> Result<(), PlatformError> {
        ensure_product(item.kind)?;
        let mut product = Map::new();
        product.insert("id".to_string(), id_value(&item.id));

        match &update.body {
            Some(ContentBody::Images(images)) => {
                product.insert("images".to_string(), gallery_payload(images, &["position"]));
            }
            Some(other) => {
                return Err(PlatformError::Unsupported(format!(
                    "Shopify cannot store a {} body",
                    other.shape()
                )));
            }
            None => {}
        }
        if let Some(description) = &update.description {
            product.insert("body_html".to_string(), Value::String(description.clone()));
        }

        let mut payload = Map::new();
        payload.insert("product".to_string(), Value::Object(product));

        let url = format!("{}/products/{}.json", self.api_url, item.id);
        let request = self.client.put(&url).json(&payload);
        http::ensure_success(self.send(request).await?).await?;

        tracing::debug!(id = %item.id, fields = ?update.fields(), "Wrote Shopify product");
        Ok(())
    }
}
