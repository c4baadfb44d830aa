//! Ghost admin API adapter

use alt_texter_domain::{
    ContentBody, ContentItem, ContentKind, ContentPlatform, FeaturedImage, ItemUpdate, ListQuery,
    ListedItem, PlatformError, lexical::LexicalDocument,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::{AuthProvider, GhostTokenProvider};
use crate::http::{self, DEFAULT_TIMEOUT_SECS};
use crate::pagination::collect_pages;

/// Ghost's hard limit on `feature_image_alt`
pub const FEATURE_IMAGE_ALT_LIMIT: usize = 125;

const DEFAULT_STATUS: &str = "published";
const DEFAULT_ORDER: &str = "published_at desc";

/// Ghost content platform (posts and pages with lexical bodies)
pub struct GhostPlatform {
    client: Client,
    auth: GhostTokenProvider,
    admin_url: String,
}

impl GhostPlatform {
    pub fn new(site_url: &str, auth: GhostTokenProvider) -> Self {
        Self::with_timeout(site_url, auth, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(site_url: &str, auth: GhostTokenProvider, timeout_secs: u64) -> Self {
        Self {
            client: http::build_client(timeout_secs),
            auth,
            admin_url: format!("{}/ghost/api/admin", http::normalize_base(site_url)),
        }
    }

    /// Sign and send; a fresh token is minted for every request
    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let request = self
            .auth
            .authorize(request)
            .map_err(|e| PlatformError::Auth(e.to_string()))?;
        request.send().await.map_err(http::network_error)
    }

    async fn list_page(
        &self,
        resource: &str,
        status: &str,
        order: &str,
        page_size: usize,
        page: u32,
    ) -> Result<Vec<String>, PlatformError> {
        let url = format!("{}/{}/", self.admin_url, resource);
        let request = self.client.get(&url).query(&[
            ("filter", format!("status:{}", status)),
            ("limit", page_size.to_string()),
            ("page", page.to_string()),
            ("order", order.to_string()),
            ("fields", "id".to_string()),
        ]);

        let envelope: Envelope<GhostId> = http::read_json(self.send(request).await?).await?;
        Ok(envelope.posts.into_iter().map(|post| post.id).collect())
    }
}

fn resource(kind: ContentKind) -> Result<&'static str, PlatformError> {
    match kind {
        ContentKind::Post => Ok("posts"),
        ContentKind::Page => Ok("pages"),
        other => Err(PlatformError::Unsupported(format!(
            "Ghost has no {} content",
            other.as_str()
        ))),
    }
}

/// Ghost wraps every payload in a `posts` (or `pages`) array
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(alias = "pages")]
    posts: Vec<T>,
}

#[derive(Deserialize)]
struct GhostId {
    id: String,
}

#[derive(Deserialize)]
struct GhostPost {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    lexical: Option<String>,
    #[serde(default)]
    feature_image: Option<String>,
    #[serde(default)]
    feature_image_alt: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl GhostPost {
    fn into_item(self, kind: ContentKind) -> Result<ContentItem, PlatformError> {
        let body = match self.lexical.as_deref() {
            Some(json) if !json.trim().is_empty() => LexicalDocument::parse(json)
                .map(ContentBody::Lexical)
                .map_err(|e| PlatformError::MalformedBody {
                    id: self.id.clone(),
                    message: e.to_string(),
                })?,
            _ => ContentBody::Empty,
        };

        let featured_image = self.feature_image.map(|url| FeaturedImage {
            url: Some(url),
            alt: self.feature_image_alt,
            alt_limit: Some(FEATURE_IMAGE_ALT_LIMIT),
        });

        Ok(ContentItem {
            title: self.title.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            kind,
            body,
            description: None,
            featured_image,
            revision: self.updated_at,
        })
    }
}

#[async_trait]
impl ContentPlatform for GhostPlatform {
    fn name(&self) -> &'static str {
        "ghost"
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ListedItem>, PlatformError> {
        let kinds = if query.content_types.is_empty() {
            vec![ContentKind::Post]
        } else {
            query.content_types.clone()
        };
        let status = query.status.as_deref().unwrap_or(DEFAULT_STATUS);
        let order = query.order.as_deref().unwrap_or(DEFAULT_ORDER);

        let mut listed = Vec::new();
        for kind in kinds {
            let resource = resource(kind)?;
            let remaining = query.limit.saturating_sub(listed.len());
            let ids = collect_pages(query.page_size, remaining, |page| {
                self.list_page(resource, status, order, query.page_size, page)
            })
            .await?;
            tracing::debug!(resource = resource, count = ids.len(), "Listed Ghost ids");
            listed.extend(ids.into_iter().map(|id| ListedItem::id(id, kind)));
        }

        Ok(listed)
    }

    async fn fetch(&self, kind: ContentKind, id: &str) -> Result<ContentItem, PlatformError> {
        let url = format!("{}/{}/{}/", self.admin_url, resource(kind)?, id);
        let request = self.client.get(&url).query(&[("formats", "lexical")]);

        let envelope: Envelope<GhostPost> = http::read_json(self.send(request).await?).await?;
        envelope
            .posts
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::InvalidFormat(format!("No post returned for {}", id)))?
            .into_item(kind)
    }

    async fn write(&self, item: &ContentItem, update: &ItemUpdate) -> Result<(), PlatformError> {
        let mut post = Map::new();

        match &update.body {
            Some(ContentBody::Lexical(document)) => {
                let lexical = document
                    .to_json_string()
                    .map_err(|e| PlatformError::InvalidFormat(e.to_string()))?;
                post.insert("lexical".to_string(), Value::String(lexical));
            }
            Some(other) => {
                return Err(PlatformError::Unsupported(format!(
                    "Ghost cannot store a {} body",
                    other.shape()
                )));
            }
            None => {}
        }
        if update.description.is_some() {
            return Err(PlatformError::Unsupported(
                "Ghost posts have no product description".to_string(),
            ));
        }
        if let Some(alt) = &update.featured_image_alt {
            post.insert("feature_image_alt".to_string(), Value::String(alt.clone()));
        }
        // Ghost rejects updates that do not echo the current revision
        if let Some(revision) = &item.revision {
            post.insert("updated_at".to_string(), Value::String(revision.clone()));
        }

        let resource = resource(item.kind)?;
        let mut payload = Map::new();
        payload.insert(
            resource.to_string(),
            Value::Array(vec![Value::Object(post)]),
        );

        let url = format!("{}/{}/{}/", self.admin_url, resource, item.id);
        let request = self.client.put(&url).json(&payload);
        http::ensure_success(self.send(request).await?).await?;

        tracing::debug!(id = %item.id, fields = ?update.fields(), "Wrote Ghost post");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{GhostAdminKey, token_claims};
    use alt_texter_domain::Clock;
    use alt_texter_domain::lexical::AltText;
    use std::sync::{Arc, Mutex};
    use time::{Duration, OffsetDateTime, macros::datetime};
    use wiremock::matchers::{body_partial_json, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "65f1a2b3c4d5e6f700000001:a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";

    struct FakeClock {
        time: Mutex<OffsetDateTime>,
    }

    impl FakeClock {
        fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> OffsetDateTime {
            *self.time.lock().unwrap()
        }
    }

    fn platform(server: &MockServer, clock: Arc<FakeClock>) -> GhostPlatform {
        let key = GhostAdminKey::parse(KEY).unwrap();
        GhostPlatform::new(&server.uri(), GhostTokenProvider::with_clock(key, clock))
    }

    fn start_clock() -> Arc<FakeClock> {
        Arc::new(FakeClock {
            time: Mutex::new(datetime!(2024-05-01 09:00:00 UTC)),
        })
    }

    fn lexical_json() -> String {
        serde_json::json!({
            "root": {
                "type": "root",
                "children": [
                    {"type": "paragraph", "children": [{"type": "text", "text": "Hi"}]},
                    {"type": "image", "src": "https://blog/content/images/boat.jpg", "alt": ""}
                ]
            }
        })
        .to_string()
    }

    fn post_body() -> serde_json::Value {
        serde_json::json!({
            "posts": [{
                "id": "p1",
                "title": "Boats",
                "lexical": lexical_json(),
                "feature_image": "https://blog/content/images/cover.jpg",
                "feature_image_alt": null,
                "updated_at": "2024-04-30T10:00:00.000Z"
            }]
        })
    }

    #[tokio::test]
    async fn test_list_paginates_ids() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("filter", "status:published"))
            .and(query_param("fields", "id"))
            .and(query_param("page", "1"))
            .and(header_regex("Authorization", "^Ghost [^.]+\\.[^.]+\\.[^.]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [{"id": "a"}, {"id": "b"}],
                "meta": {"pagination": {"page": 1, "pages": 2}}
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [{"id": "c"}]
            })))
            .mount(&mock_server)
            .await;

        let query = ListQuery {
            page_size: 2,
            ..Default::default()
        };
        let listed = platform(&mock_server, start_clock())
            .list(&query)
            .await
            .unwrap();

        let ids: Vec<&str> = listed.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(listed.iter().all(|item| item.item.is_none()));
    }

    #[tokio::test]
    async fn test_fetch_parses_lexical_and_featured_image() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .and(query_param("formats", "lexical"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post_body()))
            .mount(&mock_server)
            .await;

        let item = platform(&mock_server, start_clock())
            .fetch(ContentKind::Post, "p1")
            .await
            .unwrap();

        assert_eq!(item.title, "Boats");
        assert_eq!(item.revision.as_deref(), Some("2024-04-30T10:00:00.000Z"));
        let featured = item.featured_image.unwrap();
        assert_eq!(featured.alt_limit, Some(125));
        assert!(featured.alt.is_none());
        match item.body {
            ContentBody::Lexical(document) => {
                let images = document.images();
                assert_eq!(images.len(), 1);
                assert_eq!(images[0].alt, AltText::Text(String::new()));
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_lexical_is_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [{"id": "p1", "title": "Broken", "lexical": "{not json"}]
            })))
            .mount(&mock_server)
            .await;

        let result = platform(&mock_server, start_clock())
            .fetch(ContentKind::Post, "p1")
            .await;

        assert!(matches!(result, Err(PlatformError::MalformedBody { .. })));
    }

    #[tokio::test]
    async fn test_fetch_error_carries_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Post not found"))
            .mount(&mock_server)
            .await;

        let result = platform(&mock_server, start_clock())
            .fetch(ContentKind::Post, "p1")
            .await;

        match result {
            Err(PlatformError::Http { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Post not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_keeps_response_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests, retry in 60s"))
            .mount(&mock_server)
            .await;

        let result = platform(&mock_server, start_clock())
            .fetch(ContentKind::Post, "p1")
            .await;

        match result {
            Err(PlatformError::RateLimited(body)) => {
                assert_eq!(body, "Too many requests, retry in 60s");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_sends_lexical_alt_and_revision() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post_body()))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .and(body_partial_json(serde_json::json!({
                "posts": [{
                    "feature_image_alt": "A harbour at dusk",
                    "updated_at": "2024-04-30T10:00:00.000Z"
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(post_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let ghost = platform(&mock_server, start_clock());
        let item = ghost.fetch(ContentKind::Post, "p1").await.unwrap();
        let update = ItemUpdate {
            body: Some(item.body.clone()),
            description: None,
            featured_image_alt: Some("A harbour at dusk".to_string()),
        };

        ghost.write(&item, &update).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let put = requests
            .iter()
            .find(|request| request.method.as_str() == "PUT")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
        let lexical = body["posts"][0]["lexical"].as_str().unwrap();
        assert_eq!(
            LexicalDocument::parse(lexical).unwrap(),
            LexicalDocument::parse(&lexical_json()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_write_after_ten_minutes_mints_fresh_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post_body()))
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/ghost/api/admin/posts/p1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post_body()))
            .mount(&mock_server)
            .await;

        let clock = start_clock();
        let ghost = platform(&mock_server, Arc::clone(&clock));
        let item = ghost.fetch(ContentKind::Post, "p1").await.unwrap();

        // Longer than the five-minute token lifetime
        clock.advance(Duration::minutes(10));
        let update = ItemUpdate {
            featured_image_alt: Some("A cover".to_string()),
            ..Default::default()
        };
        ghost.write(&item, &update).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let issued_at: Vec<i64> = requests
            .iter()
            .map(|request| {
                let header = request.headers.get("authorization").unwrap().to_str().unwrap();
                let token = header.strip_prefix("Ghost ").unwrap();
                token_claims(token).unwrap()["iat"].as_i64().unwrap()
            })
            .collect();

        assert_eq!(issued_at.len(), 2);
        assert_eq!(issued_at[1] - issued_at[0], 600);
        let write_claims = token_claims(
            requests[1]
                .headers
                .get("authorization")
                .unwrap()
                .to_str()
                .unwrap()
                .strip_prefix("Ghost ")
                .unwrap(),
        )
        .unwrap();
        assert!(write_claims["exp"].as_i64().unwrap() > clock.now().unix_timestamp());
    }

    #[tokio::test]
    async fn test_write_rejects_non_lexical_body() {
        let mock_server = MockServer::start().await;
        let ghost = platform(&mock_server, start_clock());
        let item = ContentItem {
            id: "p1".to_string(),
            kind: ContentKind::Post,
            title: "x".to_string(),
            body: ContentBody::Empty,
            description: None,
            featured_image: None,
            revision: None,
        };
        let update = ItemUpdate {
            body: Some(ContentBody::Html("<p></p>".to_string())),
            ..Default::default()
        };

        let result = ghost.write(&item, &update).await;

        assert!(matches!(result, Err(PlatformError::Unsupported(_))));
    }
}
