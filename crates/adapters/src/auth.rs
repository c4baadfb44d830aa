//! Per-request credential providers
//!
//! Every adapter owns its credentials and applies them to each outgoing
//! request. Nothing is cached between requests, so a Ghost token is minted
//! fresh from the clock every time.

use alt_texter_domain::{Clock, SystemClock};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretBox, SecretString};
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a Ghost admin token in seconds
pub const GHOST_TOKEN_TTL_SECS: i64 = 300;

/// Audience claim expected by the Ghost admin API
pub const GHOST_AUDIENCE: &str = "/admin/";

/// Error type for credential handling
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Admin API key must have the form <id>:<secret>")]
    MalformedKey,
    #[error("Admin API key secret is not valid hex: {0}")]
    InvalidSecret(#[from] hex::FromHexError),
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Applies credentials to an outgoing request
pub trait AuthProvider: Send + Sync {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError>;
}

/// A Ghost admin API key (`<id>:<hex secret>`)
pub struct GhostAdminKey {
    id: String,
    secret: SecretBox<[u8]>,
}

impl GhostAdminKey {
    pub fn parse(key: &str) -> Result<Self, AuthError> {
        let (id, secret) = key.trim().split_once(':').ok_or(AuthError::MalformedKey)?;
        if id.is_empty() || secret.is_empty() {
            return Err(AuthError::MalformedKey);
        }
        let secret = hex::decode(secret)?;
        Ok(Self {
            id: id.to_string(),
            secret: SecretBox::new(secret.into_boxed_slice()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Mint an HS256 token valid for five minutes from `now`
    pub fn mint(&self, now: OffsetDateTime) -> Result<String, AuthError> {
        let iat = now.unix_timestamp();
        let header = serde_json::json!({"alg": "HS256", "typ": "JWT", "kid": self.id});
        let claims = serde_json::json!({
            "iat": iat,
            "exp": iat + GHOST_TOKEN_TTL_SECS,
            "aud": GHOST_AUDIENCE,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret())
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }
}

/// Signed-token provider for the Ghost admin API
pub struct GhostTokenProvider {
    key: GhostAdminKey,
    clock: Arc<dyn Clock>,
}

impl GhostTokenProvider {
    pub fn new(key: GhostAdminKey) -> Self {
        Self::with_clock(key, Arc::new(SystemClock))
    }

    pub fn with_clock(key: GhostAdminKey, clock: Arc<dyn Clock>) -> Self {
        Self { key, clock }
    }

    /// `Authorization` header value for a request sent now
    pub fn header_value(&self) -> Result<String, AuthError> {
        Ok(format!("Ghost {}", self.key.mint(self.clock.now())?))
    }
}

impl AuthProvider for GhostTokenProvider {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        Ok(request.header("Authorization", self.header_value()?))
    }
}

/// HTTP basic auth (WordPress application passwords)
pub struct BasicCredentials {
    username: String,
    password: SecretString,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl AuthProvider for BasicCredentials {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        Ok(request.basic_auth(&self.username, Some(self.password.expose_secret())))
    }
}

/// How a consumer key pair travels with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyTransport {
    /// HTTP basic auth (requires HTTPS)
    #[default]
    BasicAuth,
    /// `consumer_key`/`consumer_secret` query parameters
    QueryString,
}

impl std::str::FromStr for KeyTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "basic_auth" | "header" => Ok(KeyTransport::BasicAuth),
            "query" | "query_string" => Ok(KeyTransport::QueryString),
            other => Err(format!("Unknown key transport: {}", other)),
        }
    }
}

/// WooCommerce REST consumer key and secret
pub struct ConsumerKeyPair {
    key: String,
    secret: SecretString,
    transport: KeyTransport,
}

impl ConsumerKeyPair {
    pub fn new(key: impl Into<String>, secret: SecretString, transport: KeyTransport) -> Self {
        Self {
            key: key.into(),
            secret,
            transport,
        }
    }
}

impl AuthProvider for ConsumerKeyPair {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        Ok(match self.transport {
            KeyTransport::BasicAuth => {
                request.basic_auth(&self.key, Some(self.secret.expose_secret()))
            }
            KeyTransport::QueryString => request.query(&[
                ("consumer_key", self.key.as_str()),
                ("consumer_secret", self.secret.expose_secret()),
            ]),
        })
    }
}

/// A static token sent in a fixed header (Shopify admin access tokens)
pub struct HeaderToken {
    header: &'static str,
    token: SecretString,
}

impl HeaderToken {
    pub fn new(header: &'static str, token: SecretString) -> Self {
        Self { header, token }
    }
}

impl AuthProvider for HeaderToken {
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, AuthError> {
        Ok(request.header(self.header, self.token.expose_secret()))
    }
}

/// Decode the claims segment of a token
#[cfg(test)]
pub(crate) fn token_claims(token: &str) -> Option<serde_json::Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}
