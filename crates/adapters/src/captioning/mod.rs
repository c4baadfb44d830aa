//! Captioning adapters

pub mod scenex;
pub mod stub;

pub use scenex::SceneXplainCaptioner;
pub use stub::StubCaptioner;

use serde::{Deserialize, Serialize};

/// SceneXplain describe endpoint
pub const SCENEX_URL: &str = "https://api.scenex.jina.ai/v1/describe";

/// Common captioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Output language code
    pub language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Base delay between empty-result retries, in milliseconds (0 disables)
    pub backoff_base_ms: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            timeout_secs: 60,
            backoff_base_ms: 500,
        }
    }
}
