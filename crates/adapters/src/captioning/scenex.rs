//! SceneXplain captioning adapter

use alt_texter_domain::{CaptionError, Captioner, truncate_chars};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CaptionConfig, SCENEX_URL};

const ALT_TEXT_TASK: &str = "alt_text";
const QUESTION_ANSWER_FEATURE: &str = "question_answer";

/// Captioner backed by the SceneXplain describe API
pub struct SceneXplainCaptioner {
    client: Client,
    api_key: SecretString,
    endpoint: String,
    config: CaptionConfig,
}

impl SceneXplainCaptioner {
    pub fn new(api_key: SecretString, config: CaptionConfig) -> Self {
        Self::with_base_url(api_key, SCENEX_URL.to_string(), config)
    }

    /// `endpoint` is the full describe URL
    pub fn with_base_url(api_key: SecretString, endpoint: String, config: CaptionConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            endpoint,
            config,
        }
    }

    async fn call_api(&self, task: SceneXTask<'_>) -> Result<Option<String>, CaptionError> {
        let request = SceneXRequest { data: vec![task] };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", format!("token {}", self.api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CaptionError::Timeout
                } else {
                    CaptionError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CaptionError::Http { status, body });
        }

        let api_response: SceneXResponse = response
            .json()
            .await
            .map_err(|e| CaptionError::InvalidFormat(e.to_string()))?;

        Ok(api_response
            .result
            .into_iter()
            .next()
            .and_then(|result| result.text)
            .filter(|text| !text.trim().is_empty()))
    }

    /// Jittered exponential delay before retry `attempt` (1-based)
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base_ms;
        if base == 0 {
            return Duration::ZERO;
        }
        let exponential = base.saturating_mul(2_u64.saturating_pow(attempt - 1));
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        Duration::from_millis(exponential.saturating_add(jitter))
    }
}

#[derive(Serialize)]
struct SceneXRequest<'a> {
    data: Vec<SceneXTask<'a>>,
}

#[derive(Serialize)]
struct SceneXTask<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<&'a str>,
    image: &'a str,
    languages: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    features: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_length: Option<usize>,
}

#[derive(Deserialize)]
struct SceneXResponse {
    #[serde(default)]
    result: Vec<SceneXResult>,
}

#[derive(Deserialize)]
struct SceneXResult {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl Captioner for SceneXplainCaptioner {
    async fn caption(
        &self,
        image: &str,
        max_length: usize,
        max_tries: u32,
    ) -> Result<Option<String>, CaptionError> {
        let attempts = max_tries.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                tracing::warn!(attempt = attempt + 1, max_tries = attempts, "Empty caption, retrying");
                tokio::time::sleep(self.backoff(attempt)).await;
            }

            let task = SceneXTask {
                task_id: Some(ALT_TEXT_TASK),
                question: None,
                image,
                languages: vec![self.config.language.as_str()],
                features: vec![],
                output_length: None,
            };

            if let Some(text) = self.call_api(task).await? {
                return Ok(Some(truncate_chars(&text, max_length)));
            }
        }

        Ok(None)
    }

    async fn describe(
        &self,
        image: &str,
        prompt: &str,
        max_length: usize,
    ) -> Result<Option<String>, CaptionError> {
        let task = SceneXTask {
            task_id: None,
            question: Some(prompt),
            image,
            languages: vec![self.config.language.as_str()],
            features: vec![QUESTION_ANSWER_FEATURE],
            output_length: Some(max_length),
        };

        Ok(self
            .call_api(task)
            .await?
            .map(|text| truncate_chars(&text, max_length)))
    }
}
