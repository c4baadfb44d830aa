//! Stub captioner for testing and offline mode

use alt_texter_domain::{CaptionError, Captioner, truncate_chars, usecases::image_name};
use async_trait::async_trait;

/// Stub captioner that returns configurable captions without network access
pub struct StubCaptioner {
    reply: StubReply,
}

enum StubReply {
    /// Caption derived from the image file name
    Named,
    Fixed(String),
    Empty,
}

impl StubCaptioner {
    /// Create a stub that captions each image after its file name
    pub fn named() -> Self {
        Self {
            reply: StubReply::Named,
        }
    }

    /// Create a stub that always returns the same caption
    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            reply: StubReply::Fixed(text.into()),
        }
    }

    /// Create a stub that never produces a caption
    pub fn empty() -> Self {
        Self {
            reply: StubReply::Empty,
        }
    }

    fn reply_for(&self, image: &str) -> Option<String> {
        match &self.reply {
            StubReply::Named => Some(format!("Stub caption for {}", image_name(image))),
            StubReply::Fixed(text) => Some(text.clone()),
            StubReply::Empty => None,
        }
    }
}

impl Default for StubCaptioner {
    fn default() -> Self {
        Self::named()
    }
}

#[async_trait]
impl Captioner for StubCaptioner {
    async fn caption(
        &self,
        image: &str,
        max_length: usize,
        _max_tries: u32,
    ) -> Result<Option<String>, CaptionError> {
        Ok(self
            .reply_for(image)
            .map(|text| truncate_chars(&text, max_length)))
    }

    async fn describe(
        &self,
        image: &str,
        _prompt: &str,
        max_length: usize,
    ) -> Result<Option<String>, CaptionError> {
        Ok(self
            .reply_for(image)
            .map(|text| truncate_chars(&format!("Product description. {}", text), max_length)))
    }
}
