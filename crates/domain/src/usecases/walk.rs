//! Image walkers - locate alt-less images in each body shape and caption them

use futures::future::BoxFuture;

use crate::{
    html,
    lexical::{AltText, LexicalDocument, LexicalNode},
    model::{
        ContentBody, DEFAULT_ALT_MAX_LENGTH, DEFAULT_MAX_TRIES, FeaturedImage, ImageRecord,
        alt_is_missing,
    },
    ports::{CaptionError, Captioner},
    truncate_chars,
};

/// Options applied uniformly to every image a walker visits
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    /// Re-caption images that already have alt text
    pub overwrite: bool,
    /// Maximum caption length in characters
    pub max_length: usize,
    /// Captioning attempts per image
    pub max_tries: u32,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            max_length: DEFAULT_ALT_MAX_LENGTH,
            max_tries: DEFAULT_MAX_TRIES,
        }
    }
}

/// Walks item bodies and fills in alt text via a captioner
pub struct ImageWalker<'a, C: Captioner + ?Sized> {
    captioner: &'a C,
    options: WalkOptions,
}

impl<'a, C: Captioner + ?Sized> ImageWalker<'a, C> {
    pub fn new(captioner: &'a C, options: WalkOptions) -> Self {
        Self { captioner, options }
    }

    /// Walk any body shape, returning the mutated body and how many images
    /// were (re)captioned
    pub async fn walk(&self, body: ContentBody) -> Result<(ContentBody, usize), CaptionError> {
        match body {
            ContentBody::Lexical(mut document) => {
                let touched = self.walk_lexical(&mut document).await?;
                Ok((ContentBody::Lexical(document), touched))
            }
            ContentBody::Html(markup) => {
                let (markup, touched) = self.walk_html(&markup).await?;
                Ok((ContentBody::Html(markup), touched))
            }
            ContentBody::Images(mut images) => {
                let touched = self.walk_images(&mut images).await?;
                Ok((ContentBody::Images(images), touched))
            }
            ContentBody::Empty => Ok((ContentBody::Empty, 0)),
        }
    }

    /// Depth-first pre-order walk over the whole lexical tree
    pub async fn walk_lexical(&self, document: &mut LexicalDocument) -> Result<usize, CaptionError> {
        self.walk_node(&mut document.root).await
    }

    fn walk_node<'n>(&'n self, node: &'n mut LexicalNode) -> BoxFuture<'n, Result<usize, CaptionError>>
    where
        'a: 'n,
    {
        Box::pin(async move {
            let mut touched = 0;

            if let LexicalNode::Image(image) = &mut *node {
                if let Some(alt) = self.caption_for(image.src.as_deref(), image.alt.as_str()).await? {
                    image.alt = AltText::Text(alt);
                    touched += 1;
                }
            }

            // Images may nest; containers always may
            if let Some(children) = node.children_mut() {
                for child in children.iter_mut() {
                    touched += self.walk_node(child).await?;
                }
            }

            Ok(touched)
        })
    }

    /// Caption every `<img>` in the document; returns the rewritten markup
    pub async fn walk_html(&self, markup: &str) -> Result<(String, usize), CaptionError> {
        let tags = html::img_tags(markup);
        if tags.is_empty() {
            return Ok((markup.to_string(), 0));
        }

        let mut replacements = vec![];
        for tag in &tags {
            if let Some(alt) = self.caption_for(tag.src(), tag.alt()).await? {
                replacements.push((tag.range.clone(), tag.with_alt(markup, &alt)));
            }
        }

        let touched = replacements.len();
        if touched == 0 {
            return Ok((markup.to_string(), 0));
        }
        Ok((html::splice(markup, replacements), touched))
    }

    /// Single pass over a flat image list
    pub async fn walk_images(&self, images: &mut [ImageRecord]) -> Result<usize, CaptionError> {
        let total = images.len();
        let mut touched = 0;

        for (index, image) in images.iter_mut().enumerate() {
            tracing::debug!(image = index + 1, total = total, "Checking gallery image");
            if let Some(alt) = self.caption_for(image.src.as_deref(), image.alt.as_deref()).await? {
                image.alt = Some(alt);
                touched += 1;
            }
        }

        Ok(touched)
    }

    /// Featured/cover image, with the platform field limit applied on top
    pub async fn walk_featured(&self, featured: &mut FeaturedImage) -> Result<bool, CaptionError> {
        let Some(alt) = self
            .caption_for(featured.url.as_deref(), featured.alt.as_deref())
            .await?
        else {
            return Ok(false);
        };

        let alt = match featured.alt_limit {
            Some(limit) => truncate_chars(&alt, limit),
            None => alt,
        };
        featured.alt = Some(alt);
        Ok(true)
    }

    /// Decide whether an image needs a caption and fetch one if so
    async fn caption_for(
        &self,
        src: Option<&str>,
        current_alt: Option<&str>,
    ) -> Result<Option<String>, CaptionError> {
        let Some(src) = src.filter(|src| !src.trim().is_empty()) else {
            tracing::debug!("Image has no source, skipping");
            return Ok(None);
        };

        let name = image_name(src);
        if !self.options.overwrite && !alt_is_missing(current_alt) {
            tracing::info!(image = %name, "Image already has alt text, skipping");
            return Ok(None);
        }

        tracing::info!(image = %name, "Captioning image");
        let caption = self
            .captioner
            .caption(src, self.options.max_length, self.options.max_tries)
            .await?;

        match caption {
            Some(text) if !text.is_empty() => Ok(Some(text)),
            _ => {
                tracing::warn!(
                    image = %name,
                    attempts = self.options.max_tries,
                    "No caption available, leaving alt text unset"
                );
                Ok(None)
            }
        }
    }
}

/// Short display name for an image reference
pub fn image_name(src: &str) -> &str {
    if src.starts_with("data:") {
        return "data-uri";
    }
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::{ContainerNode, ImageNode};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captioner that records every image it is asked about
    struct RecordingCaptioner {
        reply: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingCaptioner {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                calls: Mutex::new(vec![]),
            }
        }

        fn silent() -> Self {
            Self {
                reply: None,
                calls: Mutex::new(vec![]),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Captioner for RecordingCaptioner {
        async fn caption(
            &self,
            image: &str,
            max_length: usize,
            _max_tries: u32,
        ) -> Result<Option<String>, CaptionError> {
            self.calls.lock().unwrap().push(image.to_string());
            Ok(self.reply.as_deref().map(|text| truncate_chars(text, max_length)))
        }

        async fn describe(
            &self,
            _image: &str,
            _prompt: &str,
            _max_length: usize,
        ) -> Result<Option<String>, CaptionError> {
            Ok(None)
        }
    }

    fn nested_document() -> LexicalDocument {
        LexicalDocument::new(LexicalNode::Container(ContainerNode::new(
            "root",
            vec![
                LexicalNode::Image(ImageNode::new("https://blog/1.png", AltText::Absent)),
                LexicalNode::Container(ContainerNode::new(
                    "paragraph",
                    vec![
                        LexicalNode::Image(ImageNode::new(
                            "https://blog/2.png",
                            AltText::Text("Already described".to_string()),
                        )),
                        LexicalNode::Container(ContainerNode::new(
                            "callout",
                            vec![LexicalNode::Image(ImageNode::new(
                                "https://blog/3.png",
                                AltText::Null,
                            ))],
                        )),
                    ],
                )),
            ],
        )))
    }

    #[tokio::test]
    async fn test_lexical_walk_captions_missing_alts_in_pre_order() {
        let captioner = RecordingCaptioner::replying("A generated caption");
        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        let mut document = nested_document();

        let touched = walker.walk_lexical(&mut document).await.unwrap();

        assert_eq!(touched, 2);
        assert_eq!(captioner.calls(), vec!["https://blog/1.png", "https://blog/3.png"]);
        let images = document.images();
        assert_eq!(images[0].alt.as_str(), Some("A generated caption"));
        assert_eq!(images[1].alt.as_str(), Some("Already described"));
        assert_eq!(images[2].alt.as_str(), Some("A generated caption"));
    }

    #[tokio::test]
    async fn test_overwrite_captions_every_image() {
        let captioner = RecordingCaptioner::replying("Fresh");
        let walker = ImageWalker::new(
            &captioner,
            WalkOptions {
                overwrite: true,
                ..Default::default()
            },
        );
        let mut document = nested_document();

        let touched = walker.walk_lexical(&mut document).await.unwrap();

        assert_eq!(touched, 3);
        assert_eq!(captioner.calls().len(), 3);
        assert!(document.images().iter().all(|img| img.alt.as_str() == Some("Fresh")));
    }

    #[tokio::test]
    async fn test_exhausted_caption_leaves_alt_missing() {
        let captioner = RecordingCaptioner::silent();
        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        let mut document = nested_document();
        let original = document.clone();

        let touched = walker.walk_lexical(&mut document).await.unwrap();

        assert_eq!(touched, 0);
        assert_eq!(captioner.calls().len(), 2);
        assert_eq!(document, original);
    }

    #[tokio::test]
    async fn test_html_walk_skips_described_images() {
        let captioner = RecordingCaptioner::replying("A lighthouse");
        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        let markup = r#"<p>Intro</p><img src="https://site/a.jpg"><img src="https://site/b.jpg" alt="Kept">"#;

        let (rewritten, touched) = walker.walk_html(markup).await.unwrap();

        assert_eq!(touched, 1);
        assert_eq!(captioner.calls(), vec!["https://site/a.jpg"]);
        assert_eq!(
            rewritten,
            r#"<p>Intro</p><img src="https://site/a.jpg" alt="A lighthouse"><img src="https://site/b.jpg" alt="Kept">"#
        );
    }

    #[tokio::test]
    async fn test_html_walk_leaves_commented_images_alone() {
        let captioner = RecordingCaptioner::replying("Cap");
        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        let markup = r#"<p>x</p><!-- <img src="https://old/removed.png"> --><img src="https://site/a.jpg">"#;

        let (rewritten, touched) = walker.walk_html(markup).await.unwrap();

        assert_eq!(touched, 1);
        assert_eq!(captioner.calls(), vec!["https://site/a.jpg"]);
        assert_eq!(
            rewritten,
            r#"<p>x</p><!-- <img src="https://old/removed.png"> --><img src="https://site/a.jpg" alt="Cap">"#
        );
    }

    #[tokio::test]
    async fn test_html_walk_survives_apostrophe_in_unquoted_alt() {
        let captioner = RecordingCaptioner::replying("Cap");
        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        let markup = r#"<img src=a.png alt=Bob's><p>text</p><img src="b.png"><p>it's</p>"#;

        let (rewritten, touched) = walker.walk_html(markup).await.unwrap();

        assert_eq!(touched, 1);
        assert_eq!(captioner.calls(), vec!["b.png"]);
        assert!(rewritten.contains(r#"<img src="b.png" alt="Cap">"#));
    }

    #[tokio::test]
    async fn test_html_overwrite_recaptions_described_images() {
        let captioner = RecordingCaptioner::replying("Fresh");
        let walker = ImageWalker::new(
            &captioner,
            WalkOptions {
                overwrite: true,
                ..Default::default()
            },
        );
        let markup = r#"<img src="https://site/a.jpg"><img src="https://site/b.jpg" alt="Kept">"#;

        let (rewritten, touched) = walker.walk_html(markup).await.unwrap();

        assert_eq!(touched, 2);
        assert_eq!(captioner.calls().len(), 2);
        assert_eq!(
            rewritten,
            r#"<img src="https://site/a.jpg" alt="Fresh"><img src="https://site/b.jpg" alt="Fresh">"#
        );
    }

    #[tokio::test]
    async fn test_image_list_overwrite_recaptions_every_image() {
        let captioner = RecordingCaptioner::replying("Blue mug");
        let walker = ImageWalker::new(
            &captioner,
            WalkOptions {
                overwrite: true,
                ..Default::default()
            },
        );
        let mut images = vec![
            ImageRecord::new("https://shop/1.jpg", None),
            ImageRecord::new("https://shop/2.jpg", Some("Red mug")),
        ];

        let touched = walker.walk_images(&mut images).await.unwrap();

        assert_eq!(touched, 2);
        assert!(images.iter().all(|img| img.alt.as_deref() == Some("Blue mug")));
    }

    #[tokio::test]
    async fn test_featured_overwrite_replaces_existing_alt() {
        let captioner = RecordingCaptioner::replying("A harbour at dusk");
        let mut featured = FeaturedImage {
            url: Some("https://blog/cover.png".to_string()),
            alt: Some("Old cover".to_string()),
            alt_limit: None,
        };

        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        assert!(!walker.walk_featured(&mut featured).await.unwrap());
        assert_eq!(featured.alt.as_deref(), Some("Old cover"));

        let walker = ImageWalker::new(
            &captioner,
            WalkOptions {
                overwrite: true,
                ..Default::default()
            },
        );
        assert!(walker.walk_featured(&mut featured).await.unwrap());
        assert_eq!(featured.alt.as_deref(), Some("A harbour at dusk"));
        assert_eq!(captioner.calls(), vec!["https://blog/cover.png"]);
    }

    #[tokio::test]
    async fn test_image_list_counts_only_captioned_images() {
        let captioner = RecordingCaptioner::replying("Blue mug");
        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        let mut images = vec![
            ImageRecord::new("https://shop/1.jpg", None),
            ImageRecord::new("https://shop/2.jpg", Some("")),
            ImageRecord::new("https://shop/3.jpg", Some("Red mug")),
            ImageRecord {
                src: None,
                alt: None,
                extra: Default::default(),
            },
        ];

        let touched = walker.walk_images(&mut images).await.unwrap();

        assert_eq!(touched, 2);
        assert_eq!(captioner.calls().len(), 2);
        assert_eq!(images[0].alt.as_deref(), Some("Blue mug"));
        assert_eq!(images[1].alt.as_deref(), Some("Blue mug"));
        assert_eq!(images[2].alt.as_deref(), Some("Red mug"));
        assert!(images[3].alt.is_none());
    }

    #[tokio::test]
    async fn test_featured_alt_respects_platform_limit() {
        let captioner = RecordingCaptioner::replying(&"x".repeat(200));
        let walker = ImageWalker::new(
            &captioner,
            WalkOptions {
                max_length: 500,
                ..Default::default()
            },
        );
        let mut featured = FeaturedImage {
            url: Some("https://blog/cover.png".to_string()),
            alt: None,
            alt_limit: Some(125),
        };

        assert!(walker.walk_featured(&mut featured).await.unwrap());
        assert_eq!(featured.alt.as_ref().map(|alt| alt.chars().count()), Some(125));
    }

    #[tokio::test]
    async fn test_data_uri_passed_verbatim() {
        let captioner = RecordingCaptioner::replying("Pixel");
        let walker = ImageWalker::new(&captioner, WalkOptions::default());
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        let mut images = vec![ImageRecord::new(uri, None)];

        walker.walk_images(&mut images).await.unwrap();

        assert_eq!(captioner.calls(), vec![uri]);
    }

    #[test]
    fn test_image_name() {
        assert_eq!(image_name("https://cdn/x/photo.jpg?w=300"), "photo.jpg");
        assert_eq!(image_name("data:image/png;base64,AAAA"), "data-uri");
    }
}
