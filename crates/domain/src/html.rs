//! `<img>` scanner and rewriter for flat HTML bodies
//!
//! Only `img` tags are located and rewritten; every other byte of the
//! markup is carried through unchanged. Comments and the raw-text elements
//! (`script`, `style`, `textarea`) are consumed whole, so markup inside them
//! never yields a tag.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

// A quote opens a string only directly after `=`; elsewhere it is plain text
const TAG_BODY: &str = r#"(?:[^>=]|=\s*"[^"]*"|=\s*'[^']*'|=)*>"#;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        concat!(
            r"(?is)<!--.*?(?:-->|\z)",
            r"|<script\b{body}.*?(?:</script\s*>|\z)",
            r"|<style\b{body}.*?(?:</style\s*>|\z)",
            r"|<textarea\b{body}.*?(?:</textarea\s*>|\z)",
            r"|(?P<img><img\b{body})",
        ),
        body = TAG_BODY
    );
    Regex::new(&pattern).expect("Valid regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
        .expect("Valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Valid regex"));

const TAG_PREFIX_LEN: usize = "<img".len();

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    value: Option<String>,
    /// Byte span within the tag text
    span: Range<usize>,
}

/// One `<img>` tag located in a document
#[derive(Debug, Clone)]
pub struct ImgTag {
    /// Byte range of the whole tag in the document
    pub range: Range<usize>,
    attributes: Vec<Attribute>,
}

impl ImgTag {
    fn parse(document: &str, range: Range<usize>) -> Self {
        let text = &document[range.clone()];
        let inner_end = text.len() - 1;
        let inner = &text[TAG_PREFIX_LEN..inner_end];

        let attributes = ATTRIBUTE
            .captures_iter(inner)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?.as_str().to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| decode_entities(m.as_str()));
                Some(Attribute {
                    name,
                    value,
                    span: whole.start() + TAG_PREFIX_LEN..whole.end() + TAG_PREFIX_LEN,
                })
            })
            .collect();

        Self { range, attributes }
    }

    fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn src(&self) -> Option<&str> {
        self.attribute("src").and_then(|attr| attr.value.as_deref())
    }

    /// Alt value; a bare `alt` attribute reads as empty
    pub fn alt(&self) -> Option<&str> {
        self.attribute("alt")
            .map(|attr| attr.value.as_deref().unwrap_or(""))
    }

    /// Rewrite this tag's text with `alt` set to the given value
    pub fn with_alt(&self, document: &str, alt: &str) -> String {
        let text = &document[self.range.clone()];
        let rendered = format!("alt=\"{}\"", encode_attribute(alt));

        match self.attribute("alt") {
            Some(existing) => format!(
                "{}{}{}",
                &text[..existing.span.start],
                rendered,
                &text[existing.span.end..]
            ),
            None => {
                let insert_at = self
                    .attributes
                    .last()
                    .map(|attr| attr.span.end)
                    .unwrap_or(TAG_PREFIX_LEN);
                format!("{} {}{}", &text[..insert_at], rendered, &text[insert_at..])
            }
        }
    }
}

/// Locate every `<img>` element in the document, in document order
pub fn img_tags(document: &str) -> Vec<ImgTag> {
    MARKUP
        .captures_iter(document)
        .filter_map(|caps| caps.name("img"))
        .map(|m| ImgTag::parse(document, m.range()))
        .collect()
}

/// Replace tag ranges with new text. Ranges must be sorted and disjoint.
pub fn splice(document: &str, replacements: Vec<(Range<usize>, String)>) -> String {
    let mut output = String::with_capacity(document.len());
    let mut cursor = 0;
    for (range, text) in replacements {
        output.push_str(&document[cursor..range.start]);
        output.push_str(&text);
        cursor = range.end;
    }
    output.push_str(&document[cursor..]);
    output
}

/// `(src, alt)` pairs of every image, sorted, with missing alts normalized
/// to `None`. Markup drift (quoting, attribute order, whitespace) does not
/// affect the result.
pub fn image_pairs(document: &str) -> Vec<(Option<String>, Option<String>)> {
    let mut pairs: Vec<_> = img_tags(document)
        .iter()
        .map(|tag| {
            let alt = tag.alt().filter(|alt| !alt.is_empty()).map(String::from);
            (tag.src().map(String::from), alt)
        })
        .collect();
    pairs.sort();
    pairs
}

/// Text content with all tags removed
pub fn strip_tags(document: &str) -> String {
    decode_entities(&TAG.replace_all(document, " "))
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn encode_attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
