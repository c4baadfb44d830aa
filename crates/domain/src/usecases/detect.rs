//! Change detection - decide which fields of an item actually changed

use crate::{
    html,
    lexical::LexicalDocument,
    model::{ContentBody, ContentItem, ItemUpdate, WalkReport, alt_is_missing},
};

/// Structural comparison of two lexical trees
pub fn lexical_changed(original: &LexicalDocument, candidate: &LexicalDocument) -> bool {
    original != candidate
}

/// Compare the `(src, alt)` pairs of two HTML documents, ignoring markup drift
pub fn html_changed(original: &str, candidate: &str) -> bool {
    html::image_pairs(original) != html::image_pairs(candidate)
}

/// Build the minimal update carrying only fields that changed
pub fn detect_changes(
    original: &ContentItem,
    candidate: &ContentItem,
    report: &WalkReport,
) -> ItemUpdate {
    let body_changed = match (&original.body, &candidate.body) {
        (ContentBody::Lexical(a), ContentBody::Lexical(b)) => lexical_changed(a, b),
        (ContentBody::Html(a), ContentBody::Html(b)) => html_changed(a, b),
        // The walker's counter is sufficient evidence for image lists
        (ContentBody::Images(_), ContentBody::Images(_)) => report.body_images > 0,
        (ContentBody::Empty, ContentBody::Empty) => false,
        _ => true,
    };

    let description_changed = match (&original.description, &candidate.description) {
        _ if report.description_generated => true,
        (Some(a), Some(b)) => html_changed(a, b),
        (None, None) => false,
        _ => true,
    };

    let original_alt = original
        .featured_image
        .as_ref()
        .and_then(|image| image.alt.as_deref());
    let candidate_alt = candidate
        .featured_image
        .as_ref()
        .and_then(|image| image.alt.as_deref());
    let featured_changed = !alt_is_missing(candidate_alt) && original_alt != candidate_alt;

    ItemUpdate {
        body: body_changed.then(|| candidate.body.clone()),
        description: if description_changed {
            candidate.description.clone()
        } else {
            None
        },
        featured_image_alt: if featured_changed {
            candidate_alt.map(String::from)
        } else {
            None
        },
    }
}

/// Whether anything meaningful differs between the original and candidate
pub fn changed(original: &ContentItem, candidate: &ContentItem, report: &WalkReport) -> bool {
    !detect_changes(original, candidate, report).is_empty()
}
