//! Read-only audit of alt-text coverage and description length

use serde::Serialize;

use crate::{
    html,
    model::{ContentBody, ContentItem, alt_is_missing},
};

/// One audited item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub id: String,
    pub title: String,
    pub images: usize,
    pub missing_alt: usize,
    pub description_words: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub rows: Vec<AuditRow>,
    pub total_images: usize,
    pub total_missing_alt: usize,
    pub average_description_words: f64,
}

/// Build an audit report over already-fetched items
pub fn audit(items: &[ContentItem]) -> AuditReport {
    let rows: Vec<AuditRow> = items.iter().map(audit_item).collect();

    let total_words: usize = rows.iter().map(|row| row.description_words).sum();
    let average_description_words = if rows.is_empty() {
        0.0
    } else {
        total_words as f64 / rows.len() as f64
    };

    AuditReport {
        total_images: rows.iter().map(|row| row.images).sum(),
        total_missing_alt: rows.iter().map(|row| row.missing_alt).sum(),
        average_description_words,
        rows,
    }
}

fn audit_item(item: &ContentItem) -> AuditRow {
    // Every alt this item carries, missing or not
    let mut alts: Vec<Option<String>> = match &item.body {
        ContentBody::Images(images) => images.iter().map(|image| image.alt.clone()).collect(),
        ContentBody::Html(markup) => html_alts(markup),
        ContentBody::Lexical(document) => document
            .images()
            .into_iter()
            .map(|image| image.alt.as_str().map(String::from))
            .collect(),
        ContentBody::Empty => vec![],
    };
    if let Some(description) = &item.description {
        alts.extend(html_alts(description));
    }
    if let Some(featured) = &item.featured_image {
        alts.push(featured.alt.clone());
    }

    AuditRow {
        id: item.id.clone(),
        title: item.title.clone(),
        images: alts.len(),
        missing_alt: alts
            .iter()
            .filter(|alt| alt_is_missing(alt.as_deref()))
            .count(),
        description_words: item
            .description
            .as_deref()
            .map(|description| html::strip_tags(description).split_whitespace().count())
            .unwrap_or(0),
    }
}

fn html_alts(markup: &str) -> Vec<Option<String>> {
    html::img_tags(markup)
        .iter()
        .map(|tag| tag.alt().map(String::from))
        .collect()
}
