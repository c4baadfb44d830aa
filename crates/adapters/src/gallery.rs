//! Outgoing image-list payloads for the e-commerce platforms

use alt_texter_domain::ImageRecord;
use serde_json::{Map, Value};

/// Serialize a gallery for a product update.
///
/// Every image is sent, otherwise the platform drops the ones left out.
/// Images with a platform id are referenced by id (plus `keep` fields) so
/// nothing is re-uploaded; images without one are sent by `src`.
pub(crate) fn gallery_payload(images: &[ImageRecord], keep: &[&str]) -> Value {
    Value::Array(
        images
            .iter()
            .map(|image| {
                let mut entry = Map::new();
                match image.extra.get("id") {
                    Some(id) if !id.is_null() => {
                        entry.insert("id".to_string(), id.clone());
                        for field in keep {
                            if let Some(value) = image.extra.get(*field) {
                                entry.insert(field.to_string(), value.clone());
                            }
                        }
                    }
                    _ => {
                        if let Some(src) = &image.src {
                            entry.insert("src".to_string(), Value::String(src.clone()));
                        }
                    }
                }
                entry.insert(
                    "alt".to_string(),
                    Value::String(image.alt.clone().unwrap_or_default()),
                );
                Value::Object(entry)
            })
            .collect(),
    )
}
