//! alt-texter domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `lexical`: Typed Ghost lexical document tree
//! - `html`: `<img>` scanning and rewriting for flat HTML bodies
//! - `usecases`: Walking, change detection, orchestration and auditing

pub mod html;
pub mod lexical;
pub mod model;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;

/// Truncate to at most `max` characters (not bytes, not word-aware)
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 125), "short");
        assert_eq!(truncate_chars("anything", 0), "");
    }
}
