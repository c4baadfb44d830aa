//! Audit command - read-only alt text coverage report

use alt_texter_domain::usecases::{AuditReport, audit};
use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::args::AuditArgs;
use crate::commands::run::{build_platform, run_config_from_config};
use crate::config::AppConfig;

pub async fn execute(args: AuditArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let platform_name = args
        .platform
        .clone()
        .unwrap_or_else(|| config.general.platform.clone());
    let mut query = run_config_from_config(&config, true)?.query;
    if let Some(limit) = args.limit {
        query.limit = limit;
    }

    let platform = build_platform(&config, &platform_name)?;

    tracing::info!(platform = %platform_name, limit = query.limit, "Auditing items");
    let listed = platform.list(&query).await.context("Listing failed")?;

    let mut items = Vec::with_capacity(listed.len());
    for entry in listed {
        match entry.item {
            Some(item) => items.push(item),
            None => match platform.fetch(entry.kind, &entry.id).await {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!(id = %entry.id, error = %e, "Skipping item"),
            },
        }
    }

    let report = audit(&items);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &AuditReport) {
    println!("Alt Text Audit");
    println!("==============");
    println!();

    if report.rows.is_empty() {
        println!("No items found.");
        return;
    }

    println!(
        "{:<12} {:<40} {:>6} {:>8} {:>6}",
        "ID", "TITLE", "IMAGES", "MISSING", "WORDS"
    );
    for row in &report.rows {
        println!(
            "{:<12} {:<40} {:>6} {:>8} {:>6}",
            row.id,
            clip(&row.title, 40),
            row.images,
            row.missing_alt,
            row.description_words
        );
    }

    println!();
    println!("Items:                     {}", report.rows.len());
    println!("Images:                    {}", report.total_images);
    println!("Missing alt text:          {}", report.total_missing_alt);
    println!(
        "Average description words: {:.1}",
        report.average_description_words
    );
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped = alt_texter_domain::truncate_chars(text, width.saturating_sub(1));
        clipped.push('…');
        clipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_keeps_short_titles() {
        assert_eq!(clip("Mug", 40), "Mug");
    }

    #[test]
    fn test_clip_shortens_long_titles_to_width() {
        let clipped = clip("A very long product title indeed", 10);
        assert_eq!(clipped.chars().count(), 10);
        assert!(clipped.ends_with('…'));
    }
}
