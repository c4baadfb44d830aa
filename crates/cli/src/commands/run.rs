//! Run command - caption alt-less images and write them back

use alt_texter_adapters::{
    GhostPlatform, ShopifyPlatform, WooCommercePlatform, WordPressPlatform,
    auth::{
        BasicCredentials, ConsumerKeyPair, GhostAdminKey, GhostTokenProvider, HeaderToken,
        KeyTransport,
    },
    shopify::ACCESS_TOKEN_HEADER,
};
use alt_texter_domain::{
    Captioner, ContentKind, ContentPlatform, ListQuery, RunSummary,
    usecases::{AltTextRun, DescribeConfig, RunConfig, WalkOptions},
};
use anyhow::{Context, Result, bail};
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::args::RunArgs;
use crate::commands::caption::{build_captioner, load_secret};
use crate::config::AppConfig;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let platform_name = args
        .platform
        .clone()
        .unwrap_or_else(|| config.general.platform.clone());
    let dry_run = !args.write && (args.dry_run || config.general.dry_run);

    let mut run_config = run_config_from_config(&config, dry_run)?;
    run_config.walk.overwrite |= args.overwrite;
    if let Some(limit) = args.limit {
        run_config.query.limit = limit;
    }
    if args.status.is_some() {
        run_config.query.status = args.status.clone();
    }

    tracing::info!(
        platform = %platform_name,
        dry_run = dry_run,
        overwrite = run_config.walk.overwrite,
        ids = args.ids.len(),
        "Starting alt-texter run"
    );

    let platform = build_platform(&config, &platform_name)?;
    let captioner: Arc<dyn Captioner> = Arc::from(build_captioner(&config)?);
    let run = AltTextRun::new(platform, captioner, run_config);

    // Stop between items on Ctrl+C
    let stop = run.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping after the current item");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let summary = if args.ids.is_empty() {
        run.run().await.context("Run failed")?
    } else {
        let kind = match &args.kind {
            Some(kind) => kind.parse::<ContentKind>().map_err(anyhow::Error::msg)?,
            None => default_kind(&platform_name),
        };
        run.run_ids(kind, &args.ids).await
    };

    if args.json {
        let output = serde_json::json!({
            "platform": platform_name,
            "dry_run": dry_run,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&summary, dry_run);
    }

    if !summary.failures.is_empty() {
        bail!("{} of {} items failed", summary.failures.len(), summary.processed);
    }

    tracing::info!("alt-texter run completed");
    Ok(())
}

pub(crate) fn build_platform(config: &AppConfig, name: &str) -> Result<Arc<dyn ContentPlatform>> {
    let timeout = config.general.timeout_secs;

    match name.trim() {
        "ghost" => {
            let url = require(&config.ghost.url, "ghost.url")?;
            let secret = load_secret(&config.ghost.admin_key_env, "ghost")?;
            let key = GhostAdminKey::parse(secret.expose_secret())
                .context("Invalid Ghost admin API key")?;
            Ok(Arc::new(GhostPlatform::with_timeout(
                url,
                GhostTokenProvider::new(key),
                timeout,
            )))
        }
        "wordpress" => {
            let url = require(&config.wordpress.url, "wordpress.url")?;
            let username = require(&config.wordpress.username, "wordpress.username")?;
            let password = load_secret(&config.wordpress.password_env, "wordpress")?;
            Ok(Arc::new(WordPressPlatform::with_timeout(
                url,
                BasicCredentials::new(username, password),
                timeout,
            )))
        }
        "woocommerce" => {
            let url = require(&config.woocommerce.url, "woocommerce.url")?;
            let key = load_secret(&config.woocommerce.consumer_key_env, "woocommerce")?;
            let secret = load_secret(&config.woocommerce.consumer_secret_env, "woocommerce")?;
            let transport = config
                .woocommerce
                .key_transport
                .parse::<KeyTransport>()
                .map_err(anyhow::Error::msg)?;
            Ok(Arc::new(WooCommercePlatform::with_timeout(
                url,
                ConsumerKeyPair::new(key.expose_secret(), secret, transport),
                timeout,
            )))
        }
        "shopify" => {
            let shop = require(&config.shopify.shop, "shopify.shop")?;
            let token = load_secret(&config.shopify.access_token_env, "shopify")?;
            Ok(Arc::new(ShopifyPlatform::with_timeout(
                shop,
                HeaderToken::new(ACCESS_TOKEN_HEADER, token),
                timeout,
            )))
        }
        other => bail!("Unknown platform: {}", other),
    }
}

pub(crate) fn run_config_from_config(config: &AppConfig, dry_run: bool) -> Result<RunConfig> {
    let processing = &config.processing;

    let content_types = processing
        .content_types
        .iter()
        .map(|kind| kind.parse::<ContentKind>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;

    let describe = processing.write_descriptions.then(|| DescribeConfig {
        overwrite: processing.overwrite_descriptions,
        max_length: processing.description_max_length,
        ..Default::default()
    });

    Ok(RunConfig {
        walk: WalkOptions {
            overwrite: processing.overwrite,
            max_length: config.captioning.max_length,
            max_tries: config.captioning.max_tries,
        },
        dry_run,
        query: ListQuery {
            status: processing.status.clone(),
            order: processing.order.clone(),
            limit: processing.limit,
            page_size: processing.page_size,
            content_types,
        },
        describe,
    })
}

/// Kind assumed for `--id` when none is given
fn default_kind(platform: &str) -> ContentKind {
    match platform {
        "woocommerce" | "shopify" => ContentKind::Product,
        _ => ContentKind::Post,
    }
}

fn require<'a>(value: &'a str, key: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{} is not configured", key);
    }
    Ok(value)
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    if dry_run {
        println!("Run Summary (dry run, nothing written)");
    } else {
        println!("Run Summary");
    }
    println!("===========");
    println!();
    println!("Processed:        {}", summary.processed);
    println!("Updated:          {}", summary.updated());
    println!("Unchanged:        {}", summary.unchanged);
    println!("Failed:           {}", summary.failures.len());
    println!("Images captioned: {}", summary.images_captioned);

    if !summary.updated_titles.is_empty() {
        println!();
        println!("Updated items:");
        for title in &summary.updated_titles {
            println!("  - {}", title);
        }
    }

    if !summary.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in &summary.failures {
            println!("  - {}: {}", failure.id, failure.error);
        }
    }
}
