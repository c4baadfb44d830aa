//! Caption command - one-shot captioning of a single image

use alt_texter_adapters::captioning::{CaptionConfig, SceneXplainCaptioner, StubCaptioner};
use alt_texter_domain::Captioner;
use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use std::path::PathBuf;

use crate::args::CaptionArgs;
use crate::config::AppConfig;

pub async fn execute(args: CaptionArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    if args.image.trim().is_empty() {
        bail!("No image URL provided");
    }

    let captioner = build_captioner(&config)?;

    let (mode, text) = match &args.prompt {
        Some(prompt) => {
            let max_length = args
                .max_length
                .unwrap_or(config.processing.description_max_length);
            tracing::info!(image = %args.image, max_length = max_length, "Describing image");
            let text = captioner
                .describe(&args.image, prompt, max_length)
                .await
                .context("Describing failed")?;
            ("describe", text)
        }
        None => {
            let max_length = args.max_length.unwrap_or(config.captioning.max_length);
            tracing::info!(image = %args.image, max_length = max_length, "Captioning image");
            let text = captioner
                .caption(&args.image, max_length, config.captioning.max_tries)
                .await
                .context("Captioning failed")?;
            ("caption", text)
        }
    };

    if args.json {
        let output = serde_json::json!({
            "image": args.image,
            "mode": mode,
            "text": text,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match text {
            Some(text) => println!("{}", text),
            None => bail!(
                "No caption after {} attempts",
                config.captioning.max_tries.max(1)
            ),
        }
    }

    Ok(())
}

pub(crate) fn build_captioner(config: &AppConfig) -> Result<Box<dyn Captioner>> {
    let caption_config = CaptionConfig {
        language: config.captioning.language.clone(),
        timeout_secs: config.captioning.timeout_secs,
        backoff_base_ms: config.captioning.backoff_ms,
    };

    match config.captioning.provider.as_str() {
        "scenexplain" | "scenex" => {
            let api_key = load_secret(&config.captioning.api_key_env, "scenexplain")?;
            let endpoint = config.captioning.endpoint.trim();
            if endpoint.is_empty() {
                Ok(Box::new(SceneXplainCaptioner::new(api_key, caption_config)))
            } else {
                Ok(Box::new(SceneXplainCaptioner::with_base_url(
                    api_key,
                    endpoint.to_string(),
                    caption_config,
                )))
            }
        }
        "stub" => Ok(Box::new(StubCaptioner::named())),
        other => bail!("Unknown captioning provider: {}", other),
    }
}

/// Read a secret from the environment variable named in the config
pub(crate) fn load_secret(env_var: &str, owner: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No secret env var configured for {}", owner);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing env var {} for {}", env_var, owner))?;

    if value.trim().is_empty() {
        bail!("Env var {} is empty for {}", env_var, owner);
    }

    Ok(SecretString::new(value.into()))
}
