//! Doctor command - validate configuration and show status

use alt_texter_adapters::auth::{GhostAdminKey, KeyTransport};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    captioning: CheckResult,
    platform: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        captioning: CheckResult::error("Not checked"),
        platform: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully").with_details(
                serde_json::json!({
                    "platform": c.general.platform,
                    "dry_run": c.general.dry_run,
                }),
            );
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.captioning = check_captioning(config);
        report.platform = check_platform(config);
    }

    let checks = [&report.config, &report.captioning, &report.platform];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_captioning(config: &AppConfig) -> CheckResult {
    let captioning = &config.captioning;

    match captioning.provider.as_str() {
        "stub" => CheckResult::ok("Provider: stub (offline)"),
        "scenexplain" | "scenex" => {
            if captioning.endpoint.trim().is_empty() {
                return CheckResult::error("SceneXplain endpoint is empty");
            }
            let result = match env_state(&captioning.api_key_env) {
                EnvState::Unnamed => {
                    CheckResult::error("No API key env var configured for scenexplain")
                }
                EnvState::Set => CheckResult::ok(format!(
                    "Provider: scenexplain, API key: {} (set)",
                    captioning.api_key_env
                )),
                EnvState::Unset => CheckResult::warn(format!(
                    "Provider: scenexplain, API key: {} (not set)",
                    captioning.api_key_env
                )),
            };
            result.with_details(serde_json::json!({
                "endpoint": captioning.endpoint,
                "max_length": captioning.max_length,
                "max_tries": captioning.max_tries,
            }))
        }
        other => CheckResult::error(format!("Unknown captioning provider: {}", other)),
    }
}

fn check_platform(config: &AppConfig) -> CheckResult {
    let platform = config.general.platform.as_str();

    let (site, secrets): (&str, Vec<&str>) = match platform {
        "ghost" => (
            config.ghost.url.as_str(),
            vec![config.ghost.admin_key_env.as_str()],
        ),
        "wordpress" => {
            if config.wordpress.username.trim().is_empty() {
                return CheckResult::error("wordpress.username is not configured");
            }
            (
                config.wordpress.url.as_str(),
                vec![config.wordpress.password_env.as_str()],
            )
        }
        "woocommerce" => {
            if let Err(e) = config.woocommerce.key_transport.parse::<KeyTransport>() {
                return CheckResult::error(e);
            }
            (
                config.woocommerce.url.as_str(),
                vec![
                    config.woocommerce.consumer_key_env.as_str(),
                    config.woocommerce.consumer_secret_env.as_str(),
                ],
            )
        }
        "shopify" => (
            config.shopify.shop.as_str(),
            vec![config.shopify.access_token_env.as_str()],
        ),
        other => return CheckResult::error(format!("Unknown platform: {}", other)),
    };

    if site.trim().is_empty() {
        return CheckResult::error(format!("Platform: {}, site is not configured", platform));
    }

    let mut missing = vec![];
    for env_var in &secrets {
        match env_state(env_var) {
            EnvState::Unnamed => {
                return CheckResult::error(format!(
                    "Platform: {}, no credential env var configured",
                    platform
                ));
            }
            EnvState::Unset => missing.push(*env_var),
            EnvState::Set => {}
        }
    }

    if !missing.is_empty() {
        return CheckResult::warn(format!(
            "Platform: {}, site: {}, credentials not set: {}",
            platform,
            site,
            missing.join(", ")
        ));
    }

    // The Ghost key is parsed locally so a malformed key shows up here, not mid-run
    if platform == "ghost" {
        if let Ok(key) = std::env::var(&config.ghost.admin_key_env) {
            if let Err(e) = GhostAdminKey::parse(&key) {
                return CheckResult::error(format!("Platform: ghost, {}", e));
            }
        }
    }

    CheckResult::ok(format!(
        "Platform: {}, site: {}, credentials: {} (set)",
        platform,
        site,
        secrets.join(", ")
    ))
}

enum EnvState {
    Unnamed,
    Unset,
    Set,
}

// Presence only; values are never printed
fn env_state(env_var: &str) -> EnvState {
    if env_var.trim().is_empty() {
        return EnvState::Unnamed;
    }
    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => EnvState::Set,
        _ => EnvState::Unset,
    }
}

fn print_report(report: &DoctorReport) {
    println!("alt-texter Doctor Report");
    println!("========================");
    println!();

    print_check("Config", &report.config);
    print_check("Captioning", &report.captioning);
    print_check("Platform", &report.platform);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: alt-texter run --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_captioning_is_ok() {
        let mut config = AppConfig::default();
        config.captioning.provider = "stub".to_string();

        assert!(check_captioning(&config).is_ok());
    }

    #[test]
    fn test_platform_without_site_is_error() {
        let mut config = AppConfig::default();
        config.general.platform = "shopify".to_string();

        let result = check_platform(&config);
        assert!(result.is_error());
        assert!(result.message.contains("site is not configured"));
    }

    #[test]
    fn test_unknown_platform_is_error() {
        let mut config = AppConfig::default();
        config.general.platform = "tumblr".to_string();

        assert!(check_platform(&config).is_error());
    }

    #[test]
    fn test_missing_credentials_warn() {
        let mut config = AppConfig::default();
        config.general.platform = "woocommerce".to_string();
        config.woocommerce.url = "https://shop.example".to_string();
        config.woocommerce.consumer_key_env = "ALT_TEXTER_TEST_UNSET_KEY".to_string();
        config.woocommerce.consumer_secret_env = "ALT_TEXTER_TEST_UNSET_SECRET".to_string();

        let result = check_platform(&config);
        assert_eq!(result.status, "warn");
        assert!(result.message.contains("ALT_TEXTER_TEST_UNSET_KEY"));
    }
}
