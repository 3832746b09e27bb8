use crate::app_config::{AppConfig, Environment, ExportFormat, HeaderRotation};
use crate::ConfigError;

const DEFAULT_BASE_URL: &str = "https://logammulia.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Pure parsing/validation, decoupled from the process environment so it can
/// be tested with a `HashMap` lookup.
///
/// Telegram credentials are optional here; [`AppConfig::require_telegram`]
/// enforces them once the caller knows notifications are wanted.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(var, "expected one of true/false/1/0/yes/no".to_string())
        })
    };

    let env = parse_environment(&or_default("LMSTOCK_ENV", "development"))?;
    let log_level = or_default("LMSTOCK_LOG_LEVEL", env.default_log_level());
    let base_url = or_default("LMSTOCK_BASE_URL", DEFAULT_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    let branches_path = optional("LMSTOCK_BRANCHES_PATH").map(PathBuf::from);

    let request_timeout_secs = parse_u64("LMSTOCK_REQUEST_TIMEOUT_SECS", "45")?;
    let max_attempts = parse_u32("LMSTOCK_MAX_ATTEMPTS", "5")?;
    if max_attempts == 0 {
        return Err(invalid("LMSTOCK_MAX_ATTEMPTS", "must be at least 1".to_string()));
    }
    let retry_base_delay_ms = parse_u64("LMSTOCK_RETRY_BASE_DELAY_MS", "5000")?;
    let retry_max_delay_ms = parse_u64("LMSTOCK_RETRY_MAX_DELAY_MS", "60000")?;
    if retry_max_delay_ms < retry_base_delay_ms {
        return Err(invalid(
            "LMSTOCK_RETRY_MAX_DELAY_MS",
            format!("must be >= LMSTOCK_RETRY_BASE_DELAY_MS ({retry_base_delay_ms})"),
        ));
    }
    let retry_jitter = parse_bool("LMSTOCK_RETRY_JITTER", "true")?;
    let header_rotation = parse_header_rotation(&or_default("LMSTOCK_HEADER_ROTATION", "random"))?;

    let extra_block_markers = parse_marker_list(&or_default("LMSTOCK_EXTRA_BLOCK_MARKERS", ""));

    let max_concurrent_branches = parse_usize("LMSTOCK_MAX_CONCURRENT_BRANCHES", "2")?;
    let min_request_spacing_ms = parse_u64("LMSTOCK_MIN_REQUEST_SPACING_MS", "3000")?;
    let run_timeout_secs = match optional("LMSTOCK_RUN_TIMEOUT_SECS") {
        Some(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("LMSTOCK_RUN_TIMEOUT_SECS", e.to_string()))?,
        ),
        None => None,
    };

    let export_dir = PathBuf::from(or_default("LMSTOCK_EXPORT_DIR", "./exports"));
    let export_formats = parse_export_formats(&or_default("LMSTOCK_EXPORT_FORMATS", "json"))?;

    let alerts_enabled = parse_bool("LMSTOCK_ALERTS_ENABLED", "true")?;
    let error_notifications = parse_bool("LMSTOCK_ERROR_NOTIFICATIONS", "false")?;
    let summary_reports = parse_bool("LMSTOCK_SUMMARY_REPORTS", "false")?;

    Ok(AppConfig {
        env,
        log_level,
        base_url,
        branches_path,
        request_timeout_secs,
        max_attempts,
        retry_base_delay_ms,
        retry_max_delay_ms,
        retry_jitter,
        header_rotation,
        extra_block_markers,
        max_concurrent_branches,
        min_request_spacing_ms,
        run_timeout_secs,
        export_dir,
        export_formats,
        alerts_enabled,
        error_notifications,
        summary_reports,
        telegram_bot_token: optional("TELEGRAM_BOT_TOKEN"),
        telegram_chat_id: optional("TELEGRAM_CHAT_ID"),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LMSTOCK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_header_rotation(s: &str) -> Result<HeaderRotation, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "round-robin" | "round_robin" | "roundrobin" => Ok(HeaderRotation::RoundRobin),
        "random" => Ok(HeaderRotation::Random),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LMSTOCK_HEADER_ROTATION".to_string(),
            reason: format!("unknown rotation '{other}' (expected random or round-robin)"),
        }),
    }
}

/// Comma-separated list; empty entries are ignored, duplicates collapsed.
fn parse_export_formats(s: &str) -> Result<Vec<ExportFormat>, ConfigError> {
    let mut formats = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let format = part
            .parse::<ExportFormat>()
            .map_err(|reason| ConfigError::InvalidEnvVar {
                var: "LMSTOCK_EXPORT_FORMATS".to_string(),
                reason,
            })?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

/// Comma-separated markers, lowercased so they compare against lowercased bodies.
fn parse_marker_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
