use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::errors::ReportError;
use crate::reporting::table::MAX_DATA_ROWS;
use super::types::*;

pub const SEND_PROJECT_BREAKDOWN: &str = "SEND_PROJECT_BREAKDOWN";
pub const SEND_THREAD_DETAILS: &str = "SEND_THREAD_DETAILS";
pub const SEND_FAILURE_ALERTS: &str = "SEND_FAILURE_ALERTS";
pub const SLACK_API_TOKEN: &str = "SLACK_API_TOKEN";
pub const SLACK_CHANNEL_ID: &str = "SLACK_CHANNEL_ID";
pub const BQ_TABLE: &str = "BQ_TABLE";
pub const BILLING_CREDENTIALS_FILE: &str = "BILLING_CREDENTIALS_FILE";
pub const REPORT_LAG_DAYS: &str = "REPORT_LAG_DAYS";
pub const REPORT_TOP_N: &str = "REPORT_TOP_N";
pub const RUN_TIMEOUT_SECS: &str = "RUN_TIMEOUT_SECS";
pub const FETCH_MAX_ATTEMPTS: &str = "FETCH_MAX_ATTEMPTS";
pub const SLACK_API_BASE_URL: &str = "SLACK_API_BASE_URL";
pub const BIGQUERY_API_BASE_URL: &str = "BIGQUERY_API_BASE_URL";
pub const TRIGGER_TOKEN: &str = "TRIGGER_TOKEN";

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<ReportConfig, ReportError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
///
/// Empty values are treated as unset.
pub fn load_with<F>(lookup: F) -> Result<ReportConfig, ReportError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let require = |key: &str| {
        get(key).ok_or_else(|| ReportError::Config(format!("{} is not set", key)))
    };
    let flag = |key: &str, default: bool| match get(key) {
        Some(raw) => parse_bool(key, &raw),
        None => Ok(default),
    };

    let config = ReportConfig {
        include_breakdown: flag(SEND_PROJECT_BREAKDOWN, true)?,
        include_thread_detail: flag(SEND_THREAD_DETAILS, true)?,
        send_failure_alerts: flag(SEND_FAILURE_ALERTS, true)?,
        slack_token: require(SLACK_API_TOKEN)?,
        destination: require(SLACK_CHANNEL_ID)?,
        billing_table: require(BQ_TABLE)?.parse()?,
        credentials_path: get(BILLING_CREDENTIALS_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH)),
        lag_days: parse_number(REPORT_LAG_DAYS, get(REPORT_LAG_DAYS), DEFAULT_LAG_DAYS, 0)?,
        top_n: parse_top_n(get(REPORT_TOP_N))?,
        run_timeout: Duration::from_secs(parse_number(
            RUN_TIMEOUT_SECS,
            get(RUN_TIMEOUT_SECS),
            DEFAULT_RUN_TIMEOUT_SECS,
            1,
        )?),
        fetch_max_attempts: parse_number(
            FETCH_MAX_ATTEMPTS,
            get(FETCH_MAX_ATTEMPTS),
            DEFAULT_FETCH_MAX_ATTEMPTS,
            1,
        )?,
        slack_base_url: parse_base_url(
            SLACK_API_BASE_URL,
            get(SLACK_API_BASE_URL),
            DEFAULT_SLACK_API_BASE_URL,
        )?,
        bigquery_base_url: parse_base_url(
            BIGQUERY_API_BASE_URL,
            get(BIGQUERY_API_BASE_URL),
            DEFAULT_BIGQUERY_API_BASE_URL,
        )?,
        trigger_token: get(TRIGGER_TOKEN),
    };

    debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Strict boolean parsing: `true` or `false`, case-insensitive.
pub fn parse_bool(name: &str, raw: &str) -> Result<bool, ReportError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ReportError::Config(format!(
            "{} must be 'true' or 'false', got '{}'",
            name, raw
        ))),
    }
}

fn parse_number<T>(name: &str, raw: Option<String>, default: T, min: T) -> Result<T, ReportError>
where
    T: FromStr + PartialOrd + std::fmt::Display,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: T = raw
        .parse()
        .map_err(|_| ReportError::Config(format!("{} must be a number, got '{}'", name, raw)))?;
    if value < min {
        return Err(ReportError::Config(format!("{} must be at least {}", name, min)));
    }
    Ok(value)
}

/// Project rows beyond what fits in one table block would be dropped silently.
fn parse_top_n(raw: Option<String>) -> Result<usize, ReportError> {
    let top_n = parse_number(REPORT_TOP_N, raw, DEFAULT_TOP_N, 1)?;
    if top_n > MAX_DATA_ROWS {
        return Err(ReportError::Config(format!(
            "{} must be at most {}, got {}",
            REPORT_TOP_N, MAX_DATA_ROWS, top_n
        )));
    }
    Ok(top_n)
}

fn parse_base_url(name: &str, raw: Option<String>, default: &str) -> Result<String, ReportError> {
    let url = raw.unwrap_or_else(|| default.to_string());
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ReportError::Config(format!("{} must be an http(s) URL, got '{}'", name, url)));
    }
    Ok(url.trim_end_matches('/').to_string())
}
