use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::errors::{ReportError, RetryConfig};
use crate::reporting::formatter::FormatOptions;

pub const DEFAULT_CREDENTIALS_PATH: &str = "/var/secrets/billing-sa";
pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";
pub const DEFAULT_BIGQUERY_API_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const DEFAULT_LAG_DAYS: u32 = 2;
pub const DEFAULT_TOP_N: usize = 30;
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_FETCH_MAX_ATTEMPTS: u32 = 3;

/// Fully-qualified billing export table, `project.dataset.table`.
///
/// The name is interpolated into SQL, so it is restricted to the characters
/// BigQuery allows in identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingTable {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

fn table_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_-]+)\.([A-Za-z0-9_]+)\.([A-Za-z0-9_$*-]+)$")
            .expect("billing table pattern is valid")
    })
}

impl FromStr for BillingTable {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_matches('`');
        let caps = table_pattern().captures(raw).ok_or_else(|| {
            ReportError::Config(format!(
                "BQ_TABLE must look like project.dataset.table, got '{}'",
                s
            ))
        })?;
        Ok(Self {
            project: caps[1].to_string(),
            dataset: caps[2].to_string(),
            table: caps[3].to_string(),
        })
    }
}

impl fmt::Display for BillingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct ReportConfig {
    pub include_breakdown: bool,
    pub include_thread_detail: bool,
    pub send_failure_alerts: bool,
    pub slack_token: String,
    /// Slack channel id, or a user id (`U...`) for a direct message.
    pub destination: String,
    pub billing_table: BillingTable,
    pub credentials_path: PathBuf,
    /// Days between today and the report date; billing exports lag behind.
    pub lag_days: u32,
    pub top_n: usize,
    pub run_timeout: Duration,
    pub fetch_max_attempts: u32,
    pub slack_base_url: String,
    pub bigquery_base_url: String,
    pub trigger_token: Option<String>,
}

impl ReportConfig {
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            include_breakdown: self.include_breakdown,
            include_thread_detail: self.include_thread_detail,
            top_n: self.top_n,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.fetch_max_attempts,
            ..RetryConfig::default()
        }
    }

    /// Secret values that must never appear in logs or outbound messages.
    pub fn secrets(&self) -> Vec<&str> {
        let mut secrets = vec![self.slack_token.as_str()];
        if let Some(token) = &self.trigger_token {
            secrets.push(token.as_str());
        }
        secrets
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("include_breakdown", &self.include_breakdown)
            .field("include_thread_detail", &self.include_thread_detail)
            .field("send_failure_alerts", &self.send_failure_alerts)
            .field("slack_token", &"[REDACTED]")
            .field("destination", &"[REDACTED]")
            .field("billing_table", &self.billing_table.to_string())
            .field("credentials_path", &self.credentials_path)
            .field("lag_days", &self.lag_days)
            .field("top_n", &self.top_n)
            .field("run_timeout", &self.run_timeout)
            .field("fetch_max_attempts", &self.fetch_max_attempts)
            .field("slack_base_url", &self.slack_base_url)
            .field("bigquery_base_url", &self.bigquery_base_url)
            .field("trigger_token", &self.trigger_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
