use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::redact_credentials;
use crate::errors::ReportError;
use crate::notify::{ThreadDelivery, ThreadStatus};
use crate::reporting::FormatOptions;
use crate::utils::truncation::truncate_error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    Idle,
    Loading,
    Fetching,
    Aggregating,
    Formatting,
    Notifying,
    Done,
    Failed,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Fetching => write!(f, "fetching"),
            Self::Aggregating => write!(f, "aggregating"),
            Self::Formatting => write!(f, "formatting"),
            Self::Notifying => write!(f, "notifying"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Live view of the run in progress.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub run_id: Uuid,
    pub stage: RunStage,
    pub started_at: DateTime<Utc>,
    pub report_date: Option<NaiveDate>,
    pub error: Option<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::nil(),
            stage: RunStage::Idle,
            started_at: Utc::now(),
            report_date: None,
            error: None,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-invocation overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunRequest {
    /// Report date; defaults to today minus the configured lag.
    pub target_date: Option<NaiveDate>,
}

/// Resolved parameters of one run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub report_date: NaiveDate,
    pub prior_date: NaiveDate,
    pub options: FormatOptions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Done,
    Failed,
}

/// Final result of a run, as reported to the trigger.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    /// `done`, or the stage that was active when the run failed.
    pub stage: RunStage,
    pub report_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub overall_total: Option<f64>,
    pub threads: Vec<ThreadDelivery>,
    pub error_type: Option<String>,
    pub error: Option<String>,
    pub exit_code: i32,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunOutcome {
    /// Outcome of a run that failed with `error` during `stage`. Secrets are
    /// removed from the error text.
    pub fn failed(
        run_id: Uuid,
        stage: RunStage,
        started_at: DateTime<Utc>,
        report_date: Option<NaiveDate>,
        error: &ReportError,
        secrets: &[&str],
    ) -> Self {
        Self {
            run_id,
            status: RunStatus::Failed,
            stage,
            report_date,
            currency: None,
            overall_total: None,
            threads: Vec::new(),
            error_type: Some(error.classify().error_type.to_string()),
            error: Some(truncate_error(&redact_credentials(&error.to_string(), secrets))),
            exit_code: error.exit_code(),
            started_at,
            duration_ms: (Utc::now() - started_at).num_milliseconds().max(0) as u64,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Done
    }

    pub fn is_timeout(&self) -> bool {
        self.error_type.as_deref() == Some("TimeoutError")
    }

    pub fn failed_threads(&self) -> Vec<&str> {
        self.threads
            .iter()
            .filter(|t| matches!(t.status, ThreadStatus::Failed { .. }))
            .map(|t| t.project_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [RunStage::Loading, RunStage::Notifying, RunStage::Failed] {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, stage.to_string());
        }
    }

    #[test]
    fn test_failed_outcome_redacts_and_maps_exit_code() {
        let err = ReportError::Notify("token xoxb-secret-1 revoked".into());
        let outcome = RunOutcome::failed(
            Uuid::new_v4(),
            RunStage::Notifying,
            Utc::now(),
            None,
            &err,
            &["xoxb-secret-1"],
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.exit_code, 6);
        assert_eq!(outcome.error_type.as_deref(), Some("NotifyError"));
        let text = outcome.error.unwrap();
        assert!(text.contains("[REDACTED]"));
        assert!(!text.contains("xoxb-secret-1"));
    }
}
