use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::billing::{default_target_date, BillingFetcher, BillingSource};
use crate::config::{redact_credentials, ReportConfig};
use crate::errors::{ReportError, RetryConfig};
use crate::models::{PriorPeriod, Report};
use crate::notify::{Messenger, Notifier, NotifyResult};
use crate::reporting::{aggregate, format_report};
use crate::utils::formatting::format_duration;
use crate::utils::truncation::truncate_error;
use super::state::*;

const ALERT_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives one report run: resolve the plan, fetch both days, aggregate,
/// format and deliver.
pub struct ReportOrchestrator {
    config: Arc<ReportConfig>,
    fetcher: BillingFetcher,
    notifier: Notifier,
    state: Arc<RwLock<RunState>>,
    today: Option<NaiveDate>,
}

impl ReportOrchestrator {
    pub fn new(
        config: Arc<ReportConfig>,
        source: Arc<dyn BillingSource>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let fetcher = BillingFetcher::new(source, config.retry_config());
        Self {
            config,
            fetcher,
            notifier: Notifier::new(messenger),
            state: Arc::new(RwLock::new(RunState::new())),
            today: None,
        }
    }

    /// Replace the fetch retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.fetcher = self.fetcher.with_retry(retry);
        self
    }

    /// Pin "today" for date resolution instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn state(&self) -> Arc<RwLock<RunState>> {
        self.state.clone()
    }

    async fn set_stage(&self, stage: RunStage) {
        let mut state = self.state.write().await;
        state.stage = stage;
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Resolve the report date, the prior date and the format options.
    pub fn plan(&self, request: &RunRequest) -> Result<RunPlan, ReportError> {
        let today = self.today();
        let report_date = match request.target_date {
            Some(date) if date > today => {
                return Err(ReportError::Config(format!(
                    "Report date {} is in the future",
                    date
                )));
            }
            Some(date) => date,
            None => default_target_date(today, self.config.lag_days),
        };
        let prior_date = report_date
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| ReportError::Config(format!("No day before {}", report_date)))?;

        Ok(RunPlan {
            report_date,
            prior_date,
            options: self.config.format_options(),
        })
    }

    async fn execute(&self, request: &RunRequest) -> Result<(Report, NotifyResult), ReportError> {
        self.set_stage(RunStage::Loading).await;
        let plan = self.plan(request)?;
        self.state.write().await.report_date = Some(plan.report_date);

        self.set_stage(RunStage::Fetching).await;
        let (records, prior_records) = tokio::try_join!(
            self.fetcher.fetch(plan.report_date),
            self.fetcher.fetch(plan.prior_date),
        )?;

        self.set_stage(RunStage::Aggregating).await;
        let prior = PriorPeriod::from_records(&prior_records)?;
        let report = aggregate(plan.report_date, &records, &prior)?;
        info!(
            date = %plan.report_date,
            records = records.len(),
            projects = report.project_aggregates().len(),
            total = report.overall_total(),
            "Aggregated billing records"
        );

        self.set_stage(RunStage::Formatting).await;
        let formatted = format_report(&report, &plan.options)?;

        self.set_stage(RunStage::Notifying).await;
        let delivery = self
            .notifier
            .send(&formatted.summary_text, &formatted.thread_texts)
            .await?;

        Ok((report, delivery))
    }

    /// Run the report end to end. Never panics on pipeline errors; the
    /// outcome carries the failure and its exit code.
    pub async fn run(&self, request: RunRequest) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        {
            let mut state = self.state.write().await;
            *state = RunState {
                run_id,
                stage: RunStage::Loading,
                started_at,
                report_date: None,
                error: None,
            };
        }
        info!(run_id = %run_id, "Report run started");

        let timeout = self.config.run_timeout;
        let result = match tokio::time::timeout(timeout, self.execute(&request)).await {
            Ok(result) => result,
            Err(_) => {
                let stage = self.state.read().await.stage;
                Err(ReportError::Timeout(format!(
                    "Run exceeded {} while {}",
                    format_duration(timeout.as_millis() as u64),
                    stage
                )))
            }
        };

        let (stage, report_date) = {
            let state = self.state.read().await;
            (state.stage, state.report_date)
        };

        match result {
            Ok((report, delivery)) => {
                self.set_stage(RunStage::Done).await;
                let duration_ms = clock.elapsed().as_millis() as u64;
                if delivery.is_partial() {
                    warn!(
                        run_id = %run_id,
                        failed = ?delivery.failed_projects(),
                        sent = delivery.sent_count(),
                        "Report delivered with failed threads"
                    );
                }
                info!(
                    run_id = %run_id,
                    date = %report.report_date(),
                    total = report.overall_total(),
                    duration = %format_duration(duration_ms),
                    "Report run complete"
                );
                RunOutcome {
                    run_id,
                    status: RunStatus::Done,
                    stage: RunStage::Done,
                    report_date: Some(report.report_date()),
                    currency: report.currency().map(str::to_string),
                    overall_total: Some(report.overall_total()),
                    threads: delivery.threads,
                    error_type: None,
                    error: None,
                    exit_code: 0,
                    started_at,
                    duration_ms,
                }
            }
            Err(e) => {
                let secrets = self.config.secrets();
                let mut outcome = RunOutcome::failed(run_id, stage, started_at, report_date, &e, &secrets);
                outcome.duration_ms = clock.elapsed().as_millis() as u64;
                {
                    let mut state = self.state.write().await;
                    state.stage = RunStage::Failed;
                    state.error = outcome.error.clone();
                }
                let class = e.classify();
                error!(
                    run_id = %run_id,
                    stage = %stage,
                    date = ?report_date,
                    error_type = class.error_type,
                    cause = class.cause,
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "Report run failed"
                );
                if self.config.send_failure_alerts && class.error_type != "NotifyError" {
                    self.send_failure_alert(report_date, &e).await;
                }
                outcome
            }
        }
    }

    /// Best effort: a failing alert is logged and otherwise ignored.
    async fn send_failure_alert(&self, report_date: Option<NaiveDate>, err: &ReportError) {
        let date = report_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        let detail = truncate_error(&redact_credentials(&err.to_string(), &self.config.secrets()));
        let text = format!("Cost report for {} failed: {}", date, detail);

        match tokio::time::timeout(ALERT_TIMEOUT, self.notifier.send_alert(&text)).await {
            Ok(Ok(_)) => info!(date = %date, "Failure alert sent"),
            Ok(Err(e)) => warn!(error = %e, "Failed to send failure alert"),
            Err(_) => warn!("Failure alert timed out"),
        }
    }
}
