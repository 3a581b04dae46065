use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::info;

use crate::errors::{with_retry, ReportError, RetryConfig};
use crate::models::BillingRecord;
use super::BillingSource;

/// Report date for a run started on `today`: billing exports lag, so the
/// default is `lag_days` before today.
pub fn default_target_date(today: NaiveDate, lag_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(lag_days as u64))
        .unwrap_or(NaiveDate::MIN)
}

/// Fetches billing records with bounded retry on transient failures.
#[derive(Clone)]
pub struct BillingFetcher {
    source: Arc<dyn BillingSource>,
    retry: RetryConfig,
}

impl BillingFetcher {
    pub fn new(source: Arc<dyn BillingSource>, retry: RetryConfig) -> Self {
        Self { source, retry }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn fetch(&self, target_date: NaiveDate) -> Result<Vec<BillingRecord>, ReportError> {
        let operation = format!("{} query for {}", self.source.source_name(), target_date);
        let records = with_retry(&operation, &self.retry, || self.source.query_costs(target_date)).await?;

        info!(
            source = self.source.source_name(),
            date = %target_date,
            records = records.len(),
            "Billing records fetched"
        );
        Ok(records)
    }
}
