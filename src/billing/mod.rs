pub mod auth;
pub mod bigquery;
pub mod fetcher;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::ReportError;
use crate::models::BillingRecord;

pub use bigquery::BigQueryClient;
pub use fetcher::{BillingFetcher, default_target_date};

/// Source of billing line items for a single usage day.
#[async_trait]
pub trait BillingSource: Send + Sync {
    /// All cost records whose usage falls on `usage_date`.
    async fn query_costs(&self, usage_date: NaiveDate) -> Result<Vec<BillingRecord>, ReportError>;

    /// Source name for logging
    fn source_name(&self) -> &str;
}
