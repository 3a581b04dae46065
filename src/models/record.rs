use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ReportError;

/// Project id used for charges that are not attributed to any project
/// (support fees, some marketplace SKUs).
pub const UNASSIGNED_PROJECT: &str = "unassigned";

/// A single billed line item, as returned by the billing export query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub project_id: String,
    pub sku_id: String,
    /// Human-readable SKU name (e.g. "N1 Predefined Instance Core").
    pub sku_description: String,
    pub cost_amount: f64,
    /// ISO 4217 currency code of `cost_amount`.
    pub currency: String,
    pub usage_date: NaiveDate,
}

impl BillingRecord {
    pub fn new(
        project_id: &str,
        sku_description: &str,
        cost_amount: f64,
        currency: &str,
        usage_date: NaiveDate,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            sku_id: String::new(),
            sku_description: sku_description.to_string(),
            cost_amount,
            currency: currency.to_string(),
            usage_date,
        }
    }

    pub fn with_sku_id(mut self, sku_id: &str) -> Self {
        self.sku_id = sku_id.to_string();
        self
    }
}

/// The single currency a set of records is billed in, or `None` when there
/// are no records. Mixed currencies and non-finite costs are errors.
pub fn common_currency(records: &[BillingRecord]) -> Result<Option<String>, ReportError> {
    let mut currency: Option<&str> = None;
    for r in records {
        if !r.cost_amount.is_finite() {
            return Err(ReportError::Aggregation(format!(
                "Non-finite cost {} for project '{}' SKU '{}' on {}",
                r.cost_amount, r.project_id, r.sku_description, r.usage_date
            )));
        }
        match currency {
            None => currency = Some(r.currency.as_str()),
            Some(c) if c != r.currency.as_str() => {
                return Err(ReportError::Aggregation(format!(
                    "Mixed currencies in billing data: {} and {} (project '{}')",
                    c, r.currency, r.project_id
                )));
            }
            Some(_) => {}
        }
    }
    Ok(currency.map(str::to_string))
}
