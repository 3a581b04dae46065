use std::collections::HashMap;

use crate::errors::ReportError;
use super::record::{common_currency, BillingRecord};

/// Cost totals for the period a report is compared against.
///
/// Lookups for keys that were never seen return 0.
#[derive(Debug, Clone, Default)]
pub struct PriorPeriod {
    project_totals: HashMap<String, f64>,
    sku_totals: HashMap<(String, String), f64>,
    currency: Option<String>,
}

impl PriorPeriod {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Prior totals supplied per project only. SKU-level lookups return 0.
    pub fn from_project_totals<I, S>(totals: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut project_totals = HashMap::new();
        for (project, total) in totals {
            *project_totals.entry(project.into()).or_insert(0.0) += total;
        }
        Self {
            project_totals,
            sku_totals: HashMap::new(),
            currency: None,
        }
    }

    /// Derive prior totals from the records of the prior day. The records
    /// must share one currency and have finite costs.
    pub fn from_records(records: &[BillingRecord]) -> Result<Self, ReportError> {
        let mut prior = Self {
            currency: common_currency(records)?,
            ..Self::default()
        };
        for r in records {
            *prior.project_totals.entry(r.project_id.clone()).or_insert(0.0) += r.cost_amount;
            *prior
                .sku_totals
                .entry((r.project_id.clone(), r.sku_description.clone()))
                .or_insert(0.0) += r.cost_amount;
        }
        Ok(prior)
    }

    /// Currency of the prior records; `None` when built from bare totals.
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn project_total(&self, project_id: &str) -> f64 {
        self.project_totals.get(project_id).copied().unwrap_or(0.0)
    }

    pub fn sku_total(&self, project_id: &str, sku_description: &str) -> f64 {
        self.sku_totals
            .get(&(project_id.to_string(), sku_description.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    /// Prior total of one SKU summed across every project.
    pub fn sku_rollup_total(&self, sku_description: &str) -> f64 {
        self.sku_totals
            .iter()
            .filter(|((_, sku), _)| sku == sku_description)
            .map(|(_, total)| total)
            .sum()
    }

    pub fn overall_total(&self) -> f64 {
        self.project_totals.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.project_totals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 13).unwrap()
    }

    #[test]
    fn test_missing_keys_default_to_zero() {
        let prior = PriorPeriod::empty();
        assert_eq!(prior.project_total("A"), 0.0);
        assert_eq!(prior.sku_total("A", "compute"), 0.0);
        assert!(prior.is_empty());
    }

    #[test]
    fn test_from_records_sums_per_key() {
        let records = vec![
            BillingRecord::new("A", "compute", 4.0, "USD", day()),
            BillingRecord::new("A", "compute", 1.5, "USD", day()),
            BillingRecord::new("A", "storage", 2.0, "USD", day()),
            BillingRecord::new("B", "compute", 3.0, "USD", day()),
        ];
        let prior = PriorPeriod::from_records(&records).unwrap();
        assert_eq!(prior.currency(), Some("USD"));
        assert_eq!(prior.project_total("A"), 7.5);
        assert_eq!(prior.sku_total("A", "compute"), 5.5);
        assert_eq!(prior.sku_rollup_total("compute"), 8.5);
        assert_eq!(prior.overall_total(), 10.5);
    }

    #[test]
    fn test_project_totals_only() {
        let prior = PriorPeriod::from_project_totals([("A", 12.0), ("B", 20.0)]);
        assert_eq!(prior.project_total("B"), 20.0);
        assert_eq!(prior.sku_total("B", "compute"), 0.0);
        assert_eq!(prior.overall_total(), 32.0);
    }

    #[test]
    fn test_from_records_rejects_mixed_currency_and_nan() {
        let mixed = vec![
            BillingRecord::new("A", "compute", 4.0, "USD", day()),
            BillingRecord::new("B", "compute", 1000.0, "JPY", day()),
        ];
        let err = PriorPeriod::from_records(&mixed).unwrap_err();
        assert_eq!(err.classify().error_type, "AggregationError");

        let nan = vec![BillingRecord::new("B", "compute", f64::NAN, "USD", day())];
        assert!(PriorPeriod::from_records(&nan).is_err());
    }
}
