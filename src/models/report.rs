use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::Serialize;

/// Rounded percentage change from `prior` to `current`, or `None` when there
/// is no positive prior value to compare against.
pub fn percent_change(current: f64, prior: f64) -> Option<i64> {
    if prior > 0.0 {
        Some(((current - prior) / prior * 100.0).round() as i64)
    } else {
        None
    }
}

/// Cost of one project for the report date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAggregate {
    pub project_id: String,
    pub total_cost: f64,
    pub prior_total_cost: f64,
    pub delta: f64,
}

impl ProjectAggregate {
    pub fn delta_percent(&self) -> Option<i64> {
        percent_change(self.total_cost, self.prior_total_cost)
    }
}

/// Cost of one SKU within one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuAggregate {
    pub project_id: String,
    pub sku_description: String,
    pub total_cost: f64,
    pub prior_total_cost: f64,
    pub delta: f64,
}

impl SkuAggregate {
    pub fn delta_percent(&self) -> Option<i64> {
        percent_change(self.total_cost, self.prior_total_cost)
    }
}

/// Cost of one SKU summed across all projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuRollup {
    pub sku_description: String,
    pub total_cost: f64,
    pub prior_total_cost: f64,
    pub delta: f64,
}

impl SkuRollup {
    pub fn delta_percent(&self) -> Option<i64> {
        percent_change(self.total_cost, self.prior_total_cost)
    }
}

/// Aggregated cost report for a single day. Built by the aggregator and
/// read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    report_date: NaiveDate,
    currency: Option<String>,
    overall_total: f64,
    overall_prior_total: f64,
    project_aggregates: Vec<ProjectAggregate>,
    sku_breakdowns: BTreeMap<String, Vec<SkuAggregate>>,
    sku_rollup: Vec<SkuRollup>,
}

impl Report {
    pub(crate) fn new(
        report_date: NaiveDate,
        currency: Option<String>,
        overall_total: f64,
        overall_prior_total: f64,
        project_aggregates: Vec<ProjectAggregate>,
        sku_breakdowns: BTreeMap<String, Vec<SkuAggregate>>,
        sku_rollup: Vec<SkuRollup>,
    ) -> Self {
        Self {
            report_date,
            currency,
            overall_total,
            overall_prior_total,
            project_aggregates,
            sku_breakdowns,
            sku_rollup,
        }
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    /// Billing currency shared by every record, `None` for an empty report.
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn overall_total(&self) -> f64 {
        self.overall_total
    }

    pub fn overall_prior_total(&self) -> f64 {
        self.overall_prior_total
    }

    pub fn overall_delta(&self) -> f64 {
        self.overall_total - self.overall_prior_total
    }

    pub fn overall_delta_percent(&self) -> Option<i64> {
        percent_change(self.overall_total, self.overall_prior_total)
    }

    /// Projects ordered by total cost descending, ties by project id.
    pub fn project_aggregates(&self) -> &[ProjectAggregate] {
        &self.project_aggregates
    }

    pub fn project(&self, project_id: &str) -> Option<&ProjectAggregate> {
        self.project_aggregates.iter().find(|p| p.project_id == project_id)
    }

    /// SKU rows of one project, ordered by total cost descending.
    pub fn sku_breakdown(&self, project_id: &str) -> Option<&[SkuAggregate]> {
        self.sku_breakdowns.get(project_id).map(Vec::as_slice)
    }

    pub fn sku_rollup(&self) -> &[SkuRollup] {
        &self.sku_rollup
    }

    pub fn is_empty(&self) -> bool {
        self.project_aggregates.is_empty()
    }
}
