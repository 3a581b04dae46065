use std::collections::{BTreeMap, HashMap};
use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::debug;

use crate::errors::ReportError;
use crate::models::{common_currency, BillingRecord, PriorPeriod, ProjectAggregate, Report, SkuAggregate, SkuRollup};

/// Highest cost first, then by name so equal costs sort deterministically.
fn by_cost_then_name(a_cost: f64, a_name: &str, b_cost: f64, b_name: &str) -> Ordering {
    b_cost.total_cmp(&a_cost).then_with(|| a_name.cmp(b_name))
}

/// Group billing records by project and SKU and compare them with the prior
/// period.
pub fn aggregate(
    report_date: NaiveDate,
    records: &[BillingRecord],
    prior: &PriorPeriod,
) -> Result<Report, ReportError> {
    let currency = common_currency(records)?;
    if let (Some(current), Some(previous)) = (currency.as_deref(), prior.currency()) {
        if current != previous {
            return Err(ReportError::Aggregation(format!(
                "Report date billed in {} but prior period in {}",
                current, previous
            )));
        }
    }
    if !prior.overall_total().is_finite() {
        return Err(ReportError::Aggregation("Non-finite prior period total".into()));
    }

    let mut project_totals: HashMap<&str, f64> = HashMap::new();
    let mut sku_totals: HashMap<(&str, &str), f64> = HashMap::new();
    let mut rollup_totals: HashMap<&str, f64> = HashMap::new();

    for r in records {
        let project = r.project_id.as_str();
        let sku = r.sku_description.as_str();
        *project_totals.entry(project).or_insert(0.0) += r.cost_amount;
        *sku_totals.entry((project, sku)).or_insert(0.0) += r.cost_amount;
        *rollup_totals.entry(sku).or_insert(0.0) += r.cost_amount;
    }

    let mut project_aggregates: Vec<ProjectAggregate> = project_totals
        .iter()
        .map(|(&project_id, &total_cost)| {
            let prior_total_cost = prior.project_total(project_id);
            ProjectAggregate {
                project_id: project_id.to_string(),
                total_cost,
                prior_total_cost,
                delta: total_cost - prior_total_cost,
            }
        })
        .collect();
    project_aggregates.sort_by(|a, b| by_cost_then_name(a.total_cost, &a.project_id, b.total_cost, &b.project_id));

    let mut sku_breakdowns: BTreeMap<String, Vec<SkuAggregate>> = BTreeMap::new();
    for (&(project_id, sku_description), &total_cost) in &sku_totals {
        let prior_total_cost = prior.sku_total(project_id, sku_description);
        sku_breakdowns
            .entry(project_id.to_string())
            .or_default()
            .push(SkuAggregate {
                project_id: project_id.to_string(),
                sku_description: sku_description.to_string(),
                total_cost,
                prior_total_cost,
                delta: total_cost - prior_total_cost,
            });
    }
    for skus in sku_breakdowns.values_mut() {
        skus.sort_by(|a, b| by_cost_then_name(a.total_cost, &a.sku_description, b.total_cost, &b.sku_description));
    }

    let mut sku_rollup: Vec<SkuRollup> = rollup_totals
        .iter()
        .map(|(&sku_description, &total_cost)| {
            let prior_total_cost = prior.sku_rollup_total(sku_description);
            SkuRollup {
                sku_description: sku_description.to_string(),
                total_cost,
                prior_total_cost,
                delta: total_cost - prior_total_cost,
            }
        })
        .collect();
    sku_rollup.sort_by(|a, b| by_cost_then_name(a.total_cost, &a.sku_description, b.total_cost, &b.sku_description));

    // Summed in report order so the total matches the per-project rows exactly.
    let overall_total: f64 = project_aggregates.iter().map(|p| p.total_cost).sum();

    debug!(
        date = %report_date,
        records = records.len(),
        projects = project_aggregates.len(),
        skus = sku_rollup.len(),
        overall_total,
        "Billing records aggregated"
    );

    Ok(Report::new(
        report_date,
        currency,
        overall_total,
        prior.overall_total(),
        project_aggregates,
        sku_breakdowns,
        sku_rollup,
    ))
}
