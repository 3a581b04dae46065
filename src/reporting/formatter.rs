use serde::Serialize;

use crate::errors::ReportError;
use crate::models::Report;
use crate::utils::formatting::{format_amount, format_delta, format_percent};
use super::table::TextTable;

/// Which optional sections to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub include_breakdown: bool,
    pub include_thread_detail: bool,
    /// Maximum project rows in the summary breakdown.
    pub top_n: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_breakdown: true,
            include_thread_detail: true,
            top_n: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadText {
    pub project_id: String,
    pub text: String,
}

/// Message texts for one report: the summary and, optionally, one reply per
/// project in report order.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedReport {
    pub summary_text: String,
    pub thread_texts: Vec<ThreadText>,
}

impl FormattedReport {
    pub fn thread_text(&self, project_id: &str) -> Option<&str> {
        self.thread_texts
            .iter()
            .find(|t| t.project_id == project_id)
            .map(|t| t.text.as_str())
    }
}

pub fn format_report(report: &Report, options: &FormatOptions) -> Result<FormattedReport, ReportError> {
    let summary_text = format_summary(report, options);

    let thread_texts = if options.include_thread_detail {
        report
            .project_aggregates()
            .iter()
            .map(|p| format_thread(report, &p.project_id))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    Ok(FormattedReport { summary_text, thread_texts })
}

fn money(amount: f64, currency: Option<&str>) -> String {
    match currency {
        Some(c) => format!("{} {}", format_amount(amount), c),
        None => format_amount(amount),
    }
}

fn code_block(table: &TextTable) -> String {
    format!("```\n{}\n```", table.render())
}

fn cost_row(name: &str, total: f64, delta: f64, percent: Option<i64>) -> Vec<String> {
    vec![
        name.to_string(),
        format_amount(total),
        format_delta(delta),
        format_percent(percent),
    ]
}

fn format_summary(report: &Report, options: &FormatOptions) -> String {
    let currency = report.currency();
    let mut sections = vec![format!(
        "*Cloud cost report for {}*\nTotal: *{}* ({}, {} vs previous day)",
        report.report_date().format("%Y-%m-%d"),
        money(report.overall_total(), currency),
        format_delta(report.overall_delta()),
        format_percent(report.overall_delta_percent()),
    )];

    if report.is_empty() {
        sections.push("_No billing records for this date._".to_string());
        return sections.join("\n\n");
    }

    let mut sku_table = TextTable::new(["SKU", "Cost", "Delta", "Change"]);
    for sku in report.sku_rollup() {
        sku_table.row(cost_row(&sku.sku_description, sku.total_cost, sku.delta, sku.delta_percent()));
    }
    sku_table.footer(cost_row(
        "OVERALL",
        report.overall_total(),
        report.overall_delta(),
        report.overall_delta_percent(),
    ));
    sections.push(code_block(&sku_table));

    if options.include_breakdown {
        let mut project_table = TextTable::new(["Project", "Cost", "Delta", "Change"]);
        let shown = options.top_n.min(project_table.data_capacity());
        let projects = report.project_aggregates();
        for p in projects.iter().take(shown) {
            project_table.row(cost_row(&p.project_id, p.total_cost, p.delta, p.delta_percent()));
        }
        let mut block = code_block(&project_table);
        if projects.len() > shown {
            block.push_str(&format!("\n_{} more projects not shown_", projects.len() - shown));
        }
        sections.push(block);
    }

    sections.join("\n\n")
}

fn format_thread(report: &Report, project_id: &str) -> Result<ThreadText, ReportError> {
    let project = report
        .project(project_id)
        .ok_or_else(|| ReportError::Format(format!("Project '{}' is not in the report", project_id)))?;
    let skus = report
        .sku_breakdown(project_id)
        .ok_or_else(|| ReportError::Format(format!("Project '{}' has no SKU breakdown", project_id)))?;

    let mut table = TextTable::new(["SKU", "Cost", "Delta", "Change"]);
    for sku in skus {
        table.row(cost_row(&sku.sku_description, sku.total_cost, sku.delta, sku.delta_percent()));
    }
    table.footer(cost_row("TOTAL", project.total_cost, project.delta, project.delta_percent()));

    let text = format!(
        "*Project: {}*\n{} ({}, {})\n\n{}",
        project_id,
        money(project.total_cost, report.currency()),
        format_delta(project.delta),
        format_percent(project.delta_percent()),
        code_block(&table),
    );
    Ok(ThreadText { project_id: project_id.to_string(), text })
}
