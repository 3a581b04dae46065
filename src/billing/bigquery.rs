use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{BillingCredential, BillingTable};
use crate::errors::ReportError;
use crate::models::{BillingRecord, UNASSIGNED_PROJECT};
use super::auth::TokenSource;
use super::BillingSource;

const QUERY_TIMEOUT_MS: u64 = 30_000;
const PAGE_SIZE: u32 = 10_000;
/// Upper bound on `getQueryResults` round trips for one query.
const MAX_POLLS: u32 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    job_reference: Option<JobReference>,
    #[serde(default)]
    rows: Vec<Row>,
    page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    project_id: String,
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Row {
    f: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    v: Value,
}

/// Billing source backed by a BigQuery billing export table, queried through
/// the REST `jobs.query` API.
pub struct BigQueryClient {
    client: Client,
    base_url: String,
    job_project: String,
    table: BillingTable,
    tokens: TokenSource,
}

impl BigQueryClient {
    pub fn new(
        client: Client,
        base_url: &str,
        table: BillingTable,
        credential: Arc<BillingCredential>,
    ) -> Self {
        // Jobs run in the credential's project when it names one, otherwise in
        // the project that owns the export table.
        let job_project = credential
            .project_id()
            .map(str::to_string)
            .unwrap_or_else(|| table.project.clone());
        Self {
            tokens: TokenSource::new(client.clone(), credential),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            job_project,
            table,
        }
    }

    pub fn cost_query(&self) -> String {
        format!(
            "SELECT project.id AS project_id, sku.id AS sku_id, sku.description AS sku_description, \
             currency, SUM(cost) AS cost \
             FROM `{}` \
             WHERE DATE(usage_start_time) = @usage_date \
             GROUP BY project_id, sku_id, sku_description, currency \
             ORDER BY project_id, cost DESC",
            self.table
        )
    }

    async fn start_query(&self, token: &str, usage_date: NaiveDate) -> Result<QueryResponse, ReportError> {
        let body = json!({
            "query": self.cost_query(),
            "useLegacySql": false,
            "parameterMode": "NAMED",
            "queryParameters": [{
                "name": "usage_date",
                "parameterType": {"type": "DATE"},
                "parameterValue": {"value": usage_date.format("%Y-%m-%d").to_string()}
            }],
            "timeoutMs": QUERY_TIMEOUT_MS,
            "maxResults": PAGE_SIZE,
        });

        let resp = self.client
            .post(format!("{}/projects/{}/queries", self.base_url, self.job_project))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Network(format!("BigQuery request failed: {}", e)))?;

        self.read_response(resp).await
    }

    async fn query_results(
        &self,
        token: &str,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse, ReportError> {
        let mut params: Vec<(&str, String)> = vec![
            ("timeoutMs", QUERY_TIMEOUT_MS.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ];
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }
        if let Some(page) = page_token {
            params.push(("pageToken", page.to_string()));
        }

        let resp = self.client
            .get(format!("{}/projects/{}/queries/{}", self.base_url, job.project_id, job.job_id))
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .map_err(|e| ReportError::Network(format!("BigQuery results request failed: {}", e)))?;

        self.read_response(resp).await
    }

    async fn read_response(&self, resp: Response) -> Result<QueryResponse, ReportError> {
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<QueryResponse>()
                .await
                .map_err(|e| ReportError::Network(format!("Truncated BigQuery response: {}", e)));
        }

        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        Err(classify_bigquery_error(status, &body))
    }
}

#[async_trait]
impl BillingSource for BigQueryClient {
    async fn query_costs(&self, usage_date: NaiveDate) -> Result<Vec<BillingRecord>, ReportError> {
        let token = self.tokens.access_token().await?;
        let mut response = self.start_query(&token, usage_date).await?;

        let mut records = Vec::new();
        let mut polls = 0;
        loop {
            for row in &response.rows {
                records.push(parse_row(row, usage_date)?);
            }

            let next_page = response.page_token.clone();
            if response.job_complete && next_page.is_none() {
                break;
            }

            polls += 1;
            if polls > MAX_POLLS {
                return Err(ReportError::Network(format!(
                    "BigQuery job did not finish after {} polls",
                    MAX_POLLS
                )));
            }
            let job = response.job_reference.clone().ok_or_else(|| {
                ReportError::Query("Incomplete BigQuery response without a job reference".into())
            })?;
            if !response.job_complete {
                // getQueryResults already waits up to timeoutMs server side
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            response = self.query_results(&token, &job, next_page.as_deref()).await?;
        }

        debug!(
            table = %self.table,
            date = %usage_date,
            rows = records.len(),
            "BigQuery cost query complete"
        );
        Ok(records)
    }

    fn source_name(&self) -> &str {
        "bigquery"
    }
}

fn cell_str(row: &Row, idx: usize) -> Option<&str> {
    row.f.get(idx).and_then(|c| c.v.as_str())
}

/// Decode one result row of `cost_query` (column order matters).
fn parse_row(row: &Row, usage_date: NaiveDate) -> Result<BillingRecord, ReportError> {
    if row.f.len() < 5 {
        return Err(ReportError::Query(format!(
            "Expected 5 columns in billing row, got {}",
            row.f.len()
        )));
    }
    let cost_raw = cell_str(row, 4)
        .ok_or_else(|| ReportError::Query("Billing row has no cost value".into()))?;
    let cost_amount: f64 = cost_raw
        .parse()
        .map_err(|_| ReportError::Query(format!("Invalid cost value '{}'", cost_raw)))?;
    let currency = cell_str(row, 3)
        .ok_or_else(|| ReportError::Query("Billing row has no currency".into()))?;

    let record = BillingRecord::new(
        cell_str(row, 0).unwrap_or(UNASSIGNED_PROJECT),
        cell_str(row, 2).unwrap_or("(unknown SKU)"),
        cost_amount,
        currency,
        usage_date,
    );
    Ok(record.with_sku_id(cell_str(row, 1).unwrap_or_default()))
}

/// Map a BigQuery API failure onto the fetch error taxonomy.
fn classify_bigquery_error(status: StatusCode, body: &str) -> ReportError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v["error"]["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));
    let reason = parsed
        .as_ref()
        .and_then(|v| v["error"]["errors"][0]["reason"].as_str())
        .unwrap_or_default()
        .to_string();

    match status {
        StatusCode::UNAUTHORIZED => ReportError::Unauthenticated(message),
        StatusCode::TOO_MANY_REQUESTS => ReportError::RateLimit(message),
        StatusCode::FORBIDDEN if reason == "rateLimitExceeded" || reason == "quotaExceeded" => {
            ReportError::RateLimit(message)
        }
        StatusCode::FORBIDDEN => ReportError::Permission(message),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => ReportError::Query(message),
        s if s.is_server_error() => ReportError::Network(message),
        _ => ReportError::Query(message),
    }
}
