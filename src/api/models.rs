use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct TriggerQuery {
    /// Report date override, `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub git_hash: Option<&'static str>,
    pub built_at: Option<&'static str>,
    pub run_in_progress: bool,
}
