use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Billing credential error: {0}")]
    Credential(String),

    #[error("Authentication error: {0}")]
    Unauthenticated(String),

    #[error("Permission error: {0}")]
    Permission(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Billing query error: {0}")]
    Query(String),

    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Notify error: {0}")]
    Notify(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// Process exit code for a run that failed with this error.
    pub fn exit_code(&self) -> i32 {
        match self.classify().error_type {
            "ConfigError" => 2,
            "TimeoutError" => 3,
            "FetchError" => 4,
            "AggregationError" => 5,
            "NotifyError" => 6,
            _ => 1,
        }
    }
}
