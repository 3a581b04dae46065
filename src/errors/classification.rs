use super::types::ReportError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    /// Run-level taxonomy name (`FetchError`, `NotifyError`, ...).
    pub error_type: &'static str,
    /// Underlying cause, used to pick a retry delay.
    pub cause: &'static str,
    pub retryable: bool,
}

impl ReportError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Retryable fetch errors
            ReportError::Network(_) => ErrorClassification {
                error_type: "FetchError",
                cause: "network",
                retryable: true,
            },
            ReportError::RateLimit(_) => ErrorClassification {
                error_type: "FetchError",
                cause: "rate_limit",
                retryable: true,
            },
            ReportError::Unauthenticated(_) => ErrorClassification {
                error_type: "FetchError",
                cause: "unauthenticated",
                retryable: true,
            },

            // Non-retryable fetch errors
            ReportError::Credential(_) => ErrorClassification {
                error_type: "FetchError",
                cause: "credential",
                retryable: false,
            },
            ReportError::Permission(_) => ErrorClassification {
                error_type: "FetchError",
                cause: "permission",
                retryable: false,
            },
            ReportError::Query(_) => ErrorClassification {
                error_type: "FetchError",
                cause: "query",
                retryable: false,
            },

            ReportError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                cause: "config",
                retryable: false,
            },
            ReportError::Aggregation(_) => ErrorClassification {
                error_type: "AggregationError",
                cause: "integrity",
                retryable: false,
            },
            ReportError::Format(_) => ErrorClassification {
                error_type: "FormatError",
                cause: "defect",
                retryable: false,
            },
            ReportError::Notify(_) => ErrorClassification {
                error_type: "NotifyError",
                cause: "delivery",
                retryable: false,
            },
            ReportError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                cause: "deadline",
                retryable: false,
            },
            ReportError::Io(_) => ErrorClassification {
                error_type: "InternalError",
                cause: "io",
                retryable: false,
            },
            ReportError::Json(_) => ErrorClassification {
                error_type: "InternalError",
                cause: "serialization",
                retryable: false,
            },
            ReportError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                cause: "internal",
                retryable: false,
            },
        }
    }
}
