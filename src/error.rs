use crate::models::ValidationIssue;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

/// Failure to produce the question bank on the server.
#[derive(Debug, thiserror::Error)]
pub enum BankLoadError {
    #[error("cannot read question bank {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("question bank is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question bank failed validation ({} issues)", .0.len())]
    Invalid(Vec<ValidationIssue>),
}

/// Failure to get a usable reply from the remote completion service.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion response is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub field: String,
    pub issue: String,
}

impl From<ValidationIssue> for ErrorDetail {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            field: issue.field,
            issue: issue.issue,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
    pub request_id: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Vec<ErrorDetail>,
    pub request_id: String,
}

impl AppError {
    /// The bank could not be served. The cause is logged, not exposed, except
    /// for validation details which point at the offending questions.
    pub fn bank_unavailable(err: BankLoadError, request_id: impl Into<String>) -> Self {
        let details = match err {
            BankLoadError::Invalid(issues) => issues.into_iter().map(ErrorDetail::from).collect(),
            BankLoadError::Read { .. } | BankLoadError::Parse(_) => Vec::new(),
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "QUESTIONS_UNAVAILABLE",
            message: "Failed to load questions".to_string(),
            details,
            request_id: request_id.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let payload = ErrorBody {
            error: ErrorPayload {
                code: self.code,
                message: self.message,
                details: self.details,
                request_id: self.request_id,
            },
        };
        (self.status, Json(payload)).into_response()
    }
}
