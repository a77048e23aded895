use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing::{error, warn};

/// PostgREST code for "the result contains 0 rows" on single-object requests.
pub const NOT_FOUND_CODE: &str = "PGRST116";

/// Failures talking to the hosted data or auth service.
#[derive(Debug, ThisError)]
pub enum DataError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend rejected request ({status}): {message}")]
    Backend {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },
}

impl DataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::Backend { code: Some(c), .. } if c == NOT_FOUND_CODE)
    }

    /// Build from a non-success response body; PostgREST and GoTrue use different field names.
    pub fn from_body(status: StatusCode, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<BackendErrorBody>(body).ok();
        let code = parsed.as_ref().and_then(BackendErrorBody::code);
        let message = parsed
            .and_then(BackendErrorBody::into_message)
            .unwrap_or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    text
                }
            });
        DataError::Backend {
            status,
            code,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl BackendErrorBody {
    fn code(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => self.error_code.clone(),
        }
    }

    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

#[derive(Debug, ThisError)]
pub enum FieldcheckError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid session: {0}")]
    InvalidSession(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("metrics sampling failed: {0}")]
    Sampling(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl FieldcheckError {
    /// Auth-service rejections mean the presented credential is bad, not the request.
    pub fn from_auth(err: DataError) -> Self {
        match err {
            DataError::Backend {
                status, message, ..
            } if status.is_client_error() => FieldcheckError::InvalidSession(message),
            other => FieldcheckError::Data(other),
        }
    }
}

impl IntoResponse for FieldcheckError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match &self {
            FieldcheckError::Data(err) if err.is_not_found() => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", "Resource not found."),
            ),
            FieldcheckError::Data(DataError::Backend {
                status: StatusCode::UNAUTHORIZED,
                message,
                ..
            }) => {
                warn!(message = %message, "backend rejected the relayed credential");
                (
                    StatusCode::UNAUTHORIZED,
                    ApiErrorBody::new("UNAUTHORIZED", "Authentication required."),
                )
            }
            FieldcheckError::Data(DataError::Backend {
                status,
                code,
                message,
            }) if status.is_client_error() => {
                warn!(code = ?code, message = %message, "backend rejected operation");
                (
                    StatusCode::BAD_REQUEST,
                    ApiErrorBody::new(
                        code.as_deref().unwrap_or("BACKEND_ERROR"),
                        message.as_str(),
                    ),
                )
            }
            FieldcheckError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("VALIDATION_ERROR", msg.as_str()),
            ),
            FieldcheckError::Unauthorized | FieldcheckError::InvalidSession(_) => {
                warn!(error = %self, "rejecting unauthenticated request");
                (
                    StatusCode::UNAUTHORIZED,
                    ApiErrorBody::new("UNAUTHORIZED", "Authentication required."),
                )
            }
            FieldcheckError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ApiErrorBody::new("FORBIDDEN", msg.as_str()),
            ),
            FieldcheckError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", &format!("{what} not found.")),
            ),
            FieldcheckError::Data(_)
            | FieldcheckError::Sampling(_)
            | FieldcheckError::Unexpected(_) => {
                error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
