//! The single response shape every endpoint speaks, and the mapping from
//! validation/invocation outcomes onto it.
//!
//! Mapping is pure: the same input always yields the same status and body.
//! Causes of invocation failures are the caller's business to log; they
//! never appear in the body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::validate::ValidationError;
use crate::worker::{InvocationFailure, WorkerResult};

pub const PROCESSING_FAILED: &str = "Failed to process text";
pub const NOT_FOUND: &str = "Endpoint not found";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Stable, machine-readable failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidText,
    InvalidTask,
    InvalidTaskType,
    TextTooLong,
    EmptyText,
    ProcessingError,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidText => "INVALID_TEXT",
            ErrorCode::InvalidTask => "INVALID_TASK",
            ErrorCode::InvalidTaskType => "INVALID_TASK_TYPE",
            ErrorCode::TextTooLong => "TEXT_TOO_LONG",
            ErrorCode::EmptyText => "EMPTY_TEXT",
            ErrorCode::ProcessingError => "PROCESSING_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Caller faults are 400, execution faults 500.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidText
            | ErrorCode::InvalidTask
            | ErrorCode::InvalidTaskType
            | ErrorCode::TextTooLong
            | ErrorCode::EmptyText => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ProcessingError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of every `/api` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

/// Status plus body, ready to hand to axum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: GatewayResponse,
}

impl Reply {
    pub fn ok(output: String) -> Self {
        Self {
            status: StatusCode::OK,
            body: GatewayResponse {
                success: true,
                output: Some(output),
                error: None,
                code: None,
            },
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status(),
            body: GatewayResponse {
                success: false,
                output: None,
                error: Some(message.into()),
                code: Some(code),
            },
        }
    }

    pub fn not_found() -> Self {
        Self::failure(ErrorCode::NotFound, NOT_FOUND)
    }

    pub fn internal() -> Self {
        Self::failure(ErrorCode::InternalError, INTERNAL_ERROR)
    }

    /// Map a worker invocation outcome. Only `output` survives on success.
    pub fn from_outcome(outcome: &Result<WorkerResult, InvocationFailure>) -> Self {
        match outcome {
            Ok(WorkerResult {
                success: true,
                output: Some(output),
                ..
            }) => Self::ok(output.clone()),
            Ok(result) => Self::failure(
                ErrorCode::ProcessingError,
                result
                    .error
                    .clone()
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| PROCESSING_FAILED.to_string()),
            ),
            Err(_) => Self::failure(ErrorCode::ProcessingError, PROCESSING_FAILED),
        }
    }
}

impl From<ValidationError> for Reply {
    fn from(err: ValidationError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
