//! Request validation for `POST /api/process`.
//!
//! Pure and deterministic: takes the raw JSON body and returns either a
//! [`ProcessRequest`] or the first failing rule. Rules are checked in a
//! fixed order and the first match wins.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::consts::MAX_TEXT_CHARS;
use crate::response::ErrorCode;

/// The closed set of things the worker knows how to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Summarize,
    ExtractKeyPoints,
    Classify,
}

impl Task {
    pub const ALL: [Task; 3] = [Task::Summarize, Task::ExtractKeyPoints, Task::Classify];

    /// Wire name, also passed verbatim to the worker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summarize => "summarize",
            Task::ExtractKeyPoints => "extract_key_points",
            Task::Classify => "classify",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(ValidationError::InvalidTaskType)
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    /// Exactly as received; not trimmed.
    pub text: String,
    pub task: Task,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text is required and must be a string")]
    InvalidText,

    #[error("Task is required and must be a string")]
    InvalidTask,

    #[error("Invalid task. Must be one of: summarize, extract_key_points, classify")]
    InvalidTaskType,

    #[error("Text is too long. Maximum length is 10000 characters")]
    TextTooLong,

    #[error("Text cannot be empty")]
    EmptyText,
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::InvalidText => ErrorCode::InvalidText,
            ValidationError::InvalidTask => ErrorCode::InvalidTask,
            ValidationError::InvalidTaskType => ErrorCode::InvalidTaskType,
            ValidationError::TextTooLong => ErrorCode::TextTooLong,
            ValidationError::EmptyText => ErrorCode::EmptyText,
        }
    }
}

/// Validate a raw request body.
///
/// Order: text presence, task presence, task membership, raw length,
/// trimmed emptiness. An empty string counts as missing, so `""` is
/// `InvalidText` and never reaches the emptiness check.
pub fn validate(body: &Value) -> Result<ProcessRequest, ValidationError> {
    let text = match body.get("text") {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => return Err(ValidationError::InvalidText),
    };

    let task = match body.get("task") {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => return Err(ValidationError::InvalidTask),
    };

    let task: Task = task.parse()?;

    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ValidationError::TextTooLong);
    }

    if is_blank(text) {
        return Err(ValidationError::EmptyText);
    }

    Ok(ProcessRequest {
        text: text.clone(),
        task,
    })
}

/// Whitespace-only, counting a stray byte-order mark as whitespace.
fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{FEFF}')
}
