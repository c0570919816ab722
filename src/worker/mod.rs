pub mod mock;
pub mod process;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::consts::MAX_LOGGED_STDERR_BYTES;
use crate::validate::Task;

/// What the worker printed on stdout. Extra fields (the worker echoes
/// `task` and `input`) are ignored and never reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub success: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl WorkerResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }

    /// Parse the worker's stdout. A result claiming success without an
    /// output is rejected along with malformed JSON.
    pub fn parse(stdout: &[u8]) -> Result<Self, InvocationFailure> {
        let result: WorkerResult = serde_json::from_slice(stdout)
            .map_err(|e| InvocationFailure::OutputParse(e.to_string()))?;
        if result.success && result.output.is_none() {
            return Err(InvocationFailure::OutputParse(
                "worker reported success without an output".to_string(),
            ));
        }
        Ok(result)
    }
}

/// Why an invocation produced no usable [`WorkerResult`].
#[derive(Debug, Error)]
pub enum InvocationFailure {
    #[error("failed to start worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("worker exited with {}: {stderr}", exit_label(.code))]
    Exit { code: Option<i32>, stderr: String },

    #[error("worker output could not be parsed: {0}")]
    OutputParse(String),

    #[error("worker timed out after {0:?}")]
    Timeout(Duration),
}

impl InvocationFailure {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InvocationFailure::Spawn(_) => "spawn_error",
            InvocationFailure::Exit { .. } => "worker_exit_error",
            InvocationFailure::OutputParse(_) => "output_parse_error",
            InvocationFailure::Timeout(_) => "timeout_error",
        }
    }

    /// Like `Display`, with stderr clipped to something a log line can hold.
    pub fn log_summary(&self) -> String {
        match self {
            InvocationFailure::Exit { code, stderr } => format!(
                "worker exited with {}: {}",
                exit_label(code),
                truncate_output(stderr.trim_end(), MAX_LOGGED_STDERR_BYTES)
            ),
            other => other.to_string(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "no exit code".to_string(),
    }
}

fn truncate_output(output: &str, max_bytes: usize) -> String {
    if output.len() <= max_bytes {
        return output.to_string();
    }
    let mut end = max_bytes;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n[truncated: showing {}/{} bytes]",
        &output[..end],
        end,
        output.len()
    )
}

/// Runs one task over one text. Every call is an independent invocation
/// and settles exactly once.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn invoke(&self, task: Task, text: &str) -> Result<WorkerResult, InvocationFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success() {
        let result = WorkerResult::parse(br#"{"success":true,"output":"X"}"#).unwrap();
        assert_eq!(result, WorkerResult::ok("X"));
    }

    #[test]
    fn parse_ignores_echoed_fields() {
        let stdout = br#"{
  "success": true,
  "task": "summarize",
  "input": "some text",
  "output": "short"
}
"#;
        let result = WorkerResult::parse(stdout).unwrap();
        assert_eq!(result.output.as_deref(), Some("short"));
    }

    #[test]
    fn parse_worker_side_failure() {
        let stdout = br#"{"success":false,"error":"API down","output":null}"#;
        let result = WorkerResult::parse(stdout).unwrap();
        assert_eq!(result, WorkerResult::failed("API down"));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = WorkerResult::parse(b"Using OpenAI client\n{}").unwrap_err();
        assert!(matches!(err, InvocationFailure::OutputParse(_)));
    }

    #[test]
    fn parse_rejects_empty_stdout() {
        let err = WorkerResult::parse(b"").unwrap_err();
        assert!(matches!(err, InvocationFailure::OutputParse(_)));
    }

    #[test]
    fn parse_rejects_success_without_output() {
        let err = WorkerResult::parse(br#"{"success":true,"output":null}"#).unwrap_err();
        assert!(err.to_string().contains("without an output"));
    }

    #[test]
    fn failure_display() {
        let exit = InvocationFailure::Exit {
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(exit.to_string(), "worker exited with code 1: boom");

        let killed = InvocationFailure::Exit {
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("no exit code"));

        let timeout = InvocationFailure::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.to_string(), "worker timed out after 30s");
    }

    #[test]
    fn truncate_short_output_untouched() {
        assert_eq!(truncate_output("short", 100), "short");
    }

    #[test]
    fn truncate_long_output() {
        let out = truncate_output(&"x".repeat(50), 10);
        assert!(out.starts_with("xxxxxxxxxx\n"));
        assert!(out.contains("[truncated: showing 10/50 bytes]"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // Each 'é' is two bytes; cutting at 3 must back off to 2.
        let out = truncate_output("ééé", 3);
        assert!(out.starts_with("é\n"));
    }

    #[test]
    fn log_summary_clips_stderr() {
        let failure = InvocationFailure::Exit {
            code: Some(1),
            stderr: "e".repeat(MAX_LOGGED_STDERR_BYTES * 2),
        };
        let summary = failure.log_summary();
        assert!(summary.starts_with("worker exited with code 1: "));
        assert!(summary.contains("[truncated: showing"));
        assert!(summary.len() < MAX_LOGGED_STDERR_BYTES + 100);
    }

    #[test]
    fn failure_kinds_are_distinct() {
        let kinds = [
            InvocationFailure::Spawn(io::Error::from(io::ErrorKind::NotFound)).kind(),
            InvocationFailure::Exit {
                code: Some(2),
                stderr: String::new(),
            }
            .kind(),
            InvocationFailure::OutputParse(String::new()).kind(),
            InvocationFailure::Timeout(Duration::ZERO).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
