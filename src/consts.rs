//! Project-wide constants.

use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum accepted `text` length, in characters. Inclusive.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Hard wall-clock limit for a single worker invocation.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level request body ceiling (independent of `MAX_TEXT_CHARS`).
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_WORKER_PROGRAM: &str = "python3";
pub const DEFAULT_WORKER_SCRIPT: &str = "script/web_text_processor.py";

/// Per-stream cap on captured worker output.
pub const DEFAULT_MAX_WORKER_OUTPUT: usize = 1024 * 1024;

/// How much worker stderr ends up in a single log line.
pub const MAX_LOGGED_STDERR_BYTES: usize = 4_000;
