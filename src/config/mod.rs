//! Gateway configuration.
//!
//! Built once at startup (the binary fills it from flags and environment)
//! and then shared read-only with every request handler.

use anyhow::{Context, Result};
use axum::http::HeaderValue;

use crate::consts::{DEFAULT_ALLOWED_ORIGIN, DEFAULT_BODY_LIMIT, DEFAULT_HOST, DEFAULT_PORT};
use crate::worker::process::WorkerConfig;

/// Everything the gateway needs to run.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    /// `0` asks the OS for a free port.
    pub port: u16,
    /// Sole origin allowed by CORS.
    pub allowed_origin: String,
    /// Transport-level request body ceiling, in bytes.
    pub body_limit: usize,
    pub worker: WorkerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
            worker: WorkerConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The allowed origin as a header value. Fails on characters that
    /// can't appear in a header.
    pub fn allowed_origin_header(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(&self.allowed_origin)
            .with_context(|| format!("invalid allowed origin: {:?}", self.allowed_origin))
    }
}
