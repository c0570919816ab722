use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use serde_json::{Value, json};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use super::AppState;
use crate::consts::VERSION;
use crate::response::Reply;
use crate::validate::validate;

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Text Processor API",
        "version": VERSION,
        "endpoints": {
            "health": "GET /api/health",
            "process": "POST /api/process",
        },
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "uptime": state.started.elapsed().as_secs_f64(),
    }))
}

pub async fn not_found() -> Reply {
    Reply::not_found()
}

/// `POST /api/process`. A panic anywhere below becomes `INTERNAL_ERROR`
/// instead of a dropped connection.
pub async fn process(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    match AssertUnwindSafe(handle_process(state, body))
        .catch_unwind()
        .await
    {
        Ok(reply) => reply,
        Err(_) => {
            tracing::error!("process handler panicked");
            Reply::internal()
        }
    }
}

async fn handle_process(state: AppState, body: Result<Bytes, BytesRejection>) -> Reply {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("unreadable request body: {rejection}");
            return Reply::internal();
        }
    };

    // Malformed JSON reads as an empty object and fails validation.
    let value: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));

    let request = match validate(&value) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(code = %e.code(), "rejected request");
            return e.into();
        }
    };

    let span = tracing::info_span!(
        "process",
        task = %request.task,
        chars = request.text.chars().count()
    );
    let worker = Arc::clone(&state.worker);

    async move {
        let started = Instant::now();
        let outcome = worker.invoke(request.task, &request.text).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) if result.success => {
                tracing::info!(elapsed_ms, "worker succeeded");
            }
            Ok(result) => {
                tracing::warn!(
                    elapsed_ms,
                    "worker reported failure: {}",
                    result.error.as_deref().unwrap_or("<no message>")
                );
            }
            Err(failure) => {
                tracing::warn!(
                    elapsed_ms,
                    kind = failure.kind(),
                    "{}",
                    failure.log_summary()
                );
            }
        }

        Reply::from_outcome(&outcome)
    }
    .instrument(span)
    .await
}
