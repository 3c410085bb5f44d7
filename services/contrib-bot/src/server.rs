//! HTTP Surface
//!
//! - `POST /commit`: run the daily commit (secret check, then rate limit)
//! - `GET /status`: last line of the keep-alive log
//! - `GET /health`: liveness
//!
//! Other methods on these paths get a 405 from the router.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::BotConfig;
use crate::error::BotError;
use crate::github::GitHubApi;
use crate::orchestrator::{CommitOutcome, CommitStatus, DailyCommitter};
use crate::rate_limit::{DailyRateLimiter, RatePermit};

/// Header carrying the invocation secret
pub const APP_KEY_HEADER: &str = "x-app-key";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub committer: DailyCommitter,
    pub limiter: Arc<DailyRateLimiter>,
}

impl AppState {
    pub fn new(config: BotConfig, github: Arc<dyn GitHubApi>) -> Self {
        Self {
            config: Arc::new(config),
            committer: DailyCommitter::new(github),
            limiter: Arc::new(DailyRateLimiter::default()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/commit", post(commit))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "contrib-bot",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn commit(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, BotError> {
    authorize(state.config.invocation_secret(), &headers)?;

    let permit = state.limiter.try_acquire().map_err(|err| {
        warn!(error = %err, "Commit rejected by daily rate limit");
        err
    })?;

    match run_commit(&state).await {
        Ok(outcome) => Ok(Json(commit_response(&outcome, &permit))),
        Err(err) => {
            // Failed attempts must not use up the day's quota.
            state.limiter.release(permit);
            error!(error = %err, "Daily commit failed");
            Err(err)
        }
    }
}

async fn run_commit(state: &AppState) -> Result<CommitOutcome, BotError> {
    let job = state.config.resolve()?;
    state.committer.run(&job).await
}

fn commit_response(outcome: &CommitOutcome, permit: &RatePermit) -> serde_json::Value {
    match outcome.status {
        CommitStatus::Committed => serde_json::json!({
            "ok": true,
            "status": outcome.status,
            "branch": outcome.branch,
            "timestamp": outcome.timestamp,
            "result": outcome.result,
            "rateLimit": permit,
        }),
        CommitStatus::AlreadyDone => serde_json::json!({
            "ok": true,
            "status": outcome.status,
            "branch": outcome.branch,
            "message": outcome.message(),
            "rateLimit": permit,
        }),
    }
}

async fn status(State(state): State<AppState>) -> Result<Json<serde_json::Value>, BotError> {
    let job = state.config.resolve()?;
    let last = state.committer.last_entry(&job).await.map_err(|err| {
        error!(error = %err, "Failed to read keep-alive log");
        err
    })?;

    Ok(Json(serde_json::json!({ "ok": true, "last": last })))
}

/// Check `X-APP-KEY` against the configured secret, if there is one
fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), BotError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = headers
        .get(APP_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if !provided.is_empty() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        warn!("Rejected commit request with missing or wrong X-APP-KEY");
        Err(BotError::Unauthorized)
    }
}
