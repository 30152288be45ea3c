// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::storage::ChallengeMode;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "unavailable").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Challenge store state: "ok", "saturated" or "unavailable".
    pub challenge_store: String,
    /// Active challenge store.
    pub challenge_mode: ChallengeMode,
    /// Challenges held by the store (consumed nonces in token mode).
    pub outstanding_challenges: usize,
    /// Store capacity in memory mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

/// Simple health check response for liveness checks.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint handler.
///
/// A full in-memory store is reported as `saturated` but stays ready: new
/// challenges evict the oldest ones, which any client can cause. Only a
/// store that cannot serve claims any more answers 503.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Challenge store is unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let mode = state.store.mode();
    let outstanding = state.store.outstanding();
    let capacity =
        (mode == ChallengeMode::Memory).then_some(state.config.max_outstanding_challenges);
    let healthy = state.store.is_healthy();
    let saturated = capacity.is_some_and(|cap| outstanding >= cap);

    let challenge_store = match (healthy, saturated) {
        (false, _) => "unavailable",
        (true, true) => "saturated",
        (true, false) => "ok",
    };

    let response = ReadyResponse {
        status: if healthy { "ok" } else { "unavailable" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            challenge_store: challenge_store.to_string(),
            challenge_mode: mode,
            outstanding_challenges: outstanding,
            capacity,
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness check handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}
