// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthError, SigningScheme},
    models::{
        AuthRequest, AuthResponse, ChallengeRequest, ChallengeResponse, Proof, SubmitResponse,
        VerifyRequest, VerifyResponse,
    },
    state::AppState,
    storage::ChallengeMode,
};

pub mod challenge;
pub mod health;
pub mod submit;
pub mod verify;

/// Paths used by the browser login page.
pub const LEGACY_CHALLENGE_PATH: &str = "/api/getChallenge";
pub const LEGACY_SUBMIT_PATH: &str = "/api/submitAuth";

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/challenge", post(challenge::create_challenge))
        .route("/submit", post(submit::submit_auth))
        .route("/verify", post(verify::verify_signature))
        .route(LEGACY_CHALLENGE_PATH, post(challenge::create_challenge))
        .route(LEGACY_SUBMIT_PATH, post(submit::submit_auth))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(auth_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Unwrap a JSON body, turning extractor rejections into `InvalidRequest`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AuthError::invalid_request(rejection.body_text()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        challenge::create_challenge,
        submit::submit_auth,
        verify::verify_signature,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            AuthRequest,
            ChallengeRequest,
            ChallengeResponse,
            AuthResponse,
            Proof,
            SubmitResponse,
            VerifyRequest,
            VerifyResponse,
            SigningScheme,
            ChallengeMode,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Wallet DID challenge-response login"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;
