// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::json_body;
use crate::{
    auth::AuthError,
    models::{ChallengeRequest, ChallengeResponse},
    state::AppState,
};

/// Issue a single-use login challenge.
#[utoipa::path(
    post,
    path = "/challenge",
    request_body = ChallengeRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 400, description = "Malformed or incomplete auth request")
    )
)]
pub async fn create_challenge(
    State(state): State<AppState>,
    payload: Result<Json<ChallengeRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, AuthError> {
    let request = json_body(payload)?;
    let auth_request = request
        .auth_request
        .ok_or_else(|| AuthError::invalid_request("Missing authRequest"))?;

    let issued = state.issuer.issue(&auth_request)?;
    Ok(Json(issued.into()))
}
