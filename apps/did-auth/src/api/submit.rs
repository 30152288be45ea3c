// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::json_body;
use crate::{
    auth::{AuthError, AUTH_SUCCESS_MESSAGE},
    models::{AuthResponse, SubmitResponse},
    state::AppState,
};

/// Submit a signed challenge and receive a session token.
///
/// A challenge can be submitted once. Unknown, expired and already used
/// challenges all produce the same `challenge_invalid` error.
#[utoipa::path(
    post,
    path = "/submit",
    request_body = AuthResponse,
    tag = "Auth",
    responses(
        (status = 200, description = "Authenticated", body = SubmitResponse),
        (status = 400, description = "Invalid request, challenge or signature")
    )
)]
pub async fn submit_auth(
    State(state): State<AppState>,
    payload: Result<Json<AuthResponse>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AuthError> {
    let response = json_body(payload)?;
    let credential = state.submissions.submit(response)?;

    Ok(Json(SubmitResponse {
        token: credential.token,
        message: AUTH_SUCCESS_MESSAGE.to_string(),
        did: credential.did,
        address: credential.address.to_checksum(None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SigningScheme, TypedDataDomain};
    use crate::clock::Clock;
    use crate::models::AuthRequest;
    use crate::wallet::LocalWallet;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn signed_response(state: &AppState, wallet: &LocalWallet) -> AuthResponse {
        let issued = state
            .issuer
            .issue(&AuthRequest {
                app: Some("test-app".to_string()),
                ..Default::default()
            })
            .unwrap();
        wallet
            .answer_challenge(
                &issued.challenge.nonce,
                SigningScheme::PersonalSign,
                state.clock.now(),
                &TypedDataDomain::default(),
                issued.challenge_token,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn valid_submission_returns_token() {
        let state = AppState::default();
        let wallet = LocalWallet::from_hex(KEY).unwrap();
        let response = signed_response(&state, &wallet);

        let Json(body) = submit_auth(State(state), Ok(Json(response)))
            .await
            .expect("submission should succeed");

        assert_eq!(body.token.len(), 64);
        assert_eq!(body.message, "Authentication successful");
        assert_eq!(body.did, wallet.did().as_str());
        assert_eq!(body.address, wallet.address().to_checksum(None));
    }

    #[tokio::test]
    async fn second_submission_is_rejected() {
        let state = AppState::default();
        let wallet = LocalWallet::from_hex(KEY).unwrap();
        let response = signed_response(&state, &wallet);

        submit_auth(State(state.clone()), Ok(Json(response.clone())))
            .await
            .unwrap();
        let err = submit_auth(State(state), Ok(Json(response)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ChallengeInvalid));
    }
}
