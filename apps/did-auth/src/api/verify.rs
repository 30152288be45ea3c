// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::json_body;
use crate::{
    auth::{AuthError, Did},
    models::{VerifyRequest, VerifyResponse},
    state::AppState,
};

/// Check a signature over an explicit login message.
///
/// Stateless: no challenge is looked up or consumed, so a successful check
/// here does not authenticate anyone.
#[utoipa::path(
    post,
    path = "/verify",
    request_body = VerifyRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Verification result", body = VerifyResponse),
        (status = 400, description = "Malformed request")
    )
)]
pub async fn verify_signature(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AuthError> {
    let request = json_body(payload)?;
    let did = Did::parse(&request.did)?;
    if request.signature.trim().is_empty() {
        return Err(AuthError::invalid_request("Missing signature"));
    }

    let success = match state.verifier.verify_detached(
        request.scheme.unwrap_or_default(),
        &request.message,
        &request.signature,
        &did,
    ) {
        Ok(_) => true,
        Err(AuthError::SignatureInvalid) => false,
        Err(e) => return Err(e),
    };

    Ok(Json(VerifyResponse { success }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CanonicalMessage, SigningScheme, TypedDataDomain};
    use crate::wallet::LocalWallet;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn request(scheme: SigningScheme, tamper: bool) -> VerifyRequest {
        let wallet = LocalWallet::from_hex(KEY).unwrap();
        let did = wallet.did();
        let message = CanonicalMessage::new("nonce-1", did.as_str(), "2026-01-01T00:00:00.000Z");
        let signature = wallet
            .sign_message(&message, scheme, &TypedDataDomain::default())
            .unwrap();

        let mut message = message;
        if tamper {
            message.nonce = "nonce-2".to_string();
        }
        VerifyRequest {
            did: did.to_string(),
            message,
            signature,
            scheme: Some(scheme),
        }
    }

    #[tokio::test]
    async fn reports_valid_signature() {
        for scheme in [SigningScheme::PersonalSign, SigningScheme::TypedDataV4] {
            let Json(result) =
                verify_signature(State(AppState::default()), Ok(Json(request(scheme, false))))
                    .await
                    .unwrap();
            assert!(result.success);
        }
    }

    #[tokio::test]
    async fn reports_tampered_message_as_failure() {
        let Json(result) = verify_signature(
            State(AppState::default()),
            Ok(Json(request(SigningScheme::PersonalSign, true))),
        )
        .await
        .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn malformed_did_is_invalid_request() {
        let mut body = request(SigningScheme::PersonalSign, false);
        body.did = "not-a-did".to_string();
        let err = verify_signature(State(AppState::default()), Ok(Json(body)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest(_)));
    }
}
