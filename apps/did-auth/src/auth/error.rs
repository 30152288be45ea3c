// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned for every unusable nonce, whatever the reason.
pub const CHALLENGE_INVALID_MESSAGE: &str = "Invalid or expired challenge";

/// Authentication error type.
///
/// `ChallengeInvalid` deliberately carries no detail: unknown, expired and
/// already consumed nonces all map to the same response.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Malformed or incomplete input
    #[error("{0}")]
    InvalidRequest(String),
    /// Nonce unknown, expired or already consumed
    #[error("Invalid or expired challenge")]
    ChallengeInvalid,
    /// Signature did not verify against the claimed identity
    #[error("Invalid signature")]
    SignatureInvalid,
    /// Unexpected failure; the detail is logged, never returned
    #[error("Internal server error")]
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        AuthError::InvalidRequest(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        AuthError::InternalError(detail.into())
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::ChallengeInvalid => "challenge_invalid",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidRequest(_)
            | AuthError::ChallengeInvalid
            | AuthError::SignatureInvalid => StatusCode::BAD_REQUEST,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::InternalError(detail) = &self {
            tracing::error!(error = %detail, "Internal error while handling auth request");
        }

        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
