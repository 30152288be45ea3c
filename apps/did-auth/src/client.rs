// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the login endpoints.
//!
//! Drives the complete flow against a running server: request a challenge,
//! answer it with a [`LocalWallet`], submit the response.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::auth::{SigningScheme, TypedDataDomain};
use crate::models::{AuthRequest, AuthResponse, ChallengeRequest, ChallengeResponse, SubmitResponse};
use crate::wallet::{LocalWallet, WalletError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Login request failed: {0}")]
    Request(String),

    /// The server answered with an error body.
    #[error("Server rejected {path} ({status}): {error_code}: {message}")]
    Rejected {
        path: String,
        status: u16,
        error_code: String,
        message: String,
    },

    #[error("Login response was invalid: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

#[derive(Debug, Clone)]
pub struct LoginClient {
    base_url: String,
    domain: TypedDataDomain,
    http: Client,
}

impl LoginClient {
    /// Client for the server at `base_url`, signing typed data under `domain`.
    pub fn new(base_url: impl Into<String>, domain: TypedDataDomain) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            domain,
            http,
        })
    }

    pub async fn request_challenge(
        &self,
        auth_request: AuthRequest,
    ) -> Result<ChallengeResponse, ClientError> {
        self.post_json(
            "/challenge",
            &ChallengeRequest {
                auth_request: Some(auth_request),
            },
        )
        .await
    }

    pub async fn submit(&self, response: &AuthResponse) -> Result<SubmitResponse, ClientError> {
        self.post_json("/submit", response).await
    }

    /// Run the whole login for `wallet`.
    pub async fn login(
        &self,
        wallet: &LocalWallet,
        mut auth_request: AuthRequest,
        scheme: SigningScheme,
    ) -> Result<SubmitResponse, ClientError> {
        auth_request.signing_scheme = Some(scheme);
        let challenge = self.request_challenge(auth_request).await?;

        let response = wallet.answer_challenge(
            &challenge.nonce,
            challenge.signing_scheme,
            Utc::now(),
            &self.domain,
            challenge.challenge_token,
        )?;

        self.submit(&response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}{}", self.base_url.trim_end_matches('/'), path))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body: Value = response.json().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                path: path.to_string(),
                status,
                error_code: body["error_code"].as_str().unwrap_or("unknown").to_string(),
                message: body["error"].as_str().unwrap_or_default().to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}
