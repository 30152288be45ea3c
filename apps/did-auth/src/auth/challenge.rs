// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge issuance.
//!
//! A challenge is a single-use nonce with a creation time, an expiry and
//! the signing scheme the client committed to. The issuer validates the
//! client's [`AuthRequest`], mints the nonce and hands the challenge to the
//! configured [`ChallengeStore`], which either keeps it (stateful mode) or
//! seals it into a signed token (stateless mode).

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ring::rand::SystemRandom;
use serde::{Deserialize, Serialize};
use url::Url;

use super::random::random_hex;
use super::{AuthError, SigningScheme};
use crate::clock::Clock;
use crate::models::{AuthRequest, ChallengeResponse};
use crate::storage::ChallengeStore;

/// Default challenge lifetime (5 minutes).
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::minutes(5);

/// Random bytes appended to the nonce's timestamp prefix.
const NONCE_RANDOM_BYTES: usize = 16;

/// Upper bound for client-supplied identity strings.
const MAX_FIELD_LEN: usize = 256;

/// An issued challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub nonce: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub scheme: SigningScheme,
    /// Application identity taken from the auth request.
    pub app: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl Challenge {
    /// Expired challenges are never accepted, even if still stored.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether a submission at `now` may still consume this challenge.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired(now)
    }
}

/// Format a timestamp the way the browser's `Date#toISOString` does.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Challenge plus the optional token the caller must return on submit.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub challenge: Challenge,
    pub challenge_token: Option<String>,
}

impl From<IssuedChallenge> for ChallengeResponse {
    fn from(issued: IssuedChallenge) -> Self {
        ChallengeResponse {
            created: format_timestamp(issued.challenge.created_at),
            expires: format_timestamp(issued.challenge.expires_at),
            nonce: issued.challenge.nonce,
            signing_scheme: issued.challenge.scheme,
            challenge_token: issued.challenge_token,
        }
    }
}

/// Creates challenges and registers them with the store.
pub struct ChallengeIssuer {
    store: Arc<dyn ChallengeStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    rng: SystemRandom,
}

impl ChallengeIssuer {
    pub fn new(store: Arc<dyn ChallengeStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            rng: SystemRandom::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a challenge for `request`.
    pub fn issue(&self, request: &AuthRequest) -> Result<IssuedChallenge, AuthError> {
        let app = validate_auth_request(request)?;

        let now = self.clock.now();
        let nonce = format!(
            "{}-{}",
            now.timestamp_millis(),
            random_hex(&self.rng, NONCE_RANDOM_BYTES)?
        );

        let challenge = Challenge {
            nonce,
            created_at: now,
            expires_at: now + self.ttl,
            consumed: false,
            scheme: request.signing_scheme.unwrap_or_default(),
            app,
            request_id: request.request_id.clone(),
        };

        let challenge_token = self.store.insert(challenge.clone())?;

        tracing::debug!(
            action = "challenge_issued",
            nonce = %challenge.nonce,
            app = %challenge.app,
            scheme = %challenge.scheme,
            request_id = ?challenge.request_id,
            "Issued login challenge"
        );

        Ok(IssuedChallenge {
            challenge,
            challenge_token,
        })
    }
}

/// Check the request and return the application identity to bind.
fn validate_auth_request(request: &AuthRequest) -> Result<String, AuthError> {
    let app = [request.app.as_deref(), request.domain.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .ok_or_else(|| {
            AuthError::invalid_request("authRequest must name an application or domain")
        })?;

    for (field, value) in [
        ("app", request.app.as_deref()),
        ("domain", request.domain.as_deref()),
        ("requestId", request.request_id.as_deref()),
        ("callbackUrl", request.callback_url.as_deref()),
    ] {
        if value.is_some_and(|v| v.len() > MAX_FIELD_LEN) {
            return Err(AuthError::invalid_request(format!(
                "authRequest.{field} exceeds {MAX_FIELD_LEN} characters"
            )));
        }
    }

    if let Some(callback) = request.callback_url.as_deref() {
        let url = Url::parse(callback)
            .map_err(|e| AuthError::invalid_request(format!("Invalid callbackUrl: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AuthError::invalid_request(
                "callbackUrl must use http or https",
            ));
        }
    }

    Ok(app.to_string())
}
