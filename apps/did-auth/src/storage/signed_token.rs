// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless challenge tokens.
//!
//! The challenge is sealed into an HS256 JWT and handed to the client; the
//! server keeps no record of outstanding challenges. To keep challenges
//! single-use, every consumed nonce is remembered until its token would
//! have expired anyway.
//!
//! Expiry is checked against the injected clock rather than by
//! `jsonwebtoken`, which only knows the system time.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{ChallengeMode, ChallengeStore};
use crate::auth::{format_timestamp, AuthError, Challenge, SigningScheme};

/// Claims carried by a challenge token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChallengeClaims {
    nonce: String,
    /// Issue time, RFC 3339 with milliseconds.
    created: String,
    iat: i64,
    /// Expiry, milliseconds since the epoch.
    exp_ms: i64,
    /// Expiry, seconds since the epoch (registered claim).
    exp: i64,
    scheme: SigningScheme,
    app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl ChallengeClaims {
    fn from_challenge(challenge: &Challenge) -> Self {
        Self {
            nonce: challenge.nonce.clone(),
            created: format_timestamp(challenge.created_at),
            iat: challenge.created_at.timestamp(),
            exp_ms: challenge.expires_at.timestamp_millis(),
            exp: challenge.expires_at.timestamp(),
            scheme: challenge.scheme,
            app: challenge.app.clone(),
            request_id: challenge.request_id.clone(),
        }
    }

    fn into_challenge(self) -> Option<Challenge> {
        let created_at = DateTime::parse_from_rfc3339(&self.created)
            .ok()?
            .with_timezone(&Utc);
        let expires_at = DateTime::from_timestamp_millis(self.exp_ms)?;
        Some(Challenge {
            nonce: self.nonce,
            created_at,
            expires_at,
            consumed: true,
            scheme: self.scheme,
            app: self.app,
            request_id: self.request_id,
        })
    }
}

/// Challenge store that issues signed tokens instead of keeping state.
pub struct SignedChallengeStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Consumed nonce → expiry of its token.
    consumed: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SignedChallengeStore {
    /// Create a store signing with the HMAC `secret`.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            consumed: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, DateTime<Utc>>>, AuthError> {
        self.consumed
            .lock()
            .map_err(|_| AuthError::internal("Consumed-nonce ledger lock poisoned"))
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }

    fn open(&self, token: &str) -> Result<ChallengeClaims, AuthError> {
        decode::<ChallengeClaims>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected challenge token");
                AuthError::ChallengeInvalid
            })
    }
}

impl ChallengeStore for SignedChallengeStore {
    fn mode(&self) -> ChallengeMode {
        ChallengeMode::Token
    }

    fn insert(&self, challenge: Challenge) -> Result<Option<String>, AuthError> {
        let claims = ChallengeClaims::from_challenge(&challenge);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Failed to sign challenge token: {e}")))?;
        Ok(Some(token))
    }

    fn claim(
        &self,
        nonce: &str,
        challenge_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Challenge, AuthError> {
        let token = challenge_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::invalid_request("Missing challengeToken"))?;

        let claims = self.open(token)?;
        if claims.nonce != nonce {
            return Err(AuthError::ChallengeInvalid);
        }

        let challenge = claims
            .into_challenge()
            .ok_or(AuthError::ChallengeInvalid)?;
        if challenge.is_expired(now) {
            return Err(AuthError::ChallengeInvalid);
        }

        let mut consumed = self.lock()?;
        if consumed.contains_key(nonce) {
            return Err(AuthError::ChallengeInvalid);
        }
        consumed.insert(challenge.nonce.clone(), challenge.expires_at);

        Ok(challenge)
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut consumed) = self.lock() else {
            return 0;
        };
        let before = consumed.len();
        consumed.retain(|_, expires_at| now < *expires_at);
        before - consumed.len()
    }

    fn outstanding(&self) -> usize {
        self.lock().map(|consumed| consumed.len()).unwrap_or(0)
    }

    fn is_healthy(&self) -> bool {
        !self.consumed.is_poisoned()
    }
}
