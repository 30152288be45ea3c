// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use ring::rand::SystemRandom;

use crate::auth::random::random_bytes;
use crate::auth::{AuthError, ChallengeIssuer, SessionIssuer, SignatureVerifier, SubmissionHandler};
use crate::clock::{Clock, SystemClock};
use crate::config::{AuthConfig, MIN_JWT_SECRET_LEN};
use crate::storage::{ChallengeMode, ChallengeStore, InMemoryChallengeStore, SignedChallengeStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChallengeStore>,
    pub issuer: Arc<ChallengeIssuer>,
    pub submissions: Arc<SubmissionHandler>,
    pub verifier: Arc<SignatureVerifier>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AuthConfig>,
}

impl AppState {
    /// Wire the auth components for `config`, reading time from `clock`.
    pub fn from_config(config: AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let store: Arc<dyn ChallengeStore> = match config.challenge_mode {
            ChallengeMode::Memory => Arc::new(InMemoryChallengeStore::new(
                config.max_outstanding_challenges,
            )),
            ChallengeMode::Token => {
                let secret = match &config.jwt_secret {
                    Some(secret) => secret.as_bytes().to_vec(),
                    None => {
                        tracing::warn!(
                            "JWT_SECRET not set; generated a per-process secret, \
                             challenge tokens will not survive a restart"
                        );
                        random_bytes(&SystemRandom::new(), MIN_JWT_SECRET_LEN)?
                    }
                };
                Arc::new(SignedChallengeStore::new(&secret))
            }
        };

        Ok(Self::assemble(config, clock, store))
    }

    fn assemble(config: AuthConfig, clock: Arc<dyn Clock>, store: Arc<dyn ChallengeStore>) -> Self {
        let verifier = Arc::new(SignatureVerifier::new(config.typed_data_domain.clone()));
        let issuer = Arc::new(ChallengeIssuer::new(
            store.clone(),
            clock.clone(),
            config.challenge_ttl,
        ));
        let submissions = Arc::new(SubmissionHandler::new(
            store.clone(),
            verifier.clone(),
            Arc::new(SessionIssuer::new()),
            clock.clone(),
        ));

        Self {
            store,
            issuer,
            submissions,
            verifier,
            clock,
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        let config = AuthConfig::default();
        let store = Arc::new(InMemoryChallengeStore::new(
            config.max_outstanding_challenges,
        ));
        Self::assemble(config, Arc::new(SystemClock), store)
    }
}
