// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process challenge store.
//!
//! Challenges are kept in an LRU map bounded by `capacity`, so a flood of
//! challenge requests evicts the oldest outstanding challenges instead of
//! growing memory without limit. Consumed challenges stay in the map,
//! flagged, until the sweeper drops them after expiry.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use lru::LruCache;

use super::{ChallengeMode, ChallengeStore};
use crate::auth::{AuthError, Challenge};

/// Default maximum number of challenges held at once.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded, mutex-guarded map of nonce → challenge.
pub struct InMemoryChallengeStore {
    challenges: Mutex<LruCache<String, Challenge>>,
}

impl InMemoryChallengeStore {
    /// Create a store holding at most `capacity` challenges.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            challenges: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, Challenge>>, AuthError> {
        self.challenges
            .lock()
            .map_err(|_| AuthError::internal("Challenge store lock poisoned"))
    }
}

impl Default for InMemoryChallengeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChallengeStore for InMemoryChallengeStore {
    fn mode(&self) -> ChallengeMode {
        ChallengeMode::Memory
    }

    fn insert(&self, challenge: Challenge) -> Result<Option<String>, AuthError> {
        let mut challenges = self.lock()?;
        if challenges.contains(&challenge.nonce) {
            return Err(AuthError::internal("Nonce collision on insert"));
        }

        if let Some((evicted, _)) = challenges.push(challenge.nonce.clone(), challenge) {
            tracing::warn!(
                evicted_nonce = %evicted,
                "Challenge store at capacity, evicted oldest challenge"
            );
        }
        Ok(None)
    }

    fn claim(
        &self,
        nonce: &str,
        _challenge_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Challenge, AuthError> {
        let mut challenges = self.lock()?;

        let Some(challenge) = challenges.get_mut(nonce) else {
            return Err(AuthError::ChallengeInvalid);
        };

        if challenge.is_expired(now) {
            challenges.pop(nonce);
            return Err(AuthError::ChallengeInvalid);
        }
        if challenge.consumed {
            return Err(AuthError::ChallengeInvalid);
        }

        challenge.consumed = true;
        Ok(challenge.clone())
    }

    fn sweep(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut challenges) = self.lock() else {
            return 0;
        };

        let expired: Vec<String> = challenges
            .iter()
            .filter(|(_, challenge)| challenge.is_expired(now))
            .map(|(nonce, _)| nonce.clone())
            .collect();

        for nonce in &expired {
            challenges.pop(nonce);
        }
        expired.len()
    }

    fn outstanding(&self) -> usize {
        self.lock().map(|challenges| challenges.len()).unwrap_or(0)
    }

    fn is_healthy(&self) -> bool {
        !self.challenges.is_poisoned()
    }
}
