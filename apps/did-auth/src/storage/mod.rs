// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Challenge Storage
//!
//! Outstanding challenges live behind the [`ChallengeStore`] trait. Two
//! interchangeable implementations exist, and exactly one is selected at
//! startup (`CHALLENGE_MODE`):
//!
//! - [`InMemoryChallengeStore`] (`memory`) - bounded LRU map keyed by nonce.
//! - [`SignedChallengeStore`] (`token`) - the challenge travels to the client
//!   as an HS256 JWT; only consumed nonces are remembered, until their
//!   token expires.
//!
//! ## Claim Semantics
//!
//! `claim` is a compare-and-consume: under one lock it checks that the
//! nonce is known, unexpired and unconsumed, and marks it consumed. Two
//! concurrent claims of the same nonce therefore cannot both succeed.
//! Every rejection is the uniform [`AuthError::ChallengeInvalid`].

pub mod memory;
pub mod signed_token;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthError, Challenge};

pub use memory::InMemoryChallengeStore;
pub use signed_token::SignedChallengeStore;

/// Which challenge store implementation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeMode {
    /// Server-side keyed store.
    #[default]
    Memory,
    /// Self-contained signed challenge tokens.
    Token,
}

impl ChallengeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeMode::Memory => "memory",
            ChallengeMode::Token => "token",
        }
    }
}

impl fmt::Display for ChallengeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(ChallengeMode::Memory),
            "token" => Ok(ChallengeMode::Token),
            other => Err(format!("expected 'memory' or 'token', got '{other}'")),
        }
    }
}

/// Storage of outstanding challenges.
pub trait ChallengeStore: Send + Sync {
    fn mode(&self) -> ChallengeMode;

    /// Register a freshly issued challenge.
    ///
    /// Returns the token the client must echo back on submit, if this
    /// store is token based.
    fn insert(&self, challenge: Challenge) -> Result<Option<String>, AuthError>;

    /// Atomically look up and consume `nonce`.
    fn claim(
        &self,
        nonce: &str,
        challenge_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Challenge, AuthError>;

    /// Drop expired entries; returns how many were removed.
    fn sweep(&self, now: DateTime<Utc>) -> usize;

    /// Number of entries currently held (challenges or consumed nonces).
    fn outstanding(&self) -> usize;

    /// False once the store can no longer serve claims (poisoned lock).
    fn is_healthy(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_mode_parses_case_insensitively() {
        assert_eq!("memory".parse::<ChallengeMode>().unwrap(), ChallengeMode::Memory);
        assert_eq!(" Token ".parse::<ChallengeMode>().unwrap(), ChallengeMode::Token);
        assert!("redis".parse::<ChallengeMode>().is_err());
    }
}
