// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session credential issuance.
//!
//! The credential is an opaque 256-bit random token. Persisting it, setting
//! cookies or attaching an expiry is left to the caller.

use alloy::primitives::Address;
use ring::rand::SystemRandom;

use super::random::random_hex;
use super::{AuthError, Did};

/// Number of random bytes in a session token.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Message returned alongside a successful login.
pub const AUTH_SUCCESS_MESSAGE: &str = "Authentication successful";

/// Credential proving that `did` completed a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredential {
    pub token: String,
    pub did: String,
    pub address: Address,
}

/// Mints session credentials.
pub struct SessionIssuer {
    rng: SystemRandom,
}

impl SessionIssuer {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    pub fn issue(&self, did: &Did) -> Result<SessionCredential, AuthError> {
        Ok(SessionCredential {
            token: random_hex(&self.rng, SESSION_TOKEN_BYTES)?,
            did: did.to_string(),
            address: did.address(),
        })
    }
}

impl Default for SessionIssuer {
    fn default() -> Self {
        Self::new()
    }
}
