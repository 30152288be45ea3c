// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OS-backed randomness for nonces, session tokens and generated secrets.

use ring::rand::{SecureRandom, SystemRandom};

use super::AuthError;

/// Fill `len` bytes from the system CSPRNG.
pub fn random_bytes(rng: &SystemRandom, len: usize) -> Result<Vec<u8>, AuthError> {
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| AuthError::internal("System random number generator failed"))?;
    Ok(buf)
}

/// `len` random bytes, lowercase hex encoded (`2 * len` characters).
pub fn random_hex(rng: &SystemRandom, len: usize) -> Result<String, AuthError> {
    Ok(alloy::hex::encode(random_bytes(rng, len)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_hex_has_expected_length_and_charset() {
        let rng = SystemRandom::new();
        let hex = random_hex(&rng, 32).unwrap();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn consecutive_draws_differ() {
        let rng = SystemRandom::new();
        assert_ne!(random_hex(&rng, 16).unwrap(), random_hex(&rng, 16).unwrap());
    }
}
