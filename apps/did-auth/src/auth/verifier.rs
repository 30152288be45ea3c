// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet signature verification.
//!
//! ## Scheme
//!
//! Signatures are secp256k1 ECDSA with public-key recovery (65 bytes,
//! `r || s || v`), the format produced by EVM wallets. The verifier
//! rebuilds the canonical message from the challenge nonce, the claimed DID
//! and the proof's `created` timestamp, recovers the signing address and
//! requires it to equal the address embedded in the DID.
//!
//! - `personal_sign`: recovery over the EIP-191 prefixed hash of the JSON text
//! - `eth_signTypedData_v4`: recovery over the EIP-712 signing hash
//!
//! The scheme is the one bound into the challenge at issuance; the proof
//! cannot switch it.
//!
//! ## Failure Mode
//!
//! Every mismatch, decoding problem or ambiguity yields
//! [`AuthError::SignatureInvalid`]. There is no success default.

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, Duration, Utc};

use super::{AuthError, CanonicalMessage, Challenge, Did, SigningScheme, TypedDataDomain};

/// Allowed clock skew between client and server (60 seconds).
pub const CLOCK_SKEW_LEEWAY: Duration = Duration::seconds(60);

/// Only accepted `proof.type`.
pub const PROOF_TYPE_ECDSA: &str = "ecdsa";

/// Length of a recoverable secp256k1 signature.
const SIGNATURE_LEN: usize = 65;

/// Structurally complete proof, as extracted from an auth response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedProof {
    pub algorithm: String,
    pub verification_method: String,
    pub created: String,
    pub value: String,
}

/// Verifies wallet signatures over the canonical login message.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    domain: TypedDataDomain,
    leeway: Duration,
}

impl SignatureVerifier {
    pub fn new(domain: TypedDataDomain) -> Self {
        Self {
            domain,
            leeway: CLOCK_SKEW_LEEWAY,
        }
    }

    /// Create with a custom clock-skew tolerance.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn domain(&self) -> &TypedDataDomain {
        &self.domain
    }

    /// Verify `proof` as an answer to `challenge` by `did`.
    ///
    /// Returns the recovered address on success.
    pub fn verify(
        &self,
        proof: &SignedProof,
        did: &Did,
        challenge: &Challenge,
        now: DateTime<Utc>,
    ) -> Result<Address, AuthError> {
        if !proof.algorithm.eq_ignore_ascii_case(PROOF_TYPE_ECDSA) {
            tracing::debug!(algorithm = %proof.algorithm, "Unsupported proof type");
            return Err(AuthError::SignatureInvalid);
        }

        if !did.owns_verification_method(&proof.verification_method) {
            tracing::debug!(
                verification_method = %proof.verification_method,
                did = %did,
                "Verification method does not belong to DID"
            );
            return Err(AuthError::SignatureInvalid);
        }

        let signed_at = DateTime::parse_from_rfc3339(&proof.created)
            .map_err(|_| AuthError::SignatureInvalid)?
            .with_timezone(&Utc);
        if signed_at < challenge.created_at - self.leeway || signed_at > now + self.leeway {
            tracing::debug!(
                created = %proof.created,
                "Proof timestamp outside the challenge window"
            );
            return Err(AuthError::SignatureInvalid);
        }

        let message = CanonicalMessage::new(
            challenge.nonce.as_str(),
            did.as_str(),
            proof.created.as_str(),
        );
        self.verify_message(challenge.scheme, &message, &proof.value, did)
    }

    /// Check a signature over an explicit message without any challenge.
    ///
    /// The message must name the same DID that is claimed as signer.
    pub fn verify_detached(
        &self,
        scheme: SigningScheme,
        message: &CanonicalMessage,
        signature: &str,
        did: &Did,
    ) -> Result<Address, AuthError> {
        if message.did != did.as_str() {
            return Err(AuthError::SignatureInvalid);
        }
        self.verify_message(scheme, message, signature, did)
    }

    /// Recover the signer of `message` under `scheme`.
    pub fn recover(
        &self,
        scheme: SigningScheme,
        message: &CanonicalMessage,
        signature: &str,
    ) -> Result<Address, AuthError> {
        let signature = decode_signature(signature)?;

        let recovered = match scheme {
            SigningScheme::PersonalSign => {
                let text = message.personal_sign_text()?;
                signature.recover_address_from_msg(text.as_bytes())
            }
            SigningScheme::TypedDataV4 => {
                let hash = message.typed_data_hash(&self.domain);
                signature.recover_address_from_prehash(&hash)
            }
        };

        recovered.map_err(|e| {
            tracing::debug!(error = %e, "Signature recovery failed");
            AuthError::SignatureInvalid
        })
    }

    fn verify_message(
        &self,
        scheme: SigningScheme,
        message: &CanonicalMessage,
        signature: &str,
        did: &Did,
    ) -> Result<Address, AuthError> {
        let recovered = self.recover(scheme, message, signature)?;
        if recovered != did.address() {
            tracing::debug!(
                recovered = %recovered,
                expected = %did.address(),
                "Recovered signer does not match DID"
            );
            return Err(AuthError::SignatureInvalid);
        }
        Ok(recovered)
    }
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new(TypedDataDomain::default())
    }
}

/// Decode a hex `r || s || v` signature (optional `0x`).
fn decode_signature(value: &str) -> Result<Signature, AuthError> {
    let hex = value.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.is_empty() {
        return Err(AuthError::SignatureInvalid);
    }

    let bytes = alloy::hex::decode(hex).map_err(|_| AuthError::SignatureInvalid)?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(AuthError::SignatureInvalid);
    }

    Signature::from_raw(&bytes).map_err(|_| AuthError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::format_timestamp;
    use crate::wallet::LocalWallet;

    const KEY_A: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const KEY_B: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn challenge(scheme: SigningScheme, now: DateTime<Utc>) -> Challenge {
        Challenge {
            nonce: format!("{}-00112233445566778899aabbccddeeff", now.timestamp_millis()),
            created_at: now,
            expires_at: now + Duration::minutes(5),
            consumed: true,
            scheme,
            app: "test-app".to_string(),
            request_id: None,
        }
    }

    fn signed_proof(
        wallet: &LocalWallet,
        challenge: &Challenge,
        created: DateTime<Utc>,
    ) -> SignedProof {
        let response = wallet
            .answer_challenge(
                &challenge.nonce,
                challenge.scheme,
                created,
                &TypedDataDomain::default(),
                None,
            )
            .unwrap();
        let proof = response.proof.unwrap();
        SignedProof {
            algorithm: proof.kind.unwrap(),
            verification_method: proof.verification_method.unwrap(),
            created: proof.created.unwrap(),
            value: proof.value.unwrap(),
        }
    }

    #[test]
    fn personal_sign_with_matching_key_verifies() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let now = Utc::now();
        let challenge = challenge(SigningScheme::PersonalSign, now);
        let proof = signed_proof(&wallet, &challenge, now);

        let recovered = SignatureVerifier::default()
            .verify(&proof, &wallet.did(), &challenge, now)
            .unwrap();
        assert_eq!(recovered, wallet.address());
    }

    #[test]
    fn typed_data_with_matching_key_verifies() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let now = Utc::now();
        let challenge = challenge(SigningScheme::TypedDataV4, now);
        let proof = signed_proof(&wallet, &challenge, now);

        let recovered = SignatureVerifier::default()
            .verify(&proof, &wallet.did(), &challenge, now)
            .unwrap();
        assert_eq!(recovered, wallet.address());
    }

    #[test]
    fn signature_by_other_key_is_rejected() {
        let owner = LocalWallet::from_hex(KEY_A).unwrap();
        let impostor = LocalWallet::from_hex(KEY_B).unwrap();
        let now = Utc::now();

        for scheme in [SigningScheme::PersonalSign, SigningScheme::TypedDataV4] {
            let challenge = challenge(scheme, now);
            let mut proof = signed_proof(&impostor, &challenge, now);
            // Claim the owner's identity with the impostor's signature.
            proof.verification_method = format!("{}#key-1", owner.did());
            assert!(matches!(
                SignatureVerifier::default().verify(&proof, &owner.did(), &challenge, now),
                Err(AuthError::SignatureInvalid)
            ));
        }
    }

    #[test]
    fn scheme_cannot_be_switched_after_issue() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let now = Utc::now();
        let personal = challenge(SigningScheme::PersonalSign, now);
        let proof = signed_proof(&wallet, &personal, now);

        let mut typed = personal.clone();
        typed.scheme = SigningScheme::TypedDataV4;
        assert!(matches!(
            SignatureVerifier::default().verify(&proof, &wallet.did(), &typed, now),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn tampered_created_timestamp_is_rejected() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let now = Utc::now();
        let challenge = challenge(SigningScheme::PersonalSign, now);
        let mut proof = signed_proof(&wallet, &challenge, now);
        proof.created = format_timestamp(now + Duration::milliseconds(1));

        assert!(matches!(
            SignatureVerifier::default().verify(&proof, &wallet.did(), &challenge, now),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn created_outside_window_is_rejected() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let now = Utc::now();
        let challenge = challenge(SigningScheme::PersonalSign, now);
        let verifier = SignatureVerifier::default();

        let stale = signed_proof(&wallet, &challenge, now - Duration::minutes(2));
        assert!(matches!(
            verifier.verify(&stale, &wallet.did(), &challenge, now),
            Err(AuthError::SignatureInvalid)
        ));

        let future = signed_proof(&wallet, &challenge, now + Duration::minutes(2));
        assert!(matches!(
            verifier.verify(&future, &wallet.did(), &challenge, now),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn wrong_proof_type_or_method_is_rejected() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let now = Utc::now();
        let challenge = challenge(SigningScheme::PersonalSign, now);
        let verifier = SignatureVerifier::default();

        let mut proof = signed_proof(&wallet, &challenge, now);
        proof.algorithm = "ed25519".to_string();
        assert!(verifier.verify(&proof, &wallet.did(), &challenge, now).is_err());

        let mut proof = signed_proof(&wallet, &challenge, now);
        proof.algorithm = "ECDSA".to_string();
        assert!(verifier.verify(&proof, &wallet.did(), &challenge, now).is_ok());

        let mut proof = signed_proof(&wallet, &challenge, now);
        proof.verification_method = "did:etho:0000000000000000000000000000000000000000#key-1".into();
        assert!(matches!(
            verifier.verify(&proof, &wallet.did(), &challenge, now),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn malformed_signature_values_fail_closed() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let now = Utc::now();
        let challenge = challenge(SigningScheme::PersonalSign, now);
        let verifier = SignatureVerifier::default();

        let valid = signed_proof(&wallet, &challenge, now);
        let truncated = valid.value[..valid.value.len() - 2].to_string();
        for value in ["", "0x", "not-hex", "0xdeadbeef", truncated.as_str()] {
            let mut proof = valid.clone();
            proof.value = value.to_string();
            assert!(
                matches!(
                    verifier.verify(&proof, &wallet.did(), &challenge, now),
                    Err(AuthError::SignatureInvalid)
                ),
                "expected rejection for {value:?}"
            );
        }

        let mut zeroed = valid.clone();
        zeroed.value = format!("0x{}", "00".repeat(65));
        assert!(verifier.verify(&zeroed, &wallet.did(), &challenge, now).is_err());
    }

    #[test]
    fn detached_verification_requires_matching_did() {
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let other = LocalWallet::from_hex(KEY_B).unwrap();
        let verifier = SignatureVerifier::default();
        let message = CanonicalMessage::new("nonce-1", wallet.did().as_str(), "2026-10-19T12:00:00.000Z");
        let signature = wallet
            .sign_message(&message, SigningScheme::PersonalSign, verifier.domain())
            .unwrap();

        assert!(verifier
            .verify_detached(SigningScheme::PersonalSign, &message, &signature, &wallet.did())
            .is_ok());
        assert!(verifier
            .verify_detached(SigningScheme::PersonalSign, &message, &signature, &other.did())
            .is_err());
    }
}
