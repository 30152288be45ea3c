// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication response handling.
//!
//! ## Flow
//!
//! 1. Validate the response structurally (before touching the store)
//! 2. Claim the nonce: compare-and-consume in the challenge store
//! 3. Verify the signature against the claimed challenge
//! 4. Issue the session credential
//!
//! ## Failed Verification Policy
//!
//! The nonce is consumed by the claim in step 2, before the signature is
//! checked. A failed verification therefore burns the challenge and the
//! client must request a new one. This also makes step 2 the only
//! synchronization point: of any number of concurrent submissions for the
//! same nonce, exactly one reaches verification.

use std::sync::Arc;

use super::verifier::SignedProof;
use super::{AuthError, Did, SessionCredential, SessionIssuer, SignatureVerifier};
use crate::clock::Clock;
use crate::models::{AuthResponse, Proof};
use crate::storage::ChallengeStore;

/// Auth response after structural validation.
#[derive(Debug, Clone)]
struct ValidatedResponse {
    nonce: String,
    did: Did,
    proof: SignedProof,
    challenge_token: Option<String>,
}

impl TryFrom<AuthResponse> for ValidatedResponse {
    type Error = AuthError;

    fn try_from(response: AuthResponse) -> Result<Self, Self::Error> {
        let nonce = required(response.nonce, "nonce")?;
        let did = Did::parse(&required(response.did, "did")?)?;
        let Proof {
            kind,
            verification_method,
            created,
            value,
        } = response
            .proof
            .ok_or_else(|| AuthError::invalid_request("Missing proof"))?;

        Ok(Self {
            nonce,
            did,
            proof: SignedProof {
                algorithm: required(kind, "proof.type")?,
                verification_method: required(verification_method, "proof.verificationMethod")?,
                created: required(created, "proof.created")?,
                value: required(value, "proof.value")?,
            },
            challenge_token: response.challenge_token,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AuthError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AuthError::invalid_request(format!("Missing {field}")))
}

/// Orchestrates claim, verification and credential issuance.
pub struct SubmissionHandler {
    store: Arc<dyn ChallengeStore>,
    verifier: Arc<SignatureVerifier>,
    sessions: Arc<SessionIssuer>,
    clock: Arc<dyn Clock>,
}

impl SubmissionHandler {
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        verifier: Arc<SignatureVerifier>,
        sessions: Arc<SessionIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            verifier,
            sessions,
            clock,
        }
    }

    /// Process an authentication response.
    pub fn submit(&self, response: AuthResponse) -> Result<SessionCredential, AuthError> {
        let response = ValidatedResponse::try_from(response)?;
        let now = self.clock.now();

        let challenge = self
            .store
            .claim(&response.nonce, response.challenge_token.as_deref(), now)
            .inspect_err(|e| {
                tracing::warn!(
                    action = "auth_failure",
                    reason = e.error_code(),
                    did = %response.did,
                    "Challenge claim rejected"
                );
            })?;

        let address = self
            .verifier
            .verify(&response.proof, &response.did, &challenge, now)
            .inspect_err(|e| {
                tracing::warn!(
                    action = "auth_failure",
                    reason = e.error_code(),
                    did = %response.did,
                    nonce = %challenge.nonce,
                    scheme = %challenge.scheme,
                    "Signature verification failed, challenge burned"
                );
            })?;

        let credential = self.sessions.issue(&response.did)?;

        tracing::info!(
            action = "auth_success",
            did = %response.did,
            address = %address,
            app = %challenge.app,
            scheme = %challenge.scheme,
            "Wallet authenticated"
        );

        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ChallengeIssuer, SigningScheme, TypedDataDomain, DEFAULT_CHALLENGE_TTL};
    use crate::clock::ManualClock;
    use crate::models::AuthRequest;
    use crate::storage::{InMemoryChallengeStore, SignedChallengeStore};
    use crate::wallet::LocalWallet;
    use chrono::Duration;

    const KEY_A: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const KEY_B: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    struct Harness {
        issuer: ChallengeIssuer,
        handler: Arc<SubmissionHandler>,
        clock: Arc<ManualClock>,
    }

    fn harness_with(store: Arc<dyn ChallengeStore>) -> Harness {
        let clock = Arc::new(ManualClock::default());
        let issuer = ChallengeIssuer::new(store.clone(), clock.clone(), DEFAULT_CHALLENGE_TTL);
        let handler = Arc::new(SubmissionHandler::new(
            store,
            Arc::new(SignatureVerifier::default()),
            Arc::new(SessionIssuer::new()),
            clock.clone(),
        ));
        Harness {
            issuer,
            handler,
            clock,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(InMemoryChallengeStore::default()))
    }

    fn auth_request(scheme: SigningScheme) -> AuthRequest {
        AuthRequest {
            app: Some("ONT ID Demo App".to_string()),
            signing_scheme: Some(scheme),
            ..Default::default()
        }
    }

    fn login_response(h: &Harness, wallet: &LocalWallet, scheme: SigningScheme) -> AuthResponse {
        let issued = h.issuer.issue(&auth_request(scheme)).unwrap();
        wallet
            .answer_challenge(
                &issued.challenge.nonce,
                scheme,
                h.clock.now(),
                &TypedDataDomain::default(),
                issued.challenge_token,
            )
            .unwrap()
    }

    #[test]
    fn valid_signature_yields_credential() {
        let h = harness();
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();

        for scheme in [SigningScheme::PersonalSign, SigningScheme::TypedDataV4] {
            let credential = h
                .handler
                .submit(login_response(&h, &wallet, scheme))
                .unwrap();
            assert_eq!(credential.address, wallet.address());
            assert_eq!(credential.did, wallet.did().as_str());
        }
    }

    #[test]
    fn replay_after_success_is_challenge_invalid() {
        let h = harness();
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let response = login_response(&h, &wallet, SigningScheme::PersonalSign);

        h.handler.submit(response.clone()).unwrap();
        assert!(matches!(
            h.handler.submit(response),
            Err(AuthError::ChallengeInvalid)
        ));
    }

    #[test]
    fn expired_challenge_is_invalid_even_with_valid_signature() {
        let h = harness();
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let response = login_response(&h, &wallet, SigningScheme::PersonalSign);

        h.clock.advance(Duration::minutes(6));
        assert!(matches!(
            h.handler.submit(response),
            Err(AuthError::ChallengeInvalid)
        ));
    }

    #[test]
    fn other_key_is_signature_invalid_and_burns_nonce() {
        let h = harness();
        let owner = LocalWallet::from_hex(KEY_A).unwrap();
        let impostor = LocalWallet::from_hex(KEY_B).unwrap();

        let issued = h
            .issuer
            .issue(&auth_request(SigningScheme::PersonalSign))
            .unwrap();
        let nonce = issued.challenge.nonce.clone();

        let mut forged = impostor
            .answer_challenge(
                &nonce,
                SigningScheme::PersonalSign,
                h.clock.now(),
                &TypedDataDomain::default(),
                None,
            )
            .unwrap();
        forged.did = Some(owner.did().to_string());
        if let Some(proof) = forged.proof.as_mut() {
            proof.verification_method = Some(format!("{}#key-1", owner.did()));
        }
        assert!(matches!(
            h.handler.submit(forged),
            Err(AuthError::SignatureInvalid)
        ));

        // The legitimate owner cannot reuse the burned nonce.
        let genuine = owner
            .answer_challenge(
                &nonce,
                SigningScheme::PersonalSign,
                h.clock.now(),
                &TypedDataDomain::default(),
                None,
            )
            .unwrap();
        assert!(matches!(
            h.handler.submit(genuine),
            Err(AuthError::ChallengeInvalid)
        ));
    }

    #[test]
    fn empty_proof_value_never_succeeds() {
        let h = harness();
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let mut response = login_response(&h, &wallet, SigningScheme::PersonalSign);
        if let Some(proof) = response.proof.as_mut() {
            proof.value = Some(String::new());
        }

        assert!(matches!(
            h.handler.submit(response),
            Err(AuthError::InvalidRequest(_))
        ));
    }

    #[test]
    fn structural_errors_do_not_touch_the_store() {
        let h = harness();
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let response = login_response(&h, &wallet, SigningScheme::PersonalSign);

        let mut missing_proof = response.clone();
        missing_proof.proof = None;
        assert!(matches!(
            h.handler.submit(missing_proof),
            Err(AuthError::InvalidRequest(_))
        ));

        let mut missing_nonce = response.clone();
        missing_nonce.nonce = None;
        assert!(matches!(
            h.handler.submit(missing_nonce),
            Err(AuthError::InvalidRequest(_))
        ));

        let mut bad_did = response.clone();
        bad_did.did = Some("did:ont:AGWb2J3bc7Bv5ZQn5Wp7dcPXn2dtyKnuzd".to_string());
        assert!(matches!(
            h.handler.submit(bad_did),
            Err(AuthError::InvalidRequest(_))
        ));

        // The challenge is still claimable after the rejected attempts.
        assert!(h.handler.submit(response).is_ok());
    }

    #[test]
    fn unknown_nonce_is_challenge_invalid() {
        let h = harness();
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let response = wallet
            .answer_challenge(
                "1700000000000-ffffffffffffffffffffffffffffffff",
                SigningScheme::PersonalSign,
                h.clock.now(),
                &TypedDataDomain::default(),
                None,
            )
            .unwrap();
        assert!(matches!(
            h.handler.submit(response),
            Err(AuthError::ChallengeInvalid)
        ));
    }

    #[test]
    fn concurrent_submissions_have_one_winner() {
        let h = harness();
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let response = login_response(&h, &wallet, SigningScheme::TypedDataV4);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let handler = h.handler.clone();
                let response = response.clone();
                std::thread::spawn(move || handler.submit(response))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AuthError::ChallengeInvalid)));
    }

    #[test]
    fn token_mode_flow_and_replay() {
        let h = harness_with(Arc::new(SignedChallengeStore::new(
            b"unit-test-secret-unit-test-secret",
        )));
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let response = login_response(&h, &wallet, SigningScheme::PersonalSign);
        assert!(response.challenge_token.is_some());

        h.handler.submit(response.clone()).unwrap();
        assert!(matches!(
            h.handler.submit(response),
            Err(AuthError::ChallengeInvalid)
        ));
    }

    #[test]
    fn token_mode_expiry_uses_injected_clock() {
        let h = harness_with(Arc::new(SignedChallengeStore::new(
            b"unit-test-secret-unit-test-secret",
        )));
        let wallet = LocalWallet::from_hex(KEY_A).unwrap();
        let response = login_response(&h, &wallet, SigningScheme::TypedDataV4);

        h.clock.advance(Duration::minutes(6));
        assert!(matches!(
            h.handler.submit(response),
            Err(AuthError::ChallengeInvalid)
        ));
    }
}
