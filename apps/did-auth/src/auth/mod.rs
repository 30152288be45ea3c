// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Challenge-response login for wallet-held decentralized identifiers.
//!
//! ## Auth Flow
//!
//! 1. Client calls `POST /challenge` with an auth request
//! 2. Server issues a single-use nonce with a short TTL
//! 3. Wallet signs `{"nonce", "did", "created"}` with its key
//! 4. Client calls `POST /submit` with the DID and the proof
//! 5. Server:
//!    - Consumes the nonce (at most once, never after expiry)
//!    - Recovers the signer and checks it against the DID
//!    - Issues an opaque session token
//!
//! ## Security
//!
//! - Nonces carry 128 bits of OS randomness
//! - Session tokens carry 256 bits of OS randomness
//! - A failed verification burns the challenge
//! - Clock skew tolerance is 60 seconds

pub mod challenge;
pub mod did;
pub mod error;
pub mod message;
pub(crate) mod random;
pub mod session;
pub mod submit;
pub mod verifier;

pub use challenge::{
    format_timestamp, Challenge, ChallengeIssuer, IssuedChallenge, DEFAULT_CHALLENGE_TTL,
};
pub use did::{Did, DidMethod};
pub use error::{AuthError, CHALLENGE_INVALID_MESSAGE};
pub use message::{CanonicalMessage, SigningScheme, TypedDataDomain};
pub use session::{SessionCredential, SessionIssuer, AUTH_SUCCESS_MESSAGE};
pub use submit::SubmissionHandler;
pub use verifier::{SignatureVerifier, SignedProof, CLOCK_SKEW_LEEWAY, PROOF_TYPE_ECDSA};
