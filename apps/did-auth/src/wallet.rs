// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local wallet for the client side of the login flow.
//!
//! Plays the part of the browser wallet extension: holds a secp256k1 key,
//! derives the DID, builds the canonical message through
//! [`crate::auth::message`] and signs it with either scheme. Used by the
//! `did-login` command-line client and by the tests.

use alloy::primitives::Address;
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use chrono::{DateTime, Utc};
use k256::SecretKey;

use crate::auth::{
    format_timestamp, AuthError, CanonicalMessage, Did, DidMethod, SigningScheme,
    TypedDataDomain, PROOF_TYPE_ECDSA,
};
use crate::models::{AuthResponse, Proof};

/// Fragment of the verification method the client references.
pub const VERIFICATION_METHOD_FRAGMENT: &str = "key-1";

/// Errors raised by the local wallet.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Failed to build login message: {0}")]
    Message(#[from] AuthError),
}

/// A locally held signing key with its DID.
#[derive(Debug, Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    did_method: DidMethod,
}

impl LocalWallet {
    /// Wrap an existing signer; the DID uses the `etho` method.
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            did_method: DidMethod::Etho,
        }
    }

    /// Load from a hex private key (with or without `0x`).
    pub fn from_hex(private_key_hex: &str) -> Result<Self, WalletError> {
        let hex = private_key_hex.trim();
        let key_bytes = alloy::hex::decode(hex.strip_prefix("0x").unwrap_or(hex))
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;

        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::new(signer))
    }

    /// Load from a PEM-encoded secp256k1 key (SEC1 or PKCS#8).
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, WalletError> {
        let pem_str = std::str::from_utf8(pem_bytes)
            .map_err(|e| WalletError::InvalidPrivateKey(format!("Invalid UTF-8: {e}")))?;

        let pem = pem::parse(pem_str)
            .map_err(|e| WalletError::InvalidPrivateKey(format!("Invalid PEM: {e}")))?;

        let secret_key = SecretKey::from_sec1_der(pem.contents())
            .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
            .map_err(|e| WalletError::InvalidPrivateKey(format!("Invalid key format: {e}")))?;

        let signer = PrivateKeySigner::from_slice(&secret_key.to_bytes())
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::new(signer))
    }

    /// Use a different DID method for the derived identity.
    pub fn with_did_method(mut self, method: DidMethod) -> Self {
        self.did_method = method;
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn did(&self) -> Did {
        Did::from_address(self.did_method, self.address())
    }

    /// Sign `message` and return the hex (`0x`-prefixed) signature.
    pub fn sign_message(
        &self,
        message: &CanonicalMessage,
        scheme: SigningScheme,
        domain: &TypedDataDomain,
    ) -> Result<String, WalletError> {
        let signature = match scheme {
            SigningScheme::PersonalSign => {
                let text = message.personal_sign_text()?;
                self.signer.sign_message_sync(text.as_bytes())
            }
            SigningScheme::TypedDataV4 => {
                let hash = message.typed_data_hash(domain);
                self.signer.sign_hash_sync(&hash)
            }
        }
        .map_err(|e| WalletError::Signing(e.to_string()))?;

        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }

    /// Build the complete response to a challenge, signed at `created`.
    pub fn answer_challenge(
        &self,
        nonce: &str,
        scheme: SigningScheme,
        created: DateTime<Utc>,
        domain: &TypedDataDomain,
        challenge_token: Option<String>,
    ) -> Result<AuthResponse, WalletError> {
        let did = self.did();
        let created = format_timestamp(created);
        let message = CanonicalMessage::new(nonce, did.as_str(), created.as_str());
        let signature = self.sign_message(&message, scheme, domain)?;

        Ok(AuthResponse {
            ver: Some("1.0".to_string()),
            kind: Some("ClientResponse".to_string()),
            nonce: Some(nonce.to_string()),
            did: Some(did.to_string()),
            proof: Some(Proof {
                kind: Some(PROOF_TYPE_ECDSA.to_string()),
                verification_method: Some(format!("{did}#{VERIFICATION_METHOD_FRAGMENT}")),
                created: Some(created),
                value: Some(signature),
            }),
            vps: Vec::new(),
            challenge_token,
        })
    }
}

/// Parse PKCS#8 DER to extract the secret key.
fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::pkcs8::{EncodePrivateKey, LineEnding};

    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn from_hex_accepts_prefixed_and_bare_keys() {
        let a = LocalWallet::from_hex(TEST_KEY).unwrap();
        let b = LocalWallet::from_hex(&TEST_KEY[2..]).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            LocalWallet::from_hex("xyz"),
            Err(WalletError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            LocalWallet::from_hex("00"),
            Err(WalletError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn from_pem_matches_hex_key() {
        let key_bytes = alloy::hex::decode(&TEST_KEY[2..]).unwrap();
        let secret = SecretKey::from_slice(&key_bytes).unwrap();
        let pem = secret.to_pkcs8_pem(LineEnding::LF).unwrap();

        let from_pem = LocalWallet::from_pem(pem.as_bytes()).unwrap();
        let from_hex = LocalWallet::from_hex(TEST_KEY).unwrap();
        assert_eq!(from_pem.address(), from_hex.address());
    }

    #[test]
    fn from_pem_rejects_non_pem() {
        assert!(LocalWallet::from_pem(b"not a pem").is_err());
    }

    #[test]
    fn did_embeds_address() {
        let wallet = LocalWallet::from_hex(TEST_KEY).unwrap();
        let did = wallet.did();
        assert!(did.as_str().starts_with("did:etho:"));
        assert_eq!(did.address(), wallet.address());

        let ethr = wallet.clone().with_did_method(DidMethod::Ethr).did();
        assert!(ethr.as_str().starts_with("did:ethr:0x"));
    }

    #[test]
    fn answer_uses_same_timestamp_in_message_and_proof() {
        let wallet = LocalWallet::from_hex(TEST_KEY).unwrap();
        let created = Utc::now();
        let response = wallet
            .answer_challenge(
                "nonce-1",
                SigningScheme::PersonalSign,
                created,
                &TypedDataDomain::default(),
                Some("token".to_string()),
            )
            .unwrap();

        let proof = response.proof.unwrap();
        assert_eq!(proof.created.unwrap(), format_timestamp(created));
        assert_eq!(
            proof.verification_method.unwrap(),
            format!("{}#key-1", wallet.did())
        );
        let value = proof.value.unwrap();
        assert!(value.starts_with("0x"));
        assert_eq!(value.len(), 2 + 130);
        assert_eq!(response.challenge_token.as_deref(), Some("token"));
    }
}
