// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical login message.
//!
//! The wallet signs exactly one logical message, `{nonce, did, created}`,
//! in one of two encodings:
//!
//! - **personal_sign** (EIP-191): the compact JSON text
//!   `{"nonce":"…","did":"…","created":"…"}` with keys in that order,
//!   identical to the browser's `JSON.stringify({ nonce, did, created })`.
//! - **eth_signTypedData_v4** (EIP-712): the `AuthChallenge` struct under the
//!   configured domain.
//!
//! Both the client helper ([`crate::wallet`]) and the verifier build the
//! message through this module, so the bytes cannot drift apart.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AuthError;

sol! {
    /// EIP-712 payload signed by typed-data wallets.
    struct AuthChallenge {
        string nonce;
        string did;
        string created;
    }
}

/// Primary type name used in the typed-data payload.
pub const TYPED_DATA_PRIMARY_TYPE: &str = "AuthChallenge";

/// Signing capability negotiated when the challenge is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum SigningScheme {
    /// EIP-191 personal message signing.
    #[default]
    #[serde(rename = "personal_sign")]
    PersonalSign,
    /// EIP-712 typed structured data signing.
    #[serde(rename = "eth_signTypedData_v4")]
    TypedDataV4,
}

impl SigningScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningScheme::PersonalSign => "personal_sign",
            SigningScheme::TypedDataV4 => "eth_signTypedData_v4",
        }
    }
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningScheme {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal_sign" => Ok(SigningScheme::PersonalSign),
            "eth_signTypedData_v4" => Ok(SigningScheme::TypedDataV4),
            other => Err(AuthError::invalid_request(format!(
                "Unsupported signing scheme '{other}'"
            ))),
        }
    }
}

/// EIP-712 domain parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
}

impl Default for TypedDataDomain {
    fn default() -> Self {
        Self {
            name: "ONT ID Demo".to_string(),
            version: "1.0".to_string(),
            chain_id: 1,
        }
    }
}

impl TypedDataDomain {
    pub fn to_eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            Some(Address::ZERO),
            None,
        )
    }
}

/// The logical message a wallet signs to answer a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    pub nonce: String,
    pub did: String,
    pub created: String,
}

impl CanonicalMessage {
    pub fn new(
        nonce: impl Into<String>,
        did: impl Into<String>,
        created: impl Into<String>,
    ) -> Self {
        Self {
            nonce: nonce.into(),
            did: did.into(),
            created: created.into(),
        }
    }

    /// Text passed to `personal_sign`.
    pub fn personal_sign_text(&self) -> Result<String, AuthError> {
        serde_json::to_string(self)
            .map_err(|e| AuthError::internal(format!("Failed to serialize login message: {e}")))
    }

    /// EIP-712 signing hash under `domain`.
    pub fn typed_data_hash(&self, domain: &TypedDataDomain) -> B256 {
        let payload = AuthChallenge {
            nonce: self.nonce.clone(),
            did: self.did.clone(),
            created: self.created.clone(),
        };
        payload.eip712_signing_hash(&domain.to_eip712())
    }

    /// Full `eth_signTypedData_v4` request body for wallets that take JSON.
    pub fn typed_data_json(&self, domain: &TypedDataDomain) -> serde_json::Value {
        serde_json::json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" }
                ],
                TYPED_DATA_PRIMARY_TYPE: [
                    { "name": "nonce", "type": "string" },
                    { "name": "did", "type": "string" },
                    { "name": "created", "type": "string" }
                ]
            },
            "domain": {
                "name": domain.name,
                "version": domain.version,
                "chainId": domain.chain_id,
                "verifyingContract": Address::ZERO.to_string()
            },
            "primaryType": TYPED_DATA_PRIMARY_TYPE,
            "message": {
                "nonce": self.nonce,
                "did": self.did,
                "created": self.created
            }
        })
    }
}
