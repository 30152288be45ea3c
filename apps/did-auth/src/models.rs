// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the login endpoints. Field names follow the
//! browser client's JSON (camelCase, `type`, `VPs`), so every struct carries
//! explicit serde renames. All types derive `ToSchema` for the OpenAPI
//! document.
//!
//! Fields the handlers must validate themselves are `Option`s: a missing
//! field is reported as `invalid_request` with a specific message instead of
//! a generic deserialization failure.
//!
//! ## Model Categories
//!
//! - **Challenge**: `AuthRequest` in, nonce out
//! - **Submission**: `AuthResponse` with its `Proof` in, session token out
//! - **Detached verification**: signature check without consuming state

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{CanonicalMessage, SigningScheme};

// =============================================================================
// Challenge Models
// =============================================================================

/// Client authentication request that contextualizes a challenge.
///
/// Nothing in here is trusted; it is only echoed into logs and bound into
/// the challenge (application identity and signing scheme).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// Message type, `AuthRequest` for the browser client.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Intended chain (for example `eth`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    /// Application identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Free-form client challenge label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// Host name of the requesting page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Client-generated request id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Where the client expects the result; must be an absolute http(s) URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Signing capability the wallet will use (defaults to `personal_sign`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_scheme: Option<SigningScheme>,
}

/// Body of `POST /challenge`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[serde(default)]
    pub auth_request: Option<AuthRequest>,
}

/// A freshly issued challenge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    /// Single-use nonce to embed in the signed message.
    pub nonce: String,
    /// Issue time (RFC 3339, millisecond precision).
    pub created: String,
    /// Expiry time (RFC 3339, millisecond precision).
    pub expires: String,
    /// Scheme the wallet must sign with.
    pub signing_scheme: SigningScheme,
    /// Signed challenge token (stateless mode only); send it back on submit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_token: Option<String>,
}

// =============================================================================
// Submission Models
// =============================================================================

/// Signature proof attached to an authentication response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Signature algorithm, `ecdsa`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Verification method reference, `<did>#key-1`.
    #[serde(default)]
    pub verification_method: Option<String>,
    /// Timestamp that was embedded in the signed message (RFC 3339).
    #[serde(default)]
    pub created: Option<String>,
    /// Hex-encoded 65-byte `r || s || v` signature.
    #[serde(default)]
    pub value: Option<String>,
}

/// Body of `POST /submit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    /// Message type, `ClientResponse` for the browser client.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    /// DID of the claimed signer.
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub proof: Option<Proof>,
    /// Verifiable presentations (accepted, not evaluated).
    #[serde(rename = "VPs", default)]
    #[schema(value_type = Vec<Object>)]
    pub vps: Vec<serde_json::Value>,
    /// Challenge token returned by `POST /challenge` in stateless mode.
    #[serde(default, alias = "challengeJwt", skip_serializing_if = "Option::is_none")]
    pub challenge_token: Option<String>,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    /// Opaque session token.
    pub token: String,
    pub message: String,
    /// Authenticated DID.
    pub did: String,
    /// Recovered account address (EIP-55 checksummed).
    pub address: String,
}

// =============================================================================
// Detached Verification Models
// =============================================================================

/// Body of `POST /verify`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub did: String,
    /// The signed `{nonce, did, created}` message.
    #[schema(value_type = Object)]
    pub message: CanonicalMessage,
    /// Hex-encoded signature.
    pub signature: String,
    #[serde(default)]
    pub scheme: Option<SigningScheme>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub success: bool,
}
