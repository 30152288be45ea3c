// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decentralized identifiers bound to EVM accounts.
//!
//! Two DID methods are accepted, both of which embed a 20-byte account
//! address that the signature must recover to:
//!
//! - `did:etho:<40 hex>` - the browser client's format (address without `0x`)
//! - `did:ethr:0x<40 hex>` (the `0x` is optional)
//!
//! The DID string is kept verbatim, because it is part of the signed
//! message and must be reproduced byte for byte.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AuthError;

/// Supported DID methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DidMethod {
    Etho,
    Ethr,
}

impl DidMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DidMethod::Etho => "etho",
            DidMethod::Ethr => "ethr",
        }
    }
}

impl FromStr for DidMethod {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "etho" => Ok(DidMethod::Etho),
            "ethr" => Ok(DidMethod::Ethr),
            other => Err(AuthError::invalid_request(format!(
                "Unsupported DID method '{other}'"
            ))),
        }
    }
}

/// A parsed decentralized identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Did {
    raw: String,
    method: DidMethod,
    address: Address,
}

impl Did {
    /// Parse a DID string.
    pub fn parse(input: &str) -> Result<Self, AuthError> {
        let rest = input
            .strip_prefix("did:")
            .ok_or_else(|| AuthError::invalid_request("DID must start with 'did:'"))?;

        let (method, specific_id) = rest
            .split_once(':')
            .ok_or_else(|| AuthError::invalid_request("DID is missing its method-specific id"))?;

        let method: DidMethod = method.parse()?;

        let address = parse_address(specific_id)?;

        Ok(Self {
            raw: input.to_string(),
            method,
            address,
        })
    }

    /// Build the DID the browser client derives from an account.
    pub fn from_address(method: DidMethod, address: Address) -> Self {
        let hex = alloy::hex::encode(address.as_slice());
        let raw = match method {
            DidMethod::Etho => format!("did:etho:{hex}"),
            DidMethod::Ethr => format!("did:ethr:0x{hex}"),
        };
        Self {
            raw,
            method,
            address,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn method(&self) -> DidMethod {
        self.method
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether `reference` is a verification method of this DID
    /// (`<did>#<fragment>` with a non-empty fragment).
    pub fn owns_verification_method(&self, reference: &str) -> bool {
        reference
            .strip_prefix(self.raw.as_str())
            .and_then(|rest| rest.strip_prefix('#'))
            .is_some_and(|fragment| !fragment.is_empty())
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_address(specific_id: &str) -> Result<Address, AuthError> {
    let hex = specific_id.strip_prefix("0x").unwrap_or(specific_id);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AuthError::invalid_request(
            "DID must embed a 20-byte hex account address",
        ));
    }

    let bytes = alloy::hex::decode(hex)
        .map_err(|e| AuthError::invalid_request(format!("Invalid DID address: {e}")))?;
    Ok(Address::from_slice(&bytes))
}
