// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AuthConfig`] loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CHALLENGE_TTL_SECS` | Lifetime of an issued challenge | `300` |
//! | `CHALLENGE_MODE` | `memory` (server-side store) or `token` (signed JWT) | `memory` |
//! | `JWT_SECRET` | HMAC secret for challenge tokens | Random per process |
//! | `MAX_OUTSTANDING_CHALLENGES` | Capacity of the in-memory store | `10000` |
//! | `CHALLENGE_SWEEP_INTERVAL_SECS` | Interval between expiry sweeps | `60` |
//! | `EIP712_DOMAIN_NAME` | EIP-712 domain name | `ONT ID Demo` |
//! | `EIP712_DOMAIN_VERSION` | EIP-712 domain version | `1.0` |
//! | `EIP712_CHAIN_ID` | EIP-712 domain chain id | `1` |
//! | `TLS_CERT_PATH` | PEM certificate chain (enables HTTPS) | Optional |
//! | `TLS_KEY_PATH` | PEM private key (enables HTTPS) | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

use crate::auth::TypedDataDomain;
use crate::storage::ChallengeMode;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Lifetime of a challenge in seconds.
pub const CHALLENGE_TTL_SECS_ENV: &str = "CHALLENGE_TTL_SECS";

/// Selects the challenge store.
///
/// `memory` keeps outstanding challenges in the process. `token` hands the
/// client a signed challenge token and only remembers consumed nonces, which
/// suits deployments without sticky sessions.
pub const CHALLENGE_MODE_ENV: &str = "CHALLENGE_MODE";

/// HMAC secret for challenge tokens.
///
/// Only used in `token` mode. When unset a random secret is generated at
/// startup, so tokens do not survive a restart and are not shared between
/// replicas.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

pub const MAX_OUTSTANDING_CHALLENGES_ENV: &str = "MAX_OUTSTANDING_CHALLENGES";
pub const CHALLENGE_SWEEP_INTERVAL_SECS_ENV: &str = "CHALLENGE_SWEEP_INTERVAL_SECS";
pub const EIP712_DOMAIN_NAME_ENV: &str = "EIP712_DOMAIN_NAME";
pub const EIP712_DOMAIN_VERSION_ENV: &str = "EIP712_DOMAIN_VERSION";
pub const EIP712_CHAIN_ID_ENV: &str = "EIP712_CHAIN_ID";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// `json` for structured logs, anything else for human-readable output.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: IpAddr = IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CHALLENGE_TTL_SECS: i64 = 300;
const DEFAULT_MAX_OUTSTANDING_CHALLENGES: usize = 10_000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Minimum accepted `JWT_SECRET` length in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Service configuration.
#[derive(Clone)]
pub struct AuthConfig {
    pub bind_addr: SocketAddr,
    pub challenge_ttl: Duration,
    pub challenge_mode: ChallengeMode,
    pub jwt_secret: Option<String>,
    pub max_outstanding_challenges: usize,
    pub sweep_interval: std::time::Duration,
    pub typed_data_domain: TypedDataDomain,
    pub tls: Option<TlsPaths>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bind_addr", &self.bind_addr)
            .field("challenge_ttl_secs", &self.challenge_ttl.num_seconds())
            .field("challenge_mode", &self.challenge_mode)
            .field(
                "jwt_secret",
                &self.jwt_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("max_outstanding_challenges", &self.max_outstanding_challenges)
            .field("sweep_interval", &self.sweep_interval)
            .field("typed_data_domain", &self.typed_data_domain)
            .field("tls", &self.tls)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(DEFAULT_HOST, DEFAULT_PORT),
            challenge_ttl: Duration::seconds(DEFAULT_CHALLENGE_TTL_SECS),
            challenge_mode: ChallengeMode::default(),
            jwt_secret: None,
            max_outstanding_challenges: DEFAULT_MAX_OUTSTANDING_CHALLENGES,
            sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            typed_data_domain: TypedDataDomain::default(),
            tls: None,
        }
    }
}

impl AuthConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host: IpAddr = parse_or(&var, HOST_ENV, DEFAULT_HOST)?;
        let port: u16 = parse_or(&var, PORT_ENV, DEFAULT_PORT)?;

        let ttl_secs: i64 = parse_or(&var, CHALLENGE_TTL_SECS_ENV, DEFAULT_CHALLENGE_TTL_SECS)?;
        if ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                CHALLENGE_TTL_SECS_ENV,
                "must be positive".to_string(),
            ));
        }

        let challenge_mode = match var(CHALLENGE_MODE_ENV) {
            Some(raw) => raw
                .parse::<ChallengeMode>()
                .map_err(|e| ConfigError::InvalidValue(CHALLENGE_MODE_ENV, e))?,
            None => defaults.challenge_mode,
        };

        let jwt_secret = var(JWT_SECRET_ENV);
        if let Some(secret) = &jwt_secret {
            if secret.len() < MIN_JWT_SECRET_LEN {
                return Err(ConfigError::InvalidValue(
                    JWT_SECRET_ENV,
                    format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
                ));
            }
        }

        let max_outstanding_challenges: usize = parse_or(
            &var,
            MAX_OUTSTANDING_CHALLENGES_ENV,
            DEFAULT_MAX_OUTSTANDING_CHALLENGES,
        )?;
        if max_outstanding_challenges == 0 {
            return Err(ConfigError::InvalidValue(
                MAX_OUTSTANDING_CHALLENGES_ENV,
                "must be at least 1".to_string(),
            ));
        }

        let sweep_secs: u64 = parse_or(
            &var,
            CHALLENGE_SWEEP_INTERVAL_SECS_ENV,
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidValue(
                CHALLENGE_SWEEP_INTERVAL_SECS_ENV,
                "must be at least 1".to_string(),
            ));
        }

        let typed_data_domain = TypedDataDomain {
            name: var(EIP712_DOMAIN_NAME_ENV).unwrap_or(defaults.typed_data_domain.name),
            version: var(EIP712_DOMAIN_VERSION_ENV).unwrap_or(defaults.typed_data_domain.version),
            chain_id: parse_or(
                &var,
                EIP712_CHAIN_ID_ENV,
                defaults.typed_data_domain.chain_id,
            )?,
        };

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete(TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV)),
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            challenge_ttl: Duration::seconds(ttl_secs),
            challenge_mode,
            jwt_secret,
            max_outstanding_challenges,
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            typed_data_domain,
            tls,
        })
    }
}

fn parse_or<T, V>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key, e.to_string())),
        None => Ok(default),
    }
}
