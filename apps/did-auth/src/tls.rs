// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Optional HTTPS termination.
//!
//! When `TLS_CERT_PATH` and `TLS_KEY_PATH` are set the server speaks HTTPS
//! through rustls; otherwise it serves plain HTTP and expects a terminating
//! proxy in front of it.

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsPaths;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Failed to install rustls crypto provider")]
    CryptoProvider,

    #[error("Failed to load TLS credentials from {path}: {source}")]
    Credentials {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Install the ring crypto provider for rustls.
///
/// Must run before any TLS operation; calling it twice is harmless.
pub fn install_crypto_provider() -> Result<(), TlsError> {
    if rustls::crypto::CryptoProvider::get_default().is_some() {
        return Ok(());
    }
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| TlsError::CryptoProvider)
}

/// Build the rustls server configuration from PEM files.
pub async fn load_rustls_config(paths: &TlsPaths) -> Result<RustlsConfig, TlsError> {
    install_crypto_provider()?;
    RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .map_err(|source| TlsError::Credentials {
            path: format!("{} / {}", paths.cert.display(), paths.key.display()),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn provider_install_is_idempotent() {
        install_crypto_provider().unwrap();
        install_crypto_provider().unwrap();
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let paths = TlsPaths {
            cert: PathBuf::from("/nonexistent/cert.pem"),
            key: PathBuf::from("/nonexistent/key.pem"),
        };
        let err = load_rustls_config(&paths).await.unwrap_err();
        assert!(matches!(err, TlsError::Credentials { .. }));
    }
}
