// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use relational_did_auth::{
    api::router,
    clock::SystemClock,
    config::AuthConfig,
    state::AppState,
    sweeper::{join_sweeper, ChallengeSweeper},
    telemetry::{self, LogFormat},
    tls::load_rustls_config,
};
use tokio_util::sync::CancellationToken;

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    telemetry::init(LogFormat::from_env());

    let config = AuthConfig::from_env().expect("Invalid configuration");
    tracing::info!(config = ?config, "Loaded configuration");

    let state = AppState::from_config(config.clone(), Arc::new(SystemClock))
        .expect("Failed to initialize auth state");

    let shutdown = CancellationToken::new();
    let sweeper = ChallengeSweeper::new(
        state.store.clone(),
        state.clock.clone(),
        config.sweep_interval,
    );
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
            }
            shutdown.cancel();
        }
    });

    let app = router(state);
    let addr = config.bind_addr;

    match &config.tls {
        Some(paths) => {
            let tls_config = load_rustls_config(paths)
                .await
                .expect("Failed to load TLS credentials");

            let handle = axum_server::Handle::new();
            tokio::spawn({
                let handle = handle.clone();
                let shutdown = shutdown.clone();
                async move {
                    shutdown.cancelled().await;
                    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
                }
            });

            tracing::info!(%addr, "DID auth server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .expect("Failed to bind");
            tracing::info!(%addr, "DID auth server listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .await
                .expect("HTTP server failed");
        }
    }

    shutdown.cancel();
    join_sweeper(sweeper_task).await;
    tracing::info!("Server stopped");
}
