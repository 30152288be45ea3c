// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Challenge Sweeper
//!
//! Background task that periodically drops expired challenges (or, in token
//! mode, consumed nonces whose tokens have expired) from the challenge store.
//!
//! Expired challenges are already rejected on lookup, so the sweep only
//! bounds memory; correctness never depends on it running.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::storage::ChallengeStore;

/// Periodic expiry sweep over a challenge store.
pub struct ChallengeSweeper {
    store: Arc<dyn ChallengeStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ChallengeSweeper {
    pub fn new(store: Arc<dyn ChallengeStore>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            mode = %self.store.mode(),
            "Challenge sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Challenge sweeper shutting down");
                    return;
                }
            }

            self.sweep_step();
        }
    }

    /// Execute one sweep; returns the number of removed entries.
    pub fn sweep_step(&self) -> usize {
        let removed = self.store.sweep(self.clock.now());
        if removed > 0 {
            debug!(
                removed,
                outstanding = self.store.outstanding(),
                "Swept expired challenges"
            );
        }
        removed
    }
}

/// Wait for a spawned sweeper task to finish.
///
/// Returns `false` (after logging) if the task panicked or was aborted.
pub async fn join_sweeper(task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Challenge sweeper task failed");
            false
        }
    }
}
