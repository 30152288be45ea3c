// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational DID Auth - Wallet Challenge-Response Login Service
//!
//! This crate lets a client prove control of a decentralized identifier
//! (DID) backed by a secp256k1 wallet key, and exchanges that proof for an
//! opaque session token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Challenges, signature verification and session issuance
//! - `storage` - Challenge stores (in-memory or signed tokens)
//! - `sweeper` - Background expiry of stale challenges
//! - `wallet` - Client-side signer used by `did-login` and the tests
//! - `client` - HTTP client driving the login flow

pub mod api;
pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod models;
pub mod state;
pub mod storage;
pub mod sweeper;
pub mod telemetry;
pub mod tls;
pub mod wallet;
