// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command-line wallet login.
//!
//! Performs the challenge-response login against a running server with a
//! local secp256k1 key and prints the session token.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgGroup, Parser};
use relational_did_auth::{
    auth::{DidMethod, SigningScheme, TypedDataDomain},
    client::LoginClient,
    config::{EIP712_CHAIN_ID_ENV, EIP712_DOMAIN_NAME_ENV, EIP712_DOMAIN_VERSION_ENV},
    models::AuthRequest,
    wallet::LocalWallet,
};

#[derive(Debug, Parser)]
#[command(
    name = "did-login",
    version,
    about = "Log in to a DID auth server with a local wallet key",
    after_help = "Example:\n  did-login --key 0x4c08...2318 --scheme eth_signTypedData_v4"
)]
#[command(group(ArgGroup::new("wallet_key").required(true).args(["key", "key_file"])))]
struct Args {
    /// Server base URL
    #[arg(long, env = "DID_AUTH_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Hex-encoded secp256k1 private key
    #[arg(long, env = "DID_LOGIN_KEY", hide_env_values = true)]
    key: Option<String>,

    /// PKCS#8 or SEC1 PEM private key file
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Signing scheme: personal_sign or eth_signTypedData_v4
    #[arg(long, default_value = "personal_sign", value_parser = SigningScheme::from_str)]
    scheme: SigningScheme,

    /// Application identity sent with the challenge request
    #[arg(long, default_value = "did-login")]
    app: String,

    /// DID method: etho or ethr
    #[arg(long, default_value = "etho", value_parser = DidMethod::from_str)]
    did_method: DidMethod,

    /// EIP-712 domain name; must match the server's
    #[arg(long, env = EIP712_DOMAIN_NAME_ENV, default_value = "ONT ID Demo")]
    domain_name: String,

    /// EIP-712 domain version; must match the server's
    #[arg(long, env = EIP712_DOMAIN_VERSION_ENV, default_value = "1.0")]
    domain_version: String,

    /// EIP-712 chain id; must match the server's
    #[arg(long, env = EIP712_CHAIN_ID_ENV, default_value_t = 1)]
    chain_id: u64,
}

impl Args {
    fn typed_data_domain(&self) -> TypedDataDomain {
        TypedDataDomain {
            name: self.domain_name.clone(),
            version: self.domain_version.clone(),
            chain_id: self.chain_id,
        }
    }

    fn load_wallet(&self) -> Result<LocalWallet, String> {
        let wallet = match (&self.key, &self.key_file) {
            (Some(hex), _) => LocalWallet::from_hex(hex),
            (None, Some(path)) => {
                let pem = std::fs::read(path)
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                LocalWallet::from_pem(&pem)
            }
            (None, None) => return Err("no key given".to_string()),
        }
        .map_err(|e| e.to_string())?;
        Ok(wallet.with_did_method(self.did_method))
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let wallet = match args.load_wallet() {
        Ok(wallet) => wallet,
        Err(e) => {
            eprintln!("Error loading key: {e}");
            std::process::exit(1);
        }
    };

    let client = match LoginClient::new(args.server.clone(), args.typed_data_domain()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("Logging in as {} ({})", wallet.did(), args.scheme);
    let request = AuthRequest {
        kind: Some("AuthRequest".to_string()),
        chain: Some("eth".to_string()),
        app: Some(args.app.clone()),
        ..Default::default()
    };

    match client.login(&wallet, request, args.scheme).await {
        Ok(session) => {
            eprintln!("{} (address {})", session.message, session.address);
            println!("{}", session.token);
        }
        Err(e) => {
            eprintln!("Login failed: {e}");
            std::process::exit(1);
        }
    }
}
