//! Mint submitter - one-shot contract `mint()` transaction
//!
//! Loads the run configuration, signs a legacy EIP-155 transaction calling
//! `mint()` on the configured contract, broadcasts it and waits for the receipt.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

mod abi;
mod chain;
mod config;
mod error;
mod tx;
mod wallet;

use abi::ContractAbi;
use chain::ChainProvider;
use config::Settings;
use tx::{ConfirmationWatcher, GasEstimator, MintRequest, TransactionSender};
use wallet::SigningIdentity;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting mint submitter v{}", env!("CARGO_PKG_VERSION"));

    run().await
}

async fn run() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Derive signing identity
    let identity = SigningIdentity::from_private_key(&settings.wallet_private_key)
        .context("Failed to load wallet")?;
    info!("Address: {}", identity.checksum_address());

    // Connect to the node
    let provider = Arc::new(ChainProvider::new(&settings.infura_api_url)?);
    info!("Using RPC endpoint {}", provider.endpoint());

    let abi = ContractAbi::parse(&settings.abi)?;
    let request = MintRequest::from_settings(&settings)?;

    let sender = TransactionSender::new(
        provider.clone(),
        identity,
        GasEstimator::new(settings.max_gas_price_gwei),
    );
    let signed = sender
        .submit(&request, &abi)
        .await
        .context("Failed to submit mint transaction")?;
    info!("tx sent: {:?}", signed.hash);

    let watcher = ConfirmationWatcher::new(provider, settings.poll_policy());
    let confirmation = watcher
        .wait_for_confirmation(signed.hash, shutdown_signal())
        .await?;

    info!(
        block_number = ?confirmation.block_number,
        attempts = confirmation.attempts,
        "tx confirmed!"
    );
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mint_submitter=debug,hyper=warn,reqwest=warn"));

    // MINT_LOG_FORMAT=json for machine-readable output
    let json = std::env::var("MINT_LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer().with_target(true)))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
