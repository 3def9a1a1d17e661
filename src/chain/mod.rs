//! Chain module - node access behind a mockable capability trait
//!
//! This module provides:
//! - The `ChainClient` trait covering every JSON-RPC call the submitter makes
//! - An HTTP JSON-RPC implementation backed by ethers

pub mod provider;

pub use provider::ChainProvider;

use crate::error::SubmitterResult;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};

/// Read and write access to an Ethereum-compatible node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Suggested legacy gas price in wei
    async fn gas_price(&self) -> SubmitterResult<U256>;

    /// Chain identifier used for EIP-155 signing
    async fn chain_id(&self) -> SubmitterResult<u64>;

    /// Transaction count of `address` at the latest block
    async fn nonce(&self, address: Address) -> SubmitterResult<u64>;

    /// Broadcast a signed, RLP-encoded transaction
    async fn send_raw_transaction(&self, raw: Bytes) -> SubmitterResult<H256>;

    /// Receipt for a mined transaction, `None` while pending
    async fn transaction_receipt(&self, tx_hash: H256)
        -> SubmitterResult<Option<TransactionReceipt>>;
}
