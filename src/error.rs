//! Error types for the mint submitter

use thiserror::Error;

/// Main error type for the submitter
#[derive(Error, Debug)]
pub enum SubmitterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Chain connection error: {0}")]
    ChainConnection(String),

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Gas price {current_gwei} gwei exceeds configured maximum of {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    #[error("Nonce error: {0}")]
    Nonce(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Insufficient funds to cover value + gas: {0}")]
    InsufficientBalance(String),

    #[error("Transaction {tx_hash} reverted in block {block_number:?}")]
    Reverted {
        tx_hash: String,
        block_number: Option<u64>,
    },

    #[error("No receipt for transaction {tx_hash} after {attempts} attempts")]
    ConfirmationTimeout { tx_hash: String, attempts: u32 },

    #[error("Cancelled while waiting for transaction {tx_hash}")]
    Cancelled { tx_hash: String },
}

/// Result type for submitter operations
pub type SubmitterResult<T> = Result<T, SubmitterError>;
