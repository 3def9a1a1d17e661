//! Signing identity derived from a hex-encoded private key
//!
//! Keys are never logged or serialized.

use crate::error::{SubmitterError, SubmitterResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Signature};
use ethers::utils::to_checksum;

/// Key pair plus sender address, owned by a single run
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    wallet: LocalWallet,
}

impl SigningIdentity {
    /// Derive the identity from a secp256k1 private key (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> SubmitterResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex
            .strip_prefix("0x")
            .or_else(|| key_hex.strip_prefix("0X"))
            .unwrap_or(key_hex);

        let bytes = hex::decode(key_hex)
            .map_err(|e| SubmitterError::Wallet(format!("Private key is not valid hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(SubmitterError::Wallet(format!(
                "Private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        let wallet = LocalWallet::from_bytes(&bytes)
            .map_err(|e| SubmitterError::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self { wallet })
    }

    /// Sender address
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// EIP-55 checksummed sender address
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.wallet.address(), None)
    }

    /// Sign a transaction with EIP-155 replay protection for `chain_id`
    pub fn sign_transaction(
        &self,
        tx: &TypedTransaction,
        chain_id: u64,
    ) -> SubmitterResult<Signature> {
        self.wallet
            .clone()
            .with_chain_id(chain_id)
            .sign_transaction_sync(tx)
            .map_err(|e| SubmitterError::Signing(e.to_string()))
    }
}
