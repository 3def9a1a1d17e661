//! Transaction sender: chain snapshot, legacy assembly, EIP-155 signing and broadcast
//!
//! Exactly one transaction is built per `submit` call. The nonce comes straight
//! from the node; there is no local nonce tracking and no resubmission.

use super::gas::GasEstimator;
use crate::abi::CallEncoder;
use crate::chain::ChainClient;
use crate::config::Settings;
use crate::error::{SubmitterError, SubmitterResult};
use crate::wallet::SigningIdentity;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Signature, TransactionRequest, H256, U256};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Function invoked on the target contract
pub const MINT_FUNCTION: &str = "mint";

/// What to send: target, value and gas budget
#[derive(Debug, Clone, PartialEq)]
pub struct MintRequest {
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
}

impl MintRequest {
    pub fn from_settings(settings: &Settings) -> SubmitterResult<Self> {
        let to = Address::from_str(&settings.contract_address).map_err(|e| {
            SubmitterError::Config(format!(
                "Invalid contract address {}: {}",
                settings.contract_address, e
            ))
        })?;

        Ok(Self {
            to,
            value: U256::from(settings.value),
            gas_limit: settings.gas_limit,
        })
    }
}

/// Chain state fetched once per run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSnapshot {
    pub gas_price: U256,
    pub chain_id: u64,
    pub nonce: u64,
}

/// A signed transaction, immutable and identified by its hash
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx: TypedTransaction,
    pub signature: Signature,
    pub raw: Bytes,
    pub hash: H256,
}

/// Builds, signs and broadcasts the mint transaction
pub struct TransactionSender<C: ChainClient> {
    /// Node access
    client: Arc<C>,
    /// Signing key and sender address
    identity: SigningIdentity,
    /// Gas price source
    gas_estimator: GasEstimator,
}

impl<C: ChainClient> TransactionSender<C> {
    /// Create a new transaction sender
    pub fn new(client: Arc<C>, identity: SigningIdentity, gas_estimator: GasEstimator) -> Self {
        Self {
            client,
            identity,
            gas_estimator,
        }
    }

    /// Sender address
    pub fn address(&self) -> Address {
        self.identity.address()
    }

    /// Build, sign and broadcast a single `mint()` call
    pub async fn submit<E: CallEncoder + ?Sized>(
        &self,
        request: &MintRequest,
        encoder: &E,
    ) -> SubmitterResult<SignedTransaction> {
        let snapshot = self.fetch_snapshot().await?;
        let data = encoder.encode_call(MINT_FUNCTION)?;

        let tx = build_legacy_tx(self.address(), request, &snapshot, data);
        let signed = self.sign(tx, snapshot.chain_id)?;

        info!(
            nonce = snapshot.nonce,
            chain_id = snapshot.chain_id,
            to = ?signed.tx.to_addr(),
            v = signed.signature.v,
            gas_price = %snapshot.gas_price,
            max_fee = %GasEstimator::calculate_cost(request.gas_limit, snapshot.gas_price),
            "Signed mint transaction {:?}",
            signed.hash
        );

        self.broadcast(&signed).await?;
        Ok(signed)
    }

    /// Query gas price, chain id and the sender's nonce
    pub async fn fetch_snapshot(&self) -> SubmitterResult<ChainSnapshot> {
        let gas_price = self.gas_estimator.get_gas_price(self.client.as_ref()).await?;
        let chain_id = self.client.chain_id().await?;
        let nonce = self.client.nonce(self.address()).await?;

        debug!(
            "Chain snapshot: chain_id={} nonce={} gas_price={}",
            chain_id, nonce, gas_price
        );

        Ok(ChainSnapshot {
            gas_price,
            chain_id,
            nonce,
        })
    }

    /// Sign with the snapshot's chain id and derive the hash
    pub fn sign(&self, tx: TypedTransaction, chain_id: u64) -> SubmitterResult<SignedTransaction> {
        let signature = self.identity.sign_transaction(&tx, chain_id)?;
        let raw = tx.rlp_signed(&signature);
        let hash = tx.hash(&signature);

        Ok(SignedTransaction {
            tx,
            signature,
            raw,
            hash,
        })
    }

    /// Send the signed bytes to the node
    async fn broadcast(&self, signed: &SignedTransaction) -> SubmitterResult<()> {
        let node_hash = self
            .client
            .send_raw_transaction(signed.raw.clone())
            .await
            .map_err(classify_broadcast_error)?;

        if node_hash != signed.hash {
            warn!(
                "Node reported hash {:?} for locally computed {:?}",
                node_hash, signed.hash
            );
        }

        Ok(())
    }
}

/// Assemble the legacy (pre-EIP-1559) transaction
pub fn build_legacy_tx(
    from: Address,
    request: &MintRequest,
    snapshot: &ChainSnapshot,
    data: Bytes,
) -> TypedTransaction {
    let tx = TransactionRequest::new()
        .from(from)
        .to(request.to)
        .value(request.value)
        .gas(request.gas_limit)
        .gas_price(snapshot.gas_price)
        .nonce(snapshot.nonce)
        .data(data)
        .chain_id(snapshot.chain_id);

    TypedTransaction::Legacy(tx)
}

/// Map well-known node rejections onto specific errors
fn classify_broadcast_error(err: SubmitterError) -> SubmitterError {
    let SubmitterError::Transaction(message) = err else {
        return err;
    };

    let lower = message.to_lowercase();
    if lower.contains("insufficient funds") {
        SubmitterError::InsufficientBalance(message)
    } else if lower.contains("nonce too low") || lower.contains("already known") {
        SubmitterError::Nonce(message)
    } else {
        SubmitterError::Transaction(message)
    }
}
