//! HTTP JSON-RPC chain client backed by ethers

use super::ChainClient;
use crate::error::{SubmitterError, SubmitterResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use tracing::debug;

/// Single-endpoint HTTP provider
pub struct ChainProvider {
    /// Endpoint URL, kept for diagnostics
    url: String,
    /// HTTP provider
    http: Provider<Http>,
}

impl ChainProvider {
    /// Create a provider for `url`; no request is made until first use
    pub fn new(url: &str) -> SubmitterResult<Self> {
        let http = Provider::<Http>::try_from(url).map_err(|e| {
            SubmitterError::ChainConnection(format!("Invalid RPC URL '{}': {}", redact(url), e))
        })?;

        debug!("Created HTTP provider for {}", redact(url));

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    /// Endpoint with any API key path segment hidden
    pub fn endpoint(&self) -> String {
        redact(&self.url)
    }
}

#[async_trait]
impl ChainClient for ChainProvider {
    async fn gas_price(&self) -> SubmitterResult<U256> {
        self.http
            .get_gas_price()
            .await
            .map_err(|e| SubmitterError::GasEstimation(e.to_string()))
    }

    async fn chain_id(&self) -> SubmitterResult<u64> {
        let chain_id = self
            .http
            .get_chainid()
            .await
            .map_err(|e| SubmitterError::ChainConnection(e.to_string()))?;

        u64::try_from(chain_id).map_err(|_| {
            SubmitterError::ChainConnection(format!("Chain id {} does not fit in u64", chain_id))
        })
    }

    async fn nonce(&self, address: Address) -> SubmitterResult<u64> {
        let nonce = self
            .http
            .get_transaction_count(address, Some(BlockNumber::Latest.into()))
            .await
            .map_err(|e| SubmitterError::Nonce(e.to_string()))?;

        u64::try_from(nonce)
            .map_err(|_| SubmitterError::Nonce(format!("Nonce {} does not fit in u64", nonce)))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> SubmitterResult<H256> {
        let pending = self
            .http
            .send_raw_transaction(raw)
            .await
            .map_err(|e| SubmitterError::Transaction(e.to_string()))?;

        Ok(pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> SubmitterResult<Option<TransactionReceipt>> {
        self.http
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| SubmitterError::ChainConnection(e.to_string()))
    }
}

/// Hide the trailing path segment of hosted endpoints, which carries the project key
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    match rest.rsplit_once('/') {
        Some((host_and_path, key)) if key.len() >= 16 => {
            format!("{}://{}/***", scheme, host_and_path)
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            ChainProvider::new("not a url"),
            Err(SubmitterError::ChainConnection(_))
        ));
    }

    #[test]
    fn test_valid_url_is_accepted() {
        let provider = ChainProvider::new("http://localhost:8545").unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8545");
    }

    #[test]
    fn test_project_key_is_redacted() {
        assert_eq!(
            redact("https://mainnet.infura.io/v3/0123456789abcdef0123456789abcdef"),
            "https://mainnet.infura.io/v3/***"
        );
        assert_eq!(redact("http://127.0.0.1:8545"), "http://127.0.0.1:8545");
        assert_eq!(
            redact("https://rpc.sepolia.example-network.org"),
            "https://rpc.sepolia.example-network.org"
        );
    }
}
