//! Gas price acquisition for legacy transactions

use crate::chain::ChainClient;
use crate::error::{SubmitterError, SubmitterResult};

use ethers::types::U256;
use tracing::debug;

const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Fetches the node's suggested gas price and enforces an optional ceiling
pub struct GasEstimator {
    /// Refuse to sign above this price
    max_gas_price_gwei: Option<u64>,
}

impl GasEstimator {
    /// Create a new gas estimator
    pub fn new(max_gas_price_gwei: Option<u64>) -> Self {
        Self { max_gas_price_gwei }
    }

    /// Suggested gas price, used as-is
    pub async fn get_gas_price<C: ChainClient + ?Sized>(&self, client: &C) -> SubmitterResult<U256> {
        let gas_price = client.gas_price().await?;
        self.check_ceiling(gas_price)?;

        debug!("Suggested gas price: {} wei", gas_price);
        Ok(gas_price)
    }

    fn check_ceiling(&self, gas_price: U256) -> SubmitterResult<()> {
        let Some(max_gwei) = self.max_gas_price_gwei else {
            return Ok(());
        };

        let max_wei = U256::from(max_gwei) * U256::from(WEI_PER_GWEI);
        if gas_price > max_wei {
            let current_gwei = gas_price / U256::from(WEI_PER_GWEI);
            return Err(SubmitterError::GasPriceTooHigh {
                current_gwei: current_gwei.try_into().unwrap_or(u64::MAX),
                max_gwei,
            });
        }

        Ok(())
    }

    /// Calculate the maximum fee in wei
    pub fn calculate_cost(gas_limit: u64, gas_price: U256) -> U256 {
        U256::from(gas_limit).saturating_mul(gas_price)
    }
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::new(None)
    }
}
