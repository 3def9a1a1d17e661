//! Receipt polling until the transaction is mined
//!
//! Each attempt reports one of three status codes:
//! - `-1`: receipt not yet available (query error or no receipt)
//! - `0`: mined and reverted, terminal failure
//! - `1`: mined and succeeded, terminal success

use crate::chain::ChainClient;
use crate::error::{SubmitterError, SubmitterResult};

use ethers::types::{H256, U64};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of a single receipt query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Query failed or the node has no receipt yet
    Unavailable,
    /// Receipt with status 0
    Failed { block_number: Option<u64> },
    /// Receipt with status 1
    Succeeded { block_number: Option<u64> },
}

impl ReceiptStatus {
    /// Numeric code printed on each poll
    pub fn code(&self) -> i32 {
        match self {
            ReceiptStatus::Unavailable => -1,
            ReceiptStatus::Failed { .. } => 0,
            ReceiptStatus::Succeeded { .. } => 1,
        }
    }
}

/// Query the receipt for `tx_hash` once
pub async fn check_transaction_receipt<C: ChainClient + ?Sized>(
    client: &C,
    tx_hash: H256,
) -> ReceiptStatus {
    let receipt = match client.transaction_receipt(tx_hash).await {
        Ok(Some(receipt)) => receipt,
        Ok(None) => return ReceiptStatus::Unavailable,
        Err(e) => {
            debug!("Receipt query for {:?} failed: {}", tx_hash, e);
            return ReceiptStatus::Unavailable;
        }
    };

    let block_number = receipt.block_number.map(|b| b.as_u64());

    // Receipts without a status field predate Byzantium and count as status 0
    if receipt.status == Some(U64::one()) {
        ReceiptStatus::Succeeded { block_number }
    } else {
        ReceiptStatus::Failed { block_number }
    }
}

/// Spacing and budget for receipt queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between attempts
    pub interval: Duration,
    /// Attempt budget, `None` for no limit
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: Some(300),
        }
    }
}

/// A mined, successful transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub attempts: u32,
}

/// Polls the node for a receipt according to a `PollPolicy`
pub struct ConfirmationWatcher<C: ChainClient> {
    client: Arc<C>,
    policy: PollPolicy,
}

impl<C: ChainClient> ConfirmationWatcher<C> {
    pub fn new(client: Arc<C>, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    /// Poll until the receipt reports success.
    ///
    /// Returns `Reverted` on a status-0 receipt, `ConfirmationTimeout` once the
    /// attempt budget is spent and `Cancelled` as soon as `shutdown` resolves.
    pub async fn wait_for_confirmation<F>(
        &self,
        tx_hash: H256,
        shutdown: F,
    ) -> SubmitterResult<Confirmation>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let status = tokio::select! {
                biased;
                _ = &mut shutdown => return Err(self.cancelled(tx_hash)),
                status = check_transaction_receipt(self.client.as_ref(), tx_hash) => status,
            };

            info!(tx_hash = ?tx_hash, attempt = attempts, "tx status: {}", status.code());

            match status {
                ReceiptStatus::Succeeded { block_number } => {
                    return Ok(Confirmation {
                        tx_hash,
                        block_number,
                        attempts,
                    });
                }
                ReceiptStatus::Failed { block_number } => {
                    return Err(SubmitterError::Reverted {
                        tx_hash: format!("{:?}", tx_hash),
                        block_number,
                    });
                }
                ReceiptStatus::Unavailable => {}
            }

            if let Some(max_attempts) = self.policy.max_attempts {
                if attempts >= max_attempts {
                    return Err(SubmitterError::ConfirmationTimeout {
                        tx_hash: format!("{:?}", tx_hash),
                        attempts,
                    });
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => return Err(self.cancelled(tx_hash)),
                _ = tokio::time::sleep(self.policy.interval) => {}
            }
        }
    }

    fn cancelled(&self, tx_hash: H256) -> SubmitterError {
        warn!("Stopped waiting for {:?}; it may still be mined", tx_hash);
        SubmitterError::Cancelled {
            tx_hash: format!("{:?}", tx_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use ethers::types::TransactionReceipt;

    fn receipt(status: Option<u64>, block: u64) -> TransactionReceipt {
        TransactionReceipt {
            status: status.map(U64::from),
            block_number: Some(U64::from(block)),
            ..Default::default()
        }
    }

    fn fast_policy(max_attempts: Option<u32>) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_status_codes() {
        let mut client = MockChainClient::new();
        let mut call = 0;
        client.expect_transaction_receipt().returning(move |_| {
            call += 1;
            match call {
                1 => Ok(None),
                2 => Err(SubmitterError::ChainConnection("unknown transaction".into())),
                3 => Ok(Some(receipt(Some(0), 10))),
                4 => Ok(Some(receipt(Some(1), 11))),
                _ => Ok(Some(receipt(None, 12))),
            }
        });

        let hash = H256::repeat_byte(0xab);
        let codes = [
            check_transaction_receipt(&client, hash).await,
            check_transaction_receipt(&client, hash).await,
            check_transaction_receipt(&client, hash).await,
            check_transaction_receipt(&client, hash).await,
            check_transaction_receipt(&client, hash).await,
        ]
        .map(|s| s.code());

        assert_eq!(codes, [-1, -1, 0, 1, 0]);
    }

    #[tokio::test]
    async fn test_waits_through_pending_until_success() {
        let mut client = MockChainClient::new();
        let mut call = 0;
        client
            .expect_transaction_receipt()
            .times(3)
            .returning(move |_| {
                call += 1;
                match call {
                    1 => Err(SubmitterError::ChainConnection("not found".into())),
                    2 => Ok(None),
                    _ => Ok(Some(receipt(Some(1), 100))),
                }
            });

        let watcher = ConfirmationWatcher::new(Arc::new(client), fast_policy(Some(10)));
        let hash = H256::repeat_byte(1);
        let confirmation = watcher
            .wait_for_confirmation(hash, std::future::pending())
            .await
            .unwrap();

        assert_eq!(
            confirmation,
            Confirmation {
                tx_hash: hash,
                block_number: Some(100),
                attempts: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_terminal() {
        let mut client = MockChainClient::new();
        client
            .expect_transaction_receipt()
            .times(1)
            .returning(|_| Ok(Some(receipt(Some(0), 42))));

        let watcher = ConfirmationWatcher::new(Arc::new(client), fast_policy(None));
        let result = watcher
            .wait_for_confirmation(H256::repeat_byte(2), std::future::pending())
            .await;

        assert!(matches!(
            result,
            Err(SubmitterError::Reverted {
                block_number: Some(42),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_attempt_budget_is_enforced() {
        let mut client = MockChainClient::new();
        client
            .expect_transaction_receipt()
            .times(3)
            .returning(|_| Ok(None));

        let watcher = ConfirmationWatcher::new(Arc::new(client), fast_policy(Some(3)));
        let result = watcher
            .wait_for_confirmation(H256::repeat_byte(3), std::future::pending())
            .await;

        assert!(matches!(
            result,
            Err(SubmitterError::ConfirmationTimeout { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_wait() {
        let mut client = MockChainClient::new();
        client.expect_transaction_receipt().returning(|_| Ok(None));

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });

        let watcher = ConfirmationWatcher::new(Arc::new(client), fast_policy(None));
        let result = watcher
            .wait_for_confirmation(H256::repeat_byte(4), async {
                let _ = rx.await;
            })
            .await;

        assert!(matches!(result, Err(SubmitterError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_resolved_shutdown_skips_polling() {
        let mut client = MockChainClient::new();
        client.expect_transaction_receipt().times(0);

        let watcher = ConfirmationWatcher::new(Arc::new(client), PollPolicy::default());
        let result = watcher
            .wait_for_confirmation(H256::repeat_byte(5), async {})
            .await;

        assert!(matches!(result, Err(SubmitterError::Cancelled { .. })));
    }
}
