use alloy::{primitives::B256, providers::Provider};
use std::time::Duration;
use tracing::info;

use crate::error::{ChainError, ChainResult};
use crate::retry::{poll_until, PollError, PollPolicy};

/// How to wait for a submitted transaction to be mined
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationStrategy {
    /// Sleep unconditionally, then look the receipt up once.
    FixedDelay(Duration),
    /// Look the receipt up repeatedly with backoff until it appears.
    Poll(PollPolicy),
}

impl Default for ConfirmationStrategy {
    fn default() -> Self {
        Self::Poll(PollPolicy::default())
    }
}

/// The parts of a receipt this crate reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub tx_hash: B256,
    /// Execution result; `false` means the transaction was mined but reverted.
    pub status: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Look up the receipt once. A transaction the node has not mined yet yields
/// [`ChainError::ReceiptNotFound`].
pub async fn fetch_receipt<P: Provider>(provider: &P, tx_hash: B256) -> ChainResult<ReceiptSummary> {
    let receipt = provider
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(|e| ChainError::Call(format!("failed to fetch receipt: {e}")))?
        .ok_or_else(|| ChainError::ReceiptNotFound(tx_hash.to_string()))?;

    Ok(ReceiptSummary {
        tx_hash: receipt.transaction_hash,
        status: receipt.status(),
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}

/// Wait for `tx_hash` to be mined according to `strategy`.
pub async fn wait_for_receipt<P: Provider>(
    provider: &P,
    tx_hash: B256,
    strategy: &ConfirmationStrategy,
) -> ChainResult<ReceiptSummary> {
    match strategy {
        ConfirmationStrategy::FixedDelay(delay) => {
            info!(
                tx_hash = ?tx_hash,
                delay_secs = delay.as_secs(),
                "Waiting before receipt lookup"
            );
            tokio::time::sleep(*delay).await;
            fetch_receipt(provider, tx_hash).await
        }
        ConfirmationStrategy::Poll(policy) => {
            info!(
                tx_hash = ?tx_hash,
                max_attempts = policy.max_attempts,
                budget_secs = policy.total_budget().as_secs(),
                "Polling for receipt"
            );
            poll_until(
                policy,
                "get_transaction_receipt",
                || fetch_receipt(provider, tx_hash),
                ChainError::is_pending_receipt,
            )
            .await
            .map_err(|e| match e {
                PollError::Fatal(e) => e,
                PollError::Exhausted { attempts, .. } => ChainError::ConfirmationTimeout {
                    tx_hash: tx_hash.to_string(),
                    attempts,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mocked_connection, receipt_json, TX_HASH};
    use alloy::transports::mock::Asserter;
    use serde_json::Value;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_finds_receipt() {
        let asserter = Asserter::new();
        asserter.push_success(&receipt_json(TX_HASH, true));
        let connection = mocked_connection(&asserter);

        let start = tokio::time::Instant::now();
        let strategy = ConfirmationStrategy::FixedDelay(Duration::from_secs(15));
        let receipt = wait_for_receipt(connection.provider(), TX_HASH, &strategy)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(15));
        assert_eq!(receipt.tx_hash, TX_HASH);
        assert!(receipt.status);
        assert_eq!(receipt.block_number, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_receipt_not_found() {
        let asserter = Asserter::new();
        asserter.push_success(&Value::Null);
        let connection = mocked_connection(&asserter);

        let strategy = ConfirmationStrategy::FixedDelay(Duration::from_secs(15));
        let err = wait_for_receipt(connection.provider(), TX_HASH, &strategy)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ReceiptNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_mined() {
        let asserter = Asserter::new();
        asserter.push_success(&Value::Null);
        asserter.push_success(&Value::Null);
        asserter.push_success(&receipt_json(TX_HASH, false));
        let connection = mocked_connection(&asserter);

        let strategy = ConfirmationStrategy::Poll(PollPolicy::exponential(1, 5, 2.0, 8));
        let receipt = wait_for_receipt(connection.provider(), TX_HASH, &strategy)
            .await
            .unwrap();
        // mined but reverted
        assert!(!receipt.status);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_exhausted() {
        let asserter = Asserter::new();
        for _ in 0..3 {
            asserter.push_success(&Value::Null);
        }
        let connection = mocked_connection(&asserter);

        let strategy = ConfirmationStrategy::Poll(PollPolicy::exponential(1, 3, 2.0, 8));
        let err = wait_for_receipt(connection.provider(), TX_HASH, &strategy)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ConfirmationTimeout { attempts: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_stops_on_rpc_error() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("rate limited");
        let connection = mocked_connection(&asserter);

        let strategy = ConfirmationStrategy::default();
        let err = wait_for_receipt(connection.provider(), TX_HASH, &strategy)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Call(_)));
    }
}
