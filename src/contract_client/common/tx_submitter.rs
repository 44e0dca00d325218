use alloy::{
    contract::{CallBuilder, CallDecoder},
    eips::eip2718::Encodable2718,
    network::TransactionBuilder,
    primitives::B256,
    providers::Provider,
};
use tracing::{debug, info};

use super::errors::{describe_contract_error, describe_rpc_error};
use super::overestimate_gas;
use crate::error::{ChainError, ChainResult};
use crate::wallet::ChainSigner;

/// Fee settings applied on top of what the node reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeePolicy {
    /// Tip per gas in wei; the max fee is the node gas price plus this tip.
    pub priority_fee_wei: u128,
}

/// Signs and broadcasts contract transactions.
///
/// Nonce, gas limit and fees are fetched from the node explicitly so the signer
/// can produce a complete EIP-1559 transaction locally.
#[derive(Debug, Clone)]
pub(crate) struct TransactionSubmitter {
    fees: FeePolicy,
}

impl TransactionSubmitter {
    pub(crate) fn new(fees: FeePolicy) -> Self {
        Self { fees }
    }

    /// Submit `call` signed by `signer`. Returns once the node has accepted the
    /// transaction; inclusion is not awaited.
    pub(crate) async fn invoke<P, D>(
        &self,
        method: &str,
        call: CallBuilder<P, D>,
        signer: &ChainSigner,
    ) -> ChainResult<B256>
    where
        P: Provider + Clone,
        D: CallDecoder,
    {
        let from = signer.address();
        let call = call.from(from);

        // Pre-simulate to catch reverts with proper error messages
        if let Err(e) = call.call().await {
            let e = describe_contract_error(&e);
            return Err(ChainError::TransactionSubmit(format!(
                "{method} simulation failed: {e}"
            )));
        }

        let provider = call.provider.clone();
        let request = call.into_transaction_request();

        let nonce = provider
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(|e| submit_error(method, "failed to fetch nonce", e))?;
        let estimated_gas = provider
            .estimate_gas(request.clone())
            .await
            .map_err(|e| submit_error(method, "failed to estimate gas", e))?;
        let gas_price = provider
            .get_gas_price()
            .await
            .map_err(|e| submit_error(method, "failed to fetch gas price", e))?;

        let gas_limit = overestimate_gas(estimated_gas);
        let priority_fee = self.fees.priority_fee_wei;
        let max_fee = gas_price.saturating_add(priority_fee);
        debug!(
            method,
            nonce, estimated_gas, gas_limit, gas_price, "Prepared transaction"
        );

        let request = request
            .with_nonce(nonce)
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(max_fee)
            .with_max_priority_fee_per_gas(priority_fee);
        let envelope = signer.sign(request).await?;

        let pending = provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(|e| submit_error(method, "failed to send", e))?;
        let tx_hash = *pending.tx_hash();

        info!(
            method = %method,
            tx_hash = ?tx_hash,
            nonce,
            gas_limit,
            max_fee_per_gas = max_fee,
            max_priority_fee_per_gas = priority_fee,
            "Transaction submitted"
        );
        Ok(tx_hash)
    }
}

fn submit_error<E: std::fmt::Display>(method: &str, what: &str, error: E) -> ChainError {
    ChainError::TransactionSubmit(format!("{method} {what}: {}", describe_rpc_error(error)))
}
