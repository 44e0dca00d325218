//! The two ways of reading `retrieve()`.
//!
//! [`read_raw`] builds the `eth_call` by hand and bounds it with a timeout;
//! [`read_bound`] goes through the bound contract handle with no timeout.
//! Both return the stored value as a decimal string.

use alloy::{
    network::TransactionBuilder, primitives::Address, providers::Provider,
    rpc::types::TransactionRequest,
};
use std::time::Duration;
use tracing::debug;

use super::common::errors::describe_contract_error;
use super::StorageBinding;
use crate::abi::{first_uint, StorageAbi, RETRIEVE};
use crate::error::{ChainError, ChainResult};

/// Call `retrieve()` with a hand-built call message.
///
/// If `timeout` elapses first the request future is dropped, which abandons
/// the in-flight request, and [`ChainError::Timeout`] is returned.
pub async fn read_raw<P: Provider>(
    provider: &P,
    contract: Address,
    abi: &StorageAbi,
    timeout: Duration,
) -> ChainResult<String> {
    let request = TransactionRequest::default()
        .with_to(contract)
        .with_input(abi.encode_retrieve()?);

    let output = match tokio::time::timeout(timeout, async { provider.call(request).await }).await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(ChainError::Call(e.to_string())),
        Err(_) => return Err(ChainError::Timeout(timeout)),
    };
    debug!(contract = %contract, bytes = output.len(), "retrieve() returned");

    Ok(abi.decode_retrieve(&output)?.to_string())
}

/// Call `retrieve()` through the bound contract handle.
pub async fn read_bound(binding: &StorageBinding) -> ChainResult<String> {
    let values = binding
        .contract
        .function(RETRIEVE, &[])
        .map_err(|e| ChainError::Call(e.to_string()))?
        .call()
        .await
        .map_err(|e| ChainError::Call(describe_contract_error(&e)))?;

    Ok(first_uint(&values)?.to_string())
}
