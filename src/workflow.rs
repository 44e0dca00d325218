//! The demo run: connect, bind, store, confirm, then read the value back
//! through both call paths.

use alloy::primitives::{Address, B256, U256};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::abi::STORAGE_ABI;
use crate::config::DemoConfig;
use crate::connection::ChainConnection;
use crate::contract_client::{
    confirmation::{wait_for_receipt, ReceiptSummary},
    reader::{read_bound, read_raw},
    FeePolicy, StorageBinding,
};
use crate::error::ChainError;

/// Step of the run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Bind,
    Submit,
    Confirm,
    ReadRaw,
    ReadBound,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Connect => "connect",
            Stage::Bind => "bind",
            Stage::Submit => "submit",
            Stage::Confirm => "confirm",
            Stage::ReadRaw => "read-raw",
            Stage::ReadBound => "read-bound",
        };
        f.write_str(name)
    }
}

/// A run that stopped at `stage`.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct Aborted {
    pub stage: Stage,
    #[source]
    pub error: ChainError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, Aborted>;
}

impl<T> AtStage<T> for Result<T, ChainError> {
    fn at(self, stage: Stage) -> Result<T, Aborted> {
        self.map_err(|error| Aborted { stage, error })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub endpoint: String,
    pub contract_address: Address,
    pub account: Address,
    pub chain_id: u64,
    pub stored_value: U256,
    pub tx_hash: B256,
    pub receipt: ReceiptSummary,
    pub raw_value: String,
    pub bound_value: String,
}

impl RunReport {
    /// Whether both read paths returned the value that was stored.
    pub fn values_match(&self) -> bool {
        let expected = self.stored_value.to_string();
        self.raw_value == expected && self.bound_value == expected
    }
}

/// Connect to the configured node, run every step, and release the
/// connection whatever the outcome.
pub async fn run(config: &DemoConfig) -> Result<RunReport, Aborted> {
    let connection = ChainConnection::connect(&config.rpc_url, config.connect_timeout)
        .await
        .at(Stage::Connect)?;

    let result = run_with(&connection, config).await;
    connection.close();
    result
}

/// Run every step after connecting, against an existing connection.
pub async fn run_with(
    connection: &ChainConnection,
    config: &DemoConfig,
) -> Result<RunReport, Aborted> {
    let binding = StorageBinding::bind(
        connection,
        config.contract_address,
        STORAGE_ABI,
        &config.private_key,
    )
    .await
    .at(Stage::Bind)?;
    info!(
        account = %binding.signer_address(),
        chain_id = binding.chain_id(),
        "Account ready"
    );

    let fees = FeePolicy {
        priority_fee_wei: config.priority_fee_wei,
    };
    let tx_hash = binding
        .store(config.store_value, fees)
        .await
        .at(Stage::Submit)?;
    info!(tx_hash = ?tx_hash, value = %config.store_value, "store() submitted");

    let receipt = wait_for_receipt(connection.provider(), tx_hash, &config.confirmation)
        .await
        .at(Stage::Confirm)?;
    if receipt.status {
        info!(
            tx_hash = ?tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
    } else {
        warn!(
            tx_hash = ?tx_hash,
            block = ?receipt.block_number,
            "Transaction mined but reverted"
        );
    }

    let raw_value = read_raw(
        connection.provider(),
        binding.address(),
        &binding.abi,
        config.call_timeout,
    )
    .await
    .at(Stage::ReadRaw)?;
    info!(value = %raw_value, "retrieve() via raw call");

    let bound_value = read_bound(&binding).await.at(Stage::ReadBound)?;
    info!(value = %bound_value, "retrieve() via bound contract");

    if raw_value != bound_value {
        warn!(
            raw = %raw_value,
            bound = %bound_value,
            "Read paths disagree"
        );
    }

    Ok(RunReport {
        endpoint: connection.endpoint().to_owned(),
        contract_address: binding.address(),
        account: binding.signer_address(),
        chain_id: binding.chain_id(),
        stored_value: config.store_value,
        tx_hash,
        receipt,
        raw_value,
        bound_value,
    })
}
