//! Fixtures for tests that talk to a mocked node.

use alloy::{
    primitives::{address, b256, Address, B256, U256},
    providers::{Provider, ProviderBuilder},
    transports::mock::Asserter,
};
use serde_json::{json, Value};

use crate::connection::ChainConnection;

pub const ANVIL_CHAIN_ID: u64 = 31337;
pub const ANVIL_KEY_0: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ANVIL_ADDRESS_0: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const TX_HASH: B256 =
    b256!("9a1fcb7c3d2e08b0f0ff7a6e8c9f1d6b5a4e3c2b1a09f8e7d6c5b4a392817060");

/// Connection whose requests are answered, in order, from `asserter`.
pub fn mocked_connection(asserter: &Asserter) -> ChainConnection {
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter.clone())
        .erased();
    ChainConnection::from_provider(provider, "mock://node")
}

/// A `uint256` as the hex word `eth_call` returns.
pub fn uint_word(value: U256) -> String {
    format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
}

/// Minimal EIP-1559 receipt as returned by `eth_getTransactionReceipt`.
pub fn receipt_json(tx_hash: B256, success: bool) -> Value {
    json!({
        "type": "0x2",
        "status": if success { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0xa8b5",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": "0x2f0ecab9d3c1ef1a8d3e2a1bc3b7e1d7c0bd4d5fb0c8b9a3f4c1d6e5a7b8c9d0",
        "blockNumber": "0x2",
        "gasUsed": "0xa8b5",
        "effectiveGasPrice": "0x3b9aca00",
        "from": ANVIL_ADDRESS_0,
        "to": CONTRACT,
        "contractAddress": null
    })
}
