pub mod abi;
pub mod config;
pub mod connection;
pub mod contract_client;
pub mod error;
pub mod report;
pub mod retry;
pub mod wallet;
pub mod workflow;

#[cfg(test)]
mod test_utils;
