pub mod errors;
pub mod tx_submitter;

/// Add a 50% buffer to a gas estimate.
pub fn overestimate_gas(estimated_gas: u64) -> u64 {
    estimated_gas.saturating_add(estimated_gas / 2)
}
