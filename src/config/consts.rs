//! Centralized defaults for the storage demo.
//!
//! Every value here can be overridden through CLI flags, environment variables
//! or the TOML configuration file.

// =============================================================================
// Endpoint
// =============================================================================

/// Default RPC endpoint, a local Anvil/Hardhat node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// How long the connector waits for the node to answer its probe
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Contract Interaction
// =============================================================================

/// Value written by `store(uint256)` when none is configured
pub const DEFAULT_STORE_VALUE: u64 = 666;

/// Upper bound for the raw `retrieve()` call
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;

/// Priority fee per gas added on top of the node gas price (wei)
pub const DEFAULT_PRIORITY_FEE_WEI: u128 = 0;

// =============================================================================
// Confirmation
// =============================================================================

/// Unconditional wait before the single receipt lookup in fixed-delay mode
pub const DEFAULT_CONFIRMATION_DELAY_SECS: u64 = 15;

/// First delay between receipt polls
pub const DEFAULT_POLL_INITIAL_DELAY_SECS: u64 = 1;

/// Backoff multiplier between receipt polls
pub const DEFAULT_POLL_MULTIPLIER: f64 = 2.0;

/// Cap on the delay between receipt polls
pub const DEFAULT_POLL_MAX_DELAY_SECS: u64 = 8;

/// Receipt lookups before giving up
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 10;

/// Largest accepted poll attempt budget
pub const MAX_POLL_ATTEMPTS: u32 = 1_000;

/// Largest accepted confirmation or poll delay
pub const MAX_CONFIRMATION_DELAY_SECS: u64 = 3_600;
