use alloy::primitives::{Address, U256};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::contract_client::confirmation::ConfirmationStrategy;
use crate::error::{ChainError, ChainResult};
use crate::retry::PollPolicy;

pub mod consts;

use consts::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_CONFIRMATION_DELAY_SECS, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_POLL_INITIAL_DELAY_SECS, DEFAULT_POLL_MAX_ATTEMPTS, DEFAULT_POLL_MAX_DELAY_SECS,
    DEFAULT_POLL_MULTIPLIER, DEFAULT_PRIORITY_FEE_WEI, DEFAULT_RPC_URL, DEFAULT_STORE_VALUE,
    MAX_CONFIRMATION_DELAY_SECS, MAX_POLL_ATTEMPTS,
};

/// How the demo waits for its transaction to be mined
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationMode {
    /// Re-query the receipt with exponential backoff
    Poll,
    /// Sleep once, then query the receipt a single time
    FixedDelay,
}

/// CLI arguments for the storage demo
#[derive(Parser, Debug, Default)]
#[command(name = "storage_demo")]
#[command(
    about = "Storage demo - store a uint256 in an EVM storage contract and read it back",
    long_about = None
)]
pub struct CliArgs {
    /// Optional TOML file with the same keys as the flags below
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Ethereum RPC endpoint (http, ws or ipc)
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Storage contract address
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Private key used to sign the store transaction (64 hex characters)
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Value passed to store(uint256)
    #[arg(long, env = "STORE_VALUE")]
    pub store_value: Option<U256>,

    /// Timeout for the raw retrieve() call, in seconds
    #[arg(long, env = "CALL_TIMEOUT_SECS")]
    pub call_timeout_secs: Option<u64>,

    /// Timeout for the initial connection probe, in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Confirmation strategy
    #[arg(long, env = "CONFIRMATION_MODE", value_enum)]
    pub confirmation_mode: Option<ConfirmationMode>,

    /// Delay before the receipt lookup in fixed-delay mode, in seconds
    #[arg(long, env = "CONFIRMATION_DELAY_SECS")]
    pub confirmation_delay_secs: Option<u64>,

    /// First delay between receipt polls, in seconds
    #[arg(long, env = "POLL_INITIAL_DELAY_SECS")]
    pub poll_initial_delay_secs: Option<u64>,

    /// Cap on the delay between receipt polls, in seconds
    #[arg(long, env = "POLL_MAX_DELAY_SECS")]
    pub poll_max_delay_secs: Option<u64>,

    /// Number of receipt lookups before giving up
    #[arg(long, env = "POLL_MAX_ATTEMPTS")]
    pub poll_max_attempts: Option<u32>,

    /// Priority fee per gas in wei, added on top of the node gas price
    #[arg(long, env = "PRIORITY_FEE_WEI")]
    pub priority_fee_wei: Option<u128>,
}

/// Contents of the optional TOML configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub private_key: Option<String>,
    /// Decimal or 0x-prefixed hex
    pub store_value: Option<String>,
    pub call_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub confirmation_mode: Option<ConfirmationMode>,
    pub confirmation_delay_secs: Option<u64>,
    pub poll_initial_delay_secs: Option<u64>,
    pub poll_max_delay_secs: Option<u64>,
    pub poll_max_attempts: Option<u32>,
    pub priority_fee_wei: Option<u128>,
}

/// Load configuration from a TOML file.
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> ChainResult<FileConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .map_err(|e| ChainError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&s)
        .map_err(|e| ChainError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Demo configuration with all required values resolved
#[derive(Clone)]
pub struct DemoConfig {
    pub rpc_url: String,
    pub contract_address: Address,
    pub private_key: String,
    pub store_value: U256,
    pub call_timeout: Duration,
    pub connect_timeout: Duration,
    pub confirmation: ConfirmationStrategy,
    pub priority_fee_wei: u128,
}

impl fmt::Debug for DemoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &"<redacted>")
            .field("store_value", &self.store_value)
            .field("call_timeout", &self.call_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("confirmation", &self.confirmation)
            .field("priority_fee_wei", &self.priority_fee_wei)
            .finish()
    }
}

impl DemoConfig {
    /// Load configuration with priority: CLI/env -> config file -> defaults
    pub fn load(cli_args: CliArgs) -> ChainResult<Self> {
        let file = match &cli_args.config_file {
            Some(path) => load_config_from_path(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli_args, file)
    }

    fn resolve(cli_args: CliArgs, file: FileConfig) -> ChainResult<Self> {
        let rpc_url = cli_args
            .rpc_url
            .or(file.rpc_url)
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let contract_address = cli_args
            .contract_address
            .or(file.contract_address)
            .ok_or_else(|| {
                ChainError::Config(
                    "contract address is required (--contract-address or CONTRACT_ADDRESS)"
                        .to_string(),
                )
            })?;
        let contract_address = contract_address
            .trim()
            .parse::<Address>()
            .map_err(|e| ChainError::Config(format!("invalid contract address: {e}")))?;

        // Validated when the signer is built, so a bad key surfaces as InvalidKey.
        let private_key = cli_args.private_key.or(file.private_key).ok_or_else(|| {
            ChainError::Config(
                "private key is required (--private-key or PRIVATE_KEY)".to_string(),
            )
        })?;

        let store_value = match (cli_args.store_value, file.store_value) {
            (Some(value), _) => value,
            (None, Some(raw)) => raw
                .trim()
                .parse::<U256>()
                .map_err(|e| ChainError::Config(format!("invalid store_value {raw:?}: {e}")))?,
            (None, None) => U256::from(DEFAULT_STORE_VALUE),
        };

        let call_timeout = Duration::from_secs(
            cli_args
                .call_timeout_secs
                .or(file.call_timeout_secs)
                .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS),
        );
        let connect_timeout = Duration::from_secs(
            cli_args
                .connect_timeout_secs
                .or(file.connect_timeout_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        );
        if call_timeout.is_zero() || connect_timeout.is_zero() {
            return Err(ChainError::Config("timeouts must be non-zero".to_string()));
        }

        let mode = cli_args
            .confirmation_mode
            .or(file.confirmation_mode)
            .unwrap_or(ConfirmationMode::Poll);
        let confirmation = match mode {
            ConfirmationMode::FixedDelay => {
                let delay_secs = cli_args
                    .confirmation_delay_secs
                    .or(file.confirmation_delay_secs)
                    .unwrap_or(DEFAULT_CONFIRMATION_DELAY_SECS);
                check_delay("confirmation_delay_secs", delay_secs)?;
                ConfirmationStrategy::FixedDelay(Duration::from_secs(delay_secs))
            }
            ConfirmationMode::Poll => {
                let initial_delay_secs = cli_args
                    .poll_initial_delay_secs
                    .or(file.poll_initial_delay_secs)
                    .unwrap_or(DEFAULT_POLL_INITIAL_DELAY_SECS);
                let max_delay_secs = cli_args
                    .poll_max_delay_secs
                    .or(file.poll_max_delay_secs)
                    .unwrap_or(DEFAULT_POLL_MAX_DELAY_SECS);
                let max_attempts = cli_args
                    .poll_max_attempts
                    .or(file.poll_max_attempts)
                    .unwrap_or(DEFAULT_POLL_MAX_ATTEMPTS);
                check_delay("poll_initial_delay_secs", initial_delay_secs)?;
                check_delay("poll_max_delay_secs", max_delay_secs)?;
                if max_attempts == 0 || max_attempts > MAX_POLL_ATTEMPTS {
                    return Err(ChainError::Config(format!(
                        "poll_max_attempts must be between 1 and {MAX_POLL_ATTEMPTS}, got {max_attempts}"
                    )));
                }
                ConfirmationStrategy::Poll(PollPolicy::exponential(
                    initial_delay_secs,
                    max_attempts,
                    DEFAULT_POLL_MULTIPLIER,
                    max_delay_secs,
                ))
            }
        };

        let priority_fee_wei = cli_args
            .priority_fee_wei
            .or(file.priority_fee_wei)
            .unwrap_or(DEFAULT_PRIORITY_FEE_WEI);

        info!(
            "Loaded DemoConfig: rpc_url={rpc_url}, contract_address={contract_address}, store_value={store_value}, confirmation={mode:?}"
        );

        Ok(DemoConfig {
            rpc_url,
            contract_address,
            private_key,
            store_value,
            call_timeout,
            connect_timeout,
            confirmation,
            priority_fee_wei,
        })
    }
}

fn check_delay(name: &str, secs: u64) -> ChainResult<()> {
    if secs > MAX_CONFIRMATION_DELAY_SECS {
        return Err(ChainError::Config(format!(
            "{name} must be at most {MAX_CONFIRMATION_DELAY_SECS}, got {secs}"
        )));
    }
    Ok(())
}
