use std::time::Duration;
use thiserror::Error;

/// Errors produced while talking to the chain node and the storage contract.
///
/// Every variant is fatal to a run; nothing in this crate retries on them
/// except the confirmation poller, which only retries a missing receipt.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Configuration could not be resolved or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The RPC endpoint is malformed or unreachable.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The contract ABI JSON is malformed or does not describe the storage contract.
    #[error("failed to parse contract ABI: {0}")]
    AbiParse(String),
    /// Querying chain metadata (chain id) failed.
    #[error("chain query failed: {0}")]
    ChainQuery(String),
    /// The private key is not a valid secp256k1 scalar.
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    /// The transaction signer could not be built.
    #[error("failed to create signer: {0}")]
    SignerCreation(String),
    /// A read-only call or receipt query was rejected by the node.
    #[error("call failed: {0}")]
    Call(String),
    /// A call returned data that does not decode as the expected output.
    #[error("failed to decode call output: {0}")]
    Decode(String),
    /// A bounded call did not complete in time.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    /// The node rejected the transaction.
    #[error("transaction submission failed: {0}")]
    TransactionSubmit(String),
    /// The receipt was not available after the fixed confirmation delay.
    #[error("receipt not found for transaction {0}")]
    ReceiptNotFound(String),
    /// Polling for the receipt exhausted its attempt budget.
    #[error("transaction {tx_hash} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { tx_hash: String, attempts: u32 },
}

impl ChainError {
    /// Short machine-friendly label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::Config(_) => "config",
            ChainError::Connection(_) => "connection",
            ChainError::AbiParse(_) => "abi_parse",
            ChainError::ChainQuery(_) => "chain_query",
            ChainError::InvalidKey(_) => "invalid_key",
            ChainError::SignerCreation(_) => "signer_creation",
            ChainError::Call(_) => "call",
            ChainError::Decode(_) => "decode",
            ChainError::Timeout(_) => "timeout",
            ChainError::TransactionSubmit(_) => "transaction_submit",
            ChainError::ReceiptNotFound(_) => "receipt_not_found",
            ChainError::ConfirmationTimeout { .. } => "confirmation_timeout",
        }
    }

    /// Whether this error means "the receipt is not there yet".
    pub fn is_pending_receipt(&self) -> bool {
        matches!(self, ChainError::ReceiptNotFound(_))
    }
}

pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ChainError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "call timed out after 5s");

        let err = ChainError::ConfirmationTimeout {
            tx_hash: "0xabc".to_string(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "transaction 0xabc not confirmed after 3 attempts"
        );
    }

    #[test]
    fn test_pending_receipt_classification() {
        assert!(ChainError::ReceiptNotFound("0x1".into()).is_pending_receipt());
        assert!(!ChainError::Call("boom".into()).is_pending_receipt());
        assert_eq!(ChainError::AbiParse("x".into()).kind(), "abi_parse");
    }
}
