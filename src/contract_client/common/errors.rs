//! Turn node and contract errors into messages a user can act on.

use alloy::sol_types::decode_revert_reason;
use std::fmt::Display;

/// Describe a contract call error, decoding a Solidity revert reason when the
/// node returned revert data.
pub fn describe_contract_error(error: &alloy::contract::Error) -> String {
    if let Some(data) = error.as_revert_data() {
        return match decode_revert_reason(&data) {
            Some(reason) => format!("reverted: {reason}"),
            None => format!("reverted with data {data}"),
        };
    }
    describe_rpc_error(error)
}

/// Map common RPC rejection messages to a hint, otherwise pass the error through.
pub fn describe_rpc_error<E: Display>(error: E) -> String {
    let message = error.to_string();
    let lower = message.to_lowercase();

    if lower.contains("insufficient funds") {
        format!("insufficient ETH for gas, fund the sending account ({message})")
    } else if lower.contains("nonce too low") {
        format!("nonce too low, a transaction from this account was already mined ({message})")
    } else if lower.contains("replacement transaction underpriced")
        || lower.contains("already known")
    {
        format!("a pending transaction with the same nonce is blocking this one ({message})")
    } else if lower.contains("max fee per gas less than block base fee") {
        format!("gas price below the block base fee, raise the priority fee ({message})")
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_hint() {
        let err = std::io::Error::other("insufficient funds for gas * price + value");
        let described = describe_rpc_error(err);
        assert!(described.contains("insufficient ETH"));
        assert!(described.contains("gas * price"));
    }

    #[test]
    fn test_nonce_too_low_hint() {
        let described = describe_rpc_error("Nonce too low: next nonce 4, tx nonce 3");
        assert!(described.starts_with("nonce too low"));
    }

    #[test]
    fn test_underpriced_hint() {
        let described = describe_rpc_error("replacement transaction underpriced");
        assert!(described.contains("pending transaction"));
    }

    #[test]
    fn test_unknown_error_passthrough() {
        assert_eq!(describe_rpc_error("execution timeout"), "execution timeout");
    }
}
