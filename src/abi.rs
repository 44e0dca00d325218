use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi, StateMutability};
use alloy::primitives::{Bytes, U256};
use serde_json::Value;

use crate::error::{ChainError, ChainResult};

/// ABI of the storage contract: `retrieve() view returns (uint256)` and
/// `store(uint256 num)`.
pub const STORAGE_ABI: &str = r#"
[
	{
		"inputs": [],
		"name": "retrieve",
		"outputs": [
			{
				"internalType": "uint256",
				"name": "",
				"type": "uint256"
			}
		],
		"stateMutability": "view",
		"type": "function"
	},
	{
		"inputs": [
			{
				"internalType": "uint256",
				"name": "num",
				"type": "uint256"
			}
		],
		"name": "store",
		"outputs": [],
		"stateMutability": "nonpayable",
		"type": "function"
	}
]"#;

pub const RETRIEVE: &str = "retrieve";
pub const STORE: &str = "store";

/// Parsed and validated storage contract ABI.
#[derive(Debug, Clone)]
pub struct StorageAbi {
    abi: JsonAbi,
    retrieve: Function,
    store: Function,
}

impl StorageAbi {
    /// Parse the built-in [`STORAGE_ABI`].
    pub fn storage() -> ChainResult<Self> {
        Self::parse(STORAGE_ABI)
    }

    /// Parse ABI JSON and check that it describes exactly the two storage functions.
    pub fn parse(json: &str) -> ChainResult<Self> {
        let raw: Value =
            serde_json::from_str(json).map_err(|e| ChainError::AbiParse(e.to_string()))?;
        let entries = raw
            .as_array()
            .ok_or_else(|| ChainError::AbiParse("ABI must be a JSON array".to_string()))?;

        // Solidity allows omitting "type"; we don't, so a truncated schema cannot
        // silently turn into a function.
        for (index, entry) in entries.iter().enumerate() {
            match entry.get("type") {
                Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(ChainError::AbiParse(format!(
                        "entry {index} has a non-string \"type\""
                    )))
                }
                None => {
                    return Err(ChainError::AbiParse(format!(
                        "entry {index} is missing \"type\""
                    )))
                }
            }
        }

        let abi: JsonAbi =
            serde_json::from_value(raw).map_err(|e| ChainError::AbiParse(e.to_string()))?;

        let function_count = abi.functions().count();
        if function_count != 2 {
            return Err(ChainError::AbiParse(format!(
                "expected 2 functions, found {function_count}"
            )));
        }

        let retrieve = single_function(&abi, RETRIEVE)?;
        expect_shape(&retrieve, "retrieve()", &["uint256"])?;
        if !matches!(
            retrieve.state_mutability,
            StateMutability::View | StateMutability::Pure
        ) {
            return Err(ChainError::AbiParse(
                "retrieve must be a view function".to_string(),
            ));
        }

        let store = single_function(&abi, STORE)?;
        expect_shape(&store, "store(uint256)", &[])?;
        if store.state_mutability != StateMutability::NonPayable {
            return Err(ChainError::AbiParse(
                "store must be nonpayable".to_string(),
            ));
        }

        Ok(Self {
            abi,
            retrieve,
            store,
        })
    }

    pub fn json_abi(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn retrieve(&self) -> &Function {
        &self.retrieve
    }

    pub fn store(&self) -> &Function {
        &self.store
    }

    /// Calldata for `retrieve()`.
    pub fn encode_retrieve(&self) -> ChainResult<Bytes> {
        self.retrieve
            .abi_encode_input(&[])
            .map(Bytes::from)
            .map_err(|e| ChainError::Decode(format!("failed to encode retrieve: {e}")))
    }

    /// Decode the return data of `retrieve()`.
    pub fn decode_retrieve(&self, data: &[u8]) -> ChainResult<U256> {
        if data.is_empty() {
            return Err(ChainError::Decode(
                "empty response, is there a contract at this address?".to_string(),
            ));
        }
        let values = self
            .retrieve
            .abi_decode_output(data)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        first_uint(&values)
    }

    /// Calldata for `store(value)`.
    pub fn encode_store(&self, value: U256) -> ChainResult<Bytes> {
        self.store
            .abi_encode_input(&[DynSolValue::Uint(value, 256)])
            .map(Bytes::from)
            .map_err(|e| ChainError::TransactionSubmit(format!("failed to encode store: {e}")))
    }

    /// Recover the argument from `store` calldata.
    pub fn decode_store(&self, calldata: &[u8]) -> ChainResult<U256> {
        let selector = self.store.selector();
        let Some(args) = calldata.strip_prefix(selector.as_slice()) else {
            return Err(ChainError::Decode(
                "calldata does not start with the store selector".to_string(),
            ));
        };
        let values = self
            .store
            .abi_decode_input(args)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        first_uint(&values)
    }
}

/// First value of a decoded output list, as a `uint256`.
pub fn first_uint(values: &[DynSolValue]) -> ChainResult<U256> {
    match values.first() {
        Some(value) => value
            .as_uint()
            .map(|(n, _)| n)
            .ok_or_else(|| ChainError::Decode(format!("expected uint256, got {value:?}"))),
        None => Err(ChainError::Decode("call returned no values".to_string())),
    }
}

fn single_function(abi: &JsonAbi, name: &str) -> ChainResult<Function> {
    match abi.function(name).map(Vec::as_slice) {
        Some([function]) => Ok(function.clone()),
        Some(_) => Err(ChainError::AbiParse(format!(
            "function {name} is overloaded"
        ))),
        None => Err(ChainError::AbiParse(format!("function {name} not found"))),
    }
}

fn expect_shape(function: &Function, signature: &str, outputs: &[&str]) -> ChainResult<()> {
    let actual = function.signature();
    if actual != signature {
        return Err(ChainError::AbiParse(format!(
            "expected {signature}, found {actual}"
        )));
    }
    let actual_outputs: Vec<&str> = function.outputs.iter().map(|p| p.ty.as_str()).collect();
    if actual_outputs != outputs {
        return Err(ChainError::AbiParse(format!(
            "{signature} must return ({}), found ({})",
            outputs.join(","),
            actual_outputs.join(",")
        )));
    }
    Ok(())
}
