use alloy::{
    consensus::TxEnvelope,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, B256},
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, utils::public_key_to_address, Signer},
};
use std::fmt;

use crate::error::{ChainError, ChainResult};

/// Account identity derived from a private key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
}

impl Account {
    /// Derive the account from a key: scalar -> verifying key -> address.
    pub fn from_signer(signer: &PrivateKeySigner) -> Self {
        let verifying_key = signer.credential().verifying_key();
        Self {
            address: public_key_to_address(verifying_key),
        }
    }
}

/// Decode a hex private key (64 hex characters, `0x` tolerated)
pub fn decode_private_key(private_key: &str) -> ChainResult<PrivateKeySigner> {
    let key = private_key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    if key.len() != 64 {
        return Err(ChainError::InvalidKey(format!(
            "expected 64 hex characters, got {}",
            key.len()
        )));
    }

    let bytes = hex::decode(key).map_err(|e| ChainError::InvalidKey(e.to_string()))?;
    PrivateKeySigner::from_bytes(&B256::from_slice(&bytes))
        .map_err(|_| ChainError::InvalidKey("not a valid secp256k1 scalar".to_string()))
}

/// Transaction signer bound to one chain id
#[derive(Clone)]
pub struct ChainSigner {
    wallet: EthereumWallet,
    address: Address,
    chain_id: u64,
}

impl fmt::Debug for ChainSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainSigner")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl ChainSigner {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> ChainResult<Self> {
        if chain_id == 0 {
            return Err(ChainError::SignerCreation(
                "chain id 0 gives no replay protection".to_string(),
            ));
        }
        let signer = signer.with_chain_id(Some(chain_id));
        let address = signer.address();
        Ok(Self {
            wallet: EthereumWallet::from(signer),
            address,
            chain_id,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a fully populated request. Requests for another chain are refused.
    pub async fn sign(&self, tx: TransactionRequest) -> ChainResult<TxEnvelope> {
        if let Some(requested) = tx.chain_id {
            if requested != self.chain_id {
                return Err(ChainError::TransactionSubmit(format!(
                    "signer is bound to chain {}, refusing to sign for chain {requested}",
                    self.chain_id
                )));
            }
        }

        tx.with_from(self.address)
            .with_chain_id(self.chain_id)
            .build(&self.wallet)
            .await
            .map_err(|e| ChainError::TransactionSubmit(format!("failed to sign: {e}")))
    }
}
