use alloy::{
    contract::{ContractInstance, Interface},
    dyn_abi::DynSolValue,
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider},
};
use tracing::info;

use crate::abi::{StorageAbi, STORE};
use crate::connection::ChainConnection;
use crate::error::{ChainError, ChainResult};
use crate::wallet::{decode_private_key, Account, ChainSigner};

pub mod common;
pub mod confirmation;
pub mod reader;

pub use common::tx_submitter::FeePolicy;
use common::tx_submitter::TransactionSubmitter;

/// Dynamic contract handle: address + parsed ABI + provider.
pub type StorageContract = ContractInstance<DynProvider>;

/// Everything needed to call and transact against the storage contract.
///
/// Built atomically by [`StorageBinding::bind`]: either every part is
/// produced or none is.
#[derive(Clone)]
pub struct StorageBinding {
    pub contract: StorageContract,
    pub abi: StorageAbi,
    pub account: Account,
    pub signer: ChainSigner,
}

impl StorageBinding {
    /// Parse the ABI, bind it to `contract_address`, and build a signer for the
    /// connected chain from `private_key`.
    ///
    /// The ABI is validated before any request reaches the node.
    pub async fn bind(
        connection: &ChainConnection,
        contract_address: Address,
        abi_json: &str,
        private_key: &str,
    ) -> ChainResult<Self> {
        let abi = StorageAbi::parse(abi_json)?;
        let contract = ContractInstance::new(
            contract_address,
            connection.provider().clone(),
            Interface::new(abi.json_abi().clone()),
        );

        let chain_id = connection
            .provider()
            .get_chain_id()
            .await
            .map_err(|e| ChainError::ChainQuery(format!("failed to fetch chain id: {e}")))?;

        let key = decode_private_key(private_key)?;
        let account = Account::from_signer(&key);
        let signer = ChainSigner::new(key, chain_id)?;

        info!(
            contract = %contract_address,
            account = %account.address,
            chain_id,
            "Bound storage contract"
        );

        Ok(Self {
            contract,
            abi,
            account,
            signer,
        })
    }

    /// Get the contract address
    pub fn address(&self) -> Address {
        *self.contract.address()
    }

    /// Get the signer address
    pub fn signer_address(&self) -> Address {
        self.account.address
    }

    pub fn chain_id(&self) -> u64 {
        self.signer.chain_id()
    }

    /// Submit `store(value)` and return the transaction hash.
    pub async fn store(&self, value: U256, fees: FeePolicy) -> ChainResult<B256> {
        let call = self
            .contract
            .function(STORE, &[DynSolValue::Uint(value, 256)])
            .map_err(|e| ChainError::TransactionSubmit(format!("failed to encode store: {e}")))?;
        TransactionSubmitter::new(fees)
            .invoke(STORE, call, &self.signer)
            .await
    }
}
