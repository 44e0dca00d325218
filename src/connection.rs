use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use std::time::Duration;
use tracing::info;

use crate::error::{ChainError, ChainResult};

/// Connection to a chain node.
///
/// The underlying transport is released when the connection is closed or
/// dropped, whichever comes first.
pub struct ChainConnection {
    provider: DynProvider,
    endpoint: String,
}

impl ChainConnection {
    /// Connect to `rpc_url` and probe the node with `eth_blockNumber`.
    ///
    /// The transport is picked from the URL scheme (`http(s)://`, `ws(s)://`,
    /// or an IPC path). A node that does not answer the probe within
    /// `probe_timeout` counts as unreachable.
    pub async fn connect(rpc_url: &str, probe_timeout: Duration) -> ChainResult<Self> {
        let endpoint = rpc_url.trim();
        if endpoint.is_empty() {
            return Err(ChainError::Connection("RPC URL is empty".to_string()));
        }

        // Build a plain provider: signing happens explicitly through ChainSigner,
        // and nonce/gas are filled by the transaction submitter.
        let provider: DynProvider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect(endpoint)
            .await
            .map_err(|e| ChainError::Connection(format!("{endpoint}: {e}")))?
            .erased();

        let block_number = match tokio::time::timeout(probe_timeout, provider.get_block_number())
            .await
        {
            Ok(Ok(block_number)) => block_number,
            Ok(Err(e)) => {
                return Err(ChainError::Connection(format!("{endpoint}: {e}")));
            }
            Err(_) => {
                return Err(ChainError::Connection(format!(
                    "{endpoint}: no response within {probe_timeout:?}"
                )));
            }
        };

        info!(endpoint, block_number, "Connected to chain node");
        Ok(Self {
            provider,
            endpoint: endpoint.to_string(),
        })
    }

    /// Wrap an already-built provider without probing it.
    pub fn from_provider(provider: DynProvider, endpoint: impl Into<String>) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
        }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Release the connection. Dropping it releases the transport too, without
    /// the log line.
    pub fn close(self) {
        info!(endpoint = %self.endpoint, "Closing connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mocked_connection, ANVIL_CHAIN_ID};
    use alloy::transports::mock::Asserter;

    #[tokio::test]
    async fn test_close_leaves_shared_provider_usable() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x7a69");
        let connection = mocked_connection(&asserter);
        let provider = connection.provider().clone();

        connection.close();

        assert_eq!(provider.get_chain_id().await.unwrap(), ANVIL_CHAIN_ID);
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let err = ChainConnection::connect("  ", Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ChainError::Connection(_)));
    }

    #[tokio::test]
    async fn test_malformed_url_rejected() {
        let err = ChainConnection::connect("http://", Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ChainError::Connection(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_rejected() {
        // Port 9 (discard) is closed on test machines; the probe fails fast.
        let err = ChainConnection::connect("http://127.0.0.1:9", Duration::from_secs(5))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ChainError::Connection(_)));
    }
}
