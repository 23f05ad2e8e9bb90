//! Chain module - the client seam every orchestration step talks through
//!
//! This module provides:
//! - The `ChainClient` trait (gas price, eth_call, submission, receipt wait)
//! - An ethers-backed implementation with multi-RPC failover
//! - Typed contract call helpers built from human-readable ABIs

pub mod contracts;
pub mod provider;

pub use provider::EthersClient;

use crate::error::ClientError;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use std::sync::Arc;

/// Result type for raw chain calls
pub type ClientResult<T> = Result<T, ClientError>;

/// A contract call ready to be signed and broadcast
#[derive(Debug, Clone, PartialEq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    pub gas_price: U256,
}

/// Everything the orchestration layer needs from a node and a signer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current gas price reported by the node
    async fn gas_price(&self) -> ClientResult<U256>;

    /// Read-only contract call (eth_call against latest state)
    async fn call(&self, to: Address, data: Bytes) -> ClientResult<Bytes>;

    /// Sign and broadcast, returning the transaction hash
    async fn send_transaction(&self, tx: TxRequest) -> ClientResult<H256>;

    /// Wait for the receipt; a reverted receipt is `ClientError::Reverted`
    async fn wait_for_receipt(&self, tx_hash: H256, confirmations: usize) -> ClientResult<()>;
}

/// Per-call network selection. Never retained between operations.
#[derive(Clone)]
pub struct NetworkContext {
    pub network: u64,
    /// `None` when no wallet is connected
    pub client: Option<Arc<dyn ChainClient>>,
    pub owner: Address,
}

impl NetworkContext {
    pub fn new(network: u64, client: Option<Arc<dyn ChainClient>>, owner: Address) -> Self {
        Self {
            network,
            client,
            owner,
        }
    }

    pub fn disconnected(network: u64) -> Self {
        Self::new(network, None, Address::zero())
    }
}

impl std::fmt::Debug for NetworkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkContext")
            .field("network", &self.network)
            .field("connected", &self.client.is_some())
            .field("owner", &self.owner)
            .finish()
    }
}
