//! Ethers-backed chain client with multi-RPC failover

use super::{ChainClient, ClientResult, TxRequest};
use crate::config::NetworkConfig;
use crate::error::ClientError;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Multi-provider wrapper with automatic failover and an optional signing wallet
pub struct EthersClient {
    chain_id: u64,
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
    /// Signing wallet; reads work without one
    wallet: Option<LocalWallet>,
}

impl EthersClient {
    /// Create a new client for a configured network
    pub fn new(config: &NetworkConfig, wallet: Option<LocalWallet>) -> ClientResult<Self> {
        let mut http_providers = Vec::new();

        for url in &config.rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    let provider = provider.interval(Duration::from_millis(500));
                    http_providers.push(provider);
                    debug!("Added HTTP provider for chain {}: {}", config.chain_id, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(ClientError::Transport(format!(
                "No valid RPC providers for chain {}",
                config.chain_id
            )));
        }

        let wallet = wallet.map(|w| w.with_chain_id(config.chain_id));
        if let Some(ref w) = wallet {
            info!("Signing wallet {:?} on chain {}", w.address(), config.chain_id);
        }

        Ok(Self {
            chain_id: config.chain_id,
            http_providers,
            current_provider: AtomicUsize::new(0),
            wallet,
        })
    }

    /// Load the signing wallet from `ZAPPER_PRIVATE_KEY`, if set
    pub fn wallet_from_env() -> ClientResult<Option<LocalWallet>> {
        match std::env::var("ZAPPER_PRIVATE_KEY") {
            Ok(key) => key
                .parse::<LocalWallet>()
                .map(Some)
                .map_err(|e| ClientError::Signer(format!("Invalid private key: {}", e))),
            Err(_) => Ok(None),
        }
    }

    /// Get the active HTTP provider
    pub fn http(&self) -> &Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        &self.http_providers[idx % self.http_providers.len()]
    }

    /// Switch to next available provider
    fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("Chain {} failover to provider {}", self.chain_id, next);
    }

    pub fn wallet_address(&self) -> Option<Address> {
        self.wallet.as_ref().map(|w| w.address())
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl ChainClient for EthersClient {
    async fn gas_price(&self) -> ClientResult<U256> {
        let mut last_error = None;
        for _ in 0..self.http_providers.len() {
            match self.http().get_gas_price().await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    warn!("Failed to get gas price from chain {}: {}", self.chain_id, e);
                    last_error = Some(ClientError::from_provider(e));
                    self.failover();
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ClientError::Transport("All providers failed".to_string())))
    }

    async fn call(&self, to: Address, data: Bytes) -> ClientResult<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        let mut last_error = None;
        for _ in 0..self.http_providers.len() {
            match self.http().call(&tx, None).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    let err = ClientError::from_provider(e);
                    // A revert is an answer, not a provider fault
                    if !matches!(err, ClientError::Transport(_)) {
                        return Err(err);
                    }
                    warn!("eth_call to {:?} failed on chain {}: {}", to, self.chain_id, err);
                    last_error = Some(err);
                    self.failover();
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ClientError::Transport("All providers failed".to_string())))
    }

    async fn send_transaction(&self, request: TxRequest) -> ClientResult<H256> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| ClientError::Signer("No signing wallet configured".to_string()))?;
        let from = wallet.address();

        let nonce = self
            .http()
            .get_transaction_count(from, Some(BlockNumber::Pending.into()))
            .await?;

        let mut tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(request.to)
            .data(request.data)
            .gas_price(request.gas_price)
            .nonce(nonce)
            .chain_id(self.chain_id)
            .into();

        let gas = self.http().estimate_gas(&tx, None).await?;
        tx.set_gas(gas);

        let signature = wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| ClientError::Signer(e.to_string()))?;

        let pending = self
            .http()
            .send_raw_transaction(tx.rlp_signed(&signature))
            .await?;
        let tx_hash = pending.tx_hash();

        info!(
            "Transaction sent: {:?} to {:?} on chain {} (nonce {})",
            tx_hash, request.to, self.chain_id, nonce
        );
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256, confirmations: usize) -> ClientResult<()> {
        let receipt = PendingTransaction::new(tx_hash, self.http())
            .confirmations(confirmations)
            .await?
            .ok_or(ClientError::Dropped(tx_hash))?;

        if receipt.status == Some(U64::from(1)) {
            debug!(
                "Transaction {:?} confirmed in block {:?}",
                tx_hash, receipt.block_number
            );
            Ok(())
        } else {
            Err(ClientError::Reverted {
                tx_hash,
                reason: None,
            })
        }
    }
}
