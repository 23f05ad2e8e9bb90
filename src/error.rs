//! Error types for the zap-in orchestration layer

use ethers::providers::{ProviderError, RpcError};
use ethers::types::{Address, H256};
use thiserror::Error;

/// Raw failures coming out of a chain client (node, wallet, transport)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("RPC error{}: {message}", code.map(|c| format!(" {}", c)).unwrap_or_default())]
    Rpc { code: Option<i64>, message: String },

    #[error("Transaction {tx_hash:?} reverted{}", reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    Reverted {
        tx_hash: H256,
        reason: Option<String>,
    },

    #[error("Transaction {0:?} dropped from mempool")]
    Dropped(H256),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("ABI error: {0}")]
    Abi(String),
}

impl ClientError {
    /// Convert an ethers provider error, keeping the JSON-RPC code when the node sent one
    pub fn from_provider(err: ProviderError) -> Self {
        if let Some(resp) = err.as_error_response() {
            return ClientError::Rpc {
                code: Some(resp.code),
                message: resp.message.clone(),
            };
        }
        match err {
            ProviderError::HTTPError(e) => ClientError::Transport(e.to_string()),
            ProviderError::JsonRpcClientError(e) => ClientError::Transport(e.to_string()),
            other => ClientError::Rpc {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        ClientError::from_provider(err)
    }
}

/// Which slippage bound a rejected value crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlippageViolation {
    TooSmall,
    TooBig,
}

impl std::fmt::Display for SlippageViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlippageViolation::TooSmall => write!(f, "too small"),
            SlippageViolation::TooBig => write!(f, "too big"),
        }
    }
}

/// Main error type for the orchestration layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZapError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Slippage {0}")]
    SlippageOutOfRange(SlippageViolation),

    #[error("Invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: String },

    #[error("No swap route configured for bond {bond} ({address:?}) on network {network}")]
    UnknownBondRoute {
        network: u64,
        bond: String,
        address: Option<Address>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ZapError {
    /// Errors detected before anything was sent to the network
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ZapError::WalletNotConnected
                | ZapError::SlippageOutOfRange(_)
                | ZapError::InvalidAmount { .. }
                | ZapError::UnknownBondRoute { .. }
                | ZapError::Config(_)
        )
    }

    /// Check if the failure may succeed when the user tries again unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ZapError::Client(ClientError::Transport(_))
                | ZapError::Client(ClientError::Timeout { .. })
                | ZapError::Client(ClientError::Dropped(_))
        )
    }
}

/// Result type for orchestration operations
pub type ZapResult<T> = Result<T, ZapError>;
