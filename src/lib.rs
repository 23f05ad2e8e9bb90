//! Bond zapper - zap-in orchestration for bonded liquidity
//!
//! Turns "swap token X into bond Y" into checked, tracked on-chain calls:
//! slippage and amount validation, routed swap paths, LP previews from live
//! reserves, approvals, and the zap-in itself with pending-record cleanup and
//! an account refresh afterwards.

pub mod account;
pub mod chain;
pub mod classify;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod tx;
pub mod zap;

pub use account::{AccountState, AccountStore, RefreshRequest};
pub use chain::{ChainClient, EthersClient, NetworkContext};
pub use classify::{ErrorClassifier, ErrorKind};
pub use config::Settings;
pub use error::{ClientError, ZapError, ZapResult};
pub use notify::{Notifier, TracingNotifier};
pub use tx::{InMemoryPendingTxns, PendingTxnTracker};
pub use zap::{
    ApprovalOutcome, Bond, Collaborators, LpEstimate, RouteSource, SwapRoute, Token, ZapOutcome,
    Zapper, ZapinQuote,
};
