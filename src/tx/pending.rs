//! Pending transaction records
//!
//! A record is registered as soon as a transaction hash is known and cleared
//! exactly once when the guard owning it goes out of scope, whatever path the
//! submitting operation took to get there.

use dashmap::DashMap;
use ethers::types::H256;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// A submitted, not yet confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTxn {
    pub hash: H256,
    /// Human label, e.g. "Approve BUSD"
    pub text: String,
    /// Grouping tag, e.g. "approve_0x..." or "zapin_BUSD_UFX-BNB"
    pub kind: String,
}

/// External record of in-flight transactions, keyed by hash
#[cfg_attr(test, mockall::automock)]
pub trait PendingTxnTracker: Send + Sync {
    fn register(&self, txn: PendingTxn);
    fn clear(&self, hash: H256);
}

/// Registers a pending record on creation and clears it on drop
pub struct PendingGuard {
    tracker: Arc<dyn PendingTxnTracker>,
    hash: H256,
}

impl PendingGuard {
    pub fn register(tracker: Arc<dyn PendingTxnTracker>, txn: PendingTxn) -> Self {
        let hash = txn.hash;
        debug!("Tracking pending {:?} ({})", hash, txn.kind);
        tracker.register(txn);
        crate::metrics::record_pending_delta(1.0);
        Self { tracker, hash }
    }

    pub fn hash(&self) -> H256 {
        self.hash
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        debug!("Clearing pending {:?}", self.hash);
        self.tracker.clear(self.hash);
        crate::metrics::record_pending_delta(-1.0);
    }
}

/// In-process tracker for the operator binary and embedding services
#[derive(Default)]
pub struct InMemoryPendingTxns {
    txns: DashMap<H256, PendingTxn>,
}

impl InMemoryPendingTxns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.txns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    pub fn get(&self, hash: &H256) -> Option<PendingTxn> {
        self.txns.get(hash).map(|t| t.clone())
    }

    /// Snapshot of every record carrying the given kind
    pub fn by_kind(&self, kind: &str) -> Vec<PendingTxn> {
        self.txns
            .iter()
            .filter(|e| e.value().kind == kind)
            .map(|e| e.value().clone())
            .collect()
    }
}

impl PendingTxnTracker for InMemoryPendingTxns {
    fn register(&self, txn: PendingTxn) {
        if let Some(previous) = self.txns.insert(txn.hash, txn) {
            warn!("Pending record {:?} registered twice", previous.hash);
        }
    }

    fn clear(&self, hash: H256) {
        if self.txns.remove(&hash).is_none() {
            warn!("Cleared unknown pending record {:?}", hash);
        }
    }
}
