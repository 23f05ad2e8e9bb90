//! Transaction submission support: gas pricing and pending-record lifecycle

mod gas;
mod pending;

pub use gas::GasOracle;
pub use pending::{InMemoryPendingTxns, PendingGuard, PendingTxn, PendingTxnTracker};

#[cfg(test)]
pub use pending::MockPendingTxnTracker;
