//! User-facing notification channel

use tracing::{info, warn};

/// Message texts shown to the user
pub mod messages {
    pub const PLEASE_CONNECT_WALLET: &str = "Please connect your wallet!";
    pub const SLIPPAGE_TOO_SMALL: &str = "Slippage too small";
    pub const SLIPPAGE_TOO_BIG: &str = "Slippage too big";
    pub const TX_SUCCESSFULLY_SENT: &str = "Your transaction was successfully sent";
    pub const TX_REJECTED: &str = "Transaction was rejected";
    pub const INSUFFICIENT_FUNDS: &str = "Insufficient funds for gas or transfer amount";
    pub const CONTRACT_REVERTED: &str = "Transaction reverted";
    pub const NETWORK_ERROR: &str = "Network error, please try again";
    pub const SOMETHING_WRONG: &str = "Something went wrong";
    pub const INVALID_AMOUNT: &str = "Please enter a valid amount";
    pub const UNSUPPORTED_BOND: &str = "Zap is not available for this bond";
}

/// Fire-and-forget report sink; nothing it returns is consumed
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn report_success(&self, text: &str);
    fn report_warning(&self, text: &str);
    fn report_info(&self, text: &str);
}

/// Notifier that writes reports to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn report_success(&self, text: &str) {
        info!(target: "bond_zapper::notify", "success: {}", text);
    }

    fn report_warning(&self, text: &str) {
        warn!(target: "bond_zapper::notify", "warning: {}", text);
    }

    fn report_info(&self, text: &str) {
        info!(target: "bond_zapper::notify", "info: {}", text);
    }
}
