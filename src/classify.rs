//! Maps wallet and node failures onto user-facing categories.
//!
//! Every component that submits transactions routes its failures through
//! [`ErrorClassifier::report`], which dispatches exactly one notification per
//! error and never re-raises.

use crate::error::{ClientError, SlippageViolation, ZapError};
use crate::notify::{messages, Notifier};

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// JSON-RPC / EIP-1193 code for a request the user declined in the wallet
const USER_REJECTED_CODE: i64 = 4001;

/// User-relevant failure category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ErrorKind {
    WalletNotConnected,
    SlippageOutOfRange(String),
    InvalidAmount,
    UnknownBondRoute,
    Config,
    UserRejected,
    InsufficientFunds,
    ContractReverted(Option<String>),
    NetworkError,
    Unknown,
}

impl ErrorKind {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::WalletNotConnected => "wallet_not_connected",
            ErrorKind::SlippageOutOfRange(_) => "slippage_out_of_range",
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::UnknownBondRoute => "unknown_bond_route",
            ErrorKind::Config => "config",
            ErrorKind::UserRejected => "user_rejected",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::ContractReverted(_) => "contract_reverted",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// Pure classification of a failure
pub fn classify(err: &ZapError) -> ErrorKind {
    match err {
        ZapError::WalletNotConnected => ErrorKind::WalletNotConnected,
        ZapError::SlippageOutOfRange(v) => ErrorKind::SlippageOutOfRange(v.to_string()),
        ZapError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
        ZapError::UnknownBondRoute { .. } => ErrorKind::UnknownBondRoute,
        ZapError::Config(_) => ErrorKind::Config,
        ZapError::Contract(_) => ErrorKind::Unknown,
        ZapError::Client(client) => classify_client(client),
    }
}

fn classify_client(err: &ClientError) -> ErrorKind {
    match err {
        ClientError::Reverted { reason, .. } => ErrorKind::ContractReverted(reason.clone()),
        ClientError::Dropped(_) | ClientError::Transport(_) | ClientError::Timeout { .. } => {
            ErrorKind::NetworkError
        }
        ClientError::Rpc { code, message } => {
            if *code == Some(USER_REJECTED_CODE) {
                return ErrorKind::UserRejected;
            }
            classify_message(message)
        }
        ClientError::Signer(message) => classify_message(message),
        ClientError::Abi(_) => ErrorKind::Unknown,
    }
}

fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();

    if lower.contains("user rejected") || lower.contains("user denied") {
        ErrorKind::UserRejected
    } else if lower.contains("insufficient funds") {
        ErrorKind::InsufficientFunds
    } else if let Some(idx) = lower.find("execution reverted") {
        // Keep the reason's original casing when lowercasing preserved byte offsets
        let source = if message.len() == lower.len() { message } else { lower.as_str() };
        let rest = source
            .get(idx + "execution reverted".len()..)
            .unwrap_or_default()
            .trim_start_matches(':')
            .trim();
        let reason = (!rest.is_empty()).then(|| rest.to_string());
        ErrorKind::ContractReverted(reason)
    } else if ["timeout", "timed out", "connect", "network"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        ErrorKind::NetworkError
    } else {
        ErrorKind::Unknown
    }
}

/// Turns failures into exactly one user-facing report each
#[derive(Clone)]
pub struct ErrorClassifier {
    notifier: Arc<dyn Notifier>,
}

impl ErrorClassifier {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Classify `err`, dispatch its report and return the category
    pub fn report(&self, err: &ZapError) -> ErrorKind {
        let kind = classify(err);
        warn!("{} ({})", err, kind.label());
        crate::metrics::record_failure(kind.label());

        match &kind {
            ErrorKind::UserRejected => self.notifier.report_info(messages::TX_REJECTED),
            ErrorKind::WalletNotConnected => {
                self.notifier.report_warning(messages::PLEASE_CONNECT_WALLET)
            }
            ErrorKind::SlippageOutOfRange(_) => {
                let text = match err {
                    ZapError::SlippageOutOfRange(SlippageViolation::TooBig) => {
                        messages::SLIPPAGE_TOO_BIG
                    }
                    _ => messages::SLIPPAGE_TOO_SMALL,
                };
                self.notifier.report_warning(text)
            }
            ErrorKind::InvalidAmount => self.notifier.report_warning(messages::INVALID_AMOUNT),
            ErrorKind::UnknownBondRoute => {
                self.notifier.report_warning(messages::UNSUPPORTED_BOND)
            }
            ErrorKind::InsufficientFunds => {
                self.notifier.report_warning(messages::INSUFFICIENT_FUNDS)
            }
            ErrorKind::ContractReverted(Some(reason)) => self
                .notifier
                .report_warning(&format!("{}: {}", messages::CONTRACT_REVERTED, reason)),
            ErrorKind::ContractReverted(None) => {
                self.notifier.report_warning(messages::CONTRACT_REVERTED)
            }
            ErrorKind::NetworkError => self.notifier.report_warning(messages::NETWORK_ERROR),
            ErrorKind::Config | ErrorKind::Unknown => {
                self.notifier.report_warning(messages::SOMETHING_WRONG)
            }
        }

        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockNotifier;
    use ethers::types::H256;

    fn rpc(code: Option<i64>, message: &str) -> ZapError {
        ZapError::Client(ClientError::Rpc {
            code,
            message: message.to_string(),
        })
    }

    #[test]
    fn test_user_rejection_by_code_and_message() {
        assert_eq!(classify(&rpc(Some(4001), "denied")), ErrorKind::UserRejected);
        assert_eq!(
            classify(&rpc(None, "MetaMask Tx Signature: User denied transaction signature.")),
            ErrorKind::UserRejected
        );
    }

    #[test]
    fn test_revert_reason_extraction() {
        assert_eq!(
            classify(&rpc(Some(3), "execution reverted: Slippage exceeded")),
            ErrorKind::ContractReverted(Some("Slippage exceeded".into()))
        );
        assert_eq!(
            classify(&rpc(Some(-32000), "execution reverted")),
            ErrorKind::ContractReverted(None)
        );
        let receipt = ZapError::Client(ClientError::Reverted {
            tx_hash: H256::zero(),
            reason: None,
        });
        assert_eq!(classify(&receipt), ErrorKind::ContractReverted(None));
    }

    #[test]
    fn test_funds_network_unknown() {
        assert_eq!(
            classify(&rpc(Some(-32000), "insufficient funds for gas * price + value")),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            classify(&ZapError::Client(ClientError::Transport("tcp connect error".into()))),
            ErrorKind::NetworkError
        );
        assert_eq!(
            classify(&ZapError::Client(ClientError::Dropped(H256::zero()))),
            ErrorKind::NetworkError
        );
        assert_eq!(classify(&rpc(None, "nonce too low")), ErrorKind::Unknown);
    }

    #[test]
    fn test_report_dispatches_exactly_once() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text == "Transaction reverted: paused")
            .times(1)
            .return_const(());
        notifier.expect_report_info().never();
        notifier.expect_report_success().never();

        let classifier = ErrorClassifier::new(Arc::new(notifier));
        let kind = classifier.report(&rpc(Some(3), "execution reverted: paused"));
        assert_eq!(kind, ErrorKind::ContractReverted(Some("paused".into())));
    }

    #[test]
    fn test_rejection_reported_as_info() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_info()
            .withf(|text| text == messages::TX_REJECTED)
            .times(1)
            .return_const(());
        notifier.expect_report_warning().never();

        let classifier = ErrorClassifier::new(Arc::new(notifier));
        assert_eq!(
            classifier.report(&rpc(Some(4001), "User rejected the request.")),
            ErrorKind::UserRejected
        );
    }

    #[test]
    fn test_slippage_messages() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text == messages::SLIPPAGE_TOO_BIG)
            .times(1)
            .return_const(());

        let classifier = ErrorClassifier::new(Arc::new(notifier));
        classifier.report(&ZapError::SlippageOutOfRange(SlippageViolation::TooBig));
    }
}
