//! Token approvals for the zapper contract
//!
//! Grants the network's zapper an unlimited allowance over the input token,
//! tracks the approval while it is pending, and records the resulting
//! allowance once the node has settled.

use super::deployment::{Deployment, Deployments};
use super::types::Token;
use crate::account::AccountState;
use crate::chain::{contracts, ChainClient, NetworkContext, TxRequest};
use crate::classify::{ErrorClassifier, ErrorKind};
use crate::config::ZapConfig;
use crate::error::{ZapError, ZapResult};
use crate::metrics;
use crate::notify::{messages, Notifier};
use crate::tx::{PendingGuard, PendingTxn, PendingTxnTracker};

use ethers::types::{Address, H256, U256};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const OPERATION: &str = "approve";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved {
        tx_hash: H256,
        /// `None` when the post-approval allowance read failed
        allowance: Option<U256>,
    },
    Failed(ErrorKind),
}

pub struct ApprovalCoordinator {
    deployments: Arc<Deployments>,
    config: ZapConfig,
    tracker: Arc<dyn PendingTxnTracker>,
    notifier: Arc<dyn Notifier>,
    classifier: Arc<ErrorClassifier>,
    account: Arc<dyn AccountState>,
}

impl ApprovalCoordinator {
    pub fn new(
        deployments: Arc<Deployments>,
        config: ZapConfig,
        tracker: Arc<dyn PendingTxnTracker>,
        notifier: Arc<dyn Notifier>,
        classifier: Arc<ErrorClassifier>,
        account: Arc<dyn AccountState>,
    ) -> Self {
        Self {
            deployments,
            config,
            tracker,
            notifier,
            classifier,
            account,
        }
    }

    /// Approve the zapper to spend `token` on behalf of the context's owner
    pub async fn change_approval(&self, ctx: &NetworkContext, token: &Token) -> ApprovalOutcome {
        let client = match &ctx.client {
            Some(client) => client.clone(),
            None => {
                return ApprovalOutcome::Failed(self.classifier.report(&ZapError::WalletNotConnected))
            }
        };
        let deployment = match self.deployments.get(ctx.network) {
            Ok(d) => d,
            Err(e) => return ApprovalOutcome::Failed(self.classifier.report(&e)),
        };

        let tx_hash = match self.approve(client.as_ref(), deployment, token).await {
            Ok(hash) => hash,
            Err(e) => return ApprovalOutcome::Failed(self.classifier.report(&e)),
        };

        let settle = self.config.approval_settle();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let allowance = self
            .read_allowance(client.as_ref(), token.address, ctx.owner, deployment.zapper)
            .await;
        if let Some(allowance) = allowance {
            self.account.update_allowance(&token.name, allowance);
        }

        ApprovalOutcome::Approved { tx_hash, allowance }
    }

    async fn approve(
        &self,
        client: &dyn ChainClient,
        deployment: &Deployment,
        token: &Token,
    ) -> ZapResult<H256> {
        let gas_price = deployment.gas.gas_price(client).await?;
        let data = contracts::approve_calldata(deployment.zapper, U256::MAX)?;

        let tx_hash = client
            .send_transaction(TxRequest {
                to: token.address,
                data,
                gas_price,
            })
            .await?;
        metrics::record_tx_submitted(deployment.network, OPERATION);
        info!(
            "Approval for {} submitted: {:?} (spender {:?})",
            token.symbol, tx_hash, deployment.zapper
        );

        let _pending = PendingGuard::register(
            self.tracker.clone(),
            PendingTxn {
                hash: tx_hash,
                text: format!("Approve {}", token.name),
                kind: format!("approve_{:?}", token.address),
            },
        );

        let started = Instant::now();
        client
            .wait_for_receipt(tx_hash, self.config.confirmations)
            .await?;
        metrics::record_tx_confirmed(
            deployment.network,
            OPERATION,
            started.elapsed().as_secs_f64(),
        );

        self.notifier.report_success(messages::TX_SUCCESSFULLY_SENT);
        Ok(tx_hash)
    }

    async fn read_allowance(
        &self,
        client: &dyn ChainClient,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Option<U256> {
        match contracts::allowance(client, token, owner, spender).await {
            Ok(allowance) => {
                debug!("Allowance of {:?} over {:?}: {}", spender, token, allowance);
                Some(allowance)
            }
            Err(e) => {
                warn!("Failed to read allowance of {:?} after approval: {}", token, e);
                None
            }
        }
    }
}
