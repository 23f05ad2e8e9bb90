//! Zap-in submission
//!
//! Every precondition (wallet, slippage, amount, bond addresses, paths) is
//! checked before anything reaches the network. Once submitted, the zap is
//! tracked as pending until its receipt is observed, and a confirmed zap
//! schedules an account refresh that runs on its own task.

use super::amount::to_base_units;
use super::deployment::Deployments;
use super::path::SwapPathResolver;
use super::slippage::accepted_slippage;
use super::types::{Bond, Token};
use crate::account::{AccountState, RefreshRequest};
use crate::chain::contracts::ZapinCall;
use crate::chain::{ChainClient, NetworkContext, TxRequest};
use crate::classify::{ErrorClassifier, ErrorKind};
use crate::config::ZapConfig;
use crate::error::{ZapError, ZapResult};
use crate::metrics;
use crate::notify::{messages, Notifier};
use crate::tx::{PendingGuard, PendingTxn, PendingTxnTracker};

use ethers::types::{Address, H256};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const OPERATION: &str = "zapin";

#[derive(Debug)]
pub enum ZapOutcome {
    Confirmed {
        tx_hash: H256,
        /// Post-zap account refresh; completes on its own if not awaited
        refresh: JoinHandle<()>,
    },
    Failed(ErrorKind),
}

impl ZapOutcome {
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            ZapOutcome::Confirmed { tx_hash, .. } => Some(*tx_hash),
            ZapOutcome::Failed(_) => None,
        }
    }
}

/// A zap-in with every precondition resolved
#[derive(Debug)]
struct PreparedZap {
    call: ZapinCall,
    zapper: Address,
    deposit: Address,
    slippage: f64,
}

pub struct ZapinExecutor {
    deployments: Arc<Deployments>,
    paths: Arc<SwapPathResolver>,
    config: ZapConfig,
    tracker: Arc<dyn PendingTxnTracker>,
    notifier: Arc<dyn Notifier>,
    classifier: Arc<ErrorClassifier>,
    account: Arc<dyn AccountState>,
}

impl ZapinExecutor {
    pub fn new(
        deployments: Arc<Deployments>,
        paths: Arc<SwapPathResolver>,
        config: ZapConfig,
        tracker: Arc<dyn PendingTxnTracker>,
        notifier: Arc<dyn Notifier>,
        classifier: Arc<ErrorClassifier>,
        account: Arc<dyn AccountState>,
    ) -> Self {
        Self {
            deployments,
            paths,
            config,
            tracker,
            notifier,
            classifier,
            account,
        }
    }

    pub async fn zapin_mint(
        &self,
        ctx: &NetworkContext,
        bond: &Bond,
        token: &Token,
        value: &str,
        slippage: Option<f64>,
    ) -> ZapOutcome {
        let client = match &ctx.client {
            Some(client) => client.clone(),
            None => {
                return ZapOutcome::Failed(self.classifier.report(&ZapError::WalletNotConnected))
            }
        };

        let prepared = match self.prepare(ctx.network, bond, token, value, slippage) {
            Ok(p) => p,
            Err(e) => return ZapOutcome::Failed(self.classifier.report(&e)),
        };

        let submitted = self
            .submit(client.as_ref(), ctx.network, bond, token, &prepared)
            .await;
        let tx_hash = match submitted {
            Ok(hash) => hash,
            Err(e) => return ZapOutcome::Failed(self.classifier.report(&e)),
        };

        let refresh = self.spawn_refresh(RefreshRequest {
            address: ctx.owner,
            bond: bond.clone(),
            network: ctx.network,
            deposit: prepared.deposit,
            client,
        });

        ZapOutcome::Confirmed { tx_hash, refresh }
    }

    fn prepare(
        &self,
        network: u64,
        bond: &Bond,
        token: &Token,
        value: &str,
        slippage: Option<f64>,
    ) -> ZapResult<PreparedZap> {
        let slippage = accepted_slippage(slippage).map_err(ZapError::SlippageOutOfRange)?;
        let amount = to_base_units(value, token.decimals)?;
        let deployment = self.deployments.get(network)?;

        let deposit = bond
            .deposit_address(network)
            .ok_or_else(|| ZapError::UnknownBondRoute {
                network,
                bond: bond.name.clone(),
                address: None,
            })?;
        let deadline = deadline(self.config.deadline_offset_secs);
        let paths = self.paths.resolve(network, bond, token)?;

        Ok(PreparedZap {
            call: ZapinCall {
                from_token: token.address,
                amount,
                path: paths.primary,
                hop1: paths.hop1,
                hop2: paths.hop2,
                version: deployment.protocol_version,
                deadline,
            },
            zapper: deployment.zapper,
            deposit,
            slippage,
        })
    }

    async fn submit(
        &self,
        client: &dyn ChainClient,
        network: u64,
        bond: &Bond,
        token: &Token,
        prepared: &PreparedZap,
    ) -> ZapResult<H256> {
        let deployment = self.deployments.get(network)?;
        let gas_price = deployment.gas.gas_price(client).await?;
        let data = prepared.call.calldata()?;

        debug!(
            "Zapin {} {} into {} (slippage {}, deadline {})",
            prepared.call.amount, token.symbol, bond.name, prepared.slippage, prepared.call.deadline
        );

        let tx_hash = client
            .send_transaction(TxRequest {
                to: prepared.zapper,
                data,
                gas_price,
            })
            .await?;
        metrics::record_tx_submitted(network, OPERATION);
        info!("Zapin into {} submitted: {:?}", bond.name, tx_hash);

        let _pending = PendingGuard::register(
            self.tracker.clone(),
            PendingTxn {
                hash: tx_hash,
                text: format!("Zapin {}", token.name),
                kind: format!("zapin_{}_{}", token.name, bond.name),
            },
        );

        let started = Instant::now();
        client
            .wait_for_receipt(tx_hash, self.config.confirmations)
            .await?;
        metrics::record_tx_confirmed(network, OPERATION, started.elapsed().as_secs_f64());

        info!("Zapin into {} confirmed: {:?}", bond.name, tx_hash);
        self.notifier.report_success(messages::TX_SUCCESSFULLY_SENT);
        Ok(tx_hash)
    }

    fn spawn_refresh(&self, request: RefreshRequest) -> JoinHandle<()> {
        let account = self.account.clone();
        let settle = self.config.refresh_settle();

        tokio::spawn(async move {
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
            let bond = request.bond.name.clone();
            match account.refresh(request).await {
                Ok(()) => debug!("Refreshed account details for {}", bond),
                Err(e) => error!("Account refresh after zap into {} failed: {}", bond, e),
            }
        })
    }
}

/// Unix seconds `offset` from now
fn deadline(offset: u64) -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64 + offset
}
