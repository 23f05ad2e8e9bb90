//! Zap-in orchestration
//!
//! This module provides:
//! - Slippage and amount validation
//! - Swap path resolution from the configured routing table
//! - LP output previews from live pool reserves
//! - Approval and zap-in submission with pending tracking
//! - The `Zapper` facade bundling all of the above

mod amount;
mod approval;
mod deployment;
mod executor;
mod path;
mod quote;
mod slippage;
mod types;
mod valuation;

#[cfg(test)]
pub(crate) mod testing;

pub use amount::to_base_units;
pub use approval::{ApprovalCoordinator, ApprovalOutcome};
pub use deployment::{Deployment, Deployments};
pub use executor::{ZapOutcome, ZapinExecutor};
pub use path::{HopPaths, SwapPathResolver, SwapPaths};
pub use quote::{RouteKind, RouteQuoter, RouteRequest, RouteSource};
pub use slippage::{accepted_slippage, DEFAULT_SLIPPAGE, MAX_SLIPPAGE, MIN_SLIPPAGE};
pub use types::{Bond, BondAddresses, SwapRoute, Token, ZapinQuote};
pub use valuation::{LpEstimate, LpValuationEngine, ValuationBranch};

#[cfg(test)]
pub use quote::MockRouteSource;

use crate::account::AccountState;
use crate::chain::NetworkContext;
use crate::classify::ErrorClassifier;
use crate::config::Settings;
use crate::error::ZapError;
use crate::notify::Notifier;
use crate::tx::PendingTxnTracker;

use std::sync::Arc;
use tracing::info;

/// External collaborators the zapper reports into
#[derive(Clone)]
pub struct Collaborators {
    pub tracker: Arc<dyn PendingTxnTracker>,
    pub notifier: Arc<dyn Notifier>,
    pub account: Arc<dyn AccountState>,
    /// Swap-route provider; route quotes fail as misconfigured without one
    pub routes: Option<Arc<dyn RouteSource>>,
}

/// One handle over every zap-in operation, built from configuration
pub struct Zapper {
    classifier: Arc<ErrorClassifier>,
    quoter: RouteQuoter,
    valuation: LpValuationEngine,
    approvals: ApprovalCoordinator,
    executor: ZapinExecutor,
}

impl Zapper {
    pub fn new(settings: &Settings, collaborators: Collaborators) -> Self {
        let deployments = Arc::new(Deployments::from_settings(settings));
        let paths = Arc::new(SwapPathResolver::from_settings(settings));
        let classifier = Arc::new(ErrorClassifier::new(collaborators.notifier.clone()));

        info!(
            "Zapper ready for networks {:?}",
            settings
                .enabled_networks()
                .iter()
                .map(|(_, n)| n.chain_id)
                .collect::<Vec<_>>()
        );

        Self {
            quoter: RouteQuoter::new(collaborators.routes, classifier.clone()),
            valuation: LpValuationEngine::new(deployments.clone()),
            approvals: ApprovalCoordinator::new(
                deployments.clone(),
                settings.zap.clone(),
                collaborators.tracker.clone(),
                collaborators.notifier.clone(),
                classifier.clone(),
                collaborators.account.clone(),
            ),
            executor: ZapinExecutor::new(
                deployments,
                paths,
                settings.zap.clone(),
                collaborators.tracker,
                collaborators.notifier,
                classifier.clone(),
                collaborators.account,
            ),
            classifier,
        }
    }

    /// Swap route for a zap-in; neutral on any failure
    pub async fn calc_zapin_details(
        &self,
        ctx: &NetworkContext,
        bond: &Bond,
        token: &Token,
        value: &str,
        slippage: Option<f64>,
    ) -> ZapinQuote {
        self.quoter
            .calc_zapin_details(ctx, bond, token, value, slippage)
            .await
    }

    /// LP preview; failures are reported and yield a zero estimate
    pub async fn lp_token_details(
        &self,
        ctx: &NetworkContext,
        bond: &Bond,
        token: &Token,
        value: &str,
    ) -> LpEstimate {
        let client = match &ctx.client {
            Some(client) => client.clone(),
            None => {
                self.classifier.report(&ZapError::WalletNotConnected);
                return LpEstimate::zero();
            }
        };

        match self
            .valuation
            .estimate(client.as_ref(), ctx.network, bond, token, value)
            .await
        {
            Ok(estimate) => estimate,
            Err(e) => {
                self.classifier.report(&e);
                LpEstimate::zero()
            }
        }
    }

    pub async fn change_approval(&self, ctx: &NetworkContext, token: &Token) -> ApprovalOutcome {
        self.approvals.change_approval(ctx, token).await
    }

    pub async fn zapin_mint(
        &self,
        ctx: &NetworkContext,
        bond: &Bond,
        token: &Token,
        value: &str,
        slippage: Option<f64>,
    ) -> ZapOutcome {
        self.executor
            .zapin_mint(ctx, bond, token, value, slippage)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountStore, MockAccountState};
    use crate::chain::MockChainClient;
    use crate::notify::{messages, MockNotifier};
    use crate::tx::{InMemoryPendingTxns, MockPendingTxnTracker};
    use ethers::types::{Address, H256, U256};
    use super::testing::{self, ReadTable, ASSET_A, BOND_B, WBNB};

    fn zapper(notifier: MockNotifier, routes: Option<MockRouteSource>) -> Zapper {
        Zapper::new(
            &testing::settings(),
            Collaborators {
                tracker: Arc::new(MockPendingTxnTracker::new()),
                notifier: Arc::new(notifier),
                account: Arc::new(MockAccountState::new()),
                routes: routes.map(|r| Arc::new(r) as Arc<dyn RouteSource>),
            },
        )
    }

    #[tokio::test]
    async fn test_lp_preview_through_facade() {
        let mut client = MockChainClient::new();
        ReadTable::default()
            .input_pair(1000, 4000)
            .bond_pool(BOND_B, WBNB, ASSET_A, (1000, 2000), 5000)
            .install(&mut client);
        let ctx = NetworkContext::new(56, Some(Arc::new(client)), Address::repeat_byte(1));

        let estimate = zapper(MockNotifier::new(), None)
            .lp_token_details(
                &ctx,
                &testing::bond_with_reserve(BOND_B),
                &testing::busd(),
                "2",
            )
            .await;

        assert_eq!(estimate.branch, Some(ValuationBranch::IntermediateIsToken0));
        assert!(estimate.received > 0.0);
    }

    #[tokio::test]
    async fn test_lp_preview_failure_is_zero() {
        let mut client = MockChainClient::new();
        ReadTable::default().install(&mut client);
        let ctx = NetworkContext::new(56, Some(Arc::new(client)), Address::repeat_byte(1));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text.starts_with(messages::CONTRACT_REVERTED))
            .times(1)
            .return_const(());

        let estimate = zapper(notifier, None)
            .lp_token_details(
                &ctx,
                &testing::bond_with_reserve(BOND_B),
                &testing::busd(),
                "2",
            )
            .await;
        assert_eq!(estimate, LpEstimate::zero());
    }

    #[tokio::test]
    async fn test_quote_without_route_source() {
        let ctx = NetworkContext::new(56, Some(Arc::new(MockChainClient::new())), Address::zero());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text == messages::SOMETHING_WRONG)
            .times(1)
            .return_const(());

        let quote = zapper(notifier, None)
            .calc_zapin_details(
                &ctx,
                &testing::bond_with_reserve(BOND_B),
                &testing::busd(),
                "1",
                None,
            )
            .await;
        assert_eq!(quote, ZapinQuote::neutral("1"));
    }

    #[tokio::test]
    async fn test_zap_with_in_memory_collaborators() {
        let hash = H256::repeat_byte(0xcc);
        let mut client = MockChainClient::new();
        client
            .expect_gas_price()
            .returning(|| Ok(U256::from(3_000_000_000u64)));
        client
            .expect_send_transaction()
            .returning(move |_| Ok(hash));
        client.expect_wait_for_receipt().returning(|_, _| Ok(()));
        client
            .expect_call()
            .returning(|_, _| Ok(ethers::abi::encode(&[testing::uint(1)]).into()));

        let tracker = Arc::new(InMemoryPendingTxns::new());
        let account = Arc::new(AccountStore::new());
        let mut notifier = MockNotifier::new();
        notifier.expect_report_success().times(1).return_const(());

        let zapper = Zapper::new(
            &testing::settings(),
            Collaborators {
                tracker: tracker.clone(),
                notifier: Arc::new(notifier),
                account: account.clone(),
                routes: None,
            },
        );
        let owner = Address::repeat_byte(7);
        let ctx = NetworkContext::new(56, Some(Arc::new(client)), owner);
        let bond = testing::bond_with_reserve(BOND_B);

        let outcome = zapper
            .zapin_mint(&ctx, &bond, &testing::busd(), "3", Some(1.0))
            .await;
        match outcome {
            ZapOutcome::Confirmed { tx_hash, refresh } => {
                assert_eq!(tx_hash, hash);
                refresh.await.unwrap();
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        assert!(tracker.is_empty());
        let position = account.bond(56, owner, &bond.name).unwrap();
        assert_eq!(position.reserve_balance, U256::one());
        assert_eq!(position.pending_payout, U256::one());
    }
}
