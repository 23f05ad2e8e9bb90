//! Route computation entry point
//!
//! Validates the caller's inputs and asks the external route source for a
//! swap route. Every failure is reported once and answered with the neutral
//! quote, so the caller always gets its value back.

use super::amount::to_base_units;
use super::slippage::accepted_slippage;
use super::types::{Bond, SwapRoute, Token, ZapinQuote};
use crate::chain::NetworkContext;
use crate::classify::ErrorClassifier;
use crate::error::{ZapError, ZapResult};

use async_trait::async_trait;
use ethers::types::U256;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Which family of route the bond needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Input token into both sides of an LP pair
    Lp,
    /// Input token into a single reserve asset
    SingleAsset,
}

impl RouteKind {
    pub fn for_bond(bond: &Bond) -> Self {
        if bond.is_lp {
            RouteKind::Lp
        } else {
            RouteKind::SingleAsset
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub network: u64,
    pub bond: Bond,
    pub token: Token,
    pub value_in_wei: U256,
    /// Accepted fraction, already validated
    pub slippage: f64,
    pub kind: RouteKind,
}

/// Swap-route provider (aggregator API, on-chain helper, ...)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn quote(&self, request: RouteRequest) -> ZapResult<SwapRoute>;
}

pub struct RouteQuoter {
    source: Option<Arc<dyn RouteSource>>,
    classifier: Arc<ErrorClassifier>,
}

impl RouteQuoter {
    pub fn new(source: Option<Arc<dyn RouteSource>>, classifier: Arc<ErrorClassifier>) -> Self {
        Self { source, classifier }
    }

    pub async fn calc_zapin_details(
        &self,
        ctx: &NetworkContext,
        bond: &Bond,
        token: &Token,
        value: &str,
        slippage: Option<f64>,
    ) -> ZapinQuote {
        match self.route(ctx, bond, token, value, slippage).await {
            Ok(route) => ZapinQuote {
                route,
                value: value.to_string(),
            },
            Err(e) => {
                self.classifier.report(&e);
                ZapinQuote::neutral(value)
            }
        }
    }

    async fn route(
        &self,
        ctx: &NetworkContext,
        bond: &Bond,
        token: &Token,
        value: &str,
        slippage: Option<f64>,
    ) -> ZapResult<SwapRoute> {
        if ctx.client.is_none() {
            return Err(ZapError::WalletNotConnected);
        }
        let slippage = accepted_slippage(slippage).map_err(ZapError::SlippageOutOfRange)?;
        let value_in_wei = to_base_units(value, token.decimals)?;

        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ZapError::Config("No route source configured".to_string()))?;

        let kind = RouteKind::for_bond(bond);
        debug!(
            "Quoting {:?} route for {} {} into {} (slippage {})",
            kind, value, token.symbol, bond.name, slippage
        );

        let route = source
            .quote(RouteRequest {
                network: ctx.network,
                bond: bond.clone(),
                token: token.clone(),
                value_in_wei,
                slippage,
                kind,
            })
            .await?;

        info!(
            "Route for {} via {:?}: amount {}",
            bond.name, route.swap_target, route.amount
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use crate::error::ClientError;
    use crate::notify::{messages, MockNotifier};
    use crate::zap::testing::{self, BOND_A};
    use ethers::types::Address;

    fn connected() -> NetworkContext {
        NetworkContext::new(56, Some(Arc::new(MockChainClient::new())), Address::repeat_byte(1))
    }

    fn quoter(source: Option<MockRouteSource>, notifier: MockNotifier) -> RouteQuoter {
        RouteQuoter::new(
            source.map(|s| Arc::new(s) as Arc<dyn RouteSource>),
            Arc::new(ErrorClassifier::new(Arc::new(notifier))),
        )
    }

    fn route() -> SwapRoute {
        SwapRoute {
            swap_target: Address::repeat_byte(9),
            swap_data: vec![1, 2, 3].into(),
            amount: "1500000000000000000".into(),
        }
    }

    #[tokio::test]
    async fn test_lp_route_request() {
        let mut source = MockRouteSource::new();
        source
            .expect_quote()
            .withf(|req| {
                req.kind == RouteKind::Lp
                    && req.value_in_wei == U256::from(1_500_000_000_000_000_000u64)
                    && (req.slippage - 0.02).abs() < 1e-12
                    && req.network == 56
            })
            .times(1)
            .returning(|_| Ok(route()));

        let quote = quoter(Some(source), MockNotifier::new())
            .calc_zapin_details(
                &connected(),
                &testing::bond_with_reserve(BOND_A),
                &testing::busd(),
                "1.5",
                Some(2.0),
            )
            .await;

        assert_eq!(quote.route, route());
        assert_eq!(quote.value, "1.5");
    }

    #[tokio::test]
    async fn test_single_asset_bond_asks_for_single_asset_route() {
        let mut source = MockRouteSource::new();
        source
            .expect_quote()
            .withf(|req| req.kind == RouteKind::SingleAsset)
            .times(1)
            .returning(|_| Ok(route()));

        let mut bond = testing::bond_with_reserve(BOND_A);
        bond.is_lp = false;
        let quote = quoter(Some(source), MockNotifier::new())
            .calc_zapin_details(&connected(), &bond, &testing::busd(), "1", None)
            .await;

        assert!(!quote.route.is_empty());
    }

    #[tokio::test]
    async fn test_slippage_too_small_never_quotes() {
        let mut source = MockRouteSource::new();
        source.expect_quote().times(0);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text == messages::SLIPPAGE_TOO_SMALL)
            .times(1)
            .return_const(());

        let quote = quoter(Some(source), notifier)
            .calc_zapin_details(
                &connected(),
                &testing::bond_with_reserve(BOND_A),
                &testing::busd(),
                "1.5",
                Some(0.05),
            )
            .await;

        assert_eq!(quote, ZapinQuote::neutral("1.5"));
    }

    #[tokio::test]
    async fn test_wallet_checked_before_slippage() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text == messages::PLEASE_CONNECT_WALLET)
            .times(1)
            .return_const(());

        let quote = quoter(None, notifier)
            .calc_zapin_details(
                &NetworkContext::disconnected(56),
                &testing::bond_with_reserve(BOND_A),
                &testing::busd(),
                "abc",
                Some(500.0),
            )
            .await;

        assert_eq!(quote, ZapinQuote::neutral("abc"));
    }

    #[tokio::test]
    async fn test_invalid_amount_is_neutral() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text == messages::INVALID_AMOUNT)
            .times(1)
            .return_const(());

        let quote = quoter(None, notifier)
            .calc_zapin_details(
                &connected(),
                &testing::bond_with_reserve(BOND_A),
                &testing::busd(),
                "-3",
                Some(2.0),
            )
            .await;

        assert_eq!(quote, ZapinQuote::neutral("-3"));
    }

    #[tokio::test]
    async fn test_source_failure_is_reported_once() {
        let mut source = MockRouteSource::new();
        source.expect_quote().times(1).returning(|_| {
            Err(ZapError::Client(ClientError::Transport(
                "connection refused".into(),
            )))
        });
        let mut notifier = MockNotifier::new();
        notifier
            .expect_report_warning()
            .withf(|text| text == messages::NETWORK_ERROR)
            .times(1)
            .return_const(());

        let quote = quoter(Some(source), notifier)
            .calc_zapin_details(
                &connected(),
                &testing::bond_with_reserve(BOND_A),
                &testing::busd(),
                "2",
                None,
            )
            .await;

        assert!(quote.route.is_empty());
        assert_eq!(quote.value, "2");
    }
}
