//! LP output preview for zap-ins
//!
//! Estimates how much of a bond's reserve token an input amount will yield.
//! The estimate is for display only; the zapper contract enforces nothing
//! based on it.
//!
//! 1. Price the input token in the intermediate token using the
//!    smaller-to-larger reserve ratio of the `(intermediate, input)` pair.
//!    This approximates constant-product price impact without simulating the
//!    AMM curve.
//! 2. Read the bond pool's reserves and total supply.
//! 3. If one side of the bond pool is the intermediate token, scale by the
//!    direct calibration factors against that side's reserve. Otherwise quote
//!    the router for a share of the intermediate amount into `token0` and
//!    scale by the routed calibration divisor against `reserve0`.
//!
//! The calibration factors are tied to the deployed pools' fee and precision
//! regimes and come from configuration.

use super::deployment::Deployments;
use super::types::{Bond, Token};
use crate::chain::{contracts, ChainClient};
use crate::config::LpCalibration;
use crate::error::{ZapError, ZapResult};

use ethers::types::{Address, U256};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const WEI_PER_UNIT: f64 = 1e18;

/// Which pricing rule produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationBranch {
    IntermediateIsToken0,
    IntermediateIsToken1,
    Routed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpEstimate {
    pub received: f64,
    /// `None` for the zero estimate returned after a failure
    pub branch: Option<ValuationBranch>,
}

impl LpEstimate {
    pub fn zero() -> Self {
        Self {
            received: 0.0,
            branch: None,
        }
    }
}

/// Snapshot of the bond's reserve pool
#[derive(Debug, Clone, PartialEq)]
struct PoolState {
    token0: Address,
    token1: Address,
    reserve0: U256,
    reserve1: U256,
    total_supply: U256,
}

pub struct LpValuationEngine {
    deployments: Arc<Deployments>,
}

impl LpValuationEngine {
    pub fn new(deployments: Arc<Deployments>) -> Self {
        Self { deployments }
    }

    pub async fn estimate(
        &self,
        client: &dyn ChainClient,
        network: u64,
        bond: &Bond,
        token: &Token,
        value: &str,
    ) -> ZapResult<LpEstimate> {
        let deployment = self.deployments.get(network)?;
        let pool = bond
            .reserve_address(network)
            .ok_or_else(|| ZapError::UnknownBondRoute {
                network,
                bond: bond.name.clone(),
                address: None,
            })?;
        let human = parse_human(value)?;

        let (intermediate_amount, state) = futures::try_join!(
            intermediate_amount(
                client,
                deployment.factory,
                deployment.intermediate,
                token,
                human
            ),
            read_pool(client, pool),
        )?;

        let supply = u256_to_f64(state.total_supply);
        let cal = &deployment.calibration;

        let (received, branch) = if state.token0 == deployment.intermediate {
            let reserve = nonzero(state.reserve0, pool)?;
            (
                direct(supply, intermediate_amount, reserve, cal),
                ValuationBranch::IntermediateIsToken0,
            )
        } else if state.token1 == deployment.intermediate {
            let reserve = nonzero(state.reserve1, pool)?;
            (
                direct(supply, intermediate_amount, reserve, cal),
                ValuationBranch::IntermediateIsToken1,
            )
        } else {
            let reserve0 = nonzero(state.reserve0, pool)?;
            let routed_in = f64_to_u256((intermediate_amount * cal.routed_share).round())?;
            let amounts = contracts::get_amounts_out(
                client,
                deployment.router,
                routed_in,
                vec![deployment.intermediate, state.token0],
            )
            .await?;
            let routed_out = amounts.get(1).copied().ok_or_else(|| {
                ZapError::Contract("getAmountsOut returned fewer than 2 amounts".to_string())
            })?;
            let received =
                supply * u256_to_f64(routed_out) / reserve0 / WEI_PER_UNIT / cal.routed_divisor;
            (received, ValuationBranch::Routed)
        };

        debug!(
            "LP estimate for {} {} into {}: {} ({:?})",
            value, token.symbol, bond.name, received, branch
        );

        Ok(LpEstimate {
            received,
            branch: Some(branch),
        })
    }
}

fn direct(supply: f64, amount: f64, reserve: f64, cal: &LpCalibration) -> f64 {
    supply * amount * cal.direct_multiplier / reserve / WEI_PER_UNIT / cal.direct_divisor
}

/// Input amount expressed in the intermediate token, in base units
async fn intermediate_amount(
    client: &dyn ChainClient,
    factory: Address,
    intermediate: Address,
    token: &Token,
    human: f64,
) -> ZapResult<f64> {
    let pair = contracts::get_pair(client, factory, intermediate, token.address).await?;
    let token0 = contracts::token0(client, pair).await?;
    let token1 = contracts::token1(client, pair).await?;
    let (reserve0, reserve1) = contracts::get_reserves(client, pair).await?;
    debug!(
        "Input pair {:?} ({:?}/{:?}) reserves {} / {}",
        pair, token0, token1, reserve0, reserve1
    );

    let (smaller, larger) = if reserve0 < reserve1 {
        (reserve0, reserve1)
    } else {
        (reserve1, reserve0)
    };
    let larger = nonzero(larger, pair)?;

    Ok(u256_to_f64(smaller) / larger * human * 10f64.powi(token.decimals as i32))
}

async fn read_pool(client: &dyn ChainClient, pool: Address) -> ZapResult<PoolState> {
    let token0 = contracts::token0(client, pool).await?;
    let token1 = contracts::token1(client, pool).await?;
    let (reserve0, reserve1) = contracts::get_reserves(client, pool).await?;
    let total_supply = contracts::total_supply(client, pool).await?;
    Ok(PoolState {
        token0,
        token1,
        reserve0,
        reserve1,
        total_supply,
    })
}

fn parse_human(value: &str) -> ZapResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ZapError::InvalidAmount {
            value: value.to_string(),
            reason: "not a non-negative number".to_string(),
        }),
    }
}

fn nonzero(reserve: U256, pool: Address) -> ZapResult<f64> {
    if reserve.is_zero() {
        return Err(ZapError::Contract(format!("Pool {:?} has no liquidity", pool)));
    }
    Ok(u256_to_f64(reserve))
}

pub(crate) fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}

fn f64_to_u256(value: f64) -> ZapResult<U256> {
    if !value.is_finite() || value < 0.0 {
        return Err(ZapError::Contract(format!("Cannot quote amount {}", value)));
    }
    U256::from_dec_str(&format!("{:.0}", value))
        .map_err(|e| ZapError::Contract(format!("Cannot quote amount {}: {}", value, e)))
}
