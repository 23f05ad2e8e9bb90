//! Swap path resolution for zap-ins
//!
//! Every zap starts with `[input_token, intermediate]`. What happens after the
//! intermediate token depends on the bond: a static table, keyed by network and
//! the bond's reserve address, lists the one or two hops that build the
//! bond's reserve asset. A bond missing from the table cannot be zapped into.

use super::types::{Bond, Token};
use crate::config::Settings;
use crate::error::{ZapError, ZapResult};

use ethers::types::Address;
use std::collections::HashMap;
use tracing::debug;

/// Hops after the intermediate token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopPaths {
    pub hop1: Vec<Address>,
    pub hop2: Vec<Address>,
}

/// Fully resolved paths for one zap-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPaths {
    pub primary: Vec<Address>,
    pub hop1: Vec<Address>,
    pub hop2: Vec<Address>,
}

#[derive(Debug, Clone, Default)]
pub struct SwapPathResolver {
    intermediates: HashMap<u64, Address>,
    routes: HashMap<(u64, Address), HopPaths>,
}

impl SwapPathResolver {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut resolver = Self::default();
        for (_, network) in settings.enabled_networks() {
            resolver
                .intermediates
                .insert(network.chain_id, network.intermediate_token);
            for route in &network.routes {
                resolver.routes.insert(
                    (network.chain_id, route.reserve),
                    HopPaths {
                        hop1: route.hop1.clone(),
                        hop2: route.hop2.clone(),
                    },
                );
            }
        }
        resolver
    }

    /// Hop table entry for a reserve address, if the table has one
    pub fn hops(&self, network: u64, reserve: Address) -> Option<&HopPaths> {
        self.routes.get(&(network, reserve))
    }

    pub fn resolve(&self, network: u64, bond: &Bond, token: &Token) -> ZapResult<SwapPaths> {
        let unknown = |address| ZapError::UnknownBondRoute {
            network,
            bond: bond.name.clone(),
            address,
        };

        let intermediate = *self.intermediates.get(&network).ok_or_else(|| unknown(None))?;
        let reserve = bond.reserve_address(network).ok_or_else(|| unknown(None))?;
        let hops = self
            .hops(network, reserve)
            .ok_or_else(|| unknown(Some(reserve)))?;

        debug!(
            "Resolved zap path for {} via {:?}: {} + {} hop addresses",
            bond.name,
            reserve,
            hops.hop1.len(),
            hops.hop2.len()
        );

        Ok(SwapPaths {
            primary: vec![token.address, intermediate],
            hop1: hops.hop1.clone(),
            hop2: hops.hop2.clone(),
        })
    }
}
