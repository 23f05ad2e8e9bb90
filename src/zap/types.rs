//! Reference data and results exchanged with callers

use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An input token as known to the external token registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Per-network contract addresses of a bond
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondAddresses {
    /// Reserve asset (LP pair or single token) the bond is priced in
    pub reserve: Address,
    /// Bond depository receiving the deposit
    pub deposit: Address,
}

/// A bond as known to the external bond registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    pub name: String,
    pub is_lp: bool,
    #[serde(default)]
    pub networks: HashMap<u64, BondAddresses>,
}

impl Bond {
    pub fn new(name: impl Into<String>, is_lp: bool) -> Self {
        Self {
            name: name.into(),
            is_lp,
            networks: HashMap::new(),
        }
    }

    pub fn with_network(mut self, network: u64, reserve: Address, deposit: Address) -> Self {
        self.networks
            .insert(network, BondAddresses { reserve, deposit });
        self
    }

    pub fn reserve_address(&self, network: u64) -> Option<Address> {
        self.networks.get(&network).map(|a| a.reserve)
    }

    pub fn deposit_address(&self, network: u64) -> Option<Address> {
        self.networks.get(&network).map(|a| a.deposit)
    }
}

/// Instruction for a swap-aggregator style contract call.
///
/// Only valid for the slippage/value pair it was computed for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRoute {
    pub swap_target: Address,
    pub swap_data: Bytes,
    /// Base-unit integer as a decimal string
    pub amount: String,
}

impl SwapRoute {
    /// The neutral route handed back when no route could be computed
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.swap_target.is_zero() && self.swap_data.is_empty() && self.amount.is_empty()
    }
}

/// Route computation result with the caller's value echoed back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZapinQuote {
    pub route: SwapRoute,
    pub value: String,
}

impl ZapinQuote {
    pub fn neutral(value: &str) -> Self {
        Self {
            route: SwapRoute::empty(),
            value: value.to_string(),
        }
    }
}
