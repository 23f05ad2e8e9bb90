//! Per-network contract addresses and tuning resolved from configuration

use crate::config::{LpCalibration, Settings};
use crate::error::{ZapError, ZapResult};
use crate::tx::GasOracle;

use ethers::types::Address;
use std::collections::HashMap;

/// Contracts the zapper talks to on one network
#[derive(Debug, Clone)]
pub struct Deployment {
    pub network: u64,
    pub zapper: Address,
    pub factory: Address,
    pub router: Address,
    pub intermediate: Address,
    pub protocol_version: u64,
    pub calibration: LpCalibration,
    pub gas: GasOracle,
}

/// Deployments of every enabled network, keyed by chain id
#[derive(Debug, Clone, Default)]
pub struct Deployments {
    by_network: HashMap<u64, Deployment>,
}

impl Deployments {
    pub fn from_settings(settings: &Settings) -> Self {
        let by_network = settings
            .enabled_networks()
            .into_iter()
            .map(|(_, n)| {
                let deployment = Deployment {
                    network: n.chain_id,
                    zapper: n.zapper_address,
                    factory: n.factory_address,
                    router: n.router_address,
                    intermediate: n.intermediate_token,
                    protocol_version: n.protocol_version,
                    calibration: n.calibration,
                    gas: GasOracle::new(n.gas_price_gwei, settings.zap.gas_price_buffer_percent),
                };
                (n.chain_id, deployment)
            })
            .collect();

        Self { by_network }
    }

    pub fn get(&self, network: u64) -> ZapResult<&Deployment> {
        self.by_network
            .get(&network)
            .ok_or_else(|| ZapError::Config(format!("Network {} is not configured", network)))
    }
}
