//! Gas price selection for approve and zap-in submissions

use crate::chain::ChainClient;
use crate::error::ZapResult;

use ethers::types::U256;
use tracing::debug;

const GWEI: u64 = 1_000_000_000;

/// Picks the gas price for a submission
#[derive(Debug, Clone, Default)]
pub struct GasOracle {
    /// Externally supplied price in gwei; overrides the node
    fixed_gwei: Option<u64>,
    /// Buffer percentage on top of the node price (e.g. 10 = 10%)
    buffer_percent: u64,
}

impl GasOracle {
    pub fn new(fixed_gwei: Option<u64>, buffer_percent: u64) -> Self {
        Self {
            fixed_gwei,
            buffer_percent,
        }
    }

    /// Gas price for the next transaction on this client
    pub async fn gas_price(&self, client: &dyn ChainClient) -> ZapResult<U256> {
        if let Some(gwei) = self.fixed_gwei {
            let price = U256::from(gwei) * U256::from(GWEI);
            debug!("Using fixed gas price {} wei", price);
            return Ok(price);
        }

        let price = client.gas_price().await?;
        let buffered = price + price * self.buffer_percent / 100;
        debug!("Node gas price {} wei, buffered to {}", price, buffered);
        Ok(buffered)
    }
}
