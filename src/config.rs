//! Configuration management for the zapper
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use ethers::types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub zap: ZapConfig,
    pub networks: HashMap<String, NetworkConfig>,
}

/// Timing and submission knobs shared by every network
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZapConfig {
    /// Confirmations awaited for approve and zap-in receipts
    pub confirmations: usize,
    /// Delay before re-reading the allowance after an approval
    pub approval_settle_ms: u64,
    /// Delay before refreshing account details after a zap-in
    pub refresh_settle_ms: u64,
    /// Seconds added to the current time for the zap-in deadline
    pub deadline_offset_secs: u64,
    /// Percentage added on top of the node's gas price
    pub gas_price_buffer_percent: u64,
}

impl Default for ZapConfig {
    fn default() -> Self {
        Self {
            confirmations: 1,
            approval_settle_ms: 2_000,
            refresh_settle_ms: 10_000,
            deadline_offset_secs: 100_000,
            gas_price_buffer_percent: 0,
        }
    }
}

impl ZapConfig {
    pub fn approval_settle(&self) -> Duration {
        Duration::from_millis(self.approval_settle_ms)
    }

    pub fn refresh_settle(&self) -> Duration {
        Duration::from_millis(self.refresh_settle_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_urls: Vec<String>,
    /// Zap-in contract; also the spender approved for input tokens
    pub zapper_address: Address,
    pub factory_address: Address,
    pub router_address: Address,
    /// Wrapped native token every route passes through
    pub intermediate_token: Address,
    pub protocol_version: u64,
    /// Externally supplied gas price; the node is asked when unset
    pub gas_price_gwei: Option<u64>,
    #[serde(default)]
    pub calibration: LpCalibration,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Empirical scaling factors for the deployed pools' LP valuation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LpCalibration {
    pub direct_multiplier: f64,
    pub direct_divisor: f64,
    pub routed_share: f64,
    pub routed_divisor: f64,
}

impl Default for LpCalibration {
    fn default() -> Self {
        Self {
            direct_multiplier: 9.0,
            direct_divisor: 20.78,
            routed_share: 0.45,
            routed_divisor: 1.039,
        }
    }
}

/// One row of the zap routing table, keyed by the bond's reserve address
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub reserve: Address,
    pub hop1: Vec<Address>,
    #[serde(default)]
    pub hop2: Vec<Address>,
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("ZAPPER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.enabled_networks().is_empty() {
            anyhow::bail!("At least one network must be enabled");
        }

        if self.zap.confirmations == 0 {
            anyhow::bail!("zap.confirmations must be at least 1");
        }

        for (name, network) in &self.networks {
            if !network.enabled {
                continue;
            }
            if network.rpc_urls.is_empty() {
                anyhow::bail!("Network {} has no RPC URLs configured", name);
            }
            let cal = &network.calibration;
            if cal.direct_divisor == 0.0 || cal.routed_divisor == 0.0 {
                anyhow::bail!("Network {} has a zero calibration divisor", name);
            }
            if !(0.0..=1.0).contains(&cal.routed_share) {
                anyhow::bail!("Network {} routed_share must be within [0, 1]", name);
            }
            if network.routes.is_empty() {
                anyhow::bail!("Network {} has no zap routes configured", name);
            }
            for route in &network.routes {
                if route.hop1.is_empty() {
                    anyhow::bail!(
                        "Network {} route for {:?} has an empty first hop",
                        name,
                        route.reserve
                    );
                }
            }
        }

        Ok(())
    }

    /// Get list of enabled networks
    pub fn enabled_networks(&self) -> Vec<(&String, &NetworkConfig)> {
        self.networks.iter().filter(|(_, n)| n.enabled).collect()
    }

    /// Get network config by chain ID
    pub fn get_network_by_id(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks
            .values()
            .find(|n| n.enabled && n.chain_id == chain_id)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    lazy_static::lazy_static! {
        static ref ENV_VAR: regex::Regex =
            regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern");
    }

    let mut result = input.to_string();
    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
pub(crate) const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("ZAPPER_TEST_VAR", "test_value");
        let input = "url = \"https://rpc.example.com/${ZAPPER_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://rpc.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_default_config_parses() {
        let settings = Settings::from_toml_str(DEFAULT_CONFIG).unwrap();
        let bsc = settings.get_network_by_id(56).unwrap();

        assert_eq!(bsc.protocol_version, 61);
        assert_eq!(
            bsc.zapper_address,
            addr("0x83896c22ff6616C33b51e9DD0cf0B8032624c3c6")
        );
        assert_eq!(
            bsc.intermediate_token,
            addr("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c")
        );
        assert_eq!(bsc.calibration, LpCalibration::default());
        assert_eq!(bsc.routes.len(), 3);
        assert_eq!(settings.zap.deadline_offset_secs, 100_000);
        assert_eq!(settings.zap.refresh_settle(), Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_zero_divisor() {
        let input = DEFAULT_CONFIG.replace("routed_divisor = 1.039", "routed_divisor = 0.0");
        let err = Settings::from_toml_str(&input).unwrap_err();
        assert!(err.to_string().contains("zero calibration divisor"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEFAULT_CONFIG.as_bytes()).unwrap();

        env::set_var("ZAPPER_CONFIG", file.path());
        let settings = Settings::load().unwrap();
        env::remove_var("ZAPPER_CONFIG");

        assert_eq!(settings.enabled_networks().len(), 1);
    }
}
