//! Configuration management for the MOAC toolkit
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::tx::{DEFAULT_GAS_LIMIT, DEFAULT_MIN_GAS_PRICE};
use crate::wallet;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub node: NodeConfig,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub url: String,
    #[serde(default = "default_mainnet")]
    pub mainnet: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_min_gas_price")]
    pub min_gas_price: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            min_gas_price: DEFAULT_MIN_GAS_PRICE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractsConfig {
    pub fingate: Option<String>,
    /// Token symbol -> ERC20 contract address
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Environment variable holding the signing secret
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
        }
    }
}

fn default_mainnet() -> bool {
    true
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_min_gas_price() -> u64 {
    DEFAULT_MIN_GAS_PRICE
}

fn default_secret_env() -> String {
    "MOAC_SECRET".to_string()
}

impl Settings {
    /// Load settings from `MOAC_CONFIG`, defaulting to `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var("MOAC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        Self::from_toml(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.node.url.trim().is_empty() {
            anyhow::bail!("Node URL must be configured");
        }

        if let Some(fingate) = &self.contracts.fingate {
            if !wallet::is_valid_address(fingate) {
                anyhow::bail!("Fingate address {} is invalid", fingate);
            }
        }

        for (symbol, address) in &self.contracts.tokens {
            if !wallet::is_valid_address(address) {
                anyhow::bail!("Token {} has invalid address {}", symbol, address);
            }
        }

        if self.gas.gas_limit == 0 {
            tracing::warn!("Gas limit is 0 - every submission will need an explicit gas limit");
        }

        Ok(())
    }

    /// ERC20 address configured for `symbol`, matched ignoring case
    pub fn token_address(&self, symbol: &str) -> Option<&str> {
        self.contracts
            .tokens
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
            .map(|(_, address)| address.as_str())
    }

    /// Signing secret from the configured environment variable
    pub fn secret(&self) -> Result<String> {
        env::var(&self.wallet.secret_env)
            .with_context(|| format!("Set {} to the signing secret", self.wallet.secret_env))
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
