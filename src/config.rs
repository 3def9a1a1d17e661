//! Configuration management for the mint submitter
//!
//! Loads a JSON configuration file with environment variable substitution.

use anyhow::{Context, Result};
use ethers::types::Address;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::tx::PollPolicy;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "MINT_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.json";

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Run configuration, read once at startup
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub infura_api_url: String,
    pub value: u64,
    pub wallet_private_key: String,
    pub contract_address: String,
    pub gas_limit: u64,
    pub abi: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gas_price_gwei: Option<u64>,
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_max_poll_attempts() -> Option<u32> {
    Some(300)
}

impl Settings {
    /// Load settings from `$MINT_CONFIG`, falling back to `config.json`
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut raw: Value = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration: {:?}", path))?;

        // Substitute environment variables inside string values only
        substitute_in_value(&mut raw)
            .with_context(|| format!("Failed to resolve configuration: {:?}", path))?;

        let settings: Settings = serde_json::from_value(raw)
            .with_context(|| format!("Invalid configuration: {:?}", path))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Write settings as pretty-printed JSON
    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.infura_api_url.trim().is_empty() {
            anyhow::bail!("infura_api_url must not be empty");
        }
        if self.wallet_private_key.trim().is_empty() {
            anyhow::bail!("wallet_private_key must not be empty");
        }
        self.contract_address()?;
        if self.gas_limit == 0 {
            anyhow::bail!("gas_limit must be greater than zero");
        }
        if self.abi.trim().is_empty() {
            anyhow::bail!("abi must not be empty");
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }
        if self.max_poll_attempts == Some(0) {
            anyhow::bail!("max_poll_attempts must be greater than zero (or null for no limit)");
        }

        Ok(())
    }

    /// Parsed recipient contract address
    pub fn contract_address(&self) -> Result<Address> {
        Address::from_str(&self.contract_address)
            .with_context(|| format!("Invalid contract address: {}", self.contract_address))
    }

    /// Receipt polling policy derived from the poll settings
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("infura_api_url", &self.infura_api_url)
            .field("value", &self.value)
            .field("wallet_private_key", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .field("gas_limit", &self.gas_limit)
            .field("abi", &format!("<{} bytes>", self.abi.len()))
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("max_gas_price_gwei", &self.max_gas_price_gwei)
            .finish()
    }
}

/// Walk a parsed document and substitute variables in every string leaf
fn substitute_in_value(value: &mut Value) -> Result<()> {
    match value {
        Value::String(s) => *s = substitute_env_vars(s)?,
        Value::Array(items) => {
            for item in items {
                substitute_in_value(item)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute_in_value(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut last = 0;

    for cap in ENV_VAR_PATTERN.captures_iter(input) {
        let Some(whole) = cap.get(0) else {
            continue;
        };
        let var_name = &cap[1];
        let var_value = env::var(var_name)
            .with_context(|| format!("Environment variable {} is not set", var_name))?;

        result.push_str(&input[last..whole.start()]);
        result.push_str(&var_value);
        last = whole.end();
    }
    result.push_str(&input[last..]);

    Ok(result)
}
