//! Configuration for the platform node

use crate::{Error, Result};
use lending_pool::LendingConfig;
use marketplace::MarketplaceConfig;
use receipt_ledger::{units::parse_ether, JournalConfig, Wei};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Account administering the directory, ledger, marketplace and pool
    pub admin: String,

    /// Emit logs as JSON
    pub log_json: bool,

    /// Grant the ledger `Minter` role when a warehouse is registered
    pub auto_grant_minter: bool,

    /// Actor mailbox capacity
    pub mailbox_capacity: usize,

    /// Event journal
    pub journal: JournalConfig,

    /// Marketplace
    pub marketplace: MarketplaceConfig,

    /// Lending pool
    pub lending: LendingConfig,

    /// Starting wallet balances
    pub genesis: Vec<GenesisAllocation>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            service_name: "croplock-node".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            admin: "croplock-admin".to_string(),
            log_json: false,
            auto_grant_minter: true,
            mailbox_capacity: 1000,
            journal: JournalConfig::default(),
            marketplace: MarketplaceConfig::default(),
            lending: LendingConfig::default(),
            genesis: Vec::new(),
        }
    }
}

/// Initial wallet balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    /// Account
    pub address: String,

    /// Balance in ether, e.g. `"100"` or `"0.5"`
    pub balance_ether: String,
}

impl GenesisAllocation {
    /// Balance in wei
    pub fn balance_wei(&self) -> Result<Wei> {
        Ok(parse_ether(&self.balance_ether)?)
    }
}

impl PlatformConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlatformConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = PlatformConfig::default();

        if let Ok(admin) = std::env::var("CROPLOCK_ADMIN") {
            config.admin = admin;
        }

        if let Ok(value) = std::env::var("CROPLOCK_LOG_JSON") {
            config.log_json = parse_flag("CROPLOCK_LOG_JSON", &value)?;
        }

        if let Ok(value) = std::env::var("CROPLOCK_AUTO_GRANT_MINTER") {
            config.auto_grant_minter = parse_flag("CROPLOCK_AUTO_GRANT_MINTER", &value)?;
        }

        if let Ok(data_dir) = std::env::var("CROPLOCK_JOURNAL_DIR") {
            config.journal.enabled = true;
            config.journal.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(value) = std::env::var("CROPLOCK_MARKETPLACE_FEE_BPS") {
            config.marketplace.fee_bps = value
                .parse()
                .map_err(|e| Error::Config(format!("Invalid CROPLOCK_MARKETPLACE_FEE_BPS: {}", e)))?;
        }

        if let Ok(value) = std::env::var("CROPLOCK_LENDING_FEE_BPS") {
            config.lending.platform_fee_bps = value
                .parse()
                .map_err(|e| Error::Config(format!("Invalid CROPLOCK_LENDING_FEE_BPS: {}", e)))?;
        }

        if let Ok(value) = std::env::var("CROPLOCK_OFFER_VALIDITY_SECS") {
            config.lending.offer_validity_secs = value
                .parse()
                .map_err(|e| Error::Config(format!("Invalid CROPLOCK_OFFER_VALIDITY_SECS: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        if self.admin.trim().is_empty() {
            return Err(Error::Config("admin must not be empty".to_string()));
        }
        if self.mailbox_capacity == 0 {
            return Err(Error::Config("mailbox_capacity must be positive".to_string()));
        }
        self.marketplace.validate()?;
        self.lending.validate()?;
        for allocation in &self.genesis {
            allocation.balance_wei()?;
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(Error::Config(format!("Invalid {}: {}", name, other))),
    }
}
