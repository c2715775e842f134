//! Configuration for the lending pool

use crate::{Error, Result};
use receipt_ledger::BPS_DENOMINATOR;
use serde::{Deserialize, Serialize};

/// Lending pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    /// Account the pool operates as (liquidity and fee holder)
    pub address: String,

    /// Platform share of interest in basis points (default: 500 = 5%)
    pub platform_fee_bps: u32,

    /// Seconds an offer stays acceptable (default: 7 days)
    pub offer_validity_secs: u64,

    /// Highest interest rate a bank may offer (default: 50%)
    pub max_interest_rate_bps: u32,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            address: "croplock-lending-pool".to_string(),
            platform_fee_bps: 500,
            offer_validity_secs: 7 * 24 * 60 * 60,
            max_interest_rate_bps: 5_000,
        }
    }
}

impl LendingConfig {
    /// Reject fee shares above 100% and unusable windows
    pub fn validate(&self) -> Result<()> {
        if self.platform_fee_bps as u128 > BPS_DENOMINATOR {
            return Err(Error::Config(format!(
                "platform_fee_bps {} exceeds {}",
                self.platform_fee_bps, BPS_DENOMINATOR
            )));
        }
        if self.offer_validity_secs == 0 || i64::try_from(self.offer_validity_secs).is_err() {
            return Err(Error::Config(format!(
                "offer_validity_secs {} out of range",
                self.offer_validity_secs
            )));
        }
        if self.address.trim().is_empty() {
            return Err(Error::Config("lending pool address must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LendingConfig::default();
        assert_eq!(config.platform_fee_bps, 500);
        assert_eq!(config.offer_validity_secs, 604_800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_validity_rejected() {
        let config = LendingConfig {
            offer_validity_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: LendingConfig = toml::from_str("platform_fee_bps = 250").unwrap();
        assert_eq!(config.platform_fee_bps, 250);
        assert_eq!(config.address, "croplock-lending-pool");
        assert_eq!(config.max_interest_rate_bps, 5_000);
    }
}
