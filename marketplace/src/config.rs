//! Configuration for the marketplace

use crate::{Error, Result};
use receipt_ledger::BPS_DENOMINATOR;
use serde::{Deserialize, Serialize};

/// Marketplace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Account the marketplace operates as (ledger operator, fee holder)
    pub address: String,

    /// Platform fee in basis points (default: 250 = 2.5%)
    pub fee_bps: u32,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            address: "croplock-marketplace".to_string(),
            fee_bps: 250,
        }
    }
}

impl MarketplaceConfig {
    /// Reject fees above 100% and empty addresses
    pub fn validate(&self) -> Result<()> {
        if self.fee_bps as u128 > BPS_DENOMINATOR {
            return Err(Error::Config(format!(
                "fee_bps {} exceeds {}",
                self.fee_bps, BPS_DENOMINATOR
            )));
        }
        if self.address.trim().is_empty() {
            return Err(Error::Config("marketplace address must not be empty".to_string()));
        }
        Ok(())
    }
}
