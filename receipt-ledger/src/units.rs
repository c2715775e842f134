//! Conversions between wei and human-readable ether amounts

use crate::{types::Wei, Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Decimal places of the native currency
pub const ETHER_DECIMALS: u32 = 18;

/// 10^18
pub const WEI_PER_ETHER: Wei = 1_000_000_000_000_000_000;

/// Parse `"0.01"` into wei; rejects negatives and sub-wei precision
pub fn parse_ether(value: &str) -> Result<Wei> {
    let ether = Decimal::from_str(value.trim())
        .map_err(|e| Error::InvalidInput(format!("invalid ether amount {:?}: {}", value, e)))?;

    if ether.is_sign_negative() {
        return Err(Error::InvalidInput(format!("negative ether amount {}", value)));
    }
    if ether.scale() > ETHER_DECIMALS {
        return Err(Error::InvalidInput(format!(
            "ether amount {} has more than {} decimals",
            value, ETHER_DECIMALS
        )));
    }

    let wei = ether
        .checked_mul(Decimal::from(WEI_PER_ETHER as u64))
        .ok_or_else(|| Error::overflow("ether to wei"))?;

    wei.trunc()
        .to_u128()
        .ok_or_else(|| Error::overflow("ether to wei"))
}

/// Render wei as ether, e.g. `10475000000000000000` → `"10.475"`
pub fn format_ether(wei: Wei) -> String {
    i128::try_from(wei)
        .ok()
        .and_then(|w| Decimal::try_from_i128_with_scale(w, ETHER_DECIMALS).ok())
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|| format!("{} wei", wei))
}
