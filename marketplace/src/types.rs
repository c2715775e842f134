//! Core types for the marketplace

use receipt_ledger::{Address, Quantity, ReceiptId, Timestamp, Wei};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-price offer of receipt units
///
/// No escrow: units stay with the seller until a purchase moves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Listing ID
    pub id: ListingId,

    /// Seller
    pub seller: Address,

    /// Receipt class on offer
    pub receipt_id: ReceiptId,

    /// Units originally listed
    pub quantity: Quantity,

    /// Units still for sale
    pub remaining: Quantity,

    /// Price per unit in wei
    pub price_per_unit: Wei,

    /// Open for purchases
    pub active: bool,

    /// Creation time
    pub created_at: Timestamp,
}

/// Outcome of a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Listing bought from
    pub listing_id: ListingId,

    /// Buyer
    pub buyer: Address,

    /// Seller
    pub seller: Address,

    /// Units bought
    pub quantity: Quantity,

    /// `quantity * price_per_unit`
    pub total_price: Wei,

    /// Fee retained by the platform
    pub platform_fee: Wei,

    /// `total_price - platform_fee`
    pub seller_proceeds: Wei,

    /// Units left on the listing
    pub remaining: Quantity,
}
