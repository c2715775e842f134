//! CropLock Marketplace
//!
//! Fixed-price direct listings of warehouse receipt units.
//!
//! # Purchase flow
//!
//! 1. **Validation**: listing active, quantity within `remaining`, payment
//!    exactly `quantity * price_per_unit`, buyer funded
//! 2. **Re-check**: seller still holds the units as transferable (no escrow)
//! 3. **Settlement**: units move seller → buyer through the ledger with the
//!    marketplace as approved operator; `total - fee` goes to the seller
//! 4. **Accrual**: the fee stays at the marketplace account until an admin
//!    withdraws it
//!
//! Partial fills decrement `remaining`; a listing closes when it reaches zero.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

// Re-exports
pub use config::MarketplaceConfig;
pub use engine::Marketplace;
pub use error::{Error, Result};
pub use types::{Listing, ListingId, Purchase};
