//! CropLock Lending Pool
//!
//! Bank loans collateralized by pledged warehouse receipts.
//!
//! # Money flow
//!
//! - Banks deposit liquidity; principal is paid from the lending bank's share
//! - Repayment is `principal + principal * rate / 10000`, paid in full
//! - The platform keeps `fee_bps` of the interest; the bank receives the rest
//! - On default the pledged units move to the bank through the ledger
//!
//! Expired offers and overdue loans are derived lazily from the call time;
//! nothing runs in the background.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod pool;
pub mod types;

// Re-exports
pub use config::LendingConfig;
pub use error::{Error, Result};
pub use pool::{LendingPool, LoanTerms};
pub use types::{Loan, LoanId, LoanStatus, LoanView};
