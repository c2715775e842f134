//! CropLock Receipt Ledger
//!
//! Warehouse receipts (eNWRs) as multi-asset fungible tokens with
//! per-holder collateral pledges, plus the role directory of warehouses
//! and banks that the rest of the platform consults.
//!
//! # Architecture
//!
//! - **Validate, then mutate**: every operation checks all preconditions
//!   before touching state, so a failed call leaves no trace
//! - **Injected time**: callers pass `now` through [`CallContext`]; expiry
//!   is evaluated lazily against it
//! - **Event log**: every committed change is published once to an
//!   [`EventSink`], hash-chained and optionally journaled to RocksDB
//!
//! # Invariants
//!
//! - Pledged amount never exceeds balance
//! - Pledged units never leave a holding except by seizure
//! - Expired receipts cannot be transferred or newly pledged

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod access;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod funds;
pub mod ledger;
pub mod roles;
pub mod storage;
pub mod types;
pub mod units;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::JournalConfig;
pub use error::{Error, ErrorKind, Result};
pub use events::{Event, EventLog, EventRecord, EventSink};
pub use funds::{NativeBalances, Payments};
pub use ledger::ReceiptLedger;
pub use roles::{BankInfo, Obligations, RoleDirectory, RoleLookup, WarehouseInfo};
pub use storage::EventJournal;
pub use types::{
    apply_bps, Address, CallContext, Holding, Pledge, PledgeStatus, Quantity, Receipt,
    ReceiptDetails, ReceiptId, Role, Timestamp, Wei, BPS_DENOMINATOR,
};
