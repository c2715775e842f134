//! Core types for the receipt ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact integer arithmetic (commodity units and wei)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Commodity quantity (kg-equivalent units)
pub type Quantity = u64;

/// Native currency amount in the smallest unit
pub type Wei = u128;

/// Basis-point denominator
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Account address (stored lower-case)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create new address
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_ascii_lowercase())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::new(s)
    }
}

/// Receipt (token class) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReceiptId(pub u64);

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller identity and block time for a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated caller
    pub caller: Address,
    /// Time the call executes at
    pub now: Timestamp,
}

impl CallContext {
    /// Create new call context
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Same instant, different caller (a component acting as operator)
    pub fn with_caller(&self, caller: &Address) -> Self {
        Self {
            caller: caller.clone(),
            now: self.now,
        }
    }
}

/// Ledger capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Grants roles, pauses the ledger
    Admin,
    /// May issue receipts
    Minter,
    /// May release or seize pledged collateral on a lender's behalf
    CollateralManager,
}

/// Warehouse receipt, one per issuance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt ID
    pub id: ReceiptId,
    /// Issuer of record (warehouse)
    pub issuer: Address,
    /// Units minted at issuance
    pub total_supply: Quantity,
    /// Receipt is invalid from this instant on
    pub expiry: Timestamp,
    /// Content-addressed metadata pointer
    pub metadata_ref: String,
    /// Issuance time
    pub issued_at: Timestamp,
}

impl Receipt {
    /// Valid strictly before expiry
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        now < self.expiry
    }
}

/// Collateral claim on part of a holding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pledge {
    /// Lender holding the claim
    pub lender: Address,
    /// Pledged units
    pub amount: Quantity,
}

/// Units of one receipt held by one address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Total units held
    pub balance: Quantity,
    /// Active pledge, if any
    pub pledge: Option<Pledge>,
}

impl Holding {
    /// Units under pledge
    pub fn pledged(&self) -> Quantity {
        self.pledge.as_ref().map_or(0, |p| p.amount)
    }

    /// Units free to move
    pub fn transferable(&self) -> Quantity {
        self.balance.saturating_sub(self.pledged())
    }

    /// Nothing held and nothing pledged
    pub fn is_empty(&self) -> bool {
        self.balance == 0 && self.pledge.is_none()
    }
}

/// Read model for a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptDetails {
    /// Receipt ID
    pub id: ReceiptId,
    /// Issuer of record
    pub issuer: Address,
    /// Units minted
    pub supply: Quantity,
    /// Expiry
    pub expiry: Timestamp,
    /// Metadata pointer
    pub metadata_ref: String,
    /// `now < expiry`
    pub valid: bool,
}

/// Read model for a holder's pledge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PledgeStatus {
    /// Whether any units are pledged
    pub is_pledged: bool,
    /// Lender, if pledged
    pub lender: Option<Address>,
    /// Pledged units
    pub amount: Quantity,
}

impl From<&Holding> for PledgeStatus {
    fn from(holding: &Holding) -> Self {
        match &holding.pledge {
            Some(p) => Self {
                is_pledged: true,
                lender: Some(p.lender.clone()),
                amount: p.amount,
            },
            None => Self {
                is_pledged: false,
                lender: None,
                amount: 0,
            },
        }
    }
}

/// `amount * bps / 10000`, truncating toward zero
pub fn apply_bps(amount: Wei, bps: u32) -> Option<Wei> {
    amount
        .checked_mul(bps as u128)
        .map(|v| v / BPS_DENOMINATOR)
}
