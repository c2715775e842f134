//! Error types for the receipt ledger and role directory

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, enumerable failure kind shared by every CropLock component.
///
/// Callers match on the kind; the error's display string is the
/// human-readable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Caller lacks the required capability
    Unauthorized,
    /// Expiry not in the future
    InvalidExpiry,
    /// Zero or out-of-range quantity
    InvalidQuantity,
    /// Zero price
    InvalidPrice,
    /// Malformed input (empty identifiers, etc.)
    InvalidInput,
    /// Loan terms rejected
    InvalidLoanTerms,
    /// Payment does not match the amount due
    IncorrectPayment,
    /// Receipt past its expiry
    ExpiredReceipt,
    /// Amount exceeds the holder's unpledged balance
    InsufficientUnpledgedBalance,
    /// Seller no longer holds enough transferable units
    InsufficientSellerBalance,
    /// Native currency balance too low
    InsufficientFunds,
    /// Release exceeds the pledged amount
    ExceedsPledgedAmount,
    /// Pledge names a different lender
    PledgeConflict,
    /// No pledge covering the requested collateral
    NoMatchingPledge,
    /// Listing is no longer active
    ListingNotActive,
    /// Unknown receipt, listing, loan, pledge or entity
    NotFound,
    /// Loan is not active
    LoanNotActive,
    /// Loan is in the wrong state for the transition
    InvalidLoanState,
    /// Loan end time not yet passed
    LoanNotOverdue,
    /// Loan offer passed its acceptance window
    OfferExpired,
    /// Lender liquidity cannot cover the principal
    InsufficientPoolFunds,
    /// Entity still has live receipts or loans
    OutstandingObligations,
    /// Circuit breaker engaged
    Paused,
    /// Checked arithmetic overflowed
    ArithmeticOverflow,
    /// Journal storage failure
    Storage,
    /// Encoding failure
    Serialization,
    /// Invalid configuration
    Config,
    /// Actor mailbox failure
    Concurrency,
    /// Anything else
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Caller lacks a capability
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Expiry must be in the future
    #[error("Expiry must be in future (expiry {expiry}, now {now})")]
    InvalidExpiry {
        /// Requested expiry
        expiry: i64,
        /// Current time
        now: i64,
    },

    /// Quantity must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Receipt past expiry
    #[error("Cannot transfer expired receipt {0}")]
    ExpiredReceipt(u64),

    /// Unpledged balance too small
    #[error("Insufficient unpledged balance: requested {requested}, available {available}")]
    InsufficientUnpledgedBalance {
        /// Units requested
        requested: u64,
        /// Units transferable
        available: u64,
    },

    /// Native currency balance too small
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Wei required
        required: u128,
        /// Wei available
        available: u128,
    },

    /// Release larger than the pledge
    #[error("Exceeds pledged amount: requested {requested}, pledged {pledged}")]
    ExceedsPledgedAmount {
        /// Units requested
        requested: u64,
        /// Units pledged
        pledged: u64,
    },

    /// Conflicting pledge lender
    #[error("Pledge conflict: {0}")]
    PledgeConflict(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity still has obligations
    #[error("Outstanding obligations: {0}")]
    OutstandingObligations(String),

    /// Ledger paused
    #[error("Ledger is paused")]
    Paused,

    /// Arithmetic overflow
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::InvalidExpiry { .. } => ErrorKind::InvalidExpiry,
            Error::InvalidQuantity(_) => ErrorKind::InvalidQuantity,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::ExpiredReceipt(_) => ErrorKind::ExpiredReceipt,
            Error::InsufficientUnpledgedBalance { .. } => ErrorKind::InsufficientUnpledgedBalance,
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::ExceedsPledgedAmount { .. } => ErrorKind::ExceedsPledgedAmount,
            Error::PledgeConflict(_) => ErrorKind::PledgeConflict,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::OutstandingObligations(_) => ErrorKind::OutstandingObligations,
            Error::Paused => ErrorKind::Paused,
            Error::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        Error::ArithmeticOverflow(context.to_string())
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
