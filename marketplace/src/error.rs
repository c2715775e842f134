//! Error types for the marketplace

use receipt_ledger::ErrorKind;
use thiserror::Error;

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, Error>;

/// Marketplace errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger or payment error
    #[error("Ledger error: {0}")]
    Ledger(#[from] receipt_ledger::Error),

    /// Caller is not allowed to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Zero quantity or above what remains
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Zero unit price
    #[error("Price must be greater than zero")]
    InvalidPrice,

    /// Payment differs from quantity * price
    #[error("Incorrect payment: expected {expected}, received {received}")]
    IncorrectPayment {
        /// Amount due
        expected: u128,
        /// Amount offered
        received: u128,
    },

    /// Seller no longer holds the units
    #[error("Seller has insufficient transferable balance: requested {requested}, available {available}")]
    InsufficientSellerBalance {
        /// Units requested
        requested: u64,
        /// Units the seller can still transfer
        available: u64,
    },

    /// Listing sold out or cancelled
    #[error("Listing {0} is not active")]
    ListingNotActive(u64),

    /// Unknown listing
    #[error("Listing {0} not found")]
    NotFound(u64),

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Ledger(e) => e.kind(),
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::InvalidQuantity(_) => ErrorKind::InvalidQuantity,
            Error::InvalidPrice => ErrorKind::InvalidPrice,
            Error::IncorrectPayment { .. } => ErrorKind::IncorrectPayment,
            Error::InsufficientSellerBalance { .. } => ErrorKind::InsufficientSellerBalance,
            Error::ListingNotActive(_) => ErrorKind::ListingNotActive,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}
