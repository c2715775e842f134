//! Error types for the lending pool

use receipt_ledger::ErrorKind;
use thiserror::Error;

/// Result type for lending operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lending errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger or payment error
    #[error("Ledger error: {0}")]
    Ledger(#[from] receipt_ledger::Error),

    /// Caller is not the bank, farmer or admin the operation requires
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Zero principal, collateral or duration, or rate above the cap
    #[error("Invalid loan terms: {0}")]
    InvalidLoanTerms(String),

    /// Zero liquidity amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Farmer's pledge does not cover the collateral for this bank
    #[error("No matching pledge: {0}")]
    NoMatchingPledge(String),

    /// Transition not allowed from the current status
    #[error("Invalid loan state: loan {loan_id} is {status}")]
    InvalidLoanState {
        /// Loan
        loan_id: u64,
        /// Current status
        status: String,
    },

    /// Loan is not active
    #[error("Loan {0} is not active")]
    LoanNotActive(u64),

    /// Liquidation before the due time
    #[error("Loan {loan_id} is not overdue (due at {end_time}, now {now})")]
    LoanNotOverdue {
        /// Loan
        loan_id: u64,
        /// Due time
        end_time: i64,
        /// Current time
        now: i64,
    },

    /// Offer acceptance window closed
    #[error("Loan offer {loan_id} expired at {expired_at}")]
    OfferExpired {
        /// Loan
        loan_id: u64,
        /// Offer deadline
        expired_at: i64,
    },

    /// Payment differs from the amount due
    #[error("Incorrect payment: expected {expected}, received {received}")]
    IncorrectPayment {
        /// Amount due
        expected: u128,
        /// Amount offered
        received: u128,
    },

    /// Lender's liquidity cannot cover the request
    #[error("Insufficient pool funds: required {required}, available {available}")]
    InsufficientPoolFunds {
        /// Wei required
        required: u128,
        /// Wei available to the lender
        available: u128,
    },

    /// Unknown loan
    #[error("Loan {0} not found")]
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
            Error::InvalidLoanTerms(_) => ErrorKind::InvalidLoanTerms,
            Error::InvalidAmount(_) => ErrorKind::InvalidQuantity,
            Error::NoMatchingPledge(_) => ErrorKind::NoMatchingPledge,
            Error::InvalidLoanState { .. } => ErrorKind::InvalidLoanState,
            Error::LoanNotActive(_) => ErrorKind::LoanNotActive,
            Error::LoanNotOverdue { .. } => ErrorKind::LoanNotOverdue,
            Error::OfferExpired { .. } => ErrorKind::OfferExpired,
            Error::IncorrectPayment { .. } => ErrorKind::IncorrectPayment,
            Error::InsufficientPoolFunds { .. } => ErrorKind::InsufficientPoolFunds,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ArithmeticOverflow(_) => ErrorKind::ArithmeticOverflow,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        Error::ArithmeticOverflow(context.to_string())
    }
}
