//! Error types for the platform node

use receipt_ledger::ErrorKind;
use thiserror::Error;

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, Error>;

/// Platform errors
#[derive(Error, Debug)]
pub enum Error {
    /// Directory, ledger or payment error
    #[error("Ledger error: {0}")]
    Ledger(#[from] receipt_ledger::Error),

    /// Marketplace error
    #[error("Marketplace error: {0}")]
    Marketplace(#[from] marketplace::Error),

    /// Lending error
    #[error("Lending error: {0}")]
    Lending(#[from] lending_pool::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Actor mailbox or reply channel closed
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Ledger(e) => e.kind(),
            Error::Marketplace(e) => e.kind(),
            Error::Lending(e) => e.kind(),
            Error::Config(_) => ErrorKind::Config,
            Error::Metrics(_) => ErrorKind::Internal,
            Error::Concurrency(_) => ErrorKind::Concurrency,
            Error::Io(_) => ErrorKind::Storage,
        }
    }
}
