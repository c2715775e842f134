//! Core types for the lending pool

use receipt_ledger::{apply_bps, Address, Quantity, ReceiptId, Timestamp, Wei};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoanId(pub u64);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored loan status
///
/// State machine:
/// ```text
/// Offered → Active → Repaid
///    ↓         ↓
/// Cancelled  Liquidated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Offered by the bank, awaiting the farmer
    Offered,
    /// Principal disbursed
    Active,
    /// Repaid in full
    Repaid,
    /// Collateral seized after default
    Liquidated,
    /// Offer withdrawn by the bank
    Cancelled,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Status as observed at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanView {
    /// Offer open for acceptance
    Offered,
    /// Offer past its acceptance window
    Expired,
    /// Running, not yet due
    Active,
    /// Running past its end time; liquidatable
    Overdue,
    /// Repaid
    Repaid,
    /// Liquidated
    Liquidated,
    /// Cancelled
    Cancelled,
}

/// Collateralized loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Loan ID
    pub id: LoanId,
    /// Lender
    pub bank: Address,
    /// Borrower
    pub farmer: Address,
    /// Collateral receipt
    pub receipt_id: ReceiptId,
    /// Pledged units backing the loan
    pub collateral_amount: Quantity,
    /// Principal in wei
    pub principal: Wei,
    /// Simple interest over the whole term
    pub interest_rate_bps: u32,
    /// Term length
    pub duration_secs: u64,
    /// `principal + principal * rate / 10000`
    pub repayment_amount: Wei,
    /// Offer time
    pub offered_at: Timestamp,
    /// Last instant the offer can be accepted
    pub offer_expires_at: Timestamp,
    /// Acceptance time
    pub start_time: Option<Timestamp>,
    /// Due time
    pub end_time: Option<Timestamp>,
    /// Stored status
    pub status: LoanStatus,
    /// Repayment, liquidation or cancellation time
    pub closed_at: Option<Timestamp>,
}

impl Loan {
    /// Principal disbursed and not yet settled
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// `repayment_amount - principal`
    pub fn interest(&self) -> Wei {
        self.repayment_amount - self.principal
    }

    /// Lazy status view at `now`
    pub fn status_at(&self, now: Timestamp) -> LoanView {
        match self.status {
            LoanStatus::Offered if now > self.offer_expires_at => LoanView::Expired,
            LoanStatus::Offered => LoanView::Offered,
            LoanStatus::Active if self.end_time.is_some_and(|end| now > end) => LoanView::Overdue,
            LoanStatus::Active => LoanView::Active,
            LoanStatus::Repaid => LoanView::Repaid,
            LoanStatus::Liquidated => LoanView::Liquidated,
            LoanStatus::Cancelled => LoanView::Cancelled,
        }
    }
}

/// `principal + principal * rate / 10000`
pub fn repayment_for(principal: Wei, interest_rate_bps: u32) -> Option<Wei> {
    apply_bps(principal, interest_rate_bps).and_then(|interest| principal.checked_add(interest))
}
