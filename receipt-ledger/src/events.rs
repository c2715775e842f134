//! Append-only event log
//!
//! Every committed mutation in the directory, ledger, marketplace and
//! lending pool publishes exactly one [`Event`] carrying the changed fields.
//! Publication is synchronous and happens after the state change is final.
//!
//! [`EventLog`] chains records with SHA-256 and, when a journal is attached,
//! writes them through to RocksDB for external indexers. With a journal only
//! the most recent records stay in memory; older ranges are read back from
//! RocksDB.

use crate::{
    crypto::{chain_hash, hash_hex, GENESIS_HASH},
    storage::EventJournal,
    types::{Address, Quantity, ReceiptId, Role, Timestamp, Wei},
    Result,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// State change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Ledger role granted
    RoleGranted {
        /// Role
        role: Role,
        /// Grantee
        account: Address,
    },
    /// Ledger role revoked
    RoleRevoked {
        /// Role
        role: Role,
        /// Former holder
        account: Address,
    },
    /// Directory admin added
    AdminGranted {
        /// New admin
        account: Address,
    },
    /// Warehouse registered or re-registered
    WarehouseRegistered {
        /// Warehouse address
        warehouse: Address,
        /// Regulator registration number
        registration_no: String,
        /// Location
        location: String,
    },
    /// Warehouse deactivated
    WarehouseDeactivated {
        /// Warehouse address
        warehouse: Address,
    },
    /// Bank registered or re-registered
    BankRegistered {
        /// Bank address
        bank: Address,
        /// Display name
        name: String,
        /// Banking license
        license: String,
    },
    /// Bank deactivated
    BankDeactivated {
        /// Bank address
        bank: Address,
    },
    /// Receipt minted
    ReceiptIssued {
        /// New receipt
        receipt_id: ReceiptId,
        /// Issuer of record
        issuer: Address,
        /// First holder
        to: Address,
        /// Units minted
        quantity: Quantity,
        /// Expiry
        expiry: Timestamp,
        /// Metadata pointer
        metadata_ref: String,
    },
    /// Units moved between holders
    Transfer {
        /// Caller that moved the units
        operator: Address,
        /// Debited holder
        from: Address,
        /// Credited holder
        to: Address,
        /// Receipt
        receipt_id: ReceiptId,
        /// Units
        amount: Quantity,
    },
    /// Operator approval changed
    ApprovalForAll {
        /// Holder
        owner: Address,
        /// Operator
        operator: Address,
        /// New approval state
        approved: bool,
    },
    /// Units pledged as collateral
    CollateralPledged {
        /// Receipt
        receipt_id: ReceiptId,
        /// Holder
        holder: Address,
        /// Lender
        lender: Address,
        /// Units added to the pledge
        amount: Quantity,
        /// Pledge total after the call
        total_pledged: Quantity,
    },
    /// Pledge reduced or cleared
    CollateralUnpledged {
        /// Receipt
        receipt_id: ReceiptId,
        /// Holder
        holder: Address,
        /// Lender
        lender: Address,
        /// Units released
        amount: Quantity,
        /// Pledge remaining after the call
        remaining: Quantity,
    },
    /// Pledged units moved to the lender
    CollateralSeized {
        /// Receipt
        receipt_id: ReceiptId,
        /// Former holder
        holder: Address,
        /// Lender receiving the units
        lender: Address,
        /// Units moved
        amount: Quantity,
    },
    /// Metadata pointer replaced
    MetadataUpdated {
        /// Receipt
        receipt_id: ReceiptId,
        /// New pointer
        metadata_ref: String,
    },
    /// Circuit breaker engaged
    Paused {
        /// Admin
        by: Address,
    },
    /// Circuit breaker released
    Unpaused {
        /// Admin
        by: Address,
    },
    /// Native currency entered the system
    FundsDeposited {
        /// Credited account
        account: Address,
        /// Wei
        amount: Wei,
    },
    /// Listing opened
    ListingCreated {
        /// Listing
        listing_id: u64,
        /// Seller
        seller: Address,
        /// Receipt
        receipt_id: ReceiptId,
        /// Units offered
        quantity: Quantity,
        /// Price per unit in wei
        price_per_unit: Wei,
    },
    /// Listing (partially) filled
    PurchaseCompleted {
        /// Listing
        listing_id: u64,
        /// Buyer
        buyer: Address,
        /// Seller
        seller: Address,
        /// Units bought
        quantity: Quantity,
        /// Wei paid by the buyer
        total_price: Wei,
        /// Fee retained by the marketplace
        platform_fee: Wei,
        /// Units left on the listing
        remaining: Quantity,
    },
    /// Listing withdrawn by its seller
    ListingCancelled {
        /// Listing
        listing_id: u64,
        /// Seller
        seller: Address,
    },
    /// Marketplace fees paid out
    MarketplaceFeesWithdrawn {
        /// Recipient
        to: Address,
        /// Wei
        amount: Wei,
    },
    /// Lender added liquidity
    PoolFunded {
        /// Lender
        bank: Address,
        /// Wei added
        amount: Wei,
        /// Lender liquidity after the call
        liquidity: Wei,
    },
    /// Lender pulled liquidity
    LiquidityWithdrawn {
        /// Lender
        bank: Address,
        /// Wei removed
        amount: Wei,
        /// Lender liquidity after the call
        liquidity: Wei,
    },
    /// Loan offered against a pledge
    LoanOffered {
        /// Loan
        loan_id: u64,
        /// Lender
        bank: Address,
        /// Borrower
        farmer: Address,
        /// Collateral receipt
        receipt_id: ReceiptId,
        /// Pledged units backing the loan
        collateral_amount: Quantity,
        /// Principal in wei
        principal: Wei,
        /// Interest rate
        interest_rate_bps: u32,
        /// Loan duration
        duration_secs: u64,
        /// Offer acceptance deadline
        offer_expires_at: Timestamp,
    },
    /// Offer withdrawn by the lender
    LoanOfferCancelled {
        /// Loan
        loan_id: u64,
        /// Lender
        bank: Address,
    },
    /// Loan accepted and principal disbursed
    LoanAccepted {
        /// Loan
        loan_id: u64,
        /// Borrower
        farmer: Address,
        /// Principal disbursed
        principal: Wei,
        /// Start
        start_time: Timestamp,
        /// Due
        end_time: Timestamp,
    },
    /// Loan repaid and collateral released
    LoanRepaid {
        /// Loan
        loan_id: u64,
        /// Borrower
        farmer: Address,
        /// Lender
        bank: Address,
        /// Wei paid by the borrower
        repayment_amount: Wei,
        /// Fee retained by the pool
        platform_fee: Wei,
        /// Repayment time
        repaid_at: Timestamp,
    },
    /// Collateral moved to the lender after default
    CollateralLiquidated {
        /// Loan
        loan_id: u64,
        /// Lender
        bank: Address,
        /// Borrower
        farmer: Address,
        /// Receipt
        receipt_id: ReceiptId,
        /// Units moved
        collateral_amount: Quantity,
    },
    /// Lending fees paid out
    LendingFeesWithdrawn {
        /// Recipient
        to: Address,
        /// Wei
        amount: Wei,
    },
}

impl Event {
    /// Short name for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Event::RoleGranted { .. } => "RoleGranted",
            Event::RoleRevoked { .. } => "RoleRevoked",
            Event::AdminGranted { .. } => "AdminGranted",
            Event::WarehouseRegistered { .. } => "WarehouseRegistered",
            Event::WarehouseDeactivated { .. } => "WarehouseDeactivated",
            Event::BankRegistered { .. } => "BankRegistered",
            Event::BankDeactivated { .. } => "BankDeactivated",
            Event::ReceiptIssued { .. } => "ReceiptIssued",
            Event::Transfer { .. } => "Transfer",
            Event::ApprovalForAll { .. } => "ApprovalForAll",
            Event::CollateralPledged { .. } => "CollateralPledged",
            Event::CollateralUnpledged { .. } => "CollateralUnpledged",
            Event::CollateralSeized { .. } => "CollateralSeized",
            Event::MetadataUpdated { .. } => "MetadataUpdated",
            Event::Paused { .. } => "Paused",
            Event::Unpaused { .. } => "Unpaused",
            Event::FundsDeposited { .. } => "FundsDeposited",
            Event::ListingCreated { .. } => "ListingCreated",
            Event::PurchaseCompleted { .. } => "PurchaseCompleted",
            Event::ListingCancelled { .. } => "ListingCancelled",
            Event::MarketplaceFeesWithdrawn { .. } => "MarketplaceFeesWithdrawn",
            Event::PoolFunded { .. } => "PoolFunded",
            Event::LiquidityWithdrawn { .. } => "LiquidityWithdrawn",
            Event::LoanOffered { .. } => "LoanOffered",
            Event::LoanOfferCancelled { .. } => "LoanOfferCancelled",
            Event::LoanAccepted { .. } => "LoanAccepted",
            Event::LoanRepaid { .. } => "LoanRepaid",
            Event::CollateralLiquidated { .. } => "CollateralLiquidated",
            Event::LendingFeesWithdrawn { .. } => "LendingFeesWithdrawn",
        }
    }
}

/// Event as recorded in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 1
    pub sequence: u64,
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,
    /// Execution time of the call that produced the event
    pub timestamp: Timestamp,
    /// Hash of the previous record
    pub previous_hash: [u8; 32],
    /// Hash of this record
    pub hash: [u8; 32],
    /// Payload
    pub event: Event,
}

/// Synchronous receiver of committed events
pub trait EventSink: Send + Sync {
    /// Record an event; called once per committed mutation
    fn publish(&self, timestamp: Timestamp, event: Event);
}

struct LogState {
    records: VecDeque<EventRecord>,
    next_sequence: u64,
    last_hash: [u8; 32],
    journal_failures: u64,
}

impl LogState {
    fn first_in_memory(&self) -> u64 {
        self.records.front().map_or(self.next_sequence, |r| r.sequence)
    }
}

/// Append-only event log with optional RocksDB write-through
pub struct EventLog {
    state: RwLock<LogState>,
    journal: Option<Arc<EventJournal>>,
    memory_tail: usize,
}

impl EventLog {
    /// Empty log without persistence; every record stays in memory
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LogState {
                records: VecDeque::new(),
                next_sequence: 1,
                last_hash: GENESIS_HASH,
                journal_failures: 0,
            }),
            journal: None,
            memory_tail: usize::MAX,
        }
    }

    /// Log that writes through to `journal`, continuing its sequence and hash chain
    ///
    /// At most `memory_tail` records are kept in memory.
    pub fn with_journal(journal: Arc<EventJournal>, memory_tail: usize) -> Result<Self> {
        let (next_sequence, last_hash) = match journal.latest()? {
            Some(last) => (last.sequence + 1, last.hash),
            None => (1, GENESIS_HASH),
        };

        tracing::info!(
            next_sequence,
            last_hash = %hash_hex(&last_hash),
            memory_tail,
            "Event log attached to journal"
        );

        Ok(Self {
            state: RwLock::new(LogState {
                records: VecDeque::new(),
                next_sequence,
                last_hash,
                journal_failures: 0,
            }),
            journal: Some(journal),
            memory_tail: memory_tail.max(1),
        })
    }

    /// Records held in memory
    pub fn records(&self) -> Vec<EventRecord> {
        self.state.read().records.iter().cloned().collect()
    }

    /// Records with `sequence >= from`
    ///
    /// Ranges older than the in-memory tail come from the journal.
    pub fn since(&self, from: u64) -> Vec<EventRecord> {
        let state = self.state.read();
        let first_in_memory = state.first_in_memory();

        let mut out = Vec::new();
        if let (Some(journal), true) = (&self.journal, from < first_in_memory) {
            let start = from.max(1);
            match journal.range(start, (first_in_memory - start) as usize) {
                Ok(older) => out.extend(older.into_iter().filter(|r| r.sequence < first_in_memory)),
                Err(e) => tracing::warn!(from, error = %e, "Failed to read journal range"),
            }
        }

        out.extend(state.records.iter().filter(|r| r.sequence >= from).cloned());
        out
    }

    /// Payloads held in memory, in order
    pub fn events(&self) -> Vec<Event> {
        self.state.read().records.iter().map(|r| r.event.clone()).collect()
    }

    /// Number of in-memory records
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// No records in memory
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequence of the newest record, journaled or not; 0 when empty
    pub fn last_sequence(&self) -> u64 {
        self.state.read().next_sequence - 1
    }

    /// Most recent record published by this process
    pub fn last(&self) -> Option<EventRecord> {
        self.state.read().records.back().cloned()
    }

    /// Journal appends that failed since the log was opened
    pub fn journal_failures(&self) -> u64 {
        self.state.read().journal_failures
    }

    /// The journal is missing at least one published record
    pub fn is_degraded(&self) -> bool {
        self.journal_failures() > 0
    }

    /// Re-hash every in-memory record and check the chain links
    ///
    /// A degraded log never verifies: its durable copy has a gap.
    pub fn verify_chain(&self) -> bool {
        let state = self.state.read();
        state.journal_failures == 0 && crate::crypto::verify_chain(&state.records)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("EventLog")
            .field("records", &state.records.len())
            .field("next_sequence", &state.next_sequence)
            .field("journal", &self.journal.is_some())
            .field("journal_failures", &state.journal_failures)
            .finish()
    }
}

impl EventSink for EventLog {
    fn publish(&self, timestamp: Timestamp, event: Event) {
        let mut state = self.state.write();

        let sequence = state.next_sequence;
        let previous_hash = state.last_hash;
        let hash = chain_hash(&previous_hash, sequence, timestamp, &event);

        let record = EventRecord {
            sequence,
            event_id: Uuid::now_v7(),
            timestamp,
            previous_hash,
            hash,
            event,
        };

        if let Some(journal) = &self.journal {
            // State is already committed; a journal failure cannot roll it back.
            if let Err(e) = journal.append(&record) {
                state.journal_failures += 1;
                tracing::error!(
                    sequence,
                    failures = state.journal_failures,
                    error = %e,
                    "Failed to journal event; log degraded"
                );
            }
        }

        tracing::debug!(sequence, event = record.event.name(), "Event published");

        state.next_sequence += 1;
        state.last_hash = hash;
        state.records.push_back(record);
        while state.records.len() > self.memory_tail {
            state.records.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paused() -> Event {
        Event::Paused {
            by: Address::new("admin"),
        }
    }

    #[test]
    fn test_sequence_and_chain() {
        let log = EventLog::new();
        log.publish(10, paused());
        log.publish(11, Event::Unpaused { by: Address::new("admin") });

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, 1);
        assert_eq!(records[1].sequence, 2);
        assert_eq!(records[0].previous_hash, GENESIS_HASH);
        assert_eq!(records[1].previous_hash, records[0].hash);
        assert!(log.verify_chain());
    }

    #[test]
    fn test_since() {
        let log = EventLog::new();
        for ts in 0..5 {
            log.publish(ts, paused());
        }
        assert_eq!(log.since(4).len(), 2);
        assert_eq!(log.last().map(|r| r.sequence), Some(5));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(paused()).unwrap();
        assert_eq!(json["Paused"]["by"], "admin");
    }
}
