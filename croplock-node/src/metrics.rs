//! Prometheus metrics for the platform
//!
//! # Metrics
//!
//! - `croplock_operations_total{operation}` - Committed operations
//! - `croplock_operation_failures_total{operation,kind}` - Rejected operations
//! - `croplock_events_total` - Events published
//! - `croplock_journal_failures_total` - Events that never reached the journal
//! - `croplock_active_listings` - Open marketplace listings
//! - `croplock_active_loans` - Disbursed, unsettled loans
//!
//! Collectors live on a private [`Registry`] so several platforms can
//! coexist in one process.

use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use receipt_ledger::ErrorKind;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed operations
    pub operations_total: IntCounterVec,

    /// Rejected operations by error kind
    pub failures_total: IntCounterVec,

    /// Events published
    pub events_total: IntCounter,

    /// Failed journal appends
    pub journal_failures_total: IntCounter,

    /// Open listings
    pub active_listings: IntGauge,

    /// Active loans
    pub active_loans: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("croplock_operations_total", "Committed operations"),
            &["operation"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let failures_total = IntCounterVec::new(
            Opts::new("croplock_operation_failures_total", "Rejected operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let events_total = IntCounter::new("croplock_events_total", "Events published")?;
        registry.register(Box::new(events_total.clone()))?;

        let journal_failures_total = IntCounter::new(
            "croplock_journal_failures_total",
            "Events that never reached the journal",
        )?;
        registry.register(Box::new(journal_failures_total.clone()))?;

        let active_listings = IntGauge::new("croplock_active_listings", "Open marketplace listings")?;
        registry.register(Box::new(active_listings.clone()))?;

        let active_loans = IntGauge::new("croplock_active_loans", "Disbursed, unsettled loans")?;
        registry.register(Box::new(active_loans.clone()))?;

        Ok(Self {
            operations_total,
            failures_total,
            events_total,
            journal_failures_total,
            active_listings,
            active_loans,
            registry,
        })
    }

    /// Record a committed operation
    pub fn record_success(&self, operation: &str) {
        self.operations_total.with_label_values(&[operation]).inc();
    }

    /// Record a rejected operation
    pub fn record_failure(&self, operation: &str, kind: ErrorKind) {
        let kind = kind.to_string();
        self.failures_total
            .with_label_values(&[operation, kind.as_str()])
            .inc();
    }

    /// Raise the events counter to the last published sequence
    pub fn observe_events(&self, total: u64) {
        catch_up(&self.events_total, total);
    }

    /// Raise the journal failure counter to the log's failure count
    pub fn observe_journal_failures(&self, total: u64) {
        catch_up(&self.journal_failures_total, total);
    }

    /// Update gauges
    pub fn set_gauges(&self, listings: usize, loans: usize) {
        self.active_listings.set(listings as i64);
        self.active_loans.set(loans as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

fn catch_up(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("events_total", &self.events_total.get())
            .field("journal_failures_total", &self.journal_failures_total.get())
            .field("active_listings", &self.active_listings.get())
            .field("active_loans", &self.active_loans.get())
            .finish()
    }
}
