//! Single-writer actor around the [`Platform`]
//!
//! Every operation is a closure shipped to one Tokio task that owns the
//! platform, so calls are applied one at a time in arrival order and each
//! sees the state left by the previous one.
//!
//! ```text
//!   PlatformHandle (Clone) ──mpsc (bounded)──▶ PlatformActor ──▶ Platform
//!          ▲                                        │
//!          └──────────────── oneshot ───────────────┘
//! ```

use crate::{Error, Platform, Result};
use lending_pool::{LoanId, LoanTerms};
use marketplace::{ListingId, Purchase};
use receipt_ledger::{Address, EventRecord, Quantity, ReceiptId, Timestamp, Wei};
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce(&mut Platform) + Send>;

/// Message sent to the platform actor
pub enum PlatformMessage {
    /// Run a job against the platform
    Execute(Job),

    /// Shutdown actor
    Shutdown,
}

impl std::fmt::Debug for PlatformMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformMessage::Execute(_) => f.write_str("Execute"),
            PlatformMessage::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Actor that owns the platform state
#[derive(Debug)]
pub struct PlatformActor {
    platform: Platform,
    mailbox: mpsc::Receiver<PlatformMessage>,
}

impl PlatformActor {
    /// Create new actor
    pub fn new(platform: Platform, mailbox: mpsc::Receiver<PlatformMessage>) -> Self {
        Self { platform, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        tracing::info!("Platform actor started");

        while let Some(message) = self.mailbox.recv().await {
            match message {
                PlatformMessage::Execute(job) => job(&mut self.platform),
                PlatformMessage::Shutdown => {
                    tracing::info!("Platform actor shutting down");
                    break;
                }
            }
        }

        tracing::info!(
            last_sequence = self.platform.event_log().last_sequence(),
            "Platform actor stopped"
        );
    }
}

/// Handle for sending messages to the platform actor
#[derive(Clone, Debug)]
pub struct PlatformHandle {
    sender: mpsc::Sender<PlatformMessage>,
}

impl PlatformHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<PlatformMessage>) -> Self {
        Self { sender }
    }

    /// Run a fallible operation on the actor and wait for its result
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Platform) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.execute(f).await?
    }

    /// Run a closure on the actor and wait for its return value
    pub async fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Platform) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |platform: &mut Platform| {
            let _ = tx.send(f(platform));
        });

        self.sender
            .send(PlatformMessage::Execute(job))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Issue a receipt
    pub async fn issue_receipt(
        &self,
        caller: Address,
        to: Address,
        quantity: Quantity,
        expiry: Timestamp,
        metadata_ref: String,
    ) -> Result<ReceiptId> {
        self.call(move |p| p.issue_receipt(&caller, &to, quantity, expiry, &metadata_ref))
            .await
    }

    /// Transfer unpledged units
    pub async fn transfer(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        self.call(move |p| p.transfer(&caller, &from, &to, receipt_id, amount))
            .await
    }

    /// Pledge units to a lender
    pub async fn pledge_collateral(
        &self,
        caller: Address,
        receipt_id: ReceiptId,
        amount: Quantity,
        lender: Address,
    ) -> Result<()> {
        self.call(move |p| p.pledge_collateral(&caller, receipt_id, amount, &lender))
            .await
    }

    /// List units for sale
    pub async fn list_for_sale(
        &self,
        caller: Address,
        receipt_id: ReceiptId,
        quantity: Quantity,
        price_per_unit: Wei,
    ) -> Result<ListingId> {
        self.call(move |p| p.list_for_sale(&caller, receipt_id, quantity, price_per_unit))
            .await
    }

    /// Buy from a listing
    pub async fn buy_token(
        &self,
        caller: Address,
        listing_id: ListingId,
        quantity: Quantity,
        payment: Wei,
    ) -> Result<Purchase> {
        self.call(move |p| p.buy_token(&caller, listing_id, quantity, payment))
            .await
    }

    /// Offer a loan
    pub async fn offer_loan(&self, caller: Address, terms: LoanTerms) -> Result<LoanId> {
        self.call(move |p| p.offer_loan(&caller, terms)).await
    }

    /// Repay a loan
    pub async fn repay_loan(&self, caller: Address, loan_id: LoanId, payment: Wei) -> Result<Wei> {
        self.call(move |p| p.repay_loan(&caller, loan_id, payment))
            .await
    }

    /// Units held
    pub async fn balance_of(&self, holder: Address, receipt_id: ReceiptId) -> Result<Quantity> {
        self.execute(move |p| p.balance_of(&holder, receipt_id)).await
    }

    /// Event records with `sequence >= from`
    pub async fn events_since(&self, from: u64) -> Result<Vec<EventRecord>> {
        self.execute(move |p| p.events_since(from)).await
    }

    /// Rendered Prometheus metrics
    pub async fn render_metrics(&self) -> Result<String> {
        self.execute(|p| p.metrics().render()).await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(PlatformMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the platform actor
pub fn spawn_platform_actor(platform: Platform, mailbox_capacity: usize) -> PlatformHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = PlatformActor::new(platform, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    PlatformHandle::new(tx)
}
