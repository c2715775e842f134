//! Platform state machine
//!
//! Owns the role directory, receipt ledger, marketplace, lending pool and
//! wallet balances, and wires them together: it reads the time from the
//! injected [`Clock`], passes each component the collaborators it needs,
//! records metrics and logs rejected operations.
//!
//! Every mutating method takes the authenticated caller as its first argument.
//!
//! With the journal enabled, [`Platform::new`] replays every journaled record
//! before accepting calls, so ids, balances and pledges continue where the
//! previous process stopped.

use crate::{config::PlatformConfig, metrics::Metrics, Error, Result};
use lending_pool::{LendingPool, Loan, LoanId, LoanTerms, LoanView};
use marketplace::{Listing, ListingId, Marketplace, Purchase};
use receipt_ledger::{
    crypto::{chain_hash, hash_hex, GENESIS_HASH},
    Address, BankInfo, CallContext, Clock, Event, EventJournal, EventLog, EventRecord, EventSink,
    Holding, NativeBalances, Payments, Pledge, PledgeStatus, Quantity, ReceiptDetails, ReceiptId,
    ReceiptLedger, Role, RoleDirectory, Timestamp, WarehouseInfo, Wei,
};
use std::sync::Arc;

/// Journal records read per batch during replay
const REPLAY_BATCH: usize = 1024;

/// CropLock platform
pub struct Platform {
    clock: Arc<dyn Clock>,
    events: Arc<EventLog>,
    admin: Address,
    auto_grant_minter: bool,
    directory: RoleDirectory,
    ledger: ReceiptLedger,
    marketplace: Marketplace,
    lending: LendingPool,
    funds: NativeBalances,
    metrics: Metrics,
}

impl Platform {
    /// Build the platform, replay the journal and credit genesis allocations
    ///
    /// Genesis allocations are credited only when the journal is empty.
    pub fn new(config: &PlatformConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let (events, journal) = if config.journal.enabled {
            let journal = Arc::new(EventJournal::open(&config.journal)?);
            let log = EventLog::with_journal(journal.clone(), config.journal.memory_tail)?;
            (Arc::new(log), Some(journal))
        } else {
            (Arc::new(EventLog::new()), None)
        };
        let sink: Arc<dyn EventSink> = events.clone();

        let admin = Address::new(config.admin.as_str());
        let directory = RoleDirectory::new(admin.clone(), sink.clone());
        let ledger = ReceiptLedger::new(admin.clone(), sink.clone());
        let marketplace = Marketplace::new(&config.marketplace, admin.clone(), sink.clone())?;
        let lending = LendingPool::new(config.lending.clone(), admin.clone(), sink.clone())?;

        let mut platform = Self {
            clock,
            events,
            admin: admin.clone(),
            auto_grant_minter: config.auto_grant_minter,
            directory,
            ledger,
            marketplace,
            lending,
            funds: NativeBalances::new(),
            metrics: Metrics::new()?,
        };

        let replayed = match &journal {
            Some(journal) => platform.replay(journal)?,
            None => 0,
        };

        let now = platform.clock.now();
        let admin_ctx = CallContext::new(admin.clone(), now);
        let pool = platform.lending.address().clone();
        platform
            .ledger
            .grant_role(&admin_ctx, Role::CollateralManager, pool)?;

        if replayed == 0 {
            for allocation in &config.genesis {
                let account = Address::new(allocation.address.as_str());
                let amount = allocation.balance_wei()?;
                platform.funds.deposit(&account, amount)?;
                platform
                    .events
                    .publish(now, Event::FundsDeposited { account, amount });
            }
        } else if !config.genesis.is_empty() {
            tracing::info!(replayed, "Journal not empty; genesis allocations skipped");
        }

        tracing::info!(
            service = %config.service_name,
            %admin,
            marketplace = %platform.marketplace.address(),
            lending_pool = %platform.lending.address(),
            genesis_accounts = config.genesis.len(),
            replayed,
            "Platform initialized"
        );

        platform.refresh_metrics();
        Ok(platform)
    }

    /// Apply every journaled record in order; returns how many were applied
    fn replay(&mut self, journal: &EventJournal) -> Result<u64> {
        let mut expected = 1u64;
        let mut previous_hash = GENESIS_HASH;

        loop {
            let batch = journal.range(expected, REPLAY_BATCH)?;
            if batch.is_empty() {
                break;
            }
            for record in &batch {
                let hash = chain_hash(
                    &record.previous_hash,
                    record.sequence,
                    record.timestamp,
                    &record.event,
                );
                if record.sequence != expected
                    || record.previous_hash != previous_hash
                    || record.hash != hash
                {
                    return Err(receipt_ledger::Error::Storage(format!(
                        "journal chain broken at sequence {} (expected {})",
                        record.sequence, expected
                    ))
                    .into());
                }

                self.apply_record(record)?;
                previous_hash = record.hash;
                expected += 1;
            }
        }

        let replayed = expected - 1;
        if replayed > 0 {
            tracing::info!(
                replayed,
                last_hash = %hash_hex(&previous_hash),
                receipts = self.ledger.total_receipts(),
                listings = self.marketplace.listing_count(),
                loans = self.lending.loan_count(),
                "Journal replayed"
            );
        }
        Ok(replayed)
    }

    fn apply_record(&mut self, record: &EventRecord) -> Result<()> {
        let (at, event) = (record.timestamp, &record.event);
        self.directory.apply_event(at, event)?;
        self.ledger.apply_event(at, event)?;
        self.marketplace.apply_event(at, event)?;
        self.lending.apply_event(at, event)?;
        self.apply_payments(event)
    }

    /// Wallet movements implied by a journaled event
    fn apply_payments(&mut self, event: &Event) -> Result<()> {
        let market = self.marketplace.address().clone();
        let pool = self.lending.address().clone();

        match event {
            Event::FundsDeposited { account, amount } => {
                self.funds.deposit(account, *amount)?;
            }
            Event::PurchaseCompleted {
                buyer,
                seller,
                total_price,
                platform_fee,
                ..
            } => {
                self.funds
                    .transfer(buyer, seller, total_price.saturating_sub(*platform_fee))?;
                self.funds.transfer(buyer, &market, *platform_fee)?;
            }
            Event::MarketplaceFeesWithdrawn { to, amount } => {
                self.funds.transfer(&market, to, *amount)?;
            }
            Event::PoolFunded { bank, amount, .. } => {
                self.funds.transfer(bank, &pool, *amount)?;
            }
            Event::LiquidityWithdrawn { bank, amount, .. } => {
                self.funds.transfer(&pool, bank, *amount)?;
            }
            Event::LoanAccepted {
                farmer, principal, ..
            } => {
                self.funds.transfer(&pool, farmer, *principal)?;
            }
            Event::LoanRepaid {
                farmer,
                bank,
                repayment_amount,
                platform_fee,
                ..
            } => {
                self.funds
                    .transfer(farmer, bank, repayment_amount.saturating_sub(*platform_fee))?;
                self.funds.transfer(farmer, &pool, *platform_fee)?;
            }
            Event::LendingFeesWithdrawn { to, amount } => {
                self.funds.transfer(&pool, to, *amount)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn ctx(&self, caller: &Address) -> CallContext {
        CallContext::new(caller.clone(), self.clock.now())
    }

    fn record<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                self.metrics.record_success(operation);
                self.refresh_metrics();
            }
            Err(e) => {
                tracing::warn!(operation, kind = %e.kind(), error = %e, "Operation rejected");
                self.metrics.record_failure(operation, e.kind());
            }
        }
        result
    }

    fn refresh_metrics(&self) {
        self.metrics.set_gauges(
            self.marketplace.active_listings().len(),
            self.lending.active_loan_count(),
        );
        self.metrics.observe_events(self.events.last_sequence());
        self.metrics
            .observe_journal_failures(self.events.journal_failures());
    }

    // Role directory

    /// Register or re-register a warehouse; grants `Minter` when configured
    pub fn register_warehouse(
        &mut self,
        caller: &Address,
        warehouse: &Address,
        registration_no: &str,
        location: &str,
    ) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self.register_warehouse_inner(&ctx, warehouse, registration_no, location);
        self.record("register_warehouse", result)
    }

    fn register_warehouse_inner(
        &mut self,
        ctx: &CallContext,
        warehouse: &Address,
        registration_no: &str,
        location: &str,
    ) -> Result<()> {
        let cascade = self.auto_grant_minter;
        if cascade && !self.ledger.has_role(Role::Admin, &ctx.caller) {
            return Err(receipt_ledger::Error::Unauthorized(format!(
                "{} cannot grant ledger roles",
                ctx.caller
            ))
            .into());
        }

        self.directory
            .register_warehouse(ctx, warehouse.clone(), registration_no, location)?;
        if cascade {
            self.ledger.grant_role(ctx, Role::Minter, warehouse.clone())?;
        }
        Ok(())
    }

    /// Register or re-register a bank
    pub fn register_bank(
        &mut self,
        caller: &Address,
        bank: &Address,
        name: &str,
        license: &str,
    ) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .directory
            .register_bank(&ctx, bank.clone(), name, license)
            .map_err(Error::from);
        self.record("register_bank", result)
    }

    /// Deactivate a warehouse with no unexpired receipts
    pub fn deactivate_warehouse(&mut self, caller: &Address, warehouse: &Address) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self.deactivate_warehouse_inner(&ctx, warehouse);
        self.record("deactivate_warehouse", result)
    }

    fn deactivate_warehouse_inner(&mut self, ctx: &CallContext, warehouse: &Address) -> Result<()> {
        let cascade = self.auto_grant_minter && self.ledger.has_role(Role::Minter, warehouse);
        if cascade && !self.ledger.has_role(Role::Admin, &ctx.caller) {
            return Err(receipt_ledger::Error::Unauthorized(format!(
                "{} cannot revoke ledger roles",
                ctx.caller
            ))
            .into());
        }

        self.directory
            .deactivate_warehouse(ctx, warehouse, &self.ledger)?;
        if cascade {
            self.ledger.revoke_role(ctx, Role::Minter, warehouse)?;
        }
        Ok(())
    }

    /// Deactivate a bank with no live offers or loans
    pub fn deactivate_bank(&mut self, caller: &Address, bank: &Address) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .directory
            .deactivate_bank(&ctx, bank, &self.lending)
            .map_err(Error::from);
        self.record("deactivate_bank", result)
    }

    /// Add a directory admin
    pub fn grant_admin(&mut self, caller: &Address, account: &Address) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .directory
            .grant_admin(&ctx, account.clone())
            .map_err(Error::from);
        self.record("grant_admin", result)
    }

    // Receipt ledger

    /// Grant a ledger role
    pub fn grant_role(&mut self, caller: &Address, role: Role, account: &Address) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .grant_role(&ctx, role, account.clone())
            .map_err(Error::from);
        self.record("grant_role", result)
    }

    /// Revoke a ledger role
    pub fn revoke_role(&mut self, caller: &Address, role: Role, account: &Address) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .revoke_role(&ctx, role, account)
            .map_err(Error::from);
        self.record("revoke_role", result)
    }

    /// Issue a receipt to `to`
    pub fn issue_receipt(
        &mut self,
        caller: &Address,
        to: &Address,
        quantity: Quantity,
        expiry: Timestamp,
        metadata_ref: &str,
    ) -> Result<ReceiptId> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .issue(&ctx, &self.directory, to.clone(), quantity, expiry, metadata_ref)
            .map_err(Error::from);
        self.record("issue_receipt", result)
    }

    /// Move unpledged units
    pub fn transfer(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .transfer(&ctx, from, to, receipt_id, amount)
            .map_err(Error::from);
        self.record("transfer", result)
    }

    /// Approve or revoke an operator
    pub fn set_approval_for_all(
        &mut self,
        caller: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .set_approval_for_all(&ctx, operator.clone(), approved)
            .map_err(Error::from);
        self.record("set_approval_for_all", result)
    }

    /// Pledge the caller's units to `lender`
    pub fn pledge_collateral(
        &mut self,
        caller: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
        lender: &Address,
    ) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .pledge_collateral(&ctx, receipt_id, amount, lender.clone())
            .map_err(Error::from);
        self.record("pledge_collateral", result)
    }

    /// Lender releases part of a pledge
    pub fn unpledge_collateral(
        &mut self,
        caller: &Address,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .unpledge_collateral(&ctx, holder, receipt_id, amount)
            .map_err(Error::from);
        self.record("unpledge_collateral", result)
    }

    /// Replace a receipt's metadata pointer
    pub fn update_metadata(
        &mut self,
        caller: &Address,
        receipt_id: ReceiptId,
        metadata_ref: &str,
    ) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .ledger
            .update_metadata(&ctx, receipt_id, metadata_ref)
            .map_err(Error::from);
        self.record("update_metadata", result)
    }

    /// Engage the ledger circuit breaker
    pub fn pause(&mut self, caller: &Address) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self.ledger.pause(&ctx).map_err(Error::from);
        self.record("pause", result)
    }

    /// Release the ledger circuit breaker
    pub fn unpause(&mut self, caller: &Address) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self.ledger.unpause(&ctx).map_err(Error::from);
        self.record("unpause", result)
    }

    // Marketplace

    /// List units for sale
    pub fn list_for_sale(
        &mut self,
        caller: &Address,
        receipt_id: ReceiptId,
        quantity: Quantity,
        price_per_unit: Wei,
    ) -> Result<ListingId> {
        let ctx = self.ctx(caller);
        let result = self
            .marketplace
            .list_for_sale(&ctx, &self.ledger, receipt_id, quantity, price_per_unit)
            .map_err(Error::from);
        self.record("list_for_sale", result)
    }

    /// Buy from a listing
    pub fn buy_token(
        &mut self,
        caller: &Address,
        listing_id: ListingId,
        quantity: Quantity,
        payment: Wei,
    ) -> Result<Purchase> {
        let ctx = self.ctx(caller);
        let result = self
            .marketplace
            .buy_token(
                &ctx,
                &mut self.ledger,
                &mut self.funds,
                listing_id,
                quantity,
                payment,
            )
            .map_err(Error::from);
        self.record("buy_token", result)
    }

    /// Cancel a listing
    pub fn cancel_listing(&mut self, caller: &Address, listing_id: ListingId) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .marketplace
            .cancel_listing(&ctx, listing_id)
            .map_err(Error::from);
        self.record("cancel_listing", result)
    }

    /// Withdraw accrued marketplace fees
    pub fn withdraw_marketplace_fees(&mut self, caller: &Address) -> Result<Wei> {
        let ctx = self.ctx(caller);
        let result = self
            .marketplace
            .withdraw_platform_fees(&ctx, &mut self.funds)
            .map_err(Error::from);
        self.record("withdraw_marketplace_fees", result)
    }

    // Lending

    /// Deposit lendable liquidity
    pub fn fund_pool(&mut self, caller: &Address, amount: Wei) -> Result<Wei> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .fund_pool(&ctx, &mut self.funds, amount)
            .map_err(Error::from);
        self.record("fund_pool", result)
    }

    /// Withdraw idle liquidity
    pub fn withdraw_liquidity(&mut self, caller: &Address, amount: Wei) -> Result<Wei> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .withdraw_liquidity(&ctx, &mut self.funds, amount)
            .map_err(Error::from);
        self.record("withdraw_liquidity", result)
    }

    /// Offer a loan
    pub fn offer_loan(&mut self, caller: &Address, terms: LoanTerms) -> Result<LoanId> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .offer_loan(&ctx, &self.directory, &self.ledger, terms)
            .map_err(Error::from);
        self.record("offer_loan", result)
    }

    /// Cancel an offer
    pub fn cancel_offer(&mut self, caller: &Address, loan_id: LoanId) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .cancel_offer(&ctx, loan_id)
            .map_err(Error::from);
        self.record("cancel_offer", result)
    }

    /// Accept an offer
    pub fn accept_loan(&mut self, caller: &Address, loan_id: LoanId) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .accept_loan(&ctx, &self.ledger, &mut self.funds, loan_id)
            .map_err(Error::from);
        self.record("accept_loan", result)
    }

    /// Repay a loan; returns the amount paid to the bank
    pub fn repay_loan(&mut self, caller: &Address, loan_id: LoanId, payment: Wei) -> Result<Wei> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .repay_loan(&ctx, &mut self.ledger, &mut self.funds, loan_id, payment)
            .map_err(Error::from);
        self.record("repay_loan", result)
    }

    /// Seize the collateral of an overdue loan
    pub fn liquidate_collateral(&mut self, caller: &Address, loan_id: LoanId) -> Result<()> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .liquidate_collateral(&ctx, &mut self.ledger, loan_id)
            .map_err(Error::from);
        self.record("liquidate_collateral", result)
    }

    /// Withdraw accrued lending fees
    pub fn withdraw_lending_fees(&mut self, caller: &Address) -> Result<Wei> {
        let ctx = self.ctx(caller);
        let result = self
            .lending
            .withdraw_platform_fees(&ctx, &mut self.funds)
            .map_err(Error::from);
        self.record("withdraw_lending_fees", result)
    }

    // Wallets

    /// Credit money arriving from outside the platform (admin only)
    pub fn deposit(&mut self, caller: &Address, account: &Address, amount: Wei) -> Result<Wei> {
        let ctx = self.ctx(caller);
        let result = self.deposit_inner(&ctx, account, amount);
        self.record("deposit", result)
    }

    fn deposit_inner(&mut self, ctx: &CallContext, account: &Address, amount: Wei) -> Result<Wei> {
        if ctx.caller != self.admin {
            return Err(receipt_ledger::Error::Unauthorized(format!(
                "{} cannot mint native funds",
                ctx.caller
            ))
            .into());
        }
        let balance = self.funds.deposit(account, amount)?;
        self.events.publish(
            ctx.now,
            Event::FundsDeposited {
                account: account.clone(),
                amount,
            },
        );
        Ok(balance)
    }

    /// Native currency balance
    pub fn wallet_balance(&self, account: &Address) -> Wei {
        self.funds.balance_of(account)
    }

    // Reads

    /// Current platform time
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Units held
    pub fn balance_of(&self, holder: &Address, receipt_id: ReceiptId) -> Quantity {
        self.ledger.balance_of(holder, receipt_id)
    }

    /// Units not under pledge
    pub fn transferable(&self, holder: &Address, receipt_id: ReceiptId) -> Quantity {
        self.ledger.transferable(holder, receipt_id)
    }

    /// Pledge read model
    pub fn pledge_status(&self, holder: &Address, receipt_id: ReceiptId) -> PledgeStatus {
        self.ledger.pledge_status(holder, receipt_id)
    }

    /// Receipt validity now
    pub fn is_valid(&self, receipt_id: ReceiptId) -> bool {
        self.ledger.is_valid(receipt_id, self.now())
    }

    /// Receipt read model
    pub fn receipt_details(&self, receipt_id: ReceiptId) -> Result<ReceiptDetails> {
        Ok(self.ledger.receipt_details(receipt_id, self.now())?)
    }

    /// Non-empty holdings of `holder`
    pub fn holdings_of(&self, holder: &Address) -> Vec<(ReceiptId, Holding)> {
        self.ledger.holdings_of(holder)
    }

    /// Live pledges naming `lender`, as `(holder, receipt, pledge)`
    pub fn pledges_to(&self, lender: &Address) -> Vec<(Address, ReceiptId, Pledge)> {
        self.ledger.pledges_to(lender)
    }

    /// Listing by ID
    pub fn get_listing(&self, listing_id: ListingId) -> Result<Listing> {
        Ok(self.marketplace.get_listing(listing_id)?.clone())
    }

    /// Open listings
    pub fn active_listings(&self) -> Vec<Listing> {
        self.marketplace.active_listings().into_iter().cloned().collect()
    }

    /// Listings created by `seller`
    pub fn listings_by_seller(&self, seller: &Address) -> Vec<Listing> {
        self.marketplace
            .listings_by_seller(seller)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Loan by ID
    pub fn get_loan(&self, loan_id: LoanId) -> Result<Loan> {
        Ok(self.lending.get_loan(loan_id)?.clone())
    }

    /// Lazy loan status now
    pub fn loan_status(&self, loan_id: LoanId) -> Result<LoanView> {
        Ok(self.lending.status_at(loan_id, self.now())?)
    }

    /// Loans of a borrower
    pub fn loans_of_farmer(&self, farmer: &Address) -> Vec<Loan> {
        self.lending
            .loans_of_farmer(farmer)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Loans of a lender
    pub fn loans_of_bank(&self, bank: &Address) -> Vec<Loan> {
        self.lending.loans_of_bank(bank).into_iter().cloned().collect()
    }

    /// Warehouse details
    pub fn warehouse(&self, account: &Address) -> Option<WarehouseInfo> {
        self.directory.warehouse(account).cloned()
    }

    /// Bank details
    pub fn bank(&self, account: &Address) -> Option<BankInfo> {
        self.directory.bank(account).cloned()
    }

    /// Every registered warehouse, by address
    pub fn warehouses(&self) -> Vec<(Address, WarehouseInfo)> {
        self.directory
            .warehouses()
            .into_iter()
            .map(|(a, w)| (a.clone(), w.clone()))
            .collect()
    }

    /// Every registered bank, by address
    pub fn banks(&self) -> Vec<(Address, BankInfo)> {
        self.directory
            .banks()
            .into_iter()
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect()
    }

    /// Active banks, by address
    pub fn active_banks(&self) -> Vec<(Address, BankInfo)> {
        self.directory
            .active_banks()
            .into_iter()
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect()
    }

    /// Records with `sequence >= from`
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.events.since(from)
    }

    /// Platform admin
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Role directory
    pub fn directory(&self) -> &RoleDirectory {
        &self.directory
    }

    /// Receipt ledger
    pub fn ledger(&self) -> &ReceiptLedger {
        &self.ledger
    }

    /// Marketplace
    pub fn marketplace(&self) -> &Marketplace {
        &self.marketplace
    }

    /// Lending pool
    pub fn lending(&self) -> &LendingPool {
        &self.lending
    }

    /// Event log
    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    /// Metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("admin", &self.admin)
            .field("ledger", &self.ledger)
            .field("marketplace", &self.marketplace)
            .field("lending", &self.lending)
            .field("last_sequence", &self.events.last_sequence())
            .finish()
    }
}
