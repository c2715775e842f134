//! Collateralized lending against pledged receipts
//!
//! # Lifecycle
//!
//! 1. **Pledge**: the farmer pledges units to a bank in the ledger
//! 2. **Offer**: the bank offers a loan backed by part of that pledge
//! 3. **Accept**: the farmer accepts within the offer window; principal is
//!    paid out of the bank's liquidity
//! 4. **Repay** or **Liquidate**: exact repayment releases the collateral;
//!    after the end time the bank may seize it instead
//!
//! Each bank lends only its own liquidity, deposited through [`LendingPool::fund_pool`].
//! Collateral is never double-counted: a bank's pledge must cover the
//! collateral of every active loan it holds against that receipt plus the new one.

use crate::{
    config::LendingConfig,
    types::{repayment_for, Loan, LoanId, LoanStatus, LoanView},
    Error, Result,
};
use receipt_ledger::{
    access::AccessControl, apply_bps, Address, CallContext, Event, EventSink, Obligations,
    Payments, Quantity, ReceiptId, ReceiptLedger, Role, RoleLookup, Timestamp, Wei,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Loan terms proposed by a bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTerms {
    /// Borrower
    pub farmer: Address,
    /// Collateral receipt
    pub receipt_id: ReceiptId,
    /// Pledged units backing the loan
    pub collateral_amount: Quantity,
    /// Principal in wei
    pub principal: Wei,
    /// Simple interest over the term
    pub interest_rate_bps: u32,
    /// Term length
    pub duration_secs: u64,
}

/// Lending pool
pub struct LendingPool {
    address: Address,
    access: AccessControl,
    config: LendingConfig,
    loans: BTreeMap<LoanId, Loan>,
    next_loan_id: u64,
    liquidity: HashMap<Address, Wei>,
    accrued_fees: Wei,
    sink: Arc<dyn EventSink>,
}

impl LendingPool {
    /// Create new pool administered by `admin`
    pub fn new(config: LendingConfig, admin: Address, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            address: Address::new(config.address.as_str()),
            access: AccessControl::new(admin),
            config,
            loans: BTreeMap::new(),
            next_loan_id: 1,
            liquidity: HashMap::new(),
            accrued_fees: 0,
            sink,
        })
    }

    /// Account the pool acts as; needs the ledger `CollateralManager` role
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Active configuration
    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    // Liquidity

    /// Move `amount` from the caller's wallet into its lendable liquidity
    pub fn fund_pool(
        &mut self,
        ctx: &CallContext,
        payments: &mut dyn Payments,
        amount: Wei,
    ) -> Result<Wei> {
        if amount == 0 {
            return Err(Error::InvalidAmount("funding amount must be positive".to_string()));
        }

        let bank = ctx.caller.clone();
        let liquidity = self
            .liquidity_of(&bank)
            .checked_add(amount)
            .ok_or_else(|| Error::overflow("liquidity"))?;

        payments.transfer(&bank, &self.address, amount)?;
        self.liquidity.insert(bank.clone(), liquidity);

        tracing::info!(%bank, amount, liquidity, "Pool funded");

        self.sink.publish(
            ctx.now,
            Event::PoolFunded {
                bank,
                amount,
                liquidity,
            },
        );
        Ok(liquidity)
    }

    /// Return `amount` of the caller's idle liquidity to its wallet
    pub fn withdraw_liquidity(
        &mut self,
        ctx: &CallContext,
        payments: &mut dyn Payments,
        amount: Wei,
    ) -> Result<Wei> {
        if amount == 0 {
            return Err(Error::InvalidAmount("withdrawal amount must be positive".to_string()));
        }

        let bank = ctx.caller.clone();
        let available = self.liquidity_of(&bank);
        if amount > available {
            return Err(Error::InsufficientPoolFunds {
                required: amount,
                available,
            });
        }

        payments.transfer(&self.address, &bank, amount)?;
        let liquidity = available - amount;
        self.liquidity.insert(bank.clone(), liquidity);

        tracing::info!(%bank, amount, liquidity, "Liquidity withdrawn");

        self.sink.publish(
            ctx.now,
            Event::LiquidityWithdrawn {
                bank,
                amount,
                liquidity,
            },
        );
        Ok(liquidity)
    }

    /// Idle liquidity of `bank`
    pub fn liquidity_of(&self, bank: &Address) -> Wei {
        self.liquidity.get(bank).copied().unwrap_or(0)
    }

    // Loan lifecycle

    /// Offer a loan against the farmer's pledge to the calling bank
    pub fn offer_loan(
        &mut self,
        ctx: &CallContext,
        roles: &dyn RoleLookup,
        ledger: &ReceiptLedger,
        terms: LoanTerms,
    ) -> Result<LoanId> {
        let bank = ctx.caller.clone();
        if !roles.is_lender_active(&bank) {
            return Err(Error::Unauthorized(format!("{} is not an active bank", bank)));
        }

        if terms.principal == 0 {
            return Err(Error::InvalidLoanTerms("principal must be positive".to_string()));
        }
        if terms.collateral_amount == 0 {
            return Err(Error::InvalidLoanTerms("collateral must be positive".to_string()));
        }
        if terms.duration_secs == 0 {
            return Err(Error::InvalidLoanTerms("duration must be positive".to_string()));
        }
        if terms.interest_rate_bps > self.config.max_interest_rate_bps {
            return Err(Error::InvalidLoanTerms(format!(
                "interest rate {} bps above maximum {} bps",
                terms.interest_rate_bps, self.config.max_interest_rate_bps
            )));
        }
        if i64::try_from(terms.duration_secs).is_err() {
            return Err(Error::InvalidLoanTerms("duration out of range".to_string()));
        }

        let repayment_amount = repayment_for(terms.principal, terms.interest_rate_bps)
            .ok_or_else(|| Error::overflow("repayment amount"))?;

        ledger.receipt(terms.receipt_id)?;
        if !ledger.is_valid(terms.receipt_id, ctx.now) {
            return Err(receipt_ledger::Error::ExpiredReceipt(terms.receipt_id.0).into());
        }

        self.check_pledge(ledger, &terms.farmer, terms.receipt_id, &bank, terms.collateral_amount)?;

        let offer_expires_at = ctx
            .now
            .checked_add(self.config.offer_validity_secs as i64)
            .ok_or_else(|| Error::overflow("offer expiry"))?;
        let next_id = self
            .next_loan_id
            .checked_add(1)
            .ok_or_else(|| Error::overflow("loan id"))?;

        let id = LoanId(self.next_loan_id);
        self.next_loan_id = next_id;

        let loan = Loan {
            id,
            bank: bank.clone(),
            farmer: terms.farmer,
            receipt_id: terms.receipt_id,
            collateral_amount: terms.collateral_amount,
            principal: terms.principal,
            interest_rate_bps: terms.interest_rate_bps,
            duration_secs: terms.duration_secs,
            repayment_amount,
            offered_at: ctx.now,
            offer_expires_at,
            start_time: None,
            end_time: None,
            status: LoanStatus::Offered,
            closed_at: None,
        };

        tracing::info!(
            loan_id = %id,
            %bank,
            farmer = %loan.farmer,
            receipt_id = %loan.receipt_id,
            collateral = loan.collateral_amount,
            principal = loan.principal,
            rate_bps = loan.interest_rate_bps,
            "Loan offered"
        );

        let event = Event::LoanOffered {
            loan_id: id.0,
            bank,
            farmer: loan.farmer.clone(),
            receipt_id: loan.receipt_id,
            collateral_amount: loan.collateral_amount,
            principal: loan.principal,
            interest_rate_bps: loan.interest_rate_bps,
            duration_secs: loan.duration_secs,
            offer_expires_at,
        };
        self.loans.insert(id, loan);
        self.sink.publish(ctx.now, event);

        Ok(id)
    }

    /// Withdraw an unaccepted offer (bank only)
    pub fn cancel_offer(&mut self, ctx: &CallContext, loan_id: LoanId) -> Result<()> {
        let loan = self.loans.get_mut(&loan_id).ok_or(Error::NotFound(loan_id.0))?;

        if loan.bank != ctx.caller {
            return Err(Error::Unauthorized(format!(
                "{} is not the lender of loan {}",
                ctx.caller, loan_id
            )));
        }
        if loan.status != LoanStatus::Offered {
            return Err(Error::InvalidLoanState {
                loan_id: loan_id.0,
                status: loan.status.to_string(),
            });
        }

        loan.status = LoanStatus::Cancelled;
        loan.closed_at = Some(ctx.now);

        tracing::info!(%loan_id, bank = %ctx.caller, "Loan offer cancelled");

        self.sink.publish(
            ctx.now,
            Event::LoanOfferCancelled {
                loan_id: loan_id.0,
                bank: ctx.caller.clone(),
            },
        );
        Ok(())
    }

    /// Accept an offer and receive the principal (farmer only)
    pub fn accept_loan(
        &mut self,
        ctx: &CallContext,
        ledger: &ReceiptLedger,
        payments: &mut dyn Payments,
        loan_id: LoanId,
    ) -> Result<()> {
        let loan = self.get_loan(loan_id)?.clone();

        if loan.farmer != ctx.caller {
            return Err(Error::Unauthorized(format!(
                "{} is not the borrower of loan {}",
                ctx.caller, loan_id
            )));
        }
        if loan.status != LoanStatus::Offered {
            return Err(Error::InvalidLoanState {
                loan_id: loan_id.0,
                status: loan.status.to_string(),
            });
        }
        if ctx.now > loan.offer_expires_at {
            return Err(Error::OfferExpired {
                loan_id: loan_id.0,
                expired_at: loan.offer_expires_at,
            });
        }
        if !ledger.is_valid(loan.receipt_id, ctx.now) {
            return Err(receipt_ledger::Error::ExpiredReceipt(loan.receipt_id.0).into());
        }

        self.check_pledge(
            ledger,
            &loan.farmer,
            loan.receipt_id,
            &loan.bank,
            loan.collateral_amount,
        )?;

        let available = self.liquidity_of(&loan.bank);
        if available < loan.principal {
            return Err(Error::InsufficientPoolFunds {
                required: loan.principal,
                available,
            });
        }

        let end_time = ctx
            .now
            .checked_add(loan.duration_secs as i64)
            .ok_or_else(|| Error::overflow("loan end time"))?;

        payments.transfer(&self.address, &loan.farmer, loan.principal)?;
        self.liquidity
            .insert(loan.bank.clone(), available - loan.principal);

        if let Some(entry) = self.loans.get_mut(&loan_id) {
            entry.status = LoanStatus::Active;
            entry.start_time = Some(ctx.now);
            entry.end_time = Some(end_time);
        }

        tracing::info!(
            %loan_id,
            farmer = %loan.farmer,
            bank = %loan.bank,
            principal = loan.principal,
            end_time,
            "Loan accepted"
        );

        self.sink.publish(
            ctx.now,
            Event::LoanAccepted {
                loan_id: loan_id.0,
                farmer: loan.farmer,
                principal: loan.principal,
                start_time: ctx.now,
                end_time,
            },
        );
        Ok(())
    }

    /// Repay an active loan in full and release its collateral (farmer only)
    ///
    /// Allowed after the end time until the bank liquidates.
    pub fn repay_loan(
        &mut self,
        ctx: &CallContext,
        ledger: &mut ReceiptLedger,
        payments: &mut dyn Payments,
        loan_id: LoanId,
        payment: Wei,
    ) -> Result<Wei> {
        let loan = self.get_loan(loan_id)?.clone();

        if loan.farmer != ctx.caller {
            return Err(Error::Unauthorized(format!(
                "{} is not the borrower of loan {}",
                ctx.caller, loan_id
            )));
        }
        if !loan.is_active() {
            return Err(Error::LoanNotActive(loan_id.0));
        }
        if payment != loan.repayment_amount {
            return Err(Error::IncorrectPayment {
                expected: loan.repayment_amount,
                received: payment,
            });
        }
        // Holds even when no pledge is left to release.
        if ledger.is_paused() {
            return Err(receipt_ledger::Error::Paused.into());
        }

        let available = payments.balance_of(&loan.farmer);
        if available < payment {
            return Err(receipt_ledger::Error::InsufficientFunds {
                required: payment,
                available,
            }
            .into());
        }

        let platform_fee = apply_bps(loan.interest(), self.config.platform_fee_bps)
            .ok_or_else(|| Error::overflow("platform fee"))?;
        let bank_amount = payment - platform_fee;
        let accrued_fees = self
            .accrued_fees
            .checked_add(platform_fee)
            .ok_or_else(|| Error::overflow("accrued fees"))?;

        payments.check_transfer(&loan.farmer, &loan.bank, bank_amount)?;
        payments.check_transfer(&loan.farmer, &self.address, platform_fee)?;

        // The bank may already have released part of its claim directly.
        let pledged = ledger
            .pledge_of(&loan.farmer, loan.receipt_id)
            .filter(|p| p.lender == loan.bank)
            .map_or(0, |p| p.amount);
        let release = loan.collateral_amount.min(pledged);

        let operator = ctx.with_caller(&self.address);
        if release > 0 {
            ledger.check_release(&operator, &loan.farmer, loan.receipt_id, release)?;
        }

        // Validated; apply.
        if release > 0 {
            ledger.release_pledge(&operator, &loan.farmer, loan.receipt_id, release)?;
        }
        payments.transfer(&loan.farmer, &loan.bank, bank_amount)?;
        payments.transfer(&loan.farmer, &self.address, platform_fee)?;
        self.accrued_fees = accrued_fees;

        if let Some(entry) = self.loans.get_mut(&loan_id) {
            entry.status = LoanStatus::Repaid;
            entry.closed_at = Some(ctx.now);
        }

        tracing::info!(
            %loan_id,
            farmer = %loan.farmer,
            bank = %loan.bank,
            repayment = payment,
            platform_fee,
            released = release,
            "Loan repaid"
        );

        self.sink.publish(
            ctx.now,
            Event::LoanRepaid {
                loan_id: loan_id.0,
                farmer: loan.farmer,
                bank: loan.bank,
                repayment_amount: payment,
                platform_fee,
                repaid_at: ctx.now,
            },
        );
        Ok(bank_amount)
    }

    /// Seize the collateral of an overdue loan (bank only)
    pub fn liquidate_collateral(
        &mut self,
        ctx: &CallContext,
        ledger: &mut ReceiptLedger,
        loan_id: LoanId,
    ) -> Result<()> {
        let loan = self.get_loan(loan_id)?.clone();

        if loan.bank != ctx.caller {
            return Err(Error::Unauthorized(format!(
                "{} is not the lender of loan {}",
                ctx.caller, loan_id
            )));
        }
        if !loan.is_active() {
            return Err(Error::LoanNotActive(loan_id.0));
        }
        let end_time = loan.end_time.unwrap_or(Timestamp::MAX);
        if ctx.now <= end_time {
            return Err(Error::LoanNotOverdue {
                loan_id: loan_id.0,
                end_time,
                now: ctx.now,
            });
        }

        let operator = ctx.with_caller(&self.address);
        ledger.seize_collateral(
            &operator,
            &loan.farmer,
            loan.receipt_id,
            loan.collateral_amount,
        )?;

        if let Some(entry) = self.loans.get_mut(&loan_id) {
            entry.status = LoanStatus::Liquidated;
            entry.closed_at = Some(ctx.now);
        }

        tracing::warn!(
            %loan_id,
            bank = %loan.bank,
            farmer = %loan.farmer,
            collateral = loan.collateral_amount,
            "Collateral liquidated"
        );

        self.sink.publish(
            ctx.now,
            Event::CollateralLiquidated {
                loan_id: loan_id.0,
                bank: loan.bank,
                farmer: loan.farmer,
                receipt_id: loan.receipt_id,
                collateral_amount: loan.collateral_amount,
            },
        );
        Ok(())
    }

    /// Pay all accrued fees to the calling admin; returns the amount paid
    pub fn withdraw_platform_fees(
        &mut self,
        ctx: &CallContext,
        payments: &mut dyn Payments,
    ) -> Result<Wei> {
        if !self.access.has_role(Role::Admin, &ctx.caller) {
            return Err(Error::Unauthorized(format!(
                "{} is not a lending pool admin",
                ctx.caller
            )));
        }

        let amount = self.accrued_fees;
        if amount == 0 {
            return Ok(0);
        }

        payments.transfer(&self.address, &ctx.caller, amount)?;
        self.accrued_fees = 0;

        tracing::info!(to = %ctx.caller, amount, "Lending fees withdrawn");

        self.sink.publish(
            ctx.now,
            Event::LendingFeesWithdrawn {
                to: ctx.caller.clone(),
                amount,
            },
        );
        Ok(amount)
    }

    // Reads

    /// Loan by ID
    pub fn get_loan(&self, loan_id: LoanId) -> Result<&Loan> {
        self.loans.get(&loan_id).ok_or(Error::NotFound(loan_id.0))
    }

    /// Lazy status of a loan at `now`
    pub fn status_at(&self, loan_id: LoanId, now: Timestamp) -> Result<LoanView> {
        Ok(self.get_loan(loan_id)?.status_at(now))
    }

    /// Loans where `farmer` is the borrower
    pub fn loans_of_farmer(&self, farmer: &Address) -> Vec<&Loan> {
        self.loans.values().filter(|l| &l.farmer == farmer).collect()
    }

    /// Loans where `bank` is the lender
    pub fn loans_of_bank(&self, bank: &Address) -> Vec<&Loan> {
        self.loans.values().filter(|l| &l.bank == bank).collect()
    }

    /// Collateral backing active loans for this farmer, receipt and bank
    pub fn committed_collateral(
        &self,
        farmer: &Address,
        receipt_id: ReceiptId,
        bank: &Address,
    ) -> Quantity {
        self.loans
            .values()
            .filter(|l| {
                l.is_active() && &l.farmer == farmer && l.receipt_id == receipt_id && &l.bank == bank
            })
            .map(|l| l.collateral_amount)
            .sum()
    }

    /// Fees not yet withdrawn
    pub fn accrued_fees(&self) -> Wei {
        self.accrued_fees
    }

    /// Disbursed loans not yet repaid or liquidated
    pub fn active_loan_count(&self) -> usize {
        self.loans.values().filter(|l| l.is_active()).count()
    }

    /// Number of loans ever offered
    pub fn loan_count(&self) -> u64 {
        self.next_loan_id - 1
    }

    /// Rebuild state from a journaled event without publishing
    ///
    /// Collateral and wallet movements belong to the ledger and the wallet
    /// book; loans, liquidity and accrued fees are restored here.
    pub fn apply_event(&mut self, timestamp: Timestamp, event: &Event) -> Result<()> {
        match event {
            Event::PoolFunded { bank, liquidity, .. }
            | Event::LiquidityWithdrawn { bank, liquidity, .. } => {
                self.liquidity.insert(bank.clone(), *liquidity);
            }
            Event::LoanOffered {
                loan_id,
                bank,
                farmer,
                receipt_id,
                collateral_amount,
                principal,
                interest_rate_bps,
                duration_secs,
                offer_expires_at,
            } => {
                let id = LoanId(*loan_id);
                let next_id = loan_id.checked_add(1).ok_or_else(|| Error::overflow("loan id"))?;
                let repayment_amount = repayment_for(*principal, *interest_rate_bps)
                    .ok_or_else(|| Error::overflow("repayment amount"))?;
                self.loans.insert(
                    id,
                    Loan {
                        id,
                        bank: bank.clone(),
                        farmer: farmer.clone(),
                        receipt_id: *receipt_id,
                        collateral_amount: *collateral_amount,
                        principal: *principal,
                        interest_rate_bps: *interest_rate_bps,
                        duration_secs: *duration_secs,
                        repayment_amount,
                        offered_at: timestamp,
                        offer_expires_at: *offer_expires_at,
                        start_time: None,
                        end_time: None,
                        status: LoanStatus::Offered,
                        closed_at: None,
                    },
                );
                self.next_loan_id = self.next_loan_id.max(next_id);
            }
            Event::LoanOfferCancelled { loan_id, .. } => {
                let loan = self.journaled_loan(*loan_id)?;
                loan.status = LoanStatus::Cancelled;
                loan.closed_at = Some(timestamp);
            }
            Event::LoanAccepted {
                loan_id,
                principal,
                start_time,
                end_time,
                ..
            } => {
                let loan = self.journaled_loan(*loan_id)?;
                loan.status = LoanStatus::Active;
                loan.start_time = Some(*start_time);
                loan.end_time = Some(*end_time);
                let bank = loan.bank.clone();
                let liquidity = self.liquidity_of(&bank).saturating_sub(*principal);
                self.liquidity.insert(bank, liquidity);
            }
            Event::LoanRepaid {
                loan_id,
                platform_fee,
                repaid_at,
                ..
            } => {
                let loan = self.journaled_loan(*loan_id)?;
                loan.status = LoanStatus::Repaid;
                loan.closed_at = Some(*repaid_at);
                self.accrued_fees = self
                    .accrued_fees
                    .checked_add(*platform_fee)
                    .ok_or_else(|| Error::overflow("accrued fees"))?;
            }
            Event::CollateralLiquidated { loan_id, .. } => {
                let loan = self.journaled_loan(*loan_id)?;
                loan.status = LoanStatus::Liquidated;
                loan.closed_at = Some(timestamp);
            }
            Event::LendingFeesWithdrawn { amount, .. } => {
                self.accrued_fees = self.accrued_fees.saturating_sub(*amount);
            }
            _ => {}
        }
        Ok(())
    }

    fn journaled_loan(&mut self, loan_id: u64) -> Result<&mut Loan> {
        self.loans.get_mut(&LoanId(loan_id)).ok_or(Error::NotFound(loan_id))
    }

    fn check_pledge(
        &self,
        ledger: &ReceiptLedger,
        farmer: &Address,
        receipt_id: ReceiptId,
        bank: &Address,
        collateral: Quantity,
    ) -> Result<()> {
        let pledge = ledger
            .pledge_of(farmer, receipt_id)
            .filter(|p| &p.lender == bank)
            .ok_or_else(|| {
                Error::NoMatchingPledge(format!(
                    "{} has no pledge on receipt {} to {}",
                    farmer, receipt_id, bank
                ))
            })?;

        let required = self
            .committed_collateral(farmer, receipt_id, bank)
            .checked_add(collateral)
            .ok_or_else(|| Error::overflow("committed collateral"))?;
        if pledge.amount < required {
            return Err(Error::NoMatchingPledge(format!(
                "pledged {} on receipt {}, {} required",
                pledge.amount, receipt_id, required
            )));
        }
        Ok(())
    }
}

impl Obligations for LendingPool {
    fn has_outstanding_obligations(&self, account: &Address, now: Timestamp) -> bool {
        self.loans.values().any(|l| {
            &l.bank == account
                && matches!(l.status_at(now), LoanView::Offered | LoanView::Active | LoanView::Overdue)
        })
    }
}

impl std::fmt::Debug for LendingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingPool")
            .field("address", &self.address)
            .field("loans", &self.loans.len())
            .field("accrued_fees", &self.accrued_fees)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_ledger::{units::parse_ether, ErrorKind, EventLog, NativeBalances, RoleDirectory};

    const NOW: i64 = 1_700_000_000;
    const DAY: i64 = 24 * 60 * 60;
    const YEAR: i64 = 365 * DAY;

    struct Fixture {
        log: Arc<EventLog>,
        pool: LendingPool,
        ledger: ReceiptLedger,
        directory: RoleDirectory,
        funds: NativeBalances,
        admin: Address,
        bank: Address,
        farmer: Address,
        receipt: ReceiptId,
    }

    fn eth(value: &str) -> Wei {
        parse_ether(value).unwrap()
    }

    fn at(who: &Address, now: Timestamp) -> CallContext {
        CallContext::new(who.clone(), now)
    }

    fn setup() -> Fixture {
        let log = Arc::new(EventLog::new());
        let admin = Address::new("deployer");
        let warehouse = Address::new("warehouse");
        let bank = Address::new("bank");
        let farmer = Address::new("farmer1");

        let mut directory = RoleDirectory::new(admin.clone(), log.clone());
        directory
            .register_warehouse(&at(&admin, NOW), warehouse.clone(), "WDRA-MH-2023-123", "Mumbai")
            .unwrap();
        directory
            .register_bank(&at(&admin, NOW), bank.clone(), "State Bank of India", "BANK-LIC-001")
            .unwrap();

        let pool = LendingPool::new(LendingConfig::default(), admin.clone(), log.clone()).unwrap();

        let mut ledger = ReceiptLedger::new(admin.clone(), log.clone());
        ledger
            .grant_role(&at(&admin, NOW), Role::CollateralManager, pool.address().clone())
            .unwrap();
        let receipt = ledger
            .issue(
                &at(&warehouse, NOW),
                &directory,
                farmer.clone(),
                5000,
                NOW + YEAR,
                "ipfs://QmExampleHash1/wheat_receipt.json",
            )
            .unwrap();
        ledger
            .pledge_collateral(&at(&farmer, NOW), receipt, 2000, bank.clone())
            .unwrap();

        let mut funds = NativeBalances::new();
        funds.deposit(&bank, eth("100")).unwrap();
        funds.deposit(&farmer, eth("1")).unwrap();

        Fixture {
            log,
            pool,
            ledger,
            directory,
            funds,
            admin,
            bank,
            farmer,
            receipt,
        }
    }

    fn terms(fx: &Fixture, collateral: Quantity) -> LoanTerms {
        LoanTerms {
            farmer: fx.farmer.clone(),
            receipt_id: fx.receipt,
            collateral_amount: collateral,
            principal: eth("10"),
            interest_rate_bps: 500,
            duration_secs: 30 * DAY as u64,
        }
    }

    fn offer(fx: &mut Fixture, collateral: Quantity) -> LoanId {
        let t = terms(fx, collateral);
        fx.pool
            .offer_loan(&at(&fx.bank, NOW), &fx.directory, &fx.ledger, t)
            .unwrap()
    }

    fn funded_active_loan(fx: &mut Fixture) -> LoanId {
        fx.pool
            .fund_pool(&at(&fx.bank, NOW), &mut fx.funds, eth("50"))
            .unwrap();
        let id = offer(fx, 2000);
        fx.pool
            .accept_loan(&at(&fx.farmer, NOW), &fx.ledger, &mut fx.funds, id)
            .unwrap();
        id
    }

    #[test]
    fn test_offer_loan() {
        let mut fx = setup();
        let id = offer(&mut fx, 2000);

        let loan = fx.pool.get_loan(id).unwrap();
        assert_eq!(loan.status, LoanStatus::Offered);
        assert_eq!(loan.repayment_amount, eth("10.5"));
        assert_eq!(loan.offer_expires_at, NOW + 7 * DAY);
        assert_eq!(fx.pool.status_at(id, NOW).unwrap(), LoanView::Offered);
    }

    #[test]
    fn test_offer_requires_active_bank() {
        let mut fx = setup();
        let t = terms(&fx, 2000);
        let err = fx
            .pool
            .offer_loan(&at(&fx.farmer, NOW), &fx.directory, &fx.ledger, t)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_offer_rejects_bad_terms() {
        let mut fx = setup();
        let ctx = at(&fx.bank, NOW);

        let mut t = terms(&fx, 2000);
        t.principal = 0;
        let err = fx.pool.offer_loan(&ctx, &fx.directory, &fx.ledger, t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanTerms);

        let mut t = terms(&fx, 2000);
        t.interest_rate_bps = 5_001;
        let err = fx.pool.offer_loan(&ctx, &fx.directory, &fx.ledger, t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanTerms);

        let mut t = terms(&fx, 2000);
        t.duration_secs = 0;
        let err = fx.pool.offer_loan(&ctx, &fx.directory, &fx.ledger, t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanTerms);
        assert_eq!(fx.pool.loan_count(), 0);
    }

    #[test]
    fn test_offer_requires_matching_pledge() {
        let mut fx = setup();
        let ctx = at(&fx.bank, NOW);

        let t = terms(&fx, 2001);
        let err = fx.pool.offer_loan(&ctx, &fx.directory, &fx.ledger, t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingPledge);

        let other = Address::new("other-bank");
        fx.directory
            .register_bank(&at(&fx.admin, NOW), other.clone(), "HDFC", "BANK-LIC-002")
            .unwrap();
        let t = terms(&fx, 100);
        let err = fx
            .pool
            .offer_loan(&at(&other, NOW), &fx.directory, &fx.ledger, t)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingPledge);
    }

    #[test]
    fn test_collateral_not_double_counted() {
        let mut fx = setup();
        fx.pool
            .fund_pool(&at(&fx.bank, NOW), &mut fx.funds, eth("50"))
            .unwrap();

        let first = offer(&mut fx, 1500);
        fx.pool
            .accept_loan(&at(&fx.farmer, NOW), &fx.ledger, &mut fx.funds, first)
            .unwrap();
        assert_eq!(fx.pool.committed_collateral(&fx.farmer, fx.receipt, &fx.bank), 1500);

        let t = terms(&fx, 501);
        let err = fx
            .pool
            .offer_loan(&at(&fx.bank, NOW), &fx.directory, &fx.ledger, t)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingPledge);

        offer(&mut fx, 500);
    }

    #[test]
    fn test_accept_loan_disburses_principal() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);

        let loan = fx.pool.get_loan(id).unwrap();
        assert!(loan.is_active());
        assert_eq!(loan.start_time, Some(NOW));
        assert_eq!(loan.end_time, Some(NOW + 30 * DAY));
        assert_eq!(fx.funds.balance_of(&fx.farmer), eth("11"));
        assert_eq!(fx.pool.liquidity_of(&fx.bank), eth("40"));
    }

    #[test]
    fn test_accept_checks() {
        let mut fx = setup();
        let id = offer(&mut fx, 2000);

        let err = fx
            .pool
            .accept_loan(&at(&fx.bank, NOW), &fx.ledger, &mut fx.funds, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = fx
            .pool
            .accept_loan(&at(&fx.farmer, NOW), &fx.ledger, &mut fx.funds, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientPoolFunds);

        fx.pool
            .fund_pool(&at(&fx.bank, NOW), &mut fx.funds, eth("10"))
            .unwrap();
        let late = NOW + 7 * DAY + 1;
        assert_eq!(fx.pool.status_at(id, late).unwrap(), LoanView::Expired);
        let err = fx
            .pool
            .accept_loan(&at(&fx.farmer, late), &fx.ledger, &mut fx.funds, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OfferExpired);

        fx.pool
            .accept_loan(&at(&fx.farmer, NOW + 7 * DAY), &fx.ledger, &mut fx.funds, id)
            .unwrap();
        let err = fx
            .pool
            .accept_loan(&at(&fx.farmer, NOW + 7 * DAY), &fx.ledger, &mut fx.funds, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanState);
    }

    #[test]
    fn test_accept_after_pledge_withdrawn() {
        let mut fx = setup();
        fx.pool
            .fund_pool(&at(&fx.bank, NOW), &mut fx.funds, eth("10"))
            .unwrap();
        let id = offer(&mut fx, 2000);

        let (bank, farmer, receipt) = (fx.bank.clone(), fx.farmer.clone(), fx.receipt);
        fx.ledger
            .unpledge_collateral(&at(&bank, NOW), &farmer, receipt, 1)
            .unwrap();

        let err = fx
            .pool
            .accept_loan(&at(&farmer, NOW), &fx.ledger, &mut fx.funds, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingPledge);
        assert_eq!(fx.pool.liquidity_of(&bank), eth("10"));
    }

    #[test]
    fn test_repay_loan() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);
        let bank_before = fx.funds.balance_of(&fx.bank);
        let ctx = at(&fx.farmer, NOW + 10 * DAY);

        let err = fx
            .pool
            .repay_loan(&ctx, &mut fx.ledger, &mut fx.funds, id, eth("10"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectPayment);

        let paid_to_bank = fx
            .pool
            .repay_loan(&ctx, &mut fx.ledger, &mut fx.funds, id, eth("10.5"))
            .unwrap();

        // interest 0.5, fee 5% of interest
        assert_eq!(paid_to_bank, eth("10.475"));
        assert_eq!(fx.funds.balance_of(&fx.bank), bank_before + eth("10.475"));
        assert_eq!(fx.funds.balance_of(&fx.farmer), eth("0.5"));
        assert_eq!(fx.pool.accrued_fees(), eth("0.025"));

        let status = fx.ledger.pledge_status(&fx.farmer, fx.receipt);
        assert!(!status.is_pledged);
        assert_eq!(status.amount, 0);

        let loan = fx.pool.get_loan(id).unwrap();
        assert_eq!(loan.status, LoanStatus::Repaid);
        assert_eq!(loan.closed_at, Some(NOW + 10 * DAY));

        let err = fx
            .pool
            .repay_loan(&ctx, &mut fx.ledger, &mut fx.funds, id, eth("10.5"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoanNotActive);
    }

    #[test]
    fn test_repay_without_funds() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);
        let (farmer, bank) = (fx.farmer.clone(), fx.bank.clone());
        fx.funds.transfer(&farmer, &bank, eth("1")).unwrap();

        let err = fx
            .pool
            .repay_loan(&at(&farmer, NOW), &mut fx.ledger, &mut fx.funds, id, eth("10.5"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert!(fx.pool.get_loan(id).unwrap().is_active());
        assert_eq!(fx.ledger.pledge_status(&farmer, fx.receipt).amount, 2000);
    }

    #[test]
    fn test_repay_allowed_after_due() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);
        let late = NOW + 31 * DAY;
        assert_eq!(fx.pool.status_at(id, late).unwrap(), LoanView::Overdue);

        fx.pool
            .repay_loan(&at(&fx.farmer, late), &mut fx.ledger, &mut fx.funds, id, eth("10.5"))
            .unwrap();
    }

    #[test]
    fn test_liquidate_overdue_loan() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);
        let due = NOW + 30 * DAY;

        let err = fx
            .pool
            .liquidate_collateral(&at(&fx.bank, due), &mut fx.ledger, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoanNotOverdue);

        let err = fx
            .pool
            .liquidate_collateral(&at(&fx.farmer, due + 1), &mut fx.ledger, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        fx.pool
            .liquidate_collateral(&at(&fx.bank, due + 1), &mut fx.ledger, id)
            .unwrap();
        assert_eq!(fx.ledger.balance_of(&fx.bank, fx.receipt), 2000);
        assert_eq!(fx.ledger.balance_of(&fx.farmer, fx.receipt), 3000);
        assert_eq!(fx.pool.get_loan(id).unwrap().status, LoanStatus::Liquidated);

        let err = fx
            .pool
            .liquidate_collateral(&at(&fx.bank, due + 2), &mut fx.ledger, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoanNotActive);
    }

    #[test]
    fn test_cancel_offer() {
        let mut fx = setup();
        let id = offer(&mut fx, 2000);

        let err = fx.pool.cancel_offer(&at(&fx.farmer, NOW), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        fx.pool.cancel_offer(&at(&fx.bank, NOW), id).unwrap();
        assert_eq!(fx.pool.status_at(id, NOW).unwrap(), LoanView::Cancelled);

        let err = fx.pool.cancel_offer(&at(&fx.bank, NOW), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLoanState);
    }

    #[test]
    fn test_liquidity_round_trip() {
        let mut fx = setup();
        let ctx = at(&fx.bank, NOW);

        assert_eq!(fx.pool.fund_pool(&ctx, &mut fx.funds, eth("30")).unwrap(), eth("30"));
        assert_eq!(fx.funds.balance_of(&fx.bank), eth("70"));

        let err = fx
            .pool
            .withdraw_liquidity(&ctx, &mut fx.funds, eth("31"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientPoolFunds);

        fx.pool.withdraw_liquidity(&ctx, &mut fx.funds, eth("30")).unwrap();
        assert_eq!(fx.funds.balance_of(&fx.bank), eth("100"));
        assert_eq!(fx.pool.liquidity_of(&fx.bank), 0);

        let err = fx.pool.fund_pool(&ctx, &mut fx.funds, eth("101")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_bank_obligations() {
        let mut fx = setup();
        assert!(!fx.pool.has_outstanding_obligations(&fx.bank, NOW));

        let id = offer(&mut fx, 2000);
        assert!(fx.pool.has_outstanding_obligations(&fx.bank, NOW));
        assert!(!fx.pool.has_outstanding_obligations(&fx.bank, NOW + 8 * DAY));

        fx.pool.cancel_offer(&at(&fx.bank, NOW), id).unwrap();
        assert!(!fx.pool.has_outstanding_obligations(&fx.bank, NOW));
    }

    #[test]
    fn test_withdraw_fees() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);
        fx.pool
            .repay_loan(&at(&fx.farmer, NOW), &mut fx.ledger, &mut fx.funds, id, eth("10.5"))
            .unwrap();

        let err = fx
            .pool
            .withdraw_platform_fees(&at(&fx.bank, NOW), &mut fx.funds)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let paid = fx
            .pool
            .withdraw_platform_fees(&at(&fx.admin, NOW), &mut fx.funds)
            .unwrap();
        assert_eq!(paid, eth("0.025"));
        assert_eq!(fx.funds.balance_of(&fx.admin), eth("0.025"));
        assert_eq!(fx.funds.balance_of(fx.pool.address()), eth("40"));
    }

    #[test]
    fn test_repay_after_partial_unpledge_releases_remainder() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);
        let farmer = fx.farmer.clone();

        fx.ledger
            .unpledge_collateral(&at(&fx.bank, NOW), &farmer, fx.receipt, 1500)
            .unwrap();
        assert_eq!(fx.ledger.pledge_status(&farmer, fx.receipt).amount, 500);

        fx.pool
            .repay_loan(&at(&farmer, NOW), &mut fx.ledger, &mut fx.funds, id, eth("10.5"))
            .unwrap();

        assert_eq!(fx.pool.get_loan(id).unwrap().status, LoanStatus::Repaid);
        assert!(!fx.ledger.pledge_status(&farmer, fx.receipt).is_pledged);
        assert_eq!(fx.ledger.balance_of(&farmer, fx.receipt), 5000);
        match fx.log.events().iter().rev().find(|e| matches!(e, Event::CollateralUnpledged { .. })) {
            Some(Event::CollateralUnpledged { amount, remaining, .. }) => {
                assert_eq!(*amount, 500);
                assert_eq!(*remaining, 0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_paused_ledger_blocks_repay_and_liquidation() {
        let mut fx = setup();
        let id = funded_active_loan(&mut fx);
        fx.ledger.pause(&at(&fx.admin, NOW)).unwrap();

        let farmer_before = fx.funds.balance_of(&fx.farmer);
        let bank_before = fx.funds.balance_of(&fx.bank);
        let pool_before = fx.funds.balance_of(fx.pool.address());

        let err = fx
            .pool
            .repay_loan(&at(&fx.farmer, NOW), &mut fx.ledger, &mut fx.funds, id, eth("10.5"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Paused);

        let overdue = NOW + 31 * DAY;
        let err = fx
            .pool
            .liquidate_collateral(&at(&fx.bank, overdue), &mut fx.ledger, id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Paused);

        assert_eq!(fx.funds.balance_of(&fx.farmer), farmer_before);
        assert_eq!(fx.funds.balance_of(&fx.bank), bank_before);
        assert_eq!(fx.funds.balance_of(fx.pool.address()), pool_before);
        assert_eq!(fx.pool.get_loan(id).unwrap().status, LoanStatus::Active);
        assert_eq!(fx.pool.accrued_fees(), 0);
        assert_eq!(fx.ledger.pledge_status(&fx.farmer, fx.receipt).amount, 2000);
        assert_eq!(fx.ledger.balance_of(&fx.bank, fx.receipt), 0);
    }

    #[test]
    fn test_apply_event_rebuilds_loans() {
        let mut fx = setup();
        let repaid = funded_active_loan(&mut fx);
        fx.pool
            .repay_loan(&at(&fx.farmer, NOW), &mut fx.ledger, &mut fx.funds, repaid, eth("10.5"))
            .unwrap();
        fx.ledger
            .pledge_collateral(&at(&fx.farmer, NOW), fx.receipt, 1000, fx.bank.clone())
            .unwrap();
        let open = offer(&mut fx, 1000);

        let mut rebuilt =
            LendingPool::new(LendingConfig::default(), fx.admin.clone(), Arc::new(EventLog::new()))
                .unwrap();
        for record in fx.log.records() {
            rebuilt.apply_event(record.timestamp, &record.event).unwrap();
        }

        assert_eq!(rebuilt.get_loan(repaid).unwrap(), fx.pool.get_loan(repaid).unwrap());
        assert_eq!(rebuilt.get_loan(open).unwrap(), fx.pool.get_loan(open).unwrap());
        assert_eq!(rebuilt.liquidity_of(&fx.bank), fx.pool.liquidity_of(&fx.bank));
        assert_eq!(rebuilt.liquidity_of(&fx.bank), eth("40"));
        assert_eq!(rebuilt.accrued_fees(), eth("0.025"));
        assert_eq!(rebuilt.loan_count(), 2);
        assert!(rebuilt.has_outstanding_obligations(&fx.bank, NOW));
    }
}
