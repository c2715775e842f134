//! Multi-asset receipt ledger with pledge-aware transfers
//!
//! Each issuance creates one fungible receipt class. Units of a class are
//! spread across holders; each holding may carry one pledge to one lender.
//!
//! # Invariants
//!
//! - `pledge.amount <= balance` for every holding, after every call
//! - Only `balance - pledge.amount` units can leave a holding through
//!   `transfer`; `seize_collateral` is the single path that moves pledged
//!   units, and it reduces balance and pledge together
//! - Receipts are valid strictly before `expiry`
//! - Every call validates before it mutates, so a failed call changes nothing

use crate::{
    access::AccessControl,
    events::{Event, EventSink},
    roles::{Obligations, RoleLookup},
    types::{
        Address, CallContext, Holding, Pledge, PledgeStatus, Quantity, Receipt, ReceiptDetails,
        ReceiptId, Role, Timestamp,
    },
    Error, Result,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Receipt ledger
pub struct ReceiptLedger {
    access: AccessControl,
    receipts: BTreeMap<ReceiptId, Receipt>,
    holdings: HashMap<(ReceiptId, Address), Holding>,
    approvals: HashSet<(Address, Address)>,
    next_receipt_id: u64,
    paused: bool,
    sink: Arc<dyn EventSink>,
}

impl ReceiptLedger {
    /// Empty ledger administered by `admin`
    pub fn new(admin: Address, sink: Arc<dyn EventSink>) -> Self {
        Self {
            access: AccessControl::new(admin),
            receipts: BTreeMap::new(),
            holdings: HashMap::new(),
            approvals: HashSet::new(),
            next_receipt_id: 1,
            paused: false,
            sink,
        }
    }

    // Access control

    /// Grant a ledger role (admin only)
    pub fn grant_role(&mut self, ctx: &CallContext, role: Role, account: Address) -> Result<()> {
        self.access.require(Role::Admin, &ctx.caller)?;
        if self.access.grant(role, account.clone()) {
            tracing::info!(?role, %account, "Role granted");
            self.sink.publish(ctx.now, Event::RoleGranted { role, account });
        }
        Ok(())
    }

    /// Revoke a ledger role (admin only)
    pub fn revoke_role(&mut self, ctx: &CallContext, role: Role, account: &Address) -> Result<()> {
        self.access.require(Role::Admin, &ctx.caller)?;
        if self.access.revoke(role, account) {
            tracing::info!(?role, %account, "Role revoked");
            self.sink.publish(
                ctx.now,
                Event::RoleRevoked {
                    role,
                    account: account.clone(),
                },
            );
        }
        Ok(())
    }

    /// Whether `account` holds `role`
    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.access.has_role(role, account)
    }

    /// Holders of `role`, sorted
    pub fn role_members(&self, role: Role) -> Vec<Address> {
        self.access.members(role)
    }

    // Circuit breaker

    /// Stop all balance and pledge mutations (admin only)
    pub fn pause(&mut self, ctx: &CallContext) -> Result<()> {
        self.access.require(Role::Admin, &ctx.caller)?;
        if !self.paused {
            self.paused = true;
            tracing::warn!(by = %ctx.caller, "Ledger paused");
            self.sink.publish(ctx.now, Event::Paused { by: ctx.caller.clone() });
        }
        Ok(())
    }

    /// Resume mutations (admin only)
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<()> {
        self.access.require(Role::Admin, &ctx.caller)?;
        if self.paused {
            self.paused = false;
            tracing::info!(by = %ctx.caller, "Ledger unpaused");
            self.sink.publish(ctx.now, Event::Unpaused { by: ctx.caller.clone() });
        }
        Ok(())
    }

    /// Circuit breaker state
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn require_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(Error::Paused);
        }
        Ok(())
    }

    // Issuance

    /// Mint a new receipt class and credit `quantity` units to `to`
    pub fn issue(
        &mut self,
        ctx: &CallContext,
        roles: &dyn RoleLookup,
        to: Address,
        quantity: Quantity,
        expiry: Timestamp,
        metadata_ref: &str,
    ) -> Result<ReceiptId> {
        self.require_not_paused()?;

        if !self.access.has_role(Role::Minter, &ctx.caller) && !roles.is_issuer_active(&ctx.caller) {
            return Err(Error::Unauthorized(format!(
                "{} is not an active issuer",
                ctx.caller
            )));
        }
        if expiry <= ctx.now {
            return Err(Error::InvalidExpiry {
                expiry,
                now: ctx.now,
            });
        }
        if quantity == 0 {
            return Err(Error::InvalidQuantity("issued quantity must be positive".to_string()));
        }
        if metadata_ref.trim().is_empty() {
            return Err(Error::InvalidInput("metadata reference must not be empty".to_string()));
        }
        if to.as_str().is_empty() {
            return Err(Error::InvalidInput("issue to empty address".to_string()));
        }
        let next_id = self
            .next_receipt_id
            .checked_add(1)
            .ok_or_else(|| Error::overflow("receipt id"))?;

        let id = ReceiptId(self.next_receipt_id);
        self.next_receipt_id = next_id;

        self.receipts.insert(
            id,
            Receipt {
                id,
                issuer: ctx.caller.clone(),
                total_supply: quantity,
                expiry,
                metadata_ref: metadata_ref.to_string(),
                issued_at: ctx.now,
            },
        );
        self.holdings.entry((id, to.clone())).or_default().balance = quantity;

        tracing::info!(
            receipt_id = %id,
            issuer = %ctx.caller,
            %to,
            quantity,
            expiry,
            "Receipt issued"
        );

        self.sink.publish(
            ctx.now,
            Event::ReceiptIssued {
                receipt_id: id,
                issuer: ctx.caller.clone(),
                to,
                quantity,
                expiry,
                metadata_ref: metadata_ref.to_string(),
            },
        );

        Ok(id)
    }

    /// Replace a receipt's metadata pointer (issuer of record only)
    pub fn update_metadata(
        &mut self,
        ctx: &CallContext,
        receipt_id: ReceiptId,
        metadata_ref: &str,
    ) -> Result<()> {
        let receipt = self
            .receipts
            .get_mut(&receipt_id)
            .ok_or_else(|| Error::NotFound(format!("receipt {}", receipt_id)))?;

        if receipt.issuer != ctx.caller {
            return Err(Error::Unauthorized(format!(
                "{} is not the issuer of receipt {}",
                ctx.caller, receipt_id
            )));
        }
        if metadata_ref.trim().is_empty() {
            return Err(Error::InvalidInput("metadata reference must not be empty".to_string()));
        }

        receipt.metadata_ref = metadata_ref.to_string();

        tracing::info!(%receipt_id, metadata_ref, "Metadata updated");

        self.sink.publish(
            ctx.now,
            Event::MetadataUpdated {
                receipt_id,
                metadata_ref: metadata_ref.to_string(),
            },
        );
        Ok(())
    }

    // Reads

    /// Receipt record
    pub fn receipt(&self, receipt_id: ReceiptId) -> Result<&Receipt> {
        self.receipts
            .get(&receipt_id)
            .ok_or_else(|| Error::NotFound(format!("receipt {}", receipt_id)))
    }

    /// Supply, expiry, metadata and validity at `now`
    pub fn receipt_details(&self, receipt_id: ReceiptId, now: Timestamp) -> Result<ReceiptDetails> {
        let receipt = self.receipt(receipt_id)?;
        Ok(ReceiptDetails {
            id: receipt.id,
            issuer: receipt.issuer.clone(),
            supply: receipt.total_supply,
            expiry: receipt.expiry,
            metadata_ref: receipt.metadata_ref.clone(),
            valid: receipt.is_valid_at(now),
        })
    }

    /// Metadata pointer
    pub fn uri(&self, receipt_id: ReceiptId) -> Result<&str> {
        Ok(self.receipt(receipt_id)?.metadata_ref.as_str())
    }

    /// `now < expiry`; unknown receipts are invalid
    pub fn is_valid(&self, receipt_id: ReceiptId, now: Timestamp) -> bool {
        self.receipts
            .get(&receipt_id)
            .is_some_and(|r| r.is_valid_at(now))
    }

    /// Number of receipts ever issued
    pub fn total_receipts(&self) -> u64 {
        self.next_receipt_id - 1
    }

    /// Units held; zero for unknown holders or receipts
    pub fn balance_of(&self, holder: &Address, receipt_id: ReceiptId) -> Quantity {
        self.holding(holder, receipt_id).map_or(0, |h| h.balance)
    }

    /// Units not under pledge
    pub fn transferable(&self, holder: &Address, receipt_id: ReceiptId) -> Quantity {
        self.holding(holder, receipt_id).map_or(0, Holding::transferable)
    }

    /// Current pledge, if any
    pub fn pledge_of(&self, holder: &Address, receipt_id: ReceiptId) -> Option<&Pledge> {
        self.holding(holder, receipt_id).and_then(|h| h.pledge.as_ref())
    }

    /// Pledge read model
    pub fn pledge_status(&self, holder: &Address, receipt_id: ReceiptId) -> PledgeStatus {
        self.holding(holder, receipt_id)
            .map(PledgeStatus::from)
            .unwrap_or(PledgeStatus {
                is_pledged: false,
                lender: None,
                amount: 0,
            })
    }

    /// Non-empty holdings of `holder`, by receipt id
    pub fn holdings_of(&self, holder: &Address) -> Vec<(ReceiptId, Holding)> {
        let mut held: Vec<(ReceiptId, Holding)> = self
            .holdings
            .iter()
            .filter(|((_, h), holding)| h == holder && !holding.is_empty())
            .map(|((id, _), holding)| (*id, holding.clone()))
            .collect();
        held.sort_by_key(|(id, _)| *id);
        held
    }

    /// Live pledges naming `lender`, as `(holder, receipt, pledge)` by receipt then holder
    pub fn pledges_to(&self, lender: &Address) -> Vec<(Address, ReceiptId, Pledge)> {
        let mut pledges: Vec<(Address, ReceiptId, Pledge)> = self
            .holdings
            .iter()
            .filter_map(|((id, holder), holding)| {
                holding
                    .pledge
                    .as_ref()
                    .filter(|p| &p.lender == lender)
                    .map(|p| (holder.clone(), *id, p.clone()))
            })
            .collect();
        pledges.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));
        pledges
    }

    /// Receipts issued by `issuer`
    pub fn receipts_issued_by(&self, issuer: &Address) -> Vec<&Receipt> {
        self.receipts.values().filter(|r| &r.issuer == issuer).collect()
    }

    fn holding(&self, holder: &Address, receipt_id: ReceiptId) -> Option<&Holding> {
        self.holdings.get(&(receipt_id, holder.clone()))
    }

    // Operator approvals

    /// Allow or forbid `operator` to move the caller's units
    pub fn set_approval_for_all(
        &mut self,
        ctx: &CallContext,
        operator: Address,
        approved: bool,
    ) -> Result<()> {
        if operator == ctx.caller {
            return Err(Error::InvalidInput("cannot approve self as operator".to_string()));
        }

        let key = (ctx.caller.clone(), operator.clone());
        if approved {
            self.approvals.insert(key);
        } else {
            self.approvals.remove(&key);
        }

        tracing::info!(owner = %ctx.caller, %operator, approved, "Operator approval set");

        self.sink.publish(
            ctx.now,
            Event::ApprovalForAll {
                owner: ctx.caller.clone(),
                operator,
                approved,
            },
        );
        Ok(())
    }

    /// Whether `operator` may move `owner`'s units
    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.approvals.contains(&(owner.clone(), operator.clone()))
    }

    // Transfers

    /// Validate a transfer without applying it
    pub fn check_transfer(
        &self,
        ctx: &CallContext,
        from: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        self.require_not_paused()?;

        if &ctx.caller != from && !self.is_approved_for_all(from, &ctx.caller) {
            return Err(Error::Unauthorized(format!(
                "{} is not approved to move units of {}",
                ctx.caller, from
            )));
        }
        if amount == 0 {
            return Err(Error::InvalidQuantity("transfer amount must be positive".to_string()));
        }

        let receipt = self.receipt(receipt_id)?;
        if !receipt.is_valid_at(ctx.now) {
            return Err(Error::ExpiredReceipt(receipt_id.0));
        }

        let available = self.transferable(from, receipt_id);
        if amount > available {
            return Err(Error::InsufficientUnpledgedBalance {
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Move unpledged units; the pledge lender gets no exemption
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        from: &Address,
        to: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        self.check_transfer(ctx, from, receipt_id, amount)?;
        if to.as_str().is_empty() {
            return Err(Error::InvalidInput("transfer to empty address".to_string()));
        }

        self.move_units(from, to, receipt_id, amount);

        tracing::info!(
            operator = %ctx.caller,
            %from,
            %to,
            %receipt_id,
            amount,
            "Units transferred"
        );

        self.sink.publish(
            ctx.now,
            Event::Transfer {
                operator: ctx.caller.clone(),
                from: from.clone(),
                to: to.clone(),
                receipt_id,
                amount,
            },
        );
        Ok(())
    }

    /// Debit and credit; callers have already checked `amount <= balance`
    fn move_units(&mut self, from: &Address, to: &Address, receipt_id: ReceiptId, amount: Quantity) {
        if from == to {
            return;
        }
        if let Some(source) = self.holdings.get_mut(&(receipt_id, from.clone())) {
            source.balance -= amount;
        }
        // Bounded by total supply, which fits in a u64.
        self.holdings
            .entry((receipt_id, to.clone()))
            .or_default()
            .balance += amount;
    }

    // Pledges

    /// Pledge `amount` of the caller's units to `lender`
    ///
    /// Pledging is incremental: repeated calls with the same lender add up
    /// to at most the full balance.
    pub fn pledge_collateral(
        &mut self,
        ctx: &CallContext,
        receipt_id: ReceiptId,
        amount: Quantity,
        lender: Address,
    ) -> Result<()> {
        self.require_not_paused()?;

        if amount == 0 {
            return Err(Error::InvalidQuantity("pledge amount must be positive".to_string()));
        }
        if lender.as_str().is_empty() {
            return Err(Error::InvalidInput("pledge to empty address".to_string()));
        }
        if lender == ctx.caller {
            return Err(Error::PledgeConflict("cannot pledge to self".to_string()));
        }

        let receipt = self.receipt(receipt_id)?;
        if !receipt.is_valid_at(ctx.now) {
            return Err(Error::ExpiredReceipt(receipt_id.0));
        }

        let holder = ctx.caller.clone();
        let holding = self
            .holding(&holder, receipt_id)
            .cloned()
            .unwrap_or_default();

        if let Some(existing) = &holding.pledge {
            if existing.lender != lender {
                return Err(Error::PledgeConflict(format!(
                    "receipt {} already pledged to {}",
                    receipt_id, existing.lender
                )));
            }
        }

        let available = holding.transferable();
        if amount > available {
            return Err(Error::InsufficientUnpledgedBalance {
                requested: amount,
                available,
            });
        }

        let total_pledged = holding.pledged() + amount;
        let entry = self.holdings.entry((receipt_id, holder.clone())).or_default();
        entry.pledge = Some(Pledge {
            lender: lender.clone(),
            amount: total_pledged,
        });

        tracing::info!(
            %receipt_id,
            %holder,
            %lender,
            amount,
            total_pledged,
            "Collateral pledged"
        );

        self.sink.publish(
            ctx.now,
            Event::CollateralPledged {
                receipt_id,
                holder,
                lender,
                amount,
                total_pledged,
            },
        );
        Ok(())
    }

    /// Lender releases part or all of its claim
    pub fn unpledge_collateral(
        &mut self,
        ctx: &CallContext,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        self.require_not_paused()?;

        let pledge = self
            .pledge_of(holder, receipt_id)
            .ok_or_else(|| Error::NotFound(format!("pledge on receipt {} by {}", receipt_id, holder)))?;

        if pledge.lender != ctx.caller {
            return Err(Error::Unauthorized(format!(
                "only the recorded lender may release this pledge, not {}",
                ctx.caller
            )));
        }

        self.reduce_pledge(ctx, holder, receipt_id, amount)
    }

    /// Release on the lender's behalf (collateral manager only)
    pub fn release_pledge(
        &mut self,
        ctx: &CallContext,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        self.require_not_paused()?;
        self.access.require(Role::CollateralManager, &ctx.caller)?;
        self.reduce_pledge(ctx, holder, receipt_id, amount)
    }

    fn reduce_pledge(
        &mut self,
        ctx: &CallContext,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidQuantity("release amount must be positive".to_string()));
        }

        let holding = self
            .holdings
            .get_mut(&(receipt_id, holder.clone()))
            .ok_or_else(|| Error::NotFound(format!("holding {} of receipt {}", holder, receipt_id)))?;
        let pledge = holding
            .pledge
            .as_mut()
            .ok_or_else(|| Error::NotFound(format!("pledge on receipt {} by {}", receipt_id, holder)))?;

        if amount > pledge.amount {
            return Err(Error::ExceedsPledgedAmount {
                requested: amount,
                pledged: pledge.amount,
            });
        }

        pledge.amount -= amount;
        let lender = pledge.lender.clone();
        let remaining = pledge.amount;
        if remaining == 0 {
            holding.pledge = None;
        }

        tracing::info!(%receipt_id, %holder, %lender, amount, remaining, "Collateral unpledged");

        self.sink.publish(
            ctx.now,
            Event::CollateralUnpledged {
                receipt_id,
                holder: holder.clone(),
                lender,
                amount,
                remaining,
            },
        );
        Ok(())
    }

    /// Move `amount` pledged units from `holder` to the recorded lender
    /// (collateral manager only). Ignores expiry; returns the lender.
    pub fn seize_collateral(
        &mut self,
        ctx: &CallContext,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<Address> {
        self.check_seize(ctx, holder, receipt_id, amount)?;

        let key = (receipt_id, holder.clone());
        let mut lender = None;
        if let Some(holding) = self.holdings.get_mut(&key) {
            if let Some(pledge) = holding.pledge.as_mut() {
                pledge.amount -= amount;
                lender = Some(pledge.lender.clone());
                if pledge.amount == 0 {
                    holding.pledge = None;
                }
            }
        }
        let lender = lender
            .ok_or_else(|| Error::NotFound(format!("pledge on receipt {} by {}", receipt_id, holder)))?;

        self.move_units(holder, &lender, receipt_id, amount);

        tracing::warn!(%receipt_id, %holder, %lender, amount, "Collateral seized");

        self.sink.publish(
            ctx.now,
            Event::CollateralSeized {
                receipt_id,
                holder: holder.clone(),
                lender: lender.clone(),
                amount,
            },
        );
        Ok(lender)
    }

    /// Validate a seizure without applying it
    pub fn check_seize(
        &self,
        ctx: &CallContext,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        self.require_not_paused()?;
        self.access.require(Role::CollateralManager, &ctx.caller)?;

        if amount == 0 {
            return Err(Error::InvalidQuantity("seized amount must be positive".to_string()));
        }

        let pledge = self
            .pledge_of(holder, receipt_id)
            .ok_or_else(|| Error::NotFound(format!("pledge on receipt {} by {}", receipt_id, holder)))?;
        if amount > pledge.amount {
            return Err(Error::ExceedsPledgedAmount {
                requested: amount,
                pledged: pledge.amount,
            });
        }
        Ok(())
    }

    /// Validate a pledge release without applying it
    pub fn check_release(
        &self,
        ctx: &CallContext,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        self.require_not_paused()?;
        self.access.require(Role::CollateralManager, &ctx.caller)?;

        let pledged = self.pledge_of(holder, receipt_id).map_or(0, |p| p.amount);
        if amount == 0 || amount > pledged {
            return Err(Error::ExceedsPledgedAmount {
                requested: amount,
                pledged,
            });
        }
        Ok(())
    }
}

impl ReceiptLedger {
    /// Rebuild state from a journaled event without publishing
    ///
    /// Events owned by other components are ignored. A record that does not
    /// fit the current state means the journal is corrupt.
    pub fn apply_event(&mut self, timestamp: Timestamp, event: &Event) -> Result<()> {
        match event {
            Event::RoleGranted { role, account } => {
                self.access.grant(*role, account.clone());
            }
            Event::RoleRevoked { role, account } => {
                self.access.revoke(*role, account);
            }
            Event::Paused { .. } => self.paused = true,
            Event::Unpaused { .. } => self.paused = false,
            Event::ReceiptIssued {
                receipt_id,
                issuer,
                to,
                quantity,
                expiry,
                metadata_ref,
            } => {
                let next_id = receipt_id
                    .0
                    .checked_add(1)
                    .ok_or_else(|| Error::overflow("receipt id"))?;
                self.receipts.insert(
                    *receipt_id,
                    Receipt {
                        id: *receipt_id,
                        issuer: issuer.clone(),
                        total_supply: *quantity,
                        expiry: *expiry,
                        metadata_ref: metadata_ref.clone(),
                        issued_at: timestamp,
                    },
                );
                self.holdings.entry((*receipt_id, to.clone())).or_default().balance = *quantity;
                self.next_receipt_id = self.next_receipt_id.max(next_id);
            }
            Event::MetadataUpdated {
                receipt_id,
                metadata_ref,
            } => {
                self.receipts
                    .get_mut(receipt_id)
                    .ok_or_else(|| Error::NotFound(format!("receipt {}", receipt_id)))?
                    .metadata_ref = metadata_ref.clone();
            }
            Event::ApprovalForAll {
                owner,
                operator,
                approved,
            } => {
                let key = (owner.clone(), operator.clone());
                if *approved {
                    self.approvals.insert(key);
                } else {
                    self.approvals.remove(&key);
                }
            }
            Event::Transfer {
                from,
                to,
                receipt_id,
                amount,
                ..
            } => {
                self.require_journaled_units(from, *receipt_id, *amount)?;
                self.move_units(from, to, *receipt_id, *amount);
            }
            Event::CollateralPledged {
                receipt_id,
                holder,
                lender,
                total_pledged,
                ..
            } => {
                self.holdings
                    .entry((*receipt_id, holder.clone()))
                    .or_default()
                    .pledge = Some(Pledge {
                    lender: lender.clone(),
                    amount: *total_pledged,
                });
            }
            Event::CollateralUnpledged {
                receipt_id,
                holder,
                lender,
                remaining,
                ..
            } => {
                let holding = self
                    .holdings
                    .get_mut(&(*receipt_id, holder.clone()))
                    .ok_or_else(|| Error::NotFound(format!("holding {} of receipt {}", holder, receipt_id)))?;
                holding.pledge = (*remaining > 0).then(|| Pledge {
                    lender: lender.clone(),
                    amount: *remaining,
                });
            }
            Event::CollateralSeized {
                receipt_id,
                holder,
                lender,
                amount,
            } => {
                self.require_journaled_units(holder, *receipt_id, *amount)?;
                let holding = self
                    .holdings
                    .get_mut(&(*receipt_id, holder.clone()))
                    .ok_or_else(|| Error::NotFound(format!("holding {} of receipt {}", holder, receipt_id)))?;
                let pledge = holding
                    .pledge
                    .as_mut()
                    .ok_or_else(|| Error::NotFound(format!("pledge on receipt {} by {}", receipt_id, holder)))?;
                pledge.amount = pledge.amount.checked_sub(*amount).ok_or(Error::ExceedsPledgedAmount {
                    requested: *amount,
                    pledged: pledge.amount,
                })?;
                if pledge.amount == 0 {
                    holding.pledge = None;
                }
                self.move_units(holder, lender, *receipt_id, *amount);
            }
            _ => {}
        }
        Ok(())
    }

    fn require_journaled_units(
        &self,
        holder: &Address,
        receipt_id: ReceiptId,
        amount: Quantity,
    ) -> Result<()> {
        let balance = self.balance_of(holder, receipt_id);
        if balance < amount {
            return Err(Error::Storage(format!(
                "journal moves {} units of receipt {} from {}, which holds {}",
                amount, receipt_id, holder, balance
            )));
        }
        Ok(())
    }
}

impl Obligations for ReceiptLedger {
    fn has_outstanding_obligations(&self, account: &Address, now: Timestamp) -> bool {
        self.receipts
            .values()
            .any(|r| &r.issuer == account && r.is_valid_at(now))
    }
}

impl std::fmt::Debug for ReceiptLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptLedger")
            .field("receipts", &self.receipts.len())
            .field("holdings", &self.holdings.len())
            .field("paused", &self.paused)
            .finish()
    }
}
