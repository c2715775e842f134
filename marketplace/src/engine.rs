//! Direct-listing marketplace
//!
//! Sellers list receipt units at a fixed price per unit. Units stay with the
//! seller until a purchase; at purchase time the marketplace re-validates the
//! seller's transferable balance and moves units as an approved ledger
//! operator. The platform fee is retained at the marketplace account.

use crate::{
    config::MarketplaceConfig,
    types::{Listing, ListingId, Purchase},
    Error, Result,
};
use receipt_ledger::{
    access::AccessControl, apply_bps, Address, CallContext, Event, EventSink, Payments, Quantity,
    ReceiptId, ReceiptLedger, Role, Timestamp, Wei,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Marketplace engine
pub struct Marketplace {
    /// Account the marketplace acts as
    address: Address,

    /// Admins allowed to withdraw fees
    access: AccessControl,

    /// Fee in basis points
    fee_bps: u32,

    /// All listings ever created
    listings: BTreeMap<ListingId, Listing>,

    /// Next listing ID
    next_listing_id: u64,

    /// Fees not yet withdrawn
    accrued_fees: Wei,

    /// Event sink
    sink: Arc<dyn EventSink>,
}

impl Marketplace {
    /// Create new marketplace administered by `admin`
    pub fn new(config: &MarketplaceConfig, admin: Address, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            address: Address::new(config.address.as_str()),
            access: AccessControl::new(admin),
            fee_bps: config.fee_bps,
            listings: BTreeMap::new(),
            next_listing_id: 1,
            accrued_fees: 0,
            sink,
        })
    }

    /// Account sellers approve as operator
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Fee in basis points
    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    /// List units for sale
    pub fn list_for_sale(
        &mut self,
        ctx: &CallContext,
        ledger: &ReceiptLedger,
        receipt_id: ReceiptId,
        quantity: Quantity,
        price_per_unit: Wei,
    ) -> Result<ListingId> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity("listing quantity must be positive".to_string()));
        }
        if price_per_unit == 0 {
            return Err(Error::InvalidPrice);
        }

        ledger.receipt(receipt_id)?;
        if !ledger.is_valid(receipt_id, ctx.now) {
            return Err(receipt_ledger::Error::ExpiredReceipt(receipt_id.0).into());
        }

        let available = ledger.transferable(&ctx.caller, receipt_id);
        if quantity > available {
            return Err(receipt_ledger::Error::InsufficientUnpledgedBalance {
                requested: quantity,
                available,
            }
            .into());
        }

        // A listing whose full price overflows could never be bought.
        price_per_unit
            .checked_mul(quantity as u128)
            .ok_or_else(|| Error::ArithmeticOverflow("listing total price".to_string()))?;
        let next_id = self
            .next_listing_id
            .checked_add(1)
            .ok_or_else(|| Error::ArithmeticOverflow("listing id".to_string()))?;

        let id = ListingId(self.next_listing_id);
        self.next_listing_id = next_id;

        self.listings.insert(
            id,
            Listing {
                id,
                seller: ctx.caller.clone(),
                receipt_id,
                quantity,
                remaining: quantity,
                price_per_unit,
                active: true,
                created_at: ctx.now,
            },
        );

        tracing::info!(
            listing_id = %id,
            seller = %ctx.caller,
            %receipt_id,
            quantity,
            price_per_unit,
            "Listing created"
        );

        self.sink.publish(
            ctx.now,
            Event::ListingCreated {
                listing_id: id.0,
                seller: ctx.caller.clone(),
                receipt_id,
                quantity,
                price_per_unit,
            },
        );

        Ok(id)
    }

    /// Buy `quantity` units from a listing, paying exactly `quantity * price`
    pub fn buy_token(
        &mut self,
        ctx: &CallContext,
        ledger: &mut ReceiptLedger,
        payments: &mut dyn Payments,
        listing_id: ListingId,
        quantity: Quantity,
        payment: Wei,
    ) -> Result<Purchase> {
        let listing = self.get_listing(listing_id)?.clone();

        if !listing.active {
            return Err(Error::ListingNotActive(listing_id.0));
        }
        if quantity == 0 || quantity > listing.remaining {
            return Err(Error::InvalidQuantity(format!(
                "requested {}, listing {} has {} remaining",
                quantity, listing_id, listing.remaining
            )));
        }

        let total_price = listing
            .price_per_unit
            .checked_mul(quantity as u128)
            .ok_or_else(|| Error::ArithmeticOverflow("purchase total".to_string()))?;
        if payment != total_price {
            return Err(Error::IncorrectPayment {
                expected: total_price,
                received: payment,
            });
        }

        let platform_fee = apply_bps(total_price, self.fee_bps)
            .ok_or_else(|| Error::ArithmeticOverflow("platform fee".to_string()))?;
        let seller_proceeds = total_price - platform_fee;
        let accrued_fees = self
            .accrued_fees
            .checked_add(platform_fee)
            .ok_or_else(|| Error::ArithmeticOverflow("accrued fees".to_string()))?;

        let buyer = ctx.caller.clone();
        let available = payments.balance_of(&buyer);
        if available < total_price {
            return Err(receipt_ledger::Error::InsufficientFunds {
                required: total_price,
                available,
            }
            .into());
        }
        payments.check_transfer(&buyer, &listing.seller, seller_proceeds)?;
        payments.check_transfer(&buyer, &self.address, platform_fee)?;

        let seller_available = ledger.transferable(&listing.seller, listing.receipt_id);
        if seller_available < quantity {
            return Err(Error::InsufficientSellerBalance {
                requested: quantity,
                available: seller_available,
            });
        }

        let operator = ctx.with_caller(&self.address);
        ledger.check_transfer(&operator, &listing.seller, listing.receipt_id, quantity)?;

        // Validated; apply.
        ledger.transfer(
            &operator,
            &listing.seller,
            &buyer,
            listing.receipt_id,
            quantity,
        )?;
        payments.transfer(&buyer, &listing.seller, seller_proceeds)?;
        payments.transfer(&buyer, &self.address, platform_fee)?;
        self.accrued_fees = accrued_fees;

        let remaining = listing.remaining - quantity;
        if let Some(entry) = self.listings.get_mut(&listing_id) {
            entry.remaining = remaining;
            entry.active = remaining > 0;
        }

        tracing::info!(
            %listing_id,
            %buyer,
            seller = %listing.seller,
            quantity,
            total_price,
            platform_fee,
            remaining,
            "Purchase completed"
        );

        self.sink.publish(
            ctx.now,
            Event::PurchaseCompleted {
                listing_id: listing_id.0,
                buyer: buyer.clone(),
                seller: listing.seller.clone(),
                quantity,
                total_price,
                platform_fee,
                remaining,
            },
        );

        Ok(Purchase {
            listing_id,
            buyer,
            seller: listing.seller,
            quantity,
            total_price,
            platform_fee,
            seller_proceeds,
            remaining,
        })
    }

    /// Withdraw an active listing (seller only)
    pub fn cancel_listing(&mut self, ctx: &CallContext, listing_id: ListingId) -> Result<()> {
        let listing = self
            .listings
            .get_mut(&listing_id)
            .ok_or(Error::NotFound(listing_id.0))?;

        if listing.seller != ctx.caller {
            return Err(Error::Unauthorized(format!(
                "{} is not the seller of listing {}",
                ctx.caller, listing_id
            )));
        }
        if !listing.active {
            return Err(Error::ListingNotActive(listing_id.0));
        }

        listing.active = false;

        tracing::info!(%listing_id, seller = %ctx.caller, "Listing cancelled");

        self.sink.publish(
            ctx.now,
            Event::ListingCancelled {
                listing_id: listing_id.0,
                seller: ctx.caller.clone(),
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
                "{} is not a marketplace admin",
                ctx.caller
            )));
        }

        let amount = self.accrued_fees;
        if amount == 0 {
            return Ok(0);
        }

        payments.transfer(&self.address, &ctx.caller, amount)?;
        self.accrued_fees = 0;

        tracing::info!(to = %ctx.caller, amount, "Marketplace fees withdrawn");

        self.sink.publish(
            ctx.now,
            Event::MarketplaceFeesWithdrawn {
                to: ctx.caller.clone(),
                amount,
            },
        );
        Ok(amount)
    }

    /// Listing by ID, active or not
    pub fn get_listing(&self, listing_id: ListingId) -> Result<&Listing> {
        self.listings
            .get(&listing_id)
            .ok_or(Error::NotFound(listing_id.0))
    }

    /// Open listings in creation order
    pub fn active_listings(&self) -> Vec<&Listing> {
        self.listings.values().filter(|l| l.active).collect()
    }

    /// Every listing created by `seller`
    pub fn listings_by_seller(&self, seller: &Address) -> Vec<&Listing> {
        self.listings
            .values()
            .filter(|l| &l.seller == seller)
            .collect()
    }

    /// Fees not yet withdrawn
    pub fn accrued_fees(&self) -> Wei {
        self.accrued_fees
    }

    /// Number of listings ever created
    pub fn listing_count(&self) -> u64 {
        self.next_listing_id - 1
    }

    /// Rebuild state from a journaled event without publishing
    ///
    /// Unit and payment movements belong to the ledger and the wallet book;
    /// only listings and accrued fees are restored here.
    pub fn apply_event(&mut self, timestamp: Timestamp, event: &Event) -> Result<()> {
        match event {
            Event::ListingCreated {
                listing_id,
                seller,
                receipt_id,
                quantity,
                price_per_unit,
            } => {
                let id = ListingId(*listing_id);
                let next_id = listing_id
                    .checked_add(1)
                    .ok_or_else(|| Error::ArithmeticOverflow("listing id".to_string()))?;
                self.listings.insert(
                    id,
                    Listing {
                        id,
                        seller: seller.clone(),
                        receipt_id: *receipt_id,
                        quantity: *quantity,
                        remaining: *quantity,
                        price_per_unit: *price_per_unit,
                        active: true,
                        created_at: timestamp,
                    },
                );
                self.next_listing_id = self.next_listing_id.max(next_id);
            }
            Event::PurchaseCompleted {
                listing_id,
                platform_fee,
                remaining,
                ..
            } => {
                let listing = self
                    .listings
                    .get_mut(&ListingId(*listing_id))
                    .ok_or(Error::NotFound(*listing_id))?;
                listing.remaining = *remaining;
                listing.active = *remaining > 0;
                self.accrued_fees = self
                    .accrued_fees
                    .checked_add(*platform_fee)
                    .ok_or_else(|| Error::ArithmeticOverflow("accrued fees".to_string()))?;
            }
            Event::ListingCancelled { listing_id, .. } => {
                self.listings
                    .get_mut(&ListingId(*listing_id))
                    .ok_or(Error::NotFound(*listing_id))?
                    .active = false;
            }
            Event::MarketplaceFeesWithdrawn { amount, .. } => {
                self.accrued_fees = self.accrued_fees.saturating_sub(*amount);
            }
            _ => {}
        }
        Ok(())
    }
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("address", &self.address)
            .field("fee_bps", &self.fee_bps)
            .field("listings", &self.listings.len())
            .field("accrued_fees", &self.accrued_fees)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_ledger::{units::parse_ether, ErrorKind, EventLog, NativeBalances, RoleDirectory};

    const NOW: i64 = 1_700_000_000;
    const YEAR: i64 = 365 * 24 * 60 * 60;

    struct Fixture {
        market: Marketplace,
        ledger: ReceiptLedger,
        funds: NativeBalances,
        log: Arc<EventLog>,
        admin: Address,
        farmer: Address,
        buyer: Address,
        receipt: ReceiptId,
    }

    fn eth(value: &str) -> Wei {
        parse_ether(value).unwrap()
    }

    fn setup() -> Fixture {
        let log = Arc::new(EventLog::new());
        let admin = Address::new("deployer");
        let warehouse = Address::new("warehouse");
        let farmer = Address::new("farmer1");
        let buyer = Address::new("buyer");

        let mut ledger = ReceiptLedger::new(admin.clone(), log.clone());
        let directory = RoleDirectory::new(admin.clone(), log.clone());
        ledger
            .grant_role(&CallContext::new(admin.clone(), NOW), Role::Minter, warehouse.clone())
            .unwrap();
        let receipt = ledger
            .issue(
                &CallContext::new(warehouse, NOW),
                &directory,
                farmer.clone(),
                5000,
                NOW + YEAR,
                "ipfs://QmExampleHash1/wheat_receipt.json",
            )
            .unwrap();

        let market =
            Marketplace::new(&MarketplaceConfig::default(), admin.clone(), log.clone()).unwrap();
        ledger
            .set_approval_for_all(&CallContext::new(farmer.clone(), NOW), market.address().clone(), true)
            .unwrap();

        let mut funds = NativeBalances::new();
        funds.deposit(&buyer, eth("100")).unwrap();

        Fixture {
            market,
            ledger,
            funds,
            log,
            admin,
            farmer,
            buyer,
            receipt,
        }
    }

    fn at(who: &Address) -> CallContext {
        CallContext::new(who.clone(), NOW)
    }

    #[test]
    fn test_list_and_buy() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 1000, eth("0.01"))
            .unwrap();

        let listing = fx.market.get_listing(id).unwrap();
        assert_eq!(listing.remaining, 1000);
        assert!(listing.active);

        let purchase = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 1000, eth("10"))
            .unwrap();

        assert_eq!(purchase.total_price, eth("10"));
        assert_eq!(purchase.platform_fee, eth("0.25"));
        assert_eq!(purchase.seller_proceeds, eth("9.75"));
        assert_eq!(fx.ledger.balance_of(&fx.buyer, fx.receipt), 1000);
        assert_eq!(fx.ledger.balance_of(&fx.farmer, fx.receipt), 4000);
        assert_eq!(fx.funds.balance_of(&fx.farmer), eth("9.75"));
        assert_eq!(fx.funds.balance_of(&fx.buyer), eth("90"));
        assert_eq!(fx.market.accrued_fees(), eth("0.25"));
        assert!(!fx.market.get_listing(id).unwrap().active);
    }

    #[test]
    fn test_partial_fill_keeps_listing_active() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 1000, eth("0.01"))
            .unwrap();

        let purchase = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 400, eth("4"))
            .unwrap();
        assert_eq!(purchase.remaining, 600);

        let listing = fx.market.get_listing(id).unwrap();
        assert!(listing.active);
        assert_eq!(listing.quantity, 1000);
        assert_eq!(listing.remaining, 600);

        let err = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 601, eth("6.01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
    }

    #[test]
    fn test_listing_validation() {
        let mut fx = setup();
        let ctx = at(&fx.farmer);

        let err = fx
            .market
            .list_for_sale(&ctx, &fx.ledger, fx.receipt, 0, eth("0.01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);

        let err = fx
            .market
            .list_for_sale(&ctx, &fx.ledger, fx.receipt, 10, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPrice);

        let err = fx
            .market
            .list_for_sale(&ctx, &fx.ledger, fx.receipt, 5001, eth("0.01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientUnpledgedBalance);

        let err = fx
            .market
            .list_for_sale(&ctx, &fx.ledger, ReceiptId(42), 1, eth("0.01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let expired = CallContext::new(fx.farmer.clone(), NOW + YEAR);
        let err = fx
            .market
            .list_for_sale(&expired, &fx.ledger, fx.receipt, 10, eth("0.01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExpiredReceipt);
        assert_eq!(fx.market.listing_count(), 0);
    }

    #[test]
    fn test_incorrect_payment_changes_nothing() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 1000, eth("0.01"))
            .unwrap();
        let events_before = fx.log.len();

        let err = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 1000, eth("9.99"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectPayment);
        assert_eq!(fx.ledger.balance_of(&fx.buyer, fx.receipt), 0);
        assert_eq!(fx.funds.balance_of(&fx.buyer), eth("100"));
        assert_eq!(fx.log.len(), events_before);
    }

    #[test]
    fn test_buyer_without_funds() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 5000, eth("0.1"))
            .unwrap();

        let err = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 5000, eth("500"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(fx.ledger.balance_of(&fx.farmer, fx.receipt), 5000);
    }

    #[test]
    fn test_seller_pledged_after_listing() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 3000, eth("0.01"))
            .unwrap();

        fx.ledger
            .pledge_collateral(&at(&fx.farmer), fx.receipt, 4000, Address::new("bank"))
            .unwrap();

        let err = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 3000, eth("30"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientSellerBalance);
        assert_eq!(fx.funds.balance_of(&fx.buyer), eth("100"));
        assert!(fx.market.get_listing(id).unwrap().active);
    }

    #[test]
    fn test_buy_without_operator_approval() {
        let mut fx = setup();
        fx.ledger
            .set_approval_for_all(&at(&fx.farmer), fx.market.address().clone(), false)
            .unwrap();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 10, eth("0.01"))
            .unwrap();

        let err = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 10, eth("0.1"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(fx.funds.balance_of(&fx.buyer), eth("100"));
    }

    #[test]
    fn test_cancel_listing() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 1000, eth("0.01"))
            .unwrap();

        let err = fx.market.cancel_listing(&at(&fx.buyer), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        fx.market.cancel_listing(&at(&fx.farmer), id).unwrap();
        assert!(fx.market.active_listings().is_empty());

        let err = fx.market.cancel_listing(&at(&fx.farmer), id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ListingNotActive);

        let err = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 1, eth("0.01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ListingNotActive);

        let err = fx.market.get_listing(ListingId(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_withdraw_fees_admin_only() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 1000, eth("0.01"))
            .unwrap();
        fx.market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 1000, eth("10"))
            .unwrap();

        let err = fx
            .market
            .withdraw_platform_fees(&at(&fx.farmer), &mut fx.funds)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let paid = fx
            .market
            .withdraw_platform_fees(&at(&fx.admin), &mut fx.funds)
            .unwrap();
        assert_eq!(paid, eth("0.25"));
        assert_eq!(fx.funds.balance_of(&fx.admin), eth("0.25"));
        assert_eq!(fx.market.accrued_fees(), 0);

        let paid = fx
            .market
            .withdraw_platform_fees(&at(&fx.admin), &mut fx.funds)
            .unwrap();
        assert_eq!(paid, 0);
    }

    #[test]
    fn test_listings_by_seller() {
        let mut fx = setup();
        fx.market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 10, eth("0.01"))
            .unwrap();
        fx.market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 20, eth("0.02"))
            .unwrap();

        assert_eq!(fx.market.listings_by_seller(&fx.farmer).len(), 2);
        assert!(fx.market.listings_by_seller(&fx.buyer).is_empty());
        assert_eq!(fx.market.listing_count(), 2);
    }

    #[test]
    fn test_paused_ledger_blocks_purchase_before_payment() {
        let mut fx = setup();
        let id = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 1000, eth("0.01"))
            .unwrap();
        fx.ledger.pause(&at(&fx.admin)).unwrap();

        let err = fx
            .market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, id, 500, eth("5"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Paused);

        assert_eq!(fx.funds.balance_of(&fx.buyer), eth("100"));
        assert_eq!(fx.funds.balance_of(&fx.farmer), 0);
        assert_eq!(fx.ledger.balance_of(&fx.farmer, fx.receipt), 5000);
        assert_eq!(fx.market.get_listing(id).unwrap().remaining, 1000);
        assert_eq!(fx.market.accrued_fees(), 0);
    }

    #[test]
    fn test_apply_event_rebuilds_listings() {
        let mut fx = setup();
        let first = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 1000, eth("0.01"))
            .unwrap();
        let second = fx
            .market
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 200, eth("0.02"))
            .unwrap();
        fx.market
            .buy_token(&at(&fx.buyer), &mut fx.ledger, &mut fx.funds, first, 400, eth("4"))
            .unwrap();
        fx.market.cancel_listing(&at(&fx.farmer), second).unwrap();

        let mut rebuilt =
            Marketplace::new(&MarketplaceConfig::default(), fx.admin.clone(), Arc::new(EventLog::new()))
                .unwrap();
        for record in fx.log.records() {
            rebuilt.apply_event(record.timestamp, &record.event).unwrap();
        }

        assert_eq!(rebuilt.get_listing(first).unwrap(), fx.market.get_listing(first).unwrap());
        assert!(!rebuilt.get_listing(second).unwrap().active);
        assert_eq!(rebuilt.accrued_fees(), eth("0.1"));
        assert_eq!(rebuilt.listing_count(), 2);

        let third = rebuilt
            .list_for_sale(&at(&fx.farmer), &fx.ledger, fx.receipt, 10, eth("0.01"))
            .unwrap();
        assert_eq!(third, ListingId(3));
    }
}
