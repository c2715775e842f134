//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify:
//! - Pledged amount never exceeds balance
//! - Total supply is conserved across transfers and seizures
//! - Failed operations leave balances and pledges untouched
//! - The event log hash chain stays valid

use proptest::prelude::*;
use receipt_ledger::{
    Address, CallContext, EventLog, ReceiptId, ReceiptLedger, Role, RoleDirectory,
};
use std::sync::Arc;

const NOW: i64 = 1_700_000_000;
const EXPIRY: i64 = NOW + 86_400;

const HOLDERS: [&str; 3] = ["farmer1", "farmer2", "buyer"];
const LENDERS: [&str; 2] = ["bank-a", "bank-b"];

#[derive(Debug, Clone)]
enum Op {
    Transfer { from: usize, to: usize, amount: u64 },
    Pledge { holder: usize, lender: usize, amount: u64 },
    Unpledge { holder: usize, amount: u64 },
    Seize { holder: usize, amount: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..3usize, 0u64..600).prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (0..3usize, 0..2usize, 0u64..600).prop_map(|(holder, lender, amount)| Op::Pledge {
            holder,
            lender,
            amount
        }),
        (0..3usize, 0u64..600).prop_map(|(holder, amount)| Op::Unpledge { holder, amount }),
        (0..3usize, 0u64..600).prop_map(|(holder, amount)| Op::Seize { holder, amount }),
    ]
}

struct Setup {
    ledger: ReceiptLedger,
    log: Arc<EventLog>,
    receipt: ReceiptId,
    pool: Address,
}

fn setup(supply: u64) -> Setup {
    let log = Arc::new(EventLog::new());
    let admin = Address::new("admin");
    let warehouse = Address::new("warehouse");
    let pool = Address::new("lending-pool");
    let admin_ctx = CallContext::new(admin.clone(), NOW);

    let mut ledger = ReceiptLedger::new(admin.clone(), log.clone());
    let directory = RoleDirectory::new(admin, log.clone());
    ledger.grant_role(&admin_ctx, Role::Minter, warehouse.clone()).unwrap();
    ledger
        .grant_role(&admin_ctx, Role::CollateralManager, pool.clone())
        .unwrap();

    let receipt = ledger
        .issue(
            &CallContext::new(warehouse, NOW),
            &directory,
            Address::new(HOLDERS[0]),
            supply,
            EXPIRY,
            "ipfs://QmProp",
        )
        .unwrap();

    Setup {
        ledger,
        log,
        receipt,
        pool,
    }
}

fn snapshot(ledger: &ReceiptLedger, id: ReceiptId) -> Vec<(u64, u64)> {
    HOLDERS
        .iter()
        .chain(LENDERS.iter())
        .map(|h| {
            let holder = Address::new(*h);
            (ledger.balance_of(&holder, id), ledger.pledge_status(&holder, id).amount)
        })
        .collect()
}

fn apply(s: &mut Setup, op: &Op) -> bool {
    let id = s.receipt;
    match op {
        Op::Transfer { from, to, amount } => {
            let (from, to) = (Address::new(HOLDERS[*from]), Address::new(HOLDERS[*to]));
            let ctx = CallContext::new(from.clone(), NOW);
            s.ledger.transfer(&ctx, &from, &to, id, *amount).is_ok()
        }
        Op::Pledge { holder, lender, amount } => {
            let ctx = CallContext::new(Address::new(HOLDERS[*holder]), NOW);
            s.ledger
                .pledge_collateral(&ctx, id, *amount, Address::new(LENDERS[*lender]))
                .is_ok()
        }
        Op::Unpledge { holder, amount } => {
            let holder = Address::new(HOLDERS[*holder]);
            match s.ledger.pledge_status(&holder, id).lender {
                Some(lender) => s
                    .ledger
                    .unpledge_collateral(&CallContext::new(lender, NOW), &holder, id, *amount)
                    .is_ok(),
                None => false,
            }
        }
        Op::Seize { holder, amount } => {
            let holder = Address::new(HOLDERS[*holder]);
            let ctx = CallContext::new(s.pool.clone(), NOW);
            s.ledger.seize_collateral(&ctx, &holder, id, *amount).is_ok()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: pledge <= balance for every holding after any sequence
    #[test]
    fn prop_pledge_never_exceeds_balance(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut s = setup(1_000);
        for op in &ops {
            apply(&mut s, op);
            for (balance, pledged) in snapshot(&s.ledger, s.receipt) {
                prop_assert!(pledged <= balance);
            }
        }
    }

    /// Property: units are neither created nor destroyed
    #[test]
    fn prop_supply_conserved(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut s = setup(1_000);
        for op in &ops {
            apply(&mut s, op);
        }
        let total: u64 = snapshot(&s.ledger, s.receipt).iter().map(|(b, _)| b).sum();
        prop_assert_eq!(total, 1_000);
        prop_assert_eq!(s.ledger.receipt(s.receipt).unwrap().total_supply, 1_000);
    }

    /// Property: a rejected operation changes no balance or pledge
    #[test]
    fn prop_failed_ops_are_atomic(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut s = setup(500);
        for op in &ops {
            let before = snapshot(&s.ledger, s.receipt);
            let events_before = s.log.len();
            if !apply(&mut s, op) {
                prop_assert_eq!(snapshot(&s.ledger, s.receipt), before);
                prop_assert_eq!(s.log.len(), events_before);
            }
        }
    }

    /// Property: pledge then full unpledge restores transferability
    #[test]
    fn prop_pledge_unpledge_round_trip(supply in 1u64..10_000, pledge in 1u64..10_000) {
        let pledge = pledge.min(supply);
        let mut s = setup(supply);
        let farmer = Address::new(HOLDERS[0]);
        let bank = Address::new(LENDERS[0]);
        let id = s.receipt;

        s.ledger
            .pledge_collateral(&CallContext::new(farmer.clone(), NOW), id, pledge, bank.clone())
            .unwrap();
        prop_assert_eq!(s.ledger.transferable(&farmer, id), supply - pledge);

        s.ledger
            .unpledge_collateral(&CallContext::new(bank, NOW), &farmer, id, pledge)
            .unwrap();
        prop_assert_eq!(s.ledger.transferable(&farmer, id), supply);
        prop_assert!(!s.ledger.pledge_status(&farmer, id).is_pledged);
    }

    /// Property: the event log chain verifies after any sequence
    #[test]
    fn prop_event_chain_valid(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut s = setup(1_000);
        for op in &ops {
            apply(&mut s, op);
        }
        prop_assert!(s.log.verify_chain());
        let records = s.log.records();
        for (i, record) in records.iter().enumerate() {
            prop_assert_eq!(record.sequence, i as u64 + 1);
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_expired_receipt_is_frozen_but_seizable() {
        let mut s = setup(5_000);
        let farmer = Address::new(HOLDERS[0]);
        let bank = Address::new(LENDERS[0]);
        let id = s.receipt;

        s.ledger
            .pledge_collateral(&CallContext::new(farmer.clone(), NOW), id, 2_000, bank.clone())
            .unwrap();

        let after = CallContext::new(farmer.clone(), EXPIRY + 1);
        assert!(s
            .ledger
            .transfer(&after, &farmer, &Address::new(HOLDERS[2]), id, 1)
            .is_err());

        let pool_ctx = CallContext::new(s.pool.clone(), EXPIRY + 1);
        s.ledger.seize_collateral(&pool_ctx, &farmer, id, 2_000).unwrap();
        assert_eq!(s.ledger.balance_of(&bank, id), 2_000);
        assert_eq!(s.ledger.balance_of(&farmer, id), 3_000);
    }
}
