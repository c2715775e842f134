//! Native currency balances
//!
//! The marketplace and lending pool move money through the [`Payments`]
//! trait: a synchronous transfer that either fully succeeds or changes
//! nothing. [`NativeBalances`] is the in-memory implementation.

use crate::{
    types::{Address, Wei},
    Error, Result,
};
use std::collections::HashMap;

/// Synchronous `pay(to, amount)` capability
pub trait Payments {
    /// Spendable balance
    fn balance_of(&self, account: &Address) -> Wei;

    /// Fail if `transfer(from, to, amount)` would fail
    fn check_transfer(&self, from: &Address, to: &Address, amount: Wei) -> Result<()>;

    /// Move `amount` from `from` to `to`; no effect on error
    fn transfer(&mut self, from: &Address, to: &Address, amount: Wei) -> Result<()>;
}

/// In-memory wei balances
#[derive(Debug, Default, Clone)]
pub struct NativeBalances {
    balances: HashMap<Address, Wei>,
    total: Wei,
}

impl NativeBalances {
    /// Empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit money arriving from outside the system
    pub fn deposit(&mut self, account: &Address, amount: Wei) -> Result<Wei> {
        let current = self.balance_of(account);
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| Error::overflow("deposit"))?;
        let total = self
            .total
            .checked_add(amount)
            .ok_or_else(|| Error::overflow("total supply"))?;

        self.balances.insert(account.clone(), updated);
        self.total = total;
        Ok(updated)
    }

    /// Sum of all balances
    pub fn total(&self) -> Wei {
        self.total
    }
}

impl Payments for NativeBalances {
    fn balance_of(&self, account: &Address) -> Wei {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn check_transfer(&self, from: &Address, to: &Address, amount: Wei) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(Error::InsufficientFunds {
                required: amount,
                available,
            });
        }
        if from != to {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or_else(|| Error::overflow("credit"))?;
        }
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Wei) -> Result<()> {
        self.check_transfer(from, to, amount)?;
        if amount == 0 || from == to {
            return Ok(());
        }

        let debited = self.balance_of(from) - amount;
        let credited = self.balance_of(to) + amount;
        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);

        tracing::trace!(%from, %to, amount, "Native transfer");
        Ok(())
    }
}
