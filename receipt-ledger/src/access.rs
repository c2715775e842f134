//! Role-based access control for the ledger

use crate::{
    types::{Address, Role},
    Error, Result,
};
use std::collections::HashSet;

/// Set of `(role, account)` grants
#[derive(Debug, Default, Clone)]
pub struct AccessControl {
    grants: HashSet<(Role, Address)>,
}

impl AccessControl {
    /// Access control with a single admin
    pub fn new(admin: Address) -> Self {
        let mut grants = HashSet::new();
        grants.insert((Role::Admin, admin));
        Self { grants }
    }

    /// Whether `account` holds `role`
    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.grants.contains(&(role, account.clone()))
    }

    /// Fail with `Unauthorized` unless `account` holds `role`
    pub fn require(&self, role: Role, account: &Address) -> Result<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(Error::Unauthorized(format!("{} lacks role {:?}", account, role)))
        }
    }

    /// Add a grant; returns false if it already existed
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.grants.insert((role, account))
    }

    /// Remove a grant; returns false if it did not exist
    pub fn revoke(&mut self, role: Role, account: &Address) -> bool {
        self.grants.remove(&(role, account.clone()))
    }

    /// Accounts holding `role`
    pub fn members(&self, role: Role) -> Vec<Address> {
        let mut members: Vec<Address> = self
            .grants
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, a)| a.clone())
            .collect();
        members.sort();
        members
    }
}
