//! Registry of warehouse operators (issuers) and banks (lenders)

use crate::{
    access::AccessControl,
    events::{Event, EventSink},
    types::{Address, CallContext, Role, Timestamp},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Directory view consumed by the ledger and the lending pool
pub trait RoleLookup {
    /// Registered, active warehouse
    fn is_issuer_active(&self, account: &Address) -> bool;

    /// Registered, active bank
    fn is_lender_active(&self, account: &Address) -> bool;
}

/// Outstanding commitments that block deactivation
pub trait Obligations {
    /// Whether `account` still has live receipts or loans
    fn has_outstanding_obligations(&self, account: &Address, now: Timestamp) -> bool;
}

/// Warehouse operator details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseInfo {
    /// Regulator (WDRA) registration number
    pub registration_no: String,
    /// Location
    pub location: String,
    /// Active flag
    pub is_active: bool,
    /// First registration time
    pub registered_at: Timestamp,
}

/// Bank details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankInfo {
    /// Display name
    pub name: String,
    /// Banking license
    pub license: String,
    /// Active flag
    pub is_active: bool,
    /// First registration time
    pub registered_at: Timestamp,
}

/// Role directory
pub struct RoleDirectory {
    admins: AccessControl,
    warehouses: BTreeMap<Address, WarehouseInfo>,
    banks: BTreeMap<Address, BankInfo>,
    sink: Arc<dyn EventSink>,
}

impl RoleDirectory {
    /// Directory administered by `admin`
    pub fn new(admin: Address, sink: Arc<dyn EventSink>) -> Self {
        Self {
            admins: AccessControl::new(admin),
            warehouses: BTreeMap::new(),
            banks: BTreeMap::new(),
            sink,
        }
    }

    /// Add another registry admin
    pub fn grant_admin(&mut self, ctx: &CallContext, account: Address) -> Result<()> {
        self.admins.require(Role::Admin, &ctx.caller)?;
        if self.admins.grant(Role::Admin, account.clone()) {
            tracing::info!(%account, "Directory admin granted");
            self.sink.publish(ctx.now, Event::AdminGranted { account });
        }
        Ok(())
    }

    /// Whether `account` administers the directory
    pub fn is_admin(&self, account: &Address) -> bool {
        self.admins.has_role(Role::Admin, account)
    }

    /// Register or re-register a warehouse; always leaves it active
    pub fn register_warehouse(
        &mut self,
        ctx: &CallContext,
        warehouse: Address,
        registration_no: &str,
        location: &str,
    ) -> Result<()> {
        self.admins.require(Role::Admin, &ctx.caller)?;
        require_non_empty("registration number", registration_no)?;
        require_non_empty("location", location)?;

        self.put_warehouse(&warehouse, registration_no, location, ctx.now);

        tracing::info!(%warehouse, registration_no, location, "Warehouse registered");

        self.sink.publish(
            ctx.now,
            Event::WarehouseRegistered {
                warehouse,
                registration_no: registration_no.to_string(),
                location: location.to_string(),
            },
        );
        Ok(())
    }

    /// Register or re-register a bank; always leaves it active
    pub fn register_bank(
        &mut self,
        ctx: &CallContext,
        bank: Address,
        name: &str,
        license: &str,
    ) -> Result<()> {
        self.admins.require(Role::Admin, &ctx.caller)?;
        require_non_empty("bank name", name)?;
        require_non_empty("license", license)?;

        self.put_bank(&bank, name, license, ctx.now);

        tracing::info!(%bank, name, "Bank registered");

        self.sink.publish(
            ctx.now,
            Event::BankRegistered {
                bank,
                name: name.to_string(),
                license: license.to_string(),
            },
        );
        Ok(())
    }

    /// Deactivate a warehouse that issued no unexpired receipts
    pub fn deactivate_warehouse(
        &mut self,
        ctx: &CallContext,
        warehouse: &Address,
        obligations: &dyn Obligations,
    ) -> Result<()> {
        self.admins.require(Role::Admin, &ctx.caller)?;

        if !self.warehouses.contains_key(warehouse) {
            return Err(Error::NotFound(format!("warehouse {}", warehouse)));
        }
        if obligations.has_outstanding_obligations(warehouse, ctx.now) {
            return Err(Error::OutstandingObligations(format!(
                "warehouse {} is issuer of unexpired receipts",
                warehouse
            )));
        }

        if let Some(info) = self.warehouses.get_mut(warehouse) {
            info.is_active = false;
        }

        tracing::info!(%warehouse, "Warehouse deactivated");

        self.sink.publish(
            ctx.now,
            Event::WarehouseDeactivated {
                warehouse: warehouse.clone(),
            },
        );
        Ok(())
    }

    /// Deactivate a bank with no live offers or loans
    pub fn deactivate_bank(
        &mut self,
        ctx: &CallContext,
        bank: &Address,
        obligations: &dyn Obligations,
    ) -> Result<()> {
        self.admins.require(Role::Admin, &ctx.caller)?;

        if !self.banks.contains_key(bank) {
            return Err(Error::NotFound(format!("bank {}", bank)));
        }
        if obligations.has_outstanding_obligations(bank, ctx.now) {
            return Err(Error::OutstandingObligations(format!(
                "bank {} has live loans",
                bank
            )));
        }

        if let Some(info) = self.banks.get_mut(bank) {
            info.is_active = false;
        }

        tracing::info!(%bank, "Bank deactivated");

        self.sink
            .publish(ctx.now, Event::BankDeactivated { bank: bank.clone() });
        Ok(())
    }

    /// Warehouse details, if ever registered
    pub fn warehouse(&self, account: &Address) -> Option<&WarehouseInfo> {
        self.warehouses.get(account)
    }

    /// Bank details, if ever registered
    pub fn bank(&self, account: &Address) -> Option<&BankInfo> {
        self.banks.get(account)
    }

    /// Unregistered addresses are inactive
    pub fn is_warehouse_active(&self, account: &Address) -> bool {
        self.warehouses.get(account).is_some_and(|w| w.is_active)
    }

    /// Unregistered addresses are inactive
    pub fn is_bank_active(&self, account: &Address) -> bool {
        self.banks.get(account).is_some_and(|b| b.is_active)
    }

    /// Every warehouse ever registered, by address
    pub fn warehouses(&self) -> Vec<(&Address, &WarehouseInfo)> {
        self.warehouses.iter().collect()
    }

    /// Every bank ever registered, by address
    pub fn banks(&self) -> Vec<(&Address, &BankInfo)> {
        self.banks.iter().collect()
    }

    /// Banks a farmer can currently pledge to, by address
    pub fn active_banks(&self) -> Vec<(&Address, &BankInfo)> {
        self.banks.iter().filter(|(_, b)| b.is_active).collect()
    }

    /// Rebuild state from a journaled event without publishing
    ///
    /// Events owned by other components are ignored.
    pub fn apply_event(&mut self, timestamp: Timestamp, event: &Event) -> Result<()> {
        match event {
            Event::AdminGranted { account } => {
                self.admins.grant(Role::Admin, account.clone());
            }
            Event::WarehouseRegistered {
                warehouse,
                registration_no,
                location,
            } => self.put_warehouse(warehouse, registration_no, location, timestamp),
            Event::BankRegistered { bank, name, license } => {
                self.put_bank(bank, name, license, timestamp)
            }
            Event::WarehouseDeactivated { warehouse } => {
                self.warehouses
                    .get_mut(warehouse)
                    .ok_or_else(|| Error::NotFound(format!("warehouse {}", warehouse)))?
                    .is_active = false;
            }
            Event::BankDeactivated { bank } => {
                self.banks
                    .get_mut(bank)
                    .ok_or_else(|| Error::NotFound(format!("bank {}", bank)))?
                    .is_active = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn put_warehouse(
        &mut self,
        warehouse: &Address,
        registration_no: &str,
        location: &str,
        now: Timestamp,
    ) {
        let registered_at = self.warehouses.get(warehouse).map_or(now, |w| w.registered_at);
        self.warehouses.insert(
            warehouse.clone(),
            WarehouseInfo {
                registration_no: registration_no.to_string(),
                location: location.to_string(),
                is_active: true,
                registered_at,
            },
        );
    }

    fn put_bank(&mut self, bank: &Address, name: &str, license: &str, now: Timestamp) {
        let registered_at = self.banks.get(bank).map_or(now, |b| b.registered_at);
        self.banks.insert(
            bank.clone(),
            BankInfo {
                name: name.to_string(),
                license: license.to_string(),
                is_active: true,
                registered_at,
            },
        );
    }
}

impl RoleLookup for RoleDirectory {
    fn is_issuer_active(&self, account: &Address) -> bool {
        self.is_warehouse_active(account)
    }

    fn is_lender_active(&self, account: &Address) -> bool {
        self.is_bank_active(account)
    }
}

impl std::fmt::Debug for RoleDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleDirectory")
            .field("warehouses", &self.warehouses.len())
            .field("banks", &self.banks.len())
            .finish()
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}
