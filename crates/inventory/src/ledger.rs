//! Per-(item, staff member) running issue balances.
//!
//! A ledger row is a mutable balance, not an event: issuing to a pair that
//! already has a row adds to it, returning subtracts from it, and a row that
//! reaches zero stays behind as history. Individual sub-events are kept by
//! the movement log (`crate::movement`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::{DomainError, DomainResult, IssueRecordId, ItemId, StaffId};

use crate::quantity::Quantity;

/// Lifecycle state of a ledger row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Units are currently checked out (`quantity_issued > 0`).
    Issued,
    /// Everything came back (`quantity_issued == 0`).
    Closed,
}

/// Units currently checked out on one ledger row (never negative).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueBalance(i64);

impl IssueBalance {
    pub const ZERO: IssueBalance = IssueBalance(0);

    pub fn new(raw: i64) -> DomainResult<Self> {
        if raw < 0 {
            return Err(DomainError::invalid_input(format!(
                "quantity_issued must be non-negative, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Upsert semantics: a missing row behaves like a zero balance.
    pub fn add(self, quantity: Quantity) -> Self {
        Self(self.0 + quantity.get())
    }

    pub fn take_back(self, quantity: Quantity) -> DomainResult<Self> {
        if quantity.get() > self.0 {
            return Err(DomainError::OverReturn {
                requested: quantity.get(),
                issued: self.0,
            });
        }
        Ok(Self(self.0 - quantity.get()))
    }

    pub fn status(self) -> IssueStatus {
        if self.0 > 0 {
            IssueStatus::Issued
        } else {
            IssueStatus::Closed
        }
    }
}

/// A ledger row as stored in `inventory_transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: IssueRecordId,
    pub item_id: ItemId,
    pub staff_id: StaffId,
    pub quantity_issued: IssueBalance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IssueRecord {
    pub fn status(&self) -> IssueStatus {
        self.quantity_issued.status()
    }
}

/// A ledger row joined with the display names of its item and staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub record: IssueRecord,
    pub item_name: String,
    pub staff_name: String,
}

impl LedgerEntry {
    /// Order of the currently-issued view: item name, then staff name, then id.
    pub fn issued_order(a: &LedgerEntry, b: &LedgerEntry) -> core::cmp::Ordering {
        a.item_name
            .cmp(&b.item_name)
            .then_with(|| a.staff_name.cmp(&b.staff_name))
            .then_with(|| a.record.id.cmp(&b.record.id))
    }

    /// Order of the history view: most recently updated first, then id descending.
    pub fn history_order(a: &LedgerEntry, b: &LedgerEntry) -> core::cmp::Ordering {
        b.record
            .updated_at
            .cmp(&a.record.updated_at)
            .then_with(|| b.record.id.cmp(&a.record.id))
    }
}
