//! Inventory ledger store boundary.
//!
//! `LedgerStore` is the only place stock counts and issue balances change.
//! Every mutating method is one atomic unit: either all of its writes (stock
//! row, ledger row, movement log entry) become visible together, or none do.
//!
//! ## Implementations
//!
//! - `PostgresLedgerStore`: `sqlx` transactions with `SELECT ... FOR UPDATE`
//!   row locks. Concurrent calls on the same item (or ledger row) serialize
//!   on that row; unrelated rows proceed in parallel.
//! - `InMemoryLedgerStore`: one critical section per call. Intended for
//!   tests/dev.
//!
//! ## Lock order
//!
//! Mutations that touch both an item row and a ledger row lock the item row
//! first. `return_item` resolves the ledger row's item without locking (the
//! pair a ledger row belongs to never changes) so it can follow the same order.

use async_trait::async_trait;
use thiserror::Error;

use schoolhub_core::{DomainError, IssueRecordId, ItemId, StaffId};
use schoolhub_inventory::{
    InventoryItem, IssueRecord, ItemPatch, LedgerEntry, Movement, NewItem, NewStaff, Quantity,
    StaffMember,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;

/// Ledger operation error.
///
/// Business-rule rejections keep their typed `DomainError`; anything that
/// went wrong in the store itself (connection, lock timeout, corrupt row) is
/// a `Store` failure. In both cases the operation's transaction has been
/// rolled back by the time the error is returned.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store failure: {0}")]
    Store(String),
}

impl LedgerError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Transactional store for items, staff, issue balances and movements.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // Staff directory

    async fn register_staff(&self, staff: NewStaff) -> LedgerResult<StaffMember>;

    async fn list_staff(&self) -> LedgerResult<Vec<StaffMember>>;

    async fn get_staff(&self, staff_id: StaffId) -> LedgerResult<StaffMember>;

    // Item catalogue

    /// Create an item with `available_quantity = total_quantity`.
    async fn create_item(&self, item: NewItem) -> LedgerResult<InventoryItem>;

    /// All items ordered by name, then id.
    async fn list_items(&self) -> LedgerResult<Vec<InventoryItem>>;

    async fn get_item(&self, item_id: ItemId) -> LedgerResult<InventoryItem>;

    /// Apply a partial update with the item row locked. A total change keeps
    /// the issued count and fails with `BelowIssued` if it would go under it.
    async fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> LedgerResult<InventoryItem>;

    /// Change only the owned total of an item.
    async fn update_item_total(&self, item_id: ItemId, new_total: i64) -> LedgerResult<InventoryItem> {
        self.update_item(item_id, ItemPatch::total_only(new_total)).await
    }

    /// Delete an item. Fails with `ItemInUse` while any unit is issued;
    /// otherwise its closed ledger rows and movements go with it.
    async fn delete_item(&self, item_id: ItemId) -> LedgerResult<()>;

    // Ledger

    /// Take `quantity` units of an item out of stock and add them to the
    /// (item, staff) running balance, creating the row on first issue.
    async fn issue_item(
        &self,
        item_id: ItemId,
        staff_id: StaffId,
        quantity: Quantity,
    ) -> LedgerResult<IssueRecord>;

    /// Give `quantity` units of a ledger row back to stock.
    async fn return_item(&self, record_id: IssueRecordId, quantity: Quantity) -> LedgerResult<IssueRecord>;

    /// Ledger rows with `quantity_issued > 0`, ordered by item name.
    async fn list_currently_issued(&self) -> LedgerResult<Vec<LedgerEntry>>;

    /// Ledger rows with `quantity_issued == 0`, most recently updated first.
    async fn list_history(&self) -> LedgerResult<Vec<LedgerEntry>>;

    /// Movement log of one item in append order.
    async fn list_item_movements(&self, item_id: ItemId) -> LedgerResult<Vec<Movement>>;
}

pub(crate) fn item_not_found(item_id: ItemId) -> DomainError {
    DomainError::not_found(format!("inventory item {item_id}"))
}

pub(crate) fn staff_not_found(staff_id: StaffId) -> DomainError {
    DomainError::not_found(format!("staff member {staff_id}"))
}

pub(crate) fn record_not_found(record_id: IssueRecordId) -> DomainError {
    DomainError::not_found(format!("issue record {record_id}"))
}
