//! Inventory ledger domain module.
//!
//! This crate contains the quantity rules of the school inventory, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). Stores
//! load rows, run them through these types, and persist what comes back.

pub mod item;
pub mod ledger;
pub mod movement;
pub mod quantity;
pub mod staff;

pub use item::{InventoryItem, ItemPatch, NewItem, StockLevel};
pub use ledger::{IssueBalance, IssueRecord, IssueStatus, LedgerEntry};
pub use movement::{Movement, MovementKind};
pub use quantity::Quantity;
pub use staff::{NewStaff, StaffMember};
