//! `schoolhub-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error taxonomy shared by every layer and the strongly-typed identifiers
//! of the inventory ledger.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{IssueRecordId, ItemId, MovementId, StaffId};
