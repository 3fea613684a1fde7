//! Append-only log of individual stock movements.
//!
//! Every successful issue, return and total adjustment appends exactly one
//! movement in the same transaction as the balance change it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::{DomainError, IssueRecordId, ItemId, MovementId, StaffId};

use crate::quantity::Quantity;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Issued,
    Returned,
    TotalAdjusted,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Issued => "issued",
            MovementKind::Returned => "returned",
            MovementKind::TotalAdjusted => "total_adjusted",
        }
    }
}

impl core::str::FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(MovementKind::Issued),
            "returned" => Ok(MovementKind::Returned),
            "total_adjusted" => Ok(MovementKind::TotalAdjusted),
            other => Err(DomainError::invalid_input(format!("unknown movement kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub movement_id: MovementId,
    pub item_id: ItemId,
    pub staff_id: Option<StaffId>,
    pub record_id: Option<IssueRecordId>,
    pub kind: MovementKind,
    /// Units moved; for `TotalAdjusted` the signed change of the total.
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    pub fn issued(
        item_id: ItemId,
        staff_id: StaffId,
        record_id: IssueRecordId,
        quantity: Quantity,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            movement_id: MovementId::new(),
            item_id,
            staff_id: Some(staff_id),
            record_id: Some(record_id),
            kind: MovementKind::Issued,
            quantity: quantity.get(),
            occurred_at,
        }
    }

    pub fn returned(
        item_id: ItemId,
        staff_id: StaffId,
        record_id: IssueRecordId,
        quantity: Quantity,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            movement_id: MovementId::new(),
            item_id,
            staff_id: Some(staff_id),
            record_id: Some(record_id),
            kind: MovementKind::Returned,
            quantity: quantity.get(),
            occurred_at,
        }
    }

    pub fn total_adjusted(item_id: ItemId, delta: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            movement_id: MovementId::new(),
            item_id,
            staff_id: None,
            record_id: None,
            kind: MovementKind::TotalAdjusted,
            quantity: delta,
            occurred_at,
        }
    }

    /// Append order: occurred_at, then the time-ordered movement id.
    pub fn log_order(a: &Movement, b: &Movement) -> core::cmp::Ordering {
        a.occurred_at
            .cmp(&b.occurred_at)
            .then_with(|| a.movement_id.cmp(&b.movement_id))
    }
}
