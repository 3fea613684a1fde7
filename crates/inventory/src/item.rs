use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::{DomainError, DomainResult, ItemId};

use crate::quantity::Quantity;

/// Stock counts of one item: `0 <= available <= total`.
///
/// `total - available` is the number of units currently issued to staff.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    total: i64,
    available: i64,
}

impl StockLevel {
    /// Rebuild a stock level from stored counts, rejecting rows that break the invariant.
    pub fn new(total: i64, available: i64) -> DomainResult<Self> {
        if total < 0 {
            return Err(DomainError::invalid_input(format!(
                "total_quantity must be non-negative, got {total}"
            )));
        }
        if available < 0 || available > total {
            return Err(DomainError::invalid_input(format!(
                "available_quantity {available} outside 0..={total}"
            )));
        }
        Ok(Self { total, available })
    }

    /// Stock level of a newly created item: nothing issued yet.
    pub fn fresh(total: i64) -> DomainResult<Self> {
        Self::new(total, total)
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn available(&self) -> i64 {
        self.available
    }

    pub fn issued(&self) -> i64 {
        self.total - self.available
    }

    /// Take `quantity` units out of stock.
    pub fn issue(self, quantity: Quantity) -> DomainResult<Self> {
        if quantity.get() > self.available {
            return Err(DomainError::InsufficientStock {
                requested: quantity.get(),
                available: self.available,
            });
        }
        Ok(Self {
            total: self.total,
            available: self.available - quantity.get(),
        })
    }

    /// Put `quantity` units back into stock.
    pub fn restock(self, quantity: Quantity) -> DomainResult<Self> {
        if quantity.get() > self.issued() {
            return Err(DomainError::OverReturn {
                requested: quantity.get(),
                issued: self.issued(),
            });
        }
        Ok(Self {
            total: self.total,
            available: self.available + quantity.get(),
        })
    }

    /// Change the owned total while keeping the issued count.
    pub fn retotal(self, new_total: i64) -> DomainResult<Self> {
        if new_total < 0 {
            return Err(DomainError::invalid_input(format!(
                "total_quantity must be non-negative, got {new_total}"
            )));
        }
        let issued = self.issued();
        if new_total < issued {
            return Err(DomainError::BelowIssued {
                requested_total: new_total,
                issued,
            });
        }
        Ok(Self {
            total: new_total,
            available: new_total - issued,
        })
    }
}

/// An inventory item as stored in `school_inventory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub stock: StockLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Apply a partial update, returning the new row and the signed change of
    /// the total (`None` when the total is untouched).
    pub fn apply_patch(
        &self,
        patch: &ItemPatch,
        now: DateTime<Utc>,
    ) -> DomainResult<(InventoryItem, Option<i64>)> {
        let mut next = self.clone();

        if let Some(name) = &patch.name {
            next.name = normalize_name(name)?;
        }
        if let Some(category) = &patch.category {
            next.category = normalize_optional(category);
        }
        if let Some(description) = &patch.description {
            next.description = normalize_optional(description);
        }

        let mut total_delta = None;
        if let Some(new_total) = patch.total_quantity {
            next.stock = self.stock.retotal(new_total)?;
            let delta = new_total - self.stock.total();
            if delta != 0 {
                total_delta = Some(delta);
            }
        }

        next.updated_at = now;
        Ok((next, total_delta))
    }

    /// Units that must come back before the item can be deleted.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        match self.stock.issued() {
            0 => Ok(()),
            issued => Err(DomainError::ItemInUse { issued }),
        }
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub total_quantity: i64,
}

impl NewItem {
    /// Trim text fields and check the initial stock.
    pub fn validate(self) -> DomainResult<(NewItem, StockLevel)> {
        let stock = StockLevel::fresh(self.total_quantity)?;
        let item = NewItem {
            name: normalize_name(&self.name)?,
            category: self.category.as_deref().and_then(normalize_optional),
            description: self.description.as_deref().and_then(normalize_optional),
            total_quantity: self.total_quantity,
        };
        Ok((item, stock))
    }
}

/// Partial update of an item. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub total_quantity: Option<i64>,
}

impl ItemPatch {
    pub fn total_only(total_quantity: i64) -> Self {
        Self {
            total_quantity: Some(total_quantity),
            ..Self::default()
        }
    }
}

pub(crate) fn normalize_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_input("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
