//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// quantity rules, missing references). Storage failures belong to the
/// infrastructure layer, which wraps this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing identifier, non-positive quantity, blank name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced item, staff member or ledger row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// An issue asked for more units than are on hand.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// A return asked for more units than the ledger row holds.
    #[error("return exceeds issued quantity: requested {requested}, issued {issued}")]
    OverReturn { requested: i64, issued: i64 },

    /// A total-quantity edit would drop below the units currently issued.
    #[error("total quantity {requested_total} is below the {issued} units currently issued")]
    BelowIssued { requested_total: i64, issued: i64 },

    /// An item cannot be deleted while units are still issued.
    #[error("item still has {issued} units issued")]
    ItemInUse { issued: i64 },
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable machine-readable code, used as the `error` field of API responses.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidInput(_) => "invalid_input",
            DomainError::NotFound(_) => "not_found",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::OverReturn { .. } => "over_return",
            DomainError::BelowIssued { .. } => "below_issued",
            DomainError::ItemInUse { .. } => "item_in_use",
        }
    }
}
