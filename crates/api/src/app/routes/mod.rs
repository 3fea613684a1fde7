use axum::Router;

pub mod assign;
pub mod common;
pub mod inventory;
pub mod staff;
pub mod system;

/// Router for the ledger, catalogue and staff endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/assign_item", assign::router())
        .nest("/inventory_item", inventory::router())
        .nest("/staff", staff::router())
}
