//! Infrastructure layer: store implementations, schema, configuration.

pub mod config;
pub mod ledger_store;

pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use ledger_store::{
    InMemoryLedgerStore, LedgerError, LedgerResult, LedgerStore, PostgresLedgerStore,
};
