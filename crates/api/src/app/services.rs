use std::sync::Arc;

use schoolhub_infra::{AppConfig, InMemoryLedgerStore, LedgerResult, LedgerStore, PostgresLedgerStore};

/// Shared state handed to every handler.
pub struct AppServices {
    ledger: Arc<dyn LedgerStore>,
    backend: &'static str,
}

impl AppServices {
    pub fn new(ledger: Arc<dyn LedgerStore>, backend: &'static str) -> Arc<Self> {
        Arc::new(Self { ledger, backend })
    }

    /// Services backed by a fresh in-memory store.
    pub fn in_memory() -> Arc<Self> {
        Self::new(Arc::new(InMemoryLedgerStore::new()), "in_memory")
    }

    /// Pick the store from configuration: Postgres when `DATABASE_URL` is
    /// set, otherwise in-memory.
    pub async fn from_config(config: &AppConfig) -> LedgerResult<Arc<Self>> {
        match &config.database {
            Some(db) => {
                let store = PostgresLedgerStore::connect(db).await?;
                tracing::info!(
                    max_connections = db.max_connections,
                    apply_schema = db.apply_schema,
                    "using postgres ledger store"
                );
                Ok(Self::new(Arc::new(store), "postgres"))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory ledger store (data is not persisted)");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn ledger(&self) -> &dyn LedgerStore {
        self.ledger.as_ref()
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}
