//! Postgres-backed ledger store.
//!
//! Each mutation is one `sqlx` transaction. Rows being changed are locked with
//! `SELECT ... FOR UPDATE` before they are read, so the quantity checks run
//! against values no concurrent transaction can change until commit.
//!
//! ## Rollback
//!
//! Business-rule rejections roll the transaction back explicitly before the
//! error is returned. Any other early return (a `?` on a failed statement, a
//! dropped future when the caller goes away) drops the `Transaction`, which
//! rolls it back and releases its locks.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | LedgerError |
//! |------------|----------------------|-------------|
//! | Database (check constraint violation) | `23514` | `Domain(InvalidInput)` |
//! | Database (foreign key violation) | `23503` | `Domain(NotFound)` |
//! | Database (lock not available) | `55P03` | `Store` (lock timeout) |
//! | Database (other) | Any other | `Store` |
//! | PoolTimedOut / PoolClosed / Io / other | N/A | `Store` |

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};

use schoolhub_core::{DomainError, IssueRecordId, ItemId, MovementId, StaffId};
use schoolhub_inventory::{
    InventoryItem, IssueBalance, IssueRecord, ItemPatch, LedgerEntry, Movement, MovementKind,
    NewItem, NewStaff, Quantity, StaffMember, StockLevel,
};

use super::{
    LedgerError, LedgerResult, LedgerStore, item_not_found, record_not_found, staff_not_found,
};
use crate::config::DatabaseConfig;

/// Idempotent DDL for every table the ledger uses.
pub const SCHEMA: &str = include_str!("../../schema/0001_inventory_ledger.sql");

type Tx<'c> = Transaction<'c, Postgres>;

/// Postgres-backed ledger store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is `Send + Sync` and cheap to clone.
///
/// ## Lock Timeout
///
/// When configured, every transaction starts with `SET LOCAL lock_timeout`, so
/// a call blocked on a row lock gives up (and rolls back) instead of waiting
/// indefinitely.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
    lock_timeout: Option<Duration>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Connect a pool from configuration and optionally apply the schema.
    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &DatabaseConfig) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool).with_lock_timeout(config.lock_timeout);
        if config.apply_schema {
            store.apply_schema().await?;
        }
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the ledger tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn apply_schema(&self) -> LedgerResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_schema", e))?;
        tracing::info!("ledger schema applied");
        Ok(())
    }

    async fn begin(&self, operation: &'static str) -> LedgerResult<Tx<'static>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        if let Some(timeout) = self.lock_timeout {
            // SET does not take bind parameters; the value is an integer we format ourselves.
            let stmt = format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis());
            sqlx::query(&stmt)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(operation, e))?;
        }
        Ok(tx)
    }
}

/// Roll back and surface a business-rule rejection.
async fn reject<T>(tx: Tx<'_>, operation: &'static str, err: DomainError) -> LedgerResult<T> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))?;
    tracing::warn!(operation, error = %err, "ledger operation rejected");
    Err(err.into())
}

async fn commit(tx: Tx<'_>, operation: &'static str) -> LedgerResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error(operation, e))
}

async fn lock_item(tx: &mut Tx<'_>, item_id: ItemId) -> LedgerResult<Option<InventoryItem>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, category, description, total_quantity, available_quantity,
               created_at, updated_at
        FROM school_inventory
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(item_id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_item", e))?;

    row.map(|r| ItemRow::from_row(&r).map_err(|e| map_sqlx_error("lock_item", e))?.into_domain())
        .transpose()
}

async fn lock_record(tx: &mut Tx<'_>, record_id: IssueRecordId) -> LedgerResult<Option<IssueRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, item_id, staff_id, quantity_issued, created_at, updated_at
        FROM inventory_transactions
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(record_id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_record", e))?;

    row.map(|r| RecordRow::from_row(&r).map_err(|e| map_sqlx_error("lock_record", e))?.into_domain())
        .transpose()
}

async fn staff_exists(tx: &mut Tx<'_>, staff_id: StaffId) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM staff WHERE id = $1) AS present")
        .bind(staff_id.get())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("staff_exists", e))?;
    row.try_get("present")
        .map_err(|e| map_sqlx_error("staff_exists", e))
}

async fn write_stock(tx: &mut Tx<'_>, item_id: ItemId, stock: StockLevel) -> LedgerResult<()> {
    sqlx::query(
        r#"
        UPDATE school_inventory
        SET total_quantity = $2,
            available_quantity = $3,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(item_id.get())
    .bind(stock.total())
    .bind(stock.available())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("write_stock", e))?;
    Ok(())
}

async fn append_movement(tx: &mut Tx<'_>, movement: &Movement) -> LedgerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_movements (
            movement_id, item_id, staff_id, record_id, kind, quantity, occurred_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(movement.movement_id.as_uuid())
    .bind(movement.item_id.get())
    .bind(movement.staff_id.map(StaffId::get))
    .bind(movement.record_id.map(IssueRecordId::get))
    .bind(movement.kind.as_str())
    .bind(movement.quantity)
    .bind(movement.occurred_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("append_movement", e))?;
    Ok(())
}

const ENTRY_SELECT: &str = r#"
    SELECT t.id, t.item_id, t.staff_id, t.quantity_issued, t.created_at, t.updated_at,
           i.name AS item_name, s.name AS staff_name
    FROM inventory_transactions t
    JOIN school_inventory i ON i.id = t.item_id
    JOIN staff s ON s.id = t.staff_id
"#;

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, staff), err)]
    async fn register_staff(&self, staff: NewStaff) -> LedgerResult<StaffMember> {
        let staff = staff.validate()?;
        let row = sqlx::query(
            r#"
            INSERT INTO staff (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&staff.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("register_staff", e))?;

        let member = StaffRow::from_row(&row)
            .map_err(|e| map_sqlx_error("register_staff", e))?
            .into_domain();
        tracing::info!(staff_id = %member.id, "staff member registered");
        Ok(member)
    }

    #[instrument(skip(self), err)]
    async fn list_staff(&self) -> LedgerResult<Vec<StaffMember>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM staff ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_staff", e))?;

        rows.iter()
            .map(|r| {
                StaffRow::from_row(r)
                    .map(StaffRow::into_domain)
                    .map_err(|e| map_sqlx_error("list_staff", e))
            })
            .collect()
    }

    #[instrument(skip(self), fields(staff_id = %staff_id), err)]
    async fn get_staff(&self, staff_id: StaffId) -> LedgerResult<StaffMember> {
        let row = sqlx::query("SELECT id, name, created_at FROM staff WHERE id = $1")
            .bind(staff_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_staff", e))?
            .ok_or_else(|| LedgerError::from(staff_not_found(staff_id)))?;

        StaffRow::from_row(&row)
            .map(StaffRow::into_domain)
            .map_err(|e| map_sqlx_error("get_staff", e))
    }

    #[instrument(skip(self, item), err)]
    async fn create_item(&self, item: NewItem) -> LedgerResult<InventoryItem> {
        let (item, stock) = item.validate()?;
        let row = sqlx::query(
            r#"
            INSERT INTO school_inventory (
                name, category, description, total_quantity, available_quantity
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, category, description, total_quantity, available_quantity,
                      created_at, updated_at
            "#,
        )
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.description)
        .bind(stock.total())
        .bind(stock.available())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        let created = ItemRow::from_row(&row)
            .map_err(|e| map_sqlx_error("create_item", e))?
            .into_domain()?;
        tracing::info!(item_id = %created.id, total = stock.total(), "inventory item created");
        Ok(created)
    }

    #[instrument(skip(self), err)]
    async fn list_items(&self) -> LedgerResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category, description, total_quantity, available_quantity,
                   created_at, updated_at
            FROM school_inventory
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter()
            .map(|r| {
                ItemRow::from_row(r)
                    .map_err(|e| map_sqlx_error("list_items", e))?
                    .into_domain()
            })
            .collect()
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn get_item(&self, item_id: ItemId) -> LedgerResult<InventoryItem> {
        let row = sqlx::query(
            r#"
            SELECT id, name, category, description, total_quantity, available_quantity,
                   created_at, updated_at
            FROM school_inventory
            WHERE id = $1
            "#,
        )
        .bind(item_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_item", e))?
        .ok_or_else(|| LedgerError::from(item_not_found(item_id)))?;

        ItemRow::from_row(&row)
            .map_err(|e| map_sqlx_error("get_item", e))?
            .into_domain()
    }

    #[instrument(skip(self, patch), fields(item_id = %item_id), err)]
    async fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> LedgerResult<InventoryItem> {
        const OP: &str = "update_item";
        let mut tx = self.begin(OP).await?;

        let Some(current) = lock_item(&mut tx, item_id).await? else {
            return reject(tx, OP, item_not_found(item_id)).await;
        };

        let now = Utc::now();
        let (updated, total_delta) = match current.apply_patch(&patch, now) {
            Ok(v) => v,
            Err(e) => return reject(tx, OP, e).await,
        };

        let row = sqlx::query(
            r#"
            UPDATE school_inventory
            SET name = $2,
                category = $3,
                description = $4,
                total_quantity = $5,
                available_quantity = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, category, description, total_quantity, available_quantity,
                      created_at, updated_at
            "#,
        )
        .bind(item_id.get())
        .bind(&updated.name)
        .bind(&updated.category)
        .bind(&updated.description)
        .bind(updated.stock.total())
        .bind(updated.stock.available())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;

        if let Some(delta) = total_delta {
            append_movement(&mut tx, &Movement::total_adjusted(item_id, delta, now)).await?;
        }

        let stored = ItemRow::from_row(&row)
            .map_err(|e| map_sqlx_error(OP, e))?
            .into_domain()?;
        commit(tx, OP).await?;

        tracing::info!(
            total = stored.stock.total(),
            available = stored.stock.available(),
            "inventory item updated"
        );
        Ok(stored)
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn delete_item(&self, item_id: ItemId) -> LedgerResult<()> {
        const OP: &str = "delete_item";
        let mut tx = self.begin(OP).await?;

        let Some(current) = lock_item(&mut tx, item_id).await? else {
            return reject(tx, OP, item_not_found(item_id)).await;
        };
        if let Err(e) = current.ensure_deletable() {
            return reject(tx, OP, e).await;
        }

        sqlx::query("DELETE FROM school_inventory WHERE id = $1")
            .bind(item_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(OP, e))?;
        commit(tx, OP).await?;

        tracing::info!("inventory item deleted");
        Ok(())
    }

    #[instrument(
        skip(self),
        fields(
            item_id = %item_id,
            staff_id = %staff_id,
            quantity = quantity.get(),
            record_id = tracing::field::Empty
        ),
        err
    )]
    async fn issue_item(
        &self,
        item_id: ItemId,
        staff_id: StaffId,
        quantity: Quantity,
    ) -> LedgerResult<IssueRecord> {
        const OP: &str = "issue_item";
        let mut tx = self.begin(OP).await?;

        // 1) Lock the stock row; concurrent issues of this item queue here.
        let Some(item) = lock_item(&mut tx, item_id).await? else {
            return reject(tx, OP, item_not_found(item_id)).await;
        };
        if !staff_exists(&mut tx, staff_id).await? {
            return reject(tx, OP, staff_not_found(staff_id)).await;
        }

        // 2) Check and decrement against the locked counts.
        let stock = match item.stock.issue(quantity) {
            Ok(s) => s,
            Err(e) => return reject(tx, OP, e).await,
        };
        write_stock(&mut tx, item_id, stock).await?;

        // 3) Upsert the running balance for the (item, staff) pair.
        let row = sqlx::query(
            r#"
            INSERT INTO inventory_transactions (item_id, staff_id, quantity_issued)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, staff_id)
            DO UPDATE SET
                quantity_issued = inventory_transactions.quantity_issued + EXCLUDED.quantity_issued,
                updated_at = NOW()
            RETURNING id, item_id, staff_id, quantity_issued, created_at, updated_at
            "#,
        )
        .bind(item_id.get())
        .bind(staff_id.get())
        .bind(quantity.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
        let record = RecordRow::from_row(&row)
            .map_err(|e| map_sqlx_error(OP, e))?
            .into_domain()?;

        // 4) Audit entry, then commit everything at once.
        append_movement(
            &mut tx,
            &Movement::issued(item_id, staff_id, record.id, quantity, Utc::now()),
        )
        .await?;
        commit(tx, OP).await?;

        Span::current().record("record_id", record.id.get());
        tracing::info!(
            available = stock.available(),
            quantity_issued = record.quantity_issued.get(),
            "item issued"
        );
        Ok(record)
    }

    #[instrument(skip(self), fields(record_id = %record_id, quantity = quantity.get()), err)]
    async fn return_item(&self, record_id: IssueRecordId, quantity: Quantity) -> LedgerResult<IssueRecord> {
        const OP: &str = "return_item";
        let mut tx = self.begin(OP).await?;

        // The pair behind a ledger row never changes, so its item can be read
        // unlocked and locked first, keeping the item -> ledger row order.
        let item_id: Option<i64> =
            sqlx::query_scalar("SELECT item_id FROM inventory_transactions WHERE id = $1")
                .bind(record_id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(OP, e))?;
        let Some(item_id) = item_id.map(ItemId::new) else {
            return reject(tx, OP, record_not_found(record_id)).await;
        };

        let Some(item) = lock_item(&mut tx, item_id).await? else {
            return reject(tx, OP, record_not_found(record_id)).await;
        };
        let Some(record) = lock_record(&mut tx, record_id).await? else {
            return reject(tx, OP, record_not_found(record_id)).await;
        };

        let balance = match record.quantity_issued.take_back(quantity) {
            Ok(b) => b,
            Err(e) => return reject(tx, OP, e).await,
        };
        let stock = match item.stock.restock(quantity) {
            Ok(s) => s,
            Err(e) => return reject(tx, OP, e).await,
        };

        let row = sqlx::query(
            r#"
            UPDATE inventory_transactions
            SET quantity_issued = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, item_id, staff_id, quantity_issued, created_at, updated_at
            "#,
        )
        .bind(record_id.get())
        .bind(balance.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
        let updated = RecordRow::from_row(&row)
            .map_err(|e| map_sqlx_error(OP, e))?
            .into_domain()?;

        write_stock(&mut tx, item_id, stock).await?;
        append_movement(
            &mut tx,
            &Movement::returned(item_id, updated.staff_id, record_id, quantity, Utc::now()),
        )
        .await?;
        commit(tx, OP).await?;

        tracing::info!(
            item_id = %item_id,
            available = stock.available(),
            quantity_issued = updated.quantity_issued.get(),
            "item returned"
        );
        Ok(updated)
    }

    #[instrument(skip(self), err)]
    async fn list_currently_issued(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let sql = format!(
            "{ENTRY_SELECT} WHERE t.quantity_issued > 0 ORDER BY i.name, s.name, t.id"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_currently_issued", e))?;
        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_history(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let sql = format!(
            "{ENTRY_SELECT} WHERE t.quantity_issued = 0 ORDER BY t.updated_at DESC, t.id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_history", e))?;
        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn list_item_movements(&self, item_id: ItemId) -> LedgerResult<Vec<Movement>> {
        // Existence check first so an unknown item is NotFound, not an empty log.
        self.get_item(item_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT movement_id, item_id, staff_id, record_id, kind, quantity, occurred_at
            FROM inventory_movements
            WHERE item_id = $1
            ORDER BY occurred_at ASC, movement_id ASC
            "#,
        )
        .bind(item_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_item_movements", e))?;

        rows.iter()
            .map(|r| {
                MovementRow::from_row(r)
                    .map_err(|e| map_sqlx_error("list_item_movements", e))?
                    .into_domain()
            })
            .collect()
    }
}

/// Map SQLx errors to LedgerError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // Check constraint violation
                Some("23514") => DomainError::invalid_input(msg).into(),
                // Foreign key violation
                Some("23503") => DomainError::not_found(msg).into(),
                // lock_timeout expired
                Some("55P03") => LedgerError::store(format!("lock timeout in {operation}")),
                _ => LedgerError::store(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            LedgerError::store(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            LedgerError::store(format!("connection pool closed in {operation}"))
        }
        _ => LedgerError::store(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct ItemRow {
    id: i64,
    name: String,
    category: Option<String>,
    description: Option<String>,
    total_quantity: i64,
    available_quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            total_quantity: row.try_get("total_quantity")?,
            available_quantity: row.try_get("available_quantity")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl ItemRow {
    fn into_domain(self) -> LedgerResult<InventoryItem> {
        let stock = StockLevel::new(self.total_quantity, self.available_quantity)
            .map_err(|e| LedgerError::store(format!("corrupt stock row {}: {e}", self.id)))?;
        Ok(InventoryItem {
            id: ItemId::new(self.id),
            name: self.name,
            category: self.category,
            description: self.description,
            stock,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug)]
struct RecordRow {
    id: i64,
    item_id: i64,
    staff_id: i64,
    quantity_issued: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for RecordRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RecordRow {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            staff_id: row.try_get("staff_id")?,
            quantity_issued: row.try_get("quantity_issued")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl RecordRow {
    fn into_domain(self) -> LedgerResult<IssueRecord> {
        let quantity_issued = IssueBalance::new(self.quantity_issued)
            .map_err(|e| LedgerError::store(format!("corrupt ledger row {}: {e}", self.id)))?;
        Ok(IssueRecord {
            id: IssueRecordId::new(self.id),
            item_id: ItemId::new(self.item_id),
            staff_id: StaffId::new(self.staff_id),
            quantity_issued,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug)]
struct StaffRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for StaffRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StaffRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl StaffRow {
    fn into_domain(self) -> StaffMember {
        StaffMember {
            id: StaffId::new(self.id),
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug)]
struct MovementRow {
    movement_id: uuid::Uuid,
    item_id: i64,
    staff_id: Option<i64>,
    record_id: Option<i64>,
    kind: String,
    quantity: i64,
    occurred_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for MovementRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            movement_id: row.try_get("movement_id")?,
            item_id: row.try_get("item_id")?,
            staff_id: row.try_get("staff_id")?,
            record_id: row.try_get("record_id")?,
            kind: row.try_get("kind")?,
            quantity: row.try_get("quantity")?,
            occurred_at: row.try_get("occurred_at")?,
        })
    }
}

impl MovementRow {
    fn into_domain(self) -> LedgerResult<Movement> {
        let kind: MovementKind = self
            .kind
            .parse()
            .map_err(|e| LedgerError::store(format!("corrupt movement row: {e}")))?;
        Ok(Movement {
            movement_id: MovementId::from_uuid(self.movement_id),
            item_id: ItemId::new(self.item_id),
            staff_id: self.staff_id.map(StaffId::new),
            record_id: self.record_id.map(IssueRecordId::new),
            kind,
            quantity: self.quantity,
            occurred_at: self.occurred_at,
        })
    }
}

fn entry_from_row(row: &PgRow) -> LedgerResult<LedgerEntry> {
    let record = RecordRow::from_row(row)
        .map_err(|e| map_sqlx_error("ledger_entry", e))?
        .into_domain()?;
    let item_name: String = row
        .try_get("item_name")
        .map_err(|e| map_sqlx_error("ledger_entry", e))?;
    let staff_name: String = row
        .try_get("staff_name")
        .map_err(|e| map_sqlx_error("ledger_entry", e))?;
    Ok(LedgerEntry {
        record,
        item_name,
        staff_name,
    })
}
