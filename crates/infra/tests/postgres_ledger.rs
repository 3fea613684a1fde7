//! Postgres ledger store tests.
//!
//! These run against a real database and are skipped unless
//! `TEST_DATABASE_URL` is set. Every test creates its own items and staff and
//! only asserts on rows it owns, so they can share a database.

use std::sync::Arc;
use std::time::Duration;

use schoolhub_core::{DomainError, IssueRecordId, ItemId, StaffId};
use schoolhub_infra::{DatabaseConfig, LedgerError, LedgerStore, PostgresLedgerStore};
use schoolhub_inventory::{InventoryItem, MovementKind, NewItem, NewStaff, Quantity};
use tokio::sync::OnceCell;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

async fn store() -> Option<PostgresLedgerStore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url,
        max_connections: 8,
        lock_timeout: None,
        apply_schema: false,
    };
    let store = PostgresLedgerStore::connect(&config)
        .await
        .expect("connect to TEST_DATABASE_URL");
    SCHEMA
        .get_or_try_init(|| store.apply_schema())
        .await
        .expect("apply schema");
    Some(store)
}

fn qty(n: i64) -> Quantity {
    Quantity::new(n).unwrap()
}

async fn item(store: &PostgresLedgerStore, name: &str, total: i64) -> InventoryItem {
    store
        .create_item(NewItem {
            name: name.to_string(),
            category: Some("Lab".to_string()),
            description: None,
            total_quantity: total,
        })
        .await
        .unwrap()
}

async fn staff(store: &PostgresLedgerStore, name: &str) -> StaffId {
    store
        .register_staff(NewStaff {
            name: name.to_string(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn issue_then_return_round_trip() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Microscope", 5).await;
    let teacher = staff(&store, "Ms. Otieno").await;

    let record = store.issue_item(item.id, teacher, qty(2)).await.unwrap();
    assert_eq!(record.quantity_issued.get(), 2);
    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 3);

    let record = store.return_item(record.id, qty(2)).await.unwrap();
    assert_eq!(record.quantity_issued.get(), 0);
    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 5);

    let history = store.list_history().await.unwrap();
    assert!(history.iter().any(|e| e.record.id == record.id));
    let open = store.list_currently_issued().await.unwrap();
    assert!(open.iter().all(|e| e.record.id != record.id));
}

#[tokio::test]
async fn repeated_issues_accumulate_on_one_row() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Beaker", 10).await;
    let teacher = staff(&store, "Mr. Banda").await;

    let first = store.issue_item(item.id, teacher, qty(2)).await.unwrap();
    let second = store.issue_item(item.id, teacher, qty(3)).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity_issued.get(), 5);
    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 5);
}

#[tokio::test]
async fn rejected_issue_leaves_no_trace() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Tripod", 2).await;
    let teacher = staff(&store, "Mrs. Ade").await;

    let err = store.issue_item(item.id, teacher, qty(3)).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Domain(DomainError::InsufficientStock { requested: 3, available: 2 })
    ));

    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 2);
    assert!(store.list_item_movements(item.id).await.unwrap().is_empty());
    let open = store.list_currently_issued().await.unwrap();
    assert!(open.iter().all(|e| e.record.item_id != item.id));
}

#[tokio::test]
async fn over_return_is_rejected() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Globe", 4).await;
    let teacher = staff(&store, "Mr. Sato").await;
    let record = store.issue_item(item.id, teacher, qty(1)).await.unwrap();

    let err = store.return_item(record.id, qty(2)).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Domain(DomainError::OverReturn { requested: 2, issued: 1 })
    ));
    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 3);
}

#[tokio::test]
async fn missing_rows_are_not_found() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Kettle", 1).await;

    let err = store
        .issue_item(item.id, StaffId::new(i64::MAX), qty(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Domain(DomainError::NotFound(_))));

    let err = store
        .return_item(IssueRecordId::new(i64::MAX), qty(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Domain(DomainError::NotFound(_))));
}

#[tokio::test]
async fn total_cannot_drop_below_issued() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Laptop", 10).await;
    let teacher = staff(&store, "Ms. Kim").await;
    store.issue_item(item.id, teacher, qty(4)).await.unwrap();

    let err = store.update_item_total(item.id, 3).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Domain(DomainError::BelowIssued { requested_total: 3, issued: 4 })
    ));

    let updated = store.update_item_total(item.id, 6).await.unwrap();
    assert_eq!(updated.stock.total(), 6);
    assert_eq!(updated.stock.available(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issues_never_oversell() {
    let Some(store) = store().await else { return };
    let store = Arc::new(store);
    let item = item(&store, "Camera", 3).await;
    let a = staff(&store, "Teacher A").await;
    let b = staff(&store, "Teacher B").await;

    let handles: Vec<_> = [a, b]
        .into_iter()
        .map(|staff_id| {
            let store = store.clone();
            tokio::spawn(async move { store.issue_item(item.id, staff_id, qty(2)).await })
        })
        .collect();

    let mut ok = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(LedgerError::Domain(DomainError::InsufficientStock { .. })) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((ok, insufficient), (1, 1));
    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 1);
}

async fn assert_conserved(store: &PostgresLedgerStore, item_id: ItemId) {
    let item = store.get_item(item_id).await.unwrap();
    let issued: i64 = store
        .list_currently_issued()
        .await
        .unwrap()
        .iter()
        .filter(|e| e.record.item_id == item_id)
        .map(|e| e.record.quantity_issued.get())
        .sum();
    assert_eq!(item.stock.available() + issued, item.stock.total());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_returns_never_over_return() {
    let Some(store) = store().await else { return };
    let store = Arc::new(store);
    let item = item(&store, "Violin", 5).await;
    let teacher = staff(&store, "Ms. Petrova").await;
    let record = store.issue_item(item.id, teacher, qty(3)).await.unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.return_item(record.id, qty(2)).await })
        })
        .collect();

    let mut ok = 0;
    let mut over = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(LedgerError::Domain(DomainError::OverReturn { .. })) => over += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((ok, over), (1, 1));
    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 4);
    assert_conserved(&store, item.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_issues_and_returns_conserve_stock() {
    let Some(store) = store().await else { return };
    let store = Arc::new(store);
    let item = item(&store, "Flute", 20).await;
    let teacher = staff(&store, "Mr. Osei").await;
    let record = store.issue_item(item.id, teacher, qty(10)).await.unwrap();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    store.issue_item(item.id, teacher, qty(1)).await.map(|_| ())
                } else {
                    store.return_item(record.id, qty(1)).await.map(|_| ())
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 10);
    assert_conserved(&store, item.id).await;
    assert_eq!(store.list_item_movements(item.id).await.unwrap().len(), 21);
}

#[tokio::test]
async fn lock_timeout_fails_and_rolls_back() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Piano", 4).await;
    let teacher = staff(&store, "Mrs. Lund").await;

    // Hold the item row lock in another transaction.
    let mut holder = store.pool().begin().await.unwrap();
    sqlx::query("SELECT id FROM school_inventory WHERE id = $1 FOR UPDATE")
        .bind(item.id.get())
        .execute(&mut *holder)
        .await
        .unwrap();

    let impatient = store.clone().with_lock_timeout(Some(Duration::from_millis(50)));
    let err = impatient.issue_item(item.id, teacher, qty(1)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)), "got {err:?}");

    holder.rollback().await.unwrap();

    assert_eq!(store.get_item(item.id).await.unwrap().stock.available(), 4);
    assert!(store.list_item_movements(item.id).await.unwrap().is_empty());
    let open = store.list_currently_issued().await.unwrap();
    assert!(open.iter().all(|e| e.record.item_id != item.id));
}

#[tokio::test]
async fn movements_follow_every_change() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Easel", 8).await;
    let teacher = staff(&store, "Mr. Ruiz").await;

    let record = store.issue_item(item.id, teacher, qty(4)).await.unwrap();
    store.return_item(record.id, qty(1)).await.unwrap();
    store.update_item_total(item.id, 6).await.unwrap();

    let kinds: Vec<_> = store
        .list_item_movements(item.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.kind, m.quantity))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (MovementKind::Issued, 4),
            (MovementKind::Returned, 1),
            (MovementKind::TotalAdjusted, -2),
        ]
    );
}

#[tokio::test]
async fn delete_waits_for_returns() {
    let Some(store) = store().await else { return };
    let item = item(&store, "Drum", 2).await;
    let teacher = staff(&store, "Ms. Ali").await;
    let record = store.issue_item(item.id, teacher, qty(1)).await.unwrap();

    let err = store.delete_item(item.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Domain(DomainError::ItemInUse { issued: 1 })));

    store.return_item(record.id, qty(1)).await.unwrap();
    store.delete_item(item.id).await.unwrap();

    let err = store.get_item(item.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Domain(DomainError::NotFound(_))));
    let history = store.list_history().await.unwrap();
    assert!(history.iter().all(|e| e.record.id != record.id));
}
