use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use schoolhub_core::{IssueRecordId, ItemId, StaffId};
use schoolhub_inventory::{
    InventoryItem, IssueBalance, IssueRecord, IssueStatus, ItemPatch, LedgerEntry, Movement,
    NewItem, NewStaff, Quantity, StaffMember,
};

use super::{
    LedgerError, LedgerResult, LedgerStore, item_not_found, record_not_found, staff_not_found,
};

#[derive(Debug, Default)]
struct LedgerState {
    next_item_id: i64,
    next_staff_id: i64,
    next_record_id: i64,
    items: BTreeMap<ItemId, InventoryItem>,
    staff: BTreeMap<StaffId, StaffMember>,
    records: BTreeMap<IssueRecordId, IssueRecord>,
    by_pair: HashMap<(ItemId, StaffId), IssueRecordId>,
    movements: Vec<Movement>,
}

impl LedgerState {
    fn item(&self, item_id: ItemId) -> LedgerResult<&InventoryItem> {
        self.items
            .get(&item_id)
            .ok_or_else(|| item_not_found(item_id).into())
    }

    fn entries(&self, status: IssueStatus) -> Vec<LedgerEntry> {
        self.records
            .values()
            .filter(|r| r.status() == status)
            .filter_map(|r| {
                let item = self.items.get(&r.item_id)?;
                let staff = self.staff.get(&r.staff_id)?;
                Some(LedgerEntry {
                    record: r.clone(),
                    item_name: item.name.clone(),
                    staff_name: staff.name.clone(),
                })
            })
            .collect()
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Each call runs inside a single write-lock critical
/// section with no await points, and validates everything before its first
/// write, so a rejected call leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::store("lock poisoned"))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::store("lock poisoned"))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn register_staff(&self, staff: NewStaff) -> LedgerResult<StaffMember> {
        let staff = staff.validate()?;
        let mut state = self.write()?;

        state.next_staff_id += 1;
        let member = StaffMember {
            id: StaffId::new(state.next_staff_id),
            name: staff.name,
            created_at: Utc::now(),
        };
        state.staff.insert(member.id, member.clone());
        Ok(member)
    }

    async fn list_staff(&self) -> LedgerResult<Vec<StaffMember>> {
        let state = self.read()?;
        let mut all: Vec<_> = state.staff.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn get_staff(&self, staff_id: StaffId) -> LedgerResult<StaffMember> {
        let state = self.read()?;
        state
            .staff
            .get(&staff_id)
            .cloned()
            .ok_or_else(|| staff_not_found(staff_id).into())
    }

    async fn create_item(&self, item: NewItem) -> LedgerResult<InventoryItem> {
        let (item, stock) = item.validate()?;
        let mut state = self.write()?;

        state.next_item_id += 1;
        let now = Utc::now();
        let created = InventoryItem {
            id: ItemId::new(state.next_item_id),
            name: item.name,
            category: item.category,
            description: item.description,
            stock,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_items(&self) -> LedgerResult<Vec<InventoryItem>> {
        let state = self.read()?;
        let mut all: Vec<_> = state.items.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn get_item(&self, item_id: ItemId) -> LedgerResult<InventoryItem> {
        let state = self.read()?;
        state.item(item_id).cloned()
    }

    async fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> LedgerResult<InventoryItem> {
        let mut state = self.write()?;
        let now = Utc::now();

        let (updated, total_delta) = state.item(item_id)?.apply_patch(&patch, now)?;

        state.items.insert(item_id, updated.clone());
        if let Some(delta) = total_delta {
            state
                .movements
                .push(Movement::total_adjusted(item_id, delta, now));
        }
        Ok(updated)
    }

    async fn delete_item(&self, item_id: ItemId) -> LedgerResult<()> {
        let mut state = self.write()?;
        state.item(item_id)?.ensure_deletable()?;

        state.items.remove(&item_id);
        state.records.retain(|_, r| r.item_id != item_id);
        state.by_pair.retain(|(item, _), _| *item != item_id);
        state.movements.retain(|m| m.item_id != item_id);
        Ok(())
    }

    async fn issue_item(
        &self,
        item_id: ItemId,
        staff_id: StaffId,
        quantity: Quantity,
    ) -> LedgerResult<IssueRecord> {
        let mut state = self.write()?;
        let now = Utc::now();

        let item = state.item(item_id)?;
        if !state.staff.contains_key(&staff_id) {
            return Err(staff_not_found(staff_id).into());
        }
        let stock = item.stock.issue(quantity)?;

        let existing_id = state.by_pair.get(&(item_id, staff_id)).copied();
        let record = match existing_id {
            Some(record_id) => {
                let existing = state
                    .records
                    .get(&record_id)
                    .ok_or_else(|| LedgerError::store(format!("dangling pair index for record {record_id}")))?;
                IssueRecord {
                    quantity_issued: existing.quantity_issued.add(quantity),
                    updated_at: now,
                    ..existing.clone()
                }
            }
            None => {
                state.next_record_id += 1;
                IssueRecord {
                    id: IssueRecordId::new(state.next_record_id),
                    item_id,
                    staff_id,
                    quantity_issued: IssueBalance::ZERO.add(quantity),
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        if let Some(item) = state.items.get_mut(&item_id) {
            item.stock = stock;
            item.updated_at = now;
        }
        state.by_pair.insert((item_id, staff_id), record.id);
        state.records.insert(record.id, record.clone());
        state
            .movements
            .push(Movement::issued(item_id, staff_id, record.id, quantity, now));
        Ok(record)
    }

    async fn return_item(&self, record_id: IssueRecordId, quantity: Quantity) -> LedgerResult<IssueRecord> {
        let mut state = self.write()?;
        let now = Utc::now();

        let existing = state
            .records
            .get(&record_id)
            .ok_or_else(|| LedgerError::from(record_not_found(record_id)))?;
        let balance = existing.quantity_issued.take_back(quantity)?;
        let stock = state.item(existing.item_id)?.stock.restock(quantity)?;

        let record = IssueRecord {
            quantity_issued: balance,
            updated_at: now,
            ..existing.clone()
        };

        if let Some(item) = state.items.get_mut(&record.item_id) {
            item.stock = stock;
            item.updated_at = now;
        }
        state.records.insert(record.id, record.clone());
        state.movements.push(Movement::returned(
            record.item_id,
            record.staff_id,
            record.id,
            quantity,
            now,
        ));
        Ok(record)
    }

    async fn list_currently_issued(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let state = self.read()?;
        let mut entries = state.entries(IssueStatus::Issued);
        entries.sort_by(LedgerEntry::issued_order);
        Ok(entries)
    }

    async fn list_history(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let state = self.read()?;
        let mut entries = state.entries(IssueStatus::Closed);
        entries.sort_by(LedgerEntry::history_order);
        Ok(entries)
    }

    async fn list_item_movements(&self, item_id: ItemId) -> LedgerResult<Vec<Movement>> {
        let state = self.read()?;
        state.item(item_id)?;
        let mut movements: Vec<_> = state
            .movements
            .iter()
            .filter(|m| m.item_id == item_id)
            .cloned()
            .collect();
        movements.sort_by(Movement::log_order);
        Ok(movements)
    }
}
