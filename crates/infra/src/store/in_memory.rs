//! In-memory document store for tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use outpost_auth::UserRecord;
use outpost_board::{MapMarker, TrainRoute};
use outpost_inventory::{InventoryItem, ProtocolLogEntry, StockAdjustment, StockChange};

use super::{Collection, Document, ListOrder, Mutation, StockLedger, StoreError, UserStore};

#[derive(Debug)]
struct Row<D> {
    /// Insertion sequence; breaks `created_at` ties in listings.
    seq: u64,
    doc: D,
}

#[derive(Debug)]
struct Table<D: Document> {
    next_seq: u64,
    rows: HashMap<D::Id, Row<D>>,
}

impl<D: Document> Default for Table<D> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            rows: HashMap::new(),
        }
    }
}

impl<D: Document> Table<D> {
    fn key_taken(&self, key: &str, except: Option<D::Id>) -> bool {
        self.rows
            .iter()
            .any(|(id, row)| Some(*id) != except && row.doc.unique_key() == Some(key))
    }

    fn insert(&mut self, doc: D) -> Result<(), StoreError> {
        let id = doc.id();
        if self.rows.contains_key(&id) {
            return Err(StoreError::Conflict(format!("{} {id} already exists", D::KIND)));
        }
        if let Some(key) = doc.unique_key() {
            if self.key_taken(key, None) {
                return Err(StoreError::Conflict(format!("{} '{key}' already exists", D::KIND)));
            }
        }
        self.next_seq += 1;
        self.rows.insert(
            id,
            Row {
                seq: self.next_seq,
                doc,
            },
        );
        Ok(())
    }

    fn listing(&self, order: ListOrder, limit: usize) -> Vec<D> {
        let mut rows: Vec<&Row<D>> = self.rows.values().collect();
        rows.sort_by_key(|r| (r.doc.created_at(), r.seq));
        if order == ListOrder::Newest {
            rows.reverse();
        }
        rows.into_iter().take(limit).map(|r| r.doc.clone()).collect()
    }
}

/// One collection held behind a `RwLock`.
#[derive(Debug)]
pub struct InMemoryCollection<D: Document> {
    table: RwLock<Table<D>>,
}

impl<D: Document> InMemoryCollection<D> {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D: Document> Default for InMemoryCollection<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<D: Document> Collection<D> for InMemoryCollection<D> {
    async fn list(&self, order: ListOrder, limit: usize) -> Result<Vec<D>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::poisoned())?;
        Ok(table.listing(order, limit))
    }

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::poisoned())?;
        Ok(table.rows.get(&id).map(|r| r.doc.clone()))
    }

    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::poisoned())?;
        table.insert(doc.clone())?;
        Ok(doc)
    }

    async fn update(&self, id: D::Id, mutate: Mutation<D>) -> Result<D, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::poisoned())?;
        let mut next = table
            .rows
            .get(&id)
            .map(|r| r.doc.clone())
            .ok_or(StoreError::NotFound(D::KIND))?;
        mutate(&mut next)?;

        if let Some(key) = next.unique_key() {
            if table.key_taken(key, Some(id)) {
                return Err(StoreError::Conflict(format!("{} '{key}' already exists", D::KIND)));
            }
        }
        if let Some(row) = table.rows.get_mut(&id) {
            row.doc = next.clone();
        }
        Ok(next)
    }

    async fn delete(&self, id: D::Id) -> Result<bool, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::poisoned())?;
        Ok(table.rows.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryCollection<UserRecord> {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::poisoned())?;
        Ok(table
            .rows
            .values()
            .find(|r| r.doc.username == username)
            .map(|r| r.doc.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// Stock ledger over the in-memory item and protocol collections.
///
/// Lock order is always items, then protocol.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    items: Arc<InMemoryCollection<InventoryItem>>,
    protocol: Arc<InMemoryCollection<ProtocolLogEntry>>,
}

impl InMemoryLedger {
    pub fn new(
        items: Arc<InMemoryCollection<InventoryItem>>,
        protocol: Arc<InMemoryCollection<ProtocolLogEntry>>,
    ) -> Self {
        Self { items, protocol }
    }
}

#[async_trait::async_trait]
impl StockLedger for InMemoryLedger {
    async fn commit_adjustment(
        &self,
        adjustment: StockAdjustment,
    ) -> Result<StockChange, StoreError> {
        let mut items = self.items.table.write().map_err(|_| StoreError::poisoned())?;
        let mut protocol = self
            .protocol
            .table
            .write()
            .map_err(|_| StoreError::poisoned())?;

        let row = items
            .rows
            .get_mut(&adjustment.item_id)
            .ok_or(StoreError::NotFound(InventoryItem::KIND))?;
        let change = row.doc.adjust_stock(&adjustment)?;

        // The entry insert is the only fallible write, so it goes first.
        protocol
            .insert(change.entry.clone())
            .map_err(|e| StoreError::CommitFailed(e.to_string()))?;
        row.doc = change.item.clone();

        Ok(change)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bundle
// ─────────────────────────────────────────────────────────────────────────────

/// All in-memory collections, with concrete types for tests that need them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    pub users: Arc<InMemoryCollection<UserRecord>>,
    pub items: Arc<InMemoryCollection<InventoryItem>>,
    pub protocol: Arc<InMemoryCollection<ProtocolLogEntry>>,
    pub markers: Arc<InMemoryCollection<MapMarker>>,
    pub routes: Arc<InMemoryCollection<TrainRoute>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> InMemoryLedger {
        InMemoryLedger::new(self.items.clone(), self.protocol.clone())
    }
}
