//! Document storage boundary.
//!
//! Every record type lives in its own named collection. Handlers talk to
//! the [`Collection`] trait object; the backend is picked at startup
//! ([`Stores::in_memory`] for dev/tests, [`Stores::postgres`] otherwise).
//!
//! Stock changes never go through [`Collection::update`]: they are
//! committed by a [`StockLedger`], which writes the item and its protocol
//! entry as one unit.

mod documents;
pub mod error;
pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use outpost_auth::UserRecord;
use outpost_board::{MapMarker, TrainRoute};
use outpost_core::{DomainResult, Entity};
use outpost_inventory::{InventoryItem, ProtocolLogEntry, StockAdjustment, StockChange};

pub use error::StoreError;
pub use in_memory::{InMemoryCollection, InMemoryLedger, InMemoryStore};
pub use postgres::{PgCollection, PgLedger, PostgresStore};

/// Upper bound applied to every listing.
pub const LIST_LIMIT: usize = 1000;

/// A record type that can be stored in a named collection.
pub trait Document: Entity + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection (table) name.
    const COLLECTION: &'static str;

    /// Human name used in "not found" errors.
    const KIND: &'static str;

    /// Value that must be unique within the collection, if any.
    fn unique_key(&self) -> Option<&str> {
        None
    }
}

/// Listing order by creation time. Ties keep insertion order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Oldest,
    Newest,
}

/// In-place change applied to one document under the store's write guard.
pub type Mutation<D> = Box<dyn FnOnce(&mut D) -> DomainResult<()> + Send>;

#[async_trait::async_trait]
pub trait Collection<D: Document>: Send + Sync {
    async fn list(&self, order: ListOrder, limit: usize) -> Result<Vec<D>, StoreError>;

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError>;

    /// Insert a new document. Fails with `Conflict` if its unique key is taken.
    async fn insert(&self, doc: D) -> Result<D, StoreError>;

    /// Read-modify-write one document atomically.
    ///
    /// The mutation runs against the current stored value; if it fails,
    /// nothing is written.
    async fn update(&self, id: D::Id, mutate: Mutation<D>) -> Result<D, StoreError>;

    /// Remove a document. Returns `false` if it did not exist.
    async fn delete(&self, id: D::Id) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
pub trait UserStore: Collection<UserRecord> {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// Atomic stock ledger: item stock and protocol log move together.
#[async_trait::async_trait]
pub trait StockLedger: Send + Sync {
    /// Apply `adjustment` to its item and append the matching protocol
    /// entry. Either both are persisted or neither is.
    async fn commit_adjustment(
        &self,
        adjustment: StockAdjustment,
    ) -> Result<StockChange, StoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend bundle
// ─────────────────────────────────────────────────────────────────────────────

/// Handles to every collection, shared across request handlers.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub items: Arc<dyn Collection<InventoryItem>>,
    pub ledger: Arc<dyn StockLedger>,
    pub protocol: Arc<dyn Collection<ProtocolLogEntry>>,
    pub markers: Arc<dyn Collection<MapMarker>>,
    pub routes: Arc<dyn Collection<TrainRoute>>,
    pool: Option<sqlx::PgPool>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            users: store.users.clone(),
            items: store.items.clone(),
            ledger: Arc::new(store.ledger()),
            protocol: store.protocol.clone(),
            markers: store.markers.clone(),
            routes: store.routes.clone(),
            pool: None,
        }
    }

    pub fn postgres(store: PostgresStore) -> Self {
        let pool = store.pool().clone();
        Self {
            users: Arc::new(PgCollection::<UserRecord>::new(pool.clone())),
            items: Arc::new(PgCollection::<InventoryItem>::new(pool.clone())),
            ledger: Arc::new(PgLedger::new(pool.clone())),
            protocol: Arc::new(PgCollection::<ProtocolLogEntry>::new(pool.clone())),
            markers: Arc::new(PgCollection::<MapMarker>::new(pool.clone())),
            routes: Arc::new(PgCollection::<TrainRoute>::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    /// Release backend connections. No-op for the in-memory backend.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("persistent", &self.is_persistent())
            .finish_non_exhaustive()
    }
}
