//! Infrastructure layer: document storage, the stock ledger, account
//! services and runtime configuration.

pub mod accounts;
pub mod config;
pub mod ledger;
pub mod store;

pub use accounts::{AccountError, Accounts};
pub use config::{AdminBootstrap, AppConfig, ConfigError, CorsOrigins, StorageConfig};
pub use ledger::InventoryLedger;
pub use store::{
    Collection, Document, InMemoryStore, LIST_LIMIT, ListOrder, Mutation, PostgresStore,
    StockLedger, StoreError, Stores, UserStore,
};
