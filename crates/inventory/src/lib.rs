//! Inventory domain: items, the stock ledger rule and the protocol log entry.
//!
//! Pure, deterministic domain logic (no IO, no HTTP, no storage). Stores call
//! [`InventoryItem::adjust_stock`] inside their atomic commit so the rule is
//! evaluated against the same state that gets written.

pub mod item;
pub mod protocol;

pub use item::{Actor, InventoryItem, ItemPatch, NewItem, StockAdjustment, StockChange};
pub use protocol::{ProtocolLogEntry, StockAction};
