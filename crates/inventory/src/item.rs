use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outpost_core::{DomainError, DomainResult, Entity, ItemId, LogEntryId, UserId};

use crate::protocol::{ProtocolLogEntry, StockAction};

/// An inventory item.
///
/// # Invariants
/// - `stock >= 0` at all times.
/// - `price` is finite and `>= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Fields for a new item; id and timestamp are assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

impl NewItem {
    pub fn into_item(self, created_at: DateTime<Utc>) -> DomainResult<InventoryItem> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        validate_stock(self.stock)?;
        Ok(InventoryItem {
            id: ItemId::new(),
            name: self.name,
            price: self.price,
            stock: self.stock,
            created_at,
        })
    }
}

/// Direct field edit (merge semantics: absent fields are untouched).
///
/// Setting `stock` here bypasses the ledger and writes no protocol entry.
/// It exists for corrections; the replay invariant does not cover it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

impl ItemPatch {
    /// Validate every present field, then apply them all (no partial apply).
    pub fn apply(&self, item: &mut InventoryItem) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }

        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(stock) = self.stock {
            item.stock = stock;
        }
        Ok(())
    }
}

/// Who performed a stock change (snapshot taken at request time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
}

/// Request to move an item's stock by a signed `delta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub item_id: ItemId,
    pub delta: i64,
    pub is_personal_use: bool,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Outcome of a successful decision: the item to write and the entry to append.
///
/// Both must be committed together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub item: InventoryItem,
    pub entry: ProtocolLogEntry,
}

impl StockChange {
    pub fn new_stock(&self) -> i64 {
        self.item.stock
    }
}

impl InventoryItem {
    /// Decide a stock adjustment against the current state.
    ///
    /// Pure: returns the updated item and its protocol entry, or an error with
    /// `self` left untouched.
    pub fn adjust_stock(&self, adj: &StockAdjustment) -> DomainResult<StockChange> {
        if adj.item_id != self.id {
            return Err(DomainError::validation("item_id mismatch"));
        }
        if adj.delta == 0 {
            return Err(DomainError::validation("quantity cannot be zero"));
        }

        let new_stock = self
            .stock
            .checked_add(adj.delta)
            .ok_or_else(|| DomainError::validation("stock change overflows"))?;
        if new_stock < 0 {
            return Err(DomainError::InsufficientStock {
                available: self.stock,
                requested: adj.delta,
            });
        }

        let mut item = self.clone();
        item.stock = new_stock;

        let entry = ProtocolLogEntry {
            id: LogEntryId::new(),
            user_id: adj.actor.user_id,
            username: adj.actor.username.clone(),
            item_name: self.name.clone(),
            action: StockAction::for_delta(adj.delta),
            quantity: adj.delta.abs(),
            is_personal_use: adj.is_personal_use,
            timestamp: adj.occurred_at,
        };

        Ok(StockChange { item, entry })
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price must be a non-negative number"));
    }
    Ok(())
}

fn validate_stock(stock: i64) -> DomainResult<()> {
    if stock < 0 {
        return Err(DomainError::validation("stock cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rifle(stock: i64) -> InventoryItem {
        NewItem {
            name: "Rifle".to_string(),
            price: 500.0,
            stock,
        }
        .into_item(Utc::now())
        .unwrap()
    }

    fn actor() -> Actor {
        Actor {
            user_id: UserId::new(),
            username: "alice".to_string(),
        }
    }

    fn adjustment(item: &InventoryItem, delta: i64) -> StockAdjustment {
        StockAdjustment {
            item_id: item.id,
            delta,
            is_personal_use: false,
            actor: actor(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn overdraw_is_rejected_and_item_is_unchanged() {
        let item = rifle(10);
        let err = item.adjust_stock(&adjustment(&item, -15)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 10,
                requested: -15
            }
        );
        assert_eq!(item.stock, 10);
    }

    #[test]
    fn draining_to_zero_logs_a_removal() {
        let item = rifle(10);
        let change = item.adjust_stock(&adjustment(&item, -10)).unwrap();
        assert_eq!(change.new_stock(), 0);
        assert_eq!(change.entry.action, StockAction::Removed);
        assert_eq!(change.entry.quantity, 10);
        assert_eq!(change.entry.item_name, "Rifle");
        assert_eq!(change.entry.username, "alice");
    }

    #[test]
    fn restock_logs_an_addition_with_personal_use_flag() {
        let item = rifle(0);
        let mut adj = adjustment(&item, 4);
        adj.is_personal_use = true;
        let change = item.adjust_stock(&adj).unwrap();
        assert_eq!(change.new_stock(), 4);
        assert_eq!(change.entry.action, StockAction::Added);
        assert!(change.entry.is_personal_use);
    }

    #[test]
    fn zero_delta_is_a_validation_error() {
        let item = rifle(3);
        assert!(matches!(
            item.adjust_stock(&adjustment(&item, 0)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn adjustment_for_another_item_is_rejected() {
        let item = rifle(3);
        let other = rifle(3);
        assert!(item.adjust_stock(&adjustment(&other, 1)).is_err());
    }

    #[test]
    fn patch_merges_present_fields_only() {
        let mut item = rifle(10);
        ItemPatch {
            price: Some(650.0),
            ..ItemPatch::default()
        }
        .apply(&mut item)
        .unwrap();
        assert_eq!(item.name, "Rifle");
        assert_eq!(item.price, 650.0);
        assert_eq!(item.stock, 10);
    }

    #[test]
    fn invalid_patch_applies_nothing() {
        let mut item = rifle(10);
        let res = ItemPatch {
            name: Some("Shotgun".into()),
            stock: Some(-1),
            ..ItemPatch::default()
        }
        .apply(&mut item);
        assert!(res.is_err());
        assert_eq!(item.name, "Rifle");
    }

    #[test]
    fn negative_price_is_rejected_on_create() {
        let res = NewItem {
            name: "Ammo".into(),
            price: -1.0,
            stock: 1,
        }
        .into_item(Utc::now());
        assert!(matches!(res, Err(DomainError::Validation(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: applying any delta sequence keeps stock non-negative,
        /// and final stock equals initial stock plus the signed deltas of the
        /// entries produced (the protocol replays the ledger).
        #[test]
        fn protocol_replays_ledger(
            initial in 0i64..50,
            deltas in prop::collection::vec(-30i64..30, 1..40)
        ) {
            let mut item = rifle(initial);
            let mut entries = Vec::new();

            for delta in deltas {
                let before = item.stock;
                match item.adjust_stock(&adjustment(&item, delta)) {
                    Ok(change) => {
                        prop_assert!(change.new_stock() >= 0);
                        prop_assert_eq!(change.entry.signed_delta(), delta);
                        prop_assert_eq!(change.entry.quantity, delta.abs());
                        item = change.item;
                        entries.push(change.entry);
                    }
                    Err(_) => {
                        prop_assert!(delta == 0 || before + delta < 0);
                        prop_assert_eq!(item.stock, before);
                    }
                }
            }

            let replayed: i64 = initial + entries.iter().map(|e| e.signed_delta()).sum::<i64>();
            prop_assert_eq!(replayed, item.stock);
        }
    }
}
