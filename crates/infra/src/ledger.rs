//! Stock ledger service: turns an authenticated stock request into a
//! committed adjustment and logs the outcome.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use outpost_auth::CurrentUser;
use outpost_core::ItemId;
use outpost_inventory::{Actor, StockAdjustment, StockChange};

use crate::store::{StockLedger, StoreError};

#[derive(Clone)]
pub struct InventoryLedger {
    ledger: Arc<dyn StockLedger>,
}

impl InventoryLedger {
    pub fn new(ledger: Arc<dyn StockLedger>) -> Self {
        Self { ledger }
    }

    /// Apply a signed stock change on behalf of `actor`.
    ///
    /// The item update and its protocol entry commit together or not at all.
    #[instrument(skip(self, actor), fields(user = %actor.username))]
    pub async fn adjust_stock(
        &self,
        item_id: ItemId,
        delta: i64,
        is_personal_use: bool,
        actor: &CurrentUser,
    ) -> Result<StockChange, StoreError> {
        let adjustment = StockAdjustment {
            item_id,
            delta,
            is_personal_use,
            actor: Actor {
                user_id: actor.id,
                username: actor.username.clone(),
            },
            occurred_at: Utc::now(),
        };

        match self.ledger.commit_adjustment(adjustment).await {
            Ok(change) => {
                info!(
                    item = %change.item.name,
                    action = ?change.entry.action,
                    quantity = change.entry.quantity,
                    new_stock = change.new_stock(),
                    "stock adjusted"
                );
                Ok(change)
            }
            Err(e @ (StoreError::Domain(_) | StoreError::NotFound(_))) => {
                warn!(error = %e, "stock adjustment rejected");
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "stock adjustment failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_auth::PermissionSet;
    use outpost_core::{DomainError, UserId};
    use outpost_inventory::{InventoryItem, NewItem, StockAction};
    use proptest::prelude::*;

    use crate::store::{Collection, InMemoryStore, ListOrder};

    fn hunter() -> CurrentUser {
        CurrentUser {
            id: UserId::new(),
            username: "alice".into(),
            is_admin: false,
            permissions: PermissionSet::new(),
        }
    }

    async fn rifle(store: &InMemoryStore, stock: i64) -> InventoryItem {
        let item = NewItem {
            name: "Rifle".into(),
            price: 500.0,
            stock,
        }
        .into_item(Utc::now())
        .unwrap();
        store.items.insert(item).await.unwrap()
    }

    #[tokio::test]
    async fn rifle_overdraw_then_exact_withdrawal() {
        let store = InMemoryStore::new();
        let ledger = InventoryLedger::new(Arc::new(store.ledger()));
        let item = rifle(&store, 10).await;
        let alice = hunter();

        let err = ledger.adjust_stock(item.id, -15, false, &alice).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InsufficientStock { available: 10, .. })
        ));
        assert!(store.protocol.is_empty());

        let change = ledger.adjust_stock(item.id, -10, true, &alice).await.unwrap();
        assert_eq!(change.new_stock(), 0);

        let log = store.protocol.list(ListOrder::Newest, 10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, StockAction::Removed);
        assert_eq!(log[0].quantity, 10);
        assert!(log[0].is_personal_use);
        assert_eq!(log[0].username, "alice");
        assert_eq!(log[0].item_name, "Rifle");
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let store = InMemoryStore::new();
        let ledger = InventoryLedger::new(Arc::new(store.ledger()));
        let err = ledger
            .adjust_stock(ItemId::new(), 1, false, &hunter())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("item"));
    }

    proptest! {
        #[test]
        fn committed_stock_matches_protocol_replay(
            initial in 0i64..50,
            deltas in prop::collection::vec(-20i64..20, 1..30),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = InMemoryStore::new();
                let ledger = InventoryLedger::new(Arc::new(store.ledger()));
                let item = rifle(&store, initial).await;
                let alice = hunter();

                let mut applied = 0usize;
                for delta in deltas {
                    if ledger.adjust_stock(item.id, delta, false, &alice).await.is_ok() {
                        applied += 1;
                    }
                }

                let stock = store.items.get(item.id).await.unwrap().unwrap().stock;
                let log = store.protocol.list(ListOrder::Oldest, usize::MAX).await.unwrap();
                let replayed: i64 = initial + log.iter().map(|e| e.signed_delta()).sum::<i64>();

                prop_assert!(stock >= 0);
                prop_assert_eq!(log.len(), applied);
                prop_assert_eq!(stock, replayed);
                Ok(())
            })?;
        }
    }
}
