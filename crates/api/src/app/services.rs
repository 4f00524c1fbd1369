//! Service wiring shared by every handler.

use outpost_auth::TokenService;
use outpost_infra::{Accounts, AppConfig, InventoryLedger, Stores};

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub stores: Stores,
    pub accounts: Accounts,
    pub ledger: InventoryLedger,
    pub tokens: TokenService,
}

impl AppServices {
    pub fn new(config: &AppConfig, stores: Stores) -> Self {
        let accounts = Accounts::new(stores.users.clone());
        let ledger = InventoryLedger::new(stores.ledger.clone());
        let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl);
        Self {
            stores,
            accounts,
            ledger,
            tokens,
        }
    }

    pub fn storage_kind(&self) -> &'static str {
        if self.stores.is_persistent() {
            "postgres"
        } else {
            "in_memory"
        }
    }
}
