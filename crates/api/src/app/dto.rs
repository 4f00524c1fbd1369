use serde::{Deserialize, Serialize};

use outpost_auth::PublicUser;
use outpost_core::ItemId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Signed stock change; negative `quantity` withdraws.
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub item_id: ItemId,
    pub quantity: i64,
    #[serde(default)]
    pub is_personal_use: bool,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: PublicUser,
}

impl TokenResponse {
    pub fn bearer(access_token: String, user: PublicUser) -> Self {
        Self {
            access_token,
            token_type: "bearer",
            user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub message: &'static str,
    pub new_stock: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}
