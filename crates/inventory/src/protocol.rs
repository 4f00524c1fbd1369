use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outpost_core::{Entity, LogEntryId, UserId};

/// Direction of a logged stock change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAction {
    Added,
    Removed,
}

impl StockAction {
    pub fn for_delta(delta: i64) -> Self {
        if delta > 0 { Self::Added } else { Self::Removed }
    }
}

/// Immutable record of one committed stock change.
///
/// User and item are denormalized snapshots: the entry stays readable after
/// the user is deleted or the item renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolLogEntry {
    pub id: LogEntryId,
    pub user_id: UserId,
    pub username: String,
    pub item_name: String,
    pub action: StockAction,
    /// Always a positive magnitude; direction lives in `action`.
    pub quantity: i64,
    #[serde(default)]
    pub is_personal_use: bool,
    pub timestamp: DateTime<Utc>,
}

impl ProtocolLogEntry {
    /// The change this entry records, with sign restored.
    pub fn signed_delta(&self) -> i64 {
        match self.action {
            StockAction::Added => self.quantity,
            StockAction::Removed => -self.quantity,
        }
    }
}

impl Entity for ProtocolLogEntry {
    type Id = LogEntryId;

    fn id(&self) -> LogEntryId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
