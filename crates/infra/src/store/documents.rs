//! Collection bindings for every stored record type.

use outpost_auth::UserRecord;
use outpost_board::{MapMarker, TrainRoute};
use outpost_inventory::{InventoryItem, ProtocolLogEntry};

use super::Document;

impl Document for UserRecord {
    const COLLECTION: &'static str = "users";
    const KIND: &'static str = "user";

    fn unique_key(&self) -> Option<&str> {
        Some(&self.username)
    }
}

impl Document for InventoryItem {
    const COLLECTION: &'static str = "inventory";
    const KIND: &'static str = "item";
}

impl Document for ProtocolLogEntry {
    const COLLECTION: &'static str = "protocol";
    const KIND: &'static str = "log entry";
}

impl Document for MapMarker {
    const COLLECTION: &'static str = "map_markers";
    const KIND: &'static str = "marker";
}

impl Document for TrainRoute {
    const COLLECTION: &'static str = "zug_routes";
    const KIND: &'static str = "route";
}
