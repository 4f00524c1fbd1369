//! Entity trait: identity + creation time, shared by every stored record.

use chrono::{DateTime, Utc};

use crate::id::Identifier;

/// A record with a stable identity.
///
/// Every collection in the document store holds entities; the store keys
/// them by `id()` and orders listings by `created_at()`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Identifier;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// When the entity was first persisted.
    fn created_at(&self) -> DateTime<Utc>;
}
