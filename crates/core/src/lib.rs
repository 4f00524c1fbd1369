//! `outpost-core`: shared domain building blocks.
//!
//! Pure domain primitives only: identifiers, the entity contract and the
//! domain error model. No IO, no HTTP, no storage.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{Identifier, ItemId, LogEntryId, MarkerId, RouteId, UserId};
