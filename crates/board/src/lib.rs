//! Shared boards: map markers and train routes.
//!
//! Plain records with merge-patch updates; no cross-entity invariants.

pub mod marker;
pub mod route;

pub use marker::{MapMarker, MarkerPatch, NewMarker};
pub use route::{NewRoute, RoutePatch, RouteStop, TrainRoute};
