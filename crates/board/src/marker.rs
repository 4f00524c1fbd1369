use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outpost_core::{DomainError, DomainResult, Entity, MarkerId};

/// A point of interest on the shared map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: MarkerId,
    pub name: String,
    /// Free-form category ("person", "building", "material", ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_friendly")]
    pub is_friendly: bool,
    pub map_x: f64,
    pub map_y: f64,
    /// Username of the creator at creation time.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

fn default_friendly() -> bool {
    true
}

impl Entity for MapMarker {
    type Id = MarkerId;

    fn id(&self) -> MarkerId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMarker {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_friendly")]
    pub is_friendly: bool,
    pub map_x: f64,
    pub map_y: f64,
}

impl NewMarker {
    pub fn into_marker(
        self,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<MapMarker> {
        validate_coordinates(self.map_x, self.map_y)?;
        Ok(MapMarker {
            id: MarkerId::new(),
            name: self.name,
            kind: self.kind,
            is_friendly: self.is_friendly,
            map_x: self.map_x,
            map_y: self.map_y,
            created_by: created_by.into(),
            created_at,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub is_friendly: Option<bool>,
    pub map_x: Option<f64>,
    pub map_y: Option<f64>,
}

impl MarkerPatch {
    pub fn apply(&self, marker: &mut MapMarker) -> DomainResult<()> {
        validate_coordinates(
            self.map_x.unwrap_or(marker.map_x),
            self.map_y.unwrap_or(marker.map_y),
        )?;

        if let Some(name) = &self.name {
            marker.name = name.clone();
        }
        if let Some(kind) = &self.kind {
            marker.kind = kind.clone();
        }
        if let Some(is_friendly) = self.is_friendly {
            marker.is_friendly = is_friendly;
        }
        if let Some(x) = self.map_x {
            marker.map_x = x;
        }
        if let Some(y) = self.map_y {
            marker.map_y = y;
        }
        Ok(())
    }
}

fn validate_coordinates(x: f64, y: f64) -> DomainResult<()> {
    if !x.is_finite() || !y.is_finite() {
        return Err(DomainError::validation("coordinates must be finite numbers"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> MapMarker {
        NewMarker {
            name: "Depot".into(),
            kind: "building".into(),
            is_friendly: false,
            map_x: 12.5,
            map_y: -3.0,
        }
        .into_marker("bob", Utc::now())
        .unwrap()
    }

    #[test]
    fn category_is_serialized_as_type() {
        let json = serde_json::to_value(marker()).unwrap();
        assert_eq!(json["type"], "building");
        assert_eq!(json["created_by"], "bob");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn friendly_defaults_to_true() {
        let new: NewMarker = serde_json::from_value(serde_json::json!({
            "name": "Scout",
            "type": "person",
            "map_x": 1.0,
            "map_y": 2.0,
        }))
        .unwrap();
        assert!(new.is_friendly);
    }

    #[test]
    fn patch_moves_one_axis_only() {
        let mut m = marker();
        let before = m.clone();
        MarkerPatch {
            map_x: Some(40.0),
            ..MarkerPatch::default()
        }
        .apply(&mut m)
        .unwrap();
        assert_eq!(m.map_x, 40.0);
        assert_eq!(m.map_y, before.map_y);
        assert_eq!(m.name, before.name);
        assert_eq!(m.kind, before.kind);
        assert_eq!(m.is_friendly, before.is_friendly);
        assert_eq!(m.created_by, before.created_by);
    }
}
