use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outpost_core::{DomainError, DomainResult, Entity, RouteId};

/// One leg marker on a train route: a station, a driving hint, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    #[serde(default)]
    pub station: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// A named train route on the "zug" board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainRoute {
    pub id: RouteId,
    pub title: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub stops: Vec<RouteStop>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for TrainRoute {
    type Id = RouteId;

    fn id(&self) -> RouteId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoute {
    pub title: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub stops: Vec<RouteStop>,
}

impl NewRoute {
    pub fn into_route(
        self,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<TrainRoute> {
        validate_title(&self.title)?;
        Ok(TrainRoute {
            id: RouteId::new(),
            title: self.title,
            duration_minutes: self.duration_minutes,
            stops: self.stops,
            created_by: created_by.into(),
            created_at,
        })
    }
}

/// Merge patch; `stops`, when present, replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePatch {
    pub title: Option<String>,
    pub duration_minutes: Option<u32>,
    pub stops: Option<Vec<RouteStop>>,
}

impl RoutePatch {
    pub fn apply(&self, route: &mut TrainRoute) -> DomainResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
            route.title = title.clone();
        }
        if let Some(minutes) = self.duration_minutes {
            route.duration_minutes = Some(minutes);
        }
        if let Some(stops) = &self.stops {
            route.stops = stops.clone();
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    Ok(())
}
