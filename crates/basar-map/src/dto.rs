//! Wire types and the conversions to and from the domain types.
//!
//! JSON field names are camelCase. Coordinates travel as
//! `[[[x, y], ...], ...]`: a list of rings, shell first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{GeometryError, Polygon};
use crate::resolve::{Resolution, ResolveError};
use crate::store::{NewPolygon, PolygonId, PolygonRecord, StoreError};

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolygonRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

impl CreatePolygonRequest {
    /// Parse and validate the coordinates.
    pub fn to_polygon(&self) -> Result<Polygon, GeometryError> {
        let polygon = Polygon::from_coordinates(&self.coordinates)?;
        polygon.validate()?;
        Ok(polygon)
    }

    pub fn into_new_polygon(self) -> Result<NewPolygon, GeometryError> {
        let geometry = self.to_polygon()?;
        Ok(NewPolygon::new(self.name, self.description, geometry))
    }
}

/// A stored polygon as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonResponse {
    pub id: PolygonId,
    pub name: String,
    pub description: Option<String>,
    pub coordinates: Vec<Vec<[f64; 2]>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// `null` unless the stored polygon is smaller than the submission.
    #[serde(default)]
    pub area_reduction_percent: Option<f64>,
}

impl From<&PolygonRecord> for PolygonResponse {
    fn from(record: &PolygonRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            coordinates: record.geometry.to_coordinates(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            area_reduction_percent: None,
        }
    }
}

impl From<&Resolution> for PolygonResponse {
    fn from(resolution: &Resolution) -> Self {
        Self {
            area_reduction_percent: resolution.area_reduction_percent(),
            ..PolygonResponse::from(&resolution.record)
        }
    }
}

/// Failure body, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResolveFailure {
    FullyContained,
    InvalidGeometry { detail: String },
    NotFound { id: PolygonId },
    Storage { detail: String },
}

impl ResolveFailure {
    /// Human readable explanation.
    pub fn message(&self) -> String {
        match self {
            ResolveFailure::FullyContained => {
                "The new polygon is completely contained within existing polygons or resulted in an empty geometry.".to_string()
            }
            ResolveFailure::InvalidGeometry { detail } => format!("Invalid polygon: {}", detail),
            ResolveFailure::NotFound { id } => format!("No polygon found with ID: {}", id),
            ResolveFailure::Storage { detail } => format!("Storage error: {}", detail),
        }
    }
}

impl From<&GeometryError> for ResolveFailure {
    fn from(e: &GeometryError) -> Self {
        ResolveFailure::InvalidGeometry {
            detail: e.to_string(),
        }
    }
}

impl From<&StoreError> for ResolveFailure {
    fn from(e: &StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ResolveFailure::NotFound { id: *id },
            other => ResolveFailure::Storage {
                detail: other.to_string(),
            },
        }
    }
}

impl From<&ResolveError> for ResolveFailure {
    fn from(e: &ResolveError) -> Self {
        match e {
            ResolveError::FullyContained => ResolveFailure::FullyContained,
            ResolveError::InvalidGeometry(g) => g.into(),
            ResolveError::Store(s) => s.into(),
        }
    }
}
