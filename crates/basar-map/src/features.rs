//! Point-like map features.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A named marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointFeature {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: Point,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A camera placed on the map, with the video it serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraFeature {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: Point,
    pub video_file_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Bare id plus position, as sent by clients asking which of their
/// features fall inside a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRef {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_defaults_to_active() {
        let json = r#"{
            "id": 4,
            "name": "gate",
            "location": {"x": 29.1, "y": 41.0},
            "videoFileName": "gate.mp4",
            "createdAt": "2025-07-01T12:00:00Z"
        }"#;
        let camera: CameraFeature = serde_json::from_str(json).unwrap();
        assert!(camera.is_active);
        assert_eq!(camera.description, None);
        assert_eq!(camera.location, Point::new(29.1, 41.0));
    }

    #[test]
    fn feature_ref_wire_form() {
        let r: FeatureRef = serde_json::from_str(r#"{"id":1,"x":2.5,"y":-3.0}"#).unwrap();
        assert_eq!(r, FeatureRef { id: 1, x: 2.5, y: -3.0 });
    }
}
