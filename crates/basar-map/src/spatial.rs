//! Which features lie inside a polygon.
//!
//! Used after a polygon is stored (to tell the user what it now covers)
//! and before an edit is saved (to ask for confirmation). Boundary points
//! count as inside.

use serde::Serialize;

use crate::clip::polygon_contains_point;
use crate::features::{CameraFeature, FeatureRef, PointFeature};
use crate::geometry::{GeometryError, Point, Polygon};

/// Anything with a single map position.
pub trait Located {
    fn location(&self) -> Point;
}

impl Located for Point {
    fn location(&self) -> Point {
        *self
    }
}

impl Located for FeatureRef {
    fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Located for PointFeature {
    fn location(&self) -> Point {
        self.location
    }
}

impl Located for CameraFeature {
    fn location(&self) -> Point {
        self.location
    }
}

/// Features inside `polygon`, in input order.
///
/// ## Rust Lesson #12: Generics with Trait Bounds
///
/// `T: Located` accepts any type that can report a position. The compiler
/// generates one copy of this function per feature type, so there is no
/// dynamic dispatch in the loop.
pub fn features_within<'a, T: Located>(polygon: &Polygon, features: &'a [T]) -> Vec<&'a T> {
    // The shell test starts with its own bounds rejection, widened by the
    // same snap distance it uses for boundary points.
    features
        .iter()
        .filter(|feature| polygon_contains_point(polygon, feature.location()))
        .collect()
}

/// Points and cameras covered by a polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedFeatures<'a> {
    pub points: Vec<&'a PointFeature>,
    pub cameras: Vec<&'a CameraFeature>,
}

impl AffectedFeatures<'_> {
    pub fn total(&self) -> usize {
        self.points.len() + self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

pub fn affected_features<'a>(
    polygon: &Polygon,
    points: &'a [PointFeature],
    cameras: &'a [CameraFeature],
) -> AffectedFeatures<'a> {
    AffectedFeatures {
        points: features_within(polygon, points),
        cameras: features_within(polygon, cameras),
    }
}

/// Wire entry point: raw ring coordinates plus bare references.
pub fn features_within_refs(
    coordinates: &[Vec<Vec<f64>>],
    refs: Vec<FeatureRef>,
) -> Result<Vec<FeatureRef>, GeometryError> {
    let polygon = Polygon::from_coordinates(coordinates)?;
    polygon.validate()?;
    let keep: Vec<FeatureRef> = features_within(&polygon, &refs).into_iter().copied().collect();
    Ok(keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ])
    }

    fn point(id: u64, x: f64, y: f64) -> PointFeature {
        PointFeature {
            id,
            name: format!("p{}", id),
            description: None,
            location: Point::new(x, y),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn camera(id: u64, x: f64, y: f64) -> CameraFeature {
        CameraFeature {
            id,
            name: format!("c{}", id),
            description: None,
            location: Point::new(x, y),
            video_file_name: format!("cam{}.mp4", id),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn keeps_inside_points_only() {
        let p_in = Point::new(0.5, 0.5);
        let p_out = Point::new(2.0, 2.0);
        let pts = [p_in, p_out];
        let found = features_within(&unit_square(), &pts);
        assert_eq!(found, vec![&p_in]);
    }

    #[test]
    fn boundary_points_are_inside() {
        let edge = Point::new(1.0, 0.5);
        let corner = Point::new(0.0, 0.0);
        assert_eq!(features_within(&unit_square(), &[edge, corner]).len(), 2);
    }

    #[test]
    fn points_within_snap_distance_of_the_edge_are_inside() {
        let just_right = Point::new(1.0 + 1e-12, 0.5);
        let just_above = Point::new(0.5, 1.0 + 1e-12);
        let corner = Point::new(1.0 + 1e-12, 1.0 + 1e-12);
        let pts = [just_right, just_above, corner];
        let found = features_within(&unit_square(), &pts);
        assert_eq!(found.len(), 3);

        let clearly_out = Point::new(1.0 + 1e-6, 0.5);
        assert!(features_within(&unit_square(), &[clearly_out]).is_empty());
    }

    #[test]
    fn hole_interior_is_outside() {
        let donut = Polygon::with_holes(
            vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 4.0),
                Point::new(0.0, 4.0),
            ],
            vec![vec![
                Point::new(1.0, 1.0),
                Point::new(3.0, 1.0),
                Point::new(3.0, 3.0),
                Point::new(1.0, 3.0),
            ]],
        );
        let pts = [Point::new(2.0, 2.0), Point::new(0.5, 0.5), Point::new(1.0, 2.0)];
        let found = features_within(&donut, &pts);
        assert_eq!(found, vec![&pts[1], &pts[2]]);
    }

    #[test]
    fn preserves_input_order() {
        let pts: Vec<PointFeature> = vec![point(3, 0.9, 0.9), point(1, 5.0, 5.0), point(2, 0.1, 0.1)];
        let ids: Vec<u64> = features_within(&unit_square(), &pts).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn affected_features_counts_both_kinds() {
        let points = vec![point(1, 0.5, 0.5), point(2, 3.0, 3.0)];
        let cameras = vec![camera(7, 0.2, 0.8), camera(8, 0.7, 0.1)];
        let affected = affected_features(&unit_square(), &points, &cameras);
        assert_eq!(affected.points.len(), 1);
        assert_eq!(affected.cameras.len(), 2);
        assert_eq!(affected.total(), 3);
        assert!(!affected.is_empty());

        let none = affected_features(&unit_square(), &points[1..], &[]);
        assert!(none.is_empty());
    }

    #[test]
    fn refs_are_filtered_from_wire_coordinates() {
        let coords = vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ]];
        let refs = vec![
            FeatureRef { id: 1, x: 0.5, y: 0.5 },
            FeatureRef { id: 2, x: -1.0, y: 0.5 },
        ];
        let kept = features_within_refs(&coords, refs).unwrap();
        assert_eq!(kept, vec![FeatureRef { id: 1, x: 0.5, y: 0.5 }]);
    }

    #[test]
    fn refs_with_bad_polygon_fail() {
        let coords = vec![vec![vec![0.0, 0.0], vec![1.0]]];
        assert!(matches!(
            features_within_refs(&coords, Vec::new()),
            Err(GeometryError::BadCoordinate { .. })
        ));
    }
}
