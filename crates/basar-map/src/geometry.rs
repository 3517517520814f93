//! Core geometry types for basar-map.
//!
//! Coordinates are longitude/latitude pairs in one fixed reference system
//! ([`SRID`]). Nothing in this crate converts units: `x` is longitude and
//! `y` is latitude, both in degrees, and all math is planar on those values.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! The `#[derive(...)]` macro auto-generates common functionality:
//! - `Debug` = print with `{:?}`
//! - `Clone` / `Copy` = duplicate the value
//! - `PartialEq` = compare with `==`
//! - `Serialize` / `Deserialize` = serde can read and write it as JSON

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clip::{segment_contact, Contact, Tolerance};

/// Spatial reference identifier of every coordinate (WGS 84).
///
/// It is a constant, not runtime state: there is no geometry factory to
/// share between callers.
pub const SRID: u32 = 4326;

/// A coordinate: `x` = longitude, `y` = latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A closed sequence of coordinates (first == last once normalized).
pub type Ring = Vec<Point>;

/// A polygon: one exterior ring (the shell) plus zero or more holes.
///
/// Rings are kept closed. Serialized as a list of rings, each a list of
/// `[x, y]` pairs, shell first (the GeoJSON polygon layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<[f64; 2]>>", into = "Vec<Vec<[f64; 2]>>")]
pub struct Polygon {
    /// Outer boundary.
    pub shell: Ring,
    /// Interior rings subtracted from the shell.
    pub holes: Vec<Ring>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Malformed geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("polygon must have at least one ring")]
    NoRings,
    #[error("coordinate {index} of ring {ring} has {len} values, expected 2")]
    BadCoordinate { ring: usize, index: usize, len: usize },
    #[error("ring {ring} contains a non-finite coordinate")]
    NonFinite { ring: usize },
    #[error("ring {ring} has {count} distinct vertices, at least 3 are required")]
    TooFewVertices { ring: usize, count: usize },
    #[error("ring {ring} encloses no area")]
    ZeroArea { ring: usize },
    #[error("ring {ring} intersects itself near ({x}, {y})")]
    SelfIntersection { ring: usize, x: f64, y: f64 },
    #[error("overlay left an open boundary at ({x}, {y})")]
    OpenBoundary { x: f64, y: f64 },
    #[error("overlay produced a hole outside every shell")]
    OrphanHole,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Planar distance to another point (in coordinate units).
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl Bounds {
    /// Bounds of a point sequence, `None` when empty.
    pub fn of_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.iter().fold(init, |b, p| Bounds {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// True if the boxes overlap or come within `tolerance` of each other.
    pub fn touches(&self, other: &Bounds, tolerance: f64) -> bool {
        self.min_x <= other.max_x + tolerance
            && other.min_x <= self.max_x + tolerance
            && self.min_y <= other.max_y + tolerance
            && other.min_y <= self.max_y + tolerance
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl Polygon {
    /// Create a polygon without holes. The shell is closed if needed.
    pub fn new(shell: Ring) -> Self {
        Self {
            shell: close_ring(shell),
            holes: Vec::new(),
        }
    }

    /// Create a polygon with holes. Every ring is closed if needed.
    pub fn with_holes(shell: Ring, holes: Vec<Ring>) -> Self {
        Self {
            shell: close_ring(shell),
            holes: holes.into_iter().map(close_ring).collect(),
        }
    }

    /// Build from a ring list, shell first.
    pub fn from_rings(rings: Vec<Ring>) -> Result<Self, GeometryError> {
        let mut rings = rings.into_iter();
        let shell = rings.next().ok_or(GeometryError::NoRings)?;
        Ok(Self::with_holes(shell, rings.collect()))
    }

    /// Build from raw `[[[x, y], ...], ...]` wire coordinates.
    ///
    /// Each coordinate must have exactly two values. Nothing else is
    /// checked here; call [`Polygon::validate`] for the full check.
    pub fn from_coordinates(coordinates: &[Vec<Vec<f64>>]) -> Result<Self, GeometryError> {
        let rings = coordinates
            .iter()
            .enumerate()
            .map(|(ring, coords)| {
                coords
                    .iter()
                    .enumerate()
                    .map(|(index, pair)| match pair.as_slice() {
                        [x, y] => Ok(Point::new(*x, *y)),
                        _ => Err(GeometryError::BadCoordinate {
                            ring,
                            index,
                            len: pair.len(),
                        }),
                    })
                    .collect::<Result<Ring, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rings(rings)
    }

    /// Wire coordinates, shell first.
    pub fn to_coordinates(&self) -> Vec<Vec<[f64; 2]>> {
        self.rings()
            .map(|ring| ring.iter().map(|&p| p.into()).collect())
            .collect()
    }

    /// Shell followed by the holes.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.shell).chain(self.holes.iter())
    }

    /// Bounding box of the shell.
    pub fn bounding_box(&self) -> Option<Bounds> {
        Bounds::of_points(&self.shell)
    }

    /// Area enclosed by the shell minus the area of the holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| ring_area(h)).sum();
        (ring_area(&self.shell) - holes).max(0.0)
    }

    /// Signed area of the shell (positive = counter-clockwise).
    #[inline]
    pub fn signed_area(&self) -> f64 {
        signed_area_of_points(&self.shell)
    }

    /// Check that every ring is usable by the overlay algorithms.
    ///
    /// Holes are not checked against the shell or each other.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let tolerance = match self.bounding_box() {
            Some(bounds) => Tolerance::for_bounds(&bounds),
            None => return Err(GeometryError::TooFewVertices { ring: 0, count: 0 }),
        };
        for (index, ring) in self.rings().enumerate() {
            validate_ring(index, ring, &tolerance)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<[f64; 2]>>> for Polygon {
    type Error = GeometryError;

    fn try_from(rings: Vec<Vec<[f64; 2]>>) -> Result<Self, Self::Error> {
        Polygon::from_rings(
            rings
                .into_iter()
                .map(|ring| ring.into_iter().map(Point::from).collect())
                .collect(),
        )
    }
}

impl From<Polygon> for Vec<Vec<[f64; 2]>> {
    fn from(polygon: Polygon) -> Self {
        polygon.to_coordinates()
    }
}

/// Close a ring by repeating its first coordinate at the end, if needed.
pub fn close_ring(mut ring: Ring) -> Ring {
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

/// Drop consecutive duplicates and the closing coordinate.
///
/// The overlay and validation code walk edges with wrap-around, so they
/// want each vertex exactly once.
pub fn open_ring(ring: &[Point]) -> Vec<Point> {
    let mut points: Vec<Point> = ring.to_vec();
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Unsigned ring area (shoelace formula).
#[inline]
pub fn ring_area(ring: &[Point]) -> f64 {
    signed_area_of_points(ring).abs()
}

/// Calculate signed area of a point sequence using the shoelace formula.
///
/// Returns:
/// - Positive value for counter-clockwise winding
/// - Negative value for clockwise winding
///
/// Works on open and closed rings alike: the closing edge of a closed ring
/// has zero length and contributes nothing.
pub fn signed_area_of_points(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

fn validate_ring(index: usize, ring: &[Point], tolerance: &Tolerance) -> Result<(), GeometryError> {
    if ring.iter().any(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinite { ring: index });
    }

    let points = open_ring(ring);
    let n = points.len();
    if n < 3 {
        return Err(GeometryError::TooFewVertices { ring: index, count: n });
    }
    if ring_area(&points) <= tolerance.area {
        return Err(GeometryError::ZeroArea { ring: index });
    }

    // Every pair of edges. Neighbours share a vertex, so for them only a
    // fold-back (the second edge running back over the first) is an error.
    for i in 0..n {
        let (a1, a2) = (points[i], points[(i + 1) % n]);
        for j in (i + 1)..n {
            let (b1, b2) = (points[j], points[(j + 1) % n]);
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);

            let contact = segment_contact(a1, a2, b1, b2, tolerance.snap);
            let at = match contact {
                Contact::None => continue,
                Contact::Point { at } if adjacent => {
                    let shared = if j == i + 1 { a2 } else { a1 };
                    if at.distance(shared) <= tolerance.snap {
                        continue;
                    }
                    at
                }
                Contact::Point { at } => at,
                Contact::Overlap { start, end } => {
                    if adjacent && start.distance(end) <= tolerance.snap {
                        continue;
                    }
                    if start.distance(a1) <= tolerance.snap || start.distance(a2) <= tolerance.snap {
                        end
                    } else {
                        start
                    }
                }
            };
            return Err(GeometryError::SelfIntersection {
                ring: index,
                x: at.x,
                y: at.y,
            });
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ])
    }

    #[test]
    fn point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0);
    }

    #[test]
    fn new_polygon_closes_shell() {
        let poly = square(1.0);
        assert_eq!(poly.shell.len(), 5);
        assert_eq!(poly.shell.first(), poly.shell.last());
    }

    #[test]
    fn closed_input_is_left_alone() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(0.0, 0.0),
        ];
        let poly = Polygon::new(ring.clone());
        assert_eq!(poly.shell, ring);
    }

    #[test]
    fn polygon_bbox() {
        let poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ]);
        let b = poly.bounding_box().unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 10.0, 5.0));
    }

    #[test]
    fn signed_area_follows_winding() {
        let ccw = square(10.0);
        assert!((ccw.signed_area() - 100.0).abs() < 1e-10);

        let cw = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ]);
        assert!((cw.signed_area() + 100.0).abs() < 1e-10);
        assert!((ring_area(&cw.shell) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn area_subtracts_holes() {
        let poly = Polygon::with_holes(
            square(10.0).shell,
            vec![vec![
                Point::new(2.0, 2.0),
                Point::new(4.0, 2.0),
                Point::new(4.0, 4.0),
                Point::new(2.0, 4.0),
            ]],
        );
        assert!((poly.area() - 96.0).abs() < 1e-10);
    }

    #[test]
    fn coordinates_round_trip_through_wire_layout() {
        let coords = vec![vec![
            vec![0.0, 0.0],
            vec![2.0, 0.0],
            vec![2.0, 2.0],
            vec![0.0, 0.0],
        ]];
        let poly = Polygon::from_coordinates(&coords).unwrap();
        assert_eq!(poly.to_coordinates()[0][1], [2.0, 0.0]);
        assert_eq!(poly.to_coordinates()[0].len(), 4);
    }

    #[test]
    fn bad_coordinate_pair_is_reported() {
        let coords = vec![vec![vec![0.0, 0.0], vec![1.0], vec![1.0, 1.0]]];
        let err = Polygon::from_coordinates(&coords).unwrap_err();
        assert_eq!(err, GeometryError::BadCoordinate { ring: 0, index: 1, len: 1 });
    }

    #[test]
    fn empty_ring_list_is_rejected() {
        assert_eq!(Polygon::from_coordinates(&[]).unwrap_err(), GeometryError::NoRings);
    }

    #[test]
    fn serde_uses_ring_arrays() {
        let poly = square(1.0);
        let json = serde_json::to_string(&poly).unwrap();
        assert!(json.starts_with("[[[0.0,0.0],[1.0,0.0]"));
        let back: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(back, poly);
    }

    #[test]
    fn valid_square_passes() {
        assert!(square(1.0).validate().is_ok());
    }

    #[test]
    fn two_vertex_ring_is_too_small() {
        let poly = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(matches!(
            poly.validate(),
            Err(GeometryError::TooFewVertices { ring: 0, count: 2 })
        ));
    }

    #[test]
    fn collinear_ring_has_no_area() {
        let poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ]);
        assert!(matches!(poly.validate(), Err(GeometryError::ZeroArea { ring: 0 })));
    }

    #[test]
    fn bow_tie_self_intersects() {
        let poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 3.0),
        ]);
        match poly.validate() {
            Err(GeometryError::SelfIntersection { ring, x, y }) => {
                assert_eq!(ring, 0);
                assert!((x - 1.2).abs() < 1e-9 && (y - 1.2).abs() < 1e-9);
            }
            other => panic!("expected self-intersection, got {:?}", other),
        }
    }

    #[test]
    fn non_finite_coordinate_is_rejected() {
        let poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(f64::NAN, 0.0),
            Point::new(1.0, 1.0),
        ]);
        assert!(matches!(poly.validate(), Err(GeometryError::NonFinite { ring: 0 })));
    }

    #[test]
    fn bad_hole_is_reported_with_its_index() {
        let poly = Polygon::with_holes(
            square(10.0).shell,
            vec![vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]],
        );
        assert!(matches!(
            poly.validate(),
            Err(GeometryError::TooFewVertices { ring: 1, .. })
        ));
    }
}
