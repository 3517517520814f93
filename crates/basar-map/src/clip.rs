//! Point and segment predicates.
//!
//! Everything the overlay and the spatial queries ask about "where is this
//! point" or "do these edges meet" lives here. The functions are pure; the
//! only shared value is a [`Tolerance`] derived from the inputs' extent.

use crate::geometry::{open_ring, Bounds, Point, Polygon};

// ============================================================================
// TOLERANCES
// ============================================================================

/// Distances below which two coordinates are treated as the same place.
///
/// Scaled to the geometry: map polygons span anything from a few metres
/// (1e-5 degrees) to whole countries, so absolute epsilons do not work.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tolerance {
    /// Vertices closer than this are merged; contacts closer than this count.
    pub snap: f64,
    /// Offset of the left/right probes used to classify overlay edges.
    pub probe: f64,
    /// Rings with less area than this are slivers.
    pub area: f64,
}

impl Tolerance {
    pub fn for_bounds(bounds: &Bounds) -> Self {
        let extent = bounds.width().max(bounds.height());
        let extent = if extent > 0.0 { extent } else { 1.0 };
        let magnitude = bounds
            .min_x
            .abs()
            .max(bounds.max_x.abs())
            .max(bounds.min_y.abs())
            .max(bounds.max_y.abs());

        // Never below what f64 can resolve at these coordinates.
        let snap = (extent * 1e-9).max(magnitude * 64.0 * f64::EPSILON);
        let probe = (extent * 1e-7).max(snap * 100.0);
        Self {
            snap,
            probe,
            area: snap * extent,
        }
    }

    pub fn for_pair(a: &Polygon, b: &Polygon) -> Self {
        match (a.bounding_box(), b.bounding_box()) {
            (Some(ba), Some(bb)) => Self::for_bounds(&ba.union(&bb)),
            (Some(only), None) | (None, Some(only)) => Self::for_bounds(&only),
            (None, None) => Self::for_bounds(&Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 1.0,
            }),
        }
    }
}

// ============================================================================
// VECTOR HELPERS
// ============================================================================

#[inline]
pub(crate) fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

#[inline]
pub(crate) fn dot(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * bx + ay * by
}

/// Distance from `p` to the segment `a`-`b`.
pub(crate) fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (dot(p.x - a.x, p.y - a.y, dx, dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + dx * t, a.y + dy * t))
}

/// Distance from `p` to the infinite line through `a` and `b`.
fn distance_to_line(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return p.distance(a);
    }
    cross(dx, dy, p.x - a.x, p.y - a.y).abs() / len
}

// ============================================================================
// POINT IN RING (Ray Casting Algorithm)
// ============================================================================
//
// ## Rust Lesson #8: References & Slices
//
// `&[Point]` is a "slice" - a borrowed view into a contiguous sequence.
// It works with Vec<Point>, arrays, or any contiguous memory. A ring
// stored closed or open can be passed the same way.

/// Ray casting without any boundary handling.
///
/// Casts a ray to the right and counts edge crossings.
/// Odd crossings = inside, even = outside. Points exactly on an edge land
/// on either side; callers that care use [`point_in_ring`].
#[inline]
pub(crate) fn crossing_test(p: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        if ((yi > p.y) != (yj > p.y)) && (p.x < (xj - xi) * (p.y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// True if `p` lies on one of the ring's edges (within `tolerance`).
pub(crate) fn on_ring_boundary(p: Point, ring: &[Point], tolerance: f64) -> bool {
    let n = ring.len();
    if n == 0 {
        return false;
    }
    (0..n).any(|i| distance_to_segment(p, ring[i], ring[(i + 1) % n]) <= tolerance)
}

/// Test if a point is inside a ring.
///
/// Points on the boundary count as inside: the boundary test runs before
/// the ray cast so the answer does not depend on which side floating point
/// rounding puts an on-edge point.
pub fn point_in_ring(p: Point, ring: &[Point]) -> bool {
    let Some(bounds) = Bounds::of_points(ring) else {
        return false;
    };
    let tolerance = Tolerance::for_bounds(&bounds);
    if !bounds.touches(
        &Bounds {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        },
        tolerance.snap,
    ) {
        return false;
    }
    on_ring_boundary(p, ring, tolerance.snap) || crossing_test(p, ring)
}

/// True if `p` is inside the shell (boundary included) and not strictly
/// inside any hole. Hole boundaries belong to the polygon.
pub fn polygon_contains_point(polygon: &Polygon, p: Point) -> bool {
    if !point_in_ring(p, &polygon.shell) {
        return false;
    }
    let tolerance = match polygon.bounding_box() {
        Some(bounds) => Tolerance::for_bounds(&bounds),
        None => return false,
    };
    !polygon
        .holes
        .iter()
        .any(|hole| crossing_test(p, hole) && !on_ring_boundary(p, hole, tolerance.snap))
}

/// Even-odd test over every ring of the polygon, no boundary handling.
///
/// Used for overlay probes, which are never on a boundary.
#[inline]
pub(crate) fn in_polygon_interior(polygon: &Polygon, p: Point) -> bool {
    polygon
        .rings()
        .fold(false, |inside, ring| inside ^ crossing_test(p, ring))
}

// ============================================================================
// SEGMENT CONTACT
// ============================================================================

/// How two segments meet.
///
/// ## Rust Lesson #10: Enums (Sum Types)
///
/// Rust enums can carry data, so "no contact", "a single point" and "a
/// shared stretch" are one type and a `match` has to handle all three.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Contact {
    None,
    /// The segments cross or touch at one point.
    Point { at: Point },
    /// The segments are collinear and share the stretch `start`-`end`.
    Overlap { start: Point, end: Point },
}

/// Find where segment `p1`-`p2` meets segment `q1`-`q2`.
///
/// Touching within `tolerance` counts as contact.
pub(crate) fn segment_contact(p1: Point, p2: Point, q1: Point, q2: Point, tolerance: f64) -> Contact {
    let (rx, ry) = (p2.x - p1.x, p2.y - p1.y);
    let (sx, sy) = (q2.x - q1.x, q2.y - q1.y);
    let r_len = (rx * rx + ry * ry).sqrt();
    let s_len = (sx * sx + sy * sy).sqrt();

    // Degenerate segments collapse to point-on-segment tests
    if r_len <= tolerance || s_len <= tolerance {
        let (pt, a, b) = if r_len <= tolerance { (p1, q1, q2) } else { (q1, p1, p2) };
        return if distance_to_segment(pt, a, b) <= tolerance {
            Contact::Point { at: pt }
        } else {
            Contact::None
        };
    }

    let collinear =
        distance_to_line(q1, p1, p2) <= tolerance && distance_to_line(q2, p1, p2) <= tolerance;
    if collinear {
        return collinear_contact(p1, p2, q1, q2, r_len, tolerance);
    }

    let denom = cross(rx, ry, sx, sy);
    if denom.abs() > 1e-12 * r_len * s_len {
        let (qpx, qpy) = (q1.x - p1.x, q1.y - p1.y);
        let t = cross(qpx, qpy, sx, sy) / denom;
        let u = cross(qpx, qpy, rx, ry) / denom;
        let (tt, tu) = (tolerance / r_len, tolerance / s_len);
        if t >= -tt && t <= 1.0 + tt && u >= -tu && u <= 1.0 + tu {
            let t = t.clamp(0.0, 1.0);
            return Contact::Point {
                at: Point::new(p1.x + rx * t, p1.y + ry * t),
            };
        }
    }

    // Shallow angles: an endpoint may sit on the other segment even though
    // the lines meet far away
    for (pt, a, b) in [(q1, p1, p2), (q2, p1, p2), (p1, q1, q2), (p2, q1, q2)] {
        if distance_to_segment(pt, a, b) <= tolerance {
            return Contact::Point { at: pt };
        }
    }

    Contact::None
}

fn collinear_contact(p1: Point, p2: Point, q1: Point, q2: Point, r_len: f64, tolerance: f64) -> Contact {
    let (rx, ry) = (p2.x - p1.x, p2.y - p1.y);
    let len_sq = r_len * r_len;
    let tq1 = dot(q1.x - p1.x, q1.y - p1.y, rx, ry) / len_sq;
    let tq2 = dot(q2.x - p1.x, q2.y - p1.y, rx, ry) / len_sq;

    let lo = tq1.min(tq2).max(0.0);
    let hi = tq1.max(tq2).min(1.0);
    let slack = tolerance / r_len;

    if lo > hi + slack {
        return Contact::None;
    }

    let at = |t: f64| Point::new(p1.x + rx * t, p1.y + ry * t);
    if hi - lo <= slack {
        Contact::Point { at: at(lo.min(1.0)) }
    } else {
        Contact::Overlap {
            start: at(lo),
            end: at(hi),
        }
    }
}

/// Edges of a ring as `(start, end)` pairs, wrapping around.
pub(crate) fn ring_edges(ring: &[Point]) -> Vec<(Point, Point)> {
    let points = open_ring(ring);
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    (0..n).map(|i| (points[i], points[(i + 1) % n])).collect()
}

// ============================================================================
// POLYGON INTERSECTION TEST
// ============================================================================

/// True if the two polygons share any interior or boundary point.
///
/// Edge contact of any kind (crossing, touching, collinear overlap) counts,
/// and so does one polygon lying entirely within the other. A polygon that
/// sits inside the other's hole does not intersect it.
pub fn intersects(a: &Polygon, b: &Polygon) -> bool {
    let (Some(ba), Some(bb)) = (a.bounding_box(), b.bounding_box()) else {
        return false;
    };
    let tolerance = Tolerance::for_bounds(&ba.union(&bb));
    if !ba.touches(&bb, tolerance.snap) {
        return false;
    }

    // ## Rust Lesson #16: flat_map
    //
    // Every ring contributes zero or more edges; flat_map flattens the
    // per-ring lists into one sequence without an intermediate Vec of Vecs.
    let edges_b: Vec<(Point, Point)> = b.rings().flat_map(|r| ring_edges(r)).collect();
    for ring in a.rings() {
        let Some(ring_bounds) = Bounds::of_points(ring) else {
            continue;
        };
        if !ring_bounds.touches(&bb, tolerance.snap) {
            continue;
        }
        for (p1, p2) in ring_edges(ring) {
            for &(q1, q2) in &edges_b {
                if segment_contact(p1, p2, q1, q2, tolerance.snap) != Contact::None {
                    return true;
                }
            }
        }
    }

    // No edge contact: either nested or apart
    match (a.shell.first(), b.shell.first()) {
        (Some(&pa), Some(&pb)) => polygon_contains_point(b, pa) || polygon_contains_point(a, pb),
        _ => false,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn point_inside_square() {
        let sq = rect(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_ring(Point::new(5.0, 5.0), &sq.shell));
        assert!(!point_in_ring(Point::new(15.0, 5.0), &sq.shell));
        assert!(!point_in_ring(Point::new(-1.0, 5.0), &sq.shell));
    }

    #[test]
    fn boundary_counts_as_inside() {
        let sq = rect(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_ring(Point::new(10.0, 5.0), &sq.shell));
        assert!(point_in_ring(Point::new(0.0, 0.0), &sq.shell));
        assert!(point_in_ring(Point::new(5.0, 10.0), &sq.shell));
    }

    #[test]
    fn holes_exclude_but_their_edges_do_not() {
        let poly = Polygon::with_holes(
            rect(0.0, 0.0, 10.0, 10.0).shell,
            vec![rect(4.0, 4.0, 6.0, 6.0).shell],
        );
        assert!(polygon_contains_point(&poly, Point::new(1.0, 1.0)));
        assert!(!polygon_contains_point(&poly, Point::new(5.0, 5.0)));
        assert!(polygon_contains_point(&poly, Point::new(4.0, 5.0)));
        assert!(!polygon_contains_point(&poly, Point::new(11.0, 5.0)));
    }

    #[test]
    fn crossing_segments_meet_once() {
        let c = segment_contact(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
            1e-9,
        );
        match c {
            Contact::Point { at } => {
                assert!((at.x - 5.0).abs() < 1e-10);
                assert!((at.y - 5.0).abs() < 1e-10);
            }
            other => panic!("expected a crossing, got {:?}", other),
        }
    }

    #[test]
    fn parallel_segments_do_not_meet() {
        let c = segment_contact(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
            1e-9,
        );
        assert_eq!(c, Contact::None);
    }

    #[test]
    fn collinear_segments_share_a_stretch() {
        let c = segment_contact(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, 0.0),
            Point::new(1.5, 0.0),
            1e-9,
        );
        assert_eq!(
            c,
            Contact::Overlap {
                start: Point::new(0.5, 0.0),
                end: Point::new(1.0, 0.0),
            }
        );
    }

    #[test]
    fn t_junction_touches_at_endpoint() {
        let c = segment_contact(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 3.0),
            1e-9,
        );
        assert_eq!(c, Contact::Point { at: Point::new(1.0, 0.0) });
    }

    #[test]
    fn overlapping_squares_intersect() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(0.5, 0.0, 1.5, 1.0);
        assert!(intersects(&a, &b));
        assert!(intersects(&b, &a));
    }

    #[test]
    fn nested_squares_intersect() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let c = rect(0.2, 0.2, 0.4, 0.4);
        assert!(intersects(&a, &c));
        assert!(intersects(&c, &a));
    }

    #[test]
    fn edge_sharing_squares_intersect() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 0.0, 2.0, 1.0);
        assert!(intersects(&a, &b));
    }

    #[test]
    fn far_apart_squares_do_not_intersect() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let d = rect(10.0, 10.0, 11.0, 11.0);
        assert!(!intersects(&a, &d));
    }

    #[test]
    fn polygon_in_hole_does_not_intersect() {
        let donut = Polygon::with_holes(
            rect(0.0, 0.0, 10.0, 10.0).shell,
            vec![rect(2.0, 2.0, 8.0, 8.0).shell],
        );
        let inner = rect(4.0, 4.0, 6.0, 6.0);
        assert!(!intersects(&donut, &inner));
        assert!(!intersects(&inner, &donut));
    }
}
