//! Polygon difference by edge overlay.
//!
//! `difference(a, b)` returns the part of `a` not covered by `b`.
//!
//! # Algorithm
//!
//! 1. Split every edge of both polygons wherever it meets an edge of the
//!    other one (crossings, touches and collinear stretches). Split points
//!    are snapped through a spatial hash so both sides agree on vertices.
//! 2. Deduplicate the resulting sub-edges (shared boundary appears twice).
//! 3. Classify each sub-edge by probing a hair to its left and right: the
//!    edge is part of the answer's boundary when exactly one side is
//!    "inside `a` and outside `b`". Keep it oriented with that side on the
//!    left.
//! 4. Trace closed rings. At a vertex with several outgoing edges, take the
//!    first one clockwise from the way we came in, which keeps each ring
//!    around a single face even where faces touch at a point.
//! 5. Split any ring that passes the same vertex twice into simple loops.
//!    This happens where a hole touches the shell, or two holes touch, at
//!    a single point.
//! 6. Counter-clockwise loops are shells, clockwise loops are holes; each
//!    hole goes to the smallest shell around it.
//!
//! Every output polygon is run through [`Polygon::validate`] before it is
//! returned, so callers never receive geometry they would reject as input.
//!
//! Probes are tested against the input polygons, so the classification is
//! independent of edge orientation and of how the inputs wind.

use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use tracing::trace;

use crate::clip::{
    cross, crossing_test, dot, in_polygon_interior, intersects, ring_edges, segment_contact,
    Contact, Tolerance,
};
use crate::geometry::{close_ring, signed_area_of_points, Bounds, GeometryError, Point, Polygon};

/// Outcome of a difference.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryResult {
    /// Nothing is left.
    Empty,
    /// Exactly one polygon is left.
    Single(Polygon),
    /// Several disjoint polygons are left, in discovery order (no implied
    /// ranking).
    Multi(Vec<Polygon>),
    /// One of the inputs was malformed or the overlay could not be closed.
    Error(GeometryError),
}

impl GeometryResult {
    pub fn is_empty(&self) -> bool {
        matches!(self, GeometryResult::Empty)
    }

    /// Total area of the remaining polygons, `None` for `Error`.
    pub fn area(&self) -> Option<f64> {
        match self {
            GeometryResult::Empty => Some(0.0),
            GeometryResult::Single(p) => Some(p.area()),
            GeometryResult::Multi(ps) => Some(ps.iter().map(Polygon::area).sum()),
            GeometryResult::Error(_) => None,
        }
    }

    /// The remaining polygons as a list (empty for `Empty`).
    pub fn into_polygons(self) -> Result<Vec<Polygon>, GeometryError> {
        match self {
            GeometryResult::Empty => Ok(Vec::new()),
            GeometryResult::Single(p) => Ok(vec![p]),
            GeometryResult::Multi(ps) => Ok(ps),
            GeometryResult::Error(e) => Err(e),
        }
    }

    fn from_polygons(mut polygons: Vec<Polygon>) -> Self {
        match polygons.len() {
            0 => GeometryResult::Empty,
            1 => GeometryResult::Single(polygons.remove(0)),
            _ => GeometryResult::Multi(polygons),
        }
    }
}

/// Region of `a` not covered by `b`.
///
/// Disjoint inputs give back `a` unchanged, coordinate for coordinate.
pub fn difference(a: &Polygon, b: &Polygon) -> GeometryResult {
    if let Err(e) = a.validate() {
        return GeometryResult::Error(e);
    }
    if let Err(e) = b.validate() {
        return GeometryResult::Error(e);
    }
    if !intersects(a, b) {
        return GeometryResult::Single(a.clone());
    }

    let tolerance = Tolerance::for_pair(a, b);
    let polygons = match Overlay::build(a, b, tolerance).subtract() {
        Ok(polygons) => polygons,
        Err(e) => return GeometryResult::Error(e),
    };
    match polygons.iter().try_for_each(Polygon::validate) {
        Ok(()) => GeometryResult::from_polygons(polygons),
        Err(e) => GeometryResult::Error(e),
    }
}

/// Area shared by `a` and `b`, computed as `area(a) - area(a - b)`.
pub fn overlap_area(a: &Polygon, b: &Polygon) -> Result<f64, GeometryError> {
    let rest = difference(a, b).into_polygons()?;
    let remaining: f64 = rest.iter().map(Polygon::area).sum();
    Ok((a.area() - remaining).max(0.0))
}

// ============================================================================
// VERTEX SNAPPING
// ============================================================================

/// Spatial hash of vertices: grid cell -> vertex ids.
///
/// Cells are one tolerance wide, so any vertex within tolerance of a query
/// is in the query's cell or one of its eight neighbours.
struct VertexGrid {
    cell: f64,
    tolerance_sq: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
    points: Vec<Point>,
}

impl VertexGrid {
    fn new(tolerance: f64) -> Self {
        Self {
            cell: tolerance,
            tolerance_sq: tolerance * tolerance,
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    #[inline]
    fn cell_of(&self, p: Point) -> (i64, i64) {
        ((p.x / self.cell).floor() as i64, (p.y / self.cell).floor() as i64)
    }

    /// Id of the vertex at `p`, creating it if nothing is within tolerance.
    fn insert(&mut self, p: Point) -> usize {
        let (cx, cy) = self.cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &id in ids {
                        let q = self.points[id];
                        let (ex, ey) = (q.x - p.x, q.y - p.y);
                        if ex * ex + ey * ey <= self.tolerance_sq {
                            return id;
                        }
                    }
                }
            }
        }
        let id = self.points.len();
        self.points.push(p);
        self.cells.entry((cx, cy)).or_default().push(id);
        id
    }
}

// ============================================================================
// OVERLAY
// ============================================================================

/// An input edge and the points where it must be split.
struct Segment {
    start: Point,
    end: Point,
    splits: Vec<Point>,
}

impl Segment {
    fn new((start, end): (Point, Point)) -> Self {
        Self {
            start,
            end,
            splits: Vec::new(),
        }
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.start.x.min(self.end.x),
            min_y: self.start.y.min(self.end.y),
            max_x: self.start.x.max(self.end.x),
            max_y: self.start.y.max(self.end.y),
        }
    }

    /// Start, splits and end, ordered along the segment.
    fn ordered_points(&self) -> Vec<Point> {
        let (dx, dy) = (self.end.x - self.start.x, self.end.y - self.start.y);
        let along = |p: &Point| dot(p.x - self.start.x, p.y - self.start.y, dx, dy);

        let mut points = Vec::with_capacity(self.splits.len() + 2);
        points.push(self.start);
        points.extend(self.splits.iter().copied());
        points.push(self.end);
        points.sort_by(|a, b| along(a).total_cmp(&along(b)));
        points
    }
}

struct Overlay<'a> {
    subject: &'a Polygon,
    clip: &'a Polygon,
    tolerance: Tolerance,
    vertices: VertexGrid,
    /// Undirected sub-edges as vertex id pairs, first occurrence order.
    edges: Vec<(usize, usize)>,
}

impl<'a> Overlay<'a> {
    fn build(subject: &'a Polygon, clip: &'a Polygon, tolerance: Tolerance) -> Self {
        let mut subject_segments: Vec<Segment> = subject
            .rings()
            .flat_map(|r| ring_edges(r))
            .map(Segment::new)
            .collect();
        let mut clip_segments: Vec<Segment> = clip
            .rings()
            .flat_map(|r| ring_edges(r))
            .map(Segment::new)
            .collect();

        // Cross-split: only edges from different polygons need it, each
        // input polygon is already free of self-intersections
        for s in subject_segments.iter_mut() {
            let s_bounds = s.bounds();
            for c in clip_segments.iter_mut() {
                if !s_bounds.touches(&c.bounds(), tolerance.snap) {
                    continue;
                }
                match segment_contact(s.start, s.end, c.start, c.end, tolerance.snap) {
                    Contact::None => {}
                    Contact::Point { at } => {
                        s.splits.push(at);
                        c.splits.push(at);
                    }
                    Contact::Overlap { start, end } => {
                        s.splits.extend([start, end]);
                        c.splits.extend([start, end]);
                    }
                }
            }
        }

        let mut vertices = VertexGrid::new(tolerance.snap);
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut edges = Vec::new();

        for segment in subject_segments.iter().chain(clip_segments.iter()) {
            let mut ids: Vec<usize> = segment
                .ordered_points()
                .into_iter()
                .map(|p| vertices.insert(p))
                .collect();
            ids.dedup();

            for pair in ids.windows(2) {
                let (u, v) = (pair[0], pair[1]);
                if u == v {
                    continue;
                }
                if seen.insert((u.min(v), u.max(v))) {
                    edges.push((u, v));
                }
            }
        }

        trace!(
            vertices = vertices.points.len(),
            edges = edges.len(),
            "overlay graph built"
        );

        Self {
            subject,
            clip,
            tolerance,
            vertices,
            edges,
        }
    }

    /// Inside the subject and outside the clip polygon.
    #[inline]
    fn in_result(&self, p: Point) -> bool {
        in_polygon_interior(self.subject, p) && !in_polygon_interior(self.clip, p)
    }

    /// Boundary edges of the result, oriented with the result on the left.
    fn boundary_edges(&self) -> Vec<(usize, usize)> {
        let points = &self.vertices.points;
        let mut directed = Vec::new();

        for &(u, v) in &self.edges {
            let (p, q) = (points[u], points[v]);
            let (dx, dy) = (q.x - p.x, q.y - p.y);
            let len = (dx * dx + dy * dy).sqrt();
            if len == 0.0 {
                continue;
            }

            let h = self.tolerance.probe.min(len * 0.1);
            let (nx, ny) = (-dy / len * h, dx / len * h);
            let mid = Point::new((p.x + q.x) / 2.0, (p.y + q.y) / 2.0);

            let left = self.in_result(Point::new(mid.x + nx, mid.y + ny));
            let right = self.in_result(Point::new(mid.x - nx, mid.y - ny));

            match (left, right) {
                (true, false) => directed.push((u, v)),
                (false, true) => directed.push((v, u)),
                _ => {}
            }
        }

        directed
    }

    /// Run the overlay and return the polygons of `subject - clip`.
    fn subtract(&self) -> Result<Vec<Polygon>, GeometryError> {
        let directed = self.boundary_edges();
        let points = &self.vertices.points;
        let rings = trace_rings(&directed, points)?;

        // ## Rust Lesson #24: Partitioning
        //
        // `partition` splits one iterator into two collections by a
        // predicate - here shells (CCW, positive area) and holes (CW).
        let (shells, holes): (Vec<Vec<Point>>, Vec<Vec<Point>>) = rings
            .into_iter()
            .flat_map(split_pinches)
            .map(|ids| ids.into_iter().map(|id| points[id]).collect::<Vec<Point>>())
            .map(|ring| drop_collinear(ring, self.tolerance.snap))
            .filter(|ring| ring.len() >= 3 && signed_area_of_points(ring).abs() > self.tolerance.area)
            .partition(|ring| signed_area_of_points(ring) > 0.0);

        let mut assigned: Vec<Vec<Vec<Point>>> = vec![Vec::new(); shells.len()];
        for hole in holes {
            let probe = Point::new((hole[0].x + hole[1].x) / 2.0, (hole[0].y + hole[1].y) / 2.0);
            let owner = shells
                .iter()
                .enumerate()
                .filter(|(_, shell)| crossing_test(probe, shell))
                .min_by(|(_, a), (_, b)| {
                    signed_area_of_points(a).total_cmp(&signed_area_of_points(b))
                })
                .map(|(i, _)| i)
                .ok_or(GeometryError::OrphanHole)?;
            assigned[owner].push(hole);
        }

        Ok(shells
            .into_iter()
            .zip(assigned)
            .map(|(shell, holes)| Polygon {
                shell: close_ring(shell),
                holes: holes.into_iter().map(close_ring).collect(),
            })
            .collect())
    }
}

/// Follow directed edges into closed rings of vertex ids.
fn trace_rings(directed: &[(usize, usize)], points: &[Point]) -> Result<Vec<Vec<usize>>, GeometryError> {
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, &(u, _)) in directed.iter().enumerate() {
        outgoing.entry(u).or_default().push(i);
    }

    let mut used = vec![false; directed.len()];
    let mut rings = Vec::new();

    for start in 0..directed.len() {
        if used[start] {
            continue;
        }

        let mut ring = Vec::new();
        let mut current = start;
        let mut closed = false;

        for _ in 0..=directed.len() {
            used[current] = true;
            let (u, v) = directed[current];
            ring.push(u);

            let open = || GeometryError::OpenBoundary {
                x: points[v].x,
                y: points[v].y,
            };
            let candidates = outgoing.get(&v).ok_or_else(open)?;
            let next = next_edge(points[u], points[v], candidates, directed, points).ok_or_else(open)?;

            if next == start {
                closed = true;
                break;
            }
            if used[next] {
                return Err(open());
            }
            current = next;
        }

        if !closed {
            let p = points[ring.last().copied().unwrap_or(directed[start].0)];
            return Err(GeometryError::OpenBoundary { x: p.x, y: p.y });
        }
        rings.push(ring);
    }

    Ok(rings)
}

/// Break a traced ring into loops that visit each vertex once.
///
/// The loop between two visits of the same vertex is cut out as its own
/// ring. Each loop keeps the edge direction it was traced with, so the
/// result stays on its left and its winding still tells shell from hole.
fn split_pinches(ring: Vec<usize>) -> Vec<Vec<usize>> {
    let mut loops = Vec::new();
    let mut stack: Vec<usize> = Vec::with_capacity(ring.len());
    let mut position: HashMap<usize, usize> = HashMap::new();

    for id in ring {
        match position.get(&id).copied() {
            Some(at) => {
                let tail: Vec<usize> = stack.drain(at + 1..).collect();
                for v in &tail {
                    position.remove(v);
                }
                let mut cut = Vec::with_capacity(tail.len() + 1);
                cut.push(id);
                cut.extend(tail);
                loops.push(cut);
            }
            None => {
                position.insert(id, stack.len());
                stack.push(id);
            }
        }
    }

    loops.push(stack);
    loops.retain(|ids| ids.len() >= 3);
    loops
}

/// Pick the outgoing edge at `at` reached first turning clockwise from the
/// direction back towards `from`.
fn next_edge(
    from: Point,
    at: Point,
    candidates: &[usize],
    directed: &[(usize, usize)],
    points: &[Point],
) -> Option<usize> {
    let back = (from.y - at.y).atan2(from.x - at.x);

    candidates
        .iter()
        .map(|&edge| {
            let w = points[directed[edge].1];
            let out = (w.y - at.y).atan2(w.x - at.x);
            let mut turn = (back - out).rem_euclid(TAU);
            if turn <= 1e-12 {
                turn = TAU;
            }
            (edge, turn)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(edge, _)| edge)
}

/// Remove vertices lying on the straight line between their neighbours.
///
/// Splitting leaves such vertices wherever the other polygon touched an
/// edge without turning the result's boundary.
fn drop_collinear(mut ring: Vec<Point>, tolerance: f64) -> Vec<Point> {
    let mut changed = true;
    while changed && ring.len() >= 3 {
        changed = false;
        let n = ring.len();
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];

            let (ax, ay) = (next.x - prev.x, next.y - prev.y);
            let span = (ax * ax + ay * ay).sqrt();
            let off_line = if span == 0.0 {
                cur.distance(prev)
            } else {
                cross(ax, ay, cur.x - prev.x, cur.y - prev.y).abs() / span
            };
            let forward = dot(cur.x - prev.x, cur.y - prev.y, next.x - cur.x, next.y - cur.y) >= 0.0;

            if off_line <= tolerance && forward {
                ring.remove(i);
                changed = true;
                break;
            }
        }
    }
    ring
}

// ============================================================================
// TESTS
// ============================================================================
