//! Approximate real-world measurements for display.
//!
//! Coordinates are degrees; these helpers turn them into metres. Lengths
//! are great-circle distances, areas are a flat degree-to-metre scaling of
//! the shell and therefore only good near the equator.

use crate::geometry::{ring_area, Point, Polygon};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two lon/lat points, in metres.
pub fn haversine_m(a: Point, b: Point) -> f64 {
    let d_lat = (b.y - a.y).to_radians();
    let d_lon = (b.x - a.x).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.y.to_radians().cos() * b.y.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Length of a polyline in metres. Zero for fewer than two points.
pub fn line_length_m(points: &[Point]) -> f64 {
    points.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Perimeter of the shell in metres.
pub fn perimeter_m(polygon: &Polygon) -> f64 {
    line_length_m(&polygon.shell)
}

/// Shell area scaled from square degrees to square metres. Holes ignored.
pub fn approx_area_m2(polygon: &Polygon) -> f64 {
    if polygon.shell.len() < 3 {
        return 0.0;
    }
    ring_area(&polygon.shell) * METERS_PER_DEGREE * METERS_PER_DEGREE
}

pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.2} m", meters)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

pub fn format_area(square_meters: f64) -> String {
    if square_meters < 10_000.0 {
        format!("{:.2} m²", square_meters)
    } else {
        format!("{:.2} ha", square_meters / 10_000.0)
    }
}

/// Arithmetic mean of the points; the origin for an empty slice.
pub fn centroid_of(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_m(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        // R * pi / 180
        assert!((d - 111_194.93).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_self() {
        let a = Point::new(29.0, 41.0);
        let b = Point::new(32.85, 39.93);
        assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-6);
        assert_eq!(haversine_m(a, a), 0.0);
    }

    #[test]
    fn line_length_sums_legs() {
        assert_eq!(line_length_m(&[]), 0.0);
        assert_eq!(line_length_m(&[Point::new(1.0, 1.0)]), 0.0);
        let pts = [Point::new(0.0, 0.0), Point::new(0.0, 1.0), Point::new(0.0, 2.0)];
        let whole = haversine_m(pts[0], pts[2]);
        assert!((line_length_m(&pts) - whole).abs() < 1e-6);
    }

    #[test]
    fn area_scales_square_degrees() {
        let p = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.001, 0.0),
            Point::new(0.001, 0.001),
            Point::new(0.0, 0.001),
        ]);
        let expected = 1e-6 * METERS_PER_DEGREE * METERS_PER_DEGREE;
        assert!((approx_area_m2(&p) - expected).abs() < 1e-6);
        assert!(perimeter_m(&p) > 440.0 && perimeter_m(&p) < 450.0);
    }

    #[test]
    fn formatting_switches_units() {
        assert_eq!(format_distance(999.994), "999.99 m");
        assert_eq!(format_distance(1500.0), "1.50 km");
        assert_eq!(format_area(9999.0), "9999.00 m²");
        assert_eq!(format_area(25_000.0), "2.50 ha");
    }

    #[test]
    fn centroid_is_the_mean() {
        assert_eq!(centroid_of(&[]), Point::new(0.0, 0.0));
        let c = centroid_of(&[Point::new(0.0, 0.0), Point::new(2.0, 4.0)]);
        assert_eq!(c, Point::new(1.0, 2.0));
    }
}
