//! SVG export of stored polygons.
//!
//! One `<path>` per record, holes as extra sub-paths under the even-odd
//! fill rule. Latitude grows upwards and SVG `y` grows downwards, so `y` is
//! flipped against the top of the bounds.

use std::fmt::Write as _;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Bounds, Point};
use crate::store::PolygonRecord;

/// Error type for SVG export.
#[derive(Debug, Error)]
pub enum SvgError {
    #[error("no polygons to export")]
    NoPolygons,
    #[error("failed to write SVG: {0}")]
    Write(String),
    #[error("SVG output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgStyle {
    /// Output width in pixels; the height follows the aspect ratio.
    pub width: f64,
    pub stroke: String,
    /// Stroke width in pixels, independent of the map scale.
    pub stroke_width: f64,
    pub fill: String,
    pub fill_opacity: f64,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            width: 800.0,
            stroke: "#1f4e79".to_string(),
            stroke_width: 1.0,
            fill: "#9ecae1".to_string(),
            fill_opacity: 0.5,
        }
    }
}

/// Render `records` as a standalone SVG document.
pub fn polygons_to_svg(records: &[PolygonRecord], style: &SvgStyle) -> Result<String, SvgError> {
    let bounds = records
        .iter()
        .filter_map(|r| r.geometry.bounding_box())
        .reduce(|a, b| a.union(&b))
        .ok_or(SvgError::NoPolygons)?;

    let view_w = bounds.width().max(f64::MIN_POSITIVE);
    let view_h = bounds.height().max(f64::MIN_POSITIVE);
    let height = style.width * view_h / view_w;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    svg.push_attribute(("width", style.width.to_string().as_str()));
    svg.push_attribute(("height", height.to_string().as_str()));
    svg.push_attribute(("viewBox", format!("0 0 {} {}", view_w, view_h).as_str()));
    write(&mut writer, Event::Start(svg))?;

    for record in records {
        let mut path = BytesStart::new("path");
        path.push_attribute(("data-id", record.id.to_string().as_str()));
        path.push_attribute(("data-name", record.name.as_str()));
        path.push_attribute(("d", path_data(record, &bounds).as_str()));
        path.push_attribute(("fill", style.fill.as_str()));
        path.push_attribute(("fill-opacity", style.fill_opacity.to_string().as_str()));
        path.push_attribute(("fill-rule", "evenodd"));
        path.push_attribute(("stroke", style.stroke.as_str()));
        path.push_attribute(("stroke-width", style.stroke_width.to_string().as_str()));
        path.push_attribute(("vector-effect", "non-scaling-stroke"));
        write(&mut writer, Event::Empty(path))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("svg")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SvgError> {
    writer
        .write_event(event)
        .map_err(|e| SvgError::Write(e.to_string()))
}

/// `M x y L x y ... Z` for every ring, in view coordinates.
fn path_data(record: &PolygonRecord, bounds: &Bounds) -> String {
    let to_view = |p: &Point| (p.x - bounds.min_x, bounds.max_y - p.y);
    let mut d = String::new();
    for ring in record.geometry.rings() {
        let mut points = ring.iter();
        // Closed rings repeat the first point; `Z` closes them instead.
        let count = ring.len().saturating_sub(1);
        if let Some(first) = points.next() {
            let (x, y) = to_view(first);
            let _ = write!(d, "M {} {}", x, y);
        }
        for p in points.take(count.saturating_sub(1)) {
            let (x, y) = to_view(p);
            let _ = write!(d, " L {} {}", x, y);
        }
        d.push_str(" Z ");
    }
    d.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use chrono::Utc;

    fn record(id: u64, name: &str, geometry: Polygon) -> PolygonRecord {
        PolygonRecord {
            id,
            name: name.into(),
            description: None,
            geometry,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn square(x: f64, y: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x, y),
            Point::new(x + 1.0, y),
            Point::new(x + 1.0, y + 1.0),
            Point::new(x, y + 1.0),
        ])
    }

    #[test]
    fn empty_export_is_an_error() {
        assert!(matches!(
            polygons_to_svg(&[], &SvgStyle::default()),
            Err(SvgError::NoPolygons)
        ));
    }

    #[test]
    fn one_path_per_record_with_flipped_y() {
        let records = vec![record(1, "a", square(0.0, 0.0)), record(2, "b", square(1.0, 1.0))];
        let svg = polygons_to_svg(&records, &SvgStyle::default()).unwrap();

        assert!(svg.starts_with("<?xml"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(r#"viewBox="0 0 2 2""#));
        assert!(svg.contains(r#"height="800""#));
        // (0, 0) is the bottom-left corner of a 2x2 map.
        assert!(svg.contains(r#"d="M 0 2 L 1 2 L 1 1 L 0 1 Z""#));
        assert!(svg.contains(r#"data-id="2""#));
        assert!(svg.contains(r#"fill-rule="evenodd""#));
    }

    #[test]
    fn holes_become_sub_paths() {
        let donut = Polygon::with_holes(
            vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 4.0),
                Point::new(0.0, 4.0),
            ],
            vec![vec![
                Point::new(1.0, 1.0),
                Point::new(1.0, 3.0),
                Point::new(3.0, 3.0),
                Point::new(3.0, 1.0),
            ]],
        );
        let svg = polygons_to_svg(&[record(1, "donut", donut)], &SvgStyle::default()).unwrap();
        assert_eq!(svg.matches('M').count(), 2);
    }

    #[test]
    fn names_are_escaped() {
        let svg =
            polygons_to_svg(&[record(1, "a <b> & \"c\"", square(0.0, 0.0))], &SvgStyle::default())
                .unwrap();
        assert!(svg.contains("&lt;b&gt;"));
        assert!(svg.contains("&amp;"));
    }
}
