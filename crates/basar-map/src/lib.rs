//! # basar-map
//!
//! Georeferenced map features with non-overlapping polygons.
//!
//! New polygons are cut back against the polygons already stored, so the
//! stored set never overlaps. The pieces:
//!
//! - [`geometry`]: points, rings, polygons, validation
//! - [`clip`] and [`overlay`]: containment, intersection and difference
//! - [`store`] and [`file_store`]: where polygons live
//! - [`resolve`]: the cut-back itself
//! - [`spatial`]: which point features a polygon covers
//!
//! ## Rust Lesson #7: Modules
//!
//! Every module must be declared. `pub mod foo;` loads `foo.rs` and exports
//! it; `pub use foo::Bar;` re-exports `Bar` at the crate root so callers can
//! write `basar_map::Bar`.

pub mod clip;
pub mod dto;
pub mod features;
pub mod file_store;
pub mod geometry;
pub mod measure;
pub mod overlay;
pub mod resolve;
pub mod spatial;
pub mod store;
pub mod svg;

// Re-export common types at crate root for convenience.
pub use clip::{intersects, point_in_ring, polygon_contains_point};
pub use dto::{CreatePolygonRequest, PolygonResponse, ResolveFailure};
pub use features::{CameraFeature, FeatureRef, PointFeature};
pub use file_store::JsonFileStore;
pub use geometry::{GeometryError, Point, Polygon, Ring, SRID};
pub use overlay::{difference, overlap_area, GeometryResult};
pub use resolve::{resolve, resolve_and_create, Resolution, ResolveError, ResolvedGeometry};
pub use spatial::{affected_features, features_within, features_within_refs, AffectedFeatures, Located};
pub use store::{MemoryStore, NewPolygon, PolygonId, PolygonRecord, PolygonStore, StoreError};
pub use svg::{polygons_to_svg, SvgError, SvgStyle};
