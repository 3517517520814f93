//! Overlap resolution.
//!
//! A submitted polygon gives way to every stored polygon it overlaps: the
//! stored polygons are subtracted from it, oldest first, and whatever is
//! left gets stored. Stored polygons therefore never overlap (they may
//! still share boundary).
//!
//! When a subtraction splits the running result into several pieces, the
//! piece with the largest shell area is kept and the rest is dropped.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geometry::{ring_area, GeometryError, Polygon};
use crate::overlay::{difference, GeometryResult};
use crate::store::{NewPolygon, PolygonId, PolygonRecord, PolygonStore, StoreError};

/// Why a submission could not be stored.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing of the submitted polygon is left once existing polygons
    /// are removed.
    #[error("polygon is completely covered by existing polygons")]
    FullyContained,
    #[error("invalid polygon geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of planning a submission without storing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGeometry {
    /// What would be stored.
    pub polygon: Polygon,
    pub original_area: f64,
    pub result_area: f64,
    /// Ids of stored polygons that were subtracted.
    pub subtracted: Vec<PolygonId>,
    /// Ids of stored polygons whose geometry could not be processed.
    pub skipped: Vec<PolygonId>,
}

/// Result of a stored submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: PolygonRecord,
    pub original_area: f64,
    pub result_area: f64,
    pub skipped: Vec<PolygonId>,
}

impl Resolution {
    /// Share of the submitted area that was removed, in percent.
    ///
    /// `None` unless the stored polygon is strictly smaller than the one
    /// submitted.
    pub fn area_reduction_percent(&self) -> Option<f64> {
        reduction_percent(self.original_area, self.result_area)
    }

    /// One-line human summary of the outcome.
    pub fn message(&self) -> String {
        match self.area_reduction_percent() {
            Some(percent) => format!(
                "Polygon created successfully. Note: {:.1}% of the original area was removed due to intersection with existing polygons.",
                percent
            ),
            None => "Polygon created successfully".to_string(),
        }
    }
}

impl ResolvedGeometry {
    pub fn area_reduction_percent(&self) -> Option<f64> {
        reduction_percent(self.original_area, self.result_area)
    }
}

fn reduction_percent(original: f64, result: f64) -> Option<f64> {
    if original > 0.0 && original > result {
        Some((original - result) / original * 100.0)
    } else {
        None
    }
}

/// Work out what would be stored for `submitted`, without writing.
pub fn resolve<S: PolygonStore + ?Sized>(
    store: &S,
    submitted: &Polygon,
) -> Result<ResolvedGeometry, ResolveError> {
    submitted.validate()?;
    let original_area = submitted.area();

    let intersecting = store.find_intersecting(submitted)?;
    debug!(count = intersecting.len(), "intersecting polygons found");

    let mut result = submitted.clone();
    let mut subtracted = Vec::new();
    let mut skipped = Vec::new();

    for existing in &intersecting {
        match difference(&result, &existing.geometry) {
            GeometryResult::Empty => {
                debug!(id = existing.id, "submission fully covered");
                return Err(ResolveError::FullyContained);
            }
            GeometryResult::Single(polygon) => {
                debug!(id = existing.id, area = polygon.area(), "subtracted");
                result = polygon;
                subtracted.push(existing.id);
            }
            GeometryResult::Multi(pieces) => {
                debug!(id = existing.id, pieces = pieces.len(), "subtraction split the polygon");
                // Non-empty by construction of Multi; keep `result` otherwise.
                if let Some(largest) = largest_piece(pieces) {
                    result = largest;
                }
                subtracted.push(existing.id);
            }
            GeometryResult::Error(e) => {
                warn!(id = existing.id, error = %e, "skipping polygon, geometry computation failed");
                skipped.push(existing.id);
            }
        }
    }

    let result_area = result.area();
    Ok(ResolvedGeometry {
        polygon: result,
        original_area,
        result_area,
        subtracted,
        skipped,
    })
}

/// Resolve `submitted` against the store and persist what is left.
///
/// The store is only written once, at the end. Every error leaves it as it
/// was.
pub fn resolve_and_create<S: PolygonStore + ?Sized>(
    store: &mut S,
    name: impl Into<String>,
    description: Option<String>,
    submitted: &Polygon,
) -> Result<Resolution, ResolveError> {
    let resolved = resolve(&*store, submitted)?;
    let record = store.create(NewPolygon::new(name, description, resolved.polygon))?;

    let resolution = Resolution {
        record,
        original_area: resolved.original_area,
        result_area: resolved.result_area,
        skipped: resolved.skipped,
    };
    info!(
        id = resolution.record.id,
        reduction = resolution.area_reduction_percent().unwrap_or(0.0),
        skipped = resolution.skipped.len(),
        "polygon resolved"
    );
    Ok(resolution)
}

/// Piece with the largest shell area. Ties keep the earlier piece.
fn largest_piece(pieces: Vec<Polygon>) -> Option<Polygon> {
    let mut best: Option<(f64, Polygon)> = None;
    for piece in pieces {
        let area = ring_area(&piece.shell);
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, piece)),
        }
    }
    best.map(|(_, polygon)| polygon)
}
