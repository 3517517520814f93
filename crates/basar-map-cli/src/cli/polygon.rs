//! Polygon commands: list, get, delete, create, update, measure.

use std::process::ExitCode;

use anyhow::Result;
use basar_map::geometry::open_ring;
use basar_map::measure::{approx_area_m2, centroid_of, format_area, format_distance, perimeter_m};
use basar_map::{
    affected_features, resolve, resolve_and_create, AffectedFeatures, CameraFeature,
    CreatePolygonRequest, JsonFileStore, NewPolygon, PointFeature, PolygonId, PolygonResponse,
    Polygon, PolygonStore, ResolveFailure,
};
use serde::Serialize;
use tracing::info;

use super::common::{load_features, print_json, reject, require_coordinates, store_failure};
use super::{FeatureFiles, PolygonArgs};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedOutput<'a> {
    #[serde(flatten)]
    polygon: PolygonResponse,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<PolygonId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    affected: Option<AffectedFeatures<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
    coordinates: Vec<Vec<[f64; 2]>>,
    original_area: f64,
    result_area: f64,
    area_reduction_percent: Option<f64>,
    subtracted: Vec<PolygonId>,
    skipped: Vec<PolygonId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeasureOutput {
    id: PolygonId,
    name: String,
    area_m2: f64,
    area: String,
    perimeter_m: f64,
    perimeter: String,
    centroid: [f64; 2],
}

#[derive(Serialize)]
struct DeleteOutput {
    id: PolygonId,
    deleted: bool,
}

/// Features covered by `polygon`, when feature files were given.
fn affected<'a>(
    files: &FeatureFiles,
    polygon: &Polygon,
    points: &'a [PointFeature],
    cameras: &'a [CameraFeature],
) -> Option<AffectedFeatures<'a>> {
    if !files.any() {
        return None;
    }
    let affected = affected_features(polygon, points, cameras);
    if !affected.is_empty() {
        info!(count = affected.total(), "polygon covers existing features");
    }
    Some(affected)
}

pub fn cmd_list(store: &JsonFileStore) -> Result<ExitCode> {
    let records = store.get_all()?;
    let responses: Vec<PolygonResponse> = records.iter().map(PolygonResponse::from).collect();
    print_json(&responses)?;
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_get(store: &JsonFileStore, id: PolygonId) -> Result<ExitCode> {
    match store.get_by_id(id) {
        Ok(record) => {
            print_json(&PolygonResponse::from(&record))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => store_failure(e),
    }
}

pub fn cmd_delete(store: &mut JsonFileStore, id: PolygonId) -> Result<ExitCode> {
    if !store.delete(id)? {
        return reject(ResolveFailure::NotFound { id });
    }
    print_json(&DeleteOutput { id, deleted: true })?;
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_create(
    store: &mut JsonFileStore,
    args: PolygonArgs,
    no_resolve: bool,
    dry_run: bool,
    files: &FeatureFiles,
) -> Result<ExitCode> {
    let request = CreatePolygonRequest {
        coordinates: require_coordinates(&args.coords)?,
        name: args.name,
        description: args.description,
    };
    let submitted = match request.to_polygon() {
        Ok(polygon) => polygon,
        Err(e) => return reject(ResolveFailure::from(&e)),
    };
    let (points, cameras) = load_features(files)?;

    if dry_run {
        return match resolve(&*store, &submitted) {
            Ok(plan) => {
                print_json(&PlanOutput {
                    coordinates: plan.polygon.to_coordinates(),
                    original_area: plan.original_area,
                    result_area: plan.result_area,
                    area_reduction_percent: plan.area_reduction_percent(),
                    subtracted: plan.subtracted,
                    skipped: plan.skipped,
                })?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => reject(ResolveFailure::from(&e)),
        };
    }

    if no_resolve {
        let record = match store.create(NewPolygon::new(request.name, request.description, submitted)) {
            Ok(record) => record,
            Err(e) => return store_failure(e),
        };
        print_json(&SavedOutput {
            affected: affected(files, &record.geometry, &points, &cameras),
            polygon: PolygonResponse::from(&record),
            message: "Polygon created successfully".to_string(),
            skipped: Vec::new(),
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    match resolve_and_create(store, request.name, request.description, &submitted) {
        Ok(resolution) => {
            print_json(&SavedOutput {
                affected: affected(files, &resolution.record.geometry, &points, &cameras),
                polygon: PolygonResponse::from(&resolution),
                message: resolution.message(),
                skipped: resolution.skipped.clone(),
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => reject(ResolveFailure::from(&e)),
    }
}

pub fn cmd_update(
    store: &mut JsonFileStore,
    id: PolygonId,
    args: PolygonArgs,
    files: &FeatureFiles,
) -> Result<ExitCode> {
    if !store.exists(id)? {
        return reject(ResolveFailure::NotFound { id });
    }
    let request = CreatePolygonRequest {
        coordinates: require_coordinates(&args.coords)?,
        name: args.name,
        description: args.description,
    };
    let replacement = match request.into_new_polygon() {
        Ok(polygon) => polygon,
        Err(e) => return reject(ResolveFailure::from(&e)),
    };
    let (points, cameras) = load_features(files)?;

    let record = match store.update(id, replacement) {
        Ok(record) => record,
        Err(e) => return store_failure(e),
    };
    print_json(&SavedOutput {
        affected: affected(files, &record.geometry, &points, &cameras),
        polygon: PolygonResponse::from(&record),
        message: "Polygon updated successfully".to_string(),
        skipped: Vec::new(),
    })?;
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_measure(store: &JsonFileStore, id: PolygonId) -> Result<ExitCode> {
    let record = match store.get_by_id(id) {
        Ok(record) => record,
        Err(e) => return store_failure(e),
    };
    let area_m2 = approx_area_m2(&record.geometry);
    let perimeter = perimeter_m(&record.geometry);
    let centroid = centroid_of(&open_ring(&record.geometry.shell));

    print_json(&MeasureOutput {
        id: record.id,
        name: record.name,
        area_m2,
        area: format_area(area_m2),
        perimeter_m: perimeter,
        perimeter: format_distance(perimeter),
        centroid: centroid.into(),
    })?;
    Ok(ExitCode::SUCCESS)
}
