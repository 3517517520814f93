//! `within`: features covered by a stored or ad-hoc polygon.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Result};
use basar_map::{
    affected_features, features_within_refs, CameraFeature, FeatureRef, JsonFileStore,
    PointFeature, Polygon, PolygonStore, ResolveFailure,
};
use serde::Serialize;

use super::common::{
    load_coordinates, load_features, print_json, read_json, reject, store_failure, Coordinates,
};
use super::{CoordsArgs, FeatureFiles};

#[derive(Serialize)]
struct WithinOutput<'a> {
    total: usize,
    points: Vec<&'a PointFeature>,
    cameras: Vec<&'a CameraFeature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refs: Option<Vec<FeatureRef>>,
}

pub fn cmd_within(
    store: &JsonFileStore,
    id: Option<u64>,
    coords: &CoordsArgs,
    files: &FeatureFiles,
    refs_path: Option<&Path>,
) -> Result<ExitCode> {
    // Wire rings either way; refs are filtered from those.
    let coordinates: Coordinates = match (id, load_coordinates(coords)?) {
        (Some(id), _) => match store.get_by_id(id) {
            Ok(record) => to_wire(&record.geometry),
            Err(e) => return store_failure(e),
        },
        (None, Some(coordinates)) => coordinates,
        (None, None) => bail!("give a polygon id or one of --coords / --coords-file"),
    };

    let polygon = match Polygon::from_coordinates(&coordinates).and_then(|p| {
        p.validate()?;
        Ok(p)
    }) {
        Ok(polygon) => polygon,
        Err(e) => return reject(ResolveFailure::from(&e)),
    };

    let (points, cameras) = load_features(files)?;
    let affected = affected_features(&polygon, &points, &cameras);

    let refs = match refs_path {
        Some(path) => {
            let refs: Vec<FeatureRef> = read_json(path)?;
            match features_within_refs(&coordinates, refs) {
                Ok(kept) => Some(kept),
                Err(e) => return reject(ResolveFailure::from(&e)),
            }
        }
        None => None,
    };

    print_json(&WithinOutput {
        total: affected.total() + refs.as_ref().map_or(0, Vec::len),
        points: affected.points,
        cameras: affected.cameras,
        refs,
    })?;
    Ok(ExitCode::SUCCESS)
}

fn to_wire(polygon: &Polygon) -> Coordinates {
    polygon
        .to_coordinates()
        .into_iter()
        .map(|ring| ring.into_iter().map(|[x, y]| vec![x, y]).collect())
        .collect()
}
