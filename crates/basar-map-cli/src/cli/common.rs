//! Common utilities shared across CLI commands.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use basar_map::{CameraFeature, PointFeature, ResolveFailure, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CoordsArgs, FeatureFiles};

/// Exit code for requests the library refused (as opposed to crashes).
pub const EXIT_REJECTED: u8 = 2;

/// Raw wire rings: `[[[x, y], ...], ...]`.
pub type Coordinates = Vec<Vec<Vec<f64>>>;

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{}", json);
    Ok(())
}

#[derive(Serialize)]
struct FailureOutput<'a> {
    #[serde(flatten)]
    failure: &'a ResolveFailure,
    message: String,
}

/// Print a failure body and hand back the matching exit code.
pub fn reject(failure: ResolveFailure) -> Result<ExitCode> {
    tracing::warn!(reason = %failure.message(), "request rejected");
    print_json(&FailureOutput {
        message: failure.message(),
        failure: &failure,
    })?;
    Ok(ExitCode::from(EXIT_REJECTED))
}

/// Missing records are a rejection; anything else is a real error.
pub fn store_failure(e: StoreError) -> Result<ExitCode> {
    if let StoreError::NotFound(id) = e {
        return reject(ResolveFailure::NotFound { id });
    }
    Err(e.into())
}

/// Read and decode a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Rings from `--coords` or `--coords-file`, `None` when neither is given.
pub fn load_coordinates(args: &CoordsArgs) -> Result<Option<Coordinates>> {
    match (&args.coords, &args.coords_file) {
        (Some(inline), _) => {
            let coords = serde_json::from_str(inline).context("--coords is not a JSON ring list")?;
            Ok(Some(coords))
        }
        (None, Some(path)) => Ok(Some(read_json(path)?)),
        (None, None) => Ok(None),
    }
}

/// Like [`load_coordinates`], for commands where rings are mandatory.
pub fn require_coordinates(args: &CoordsArgs) -> Result<Coordinates> {
    match load_coordinates(args)? {
        Some(coords) => Ok(coords),
        None => bail!("one of --coords or --coords-file is required"),
    }
}

/// Point and camera lists from `--points` / `--cameras` (empty when absent).
pub fn load_features(files: &FeatureFiles) -> Result<(Vec<PointFeature>, Vec<CameraFeature>)> {
    let points = match &files.points {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let cameras = match &files.cameras {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    Ok((points, cameras))
}

impl FeatureFiles {
    pub fn any(&self) -> bool {
        self.points.is_some() || self.cameras.is_some()
    }
}
