//! `export`: SVG drawing of the store.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use basar_map::{polygons_to_svg, JsonFileStore, PolygonStore, SvgStyle};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct ExportOutput<'a> {
    output: &'a Path,
    polygons: usize,
}

pub fn cmd_export(store: &JsonFileStore, output: &Path, style: &SvgStyle) -> Result<ExitCode> {
    let records = store.get_all()?;
    let svg = polygons_to_svg(&records, style).context("failed to render SVG")?;
    fs::write(output, svg).with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), polygons = records.len(), "SVG written");

    super::common::print_json(&ExportOutput {
        output,
        polygons: records.len(),
    })?;
    Ok(ExitCode::SUCCESS)
}
