//! CLI command implementations.
//!
//! - `list`, `get`, `delete` - read and remove stored polygons
//! - `create`, `update` - store polygons (create cuts back against neighbours)
//! - `measure` - area and perimeter in metres
//! - `within` - features covered by a polygon
//! - `export` - SVG drawing of the store

pub mod common;
pub mod export;
pub mod polygon;
pub mod within;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use basar_map::JsonFileStore;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Non-overlapping georeferenced polygons")]
pub struct Cli {
    /// YAML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON store file (overrides `store_path` from the config).
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every stored polygon.
    List,
    /// Print one polygon.
    Get { id: u64 },
    /// Remove a polygon.
    Delete { id: u64 },
    /// Store a new polygon. Overlap with existing polygons is removed first.
    Create {
        #[command(flatten)]
        polygon: PolygonArgs,
        /// Store the geometry as given, without removing overlap.
        #[arg(long)]
        no_resolve: bool,
        /// Report what would be stored without storing it.
        #[arg(long, conflicts_with = "no_resolve")]
        dry_run: bool,
        #[command(flatten)]
        features: FeatureFiles,
    },
    /// Replace the name, description and geometry of a polygon.
    Update {
        id: u64,
        #[command(flatten)]
        polygon: PolygonArgs,
        #[command(flatten)]
        features: FeatureFiles,
    },
    /// Approximate area and perimeter of a polygon, in metres.
    Measure { id: u64 },
    /// List the features that fall inside a polygon.
    Within {
        /// Stored polygon to test against.
        #[arg(conflicts_with_all = ["coords", "coords_file"])]
        id: Option<u64>,
        #[command(flatten)]
        coords: CoordsArgs,
        #[command(flatten)]
        features: FeatureFiles,
        /// JSON file with `[{"id", "x", "y"}, ...]` references.
        #[arg(long)]
        refs: Option<PathBuf>,
    },
    /// Write every stored polygon to an SVG file.
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Name, description and rings of a submitted polygon.
#[derive(Args, Debug)]
pub struct PolygonArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub coords: CoordsArgs,
}

/// Rings as `[[[x, y], ...], ...]`, inline or from a file.
#[derive(Args, Debug)]
pub struct CoordsArgs {
    #[arg(long, conflicts_with = "coords_file")]
    pub coords: Option<String>,
    #[arg(long)]
    pub coords_file: Option<PathBuf>,
}

/// Point and camera feature lists, as JSON files.
#[derive(Args, Debug)]
pub struct FeatureFiles {
    #[arg(long)]
    pub points: Option<PathBuf>,
    #[arg(long)]
    pub cameras: Option<PathBuf>,
}

pub fn dispatch(cli: Cli, config: Config) -> Result<ExitCode> {
    let store_path = cli.store.unwrap_or_else(|| config.store_path.clone());
    let mut store = JsonFileStore::open(&store_path)
        .with_context(|| format!("failed to open store {}", store_path.display()))?;

    match cli.command {
        Command::List => polygon::cmd_list(&store),
        Command::Get { id } => polygon::cmd_get(&store, id),
        Command::Delete { id } => polygon::cmd_delete(&mut store, id),
        Command::Create {
            polygon,
            no_resolve,
            dry_run,
            features,
        } => polygon::cmd_create(&mut store, polygon, no_resolve, dry_run, &features),
        Command::Update {
            id,
            polygon,
            features,
        } => polygon::cmd_update(&mut store, id, polygon, &features),
        Command::Measure { id } => polygon::cmd_measure(&store, id),
        Command::Within {
            id,
            coords,
            features,
            refs,
        } => within::cmd_within(&store, id, &coords, &features, refs.as_deref()),
        Command::Export { output } => export::cmd_export(&store, &output, &config.svg),
    }
}
