//! Optional YAML configuration.
//!
//! ```yaml
//! store_path: polygons.json
//! log_filter: info
//! svg:
//!   width: 800
//!   stroke: "#1f4e79"
//!   fill: "#9ecae1"
//!   fill_opacity: 0.5
//! ```
//!
//! Every key may be left out. Command line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use basar_map::SvgStyle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON snapshot the polygons are kept in.
    pub store_path: PathBuf,

    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Styling for `export`.
    pub svg: SvgStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("polygons.json"),
            log_filter: "info".to_string(),
            svg: SvgStyle::default(),
        }
    }
}

impl Config {
    /// Load a config file from YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// The file-less default, or the file at `path` when one is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
