//! YAML configuration for chart defaults.
//!
//! Hosts keep one file with the canvas geometry and per-variant option
//! defaults. Every section is optional; missing fields take their defaults.

use crate::chart::{BarOptions, BubbleOptions, Canvas, LineOptions, MapOptions, PieOptions, ScatterOptions};
use crate::error::{Error, Result};
use crate::radial::RadialOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Canvas size and margins shared by all views.
    #[serde(default)]
    pub canvas: Canvas,

    /// Bar chart defaults.
    #[serde(default)]
    pub bar: BarOptions,

    /// Line chart defaults.
    #[serde(default)]
    pub line: LineOptions,

    /// Scatter chart defaults.
    #[serde(default)]
    pub scatter: ScatterOptions,

    /// Bubble chart defaults.
    #[serde(default)]
    pub bubble: BubbleOptions,

    /// Pie chart defaults.
    #[serde(default)]
    pub pie: PieOptions,

    /// Map defaults.
    #[serde(default)]
    pub map: MapOptions,

    /// Sunburst defaults.
    #[serde(default)]
    pub radial: RadialOptions,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            canvas: Canvas::default(),
            bar: BarOptions::default(),
            line: LineOptions::default(),
            scatter: ScatterOptions::default(),
            bubble: BubbleOptions::default(),
            pie: PieOptions::default(),
            map: MapOptions::default(),
            radial: RadialOptions::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content =
            std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] with the line number if parsing fails,
    /// or [`Error::Config`] if the canvas leaves no chart area or the zoom
    /// extent is invalid.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            Error::ConfigParse {
                line,
                message: e.to_string(),
            }
        })?;
        config.canvas.validate()?;
        config.radial.zoom_extent.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| Error::ConfigParse {
            line: 0,
            message: e.to_string(),
        })
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("using default configuration: {e}");
                Self::default()
            }
        }
    }
}
