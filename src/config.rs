use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::map::MapMode;
use crate::sample::{DEFAULT_MAX_POINTS, SAMPLE_SEED};
use crate::tags::TOP_TAG_LIMIT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// CSV opened at startup and prefilled in the path field.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,

    #[serde(default)]
    pub tags: TagConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    /// Number of most frequent tags offered in the tag picker.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    TOP_TAG_LIMIT
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_max_points")]
    pub default_max_points: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_max_points() -> usize {
    DEFAULT_MAX_POINTS
}

fn default_seed() -> u64 {
    SAMPLE_SEED
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            default_max_points: default_max_points(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub default_mode: MapMode,

    /// Hexagon radius in meters.
    #[serde(default = "default_hex_radius")]
    pub hex_radius: f64,

    #[serde(default = "default_elevation_scale")]
    pub elevation_scale: f64,

    #[serde(default = "default_elevation_range")]
    pub elevation_range: [f64; 2],

    #[serde(default = "default_point_radius")]
    pub point_radius: f64,

    #[serde(default = "default_point_opacity")]
    pub point_opacity: f64,

    #[serde(default = "default_hex_zoom")]
    pub hex_zoom: f64,

    #[serde(default = "default_hex_pitch")]
    pub hex_pitch: f64,

    #[serde(default = "default_points_zoom")]
    pub points_zoom: f64,
}

fn default_hex_radius() -> f64 {
    80.0
}

fn default_elevation_scale() -> f64 {
    8.0
}

fn default_elevation_range() -> [f64; 2] {
    [0.0, 1500.0]
}

fn default_point_radius() -> f64 {
    12.0
}

fn default_point_opacity() -> f64 {
    0.6
}

fn default_hex_zoom() -> f64 {
    11.0
}

fn default_hex_pitch() -> f64 {
    40.0
}

fn default_points_zoom() -> f64 {
    12.0
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_mode: MapMode::default(),
            hex_radius: default_hex_radius(),
            elevation_scale: default_elevation_scale(),
            elevation_range: default_elevation_range(),
            point_radius: default_point_radius(),
            point_opacity: default_point_opacity(),
            hex_zoom: default_hex_zoom(),
            hex_pitch: default_hex_pitch(),
            points_zoom: default_points_zoom(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Rows shown in the sample table in point mode.
    #[serde(default = "default_preview_rows")]
    pub rows: usize,

    /// Browser used to open photo URLs (e.g., "firefox").
    /// If not set, uses system default (xdg-open on Linux, open on macOS)
    #[serde(default)]
    pub external_browser: Option<String>,
}

fn default_preview_rows() -> usize {
    200
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            rows: default_preview_rows(),
            external_browser: None,
        }
    }
}

fn default_csv_path() -> String {
    "flickr_data_cleaned.csv".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            tags: TagConfig::default(),
            sampling: SamplingConfig::default(),
            map: MapConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location (or `FLICKMAP_CONFIG`), writing a
    /// default file on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flickmap")
    }

    fn config_path() -> PathBuf {
        match std::env::var_os("FLICKMAP_CONFIG") {
            Some(path) => PathBuf::from(path),
            None => Self::config_dir().join("config.toml"),
        }
    }
}
