use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::predict::DEFAULT_BASE_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid station coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("no ground station: pass LAT and LON or set station.coordinates in the config")]
    MissingStation,
    #[error("no station time zone: pass --tz or set station.timezone in the config")]
    MissingTimeZone,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: Option<StationConfig>,
    #[serde(default)]
    pub tle: TleConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TleConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: f64,
    #[serde(default = "default_true")]
    pub refresh_stale: bool,
}

impl Default for TleConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            base_url: default_base_url(),
            stale_after_days: default_stale_after_days(),
            refresh_stale: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub include_range: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            include_range: false,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("tle-cache")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_stale_after_days() -> f64 {
    14.0
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}
