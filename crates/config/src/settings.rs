// Application settings
// Loaded from ~/.config/pcinn/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use pcinn_core::ModelName;

use crate::bounds::ValidationBounds;

/// Environment variable that overrides the API base URL.
pub const API_URL_ENV: &str = "PCINN_API_URL";

const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Prediction service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Service root, without the `/api/v1` suffix
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: 60,
        }
    }
}

impl ApiSettings {
    /// Versioned endpoint root, e.g. `http://localhost:8000/api/v1`.
    pub fn api_root(&self) -> String {
        format!("{}/api/v1", self.base_url.trim_end_matches('/'))
    }
}

/// File ingestion limits and unit-detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Data rows allowed per upload
    #[serde(rename = "maxRows")]
    pub max_rows: usize,

    /// Temperature columns entirely below this are read as °C
    #[serde(rename = "temperatureCrossover")]
    pub temperature_crossover: f64,

    /// Time columns whose maximum exceeds this are read as seconds
    #[serde(rename = "timeCrossover")]
    pub time_crossover: f64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_rows: 1000,
            temperature_crossover: 200.0,
            time_crossover: 598.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "api")]
    pub api: ApiSettings,

    #[serde(rename = "model.default")]
    pub default_model: ModelName,

    #[serde(rename = "ingest")]
    pub ingest: IngestSettings,

    #[serde(rename = "bounds")]
    pub bounds: ValidationBounds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            default_model: ModelName::default(),
            ingest: IngestSettings::default(),
            bounds: ValidationBounds::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pcinn");
        config_dir.join("settings.json")
    }

    /// Load settings from the default path, then apply environment overrides
    pub fn load() -> Self {
        let mut settings = Self::load_from(&Self::config_path());
        settings.apply_env_override(std::env::var(API_URL_ENV).ok());
        settings
    }

    /// Load settings from disk, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Self = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;
        settings.bounds.check()?;
        if settings.ingest.max_rows == 0 {
            return Err("ingest.maxRows must be at least 1".to_string());
        }
        Ok(settings)
    }

    /// A non-blank value replaces the configured API base URL.
    pub fn apply_env_override(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url {
            let url = url.trim();
            if !url.is_empty() {
                self.api.base_url = url.to_string();
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }
}
