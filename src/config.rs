use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub parser: ParserConfig,

    pub enrichment: EnrichmentConfig,

    pub detector: DetectorConfig,

    pub import: ImportConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/bingarr.db".to_string(),
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            event_bus_buffer_size: 100,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Localized season markers checked against the middle segment of a
    /// colon-separated title. Matching is case-insensitive.
    pub season_keywords: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            season_keywords: [
                "season", "staffel", "saison", "temporada", "stagione", "seizoen", "sezon",
                "säsong", "sæson", "kausi",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,

    /// TMDB API key. Falls back to the TMDB_API_KEY environment variable
    /// when empty.
    pub api_key: String,

    pub base_url: String,

    pub requests_per_second: u32,

    /// Request timeout in seconds (default: 5)
    pub request_timeout_seconds: u64,

    pub cache_ttl_hours: i64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            base_url: "https://api.themoviedb.org/3".to_string(),
            requests_per_second: 4,
            request_timeout_seconds: 5,
            cache_ttl_hours: constants::cache::ENRICHMENT_TTL_HOURS,
        }
    }
}

impl EnrichmentConfig {
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var("TMDB_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Matches below this confidence are discarded.
    pub min_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: constants::confidence::MIN_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Job progress counters are flushed every N rows (default: 10)
    pub progress_update_rows: usize,

    /// Per-job error list cap (default: 100)
    pub max_job_errors: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            progress_update_rows: constants::import::PROGRESS_UPDATE_ROWS,
            max_job_errors: constants::import::MAX_JOB_ERRORS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub metrics_port: Option<u16>,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "bingarr".to_string());

        Self {
            metrics_enabled: true,
            metrics_port: None,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            parser: ParserConfig::default(),
            enrichment: EnrichmentConfig::default(),
            detector: DetectorConfig::default(),
            import: ImportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bingarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".bingarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.general.event_bus_buffer_size == 0 {
            anyhow::bail!("Event bus buffer size must be > 0");
        }

        if self.parser.season_keywords.is_empty() {
            anyhow::bail!("Season keyword list cannot be empty");
        }

        if self.enrichment.enabled {
            if self.enrichment.requests_per_second == 0 {
                anyhow::bail!("Enrichment rate limit must be > 0 when enabled");
            }
            if self.enrichment.request_timeout_seconds == 0 {
                anyhow::bail!("Enrichment request timeout must be > 0 when enabled");
            }
            if self.enrichment.cache_ttl_hours <= 0 {
                anyhow::bail!("Enrichment cache TTL must be > 0 when enabled");
            }
        }

        if !(0.0..=1.0).contains(&self.detector.min_confidence) {
            anyhow::bail!("Detector confidence threshold must be between 0.0 and 1.0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.enrichment.requests_per_second, 4);
        assert_eq!(config.enrichment.cache_ttl_hours, 24);
        assert!(config.parser.season_keywords.contains(&"staffel".to_string()));
        assert!((config.detector.min_confidence - 0.60).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[parser]"));
        assert!(toml_str.contains("[enrichment]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [enrichment]
            requests_per_second = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.enrichment.requests_per_second, 10);

        assert_eq!(config.enrichment.base_url, "https://api.themoviedb.org/3");
    }

    #[test]
    fn test_validate_rejects_empty_keywords() {
        let mut config = Config::default();
        config.parser.season_keywords.clear();
        assert!(config.validate().is_err());
    }
}
