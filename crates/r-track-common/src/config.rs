//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Shared primitives and utilities for the tracking runtime."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_seed_demo_data() -> bool {
    true
}

fn default_station_prefix() -> String {
    "ws_".to_owned()
}

fn default_entity_prefix() -> String {
    "en_".to_owned()
}

fn default_journal_path() -> Option<PathBuf> {
    Some(PathBuf::from("target/r-track/journal.log"))
}

fn default_dashboard_dir() -> PathBuf {
    PathBuf::from("target/r-track/storage")
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for the R-TRACK runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "R_TRACK_CONFIG";

    /// Load configuration from disk, respecting the `R_TRACK_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Parse and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "failed to serialise configuration to TOML")
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        if self.journal.enabled && self.journal.path.is_none() {
            return Err(anyhow!("journal is enabled but no journal path is configured"));
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// How the application state store is seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Seed the demo configuration, stations and entities when nothing is hydrated.
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
    /// Snapshot to hydrate from when present on disk.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_station_prefix")]
    pub station_id_prefix: String,
    #[serde(default = "default_entity_prefix")]
    pub entity_id_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_demo_data: default_seed_demo_data(),
            snapshot_path: None,
            station_id_prefix: default_station_prefix(),
            entity_id_prefix: default_entity_prefix(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, prefix) in [
            ("station_id_prefix", &self.station_id_prefix),
            ("entity_id_prefix", &self.entity_id_prefix),
        ] {
            if prefix.chars().any(char::is_whitespace) {
                return Err(anyhow!("store.{name} must not contain whitespace"));
            }
        }
        Ok(())
    }
}

/// Append-only journal of applied store actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_journal_path")]
    pub path: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_journal_path(),
        }
    }
}

/// Location of the per-user dashboard layout record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_dashboard_dir")]
    pub storage_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_dashboard_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::tempdir;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_str("").unwrap();
        assert!(config.store.seed_demo_data);
        assert_eq!(config.store.station_id_prefix, "ws_");
        assert!(!config.journal.enabled);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parses_sections() {
        let raw = r#"
            [store]
            seed_demo_data = false
            snapshot_path = "state.json"

            [journal]
            enabled = true
            path = "journal.log"

            [logging]
            format = "structured-json"
        "#;
        let config = AppConfig::from_str(raw).unwrap();
        assert!(!config.store.seed_demo_data);
        assert_eq!(config.store.snapshot_path, Some(PathBuf::from("state.json")));
        assert!(config.journal.enabled);
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
    }

    #[test]
    fn rejects_whitespace_prefix() {
        let raw = "[store]\nentity_id_prefix = \"en \"\n";
        assert!(AppConfig::from_str(raw).is_err());
    }

    #[test]
    fn load_picks_first_existing_candidate() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("r-track.toml");
        fs::write(&present, AppConfig::default().to_toml().unwrap()).unwrap();

        let loaded = AppConfig::load_with_source(&[&missing, &present]).unwrap();
        assert_eq!(loaded.source, present);
        assert!(loaded.config.store.seed_demo_data);
    }
}
