use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_SEEN_TRACES_MAX_ENTRIES,
    DEFAULT_SEEN_TRACES_TTL_SECS,
};

// ============================================================================
// FILE CONFIG
// ============================================================================

/// Ingestion configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IngestFileConfig {
    pub public_key: Option<String>,
    pub project_id: Option<String>,
}

/// Seen-traces cache configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SeenTracesFileConfig {
    /// Maximum number of remembered trace IDs
    pub max_entries: Option<u64>,
    /// Time-to-live of a remembered trace ID in seconds (0 = no expiry)
    pub ttl_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub ingest: Option<IngestFileConfig>,
    pub seen_traces: Option<SeenTracesFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(ingest) = other.ingest {
            let current = self.ingest.get_or_insert_with(IngestFileConfig::default);
            if ingest.public_key.is_some() {
                current.public_key = ingest.public_key;
            }
            if ingest.project_id.is_some() {
                tracing::trace!(project_id = ?ingest.project_id, "Merging ingest.project_id");
                current.project_id = ingest.project_id;
            }
        }

        if let Some(seen) = other.seen_traces {
            let current = self
                .seen_traces
                .get_or_insert_with(SeenTracesFileConfig::default);
            if seen.max_entries.is_some() {
                tracing::trace!(max_entries = ?seen.max_entries, "Merging seen_traces.max_entries");
                current.max_entries = seen.max_entries;
            }
            if seen.ttl_secs.is_some() {
                tracing::trace!(ttl_secs = ?seen.ttl_secs, "Merging seen_traces.ttl_secs");
                current.ttl_secs = seen.ttl_secs;
            }
        }
    }
}

// ============================================================================
// RESOLVED CONFIG
// ============================================================================

/// Identity of the ingesting project, used for the SDK public-key check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestConfig {
    pub public_key: Option<String>,
    pub project_id: Option<String>,
}

/// Bounds of the shared seen-traces cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenTracesConfig {
    pub max_entries: u64,
    pub ttl_secs: u64,
}

impl Default for SeenTracesConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_SEEN_TRACES_MAX_ENTRIES,
            ttl_secs: DEFAULT_SEEN_TRACES_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub seen_traces: SeenTracesConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.otel-ingest/otel-ingest.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Ok(Self::layer(cli, file_config))
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_ingest = file_config.ingest.unwrap_or_default();
        let file_seen = file_config.seen_traces.unwrap_or_default();

        let ingest = IngestConfig {
            public_key: cli.public_key.clone().or(file_ingest.public_key),
            project_id: cli.project_id.clone().or(file_ingest.project_id),
        };

        let seen_traces = SeenTracesConfig {
            max_entries: cli
                .seen_traces_max_entries
                .or(file_seen.max_entries)
                .unwrap_or(DEFAULT_SEEN_TRACES_MAX_ENTRIES),
            ttl_secs: cli
                .seen_traces_ttl_secs
                .or(file_seen.ttl_secs)
                .unwrap_or(DEFAULT_SEEN_TRACES_TTL_SECS),
        };

        if ingest.public_key.is_none() {
            tracing::debug!("No public key configured; Langfuse SDK scopes will be rejected");
        }

        Self {
            ingest,
            seen_traces,
        }
    }
}

/// Get the profile config path (~/.otel-ingest/otel-ingest.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "ingest": { "public_key": "pk-lf-1", "project_id": "proj" },
            "seen_traces": { "max_entries": 10, "ttl_secs": 0 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let ingest = config.ingest.as_ref().unwrap();
        assert_eq!(ingest.public_key.as_deref(), Some("pk-lf-1"));
        assert_eq!(ingest.project_id.as_deref(), Some("proj"));
        assert_eq!(config.seen_traces.as_ref().unwrap().max_entries, Some(10));
    }

    #[test]
    fn test_file_config_collects_unknown_fields() {
        let config: FileConfig = serde_json::from_str(r#"{"ingets": {}}"#).unwrap();
        assert!(config.extra.get("ingets").is_some());
    }

    #[test]
    fn test_merge_other_takes_precedence() {
        let mut base: FileConfig =
            serde_json::from_str(r#"{"ingest": {"public_key": "a", "project_id": "p"}}"#).unwrap();
        let overlay: FileConfig = serde_json::from_str(r#"{"ingest": {"public_key": "b"}}"#).unwrap();
        base.merge(overlay);
        let ingest = base.ingest.unwrap();
        assert_eq!(ingest.public_key.as_deref(), Some("b"));
        assert_eq!(ingest.project_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_layer_defaults() {
        let config = AppConfig::layer(&CliConfig::default(), FileConfig::default());
        assert_eq!(config.seen_traces, SeenTracesConfig::default());
        assert_eq!(config.ingest, IngestConfig::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config(
            r#"{"ingest": {"public_key": "from-file"}, "seen_traces": {"ttl_secs": 60}}"#,
        );
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            public_key: Some("from-cli".to_string()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.ingest.public_key.as_deref(), Some("from-cli"));
        assert_eq!(config.seen_traces.ttl_secs, 60);
        assert_eq!(
            config.seen_traces.max_entries,
            DEFAULT_SEEN_TRACES_MAX_ENTRIES
        );
    }

    #[test]
    fn test_missing_config_file_errors() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/otel-ingest.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_config_file_errors_with_context() {
        let file = write_config("{ not json");
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
