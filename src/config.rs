use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "license-dash.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    /// Directory holding `licenses.csv` and `subscription_usage.csv`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// SQLite database path. Required when `kind` is `sqlite`.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            data_dir: default_data_dir(),
            database: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub source: SourceConfig,
    /// TTL for the raw-fetch cache, in seconds. 0 disables the cache.
    #[serde(default)]
    pub cache_ttl_secs: u64,
    /// Auto-refresh interval, in seconds. 0 disables the timer; the `r` key
    /// still triggers a refresh.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Clear the displayed tables when a refresh fails instead of keeping
    /// the stale view behind the error banner.
    #[serde(default)]
    pub clear_on_error: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            cache_ttl_secs: 0,
            refresh_secs: default_refresh_secs(),
            clear_on_error: false,
        }
    }
}

fn default_source_kind() -> SourceKind {
    SourceKind::Csv
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_refresh_secs() -> u64 {
    60
}

impl DashboardConfig {
    /// Load configuration. An explicit path must exist; otherwise the default
    /// locations are tried and a missing file falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("config file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            }
            None => default_config_path(),
        };

        match path {
            Some(p) if p.exists() => Self::from_file(&p),
            _ => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Apply environment overrides. The lookup is injected so tests never
    /// touch the process environment.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(kind) = get("LICENSE_DASH_SOURCE") {
            match kind.as_str() {
                "csv" => self.source.kind = SourceKind::Csv,
                "sqlite" => self.source.kind = SourceKind::Sqlite,
                other => tracing::warn!(value = other, "ignoring unknown LICENSE_DASH_SOURCE"),
            }
        }
        if let Some(dir) = get("LICENSE_DASH_DATA_DIR") {
            self.source.data_dir = PathBuf::from(dir);
        }
        if let Some(db) = get("LICENSE_DASH_DATABASE") {
            self.source.database = Some(PathBuf::from(db));
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        if self.refresh_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.refresh_secs))
        }
    }
}

/// `./license-dash.yaml` first, then the user config dir.
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|d| d.join("license-dash").join("config.yaml"))
}
