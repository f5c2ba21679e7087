use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_UNLOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one tailing run
#[derive(Debug, Clone, PartialEq)]
pub struct TailConfig {
    pub poll_interval: Duration,
    /// Upper bound on waiting for the writer to release the log before the final read
    pub unlock_timeout: Duration,
    /// Errors from files under this directory are emitted as source annotations
    pub project_root: Option<PathBuf>,
    /// Drop plain (non-telemetry) lines instead of forwarding them
    pub telemetry_only: bool,
    pub write_sidecar: bool,
    /// Exact messages downgraded from error to info, on top of the built-in list
    pub downgraded_messages: Vec<String>,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            unlock_timeout: DEFAULT_UNLOCK_TIMEOUT,
            project_root: None,
            telemetry_only: false,
            write_sidecar: false,
            downgraded_messages: Vec::new(),
        }
    }
}

impl TailConfig {
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_unlock_timeout(mut self, timeout: Duration) -> Self {
        self.unlock_timeout = timeout;
        self
    }

    pub fn telemetry_only(mut self, enabled: bool) -> Self {
        self.telemetry_only = enabled;
        self
    }

    pub fn write_sidecar(mut self, enabled: bool) -> Self {
        self.write_sidecar = enabled;
        self
    }
}

/// How source-annotated errors are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStyle {
    /// Pick from the CI environment
    #[default]
    Auto,
    Github,
    Azure,
    Plain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TailSection {
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub unlock_timeout_secs: Option<u64>,
    #[serde(default)]
    pub telemetry_only: Option<bool>,
    #[serde(default)]
    pub write_sidecar: Option<bool>,
    #[serde(default)]
    pub downgrade_messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySection {
    #[serde(default)]
    pub annotations: AnnotationStyle,
    #[serde(default)]
    pub fallback_columns: Option<usize>,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tail: TailSection,
    #[serde(default)]
    pub display: DisplaySection,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.tail.poll_interval_ms == Some(0) {
            return Err(Error::Config(
                "tail.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Tail settings from the file, before command-line overrides
    pub fn tail_config(&self) -> TailConfig {
        let defaults = TailConfig::default();
        TailConfig {
            poll_interval: self
                .tail
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            unlock_timeout: self
                .tail
                .unlock_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.unlock_timeout),
            project_root: None,
            telemetry_only: self.tail.telemetry_only.unwrap_or(false),
            write_sidecar: self.tail.write_sidecar.unwrap_or(false),
            downgraded_messages: self.tail.downgrade_messages.clone(),
        }
    }
}

/// Resolve the config file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. UTPTRACE_CONFIG environment variable (with tilde expansion)
/// 3. `utptrace/config.toml` under the platform config directory
/// 4. ~/.utptrace/config.toml
pub fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("UTPTRACE_CONFIG")
        && !env_path.is_empty()
    {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("utptrace").join("config.toml"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".utptrace").join("config.toml"));
    }

    Err(Error::Config(
        "Could not determine config path: no HOME directory or config directory found".to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}
