use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the optional settings file in the config directory
pub const SETTINGS_FILE: &str = "config.toml";

/// Stack used when neither `--stack` nor the settings name one
pub const DEFAULT_STACK: &str = "dev";

/// Program file looked up when `--program` is not given
pub const DEFAULT_PROGRAM: &str = "statefulstring.toml";

// ============================================================================
// Settings
// ============================================================================

/// User settings read from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Stack to use by default
    pub default_stack: String,
    /// Parallel jobs for `up`
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_stack: DEFAULT_STACK.to_string(),
            jobs: 4,
        }
    }
}

impl Settings {
    /// Load settings from the config directory, or defaults if there are none
    pub fn load() -> Result<Self> {
        let path = crate::paths::config_dir()?.join(SETTINGS_FILE);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// The stack to operate on, preferring an explicit choice
    pub fn stack(&self, explicit: Option<&str>) -> String {
        explicit.map_or_else(|| self.default_stack.clone(), str::to_string)
    }

    /// Number of jobs, preferring an explicit choice; never zero
    pub fn jobs(&self, explicit: Option<usize>) -> usize {
        explicit.unwrap_or(self.jobs).max(1)
    }
}

/// Program file to load, preferring an explicit path
pub fn program_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(DEFAULT_PROGRAM), Path::to_path_buf)
}
