//! Path resolution for statefulstring
//!
//! # Environment Variables
//!
//! - `STATEFULSTRING_CONFIG_DIR` - Override config directory
//! - `STATEFULSTRING_STATE_DIR` - Override state directory (stack files)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `STATEFULSTRING_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/statefulstring` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\statefulstring`
//!    - macOS/Linux: `~/.config/statefulstring`
//!
//! For state_dir():
//! 1. `STATEFULSTRING_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/statefulstring` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\statefulstring`
//!    - macOS/Linux: `~/.local/state/statefulstring`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "STATEFULSTRING_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "STATEFULSTRING_STATE_DIR";

const APP_DIR: &str = "statefulstring";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir();

    #[cfg(windows)]
    let platform = dirs::config_dir().map(|d| d.join(APP_DIR));
    #[cfg(not(windows))]
    let platform = home.as_ref().map(|h| h.join(".config").join(APP_DIR));

    resolve_dir(
        ENV_CONFIG_DIR,
        std::env::var(ENV_CONFIG_DIR).ok(),
        std::env::var("XDG_CONFIG_HOME").ok(),
        platform,
    )
}

/// Get the state directory path
pub fn state_dir() -> Result<PathBuf> {
    let home = dirs::home_dir();

    #[cfg(windows)]
    let platform = dirs::data_local_dir().map(|d| d.join(APP_DIR));
    #[cfg(not(windows))]
    let platform = home
        .as_ref()
        .map(|h| h.join(".local").join("state").join(APP_DIR));

    resolve_dir(
        ENV_STATE_DIR,
        std::env::var(ENV_STATE_DIR).ok(),
        std::env::var("XDG_STATE_HOME").ok(),
        platform,
    )
}

/// Pick a directory: explicit override, then XDG base, then platform default
fn resolve_dir(
    env_name: &str,
    override_dir: Option<String>,
    xdg_base: Option<String>,
    platform: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        let path = expand(&dir);
        log::debug!("Using dir from {}: {}", env_name, path.display());
        return Ok(path);
    }

    if let Some(xdg) = xdg_base.filter(|d| !d.is_empty()) {
        let path = PathBuf::from(xdg).join(APP_DIR);
        log::debug!("Using XDG dir: {}", path.display());
        return Ok(path);
    }

    let path = platform.context("Could not determine home directory")?;
    log::debug!("Using default dir: {}", path.display());
    Ok(path)
}

/// Directory holding the stack files of one project
pub fn project_stacks_dir(state_dir: &Path, project: &str) -> PathBuf {
    state_dir.join("stacks").join(project)
}

/// Expand ~ and environment variables in a path string
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
