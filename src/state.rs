use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use declarative::Snapshot;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Format version written into every stack file
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Contents of one stack file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackState {
    pub version: u32,
    pub project: String,
    pub stack: String,
    /// Last time the state was written
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

/// One line of `stack list`
#[derive(Debug, Clone, PartialEq)]
pub struct StackSummary {
    pub name: String,
    pub resources: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

// ============================================================================
// StackStore
// ============================================================================

/// Stack files of one project, stored as `<state_dir>/stacks/<project>/<stack>.json`
#[derive(Debug, Clone)]
pub struct StackStore {
    dir: PathBuf,
    project: String,
}

impl StackStore {
    /// Open the store for a project under the resolved state directory
    pub fn open(project: &str) -> Result<Self> {
        Self::new(&crate::paths::state_dir()?, project)
    }

    pub fn new(state_dir: &Path, project: &str) -> Result<Self> {
        validate_name("project", project)?;
        Ok(Self {
            dir: crate::paths::project_stacks_dir(state_dir, project),
            project: project.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a stack's state file
    pub fn path(&self, stack: &str) -> Result<PathBuf> {
        validate_name("stack", stack)?;
        Ok(self.dir.join(format!("{stack}.json")))
    }

    /// Load a stack's full state file, if the stack exists
    pub fn load_state(&self, stack: &str) -> Result<Option<StackState>> {
        let path = self.path(stack)?;

        if !path.exists() {
            log::debug!("State file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: StackState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!("Loaded state from {}", path.display());
        Ok(Some(state))
    }

    /// Load a stack's snapshot; a stack that does not exist yet is empty
    pub fn load(&self, stack: &str) -> Result<Snapshot> {
        Ok(self
            .load_state(stack)?
            .map(|s| s.snapshot)
            .unwrap_or_default())
    }

    /// Write a stack's snapshot through a temporary file
    pub fn save(&self, stack: &str, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self.path(stack)?;
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create state directory: {}", self.dir.display())
        })?;

        let state = StackState {
            version: STATE_VERSION,
            project: self.project.clone(),
            stack: stack.to_string(),
            last_updated: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let content =
            serde_json::to_string_pretty(&state).context("Failed to serialize state to JSON")?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(path)
    }

    /// All stacks of the project, sorted by name
    pub fn list(&self) -> Result<Vec<StackSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut stacks = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.load_state(name) {
                Ok(Some(state)) => stacks.push(StackSummary {
                    name: name.to_string(),
                    resources: state.snapshot.resources.len(),
                    last_updated: Some(state.last_updated),
                }),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Skipping unreadable stack {}: {:#}", name, e);
                    stacks.push(StackSummary {
                        name: name.to_string(),
                        resources: 0,
                        last_updated: None,
                    });
                }
            }
        }

        stacks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stacks)
    }

    /// Delete a stack's state file; returns whether it existed
    pub fn remove(&self, stack: &str) -> Result<bool> {
        let path = self.path(stack)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove state file: {}", path.display()))?;
        log::debug!("Removed {}", path.display());
        Ok(true)
    }
}

/// Stack and project names become file names
fn validate_name(what: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        bail!("Invalid {} name '{}': use letters, digits, '-', '_' or '.'", what, name);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
