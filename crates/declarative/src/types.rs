//! Core types for resource lifecycles, diffs and execution

use crate::property::PropertyMap;
use crate::urn::Urn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of change detected for a single property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    Add,
    AddReplace,
    Update,
    UpdateReplace,
    Delete,
    DeleteReplace,
}

impl DiffKind {
    /// Whether this change forces the resource to be replaced
    pub fn is_replace(&self) -> bool {
        matches!(
            self,
            Self::AddReplace | Self::UpdateReplace | Self::DeleteReplace
        )
    }

    /// The replacing counterpart of this kind
    pub fn as_replace(&self) -> Self {
        match self {
            Self::Add | Self::AddReplace => Self::AddReplace,
            Self::Update | Self::UpdateReplace => Self::UpdateReplace,
            Self::Delete | Self::DeleteReplace => Self::DeleteReplace,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::AddReplace => "add-replace",
            Self::Update => "update",
            Self::UpdateReplace => "update-replace",
            Self::Delete => "delete",
            Self::DeleteReplace => "delete-replace",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detailed diff entry for one property path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDiff {
    pub kind: DiffKind,
    /// Whether the diff was computed against old inputs rather than old state
    #[serde(default)]
    pub input_diff: bool,
}

impl PropertyDiff {
    pub fn new(kind: DiffKind) -> Self {
        Self {
            kind,
            input_diff: false,
        }
    }
}

/// Result of comparing a resource's old state with its new inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResponse {
    pub has_changes: bool,
    /// Property path (e.g. `triggers.foo`) to change
    #[serde(default)]
    pub detailed_diff: BTreeMap<String, PropertyDiff>,
    /// Delete the old resource before creating its replacement
    #[serde(default)]
    pub delete_before_replace: bool,
}

impl DiffResponse {
    /// A response reporting no changes
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Whether any detected change forces a replacement
    pub fn requires_replace(&self) -> bool {
        self.has_changes && self.detailed_diff.values().any(|d| d.kind.is_replace())
    }

    /// Property paths whose change forces a replacement
    pub fn replace_keys(&self) -> Vec<&str> {
        self.detailed_diff
            .iter()
            .filter(|(_, d)| d.kind.is_replace())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// A single input validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    pub property: String,
    pub reason: String,
}

impl CheckFailure {
    pub fn new(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            reason: reason.into(),
        }
    }
}

/// Request to validate new inputs
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub urn: Urn,
    pub olds: PropertyMap,
    pub news: PropertyMap,
}

/// Validated inputs and any failures
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckResponse {
    pub inputs: PropertyMap,
    pub failures: Vec<CheckFailure>,
}

/// Request to compare old state with new inputs
#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub id: String,
    pub urn: Urn,
    pub olds: PropertyMap,
    pub news: PropertyMap,
}

/// Request to create a resource
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub urn: Urn,
    pub properties: PropertyMap,
}

/// Id and outputs of a created resource
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResponse {
    pub id: String,
    pub properties: PropertyMap,
}

/// Request to update a resource in place
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub id: String,
    pub urn: Urn,
    pub olds: PropertyMap,
    pub news: PropertyMap,
}

/// Outputs after an update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResponse {
    pub properties: PropertyMap,
}

/// Request to read the live state of a resource
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub id: String,
    pub urn: Urn,
    pub properties: PropertyMap,
}

/// Live state of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResponse {
    pub id: String,
    pub properties: PropertyMap,
}

/// Request to delete a resource
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub id: String,
    pub urn: Urn,
    pub properties: PropertyMap,
}

/// Operation the engine will perform for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOp {
    Same,
    Create,
    Update,
    Replace,
    Delete,
}

impl StepOp {
    /// Whether this step mutates anything
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Same)
    }

    /// Symbol used when listing steps
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Same => " ",
            Self::Create => "+",
            Self::Update => "~",
            Self::Replace => "+-",
            Self::Delete => "-",
        }
    }
}

impl fmt::Display for StepOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Same => "same",
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Result of applying one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was updated in place
    Updated,
    /// Resource was replaced
    Replaced,
    /// Resource was deleted
    Deleted,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub same: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.replaced + self.deleted
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.same + self.skipped + self.failed
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.same += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Updated => self.updated += 1,
            ApplyResult::Replaced => self.replaced += 1,
            ApplyResult::Deleted => self.deleted += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Compute projected results without changing anything
    pub preview: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            preview: false,
            jobs: 4,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_kind_serde() {
        let json = serde_json::to_string(&DiffKind::UpdateReplace).unwrap();
        assert_eq!(json, "\"update-replace\"");
        let kind: DiffKind = serde_json::from_str("\"add\"").unwrap();
        assert_eq!(kind, DiffKind::Add);
    }

    #[test]
    fn test_requires_replace() {
        let mut diff = DiffResponse {
            has_changes: true,
            ..Default::default()
        };
        diff.detailed_diff
            .insert("string".into(), PropertyDiff::new(DiffKind::Update));
        assert!(!diff.requires_replace());

        diff.detailed_diff
            .insert("length".into(), PropertyDiff::new(DiffKind::UpdateReplace));
        assert!(diff.requires_replace());
        assert_eq!(diff.replace_keys(), vec!["length"]);

        diff.has_changes = false;
        assert!(!diff.requires_replace());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        summary.add_result(&ApplyResult::Created);
        summary.add_result(&ApplyResult::Replaced);
        summary.add_result(&ApplyResult::NoChange);
        summary.add_result(&ApplyResult::Failed {
            error: "boom".into(),
        });

        assert_eq!(summary.total_changes(), 2);
        assert_eq!(summary.total(), 4);
        assert!(!summary.is_success());
    }
}
