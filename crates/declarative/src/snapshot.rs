//! Deployment snapshots: the recorded state of every managed resource

use crate::property::PropertyMap;
use crate::urn::Urn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recorded state of one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub urn: Urn,
    pub id: String,
    /// Inputs the resource was last applied with
    #[serde(default)]
    pub inputs: PropertyMap,
    /// State reported by the provider
    #[serde(default)]
    pub outputs: PropertyMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceRecord {
    pub fn new(urn: Urn, id: String, inputs: PropertyMap, outputs: PropertyMap) -> Self {
        let now = Utc::now();
        Self {
            urn,
            id,
            inputs,
            outputs,
            created_at: now,
            updated_at: now,
        }
    }

    /// Logical name of the resource
    pub fn name(&self) -> &str {
        self.urn.name()
    }

    /// Replace inputs and outputs, keeping the creation time
    pub fn updated(&self, inputs: PropertyMap, outputs: PropertyMap) -> Self {
        Self {
            inputs,
            outputs,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// All resources and outputs of a stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
    #[serde(default)]
    pub outputs: PropertyMap,
}

impl Snapshot {
    /// Find a resource by logical name
    pub fn find(&self, name: &str) -> Option<&ResourceRecord> {
        self.resources.iter().find(|r| r.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
