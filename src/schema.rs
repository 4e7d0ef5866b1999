//! Program file format
//!
//! A program is a TOML file naming the project, the resources to manage and
//! the outputs to export:
//!
//! ```toml
//! name = "hello"
//!
//! [[resources]]
//! name = "mystatefulstring"
//! type = "StatefulString"
//! properties = { string = "Hello, World!333", triggers = { foo = "bar2" } }
//!
//! [outputs.output]
//! value = "${mystatefulstring.string}"
//! ```

use anyhow::{Context, Result};
use declarative::{OutputExpr, Program, PropertyMap, PropertyValue, Provider, ResourceDecl};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// File Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramFile {
    /// Project name; stacks are stored per project
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceEntry>,

    /// Exported values; strings may reference `${resource.property}`
    #[serde(default)]
    pub outputs: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    pub name: String,

    /// Full type token, or just the type name
    #[serde(rename = "type")]
    pub type_token: String,

    #[serde(default)]
    pub properties: toml::Table,
}

impl ProgramFile {
    /// Load a program file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read program file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid program file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in program")
    }

    /// Resolve resource types against the provider and build the program
    pub fn into_program(self, provider: &Provider) -> Result<Program> {
        let mut program = Program::new(&self.name);
        if let Some(description) = &self.description {
            log::debug!("{}: {}", self.name, description);
        }

        for entry in self.resources {
            let type_token = provider
                .resolve_token(&entry.type_token)
                .with_context(|| format!("Resource '{}'", entry.name))?;

            program.declare(ResourceDecl {
                name: entry.name,
                type_token,
                properties: table_to_properties(&entry.properties),
            })?;
        }

        for (name, value) in &self.outputs {
            program.export(name, OutputExpr::parse(&property_from_toml(value)));
        }

        program.validate()?;
        log::debug!(
            "Loaded program '{}' with {} resource(s)",
            program.project(),
            program.resources().len()
        );
        Ok(program)
    }
}

/// Load a program file and build it against the provider
pub fn load_program(path: &Path, provider: &Provider) -> Result<Program> {
    ProgramFile::load(path)?
        .into_program(provider)
        .with_context(|| format!("Invalid program file: {}", path.display()))
}

// ============================================================================
// TOML Conversion
// ============================================================================

pub fn property_from_toml(value: &toml::Value) -> PropertyValue {
    match value {
        toml::Value::String(s) => PropertyValue::String(s.clone()),
        toml::Value::Integer(i) => PropertyValue::from(*i),
        toml::Value::Float(f) => PropertyValue::Number(*f),
        toml::Value::Boolean(b) => PropertyValue::Bool(*b),
        toml::Value::Datetime(dt) => PropertyValue::String(dt.to_string()),
        toml::Value::Array(items) => {
            PropertyValue::Array(items.iter().map(property_from_toml).collect())
        }
        toml::Value::Table(table) => PropertyValue::Object(table_to_properties(table)),
    }
}

fn table_to_properties(table: &toml::Table) -> PropertyMap {
    table
        .iter()
        .map(|(k, v)| (k.clone(), property_from_toml(v)))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
