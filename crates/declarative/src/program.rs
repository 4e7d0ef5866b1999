//! Deployment programs: declared resources and exported outputs

use crate::error::{Error, Result};
use crate::property::{PropertyMap, PropertyValue};
use crate::snapshot::Snapshot;
use crate::urn::TypeToken;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}.]+)\.([^}]+)\}").expect("reference pattern is valid")
});

/// A resource declared by a program
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDecl {
    /// Logical name, unique within the program
    pub name: String,
    pub type_token: TypeToken,
    pub properties: PropertyMap,
}

/// Expression producing an exported output value
#[derive(Debug, Clone, PartialEq)]
pub enum OutputExpr {
    Literal(PropertyValue),
    /// A property of a declared resource; dotted paths reach into objects
    Reference { resource: String, property: String },
    /// A string with `${resource.property}` references interpolated
    Template(String),
    Object(BTreeMap<String, OutputExpr>),
    Array(Vec<OutputExpr>),
}

impl OutputExpr {
    pub fn reference(resource: &str, property: &str) -> Self {
        Self::Reference {
            resource: resource.to_string(),
            property: property.to_string(),
        }
    }

    /// Interpret a literal value, turning `${resource.property}` strings into references
    pub fn parse(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::String(text) => Self::parse_str(text),
            PropertyValue::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::parse(v)))
                    .collect(),
            ),
            PropertyValue::Array(items) => Self::Array(items.iter().map(Self::parse).collect()),
            other => Self::Literal(other.clone()),
        }
    }

    fn parse_str(text: &str) -> Self {
        if let Some(caps) = REFERENCE.captures(text)
            && caps.get(0).is_some_and(|m| m.as_str() == text)
        {
            return Self::reference(&caps[1], &caps[2]);
        }

        if REFERENCE.is_match(text) {
            Self::Template(text.to_string())
        } else {
            Self::Literal(PropertyValue::String(text.to_string()))
        }
    }

    /// All `(resource, property)` pairs this expression depends on
    pub fn references(&self) -> Vec<(String, String)> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Reference { resource, property } => vec![(resource.clone(), property.clone())],
            Self::Template(text) => REFERENCE
                .captures_iter(text)
                .map(|caps| (caps[1].to_string(), caps[2].to_string()))
                .collect(),
            Self::Object(map) => map.values().flat_map(Self::references).collect(),
            Self::Array(items) => items.iter().flat_map(Self::references).collect(),
        }
    }

    /// Evaluate against resource outputs looked up by logical name
    pub fn resolve<F>(&self, lookup: &F) -> Result<PropertyValue>
    where
        F: Fn(&str) -> Option<PropertyMap>,
    {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Reference { resource, property } => lookup_path(lookup, resource, property),
            Self::Template(text) => {
                let mut out = String::new();
                let mut last = 0;
                for caps in REFERENCE.captures_iter(text) {
                    let whole = caps.get(0).expect("group 0 always matches");
                    out.push_str(&text[last..whole.start()]);
                    match lookup_path(lookup, &caps[1], &caps[2])? {
                        PropertyValue::Computed => return Ok(PropertyValue::Computed),
                        PropertyValue::String(s) => out.push_str(&s),
                        other => out.push_str(&other.to_json().to_string()),
                    }
                    last = whole.end();
                }
                out.push_str(&text[last..]);
                Ok(PropertyValue::String(out))
            }
            Self::Object(map) => {
                let mut resolved = PropertyMap::new();
                for (key, expr) in map {
                    resolved.insert(key.clone(), expr.resolve(lookup)?);
                }
                Ok(PropertyValue::Object(resolved))
            }
            Self::Array(items) => Ok(PropertyValue::Array(
                items
                    .iter()
                    .map(|item| item.resolve(lookup))
                    .collect::<Result<Vec<_>>>()?,
            )),
        }
    }
}

fn lookup_path<F>(lookup: &F, resource: &str, path: &str) -> Result<PropertyValue>
where
    F: Fn(&str) -> Option<PropertyMap>,
{
    let unresolved = || Error::UnresolvedReference(format!("{resource}.{path}"));
    let outputs = lookup(resource).ok_or_else(unresolved)?;

    let mut segments = path.split('.');
    let first = segments.next().ok_or_else(unresolved)?;
    let mut value = outputs.get(first).ok_or_else(unresolved)?;

    for segment in segments {
        value = match value {
            PropertyValue::Computed => return Ok(PropertyValue::Computed),
            PropertyValue::Object(map) => map.get(segment).ok_or_else(unresolved)?,
            _ => return Err(unresolved()),
        };
    }

    Ok(value.clone())
}

/// Resources to manage and outputs to publish
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    project: String,
    resources: Vec<ResourceDecl>,
    exports: BTreeMap<String, OutputExpr>,
}

impl Program {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..Default::default()
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Declare a resource; logical names must be unique
    pub fn declare(&mut self, decl: ResourceDecl) -> Result<()> {
        if self.resources.iter().any(|r| r.name == decl.name) {
            return Err(Error::DuplicateResource(decl.name));
        }
        self.resources.push(decl);
        Ok(())
    }

    /// Publish an output under `name`
    pub fn export(&mut self, name: &str, expr: OutputExpr) {
        self.exports.insert(name.to_string(), expr);
    }

    pub fn resources(&self) -> &[ResourceDecl] {
        &self.resources
    }

    pub fn exports(&self) -> &BTreeMap<String, OutputExpr> {
        &self.exports
    }

    /// Check that every export refers to a declared resource
    pub fn validate(&self) -> Result<()> {
        let names: HashSet<&str> = self.resources.iter().map(|r| r.name.as_str()).collect();
        for expr in self.exports.values() {
            for (resource, property) in expr.references() {
                if !names.contains(resource.as_str()) {
                    return Err(Error::UnresolvedReference(format!("{resource}.{property}")));
                }
            }
        }
        Ok(())
    }

    /// Evaluate every export against a snapshot's resource outputs
    pub fn resolve_outputs(&self, snapshot: &Snapshot) -> Result<PropertyMap> {
        let lookup = |name: &str| snapshot.find(name).map(|r| r.outputs.clone());
        let mut outputs = PropertyMap::new();
        for (name, expr) in &self.exports {
            outputs.insert(name.clone(), expr.resolve(&lookup)?);
        }
        Ok(outputs)
    }
}
