//! Fixtures shared by the engine tests

use crate::context::ApplyContext;
use crate::error::{Error, Result};
use crate::program::{Program, ResourceDecl};
use crate::property::PropertyMap;
use crate::provider::Provider;
use crate::resource::{CustomResource, PropertySpec, PropertyType, ResourceSchema};
use crate::snapshot::ResourceRecord;
use crate::types::{DiffKind, DiffResponse, PropertyDiff};
use crate::urn::{TypeToken, Urn};
use semver::Version;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CounterArgs {
    pub start: i64,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CounterState {
    pub start: i64,
    #[serde(default)]
    pub label: String,
    pub value: i64,
}

/// Changing `start` replaces, changing `label` updates in place.
/// A negative `start` fails to create; the label `stuck` fails to delete.
/// The label `dbr` asks for delete-before-replace, and `drift` makes
/// `read` report a recreated resource with a new id and value.
pub struct Counter;

impl CustomResource for Counter {
    type Args = CounterArgs;
    type State = CounterState;
    const TYPE_NAME: &'static str = "Counter";

    fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            description: "A counter".into(),
            inputs: vec![
                PropertySpec::new("start", PropertyType::Integer).required(),
                PropertySpec::new("label", PropertyType::String),
            ],
            outputs: vec![
                PropertySpec::new("start", PropertyType::Integer).required(),
                PropertySpec::new("label", PropertyType::String),
                PropertySpec::new("value", PropertyType::Integer).computed(),
            ],
        }
    }

    fn create(
        &self,
        _ctx: &ApplyContext,
        name: &str,
        args: CounterArgs,
    ) -> Result<(String, CounterState)> {
        if args.start < 0 {
            return Err(Error::provider(format!("{name}: start must not be negative")));
        }
        Ok((
            name.to_string(),
            CounterState {
                start: args.start,
                label: args.label,
                value: args.start + 1,
            },
        ))
    }

    fn diff(
        &self,
        _ctx: &ApplyContext,
        _id: &str,
        olds: &CounterState,
        news: &CounterArgs,
    ) -> Result<DiffResponse> {
        let mut diff = DiffResponse::unchanged();
        if olds.start != news.start {
            diff.detailed_diff
                .insert("start".into(), PropertyDiff::new(DiffKind::UpdateReplace));
        }
        if olds.label != news.label {
            diff.detailed_diff
                .insert("label".into(), PropertyDiff::new(DiffKind::Update));
        }
        diff.has_changes = !diff.detailed_diff.is_empty();
        diff.delete_before_replace = news.label == "dbr";
        Ok(diff)
    }

    fn update(
        &self,
        _ctx: &ApplyContext,
        _id: &str,
        olds: CounterState,
        news: CounterArgs,
    ) -> Result<CounterState> {
        Ok(CounterState {
            start: news.start,
            label: news.label,
            value: olds.value,
        })
    }

    fn read(
        &self,
        _ctx: &ApplyContext,
        id: &str,
        state: CounterState,
    ) -> Result<(String, CounterState)> {
        if state.label == "drift" {
            return Ok((
                format!("{id}-recreated"),
                CounterState {
                    value: state.value + 100,
                    ..state
                },
            ));
        }
        Ok((id.to_string(), state))
    }

    fn delete(&self, _ctx: &ApplyContext, id: &str, state: CounterState) -> Result<()> {
        if state.label == "stuck" {
            return Err(Error::provider(format!("{id} cannot be deleted")));
        }
        Ok(())
    }
}

pub fn counter_token() -> TypeToken {
    TypeToken::new("test", "index", "Counter")
}

pub fn counter_provider() -> Provider {
    Provider::builder("test", Version::new(0, 1, 0))
        .module("provider", "index")
        .resource(Counter)
        .build()
}

/// Program declaring one counter per `(name, start)` pair
pub fn counter_program(counters: &[(&str, i64)]) -> Program {
    let mut program = Program::new("proj");
    for (name, start) in counters {
        program
            .declare(ResourceDecl {
                name: (*name).to_string(),
                type_token: counter_token(),
                properties: PropertyMap::new().with("start", *start),
            })
            .unwrap();
    }
    program
}

/// Recorded counter as a previous deployment would have left it
pub fn record_for(name: &str, start: i64, label: &str) -> ResourceRecord {
    ResourceRecord::new(
        Urn::new("dev", "proj", counter_token(), name),
        name.to_string(),
        PropertyMap::new().with("start", start).with("label", label),
        PropertyMap::new()
            .with("start", start)
            .with("label", label)
            .with("value", start + 1),
    )
}

pub fn set_label(program: &mut Program, name: &str, label: &str) {
    let mut rebuilt = Program::new(program.project());
    for decl in program.resources() {
        let mut decl = decl.clone();
        if decl.name == name {
            decl.properties.insert("label", label);
        }
        rebuilt.declare(decl).unwrap();
    }
    for (export, expr) in program.exports() {
        rebuilt.export(export, expr.clone());
    }
    *program = rebuilt;
}

pub fn clear_properties(program: &mut Program) {
    let mut rebuilt = Program::new(program.project());
    for decl in program.resources() {
        rebuilt
            .declare(ResourceDecl {
                properties: PropertyMap::new(),
                ..decl.clone()
            })
            .unwrap();
    }
    *program = rebuilt;
}
