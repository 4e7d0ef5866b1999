//! StatefulString - a string that only changes when its triggers do
//!
//! The resource remembers the string it was created with. Editing the string
//! alone has no effect; the new string is taken over only when a trigger is
//! added, removed or changed.

use declarative::{
    ApplyContext, CustomResource, DiffResponse, PropertyDiff, PropertySpec, PropertyType,
    ResourceSchema, Result, diff_string_maps,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inputs of a StatefulString
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatefulStringArgs {
    pub string: String,
    pub triggers: BTreeMap<String, String>,
}

/// Fields that exist on a created StatefulString
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatefulStringState {
    #[serde(flatten)]
    pub args: StatefulStringArgs,
}

pub struct StatefulString;

/// Outcome of comparing recorded triggers with new ones
#[derive(Debug, Clone, PartialEq, Eq)]
struct TriggerCheck {
    changed: bool,
    changes: BTreeMap<String, PropertyDiff>,
    /// What the resource should hold after an update
    args: StatefulStringArgs,
}

fn check_triggers(olds: &StatefulStringState, news: &StatefulStringArgs) -> TriggerCheck {
    let mut changes: BTreeMap<String, PropertyDiff> =
        diff_string_maps("triggers", &olds.args.triggers, &news.triggers)
            .into_iter()
            .map(|(key, kind)| (key, PropertyDiff::new(kind)))
            .collect();
    let changed = !changes.is_empty();

    if !changed {
        return TriggerCheck {
            changed,
            changes,
            args: StatefulStringArgs {
                string: olds.args.string.clone(),
                triggers: news.triggers.clone(),
            },
        };
    }

    if news.string != olds.args.string {
        changes.insert(
            "string".to_string(),
            PropertyDiff::new(declarative::DiffKind::Update),
        );
    }

    TriggerCheck {
        changed,
        changes,
        args: news.clone(),
    }
}

impl CustomResource for StatefulString {
    type Args = StatefulStringArgs;
    type State = StatefulStringState;
    const TYPE_NAME: &'static str = "StatefulString";

    fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            description: "A string that keeps its value until one of its triggers changes".into(),
            inputs: vec![
                PropertySpec::new("string", PropertyType::String)
                    .required()
                    .describe("Value to hold"),
                PropertySpec::new("triggers", PropertyType::StringMap)
                    .required()
                    .describe("Changing any entry lets a new string take effect"),
            ],
            outputs: vec![
                PropertySpec::new("string", PropertyType::String).required(),
                PropertySpec::new("triggers", PropertyType::StringMap).required(),
            ],
        }
    }

    fn create(
        &self,
        _ctx: &ApplyContext,
        name: &str,
        args: StatefulStringArgs,
    ) -> Result<(String, StatefulStringState)> {
        log::debug!("StatefulString {} created with {} trigger(s)", name, args.triggers.len());
        Ok((name.to_string(), StatefulStringState { args }))
    }

    fn diff(
        &self,
        _ctx: &ApplyContext,
        _id: &str,
        olds: &StatefulStringState,
        news: &StatefulStringArgs,
    ) -> Result<DiffResponse> {
        let check = check_triggers(olds, news);
        Ok(DiffResponse {
            has_changes: check.changed,
            detailed_diff: check.changes,
            delete_before_replace: false,
        })
    }

    fn update(
        &self,
        _ctx: &ApplyContext,
        id: &str,
        olds: StatefulStringState,
        news: StatefulStringArgs,
    ) -> Result<StatefulStringState> {
        let check = check_triggers(&olds, &news);
        if !check.changed && news.string != olds.args.string {
            log::info!("{}: string change ignored, no trigger changed", id);
        }
        Ok(StatefulStringState { args: check.args })
    }
}
