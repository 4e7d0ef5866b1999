//! Planner - decides what to do with every resource

use crate::context::ApplyContext;
use crate::error::{Error, Result};
use crate::program::Program;
use crate::property::PropertyMap;
use crate::provider::Provider;
use crate::snapshot::{ResourceRecord, Snapshot};
use crate::types::{CheckRequest, DiffRequest, DiffResponse, StepOp};
use crate::urn::Urn;

/// One planned operation
#[derive(Debug, Clone)]
pub struct Step {
    pub op: StepOp,
    pub urn: Urn,
    /// Checked inputs (the prior inputs for deletes)
    pub inputs: PropertyMap,
    /// Recorded state before this step, if the resource existed
    pub prior: Option<ResourceRecord>,
    /// Provider diff, for steps that compared old and new
    pub diff: Option<DiffResponse>,
}

impl Step {
    pub fn name(&self) -> &str {
        self.urn.name()
    }
}

/// An ordered list of steps for one stack
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub steps: Vec<Step>,
    /// Records left untouched because they fell outside the target
    pub carried: Vec<ResourceRecord>,
}

/// Count of planned operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub same: usize,
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
}

impl PlanSummary {
    pub fn total_changes(&self) -> usize {
        self.create + self.update + self.replace + self.delete
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}

impl Plan {
    /// Plan the changes needed to move `prior` to what `program` declares
    ///
    /// Every resource is checked before anything is diffed; all check
    /// failures are reported together.
    pub fn build(
        provider: &Provider,
        program: &Program,
        prior: &Snapshot,
        stack: &str,
    ) -> Result<Self> {
        program.validate()?;

        let ctx = ApplyContext::default();
        let mut checked = Vec::with_capacity(program.resources().len());
        let mut failures = Vec::new();

        for decl in program.resources() {
            let urn = Urn::new(stack, program.project(), decl.type_token.clone(), &decl.name);
            let prior_record = prior.find(&decl.name);

            let response = provider.check(
                &ctx,
                CheckRequest {
                    urn: urn.clone(),
                    olds: prior_record.map(|r| r.inputs.clone()).unwrap_or_default(),
                    news: decl.properties.clone(),
                },
            )?;

            if response.failures.is_empty() {
                checked.push((urn, response.inputs, prior_record));
            } else {
                failures.extend(
                    response
                        .failures
                        .into_iter()
                        .map(|f| (decl.name.clone(), f)),
                );
            }
        }

        if !failures.is_empty() {
            return Err(Error::CheckFailed(failures));
        }

        let mut steps = Vec::new();
        for (urn, inputs, prior_record) in checked {
            steps.push(plan_step(provider, &ctx, urn, inputs, prior_record)?);
        }

        // Resources no longer declared are deleted, newest first
        for record in prior.resources.iter().rev() {
            if !program.resources().iter().any(|d| d.name == record.name()) {
                steps.push(delete_step(record));
            }
        }

        let plan = Self {
            steps,
            carried: Vec::new(),
        };
        log::debug!("Planned {:?}", plan.summary());
        Ok(plan)
    }

    /// Plan the deletion of every resource in a snapshot
    pub fn destroy(prior: &Snapshot) -> Self {
        Self {
            steps: prior.resources.iter().rev().map(delete_step).collect(),
            carried: Vec::new(),
        }
    }

    /// Restrict the plan to steps matching a target
    ///
    /// The target matches a logical name, a type name, or a full type token.
    /// Recorded resources outside the target are carried over unchanged.
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        let Some(target) = target else {
            return self;
        };

        let mut steps = Vec::new();
        let mut carried = self.carried;
        for step in self.steps {
            if matches_target(&step.urn, target) {
                steps.push(step);
            } else if let Some(prior) = step.prior {
                carried.push(prior);
            }
        }

        Self { steps, carried }
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for step in &self.steps {
            match step.op {
                StepOp::Same => summary.same += 1,
                StepOp::Create => summary.create += 1,
                StepOp::Update => summary.update += 1,
                StepOp::Replace => summary.replace += 1,
                StepOp::Delete => summary.delete += 1,
            }
        }
        summary
    }

    pub fn has_changes(&self) -> bool {
        self.summary().has_changes()
    }
}

fn plan_step(
    provider: &Provider,
    ctx: &ApplyContext,
    urn: Urn,
    inputs: PropertyMap,
    prior: Option<&ResourceRecord>,
) -> Result<Step> {
    let Some(prior) = prior else {
        return Ok(Step {
            op: StepOp::Create,
            urn,
            inputs,
            prior: None,
            diff: None,
        });
    };

    if prior.urn.type_token() != urn.type_token() {
        log::info!(
            "{} changed type from {} to {}",
            urn.name(),
            prior.urn.type_token(),
            urn.type_token()
        );
        return Ok(Step {
            op: StepOp::Replace,
            urn,
            inputs,
            prior: Some(prior.clone()),
            diff: None,
        });
    }

    let diff = provider.diff(
        ctx,
        DiffRequest {
            id: prior.id.clone(),
            urn: urn.clone(),
            olds: prior.outputs.clone(),
            news: inputs.clone(),
        },
    )?;

    let op = if !diff.has_changes {
        StepOp::Same
    } else if diff.requires_replace() {
        StepOp::Replace
    } else {
        StepOp::Update
    };

    Ok(Step {
        op,
        urn,
        inputs,
        prior: Some(prior.clone()),
        diff: Some(diff),
    })
}

fn delete_step(record: &ResourceRecord) -> Step {
    Step {
        op: StepOp::Delete,
        urn: record.urn.clone(),
        inputs: record.inputs.clone(),
        prior: Some(record.clone()),
        diff: None,
    }
}

fn matches_target(urn: &Urn, target: &str) -> bool {
    urn.name() == target
        || urn.type_token().type_name() == target
        || urn.type_token().to_string() == target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{counter_program, counter_provider, record_for};
    use crate::urn::TypeToken;

    #[test]
    fn test_plan_creates_new_resources() {
        let provider = counter_provider();
        let program = counter_program(&[("a", 1), ("b", 2)]);

        let plan = Plan::build(&provider, &program, &Snapshot::default(), "dev").unwrap();
        let summary = plan.summary();
        assert_eq!(summary.create, 2);
        assert_eq!(summary.total_changes(), 2);
        assert_eq!(plan.steps[0].urn.to_string(), "urn:pulumi:dev::proj::test:index:Counter::a");
    }

    #[test]
    fn test_plan_same_update_replace_delete() {
        let provider = counter_provider();
        let prior = Snapshot {
            resources: vec![
                record_for("same", 1, "keep"),
                record_for("label", 1, "old"),
                record_for("start", 1, "x"),
                record_for("gone", 1, "x"),
            ],
            outputs: PropertyMap::new(),
        };

        let mut program = counter_program(&[("same", 1), ("label", 1), ("start", 5)]);
        crate::testing::set_label(&mut program, "same", "keep");
        crate::testing::set_label(&mut program, "label", "new");
        crate::testing::set_label(&mut program, "start", "x");

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let ops: Vec<(&str, StepOp)> = plan.steps.iter().map(|s| (s.name(), s.op)).collect();
        assert_eq!(
            ops,
            vec![
                ("same", StepOp::Same),
                ("label", StepOp::Update),
                ("start", StepOp::Replace),
                ("gone", StepOp::Delete),
            ]
        );
    }

    #[test]
    fn test_type_change_replaces() {
        let provider = counter_provider();
        let recorded = record_for("a", 1, "");
        let gauge = ResourceRecord {
            urn: Urn::new("dev", "proj", TypeToken::new("test", "index", "Gauge"), "a"),
            ..recorded
        };
        let prior = Snapshot {
            resources: vec![gauge.clone()],
            outputs: PropertyMap::new(),
        };

        let plan = Plan::build(&provider, &counter_program(&[("a", 1)]), &prior, "dev").unwrap();
        let step = &plan.steps[0];
        assert_eq!(step.op, StepOp::Replace);
        assert!(step.diff.is_none());
        assert_eq!(step.prior.as_ref(), Some(&gauge));
        assert_eq!(step.urn.type_token().type_name(), "Counter");
    }

    #[test]
    fn test_check_failures_are_aggregated() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", 1), ("b", 2)]);
        crate::testing::clear_properties(&mut program);

        let err = Plan::build(&provider, &program, &Snapshot::default(), "dev").unwrap_err();
        match err {
            Error::CheckFailed(failures) => {
                let names: Vec<&str> = failures.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_destroy_reverses_order() {
        let prior = Snapshot {
            resources: vec![record_for("a", 1, "x"), record_for("b", 1, "x")],
            outputs: PropertyMap::new(),
        };
        let plan = Plan::destroy(&prior);
        let names: Vec<&str> = plan.steps.iter().map(Step::name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(plan.summary().delete, 2);
    }

    #[test]
    fn test_filter_by_target_carries_others() {
        let provider = counter_provider();
        let prior = Snapshot {
            resources: vec![record_for("a", 1, "x"), record_for("b", 1, "x")],
            outputs: PropertyMap::new(),
        };
        let program = counter_program(&[("a", 2), ("b", 2), ("c", 1)]);

        let plan = Plan::build(&provider, &program, &prior, "dev")
            .unwrap()
            .filter_by_target(Some("a"));
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].name(), "a");
        let carried: Vec<&str> = plan.carried.iter().map(ResourceRecord::name).collect();
        assert_eq!(carried, vec!["b"]);
    }
}
