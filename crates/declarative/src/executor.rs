//! Execution engine - applies a plan with optional parallelism

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::error::Result;
use crate::planner::{Plan, Step};
use crate::program::Program;
use crate::property::PropertyMap;
use crate::provider::Provider;
use crate::snapshot::{ResourceRecord, Snapshot};
use crate::types::{
    ApplyResult, CreateRequest, DeleteRequest, ExecuteOptions, ExecuteSummary, ReadRequest,
    StepOp, UpdateRequest,
};
use crate::urn::Urn;
use rayon::prelude::*;

/// Result of one executed step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub urn: Urn,
    pub op: StepOp,
    pub result: ApplyResult,
    /// Record to keep in the new snapshot, if any
    pub record: Option<ResourceRecord>,
}

/// Everything an execution produced
#[derive(Debug, Clone)]
pub struct Outcome {
    /// New snapshot (projected, when previewing)
    pub snapshot: Snapshot,
    pub summary: ExecuteSummary,
    pub results: Vec<StepResult>,
    /// Why outputs could not be resolved; prior outputs were kept
    pub output_error: Option<String>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }
}

/// Execute a plan with the given options and callbacks
///
/// Changes are confirmed once before anything is applied; previews never
/// ask. A step that fails keeps the resource's prior record, and the
/// remaining steps still run.
pub fn execute<P, C>(
    plan: Plan,
    provider: &Provider,
    program: Option<&Program>,
    prior: &Snapshot,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<Outcome>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let total_changes = plan.summary().total_changes();

    if total_changes > 0 && !opts.preview && !confirm.confirm("Apply changes?")? {
        log::info!("Declined {} change(s)", total_changes);
        return Ok(declined(plan, prior));
    }

    let ctx = ApplyContext::new(opts.preview, opts.verbose);
    let mut results = Vec::with_capacity(plan.steps.len());

    // Removed resources go last, after every create and update
    let (deletes, others): (Vec<Step>, Vec<Step>) = plan
        .steps
        .into_iter()
        .partition(|s| s.op == StepOp::Delete);

    for batch in [others, deletes] {
        if batch.is_empty() {
            continue;
        }
        progress.on_batch_start(batch.len(), opts.preview);
        results.extend(execute_batch(&batch, provider, &ctx, opts.jobs, progress)?);
        progress.on_batch_complete();
    }

    let mut summary = ExecuteSummary::default();
    for result in &results {
        summary.add_result(&result.result);
    }

    let mut snapshot = Snapshot {
        resources: results.iter().filter_map(|r| r.record.clone()).collect(),
        outputs: prior.outputs.clone(),
    };
    snapshot.resources.extend(plan.carried);

    let mut output_error = None;
    if let Some(program) = program {
        match program.resolve_outputs(&snapshot) {
            Ok(outputs) => snapshot.outputs = outputs,
            Err(e) => {
                log::warn!("Keeping previous outputs: {}", e);
                output_error = Some(e.to_string());
            }
        }
    } else {
        snapshot.outputs = PropertyMap::new();
    }

    log::debug!("Execution summary: {:?}", summary);

    Ok(Outcome {
        snapshot,
        summary,
        results,
        output_error,
    })
}

/// Outcome when the user declines: nothing runs, state is untouched
fn declined(plan: Plan, prior: &Snapshot) -> Outcome {
    let mut summary = ExecuteSummary::default();
    let results = plan
        .steps
        .into_iter()
        .map(|step| {
            let result = if step.op.is_change() {
                ApplyResult::Skipped {
                    reason: "Declined".into(),
                }
            } else {
                ApplyResult::NoChange
            };
            summary.add_result(&result);
            StepResult {
                urn: step.urn,
                op: step.op,
                result,
                record: step.prior,
            }
        })
        .collect();

    Outcome {
        snapshot: prior.clone(),
        summary,
        results,
        output_error: None,
    }
}

/// Execute a batch of steps
fn execute_batch<P: ProgressCallback>(
    steps: &[Step],
    provider: &Provider,
    ctx: &ApplyContext,
    jobs: usize,
    progress: &mut P,
) -> Result<Vec<StepResult>> {
    if jobs <= 1 || steps.len() == 1 {
        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            progress.on_step_start(&step.urn, step.op);
            let result = apply_step(step, provider, ctx);
            progress.on_step_complete(&step.urn, step.op, &result.result);
            results.push(result);
        }
        Ok(results)
    } else {
        execute_parallel(steps, provider, ctx, jobs, progress)
    }
}

/// Execute steps in parallel using rayon
fn execute_parallel<P: ProgressCallback>(
    steps: &[Step],
    provider: &Provider,
    ctx: &ApplyContext,
    jobs: usize,
    progress: &mut P,
) -> Result<Vec<StepResult>> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    // Progress callbacks are not thread-safe; report once everything is done
    let results: Vec<StepResult> = pool.install(|| {
        steps
            .par_iter()
            .map(|step| apply_step(step, provider, ctx))
            .collect()
    });

    for result in &results {
        progress.on_step_complete(&result.urn, result.op, &result.result);
    }

    Ok(results)
}

/// Apply a single step, turning errors into a failed result
fn apply_step(step: &Step, provider: &Provider, ctx: &ApplyContext) -> StepResult {
    let applied = match step.op {
        StepOp::Same => apply_same(step),
        StepOp::Create => apply_create(step, provider, ctx),
        StepOp::Update => apply_update(step, provider, ctx),
        StepOp::Replace => apply_replace(step, provider, ctx),
        StepOp::Delete => apply_delete(step, provider, ctx),
    };

    let (result, record) = match applied {
        Ok(done) => done,
        Err(e) => {
            log::warn!("{} {} failed: {}", step.op, step.urn, e);
            (
                ApplyResult::Failed {
                    error: e.to_string(),
                },
                step.prior.clone(),
            )
        }
    };

    if ctx.verbose {
        log::info!("{} {}: {:?}", step.op, step.urn, result);
    }

    StepResult {
        urn: step.urn.clone(),
        op: step.op,
        result,
        record,
    }
}

type Applied = (ApplyResult, Option<ResourceRecord>);

/// Nothing to do; the new inputs are recorded, outputs stay as they were
///
/// The record keeps its timestamps, so a run without changes leaves the
/// snapshot identical.
fn apply_same(step: &Step) -> Result<Applied> {
    let record = step.prior.as_ref().map(|prior| {
        if prior.inputs == step.inputs {
            prior.clone()
        } else {
            ResourceRecord {
                inputs: step.inputs.clone(),
                ..prior.clone()
            }
        }
    });
    Ok((ApplyResult::NoChange, record))
}

fn apply_create(step: &Step, provider: &Provider, ctx: &ApplyContext) -> Result<Applied> {
    let record = create_record(step, provider, ctx)?;
    Ok((ApplyResult::Created, Some(record)))
}

fn apply_update(step: &Step, provider: &Provider, ctx: &ApplyContext) -> Result<Applied> {
    let Some(prior) = step.prior.as_ref() else {
        return apply_create(step, provider, ctx);
    };

    let response = provider.update(
        ctx,
        UpdateRequest {
            id: prior.id.clone(),
            urn: step.urn.clone(),
            olds: prior.outputs.clone(),
            news: step.inputs.clone(),
        },
    )?;

    Ok((
        ApplyResult::Updated,
        Some(prior.updated(step.inputs.clone(), response.properties)),
    ))
}

fn apply_replace(step: &Step, provider: &Provider, ctx: &ApplyContext) -> Result<Applied> {
    let Some(prior) = step.prior.as_ref() else {
        return apply_create(step, provider, ctx);
    };

    let delete_first = step
        .diff
        .as_ref()
        .is_some_and(|d| d.delete_before_replace);

    if delete_first {
        delete_record(prior, provider, ctx)?;
        // The old resource is gone; a failed create leaves nothing behind
        return match create_record(step, provider, ctx) {
            Ok(record) => Ok((ApplyResult::Replaced, Some(record))),
            Err(e) => Ok((
                ApplyResult::Failed {
                    error: e.to_string(),
                },
                None,
            )),
        };
    }

    let record = create_record(step, provider, ctx)?;
    if let Err(e) = delete_record(prior, provider, ctx) {
        return Ok((
            ApplyResult::Failed {
                error: format!("replacement created, old resource not deleted: {e}"),
            },
            Some(record),
        ));
    }

    Ok((ApplyResult::Replaced, Some(record)))
}

fn apply_delete(step: &Step, provider: &Provider, ctx: &ApplyContext) -> Result<Applied> {
    if let Some(prior) = step.prior.as_ref() {
        delete_record(prior, provider, ctx)?;
    }
    Ok((ApplyResult::Deleted, None))
}

fn create_record(step: &Step, provider: &Provider, ctx: &ApplyContext) -> Result<ResourceRecord> {
    let response = provider.create(
        ctx,
        CreateRequest {
            urn: step.urn.clone(),
            properties: step.inputs.clone(),
        },
    )?;
    Ok(ResourceRecord::new(
        step.urn.clone(),
        response.id,
        step.inputs.clone(),
        response.properties,
    ))
}

/// Delete a recorded resource; previews only pretend
fn delete_record(record: &ResourceRecord, provider: &Provider, ctx: &ApplyContext) -> Result<()> {
    if ctx.preview {
        return Ok(());
    }
    provider.delete(
        ctx,
        DeleteRequest {
            id: record.id.clone(),
            urn: record.urn.clone(),
            properties: record.outputs.clone(),
        },
    )
}

/// Re-read every recorded resource and return the refreshed snapshot
///
/// Also returns the names of resources whose outputs changed.
pub fn refresh(provider: &Provider, prior: &Snapshot) -> Result<(Snapshot, Vec<String>)> {
    let ctx = ApplyContext::default();
    let mut changed = Vec::new();
    let mut resources = Vec::with_capacity(prior.resources.len());

    for record in &prior.resources {
        let response = provider.read(
            &ctx,
            ReadRequest {
                id: record.id.clone(),
                urn: record.urn.clone(),
                properties: record.outputs.clone(),
            },
        )?;

        if response.properties == record.outputs && response.id == record.id {
            resources.push(record.clone());
        } else {
            log::info!("{} changed outside of the program", record.urn);
            changed.push(record.name().to_string());
            let mut updated = record.updated(record.inputs.clone(), response.properties);
            updated.id = response.id;
            resources.push(updated);
        }
    }

    Ok((
        Snapshot {
            resources,
            outputs: prior.outputs.clone(),
        },
        changed,
    ))
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(
    plan: Plan,
    provider: &Provider,
    program: Option<&Program>,
    prior: &Snapshot,
    opts: &ExecuteOptions,
) -> Result<Outcome> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(
        plan,
        provider,
        program,
        prior,
        opts,
        &mut NoProgress,
        &mut AutoConfirm,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::program::OutputExpr;
    use crate::property::PropertyValue;
    use crate::testing::{counter_program, counter_provider, record_for, set_label};

    fn sequential() -> ExecuteOptions {
        ExecuteOptions {
            jobs: 1,
            ..Default::default()
        }
    }

    fn prior_of(records: Vec<ResourceRecord>) -> Snapshot {
        Snapshot {
            resources: records,
            outputs: PropertyMap::new(),
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let provider = counter_provider();
        let outcome = execute(
            Plan::default(),
            &provider,
            None,
            &Snapshot::default(),
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(outcome.summary.total(), 0);
        assert!(outcome.snapshot.is_empty());
    }

    #[test]
    fn test_execute_creates_and_resolves_outputs() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", 1), ("b", 2)]);
        program.export("value", OutputExpr::reference("b", "value"));
        let prior = Snapshot::default();

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.created, 2);
        assert_eq!(outcome.snapshot.resources.len(), 2);
        assert_eq!(
            outcome.snapshot.outputs.get("value"),
            Some(&PropertyValue::Number(3.0))
        );
        assert!(outcome.output_error.is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let provider = counter_provider();
        let program = counter_program(&[("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
        let prior = Snapshot::default();

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let opts = ExecuteOptions {
            jobs: 3,
            ..Default::default()
        };
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &opts).unwrap();

        let names: Vec<&str> = outcome
            .snapshot
            .resources
            .iter()
            .map(ResourceRecord::name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(outcome.summary.created, 4);
    }

    #[test]
    fn test_preview_projects_without_confirming() {
        let provider = counter_provider();
        let program = counter_program(&[("a", 1)]);
        let prior = prior_of(vec![record_for("gone", 1, "x")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let opts = ExecuteOptions {
            preview: true,
            ..sequential()
        };
        let outcome = execute(
            plan,
            &provider,
            Some(&program),
            &prior,
            &opts,
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(outcome.summary.created, 1);
        assert_eq!(outcome.summary.deleted, 1);
        let created = outcome.snapshot.find("a").unwrap();
        assert!(created.outputs.get("value").unwrap().is_computed());
    }

    #[test]
    fn test_declined_keeps_prior_state() {
        let provider = counter_provider();
        let program = counter_program(&[("a", 1), ("b", 1)]);
        let prior = prior_of(vec![record_for("a", 1, "")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute(
            plan,
            &provider,
            Some(&program),
            &prior,
            &sequential(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(outcome.summary.skipped, 1);
        assert_eq!(outcome.summary.same, 1);
        assert_eq!(outcome.snapshot, prior);
    }

    #[test]
    fn test_same_keeps_outputs_and_records_inputs() {
        let provider = counter_provider();
        let program = counter_program(&[("a", 1)]);
        let mut prior = prior_of(vec![record_for("a", 1, "")]);
        prior.resources[0].outputs.insert("value", 42i64);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute(
            plan,
            &provider,
            Some(&program),
            &prior,
            &sequential(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        let record = outcome.snapshot.find("a").unwrap();
        assert_eq!(record.outputs.get("value"), Some(&PropertyValue::Number(42.0)));
        assert_eq!(record.inputs, PropertyMap::new().with("start", 1i64));
        assert_eq!(outcome.summary.same, 1);
    }

    #[test]
    fn test_update_and_replace() {
        let provider = counter_provider();
        let mut program = counter_program(&[("label", 1), ("start", 7)]);
        set_label(&mut program, "label", "new");
        let prior = prior_of(vec![record_for("label", 1, "old"), record_for("start", 1, "")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.updated, 1);
        assert_eq!(outcome.summary.replaced, 1);
        let updated = outcome.snapshot.find("label").unwrap();
        assert_eq!(updated.outputs.string("label"), Some("new"));
        assert_eq!(updated.created_at, prior.resources[0].created_at);
        let replaced = outcome.snapshot.find("start").unwrap();
        assert_eq!(replaced.outputs.get("value"), Some(&PropertyValue::Number(8.0)));
    }

    #[test]
    fn test_failed_create_continues_and_keeps_prior() {
        let provider = counter_provider();
        let program = counter_program(&[("bad", -1), ("good", 1), ("kept", 9)]);
        let prior = prior_of(vec![record_for("kept", 1, "")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.created, 1);
        assert_eq!(outcome.summary.replaced, 1);
        assert!(outcome.snapshot.find("bad").is_none());
        assert!(outcome.snapshot.find("good").is_some());
    }

    #[test]
    fn test_failed_delete_keeps_record() {
        let provider = counter_provider();
        let prior = prior_of(vec![record_for("a", 1, "stuck"), record_for("b", 1, "")]);

        let plan = Plan::destroy(&prior);
        let outcome = execute_simple(plan, &provider, None, &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.deleted, 1);
        assert_eq!(outcome.summary.failed, 1);
        let names: Vec<&str> = outcome
            .snapshot
            .resources
            .iter()
            .map(ResourceRecord::name)
            .collect();
        assert_eq!(names, vec!["a"]);
        assert!(outcome.snapshot.outputs.is_empty());
    }

    #[test]
    fn test_unresolvable_output_keeps_previous() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", 1)]);
        program.export("missing", OutputExpr::reference("a", "nope"));
        let mut prior = Snapshot::default();
        prior.outputs.insert("missing", "before");

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert!(outcome.output_error.is_some());
        assert_eq!(outcome.snapshot.outputs.string("missing"), Some("before"));
    }

    #[test]
    fn test_same_with_equal_inputs_keeps_record() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", 1)]);
        set_label(&mut program, "a", "x");
        let prior = prior_of(vec![record_for("a", 1, "x")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.same, 1);
        assert_eq!(outcome.snapshot, prior);
    }

    #[test]
    fn test_same_with_new_inputs_keeps_timestamps() {
        let provider = counter_provider();
        let program = counter_program(&[("a", 1)]);
        let prior = prior_of(vec![record_for("a", 1, "")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        let record = outcome.snapshot.find("a").unwrap();
        assert_ne!(record.inputs, prior.resources[0].inputs);
        assert_eq!(record.updated_at, prior.resources[0].updated_at);
        assert_eq!(record.created_at, prior.resources[0].created_at);
    }

    #[test]
    fn test_delete_before_replace() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", 5)]);
        set_label(&mut program, "a", "dbr");
        let prior = prior_of(vec![record_for("a", 1, "dbr")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        assert!(plan.steps[0].diff.as_ref().unwrap().delete_before_replace);
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.replaced, 1);
        let record = outcome.snapshot.find("a").unwrap();
        assert_eq!(record.outputs.get("value"), Some(&PropertyValue::Number(6.0)));
    }

    #[test]
    fn test_delete_before_replace_failed_create_drops_record() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", -1)]);
        set_label(&mut program, "a", "dbr");
        let prior = prior_of(vec![record_for("a", 1, "dbr")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.failed, 1);
        assert!(matches!(outcome.results[0].result, ApplyResult::Failed { .. }));
        assert!(outcome.results[0].record.is_none());
        assert!(outcome.snapshot.find("a").is_none());
    }

    #[test]
    fn test_delete_before_replace_failed_delete_creates_nothing() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", 5)]);
        set_label(&mut program, "a", "dbr");
        let prior = prior_of(vec![record_for("a", 1, "stuck")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.snapshot.find("a"), prior.find("a"));
    }

    #[test]
    fn test_replacement_kept_when_old_delete_fails() {
        let provider = counter_provider();
        let mut program = counter_program(&[("a", 5)]);
        set_label(&mut program, "a", "stuck");
        let prior = prior_of(vec![record_for("a", 1, "stuck")]);

        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();
        let outcome = execute_simple(plan, &provider, Some(&program), &prior, &sequential()).unwrap();

        assert_eq!(outcome.summary.failed, 1);
        match &outcome.results[0].result {
            ApplyResult::Failed { error } => {
                assert!(error.starts_with("replacement created, old resource not deleted"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let record = outcome.snapshot.find("a").unwrap();
        assert_eq!(record.outputs.get("value"), Some(&PropertyValue::Number(6.0)));
    }

    #[test]
    fn test_refresh_unchanged() {
        let provider = counter_provider();
        let prior = prior_of(vec![record_for("a", 1, "")]);

        let (snapshot, changed) = refresh(&provider, &prior).unwrap();
        assert!(changed.is_empty());
        assert_eq!(snapshot, prior);
    }

    #[test]
    fn test_refresh_detects_drift() {
        let provider = counter_provider();
        let prior = prior_of(vec![record_for("a", 1, ""), record_for("b", 1, "drift")]);

        let (snapshot, changed) = refresh(&provider, &prior).unwrap();
        assert_eq!(changed, vec!["b"]);

        assert_eq!(snapshot.find("a"), prior.find("a"));
        let drifted = snapshot.find("b").unwrap();
        assert_eq!(drifted.id, "b-recreated");
        assert_eq!(drifted.outputs.get("value"), Some(&PropertyValue::Number(102.0)));
        assert_eq!(drifted.inputs, prior.resources[1].inputs);
        assert_eq!(drifted.created_at, prior.resources[1].created_at);
    }
}
