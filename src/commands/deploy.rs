//! Deployment commands
//!
//! - `preview` - Show what `up` would change
//! - `up` - Make the stack match the program
//! - `refresh` - Record the current state of every resource
//! - `destroy` - Delete every resource in the stack

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{Outcome, Plan, Snapshot};

use super::Session;
use crate::Context;
use crate::cli::{PreviewArgs, UpArgs};
use crate::engine::{self, RunOptions};
use crate::progress;
use crate::ui;

// ============================================================================
// Preview
// ============================================================================

pub fn preview(ctx: &Context, args: PreviewArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    preview_with(&session, ctx, args.target.as_deref(), args.diff)?;
    Ok(())
}

pub(crate) fn preview_with(
    session: &Session,
    ctx: &Context,
    target: Option<&str>,
    show_diff: bool,
) -> Result<Outcome> {
    ui::header(&format!(
        "Previewing {} ({})",
        session.project(),
        session.stack
    ));

    let prior = session.prior()?;
    let plan = session.plan(&prior)?.filter_by_target(target);

    let outcome = engine::run(
        plan,
        &session.provider,
        Some(&session.program),
        &prior,
        &RunOptions {
            preview: true,
            jobs: session.settings.jobs(None),
            show_diff,
            verbose: ctx.verbose > 0,
            quiet: ctx.quiet,
            ..Default::default()
        },
    )?;

    ui::section("Outputs");
    ui::print_outputs(&outcome.snapshot.outputs);
    Ok(outcome)
}

// ============================================================================
// Up
// ============================================================================

pub fn up(ctx: &Context, args: UpArgs) -> Result<()> {
    let session = Session::open(ctx)?;
    let opts = RunOptions {
        preview: false,
        jobs: session.settings.jobs(args.jobs),
        yes: args.yes,
        show_diff: args.diff,
        verbose: ctx.verbose > 0,
        quiet: ctx.quiet,
    };
    up_with(&session, args.target.as_deref(), &opts)?;
    Ok(())
}

pub(crate) fn up_with(
    session: &Session,
    target: Option<&str>,
    opts: &RunOptions,
) -> Result<Outcome> {
    ui::header(&format!("Updating {} ({})", session.project(), session.stack));

    let prior = session.prior()?;
    let plan = session.plan(&prior)?.filter_by_target(target);

    let outcome = engine::run(
        plan,
        &session.provider,
        Some(&session.program),
        &prior,
        opts,
    )?;

    save_if_changed(session, &prior, &outcome.snapshot)?;

    if !outcome.snapshot.outputs.is_empty() {
        ui::section("Outputs");
        ui::print_outputs(&outcome.snapshot.outputs);
    }

    if !outcome.is_success() {
        bail!("{} resource(s) failed to update", outcome.summary.failed);
    }
    Ok(outcome)
}

// ============================================================================
// Refresh
// ============================================================================

pub fn refresh(ctx: &Context, yes: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    refresh_with(&session, ctx, yes)?;
    Ok(())
}

/// Returns the names of resources whose recorded state changed
pub(crate) fn refresh_with(session: &Session, ctx: &Context, yes: bool) -> Result<Vec<String>> {
    ui::header(&format!(
        "Refreshing {} ({})",
        session.project(),
        session.stack
    ));

    let prior = session.prior()?;
    if prior.is_empty() {
        ui::info("Stack has no resources");
        return Ok(Vec::new());
    }

    let pb = if ctx.quiet {
        indicatif::ProgressBar::hidden()
    } else {
        progress::spinner(&format!("Reading {} resource(s)", prior.resources.len()))
    };
    let refreshed = declarative::refresh(&session.provider, &prior);
    pb.finish_and_clear();
    let (snapshot, changed) = refreshed?;

    if changed.is_empty() {
        ui::success("Recorded state is up to date");
        return Ok(changed);
    }

    println!();
    for name in &changed {
        println!("  {} {}", "~".yellow(), name);
    }

    if !engine::confirm_proceed("Record refreshed state?", yes)? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(Vec::new());
    }

    session.store.save(&session.stack, &snapshot)?;
    ui::success(&format!("Refreshed {} resource(s)", changed.len()));
    Ok(changed)
}

// ============================================================================
// Destroy
// ============================================================================

pub fn destroy(ctx: &Context, yes: bool) -> Result<()> {
    let session = Session::open(ctx)?;
    destroy_with(&session, ctx, yes)?;
    Ok(())
}

pub(crate) fn destroy_with(session: &Session, ctx: &Context, yes: bool) -> Result<Outcome> {
    ui::header(&format!(
        "Destroying {} ({})",
        session.project(),
        session.stack
    ));

    let prior = session.prior()?;
    let plan = Plan::destroy(&prior);

    let outcome = engine::run(
        plan,
        &session.provider,
        None,
        &prior,
        &RunOptions {
            preview: false,
            jobs: session.settings.jobs(None),
            yes,
            verbose: ctx.verbose > 0,
            quiet: ctx.quiet,
            ..Default::default()
        },
    )?;

    save_if_changed(session, &prior, &outcome.snapshot)?;

    if !outcome.is_success() {
        bail!("{} resource(s) failed to delete", outcome.summary.failed);
    }
    if outcome.snapshot.is_empty() && !prior.is_empty() {
        ui::dim(&format!(
            "Stack '{}' is empty; remove it with `stack rm {}`",
            session.stack, session.stack
        ));
    }
    Ok(outcome)
}

fn save_if_changed(session: &Session, prior: &Snapshot, snapshot: &Snapshot) -> Result<()> {
    if snapshot == prior {
        log::debug!("State unchanged, not saving");
        return Ok(());
    }
    let path = session.store.save(&session.stack, snapshot)?;
    log::info!("Saved state to {}", path.display());
    Ok(())
}
