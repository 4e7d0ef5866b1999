//! Execution engine - CLI executor with UI integration

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyResult, ConfirmCallback, ExecuteOptions, ExecuteSummary, Outcome, Plan, Program,
    Provider, Snapshot,
};

use super::differ::display_plan;
use crate::progress::{ApplyProgress, result_symbol};

/// Options for a CLI run (adds confirmation and display flags to the engine's)
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Project results without changing anything
    pub preview: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Show line diffs for changed strings
    pub show_diff: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            preview: false,
            jobs: 4,
            yes: false,
            show_diff: false,
            verbose: false,
            quiet: false,
        }
    }
}

/// Display the plan, confirm, execute, and report
pub fn run(
    plan: Plan,
    provider: &Provider,
    program: Option<&Program>,
    prior: &Snapshot,
    opts: &RunOptions,
) -> Result<Outcome> {
    display_plan(&plan, opts.show_diff, opts.verbose);

    let exec_opts = ExecuteOptions {
        preview: opts.preview,
        jobs: opts.jobs,
        verbose: opts.verbose,
    };
    let mut progress = ApplyProgress::new(opts.quiet);
    let mut confirm = PromptConfirm::new(opts.yes);

    let outcome = declarative::execute(
        plan,
        provider,
        program,
        prior,
        &exec_opts,
        &mut progress,
        &mut confirm,
    )?;

    if opts.preview {
        println!();
        println!("  {} Preview only - no changes made", "ℹ".blue());
    } else if confirm.declined {
        println!();
        println!("  {} Aborted", "✗".red());
    } else {
        print_results(&outcome, opts.verbose);
        print_summary(&outcome.summary);
    }

    if let Some(reason) = &outcome.output_error {
        println!();
        println!("  {} Outputs not updated: {}", "⚠".yellow(), reason);
    }

    Ok(outcome)
}

// ============================================================================
// Confirmation
// ============================================================================

/// Asks on the terminal, unless `--yes` was given
pub struct PromptConfirm {
    yes: bool,
    declined: bool,
}

impl PromptConfirm {
    pub fn new(yes: bool) -> Self {
        Self {
            yes,
            declined: false,
        }
    }
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> declarative::Result<bool> {
        if self.yes {
            return Ok(true);
        }

        if !console::Term::stderr().is_term() {
            crate::ui::warn("Not a terminal; pass --yes to apply without a prompt");
            self.declined = true;
            return Ok(false);
        }

        println!();
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| declarative::Error::Confirm(e.to_string()))?;

        self.declined = !confirmed;
        Ok(confirmed)
    }
}

/// Ask a yes/no question directly, for commands outside the engine
pub fn confirm_proceed(prompt: &str, yes: bool) -> Result<bool> {
    Ok(PromptConfirm::new(yes).confirm(prompt)?)
}

// ============================================================================
// Reporting
// ============================================================================

fn print_results(outcome: &Outcome, verbose: bool) {
    let interesting: Vec<_> = outcome
        .results
        .iter()
        .filter(|r| verbose || r.result != ApplyResult::NoChange)
        .collect();
    if interesting.is_empty() {
        return;
    }

    println!();
    for step in interesting {
        let symbol = result_symbol(&step.result);
        let symbol = match &step.result {
            ApplyResult::Failed { .. } => symbol.red(),
            ApplyResult::Skipped { .. } => symbol.dimmed(),
            _ => symbol.green(),
        };
        let detail = match &step.result {
            ApplyResult::Failed { error } => error.red().to_string(),
            ApplyResult::Skipped { reason } => reason.dimmed().to_string(),
            _ => step.op.to_string().dimmed().to_string(),
        };
        println!("  {} {:<30} {}", symbol, step.urn.name(), detail);
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Stack updated successfully!", "✓".green().bold());
    } else {
        println!("  {} Stack updated with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.replaced > 0 {
        println!("    • {} resources replaced", summary.replaced);
    }
    if summary.deleted > 0 {
        println!("    • {} resources deleted", summary.deleted);
    }
    if summary.same > 0 {
        println!("    • {} resources unchanged", summary.same);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_skips_prompt() {
        let mut confirm = PromptConfirm::new(true);
        assert!(confirm.confirm("Apply changes?").unwrap());
        assert!(!confirm.declined);
    }

    #[test]
    fn test_run_applies_plan_with_yes() {
        let provider = statefulstring_provider::provider();
        let program = crate::schema::ProgramFile::parse(include_str!("../../demos/nodejs.toml"))
            .unwrap()
            .into_program(&provider)
            .unwrap();
        let prior = Snapshot::default();
        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();

        let outcome = run(
            plan,
            &provider,
            Some(&program),
            &prior,
            &RunOptions {
                yes: true,
                jobs: 1,
                quiet: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.summary.created, 1);
        assert_eq!(
            outcome.snapshot.outputs.object("output").unwrap().string("value"),
            Some("Hello, World!333")
        );
    }

    #[test]
    fn test_preview_projects_computed_result() {
        let provider = statefulstring_provider::provider();
        let program = crate::schema::ProgramFile::parse(include_str!("../../demos/python.toml"))
            .unwrap()
            .into_program(&provider)
            .unwrap();
        let prior = Snapshot::default();
        let plan = Plan::build(&provider, &program, &prior, "dev").unwrap();

        let outcome = run(
            plan,
            &provider,
            Some(&program),
            &prior,
            &RunOptions {
                preview: true,
                quiet: true,
                ..Default::default()
            },
        )
        .unwrap();

        let value = outcome.snapshot.outputs.object("output").unwrap().get("value");
        assert!(value.unwrap().is_computed());
    }
}
