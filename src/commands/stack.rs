//! Stack management

use anyhow::{Result, bail};
use colored::Colorize;

use super::Session;
use crate::Context;
use crate::cli::StackCommand;
use crate::ui;

pub fn run(ctx: &Context, cmd: StackCommand) -> Result<()> {
    let session = Session::open(ctx)?;
    match cmd {
        StackCommand::List => list(&session),
        StackCommand::Rm { name, force } => rm(&session, &name, force),
    }
}

fn list(session: &Session) -> Result<()> {
    let stacks = session.store.list()?;

    if stacks.is_empty() {
        ui::info(&format!("No stacks for project '{}'", session.project()));
        return Ok(());
    }

    ui::header(&format!("Stacks of {}", session.project()));
    for stack in &stacks {
        let marker = if stack.name == session.stack {
            "*".green().bold()
        } else {
            " ".normal()
        };
        let updated = stack.last_updated.map_or_else(
            || "unreadable".red().to_string(),
            |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        println!(
            "  {} {:<20} {:>3} resource(s)  {}",
            marker,
            stack.name,
            stack.resources,
            updated.dimmed()
        );
    }
    Ok(())
}

pub(crate) fn rm(session: &Session, name: &str, force: bool) -> Result<()> {
    let snapshot = session.store.load(name)?;
    if !snapshot.is_empty() && !force {
        bail!(
            "Stack '{}' still has {} resource(s); run `destroy` first or pass --force",
            name,
            snapshot.resources.len()
        );
    }

    if !session.store.remove(name)? {
        bail!("Stack '{}' does not exist", name);
    }

    ui::success(&format!("Removed stack '{name}'"));
    Ok(())
}
