mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod schema;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Stack chosen with `--stack`
    pub stack: Option<String>,
    /// Program file chosen with `--program`
    pub program: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        stack: cli.stack,
        program: cli.program,
    };

    match cli.command {
        Command::Preview(args) => commands::deploy::preview(&ctx, args),
        Command::Up(args) => commands::deploy::up(&ctx, args),
        Command::Refresh { yes } => commands::deploy::refresh(&ctx, yes),
        Command::Destroy { yes } => commands::deploy::destroy(&ctx, yes),
        Command::Output { name, json } => commands::output::run(&ctx, name.as_deref(), json),
        Command::Stack(cmd) => commands::stack::run(&ctx, cmd),
        Command::Schema => commands::schema::run(),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "statefulstring", &mut io::stdout());
            Ok(())
        }
    }
}
