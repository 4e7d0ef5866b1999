use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "statefulstring")]
#[command(version)]
#[command(about = "Deploy StatefulString and Random resources from a program file", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stack to operate on (defaults to the configured stack)
    #[arg(short, long, global = true, env = "STATEFULSTRING_STACK")]
    pub stack: Option<String>,

    /// Program file (defaults to ./statefulstring.toml)
    #[arg(short, long, global = true, env = "STATEFULSTRING_PROGRAM")]
    pub program: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what `up` would change, without changing anything
    Preview(PreviewArgs),

    /// Create or update the stack's resources
    Up(UpArgs),

    /// Re-read every resource and record its current state
    Refresh {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every resource in the stack
    Destroy {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the stack's outputs
    Output {
        /// Only this output
        name: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage stacks
    #[command(subcommand)]
    Stack(StackCommand),

    /// Print the provider's package schema as JSON
    Schema,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Deployment Commands
// ============================================================================

#[derive(Parser)]
pub struct PreviewArgs {
    /// Only resources with this name or type
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show line diffs for changed strings
    #[arg(short, long)]
    pub diff: bool,
}

#[derive(Parser)]
pub struct UpArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs (defaults to the configured value)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Only resources with this name or type
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show line diffs for changed strings
    #[arg(short, long)]
    pub diff: bool,
}

// ============================================================================
// Stack Commands
// ============================================================================

#[derive(Subcommand)]
pub enum StackCommand {
    /// List the project's stacks
    #[command(alias = "ls")]
    List,

    /// Remove a stack's state
    Rm {
        /// Stack to remove
        name: String,

        /// Remove even if the stack still has resources
        #[arg(short, long)]
        force: bool,
    },
}
