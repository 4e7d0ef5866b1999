//! Command implementations
//!
//! - `deploy` - preview, up, refresh, destroy
//! - `output` - read stack outputs
//! - `stack` - list and remove stacks
//! - `schema` - print the package schema

pub mod deploy;
pub mod output;
pub mod schema;
pub mod stack;

use anyhow::{Context as AnyhowContext, Result};
use declarative::{Plan, Program, Provider, Snapshot};

use crate::Context;
use crate::config::{self, Settings};
use crate::state::StackStore;

/// Everything a command needs to work on one stack of one program
pub struct Session {
    pub settings: Settings,
    pub provider: Provider,
    pub program: Program,
    pub store: StackStore,
    pub stack: String,
}

impl Session {
    /// Load settings, the program file and the project's stack store
    pub fn open(ctx: &Context) -> Result<Self> {
        let settings = Settings::load()?;
        let provider = statefulstring_provider::provider();
        let path = config::program_path(ctx.program.as_deref());
        let program = crate::schema::load_program(&path, &provider)?;
        let store = StackStore::open(program.project())?;
        let stack = settings.stack(ctx.stack.as_deref());

        log::debug!(
            "Session: project {}, stack {}, state in {}",
            program.project(),
            stack,
            store.dir().display()
        );

        Ok(Self {
            settings,
            provider,
            program,
            store,
            stack,
        })
    }

    pub fn project(&self) -> &str {
        self.program.project()
    }

    /// Last recorded snapshot of the stack
    pub fn prior(&self) -> Result<Snapshot> {
        self.store.load(&self.stack)
    }

    /// Plan the program against a prior snapshot
    pub fn plan(&self, prior: &Snapshot) -> Result<Plan> {
        Plan::build(&self.provider, &self.program, prior, &self.stack)
            .with_context(|| format!("Could not plan stack '{}'", self.stack))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tempfile::TempDir;

    /// A session over a demo program with state kept in a temp dir
    pub fn session(demo: &str, dir: &TempDir) -> Session {
        let provider = statefulstring_provider::provider();
        let program = crate::schema::ProgramFile::parse(demo)
            .unwrap()
            .into_program(&provider)
            .unwrap();
        let store = StackStore::new(dir.path(), program.project()).unwrap();
        Session {
            settings: Settings::default(),
            provider,
            program,
            store,
            stack: "dev".to_string(),
        }
    }

    pub fn quiet() -> Context {
        Context {
            verbose: 0,
            quiet: true,
            stack: None,
            program: None,
        }
    }
}
