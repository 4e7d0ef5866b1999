//! # Declarative
//!
//! A small resource provider framework and deployment engine.
//!
//! Resources are written once as typed [`CustomResource`]s and registered
//! with a [`Provider`]. A [`Program`] declares the resources a stack should
//! have; the engine compares it with the last recorded [`Snapshot`] and
//! converges the two.
//!
//! ## Core Concepts
//!
//! - **Provider**: a named, versioned set of resources addressed by type token
//! - **Program**: declared resources plus exported outputs
//! - **Plan**: the create/update/replace/delete steps for one stack
//! - **Executor**: applies a plan, optionally in parallel, and records state
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, Plan, Program, Provider, Snapshot, execute_simple};
//!
//! let provider = Provider::builder("pkg", semver::Version::new(0, 1, 0))
//!     .module("provider", "index")
//!     .resource(MyResource)
//!     .build();
//!
//! let prior = Snapshot::default();
//! let plan = Plan::build(&provider, &program, &prior, "dev")?;
//! let outcome = execute_simple(plan, &provider, Some(&program), &prior, &ExecuteOptions::default())?;
//! ```
//!
//! ## Callback Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This keeps the engine free of any particular terminal UI.

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod program;
pub mod property;
pub mod provider;
pub mod resource;
pub mod snapshot;
pub mod types;
pub mod urn;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use diff::{diff_properties, diff_string_maps};
pub use error::{Error, Result};
pub use executor::{Outcome, StepResult, execute, execute_simple, refresh};
pub use planner::{Plan, PlanSummary, Step};
pub use program::{OutputExpr, Program, ResourceDecl};
pub use property::{PropertyMap, PropertyValue};
pub use provider::{Provider, ProviderBuilder};
pub use resource::{
    CustomResource, Inferred, PropertySpec, PropertyType, ResourceHandler, ResourceSchema,
    check_inputs,
};
pub use snapshot::{ResourceRecord, Snapshot};
pub use types::{
    ApplyResult, CheckFailure, CheckRequest, CheckResponse, CreateRequest, CreateResponse,
    DeleteRequest, DiffKind, DiffRequest, DiffResponse, ExecuteOptions, ExecuteSummary,
    PropertyDiff, ReadRequest, ReadResponse, StepOp, UpdateRequest, UpdateResponse,
};
pub use urn::{TypeToken, Urn};
