//! Error types for the declarative crate

use crate::types::CheckFailure;
use thiserror::Error;

/// Errors that can occur while checking, planning or applying resources
#[derive(Error, Debug)]
pub enum Error {
    /// No handler is registered for a type token
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// URN does not follow `urn:pulumi:stack::project::type::name`
    #[error("invalid URN: {0}")]
    InvalidUrn(String),

    /// Type token does not follow `package:module:Type`
    #[error("invalid type token: {0}")]
    InvalidToken(String),

    /// Properties could not be decoded into a resource's typed inputs or state
    #[error("failed to decode {what} for {token}: {source}")]
    Decode {
        token: String,
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Typed inputs or state could not be encoded into properties
    #[error("failed to encode properties: {0}")]
    Encode(#[source] serde_json::Error),

    /// One or more resources failed input validation
    #[error("{}", format_check_failures(.0))]
    CheckFailed(Vec<(String, CheckFailure)>),

    /// The resource cannot be updated in place
    #[error("resource type {0} does not support in-place updates")]
    UpdateUnsupported(String),

    /// The same logical name was declared twice
    #[error("duplicate resource name: {0}")]
    DuplicateResource(String),

    /// An output refers to a resource or property that does not exist
    #[error("unresolved reference: ${{{0}}}")]
    UnresolvedReference(String),

    /// A resource operation reported a failure
    #[error("{0}")]
    Provider(String),

    /// The confirmation prompt could not be shown
    #[error("confirmation failed: {0}")]
    Confirm(String),

    /// Failed to build the worker pool
    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Build a provider error from any displayable value
    pub fn provider(msg: impl std::fmt::Display) -> Self {
        Self::Provider(msg.to_string())
    }
}

fn format_check_failures(failures: &[(String, CheckFailure)]) -> String {
    let mut msg = format!("{} input validation failure(s)", failures.len());
    for (name, failure) in failures {
        msg.push_str(&format!(
            "\n  {}: {}: {}",
            name, failure.property, failure.reason
        ));
    }
    msg
}

/// Result type for declarative operations
pub type Result<T> = std::result::Result<T, Error>;
