//! # statefulstring-provider
//!
//! Resources of the `statefulstring` package:
//!
//! - `StatefulString`: holds a string that is only replaced when one of its
//!   triggers changes
//! - `Random`: a random alphanumeric string of a fixed length
//!
//! Both are declared in module `provider` and published under `index`, so
//! their tokens are `statefulstring:index:StatefulString` and
//! `statefulstring:index:Random`.

pub mod random;
pub mod stateful_string;

pub use random::{Random, RandomArgs, RandomState};
pub use stateful_string::{StatefulString, StatefulStringArgs, StatefulStringState};

use declarative::Provider;
use semver::Version;

/// Package name
pub const NAME: &str = "statefulstring";

/// Provider version, taken from the crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the provider with every resource registered
pub fn provider() -> Provider {
    let version = Version::parse(VERSION).expect("crate version is valid semver");

    Provider::builder(NAME, version)
        .module("provider", "index")
        .resource(StatefulString)
        .resource(Random)
        .build()
}
