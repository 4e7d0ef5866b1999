//! Resource identity: URNs and type tokens

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const URN_PREFIX: &str = "urn:pulumi:";

/// A type token of the form `package:module:Type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeToken {
    package: String,
    module: String,
    type_name: String,
}

impl TypeToken {
    pub fn new(package: &str, module: &str, type_name: &str) -> Self {
        Self {
            package: package.to_string(),
            module: module.to_string(),
            type_name: type_name.to_string(),
        }
    }

    /// Parse a `package:module:Type` token
    pub fn parse(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split(':').collect();
        match parts.as_slice() {
            [package, module, type_name]
                if !package.is_empty() && !module.is_empty() && !type_name.is_empty() =>
            {
                Ok(Self::new(package, module, type_name))
            }
            _ => Err(Error::InvalidToken(token.to_string())),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The `module:Type` part, ignoring the package
    pub fn module_member(&self) -> String {
        format!("{}:{}", self.module, self.type_name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.package, self.module, self.type_name)
    }
}

impl TryFrom<String> for TypeToken {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TypeToken> for String {
    fn from(token: TypeToken) -> Self {
        token.to_string()
    }
}

/// Unique resource name: `urn:pulumi:{stack}::{project}::{type}::{name}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
    stack: String,
    project: String,
    type_token: TypeToken,
    name: String,
}

impl Urn {
    pub fn new(stack: &str, project: &str, type_token: TypeToken, name: &str) -> Self {
        Self {
            stack: stack.to_string(),
            project: project.to_string(),
            type_token,
            name: name.to_string(),
        }
    }

    /// Parse a URN string
    ///
    /// The name segment may itself contain `::`, so the string is split at
    /// most four times.
    pub fn parse(urn: &str) -> Result<Self> {
        let rest = urn
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| Error::InvalidUrn(urn.to_string()))?;

        let parts: Vec<&str> = rest.splitn(4, "::").collect();
        let [stack, project, type_token, name] = parts.as_slice() else {
            return Err(Error::InvalidUrn(urn.to_string()));
        };

        if stack.is_empty() || project.is_empty() || name.is_empty() {
            return Err(Error::InvalidUrn(urn.to_string()));
        }

        let type_token =
            TypeToken::parse(type_token).map_err(|_| Error::InvalidUrn(urn.to_string()))?;

        Ok(Self::new(stack, project, type_token, name))
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn type_token(&self) -> &TypeToken {
        &self.type_token
    }

    /// Logical name of the resource
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}::{}::{}::{}",
            URN_PREFIX, self.stack, self.project, self.type_token, self.name
        )
    }
}

impl TryFrom<String> for Urn {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.to_string()
    }
}
