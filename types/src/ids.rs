//! Identifiers for authorizations and registered clients.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::proofs::{EmptyValueError, NonEmptyString};

/// Identifier of a stored authorization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationId(NonEmptyString);

impl AuthorizationId {
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyValueError> {
        NonEmptyString::named("authorization id", id).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for AuthorizationId {
    type Error = EmptyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for AuthorizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key of a registered client. The client itself lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(NonEmptyString);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyValueError> {
        NonEmptyString::named("client id", id).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for ClientId {
    type Error = EmptyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
