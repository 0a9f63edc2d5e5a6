//! Validated string content.
//!
//! Once you hold a `NonEmptyString`, you know it is not blank. Identifiers,
//! principal names and raw credential values are all built on it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string guaranteed to contain at least one non-whitespace character.
///
/// # Invariants
///
/// - Content is never empty after `trim()`
/// - The original content is kept verbatim; no trimming is applied
///
/// # Serde
///
/// Serializes as a plain string. Deserialization re-validates and fails on
/// blank input, so a persisted snapshot can never smuggle an empty id in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{what} cannot be empty")]
pub struct EmptyValueError {
    what: &'static str,
}

impl EmptyValueError {
    #[must_use]
    pub const fn new(what: &'static str) -> Self {
        Self { what }
    }

    /// Name of the value that failed validation.
    #[must_use]
    pub const fn what(self) -> &'static str {
        self.what
    }
}

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyValueError> {
        Self::named("value", value)
    }

    /// Validate `value`, reporting failures under the given name.
    pub fn named(what: &'static str, value: impl Into<String>) -> Result<Self, EmptyValueError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyValueError::new(what))
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Returns true if `value` has content after trimming.
#[must_use]
pub fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
