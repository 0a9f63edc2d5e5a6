//! Error taxonomy for building and reading authorizations.
//!
//! Absence of a token or attribute is never an error; lookups return `Option`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// `build()` was called without a principal name.
    #[error("principal name cannot be empty")]
    MissingPrincipalName,
    /// `build()` was called without a grant type.
    #[error("authorization grant type cannot be unset")]
    MissingGrantType,
    /// A caller passed an argument that can never be valid.
    #[error("invalid {argument}: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: &'static str,
    },
}

impl AuthorizationError {
    pub(crate) const fn empty(argument: &'static str) -> Self {
        AuthorizationError::InvalidArgument {
            argument,
            reason: "cannot be empty",
        }
    }

    /// True for errors raised by `build()` on incomplete input.
    #[must_use]
    pub const fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            AuthorizationError::MissingPrincipalName | AuthorizationError::MissingGrantType
        )
    }

    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, AuthorizationError::InvalidArgument { .. })
    }
}

pub type Result<T, E = AuthorizationError> = std::result::Result<T, E>;
