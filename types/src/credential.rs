//! Credential kinds and values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proofs::{EmptyValueError, NonEmptyString};
use crate::scope::ScopeSet;

/// Category of credential an authorization can hold. At most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    AuthorizationCode,
    IdToken,
    DeviceCode,
    UserCode,
}

const TOKEN_KIND_PARSE_VALUES: &[&str] = &[
    "access_token",
    "refresh_token",
    "code",
    "id_token",
    "device_code",
    "user_code",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid token kind '{raw}'; expected one of: {expected:?}")]
pub struct TokenKindParseError {
    raw: String,
    expected: &'static [&'static str],
}

impl TokenKindParseError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl TokenKind {
    pub const ALL: [TokenKind; 6] = [
        TokenKind::Access,
        TokenKind::Refresh,
        TokenKind::AuthorizationCode,
        TokenKind::IdToken,
        TokenKind::DeviceCode,
        TokenKind::UserCode,
    ];

    /// The token type hint used by introspection and revocation requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access_token",
            TokenKind::Refresh => "refresh_token",
            TokenKind::AuthorizationCode => "code",
            TokenKind::IdToken => "id_token",
            TokenKind::DeviceCode => "device_code",
            TokenKind::UserCode => "user_code",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, TokenKindParseError> {
        TokenKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| TokenKindParseError {
                raw: raw.to_string(),
                expected: TOKEN_KIND_PARSE_VALUES,
            })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an access token is presented to a resource server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccessTokenType {
    #[default]
    Bearer,
    DPoP,
}

impl AccessTokenType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AccessTokenType::Bearer => "Bearer",
            AccessTokenType::DPoP => "DPoP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Empty(#[from] EmptyValueError),
    #[error("expiry {expires_at} must be after issue time {issued_at}")]
    ExpiryNotAfterIssue {
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

/// A credential value: the raw token plus its kind and validity window.
///
/// All kinds share this one shape. `token_type` and `scopes` only carry
/// meaning for access credentials and stay at their defaults otherwise.
///
/// Deserialization applies the same lifetime check as
/// [`Credential::with_lifetime`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CredentialRepr")]
pub struct Credential {
    kind: TokenKind,
    value: NonEmptyString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issued_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    token_type: AccessTokenType,
    #[serde(default, skip_serializing_if = "ScopeSet::is_empty")]
    scopes: ScopeSet,
}

/// Unvalidated wire shape of [`Credential`].
#[derive(Deserialize)]
struct CredentialRepr {
    kind: TokenKind,
    value: NonEmptyString,
    #[serde(default)]
    issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    token_type: AccessTokenType,
    #[serde(default)]
    scopes: ScopeSet,
}

impl TryFrom<CredentialRepr> for Credential {
    type Error = CredentialError;

    fn try_from(repr: CredentialRepr) -> Result<Self, Self::Error> {
        let credential = Credential {
            kind: repr.kind,
            value: repr.value,
            issued_at: None,
            expires_at: None,
            token_type: repr.token_type,
            scopes: repr.scopes,
        };
        credential.with_lifetime(repr.issued_at, repr.expires_at)
    }
}

impl Credential {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Result<Self, CredentialError> {
        Ok(Self {
            kind,
            value: NonEmptyString::named("token value", value)?,
            issued_at: None,
            expires_at: None,
            token_type: AccessTokenType::default(),
            scopes: ScopeSet::default(),
        })
    }

    pub fn access(value: impl Into<String>) -> Result<Self, CredentialError> {
        Self::new(TokenKind::Access, value)
    }

    pub fn refresh(value: impl Into<String>) -> Result<Self, CredentialError> {
        Self::new(TokenKind::Refresh, value)
    }

    pub fn authorization_code(value: impl Into<String>) -> Result<Self, CredentialError> {
        Self::new(TokenKind::AuthorizationCode, value)
    }

    /// Set the validity window. When both ends are given, expiry must come
    /// strictly after issue.
    pub fn with_lifetime(
        mut self,
        issued_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, CredentialError> {
        if let (Some(issued_at), Some(expires_at)) = (issued_at, expires_at)
            && expires_at <= issued_at
        {
            return Err(CredentialError::ExpiryNotAfterIssue {
                issued_at,
                expires_at,
            });
        }
        self.issued_at = issued_at;
        self.expires_at = expires_at;
        Ok(self)
    }

    #[must_use]
    pub fn with_token_type(mut self, token_type: AccessTokenType) -> Self {
        self.token_type = token_type;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The raw token representation.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    #[must_use]
    pub const fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    #[must_use]
    pub const fn token_type(&self) -> AccessTokenType {
        self.token_type
    }

    #[must_use]
    pub fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }
}
