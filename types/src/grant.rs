//! Grant flow identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::proofs::{EmptyValueError, NonEmptyString};

/// The OAuth2 flow that produced an authorization.
///
/// The well-known flows are explicit variants; anything else registered by a
/// deployment travels as [`GrantType::Custom`]. Serializes as the wire
/// identifier (`"authorization_code"`, `"urn:ietf:params:oauth:grant-type:device_code"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
    DeviceCode,
    JwtBearer,
    TokenExchange,
    Custom(CustomGrant),
}

/// Identifier of an extension grant.
///
/// Only [`GrantType::parse`] builds one, and it never does so for a
/// well-known identifier, so each wire string has exactly one `GrantType`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomGrant(NonEmptyString);

impl CustomGrant {
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl GrantType {
    const AUTHORIZATION_CODE: &'static str = "authorization_code";
    const CLIENT_CREDENTIALS: &'static str = "client_credentials";
    const REFRESH_TOKEN: &'static str = "refresh_token";
    const DEVICE_CODE: &'static str = "urn:ietf:params:oauth:grant-type:device_code";
    const JWT_BEARER: &'static str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
    const TOKEN_EXCHANGE: &'static str = "urn:ietf:params:oauth:grant-type:token-exchange";

    /// Parse a wire identifier. Unknown identifiers become [`GrantType::Custom`].
    ///
    /// This is also the only way to construct a custom grant.
    pub fn parse(raw: &str) -> Result<Self, EmptyValueError> {
        Ok(match raw {
            Self::AUTHORIZATION_CODE => GrantType::AuthorizationCode,
            Self::CLIENT_CREDENTIALS => GrantType::ClientCredentials,
            Self::REFRESH_TOKEN => GrantType::RefreshToken,
            Self::DEVICE_CODE => GrantType::DeviceCode,
            Self::JWT_BEARER => GrantType::JwtBearer,
            Self::TOKEN_EXCHANGE => GrantType::TokenExchange,
            other => GrantType::Custom(CustomGrant(NonEmptyString::named("grant type", other)?)),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            GrantType::AuthorizationCode => Self::AUTHORIZATION_CODE,
            GrantType::ClientCredentials => Self::CLIENT_CREDENTIALS,
            GrantType::RefreshToken => Self::REFRESH_TOKEN,
            GrantType::DeviceCode => Self::DEVICE_CODE,
            GrantType::JwtBearer => Self::JWT_BEARER,
            GrantType::TokenExchange => Self::TOKEN_EXCHANGE,
            GrantType::Custom(value) => value.as_str(),
        }
    }

    /// Flows in which the client acts on its own behalf, with no end user.
    #[must_use]
    pub fn is_client_only(&self) -> bool {
        matches!(self, GrantType::ClientCredentials)
    }
}

impl TryFrom<String> for GrantType {
    type Error = EmptyValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GrantType> for String {
    fn from(value: GrantType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
