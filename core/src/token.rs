//! A credential paired with its metadata.

use chrono::{DateTime, Utc};
use grantstate_types::{Claims, Credential, MetaValue, Metadata, has_text};

use crate::clock::Clock;
use crate::error::{AuthorizationError, Result};

/// Metadata entry flagging a token as invalidated (revoked). Boolean.
pub const INVALIDATED_METADATA_NAME: &str = "metadata.token.invalidated";

/// Metadata entry holding the token's claims. Map.
pub const CLAIMS_METADATA_NAME: &str = "metadata.token.claims";

/// Claim holding the instant before which the token must not be used.
pub const NOT_BEFORE_CLAIM: &str = "nbf";

/// Metadata every token starts from: not invalidated.
#[must_use]
pub fn default_metadata() -> Metadata {
    Metadata::new().with(INVALIDATED_METADATA_NAME, false)
}

/// A credential held by an authorization, with its immutable metadata.
///
/// Time predicates take `now` explicitly so callers decide which clock counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    credential: Credential,
    metadata: Metadata,
}

impl Token {
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            metadata: default_metadata(),
        }
    }

    /// Build a token whose metadata is `metadata` laid over the defaults.
    #[must_use]
    pub fn with_metadata(credential: Credential, metadata: &Metadata) -> Self {
        Self {
            credential,
            metadata: default_metadata().merged(metadata),
        }
    }

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_value(&self, name: &str) -> Result<Option<&MetaValue>> {
        if !has_text(name) {
            return Err(AuthorizationError::empty("metadata name"));
        }
        Ok(self.metadata.get(name))
    }

    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.metadata
            .get(CLAIMS_METADATA_NAME)
            .and_then(MetaValue::as_map)
    }

    #[must_use]
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.claims()
            .and_then(|claims| claims.get(NOT_BEFORE_CLAIM))
            .and_then(MetaValue::as_instant)
    }

    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.metadata
            .get(INVALIDATED_METADATA_NAME)
            .and_then(MetaValue::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.credential
            .expires_at()
            .is_some_and(|expires_at| now > expires_at)
    }

    #[must_use]
    pub fn is_before_use(&self, now: DateTime<Utc>) -> bool {
        self.not_before().is_some_and(|not_before| now < not_before)
    }

    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_invalidated() && !self.is_expired(now) && !self.is_before_use(now)
    }

    /// [`Token::is_active`] evaluated against a single reading of `clock`.
    #[must_use]
    pub fn is_active_at(&self, clock: &dyn Clock) -> bool {
        self.is_active(clock.now())
    }
}
