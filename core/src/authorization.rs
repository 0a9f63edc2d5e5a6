//! The authorization aggregate.
//!
//! An [`Authorization`] is the committed state of one granted access: who the
//! client and principal are, which flow produced it, which scopes were
//! approved, which credentials exist for it, and flow attributes. It is only
//! produced by [`AuthorizationBuilder::build`] and never changes afterwards.
//! State transitions go through [`Authorization::from`], which seeds a builder
//! with a deep copy, so the prior snapshot stays valid for anyone holding it.
//!
//! # Invariants
//!
//! - `id` and `principal_name` are non-empty, `grant_type` is set
//! - At most one token per [`TokenKind`]
//! - Collections are owned by the aggregate and only handed out by shared reference

use std::collections::BTreeMap;

use grantstate_types::{
    Attributes, AuthorizationId, ClientId, GrantType, MetaValue, NonEmptyString, ScopeSet,
    TokenKind, has_text,
};

use crate::builder::AuthorizationBuilder;
use crate::error::{AuthorizationError, Result};
use crate::token::Token;

/// Attribute holding the OAuth2 `state` parameter of an in-flight request.
pub const STATE_ATTRIBUTE: &str = "state";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Authorization {
    pub(crate) id: AuthorizationId,
    pub(crate) client_id: ClientId,
    pub(crate) principal_name: NonEmptyString,
    pub(crate) grant_type: GrantType,
    pub(crate) authorized_scopes: ScopeSet,
    pub(crate) tokens: BTreeMap<TokenKind, Token>,
    pub(crate) attributes: Attributes,
}

impl Authorization {
    /// Start a fresh builder for `client_id`.
    #[must_use]
    pub fn with_client(client_id: ClientId) -> AuthorizationBuilder {
        AuthorizationBuilder::new(client_id)
    }

    /// Start a builder seeded with every field of `authorization`.
    #[must_use]
    pub fn from(authorization: &Authorization) -> AuthorizationBuilder {
        AuthorizationBuilder::new(authorization.client_id.clone())
            .id(authorization.id.as_str())
            .principal_name(authorization.principal_name.as_str())
            .grant_type(authorization.grant_type.clone())
            .authorized_scopes(authorization.authorized_scopes.clone())
            .tokens(&authorization.tokens)
            .attributes(|attributes| attributes.merged(&authorization.attributes))
    }

    #[must_use]
    pub fn id(&self) -> &AuthorizationId {
        &self.id
    }

    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn principal_name(&self) -> &str {
        self.principal_name.as_str()
    }

    #[must_use]
    pub fn grant_type(&self) -> &GrantType {
        &self.grant_type
    }

    #[must_use]
    pub fn authorized_scopes(&self) -> &ScopeSet {
        &self.authorized_scopes
    }

    #[must_use]
    pub fn token(&self, kind: TokenKind) -> Option<&Token> {
        self.tokens.get(&kind)
    }

    #[must_use]
    pub fn has_token(&self, kind: TokenKind) -> bool {
        self.tokens.contains_key(&kind)
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&Token> {
        self.token(TokenKind::Access)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&Token> {
        self.token(TokenKind::Refresh)
    }

    #[must_use]
    pub fn authorization_code(&self) -> Option<&Token> {
        self.token(TokenKind::AuthorizationCode)
    }

    /// Find the token whose raw credential value equals `value`.
    ///
    /// No match is `Ok(None)`; only a blank `value` is an error.
    pub fn find_token(&self, value: &str) -> Result<Option<&Token>> {
        if !has_text(value) {
            return Err(AuthorizationError::empty("token value"));
        }
        Ok(self
            .tokens
            .values()
            .find(|token| token.credential().value() == value))
    }

    /// Every stored token, ordered by kind.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Result<Option<&MetaValue>> {
        if !has_text(name) {
            return Err(AuthorizationError::empty("attribute name"));
        }
        Ok(self.attributes.get(name))
    }

    /// The `state` attribute, when it holds a string.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.attributes
            .get(STATE_ATTRIBUTE)
            .and_then(MetaValue::as_str)
    }
}
