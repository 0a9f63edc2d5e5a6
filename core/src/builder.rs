//! Construction and mutation of authorizations.
//!
//! Every state transition is `Authorization::from(&current)`, a chain of
//! builder mutations, then `build()`. Nothing is validated until `build()`.

use std::collections::BTreeMap;

use grantstate_types::{
    Attributes, AuthorizationId, ClientId, Credential, GrantType, MetaValue, Metadata,
    NonEmptyString, ScopeSet, TokenKind, has_text,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::authorization::Authorization;
use crate::error::{AuthorizationError, Result};
use crate::token::{INVALIDATED_METADATA_NAME, Token, default_metadata};

/// Builder for [`Authorization`].
///
/// Mutations consume and return the builder. `build()` borrows it, so the
/// same builder can be adjusted and built again; aggregates already returned
/// are unaffected.
#[derive(Debug, Clone)]
pub struct AuthorizationBuilder {
    id: Option<String>,
    client_id: ClientId,
    principal_name: Option<String>,
    grant_type: Option<GrantType>,
    authorized_scopes: Option<ScopeSet>,
    tokens: BTreeMap<TokenKind, Token>,
    attributes: Attributes,
}

impl AuthorizationBuilder {
    pub(crate) fn new(client_id: ClientId) -> Self {
        Self {
            id: None,
            client_id,
            principal_name: None,
            grant_type: None,
            authorized_scopes: None,
            tokens: BTreeMap::new(),
            attributes: Attributes::new(),
        }
    }

    /// Set the identifier. A blank id is replaced by a generated one at build time.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the principal name of the resource owner (or the client itself).
    #[must_use]
    pub fn principal_name(mut self, principal_name: impl Into<String>) -> Self {
        self.principal_name = Some(principal_name.into());
        self
    }

    #[must_use]
    pub fn grant_type(mut self, grant_type: GrantType) -> Self {
        self.grant_type = Some(grant_type);
        self
    }

    #[must_use]
    pub fn authorized_scopes(mut self, scopes: ScopeSet) -> Self {
        self.authorized_scopes = Some(scopes);
        self
    }

    /// Store `credential` as the token of its kind, replacing any previous one.
    ///
    /// The new token starts from the default metadata with the replaced
    /// token's metadata laid on top, so claims and flags carry over.
    #[must_use]
    pub fn token(self, credential: Credential) -> Self {
        self.token_with(credential, |metadata| metadata)
    }

    /// Like [`token`](Self::token), then `transform` rewrites the merged metadata.
    ///
    /// If the replaced token holds the same credential value and is already
    /// invalidated, the result stays invalidated whatever `transform` returns.
    #[must_use]
    pub fn token_with(
        mut self,
        credential: Credential,
        transform: impl FnOnce(Metadata) -> Metadata,
    ) -> Self {
        self.put_token(credential, transform);
        self
    }

    pub fn access_token(self, credential: Credential) -> Result<Self> {
        expect_kind(&credential, TokenKind::Access, "access token")?;
        Ok(self.token(credential))
    }

    pub fn refresh_token(self, credential: Credential) -> Result<Self> {
        expect_kind(&credential, TokenKind::Refresh, "refresh token")?;
        Ok(self.token(credential))
    }

    /// Mark the stored token of `credential`'s kind as invalidated.
    ///
    /// Invalidating a refresh token also invalidates the access token and any
    /// still-valid authorization code. No-op when nothing of that kind is stored.
    #[must_use]
    pub fn invalidate(mut self, credential: &Credential) -> Self {
        let kind = credential.kind();
        if !self.mark_invalidated(kind) {
            debug!(kind = %kind, "No stored token to invalidate");
            return self;
        }

        if kind == TokenKind::Refresh {
            if self.mark_invalidated(TokenKind::Access) {
                debug!("Invalidated access token along with refresh token");
            }
            let code_live = self
                .tokens
                .get(&TokenKind::AuthorizationCode)
                .is_some_and(|code| !code.is_invalidated());
            if code_live && self.mark_invalidated(TokenKind::AuthorizationCode) {
                debug!("Invalidated authorization code along with refresh token");
            }
        }
        self
    }

    /// Replace the working token map with a copy of `tokens`.
    pub(crate) fn tokens(mut self, tokens: &BTreeMap<TokenKind, Token>) -> Self {
        self.tokens = tokens.clone();
        self
    }

    /// Set or overwrite one attribute. `MetaValue::Null` stands for "no value" and is rejected.
    pub fn attribute(mut self, name: &str, value: impl Into<MetaValue>) -> Result<Self> {
        if !has_text(name) {
            return Err(AuthorizationError::empty("attribute name"));
        }
        let value = value.into();
        if value.is_null() {
            return Err(AuthorizationError::InvalidArgument {
                argument: "attribute value",
                reason: "cannot be null",
            });
        }
        self.attributes = std::mem::take(&mut self.attributes).with(name, value);
        Ok(self)
    }

    /// Rewrite the whole attribute map. May add, replace or remove entries.
    #[must_use]
    pub fn attributes(mut self, transform: impl FnOnce(Attributes) -> Attributes) -> Self {
        self.attributes = transform(std::mem::take(&mut self.attributes));
        self
    }

    /// Validate and snapshot the builder into an [`Authorization`].
    ///
    /// A generated id is remembered, so building again yields the same id.
    pub fn build(&mut self) -> Result<Authorization> {
        let principal_name = self
            .principal_name
            .as_deref()
            .and_then(|name| NonEmptyString::new(name).ok())
            .ok_or(AuthorizationError::MissingPrincipalName)?;
        let grant_type = self
            .grant_type
            .clone()
            .ok_or(AuthorizationError::MissingGrantType)?;

        let id = match self.id.as_deref().map(AuthorizationId::new) {
            Some(Ok(id)) => id,
            _ => {
                let generated = Uuid::new_v4().to_string();
                debug!(id = %generated, client_id = %self.client_id, "Generated authorization id");
                let id = AuthorizationId::new(generated.as_str())
                    .map_err(|_| AuthorizationError::empty("authorization id"))?;
                self.id = Some(generated);
                id
            }
        };

        Ok(Authorization {
            id,
            client_id: self.client_id.clone(),
            principal_name,
            grant_type,
            authorized_scopes: self.authorized_scopes.clone().unwrap_or_default(),
            tokens: self.tokens.clone(),
            attributes: self.attributes.clone(),
        })
    }

    fn put_token(&mut self, credential: Credential, transform: impl FnOnce(Metadata) -> Metadata) {
        let kind = credential.kind();
        let existing = self.tokens.get(&kind);

        let mut metadata = default_metadata();
        if let Some(existing) = existing {
            metadata = metadata.merged(existing.metadata());
        }
        let mut metadata = transform(metadata);

        let keeps_revocation = existing.is_some_and(|existing| {
            existing.is_invalidated() && existing.credential().value() == credential.value()
        });
        let still_flagged = metadata
            .get(INVALIDATED_METADATA_NAME)
            .and_then(MetaValue::as_bool)
            .unwrap_or(false);
        if keeps_revocation && !still_flagged {
            warn!(kind = %kind, "Refusing to clear invalidation of a revoked token");
            metadata = metadata.with(INVALIDATED_METADATA_NAME, true);
        }

        self.tokens
            .insert(kind, Token::with_metadata(credential, &metadata));
    }

    fn mark_invalidated(&mut self, kind: TokenKind) -> bool {
        let Some(credential) = self
            .tokens
            .get(&kind)
            .map(|token| token.credential().clone())
        else {
            return false;
        };
        self.put_token(credential, |metadata| {
            metadata.with(INVALIDATED_METADATA_NAME, true)
        });
        true
    }
}

fn expect_kind(credential: &Credential, kind: TokenKind, argument: &'static str) -> Result<()> {
    if credential.kind() == kind {
        Ok(())
    } else {
        Err(AuthorizationError::InvalidArgument {
            argument,
            reason: "credential is of a different kind",
        })
    }
}
