//! Serialized form of an authorization.
//!
//! The record is the full aggregate graph as plain data. Rebuilding goes
//! through the public builder, so a loaded snapshot passes the same
//! validation as a freshly issued one.

use anyhow::{Context, Result, bail};
use grantstate_core::Authorization;
use grantstate_core::types::{Attributes, ClientId, Credential, GrantType, Metadata, ScopeSet};
use serde::{Deserialize, Serialize};

/// Version of the record layout written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    pub schema_version: u32,
    pub id: String,
    pub client_id: String,
    pub principal_name: String,
    pub grant_type: GrantType,
    #[serde(default)]
    pub authorized_scopes: ScopeSet,
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub credential: Credential,
    pub metadata: Metadata,
}

impl AuthorizationRecord {
    #[must_use]
    pub fn from_authorization(authorization: &Authorization) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: authorization.id().as_str().to_string(),
            client_id: authorization.client_id().as_str().to_string(),
            principal_name: authorization.principal_name().to_string(),
            grant_type: authorization.grant_type().clone(),
            authorized_scopes: authorization.authorized_scopes().clone(),
            tokens: authorization
                .tokens()
                .map(|token| TokenRecord {
                    credential: token.credential().clone(),
                    metadata: token.metadata().clone(),
                })
                .collect(),
            attributes: authorization.attributes().clone(),
        }
    }

    /// Rebuild the aggregate. Fails on an unknown schema version or invalid data.
    pub fn into_authorization(self) -> Result<Authorization> {
        if self.schema_version != SCHEMA_VERSION {
            bail!(
                "Unsupported authorization schema version {} (expected {SCHEMA_VERSION})",
                self.schema_version
            );
        }

        let client_id = ClientId::new(self.client_id).context("Stored client id is invalid")?;
        let attributes = self.attributes;
        let mut builder = Authorization::with_client(client_id)
            .id(self.id)
            .principal_name(self.principal_name)
            .grant_type(self.grant_type)
            .authorized_scopes(self.authorized_scopes)
            .attributes(|_| attributes);
        for token in self.tokens {
            let metadata = token.metadata;
            builder = builder.token_with(token.credential, |_| metadata);
        }
        builder
            .build()
            .context("Stored authorization failed validation")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize authorization record")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse authorization record")
    }
}

/// Serialize `authorization` to its JSON snapshot.
pub fn to_snapshot(authorization: &Authorization) -> Result<String> {
    AuthorizationRecord::from_authorization(authorization).to_json()
}

/// Parse and rebuild an authorization from its JSON snapshot.
pub fn from_snapshot(json: &str) -> Result<Authorization> {
    AuthorizationRecord::from_json(json)?.into_authorization()
}
