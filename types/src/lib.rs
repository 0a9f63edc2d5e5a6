//! Core value types for grantstate.
//!
//! This crate contains pure value types with no IO, no async, and minimal dependencies:
//! identifiers, grant types, credentials, scope sets and the opaque values carried in
//! token metadata and authorization attributes.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod credential;
mod grant;
mod ids;
mod metadata;
mod proofs;
mod scope;

pub use credential::{
    AccessTokenType, Credential, CredentialError, TokenKind, TokenKindParseError,
};
pub use grant::{CustomGrant, GrantType};
pub use ids::{AuthorizationId, ClientId};
pub use metadata::{Attributes, Claims, MetaValue, Metadata, ValueMap};
pub use proofs::{EmptyValueError, NonEmptyString, has_text};
pub use scope::ScopeSet;
