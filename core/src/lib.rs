//! Authorization state for grantstate.
//!
//! This crate holds the authoritative in-memory model of a granted OAuth2
//! authorization: no IO, no async. Collaborators build an [`Authorization`]
//! through [`AuthorizationBuilder`], and every later transition (issuing a
//! credential, revoking one, recording a flow attribute) goes through
//! [`Authorization::from`] and a fresh `build()`.
//!
//! ```text
//! Authorization (immutable snapshot)
//! ├── id, client_id, principal_name, grant_type
//! ├── authorized_scopes: ScopeSet
//! ├── tokens: TokenKind -> Token
//! │   └── Token = Credential + Metadata (invalidated flag, claims)
//! └── attributes: name -> MetaValue
//! ```

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod authorization;
mod builder;
mod clock;
mod error;
mod token;

pub use authorization::{Authorization, STATE_ATTRIBUTE};
pub use builder::AuthorizationBuilder;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AuthorizationError, Result};
pub use token::{
    CLAIMS_METADATA_NAME, INVALIDATED_METADATA_NAME, NOT_BEFORE_CLAIM, Token, default_metadata,
};

pub use grantstate_types as types;
