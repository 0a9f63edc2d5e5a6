//! Persistence for grantstate authorizations.
//!
//! The core crate never does IO. This crate owns everything that outlives a
//! process: the [`AuthorizationStore`] contract, an in-memory backend, a
//! SQLite backend, the versioned snapshot format both use, and the `[store]`
//! configuration that picks between them.
//!
//! Typical revocation flow:
//!
//! ```text
//! store.find_by_token(value, hint)        -> Authorization
//! Authorization::from(&a).invalidate(..)  -> AuthorizationBuilder
//! builder.build()                         -> Authorization
//! store.save(&revoked)
//! ```

mod config;
mod fs_security;
mod lookup;
mod memory;
mod record;
mod sqlite;

use anyhow::Result;
use grantstate_core::Authorization;

pub use config::{
    ConfigError, StoreBackend, StoreConfig, config_path, default_database_path, open_store,
};
pub use lookup::TokenLookup;
pub use memory::{DEFAULT_MAX_INITIALIZED, InMemoryAuthorizationStore};
pub use record::{AuthorizationRecord, SCHEMA_VERSION, TokenRecord, from_snapshot, to_snapshot};
pub use sqlite::SqliteAuthorizationStore;

/// Durable home for authorization snapshots.
///
/// Saves are last-writer-wins by id. Lookups return owned snapshots, so a
/// caller mutating its copy through a builder never affects stored state
/// until it saves again.
pub trait AuthorizationStore: Send + Sync {
    /// Insert or replace by id.
    fn save(&self, authorization: &Authorization) -> Result<()>;

    /// Delete by id. Unknown ids are a no-op.
    fn remove(&self, authorization: &Authorization) -> Result<()>;

    /// Fails on a blank id.
    fn find_by_id(&self, id: &str) -> Result<Option<Authorization>>;

    /// Find the authorization holding `token`.
    ///
    /// With no lookup every credential value and the `state` attribute are
    /// searched, and a credential match is preferred over a `state` match.
    /// Remaining ties resolve to the smallest id. Fails on a blank token.
    fn find_by_token(&self, token: &str, lookup: Option<TokenLookup>)
    -> Result<Option<Authorization>>;
}
