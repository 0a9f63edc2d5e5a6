//! SQLite-backed authorization store.
//!
//! Each authorization is kept as its JSON snapshot. Token values and the
//! `state` attribute are copied into indexed columns so `find_by_token`
//! never has to deserialize rows it will not return.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use grantstate_core::Authorization;
use grantstate_core::types::has_text;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::AuthorizationStore;
use crate::fs_security::prepare_database_path;
use crate::lookup::TokenLookup;
use crate::record::{AuthorizationRecord, SCHEMA_VERSION, from_snapshot};

pub struct SqliteAuthorizationStore {
    db: Mutex<Connection>,
}

impl SqliteAuthorizationStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS authorizations (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            principal_name TEXT NOT NULL,
            grant_type TEXT NOT NULL,
            state TEXT,
            schema_version INTEGER NOT NULL,
            snapshot TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS authorization_tokens (
            authorization_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (authorization_id, kind),
            FOREIGN KEY (authorization_id) REFERENCES authorizations(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_authorization_tokens_value
        ON authorization_tokens(value);

        CREATE INDEX IF NOT EXISTS idx_authorizations_state
        ON authorizations(state);
    ";

    /// Open or create the store database at `path` with owner-only permissions.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        prepare_database_path(path)?;

        let db = Connection::open(path).with_context(|| {
            format!("Failed to open authorization store at {}", path.display())
        })?;
        Self::initialize(db)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let db =
            Connection::open_in_memory().context("Failed to open in-memory authorization store")?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )
        .context("Failed to set authorization store pragmas")?;
        db.execute_batch(Self::SCHEMA)
            .context("Failed to create authorization store schema")?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// Number of stored authorizations.
    pub fn count(&self) -> Result<usize> {
        let db = self.lock()?;
        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM authorizations", [], |row| row.get(0))
            .context("Failed to count authorizations")?;
        Ok(count as usize)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("Authorization store connection lock poisoned"))
    }
}

fn load(snapshot: Option<String>) -> Result<Option<Authorization>> {
    snapshot
        .map(|json| from_snapshot(&json).context("Failed to load stored authorization"))
        .transpose()
}

impl AuthorizationStore for SqliteAuthorizationStore {
    fn save(&self, authorization: &Authorization) -> Result<()> {
        let record = AuthorizationRecord::from_authorization(authorization);
        let snapshot = record.to_json()?;
        let updated_at = Utc::now().to_rfc3339();

        let mut db = self.lock()?;
        let tx = db
            .transaction()
            .context("Failed to start authorization save transaction")?;

        tx.execute(
            "INSERT INTO authorizations
                 (id, client_id, principal_name, grant_type, state, schema_version, snapshot, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                 client_id = excluded.client_id,
                 principal_name = excluded.principal_name,
                 grant_type = excluded.grant_type,
                 state = excluded.state,
                 schema_version = excluded.schema_version,
                 snapshot = excluded.snapshot,
                 updated_at = excluded.updated_at",
            params![
                &record.id,
                &record.client_id,
                &record.principal_name,
                record.grant_type.as_str(),
                authorization.state(),
                SCHEMA_VERSION,
                &snapshot,
                &updated_at,
            ],
        )
        .with_context(|| format!("Failed to upsert authorization {}", record.id))?;

        tx.execute(
            "DELETE FROM authorization_tokens WHERE authorization_id = ?1",
            params![&record.id],
        )
        .context("Failed to clear authorization tokens")?;

        for token in authorization.tokens() {
            let credential = token.credential();
            tx.execute(
                "INSERT INTO authorization_tokens (authorization_id, kind, value)
                 VALUES (?1, ?2, ?3)",
                params![&record.id, credential.kind().as_str(), credential.value()],
            )
            .with_context(|| format!("Failed to index {} token", credential.kind()))?;
        }

        tx.commit()
            .context("Failed to commit authorization save transaction")?;
        debug!(
            id = %record.id,
            scopes = %record.authorized_scopes,
            "Saved authorization"
        );
        Ok(())
    }

    fn remove(&self, authorization: &Authorization) -> Result<()> {
        let id = authorization.id().as_str();
        let db = self.lock()?;
        let removed = db
            .execute("DELETE FROM authorizations WHERE id = ?1", params![id])
            .with_context(|| format!("Failed to remove authorization {id}"))?;
        debug!(id, removed, "Removed authorization");
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Authorization>> {
        if !has_text(id) {
            bail!("Authorization id cannot be empty");
        }
        let db = self.lock()?;
        let snapshot: Option<String> = db
            .query_row(
                "SELECT snapshot FROM authorizations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to query authorization {id}"))?;
        load(snapshot)
    }

    fn find_by_token(
        &self,
        token: &str,
        lookup: Option<TokenLookup>,
    ) -> Result<Option<Authorization>> {
        if !has_text(token) {
            bail!("Token value cannot be empty");
        }
        let db = self.lock()?;
        let snapshot: Option<String> = match lookup {
            Some(TokenLookup::State) => db
                .query_row(
                    "SELECT snapshot FROM authorizations WHERE state = ?1 ORDER BY id LIMIT 1",
                    params![token],
                    |row| row.get(0),
                )
                .optional(),
            Some(TokenLookup::Kind(kind)) => db
                .query_row(
                    "SELECT a.snapshot
                     FROM authorizations a
                     JOIN authorization_tokens t ON t.authorization_id = a.id
                     WHERE t.kind = ?1 AND t.value = ?2
                     ORDER BY a.id
                     LIMIT 1",
                    params![kind.as_str(), token],
                    |row| row.get(0),
                )
                .optional(),
            // Credential matches beat state matches; ties go to the smallest id.
            None => db
                .query_row(
                    "SELECT a.snapshot
                     FROM authorizations a
                     LEFT JOIN (
                         SELECT DISTINCT authorization_id FROM authorization_tokens
                         WHERE value = ?1
                     ) t ON t.authorization_id = a.id
                     WHERE t.authorization_id IS NOT NULL OR a.state = ?1
                     ORDER BY t.authorization_id IS NULL, a.id
                     LIMIT 1",
                    params![token],
                    |row| row.get(0),
                )
                .optional(),
        }
        .context("Failed to query authorization by token")?;
        load(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use grantstate_core::types::{Claims, ClientId, Credential, GrantType, ScopeSet, TokenKind};
    use grantstate_core::{Authorization, CLAIMS_METADATA_NAME, NOT_BEFORE_CLAIM};
    use rusqlite::params;

    use super::SqliteAuthorizationStore;
    use crate::record::{AuthorizationRecord, SCHEMA_VERSION};
    use crate::{AuthorizationStore, TokenLookup};

    fn issued() -> Authorization {
        let at = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
        let access = Credential::access("A1")
            .unwrap()
            .with_lifetime(Some(at), Some(at + Duration::hours(1)))
            .unwrap();
        Authorization::with_client(ClientId::new("c1").unwrap())
            .id("auth-1")
            .principal_name("alice")
            .grant_type(GrantType::AuthorizationCode)
            .authorized_scopes(ScopeSet::parse_delimited("openid read"))
            .attribute("state", "st-1")
            .unwrap()
            .token(Credential::authorization_code("code-1").unwrap())
            .token_with(access, |metadata| {
                metadata.with(CLAIMS_METADATA_NAME, Claims::new().with(NOT_BEFORE_CLAIM, at))
            })
            .token(Credential::refresh("R1").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn save_then_find_by_id() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        let authorization = issued();
        store.save(&authorization).unwrap();

        assert_eq!(store.find_by_id("auth-1").unwrap(), Some(authorization));
        assert_eq!(store.find_by_id("auth-2").unwrap(), None);
    }

    #[test]
    fn find_by_token_honours_lookup() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        store.save(&issued()).unwrap();

        let by = |value: &str, lookup| store.find_by_token(value, lookup).unwrap().is_some();
        assert!(by("R1", None));
        assert!(by("st-1", None));
        assert!(by("R1", Some(TokenLookup::Kind(TokenKind::Refresh))));
        assert!(!by("R1", Some(TokenLookup::Kind(TokenKind::Access))));
        assert!(by("code-1", Some(TokenLookup::Kind(TokenKind::AuthorizationCode))));
        assert!(by("st-1", Some(TokenLookup::State)));
        assert!(!by("A1", Some(TokenLookup::State)));
        assert!(!by("unknown", None));
    }

    #[test]
    fn resave_replaces_token_index() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        let first = issued();
        store.save(&first).unwrap();

        let rotated = Authorization::from(&first)
            .token(Credential::refresh("R2").unwrap())
            .build()
            .unwrap();
        store.save(&rotated).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert!(store.find_by_token("R1", None).unwrap().is_none());
        assert_eq!(store.find_by_token("R2", None).unwrap(), Some(rotated));
    }

    #[test]
    fn remove_cascades_to_token_index() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        let authorization = issued();
        store.save(&authorization).unwrap();
        store.remove(&authorization).unwrap();
        store.remove(&authorization).unwrap();

        assert_eq!(store.count().unwrap(), 0);
        assert!(store.find_by_token("A1", None).unwrap().is_none());
        let rows: i64 = store
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM authorization_tokens", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn reopened_database_returns_same_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authorizations.db");
        let authorization = issued();

        {
            let store = SqliteAuthorizationStore::open(&path).unwrap();
            store.save(&authorization).unwrap();
        }

        let store = SqliteAuthorizationStore::open(&path).unwrap();
        assert_eq!(store.find_by_id("auth-1").unwrap(), Some(authorization));
    }

    #[test]
    fn unknown_schema_version_fails_to_load() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        store.save(&issued()).unwrap();

        let mut record = AuthorizationRecord::from_authorization(&issued());
        record.schema_version = SCHEMA_VERSION + 1;
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE authorizations SET snapshot = ?1 WHERE id = ?2",
                params![record.to_json().unwrap(), "auth-1"],
            )
            .unwrap();

        assert!(store.find_by_id("auth-1").is_err());
    }

    #[test]
    fn credential_match_beats_state_match() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        let holder = issued();
        let shadow = Authorization::with_client(ClientId::new("c2").unwrap())
            .id("auth-0")
            .principal_name("bob")
            .grant_type(GrantType::AuthorizationCode)
            .attribute("state", "R1")
            .unwrap()
            .build()
            .unwrap();
        store.save(&shadow).unwrap();
        store.save(&holder).unwrap();

        assert_eq!(store.find_by_token("R1", None).unwrap(), Some(holder));
        assert_eq!(
            store.find_by_token("R1", Some(TokenLookup::State)).unwrap(),
            Some(shadow)
        );
    }

    #[test]
    fn extension_grant_type_reloads_equal() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        for (id, raw) in [
            ("ext", "urn:example:saml2-bearer"),
            ("known", "client_credentials"),
        ] {
            let authorization = Authorization::with_client(ClientId::new("svc").unwrap())
                .id(id)
                .principal_name("svc")
                .grant_type(GrantType::parse(raw).unwrap())
                .build()
                .unwrap();
            store.save(&authorization).unwrap();
            assert_eq!(store.find_by_id(id).unwrap(), Some(authorization));
        }
    }

    #[test]
    fn blank_arguments_are_rejected() {
        let store = SqliteAuthorizationStore::open_in_memory().unwrap();
        assert!(store.find_by_id("").is_err());
        assert!(store.find_by_token("  ", None).is_err());
    }
}
