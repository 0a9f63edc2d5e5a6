//! In-process authorization store.
//!
//! Completed authorizations (those holding an access token) are kept until
//! removed. Initialized ones, still waiting on an authorization-code or
//! device flow, sit in a bounded queue and the least recently saved entry is
//! evicted once the bound is exceeded, so abandoned flows cannot grow memory
//! without limit.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};
use grantstate_core::Authorization;
use grantstate_core::types::has_text;
use tracing::debug;

use crate::AuthorizationStore;
use crate::lookup::{TokenLookup, match_rank};

/// Default bound on initialized authorizations kept in memory.
pub const DEFAULT_MAX_INITIALIZED: usize = 100;

#[derive(Debug, Default)]
struct Inner {
    completed: HashMap<String, Authorization>,
    initialized: HashMap<String, Authorization>,
    /// Initialized ids, least recently saved first.
    initialized_order: VecDeque<String>,
}

impl Inner {
    fn forget_initialized(&mut self, id: &str) {
        if self.initialized.remove(id).is_some() {
            self.initialized_order.retain(|queued| queued != id);
        }
    }
}

#[derive(Debug)]
pub struct InMemoryAuthorizationStore {
    max_initialized: usize,
    inner: Mutex<Inner>,
}

impl Default for InMemoryAuthorizationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INITIALIZED)
    }
}

impl InMemoryAuthorizationStore {
    /// Create a store keeping at most `max_initialized` initialized authorizations.
    #[must_use]
    pub fn new(max_initialized: usize) -> Self {
        Self {
            max_initialized: max_initialized.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a store pre-populated with `authorizations`.
    pub fn with_authorizations<'a>(
        max_initialized: usize,
        authorizations: impl IntoIterator<Item = &'a Authorization>,
    ) -> Result<Self> {
        let store = Self::new(max_initialized);
        for authorization in authorizations {
            let id = authorization.id().as_str();
            if store.find_by_id(id)?.is_some() {
                bail!("Duplicate authorization id: {id}");
            }
            store.save(authorization)?;
        }
        Ok(store)
    }

    /// Number of stored authorizations, completed and initialized.
    pub fn len(&self) -> Result<usize> {
        let inner = self.lock()?;
        Ok(inner.completed.len() + inner.initialized.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("Authorization store lock poisoned"))
    }
}

fn is_complete(authorization: &Authorization) -> bool {
    authorization.access_token().is_some()
}

impl AuthorizationStore for InMemoryAuthorizationStore {
    fn save(&self, authorization: &Authorization) -> Result<()> {
        let id = authorization.id().as_str().to_string();
        let mut inner = self.lock()?;

        if is_complete(authorization) {
            inner.forget_initialized(&id);
            debug!(id = %id, scopes = %authorization.authorized_scopes(), "Saved authorization");
            inner.completed.insert(id, authorization.clone());
            return Ok(());
        }

        inner.completed.remove(&id);
        inner.forget_initialized(&id);
        debug!(
            id = %id,
            scopes = %authorization.authorized_scopes(),
            "Saved initialized authorization"
        );
        inner.initialized_order.push_back(id.clone());
        inner.initialized.insert(id, authorization.clone());

        while inner.initialized.len() > self.max_initialized {
            let Some(oldest) = inner.initialized_order.pop_front() else {
                break;
            };
            inner.initialized.remove(&oldest);
            debug!(id = %oldest, "Evicted initialized authorization");
        }
        Ok(())
    }

    fn remove(&self, authorization: &Authorization) -> Result<()> {
        let id = authorization.id().as_str();
        let mut inner = self.lock()?;
        inner.completed.remove(id);
        inner.forget_initialized(id);
        debug!(id, "Removed authorization");
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Authorization>> {
        if !has_text(id) {
            bail!("Authorization id cannot be empty");
        }
        let inner = self.lock()?;
        Ok(inner
            .completed
            .get(id)
            .or_else(|| inner.initialized.get(id))
            .cloned())
    }

    fn find_by_token(
        &self,
        token: &str,
        lookup: Option<TokenLookup>,
    ) -> Result<Option<Authorization>> {
        if !has_text(token) {
            bail!("Token value cannot be empty");
        }
        let inner = self.lock()?;
        // Credential matches beat state matches; ties go to the smallest id.
        Ok(inner
            .completed
            .values()
            .chain(inner.initialized.values())
            .filter_map(|authorization| {
                match_rank(authorization, token, lookup).map(|rank| (rank, authorization))
            })
            .min_by(|(rank_a, a), (rank_b, b)| {
                rank_a.cmp(rank_b).then_with(|| a.id().cmp(b.id()))
            })
            .map(|(_, authorization)| authorization.clone()))
    }
}
