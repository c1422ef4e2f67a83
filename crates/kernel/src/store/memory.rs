//! In-memory store for tests and local development.
//!
//! Transaction scopes are modeled as a snapshot stack: `begin` and
//! `begin_nested` push a copy of the current state, `rollback` restores
//! the matching snapshot, `commit` discards it. Rolled-back scopes also
//! discard any raw statements recorded inside them, which lets tests
//! assert on exactly the writes that became durable.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::StoreSession;
use crate::account::{AccountId, AccountRecord};
use crate::error::ProvisionError;
use crate::provision::DataVersion;

#[derive(Clone, Default)]
struct MemoryState {
    /// account id → stored data version string.
    accounts: HashMap<Uuid, String>,
    /// Raw statements from `execute`, in write order.
    statements: Vec<String>,
}

/// Shared in-memory account table. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account row.
    pub fn insert_account(&self, account: &AccountRecord) {
        self.inner
            .lock()
            .accounts
            .insert(account.id.as_uuid(), account.version.to_string());
    }

    /// The durably stored version string for `id`, if the row exists.
    pub fn version_of(&self, id: AccountId) -> Option<String> {
        self.inner.lock().accounts.get(&id.as_uuid()).cloned()
    }

    /// All raw statements that survived their transaction scopes.
    pub fn statements(&self) -> Vec<String> {
        self.inner.lock().statements.clone()
    }

    /// Open a session over this store.
    pub fn session(&self) -> MemorySession {
        MemorySession {
            store: self.clone(),
            snapshots: Vec::new(),
        }
    }
}

/// Session over a [`MemoryStore`] with savepoint-style scope tracking.
pub struct MemorySession {
    store: MemoryStore,
    snapshots: Vec<MemoryState>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn begin(&mut self) -> Result<()> {
        if !self.snapshots.is_empty() {
            bail!("transaction already open; use begin_nested");
        }
        let snapshot = self.store.inner.lock().clone();
        self.snapshots.push(snapshot);
        Ok(())
    }

    async fn begin_nested(&mut self) -> Result<()> {
        if self.snapshots.is_empty() {
            bail!("no transaction open; use begin");
        }
        let snapshot = self.store.inner.lock().clone();
        self.snapshots.push(snapshot);
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.snapshots.is_empty()
    }

    async fn commit(&mut self) -> Result<()> {
        if self.snapshots.pop().is_none() {
            bail!("no transaction open to commit");
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let Some(snapshot) = self.snapshots.pop() else {
            bail!("no transaction open to roll back");
        };
        *self.store.inner.lock() = snapshot;
        Ok(())
    }

    async fn refresh(&mut self, account: &mut AccountRecord) -> Result<()> {
        let raw = self
            .store
            .version_of(account.id)
            .ok_or_else(|| anyhow::anyhow!("account {} not found", account.id))?;
        account.version = raw
            .parse::<DataVersion>()
            .map_err(ProvisionError::InvalidVersion)?;
        Ok(())
    }

    async fn save(&mut self, account: &AccountRecord) -> Result<()> {
        let mut state = self.store.inner.lock();
        if !state.accounts.contains_key(&account.id.as_uuid()) {
            bail!("account {} does not exist", account.id);
        }
        state
            .accounts
            .insert(account.id.as_uuid(), account.version.to_string());
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.store.inner.lock().statements.push(sql.to_string());
        Ok(0)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
