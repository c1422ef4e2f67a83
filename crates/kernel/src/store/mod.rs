//! Persistent-store session boundary.
//!
//! Steps and orchestrators see only [`StoreSession`]: transaction scoping,
//! account save/refresh, and a raw write primitive. Everything else about
//! the backend stays opaque behind `as_any_mut`.

mod memory;
mod postgres;

pub use memory::{MemorySession, MemoryStore};
pub use postgres::PgSession;

use std::any::Any;

use anyhow::Result;
use async_trait::async_trait;

use crate::account::AccountRecord;

/// Transactional session over the persistent store.
#[async_trait]
pub trait StoreSession: Send {
    /// Open a top-level transaction. Fails if one is already open; callers
    /// that may already be inside a transaction go through
    /// `ExecutionContext::with_transaction` instead of branching here.
    async fn begin(&mut self) -> Result<()>;

    /// Open a nested scope inside the current transaction.
    async fn begin_nested(&mut self) -> Result<()>;

    /// Whether any transaction scope is currently open.
    fn in_transaction(&self) -> bool;

    /// Commit the innermost open scope.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the innermost open scope.
    async fn rollback(&mut self) -> Result<()>;

    /// Re-read the account row, replacing in-memory state.
    async fn refresh(&mut self, account: &mut AccountRecord) -> Result<()>;

    /// Persist the account's current version.
    async fn save(&mut self, account: &AccountRecord) -> Result<()>;

    /// Raw write primitive for steps; returns the affected row count.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Backend-specific access for steps that know their store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
