//! Avvio test utilities.
//!
//! Helpers for extension and integration testing: seeded in-memory
//! stores, account fixtures, and recording step implementations for
//! asserting on invocation order.

// Test-support code is allowed to use unwrap/expect freely.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use avvio_kernel::account::{AccountId, AccountRecord};
use avvio_kernel::provision::{
    AccountInitializer, AccountUpdater, ExecutionContext, InitializerDescriptor, UpdaterDescriptor,
};
use avvio_kernel::store::MemoryStore;

/// An account record at the given version.
pub fn test_account(version: &str) -> AccountRecord {
    AccountRecord::new(AccountId::new(), version.parse().unwrap())
}

/// A memory store seeded with `account`, plus a context over a session on
/// that store.
pub fn seeded_context(account: &AccountRecord) -> (MemoryStore, ExecutionContext) {
    let store = MemoryStore::new();
    store.insert_account(account);
    let ctx = ExecutionContext::new(Box::new(store.session()));
    (store, ctx)
}

/// Shared, ordered record of step invocations.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

struct RecordingInitializer {
    name: String,
    log: CallLog,
    succeed: bool,
}

#[async_trait]
impl AccountInitializer for RecordingInitializer {
    async fn initialize(
        &self,
        _account_id: AccountId,
        _ctx: &mut ExecutionContext,
    ) -> Result<bool> {
        self.log.push(format!("{}.initialize", self.name));
        Ok(self.succeed)
    }

    async fn cleanup(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        self.log.push(format!("{}.cleanup", self.name));
        Ok(true)
    }
}

struct RecordingUpdater {
    name: String,
    log: CallLog,
    succeed: bool,
}

#[async_trait]
impl AccountUpdater for RecordingUpdater {
    async fn apply(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        self.log.push(format!("{}.apply", self.name));
        Ok(self.succeed)
    }

    async fn rollback(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        self.log.push(format!("{}.rollback", self.name));
        Ok(true)
    }
}

/// Descriptor for a seed step that records its calls and returns `succeed`.
pub fn recording_initializer(name: &str, log: &CallLog, succeed: bool) -> InitializerDescriptor {
    let step = Arc::new(RecordingInitializer {
        name: name.to_string(),
        log: log.clone(),
        succeed,
    });

    InitializerDescriptor::new(name, move || {
        let instance: Arc<dyn AccountInitializer> = step.clone();
        instance
    })
}

/// Descriptor for an update step that records its calls and returns
/// `succeed`.
pub fn recording_updater(
    name: &str,
    from: &str,
    to: &str,
    log: &CallLog,
    succeed: bool,
) -> UpdaterDescriptor {
    let step = Arc::new(RecordingUpdater {
        name: name.to_string(),
        log: log.clone(),
        succeed,
    });

    UpdaterDescriptor::new(name, from.parse().unwrap(), to.parse().unwrap(), move || {
        let instance: Arc<dyn AccountUpdater> = step.clone();
        instance
    })
}
