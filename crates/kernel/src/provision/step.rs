//! Capability step contracts implemented by built-ins and extensions.

use anyhow::Result;
use async_trait::async_trait;

use crate::account::AccountId;
use crate::provision::context::ExecutionContext;

/// A seed step run once when an account is created.
///
/// `Ok(false)` and `Err(_)` from `initialize` are treated identically by
/// the orchestrator: the run stops and compensation begins. Each step owns
/// its durability — a step that commits independently must reverse exactly
/// what it did in `cleanup`, nothing more.
#[async_trait]
pub trait AccountInitializer: Send + Sync {
    async fn initialize(
        &self,
        account_id: AccountId,
        ctx: &mut ExecutionContext,
    ) -> Result<bool>;

    /// Compensating action, invoked in reverse execution order when a later
    /// step fails. Defaults to a no-op success.
    async fn cleanup(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        Ok(true)
    }
}

/// A migration step advancing account data from one version to the next.
#[async_trait]
pub trait AccountUpdater: Send + Sync {
    async fn apply(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool>;

    /// Best-effort undo of this step's own side effects after a failed
    /// `apply`. Defaults to a no-op success.
    async fn rollback(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        Ok(true)
    }
}
