//! Account data provisioning.
//!
//! This module handles:
//! - Typed descriptors for seed and update steps and their registries
//! - Discovery of built-in and extension-provided steps at bootstrap
//! - Dependency-ordered execution of seed steps with saga compensation
//! - Version-chain migration of account data, one hop per transaction

pub mod builtin;
mod context;
mod descriptor;
mod discovery;
mod init_run;
mod registry;
mod sequence;
mod step;
#[cfg(test)]
pub(crate) mod testing;
mod update_run;
mod version;

pub use context::{ExecutionContext, ScopedFuture};
pub use descriptor::{DEFAULT_PRIORITY, Describe, InitializerDescriptor, UpdaterDescriptor};
pub use discovery::{ExtensionHooks, discover_initializers, discover_updaters};
pub use init_run::RunState;
pub use registry::{Registry, RegistryBuilder};
pub use sequence::{initializer_order, updater_order};
pub use step::{AccountInitializer, AccountUpdater};
pub use version::{DataVersion, VersionError};

use std::sync::Arc;

use tracing::info;

use crate::account::{AccountId, AccountRecord};

/// Bootstrapped provisioning engine.
///
/// Built once at process start; afterwards both registries are immutable
/// snapshots, so the engine is freely shareable across invocations.
pub struct ProvisionEngine {
    initializers: Registry<InitializerDescriptor>,
    updaters: Registry<UpdaterDescriptor>,
}

impl ProvisionEngine {
    /// Run discovery across built-ins and the installed extensions.
    pub fn bootstrap(extensions: &[Arc<dyn ExtensionHooks>]) -> Self {
        let initializers = discover_initializers(extensions);
        let updaters = discover_updaters(extensions);

        info!(
            initializers = initializers.len(),
            updaters = updaters.len(),
            extensions = extensions.len(),
            "provisioning engine bootstrapped"
        );

        Self {
            initializers,
            updaters,
        }
    }

    /// Build an engine over explicit registries (tests, embedding).
    pub fn from_registries(
        initializers: Registry<InitializerDescriptor>,
        updaters: Registry<UpdaterDescriptor>,
    ) -> Self {
        Self {
            initializers,
            updaters,
        }
    }

    pub fn initializers(&self) -> &Registry<InitializerDescriptor> {
        &self.initializers
    }

    pub fn updaters(&self) -> &Registry<UpdaterDescriptor> {
        &self.updaters
    }

    /// Run every seed step for a newly created account.
    ///
    /// Returns `false` when any step fails; previously succeeded steps are
    /// compensated in reverse order first. Step failures never propagate
    /// past this boundary.
    pub async fn initialize_account_data(
        &self,
        account_id: AccountId,
        ctx: &mut ExecutionContext,
    ) -> bool {
        init_run::run(&self.initializers, account_id, ctx).await
    }

    /// Advance the account's stored data to the newest version, one hop at
    /// a time, mutating `account.version` in place.
    ///
    /// "Already at latest" and "advanced N hops" are indistinguishable
    /// success outcomes; a failing hop reports `false` and leaves the
    /// account at the last committed version.
    pub async fn update_account_data(
        &self,
        account: &mut AccountRecord,
        ctx: &mut ExecutionContext,
    ) -> bool {
        update_run::run(&self.updaters, account, ctx).await
    }
}
