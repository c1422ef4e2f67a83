//! Built-in seed steps every account receives.
//!
//! These are the fixed "built-in" namespace scanned first during
//! discovery; extensions layer their own steps on top and may depend on
//! the names declared here.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::account::AccountId;
use crate::provision::context::ExecutionContext;
use crate::provision::descriptor::{InitializerDescriptor, UpdaterDescriptor};
use crate::provision::step::AccountInitializer;

/// Seed-step descriptors for the built-in namespace.
pub fn initializers() -> Vec<InitializerDescriptor> {
    vec![
        InitializerDescriptor::new("account_home", || Arc::new(AccountHome))
            .with_description("Creates the account's root data row")
            .with_priority(200),
        InitializerDescriptor::new("default_settings", || Arc::new(DefaultSettings))
            .with_description("Seeds the account's default settings")
            .with_priority(150)
            .with_dependencies(["account_home"]),
    ]
}

/// Update-step descriptors for the built-in namespace. The core currently
/// ships none; version chains come from extensions.
pub fn updaters() -> Vec<UpdaterDescriptor> {
    Vec::new()
}

/// Creates the root data row everything else hangs off.
struct AccountHome;

#[async_trait]
impl AccountInitializer for AccountHome {
    async fn initialize(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "INSERT INTO account_home (account_id) VALUES ('{account_id}') \
                         ON CONFLICT (account_id) DO NOTHING"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        debug!(account = %account_id, "account home row created");
        Ok(true)
    }

    async fn cleanup(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "DELETE FROM account_home WHERE account_id = '{account_id}'"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        Ok(true)
    }
}

/// Seeds the default settings rows for a fresh account.
struct DefaultSettings;

#[async_trait]
impl AccountInitializer for DefaultSettings {
    async fn initialize(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "INSERT INTO account_settings (account_id, name, value) VALUES \
                         ('{account_id}', 'timezone', 'UTC'), \
                         ('{account_id}', 'notifications', 'all')"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        debug!(account = %account_id, "default settings seeded");
        Ok(true)
    }

    async fn cleanup(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "DELETE FROM account_settings WHERE account_id = '{account_id}'"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        Ok(true)
    }
}
