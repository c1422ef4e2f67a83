//! Profile extension.
//!
//! Seeds a per-account profile row at creation time and carries the
//! `1.0.0 → 1.1.0` hop of the account data version chain, backfilling the
//! display-name column introduced in 1.1.0.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use avvio_kernel::account::AccountId;
use avvio_kernel::provision::{
    AccountInitializer, AccountUpdater, ExecutionContext, ExtensionHooks, InitializerDescriptor,
    UpdaterDescriptor,
};

pub struct ProfileExtension;

impl ExtensionHooks for ProfileExtension {
    fn name(&self) -> &str {
        "avvio_profile"
    }

    fn account_initializers(&self) -> Result<Vec<InitializerDescriptor>> {
        Ok(vec![
            InitializerDescriptor::new("profile", || Arc::new(ProfileInit))
                .with_description("Creates the account profile row")
                .with_dependencies(["account_home"]),
        ])
    }

    fn account_updaters(&self) -> Result<Vec<UpdaterDescriptor>> {
        Ok(vec![
            UpdaterDescriptor::new(
                "profile_display_name",
                "1.0.0".parse()?,
                "1.1.0".parse()?,
                || Arc::new(ProfileDisplayName),
            )
            .with_description("Backfills profile display names"),
        ])
    }
}

struct ProfileInit;

#[async_trait]
impl AccountInitializer for ProfileInit {
    async fn initialize(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "INSERT INTO account_profile (account_id, visibility) \
                         VALUES ('{account_id}', 'members')"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        debug!(account = %account_id, "profile row created");
        Ok(true)
    }

    async fn cleanup(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "DELETE FROM account_profile WHERE account_id = '{account_id}'"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        Ok(true)
    }
}

struct ProfileDisplayName;

#[async_trait]
impl AccountUpdater for ProfileDisplayName {
    async fn apply(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        // Runs inside the hop's transaction scope opened by the
        // orchestrator; no extra scope needed here.
        ctx.session_mut()
            .execute(&format!(
                "UPDATE account_profile SET display_name = 'Member' \
                 WHERE account_id = '{account_id}' AND display_name IS NULL"
            ))
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use avvio_kernel::provision::{Describe, ProvisionEngine};
    use avvio_test_utils::{seeded_context, test_account};

    #[test]
    fn hooks_declare_expected_metadata() {
        let extension = ProfileExtension;

        let initializers = extension.account_initializers().unwrap();
        assert_eq!(initializers.len(), 1);
        assert_eq!(initializers[0].name(), "profile");
        assert_eq!(initializers[0].dependencies(), ["account_home"]);

        let updaters = extension.account_updaters().unwrap();
        assert_eq!(updaters.len(), 1);
        assert_eq!(updaters[0].from_version().to_string(), "1.0.0");
        assert_eq!(updaters[0].to_version().to_string(), "1.1.0");
    }

    #[tokio::test]
    async fn provisioning_writes_the_profile_row() {
        let extensions: Vec<Arc<dyn ExtensionHooks>> = vec![Arc::new(ProfileExtension)];
        let engine = ProvisionEngine::bootstrap(&extensions);

        let account = test_account("1.0.0");
        let (store, mut ctx) = seeded_context(&account);

        assert!(engine.initialize_account_data(account.id, &mut ctx).await);
        assert!(
            store
                .statements()
                .iter()
                .any(|sql| sql.starts_with("INSERT INTO account_profile"))
        );
    }

    #[tokio::test]
    async fn update_advances_version_and_backfills() {
        let extensions: Vec<Arc<dyn ExtensionHooks>> = vec![Arc::new(ProfileExtension)];
        let engine = ProvisionEngine::bootstrap(&extensions);

        let mut account = test_account("1.0.0");
        let (store, mut ctx) = seeded_context(&account);

        assert!(engine.update_account_data(&mut account, &mut ctx).await);
        assert_eq!(account.version.to_string(), "1.1.0");
        assert_eq!(store.version_of(account.id).as_deref(), Some("1.1.0"));
        assert!(
            store
                .statements()
                .iter()
                .any(|sql| sql.starts_with("UPDATE account_profile"))
        );
    }
}
