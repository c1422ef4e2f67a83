//! Locale extension.
//!
//! Seeds per-account language preferences after the default settings
//! exist, and carries the `1.1.0 → 1.2.0` hop that introduces fallback
//! language chains.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use avvio_kernel::account::AccountId;
use avvio_kernel::provision::{
    AccountInitializer, AccountUpdater, ExecutionContext, ExtensionHooks, InitializerDescriptor,
    UpdaterDescriptor,
};

pub struct LocaleExtension;

impl ExtensionHooks for LocaleExtension {
    fn name(&self) -> &str {
        "avvio_locale"
    }

    fn account_initializers(&self) -> Result<Vec<InitializerDescriptor>> {
        Ok(vec![
            InitializerDescriptor::new("locale_prefs", || Arc::new(LocalePrefs))
                .with_description("Seeds the account's language preference")
                .with_priority(90)
                .with_dependencies(["default_settings"]),
        ])
    }

    fn account_updaters(&self) -> Result<Vec<UpdaterDescriptor>> {
        Ok(vec![
            UpdaterDescriptor::new(
                "locale_fallbacks",
                "1.1.0".parse()?,
                "1.2.0".parse()?,
                || Arc::new(LocaleFallbacks),
            )
            .with_description("Creates fallback language chains"),
        ])
    }
}

struct LocalePrefs;

#[async_trait]
impl AccountInitializer for LocalePrefs {
    async fn initialize(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "INSERT INTO account_locale (account_id, language) \
                         VALUES ('{account_id}', 'en')"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        debug!(account = %account_id, "locale preference seeded");
        Ok(true)
    }

    async fn cleanup(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.with_transaction(move |ctx| {
            Box::pin(async move {
                ctx.session_mut()
                    .execute(&format!(
                        "DELETE FROM account_locale WHERE account_id = '{account_id}'"
                    ))
                    .await?;
                Ok(())
            })
        })
        .await?;

        Ok(true)
    }
}

struct LocaleFallbacks;

#[async_trait]
impl AccountUpdater for LocaleFallbacks {
    async fn apply(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        ctx.session_mut()
            .execute(&format!(
                "INSERT INTO account_locale_fallback (account_id, language, fallback) \
                 SELECT account_id, language, 'en' FROM account_locale \
                 WHERE account_id = '{account_id}' AND language <> 'en'"
            ))
            .await?;
        Ok(true)
    }

    async fn rollback(&self, account_id: AccountId, ctx: &mut ExecutionContext) -> Result<bool> {
        // The hop's transaction already rolled back; remove anything a
        // partially-applied external call may have left behind.
        ctx.session_mut()
            .execute(&format!(
                "DELETE FROM account_locale_fallback WHERE account_id = '{account_id}'"
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
        let extension = LocaleExtension;

        let initializers = extension.account_initializers().unwrap();
        assert_eq!(initializers.len(), 1);
        assert_eq!(initializers[0].name(), "locale_prefs");
        assert_eq!(initializers[0].priority(), 90);
        assert_eq!(initializers[0].dependencies(), ["default_settings"]);

        let updaters = extension.account_updaters().unwrap();
        assert_eq!(updaters[0].from_version().to_string(), "1.1.0");
        assert_eq!(updaters[0].to_version().to_string(), "1.2.0");
    }

    #[tokio::test]
    async fn locale_seeds_after_default_settings() {
        let extensions: Vec<Arc<dyn ExtensionHooks>> = vec![Arc::new(LocaleExtension)];
        let engine = ProvisionEngine::bootstrap(&extensions);

        let account = test_account("1.0.0");
        let (store, mut ctx) = seeded_context(&account);

        assert!(engine.initialize_account_data(account.id, &mut ctx).await);

        let statements = store.statements();
        let settings = statements
            .iter()
            .position(|sql| sql.starts_with("INSERT INTO account_settings"))
            .unwrap();
        let locale = statements
            .iter()
            .position(|sql| sql.starts_with("INSERT INTO account_locale"))
            .unwrap();
        assert!(settings < locale);
    }

    #[tokio::test]
    async fn full_chain_with_profile_hop_missing_stops_at_gap() {
        // Only the 1.1.0 → 1.2.0 hop is registered; an account at 1.0.0
        // has no matching updater and stays put, successfully.
        let extensions: Vec<Arc<dyn ExtensionHooks>> = vec![Arc::new(LocaleExtension)];
        let engine = ProvisionEngine::bootstrap(&extensions);

        let mut account = test_account("1.0.0");
        let (_, mut ctx) = seeded_context(&account);

        assert!(engine.update_account_data(&mut account, &mut ctx).await);
        assert_eq!(account.version.to_string(), "1.0.0");
    }
}
