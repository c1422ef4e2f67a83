//! Migration orchestrator: advances an account along the version chain.
//!
//! Migration is not atomic across the chain. Each hop commits on its own,
//! so a failure at hop *k* leaves the account durably at the version hop
//! *k − 1* produced, even though the whole invocation reports failure.

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::account::AccountRecord;
use crate::provision::context::ExecutionContext;
use crate::provision::descriptor::{Describe, UpdaterDescriptor};
use crate::provision::registry::Registry;
use crate::provision::sequence;

pub(crate) async fn run(
    registry: &Registry<UpdaterDescriptor>,
    account: &mut AccountRecord,
    ctx: &mut ExecutionContext,
) -> bool {
    if registry.is_empty() {
        debug!(account = %account.id, "no updaters registered; nothing to do");
        return true;
    }

    let chain = sequence::updater_order(registry);

    loop {
        let current = account.version.clone();

        // Exact tuple equality; descriptors for other versions are skipped,
        // and no match means the account is already current.
        let Some(descriptor) = chain.iter().find(|d| *d.from_version() == current) else {
            debug!(
                account = %account.id,
                version = %current,
                "no updater matches the stored version; account is current"
            );
            return true;
        };

        info!(
            account = %account.id,
            step = descriptor.name(),
            from = %descriptor.from_version(),
            to = %descriptor.to_version(),
            "applying account update"
        );

        if let Err(err) = apply_one(descriptor, account, ctx).await {
            warn!(
                account = %account.id,
                step = descriptor.name(),
                version = %current,
                error = %err,
                "account update failed; account stays at the last committed version"
            );
            return false;
        }

        if account.version == current {
            warn!(
                account = %account.id,
                step = descriptor.name(),
                version = %current,
                "updater committed without advancing the stored version; stopping"
            );
            return true;
        }
    }
}

/// Attempt a single hop in its own transaction scope: apply, record the new
/// version, commit, then re-read the row. On failure the scope is rolled
/// back and the step's own `rollback` runs best-effort.
async fn apply_one(
    descriptor: &UpdaterDescriptor,
    account: &mut AccountRecord,
    ctx: &mut ExecutionContext,
) -> Result<()> {
    let step = descriptor.instantiate();
    let account_id = account.id;
    let name = descriptor.name().to_string();

    let mut updated = account.clone();
    updated.version = descriptor.to_version().clone();

    let apply_step = step.clone();
    let applied = ctx
        .with_transaction(move |ctx| {
            Box::pin(async move {
                match apply_step.apply(account_id, ctx).await {
                    Ok(true) => {
                        ctx.session_mut().save(&updated).await?;
                        Ok(())
                    }
                    Ok(false) => bail!("updater '{name}' reported failure"),
                    Err(err) => Err(err),
                }
            })
        })
        .await;

    match applied {
        Ok(()) => {
            ctx.session_mut().refresh(account).await?;
            Ok(())
        }
        Err(err) => {
            match step.rollback(account_id, ctx).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        account = %account_id,
                        step = descriptor.name(),
                        "updater rollback reported failure"
                    );
                }
                Err(rollback_err) => {
                    warn!(
                        account = %account_id,
                        step = descriptor.name(),
                        error = %rollback_err,
                        "updater rollback failed"
                    );
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::account::AccountId;
    use crate::provision::registry::RegistryBuilder;
    use crate::provision::testing::{CallLog, StepOutcome, recording_updater};
    use crate::store::MemoryStore;

    fn seeded(version: &str) -> (MemoryStore, AccountRecord, ExecutionContext) {
        let store = MemoryStore::new();
        let account = AccountRecord::new(AccountId::new(), version.parse().unwrap());
        store.insert_account(&account);
        let ctx = ExecutionContext::new(Box::new(store.session()));
        (store, account, ctx)
    }

    fn registry_of(descriptors: Vec<UpdaterDescriptor>) -> Registry<UpdaterDescriptor> {
        let mut builder = RegistryBuilder::new();
        for descriptor in descriptors {
            builder.register(descriptor);
        }
        builder.build()
    }

    #[tokio::test]
    async fn empty_registry_trivially_succeeds() {
        let (_, mut account, mut ctx) = seeded("1.0.0");
        assert!(run(&Registry::empty(), &mut account, &mut ctx).await);
        assert_eq!(account.version.to_string(), "1.0.0");
    }

    #[tokio::test]
    async fn chain_advances_one_hop_at_a_time() {
        let log = CallLog::default();
        let registry = registry_of(vec![
            recording_updater("u2", "1.1.0", "1.2.0", &log, StepOutcome::Ok),
            recording_updater("u1", "1.0.0", "1.1.0", &log, StepOutcome::Ok),
        ]);

        let (store, mut account, mut ctx) = seeded("1.0.0");
        assert!(run(&registry, &mut account, &mut ctx).await);

        assert_eq!(account.version.to_string(), "1.2.0");
        assert_eq!(store.version_of(account.id).as_deref(), Some("1.2.0"));
        assert_eq!(log.calls(), vec!["u1.apply", "u2.apply"]);
    }

    #[tokio::test]
    async fn failure_keeps_prior_hops_durable() {
        let log = CallLog::default();
        let registry = registry_of(vec![
            recording_updater("u1", "1.0.0", "1.1.0", &log, StepOutcome::Ok),
            recording_updater("u2", "1.1.0", "1.2.0", &log, StepOutcome::Error),
        ]);

        let (store, mut account, mut ctx) = seeded("1.0.0");
        assert!(!run(&registry, &mut account, &mut ctx).await);

        // U1's hop committed; U2's failure rolled its own hop back and ran
        // its rollback exactly once.
        assert_eq!(account.version.to_string(), "1.1.0");
        assert_eq!(store.version_of(account.id).as_deref(), Some("1.1.0"));
        assert_eq!(log.calls(), vec!["u1.apply", "u2.apply", "u2.rollback"]);
    }

    #[tokio::test]
    async fn reported_false_also_rolls_back_and_stops() {
        let log = CallLog::default();
        let registry = registry_of(vec![recording_updater(
            "u1",
            "1.0.0",
            "1.1.0",
            &log,
            StepOutcome::ReportFalse,
        )]);

        let (store, mut account, mut ctx) = seeded("1.0.0");
        assert!(!run(&registry, &mut account, &mut ctx).await);

        assert_eq!(store.version_of(account.id).as_deref(), Some("1.0.0"));
        assert_eq!(log.calls(), vec!["u1.apply", "u1.rollback"]);
    }

    #[tokio::test]
    async fn version_gap_is_success() {
        let log = CallLog::default();
        let registry = registry_of(vec![recording_updater(
            "u2",
            "1.2.0",
            "1.3.0",
            &log,
            StepOutcome::Ok,
        )]);

        let (_, mut account, mut ctx) = seeded("1.1.0");
        assert!(run(&registry, &mut account, &mut ctx).await);

        assert_eq!(account.version.to_string(), "1.1.0");
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn numeric_version_match_not_lexical() {
        let log = CallLog::default();
        let registry = registry_of(vec![
            recording_updater("u_old", "1.9.0", "1.10.0", &log, StepOutcome::Ok),
            recording_updater("u_new", "1.10.0", "1.11.0", &log, StepOutcome::Ok),
        ]);

        let (_, mut account, mut ctx) = seeded("1.9.0");
        assert!(run(&registry, &mut account, &mut ctx).await);

        assert_eq!(account.version.to_string(), "1.11.0");
        assert_eq!(log.calls(), vec!["u_old.apply", "u_new.apply"]);
    }

    #[tokio::test]
    async fn non_advancing_updater_stops_the_run() {
        let log = CallLog::default();
        let registry = registry_of(vec![recording_updater(
            "stuck",
            "1.0.0",
            "1.0.0",
            &log,
            StepOutcome::Ok,
        )]);

        let (_, mut account, mut ctx) = seeded("1.0.0");
        assert!(run(&registry, &mut account, &mut ctx).await);
        assert_eq!(log.calls(), vec!["stuck.apply"]);
    }
}
