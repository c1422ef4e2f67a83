//! Avvio command line.
//!
//! Administrative front end for the provisioning engine: inspect the
//! registered steps, seed a newly created account, or advance an
//! account's data version chain.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use avvio_kernel::account::AccountId;
use avvio_kernel::config::Config;
use avvio_kernel::db;
use avvio_kernel::provision::{
    Describe, ExecutionContext, ExtensionHooks, ProvisionEngine, initializer_order, updater_order,
};
use avvio_kernel::store::PgSession;
use avvio_locale::LocaleExtension;
use avvio_profile::ProfileExtension;

#[derive(Parser)]
#[command(name = "avvio", about = "Account data provisioning and migration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show registered steps and database health.
    Status,

    /// Run every seed step for a newly created account.
    Provision {
        /// Account id to provision.
        account: Uuid,
    },

    /// Advance an account's data version to the newest registered hop.
    Migrate {
        /// Account id to migrate.
        account: Uuid,
    },
}

/// Extensions compiled into this binary, in registration order.
fn installed_extensions() -> Vec<Arc<dyn ExtensionHooks>> {
    vec![Arc::new(ProfileExtension), Arc::new(LocaleExtension)]
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    let pool = db::create_pool(&config).await?;

    let engine = ProvisionEngine::bootstrap(&installed_extensions());

    match cli.command {
        Command::Status => status(&engine, &pool).await,
        Command::Provision { account } => provision(&engine, &pool, &config, account.into()).await,
        Command::Migrate { account } => migrate(&engine, &pool, account.into()).await,
    }
}

async fn status(engine: &ProvisionEngine, pool: &sqlx::PgPool) -> Result<()> {
    let healthy = db::check_health(pool).await;
    println!("database: {}", if healthy { "ok" } else { "unreachable" });

    println!("\nseed steps (execution order):");
    match initializer_order(engine.initializers()) {
        Ok(order) => {
            for step in order {
                println!(
                    "  {} (priority {}) {}",
                    step.name(),
                    step.priority(),
                    step.description()
                );
            }
        }
        Err(err) => println!("  unorderable: {err}"),
    }

    println!("\nupdate steps (version order):");
    for step in updater_order(engine.updaters()) {
        println!(
            "  {} {} -> {} {}",
            step.name(),
            step.from_version(),
            step.to_version(),
            step.description()
        );
    }

    Ok(())
}

async fn provision(
    engine: &ProvisionEngine,
    pool: &sqlx::PgPool,
    config: &Config,
    account_id: AccountId,
) -> Result<()> {
    let session = PgSession::connect(pool).await?;
    let mut ctx = ExecutionContext::new(Box::new(session));

    // Ensure the account row exists at the starting data version; seeding
    // an account that was just created is the common case.
    ctx.session_mut()
        .execute(&format!(
            "INSERT INTO account (id, data_version) \
             VALUES ('{account_id}', '{}') ON CONFLICT (id) DO NOTHING",
            config.default_data_version
        ))
        .await?;

    if !engine.initialize_account_data(account_id, &mut ctx).await {
        bail!("provisioning failed for account {account_id}; seeded data was compensated");
    }

    info!(account = %account_id, "account provisioned");
    Ok(())
}

async fn migrate(
    engine: &ProvisionEngine,
    pool: &sqlx::PgPool,
    account_id: AccountId,
) -> Result<()> {
    let mut session = PgSession::connect(pool).await?;
    let mut account = session.load_account(account_id).await?;
    let from = account.version.clone();

    let mut ctx = ExecutionContext::new(Box::new(session));
    let advanced = engine.update_account_data(&mut account, &mut ctx).await;

    if !advanced {
        bail!(
            "migration failed for account {account_id}; stopped at version {}",
            account.version
        );
    }

    info!(
        account = %account_id,
        from = %from,
        to = %account.version,
        "account migrated"
    );
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
