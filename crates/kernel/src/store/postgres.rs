//! Postgres-backed store session.
//!
//! Top-level scopes map to `BEGIN`/`COMMIT`/`ROLLBACK`; nested scopes map
//! to named savepoints, the same scheme sqlx uses internally for nested
//! transactions.

use std::any::Any;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPool;
use sqlx::{Executor, Postgres, Row};

use super::StoreSession;
use crate::account::{AccountId, AccountRecord};
use crate::error::ProvisionError;
use crate::provision::DataVersion;

pub struct PgSession {
    conn: PoolConnection<Postgres>,
    /// Open scope count: 0 = autocommit, 1 = top-level, >1 = savepoints.
    depth: u32,
}

impl PgSession {
    pub async fn connect(pool: &PgPool) -> Result<Self> {
        let conn = pool
            .acquire()
            .await
            .context("failed to acquire store connection")?;

        Ok(Self { conn, depth: 0 })
    }

    /// Direct connection access for steps that speak SQL to this backend.
    pub fn connection(&mut self) -> &mut sqlx::PgConnection {
        &mut self.conn
    }

    /// Load the account row for `id`.
    pub async fn load_account(&mut self, id: AccountId) -> Result<AccountRecord> {
        let row = sqlx::query("SELECT data_version FROM account WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_one(&mut *self.conn)
            .await
            .with_context(|| format!("failed to load account {id}"))?;

        let raw: String = row.get("data_version");
        let version: DataVersion = raw.parse().map_err(ProvisionError::InvalidVersion)?;

        Ok(AccountRecord::new(id, version))
    }

    fn savepoint(depth: u32) -> String {
        format!("avvio_sp_{depth}")
    }

    /// Run raw SQL on the session connection, returning affected rows.
    ///
    /// Executes over the unprepared simple-query protocol (the `Execute`
    /// impl for `&str` carries no arguments), same as `sqlx::raw_sql`;
    /// calling `Executor::execute` on the connection directly avoids the
    /// `Executor is not general enough` error rustc raises when the
    /// `raw_sql` future sits inside the `async_trait`-boxed future.
    async fn raw(&mut self, sql: &str) -> Result<u64> {
        let result = self.conn.execute(sql).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StoreSession for PgSession {
    async fn begin(&mut self) -> Result<()> {
        if self.depth > 0 {
            bail!("transaction already open; use begin_nested");
        }

        self.raw("BEGIN")
            .await
            .context("failed to begin transaction")?;
        self.depth = 1;
        Ok(())
    }

    async fn begin_nested(&mut self) -> Result<()> {
        if self.depth == 0 {
            bail!("no transaction open; use begin");
        }

        let sql = format!("SAVEPOINT {}", Self::savepoint(self.depth));
        self.raw(&sql)
            .await
            .context("failed to create savepoint")?;
        self.depth += 1;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    async fn commit(&mut self) -> Result<()> {
        match self.depth {
            0 => bail!("no transaction open to commit"),
            1 => {
                self.raw("COMMIT")
                    .await
                    .context("failed to commit transaction")?;
            }
            depth => {
                let sql = format!("RELEASE SAVEPOINT {}", Self::savepoint(depth - 1));
                self.raw(&sql)
                    .await
                    .context("failed to release savepoint")?;
            }
        }
        self.depth -= 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.depth {
            0 => bail!("no transaction open to roll back"),
            1 => {
                self.raw("ROLLBACK")
                    .await
                    .context("failed to roll back transaction")?;
            }
            depth => {
                let name = Self::savepoint(depth - 1);
                let sql = format!("ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}");
                self.raw(&sql)
                    .await
                    .context("failed to roll back to savepoint")?;
            }
        }
        self.depth -= 1;
        Ok(())
    }

    async fn refresh(&mut self, account: &mut AccountRecord) -> Result<()> {
        let refreshed = self.load_account(account.id).await?;
        account.version = refreshed.version;
        Ok(())
    }

    async fn save(&mut self, account: &AccountRecord) -> Result<()> {
        let result = sqlx::query("UPDATE account SET data_version = $2 WHERE id = $1")
            .bind(account.id.as_uuid())
            .bind(account.version.to_string())
            .execute(&mut *self.conn)
            .await
            .with_context(|| format!("failed to save account {}", account.id))?;

        if result.rows_affected() == 0 {
            bail!("account {} does not exist", account.id);
        }
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.raw(sql).await.context("store write failed")
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
