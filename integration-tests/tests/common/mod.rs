//! Shared setup for tests against a live Dolt `sql-server`.
//!
//! The tests are ignored by default. Run them with `cargo test -- --ignored`
//! and `DOLT_HOOK_TEST_URL` pointing at a server, e.g.
//! `mysql://root@127.0.0.1:3306`. Each context creates a fresh database
//! with a `new` branch next to the default one, and drops it on teardown.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dolt_hook::DoltHook;
use dolt_hook::branch::BranchController;
use dolt_hook::commit::CommitController;
use dolt_hook::connection::{ConnectionOptions, MySqlConnector};
use dolt_hook::domain::{BranchName, DatabaseName};
use secrecy::SecretString;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};

/// Server URL, without a database path.
pub const TEST_URL_ENV: &str = "DOLT_HOOK_TEST_URL";
/// Password for the test server user; empty when unset.
pub const TEST_PASSWORD_ENV: &str = "DOLT_HOOK_TEST_PASSWORD";

/// A scratch database on the test server.
pub struct DoltTestContext {
    server: MySqlConnectOptions,
    /// Connection settings for the scratch database.
    pub options: ConnectionOptions,
    /// Branch the scratch database starts on.
    pub default_branch: BranchName,
}

/// Creates a scratch database on the server named by `DOLT_HOOK_TEST_URL`.
pub async fn context() -> Result<DoltTestContext> {
    let url = std::env::var(TEST_URL_ENV)
        .with_context(|| format!("{TEST_URL_ENV} must point at a Dolt sql-server"))?;
    DoltTestContext::new(&url).await
}

impl DoltTestContext {
    async fn new(url: &str) -> Result<Self> {
        let password = std::env::var(TEST_PASSWORD_ENV).unwrap_or_default();
        let server = MySqlConnectOptions::from_str(url)
            .context("Invalid test server URL")?
            .password(&password);

        let name = format!("hook_{}", uuid::Uuid::new_v4().simple());
        let database = DatabaseName::new(name.clone())?;
        let options = ConnectionOptions::new(database)
            .with_host(server.get_host())
            .with_port(server.get_port())
            .with_credentials(server.get_username(), SecretString::from(password));

        let mut admin = server.connect().await.context("Failed to reach test server")?;
        sqlx::query(&format!("CREATE DATABASE {name}"))
            .execute(&mut admin)
            .await?;
        admin.close().await?;

        let mut conn = options.to_mysql().connect().await?;
        let default: String = sqlx::query_scalar("SELECT active_branch()")
            .fetch_one(&mut conn)
            .await?;
        sqlx::query("CALL dolt_branch('new')")
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        Ok(Self {
            server,
            options,
            default_branch: BranchName::new(default)?,
        })
    }

    /// Hook on the scratch database.
    pub fn hook(&self) -> DoltHook {
        DoltHook::new(self.options.clone(), self.default_branch.clone())
    }

    /// Branch controller on the scratch database.
    pub fn branches(&self) -> BranchController {
        BranchController::new(Arc::new(MySqlConnector::new(self.options.clone())))
    }

    /// Commit controller on the scratch database.
    pub fn commits(&self) -> CommitController {
        CommitController::new(Arc::new(MySqlConnector::new(self.options.clone())))
    }

    /// A fresh connection to the scratch database, as another client would open.
    pub async fn connect(&self) -> Result<MySqlConnection> {
        Ok(self.options.to_mysql().connect().await?)
    }

    /// Branch a fresh session starts on.
    pub async fn active_branch(&self) -> Result<String> {
        let mut conn = self.connect().await?;
        let branch = sqlx::query_scalar("SELECT active_branch()")
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;
        Ok(branch)
    }

    /// Session head a fresh session sees.
    pub async fn head(&self) -> Result<String> {
        let mut conn = self.connect().await?;
        let head = sqlx::query_scalar(&format!(
            "SELECT @@{}",
            self.options.database().head_variable()
        ))
        .fetch_one(&mut conn)
        .await?;
        conn.close().await?;
        Ok(head)
    }

    /// Head of `branch`.
    pub async fn branch_head(&self, branch: &str) -> Result<String> {
        let mut conn = self.connect().await?;
        let head = sqlx::query_scalar("SELECT HASHOF(?)")
            .bind(branch)
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;
        Ok(head)
    }

    /// Writes a new table so the working set has something to commit.
    pub async fn write_table(&self, table: &str) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(&format!("CREATE TABLE {table} (a BIGINT)"))
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }

    /// Drops the scratch database.
    pub async fn teardown(self) -> Result<()> {
        let mut admin = self.server.connect().await?;
        sqlx::query(&format!("DROP DATABASE {}", self.options.database()))
            .execute(&mut admin)
            .await?;
        admin.close().await?;
        Ok(())
    }
}
