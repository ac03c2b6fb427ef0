//! Dolt Hook - run lifecycle coordination for a Dolt database.
//!
//! Before a run starts the hook can move the database to the branch the run
//! asked for; when the run ends it commits whatever the run wrote and moves
//! the database back. Everything goes through SQL statements sent to a Dolt
//! `sql-server`, one short-lived connection per operation.
//!
//! ```no_run
//! use dolt_hook::connection::ConnectionOptions;
//! use dolt_hook::domain::{BranchName, DatabaseName};
//! use dolt_hook::lifecycle::{DoltHook, RunParams};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let options = ConnectionOptions::new(DatabaseName::new("warehouse")?);
//! let mut hook = DoltHook::new(options, BranchName::new("master")?);
//!
//! let params = RunParams::new("run-42").with_branch("nightly");
//! hook.before_run(&params).await;
//! // ... the run writes to the database ...
//! let commit = hook.after_run(&params).await;
//! # let _ = commit;
//! # Ok(())
//! # }
//! ```

/// Best-effort policy for bookkeeping failures.
pub mod best_effort;
/// Branch controller.
pub mod branch;
/// Commit controller.
pub mod commit;
/// Connection provider, SQL vocabulary and engine adapters.
pub mod connection;
/// Validated names and commit values.
pub mod domain;
/// Infrastructure components (config, telemetry, audit).
pub mod infrastructure;
/// Run lifecycle coordinator.
pub mod lifecycle;

pub use best_effort::BestEffort;
pub use lifecycle::{DoltHook, HookState, RunParams};
