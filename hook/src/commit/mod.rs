//! Commit controller: status check, commit, head lookups.

pub mod controller;

pub use controller::CommitController;
