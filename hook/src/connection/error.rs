//! Errors raised while talking to the version-control engine.

use crate::domain::NameError;

/// Errors that can occur when opening a session or running a statement.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The connection could not be opened (refused, unknown database, bad credentials).
    #[error("Connection Error: could not connect to {target}: {source}")]
    Connect {
        /// `host:port/database` that was targeted.
        target: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
    /// A statement failed on an open connection.
    #[error("Query Error: `{statement}` failed: {source}")]
    Query {
        /// The statement text, with placeholders rather than values.
        statement: &'static str,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
    /// The engine answered with something the protocol does not allow.
    #[error("Unexpected Result: {0}")]
    UnexpectedResult(String),
    /// The engine refused the session without a driver error (used by non-SQL engines).
    #[error("Engine Unavailable: {0}")]
    Unavailable(String),
    /// A name returned by or destined for the engine failed validation.
    #[error("Invalid Name: {0}")]
    InvalidName(#[from] NameError),
}

impl EngineError {
    /// Builds a `Query` error for the given statement.
    #[must_use]
    pub fn query(statement: &'static str, source: sqlx::Error) -> Self {
        Self::Query { statement, source }
    }

    /// Whether the failure happened before any statement could run.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Unavailable(_))
    }
}
