//! The fixed SQL vocabulary spoken to the engine.
//!
//! Every user-controlled value is a `?` placeholder. The only text built at
//! runtime is the session head variable name, derived from a validated
//! [`DatabaseName`].

use crate::domain::DatabaseName;

/// Current branch of the session.
pub const ACTIVE_BRANCH: &str = "SELECT active_branch() AS name";

/// Returns a row when the named branch exists.
pub const BRANCH_EXISTS: &str = "SELECT name FROM dolt_branches WHERE name = ?";

/// All branch names.
pub const LIST_BRANCHES: &str = "SELECT name FROM dolt_branches ORDER BY name";

/// Create a branch from the current head and switch to it.
pub const CHECKOUT_NEW: &str = "SELECT dolt_checkout('-b', ?)";

/// Switch to an existing branch.
pub const CHECKOUT: &str = "SELECT dolt_checkout(?)";

/// Returns a row when the working set has pending changes.
pub const STATUS: &str = "SELECT * FROM dolt_status LIMIT 1";

/// Stage and commit every change, returning the new commit id.
pub const COMMIT_ALL: &str = "SELECT dolt_commit('-am', ?) AS id";

/// Commit id a branch (or any revision) points at.
pub const BRANCH_HEAD: &str = "SELECT HASHOF(?) AS head";

/// Ends the session's transaction.
pub const END_TRANSACTION: &str = "COMMIT";

/// Placeholder form of [`record_head`], used in error reports.
pub const RECORD_HEAD: &str = "SET @@{database}_head = ?";

/// Placeholder form of [`read_head`], used in error reports.
pub const READ_HEAD: &str = "SELECT @@{database}_head AS head";

/// `SET @@{database}_head = ?`
#[must_use]
pub fn record_head(database: &DatabaseName) -> String {
    format!("SET @@{} = ?", database.head_variable())
}

/// `SELECT @@{database}_head AS head`
#[must_use]
pub fn read_head(database: &DatabaseName) -> String {
    format!("SELECT @@{} AS head", database.head_variable())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_statements_use_database_variable() {
        let db = DatabaseName::new("foo").expect("valid name");
        assert_eq!(record_head(&db), "SET @@foo_head = ?");
        assert_eq!(read_head(&db), "SELECT @@foo_head AS head");
    }

    #[test]
    fn test_user_values_are_placeholders() {
        for statement in [BRANCH_EXISTS, CHECKOUT_NEW, CHECKOUT, COMMIT_ALL, BRANCH_HEAD] {
            assert!(statement.contains('?'), "{statement} must bind its value");
            assert!(!statement.contains("'{"), "{statement} must not interpolate");
        }
    }
}
