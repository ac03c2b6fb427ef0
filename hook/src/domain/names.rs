//! Validated names - Newtype wrappers for branch and database identifiers
//!
//! Branch names travel to the engine as bound parameters, but they are also
//! handed to `dolt_checkout`, which parses its arguments like a command line.
//! A name such as `-b` or `--force` would be read as a flag, so names are
//! checked before they are ever sent.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Maximum accepted length of a branch name, in bytes.
pub const MAX_BRANCH_NAME_LEN: usize = 255;

/// Maximum accepted length of a database name, in bytes.
pub const MAX_DATABASE_NAME_LEN: usize = 64;

/// Characters never allowed anywhere in a branch name.
const FORBIDDEN_BRANCH_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Errors raised when a name fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The name is empty.
    #[error("{kind} name cannot be empty")]
    Empty {
        /// What kind of name was rejected.
        kind: &'static str,
    },
    /// The name is longer than allowed.
    #[error("{kind} name is {len} bytes long, the limit is {max}")]
    TooLong {
        /// What kind of name was rejected.
        kind: &'static str,
        /// Actual length.
        len: usize,
        /// Maximum length.
        max: usize,
    },
    /// The name contains a character or sequence that is not allowed.
    #[error("{kind} name '{name}' is invalid: {reason}")]
    Invalid {
        /// What kind of name was rejected.
        kind: &'static str,
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// A run parameter that should hold a branch name holds something else.
    #[error("run parameter '{key}' must be a string or null, got {found}")]
    NotAString {
        /// Parameter key.
        key: &'static str,
        /// JSON type that was found instead.
        found: &'static str,
    },
}

/// Name of a branch in the version-controlled database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Validates and wraps a branch name.
    ///
    /// # Errors
    ///
    /// Returns `NameError` if the name is empty, too long, starts with `-`,
    /// contains whitespace, control characters, `..`, `@{` or one of
    /// `~^:?*[\`, or ends with `/`, `.` or `.lock`.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        let invalid = |reason| NameError::Invalid {
            kind: "branch",
            name: name.clone(),
            reason,
        };

        if name.is_empty() {
            return Err(NameError::Empty { kind: "branch" });
        }
        if name.len() > MAX_BRANCH_NAME_LEN {
            return Err(NameError::TooLong {
                kind: "branch",
                len: name.len(),
                max: MAX_BRANCH_NAME_LEN,
            });
        }
        if name.starts_with('-') {
            return Err(invalid("must not start with '-'"));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("must not contain whitespace or control characters"));
        }
        if name.contains(FORBIDDEN_BRANCH_CHARS) {
            return Err(invalid("must not contain any of ~ ^ : ? * [ \\"));
        }
        if name.contains("..") || name.contains("@{") {
            return Err(invalid("must not contain '..' or '@{'"));
        }
        if name.ends_with('/') || name.ends_with('.') || name.ends_with(".lock") {
            return Err(invalid("must not end with '/', '.' or '.lock'"));
        }

        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for BranchName {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(value: BranchName) -> Self {
        value.0
    }
}

impl PartialEq<str> for BranchName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BranchName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Name of the target database.
///
/// This is the one identifier formatted into SQL text (the session head
/// variable `@@{database}_head` cannot be bound), so only ASCII letters,
/// digits and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Validates and wraps a database name.
    ///
    /// # Errors
    ///
    /// Returns `NameError` if the name is empty, longer than 64 bytes, or
    /// contains anything other than ASCII letters, digits and `_`.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(NameError::Empty { kind: "database" });
        }
        if name.len() > MAX_DATABASE_NAME_LEN {
            return Err(NameError::TooLong {
                kind: "database",
                len: name.len(),
                max: MAX_DATABASE_NAME_LEN,
            });
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(NameError::Invalid {
                kind: "database",
                name,
                reason: "only ASCII letters, digits and '_' are allowed",
            });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the session variable holding this database's head commit.
    #[must_use]
    pub fn head_variable(&self) -> String {
        format!("{}_head", self.0)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DatabaseName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DatabaseName> for String {
    fn from(value: DatabaseName) -> Self {
        value.0
    }
}
