//! Best-effort policy for version-control bookkeeping.
//!
//! Branch and commit failures must never abort the run they accompany. The
//! controllers return explicit `Result`s; the coordinator turns a failure into
//! a warning plus an absent value through [`BestEffort::or_warn`].

use tracing::warn;

use crate::connection::EngineError;

/// Converts a fallible engine result into an optional value, logging failures.
pub trait BestEffort<T> {
    /// `Ok(v)` becomes `Some(v)`; `Err(e)` is logged as a warning and becomes `None`.
    fn or_warn(self, operation: &'static str) -> Option<T>;
}

impl<T> BestEffort<T> for Result<T, EngineError> {
    fn or_warn(self, operation: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    operation,
                    connectivity = e.is_connectivity(),
                    "Version-control operation failed, continuing without it: {e}"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_passes_through() {
        let result: Result<u8, EngineError> = Ok(7);
        assert_eq!(result.or_warn("test"), Some(7));
    }

    #[test]
    fn test_err_becomes_none() {
        let result: Result<u8, EngineError> =
            Err(EngineError::Unavailable("connection refused".into()));
        assert_eq!(result.or_warn("test"), None);
    }

    #[test]
    fn test_absent_value_is_not_a_failure() {
        let result: Result<Option<u8>, EngineError> = Ok(None);
        assert_eq!(result.or_warn("test"), Some(None));
    }
}
