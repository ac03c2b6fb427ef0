//! Audit trail of every change the hook makes to the engine's branch state.

use serde::Serialize;
use tracing::{info, info_span};

/// Domain event for audit logging.
/// Structured for JSON serialization to enable machine-readable audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A run moved the engine to another branch.
    BranchSwitched {
        /// Run that requested the switch.
        run_id: String,
        /// Branch active before the switch, if it could be read.
        from: Option<String>,
        /// Branch now active.
        to: String,
        /// Whether the branch had to be created.
        created: bool,
    },
    /// The pre-run branch was checked out again.
    BranchRestored {
        /// Run that ended.
        run_id: String,
        /// Branch now active.
        branch: String,
    },
    /// The pre-run branch could not be checked out again.
    RestoreFailed {
        /// Run that ended.
        run_id: String,
        /// Branch that should have been restored.
        expected: String,
        /// Branch the engine was most likely left on.
        left_on: String,
    },
    /// A run's changes were committed.
    RunCommitted {
        /// Run that ended.
        run_id: String,
        /// Commit identifier returned by the engine.
        commit: String,
    },
}

/// Logs an audit event to the dedicated audit channel as structured JSON.
/// This uses a specific `target` which can be filtered by the subscriber to redirect to a secure file.
pub fn log_audit(event: &AuditEvent) {
    let span = info_span!(target: "audit", "audit_event");
    let _enter = span.enter();

    let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    info!(target: "audit", audit_json = %json, "Version Control Audit Event");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_audit_variants() {
        log_audit(&AuditEvent::BranchSwitched {
            run_id: "r1".into(),
            from: Some("master".into()),
            to: "feature".into(),
            created: true,
        });
        log_audit(&AuditEvent::BranchRestored {
            run_id: "r1".into(),
            branch: "master".into(),
        });
        log_audit(&AuditEvent::RestoreFailed {
            run_id: "r1".into(),
            expected: "master".into(),
            left_on: "feature".into(),
        });
        log_audit(&AuditEvent::RunCommitted {
            run_id: "r1".into(),
            commit: "abc".into(),
        });
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let json = serde_json::to_value(AuditEvent::RunCommitted {
            run_id: "r1".into(),
            commit: "abc".into(),
        })
        .expect("serializable");
        assert_eq!(json["event_type"], "run_committed");
        assert_eq!(json["commit"], "abc");
    }
}
