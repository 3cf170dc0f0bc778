//! Audit trail for purchase order mutations.
//!
//! Sinks are best effort: recording happens after the mutation has
//! committed and can never roll it back, so the trait is infallible
//! and sinks swallow their own failures.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// One audit event describing a committed mutation.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// Dotted action name, e.g. `purchase_order.approved`.
    pub action: String,
    /// The affected purchase order.
    pub purchase_order_id: Uuid,
    /// The user who performed the action.
    pub actor_id: Uuid,
    /// The organization the order belongs to.
    pub organization_id: Uuid,
    /// The branch the order belongs to.
    pub branch_id: Uuid,
    /// When the action happened.
    pub occurred_at: DateTime<Utc>,
    /// Action-specific detail, serialized as JSON.
    pub detail: Value,
}

impl AuditRecord {
    /// Build a record stamped with the current time.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        purchase_order_id: Uuid,
        actor_id: Uuid,
        organization_id: Uuid,
        branch_id: Uuid,
        detail: Value,
    ) -> Self {
        Self {
            action: action.into(),
            purchase_order_id,
            actor_id,
            organization_id,
            branch_id,
            occurred_at: Utc::now(),
            detail,
        }
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Record one event. Implementations must not panic and must not
    /// surface failures to the caller.
    fn record(&self, record: &AuditRecord);
}

/// Sink that emits each event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        tracing::info!(
            action = %record.action,
            purchase_order_id = %record.purchase_order_id,
            actor_id = %record.actor_id,
            organization_id = %record.organization_id,
            branch_id = %record.branch_id,
            occurred_at = %record.occurred_at,
            detail = %record.detail,
            "audit"
        );
    }
}

/// Sink that discards every event. Used in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _record: &AuditRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct CapturingSink {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl AuditSink for CapturingSink {
        fn record(&self, record: &AuditRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    #[test]
    fn test_record_carries_action_and_detail() {
        let sink = CapturingSink {
            records: Mutex::new(Vec::new()),
        };
        let order_id = Uuid::new_v4();
        let record = AuditRecord::new(
            "purchase_order.approved",
            order_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            json!({"status": "approved"}),
        );
        sink.record(&record);

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "purchase_order.approved");
        assert_eq!(records[0].purchase_order_id, order_id);
        assert_eq!(records[0].detail["status"], "approved");
    }

    #[test]
    fn test_null_sink_is_silent() {
        let record = AuditRecord::new(
            "purchase_order.cancelled",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            json!({}),
        );
        NullAuditSink.record(&record);
    }
}
