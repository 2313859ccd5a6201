use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ScheduleStatus;

/// One audit-trail entry for a schedule status transition. Append-only.
///
/// `metadata` carries free-form workflow facts (record counts touched,
/// strategy used, computed dates) serialized as JSON in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub from_status: ScheduleStatus,
    pub to_status: ScheduleStatus,
    pub transitioned_at: NaiveDateTime,
    pub performed_by: Option<Uuid>,
    pub reason: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TransitionLogEntry {
    pub fn new(
        schedule_id: Uuid,
        from_status: ScheduleStatus,
        to_status: ScheduleStatus,
        transitioned_at: NaiveDateTime,
        performed_by: Option<Uuid>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            schedule_id,
            from_status,
            to_status,
            transitioned_at,
            performed_by,
            reason,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}
