use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ExecutionStatus;

/// One planned or completed occurrence of a schedule.
///
/// Unique on `(schedule_id, planned_date)`; all writes are upserts on that
/// key so retried or concurrent calls cannot create duplicate rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub tenant_id: String,
    pub schedule_id: Uuid,
    pub planned_date: NaiveDate,
    pub executed_date: Option<NaiveDate>,
    pub status: ExecutionStatus,
    pub skipped_reason: Option<String>,
}

impl Execution {
    /// A freshly planned occurrence for the given due date.
    pub fn planned(tenant_id: &str, schedule_id: Uuid, planned_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            schedule_id,
            planned_date,
            executed_date: None,
            status: ExecutionStatus::Planned,
            skipped_reason: None,
        }
    }
}

/// A missed occurrence detected inside a pause window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedExecution {
    pub due_date: NaiveDate,
    pub weeks_overdue: i64,
}
