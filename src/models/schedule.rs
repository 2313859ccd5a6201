use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Priority, ScheduleStatus};

/// A recurring clinical task definition for one patient/item pair.
///
/// Created active with `next_due_date = start_date`; mutated only through
/// validated lifecycle transitions and execution completion. Never deleted —
/// cancellation is a terminal status, not a row removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub tenant_id: String,
    pub patient_id: Uuid,
    pub item_id: Uuid,
    /// Cadence in whole weeks, always >= 1.
    pub interval_weeks: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub last_executed_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub status: ScheduleStatus,
    pub assigned_user_id: Option<Uuid>,
    pub priority: Priority,
    pub requires_notification: bool,
    pub notification_days_before: u32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Schedule {
    /// True when the schedule has an end date strictly before `today`.
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| end < today)
    }

    /// Reminder date for the current `next_due_date`, or None when the
    /// schedule does not use notifications.
    pub fn notify_date(&self) -> Option<NaiveDate> {
        if !self.requires_notification {
            return None;
        }
        Some(self.next_due_date - chrono::Duration::days(self.notification_days_before as i64))
    }
}

/// Input for creating a new schedule. The engine fills in id, status,
/// `next_due_date` and timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    pub patient_id: Uuid,
    pub item_id: Uuid,
    pub interval_weeks: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub assigned_user_id: Option<Uuid>,
    pub priority: Priority,
    pub requires_notification: bool,
    pub notification_days_before: u32,
}
