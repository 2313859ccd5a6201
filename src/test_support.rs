//! Shared fixtures for unit tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::enums::{Priority, ScheduleStatus};
use crate::models::Schedule;

/// Route engine tracing through the test harness; safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// An active schedule fixed in mid-2025, notification-enabled with 3 days
/// notice. Tests override the fields they care about.
pub fn test_schedule(interval_weeks: u32, end_date: Option<NaiveDate>) -> Schedule {
    let start = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
    Schedule {
        id: Uuid::new_v4(),
        tenant_id: "t1".into(),
        patient_id: Uuid::new_v4(),
        item_id: Uuid::new_v4(),
        interval_weeks,
        start_date: start,
        end_date,
        last_executed_date: None,
        next_due_date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
        status: ScheduleStatus::Active,
        assigned_user_id: None,
        priority: Priority::Normal,
        requires_notification: true,
        notification_days_before: 3,
        created_at: start.and_hms_opt(9, 0, 0).unwrap(),
        updated_at: start.and_hms_opt(9, 0, 0).unwrap(),
    }
}
