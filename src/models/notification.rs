use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::NotificationState;

/// A reminder record tied to a schedule's upcoming occurrence.
///
/// Unique on `(schedule_id, notify_date)`, written only via upserts.
/// The engine creates and cancels these records; actual delivery belongs
/// to an external notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub tenant_id: String,
    pub schedule_id: Uuid,
    pub notify_date: NaiveDate,
    pub state: NotificationState,
}

impl Notification {
    /// A fresh pending reminder for the given notify date.
    pub fn pending(tenant_id: &str, schedule_id: Uuid, notify_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            schedule_id,
            notify_date,
            state: NotificationState::Pending,
        }
    }
}
