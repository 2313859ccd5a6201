//! Keeps the execution and notification record streams aligned with a
//! schedule's pause/resume transitions.
//!
//! All writes go through the store's idempotent upserts, keyed on
//! `(schedule_id, planned_date)` and `(schedule_id, notify_date)`, so a
//! retried or concurrent sync cannot duplicate rows. Failures here are
//! collected into the [`SyncReport`] rather than thrown: the schedule's own
//! status change is already persisted and is not rolled back when dependent
//! records lag behind.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Execution, Notification, Schedule};
use crate::store::Store;

/// One dependent-record write that failed during synchronization.
#[derive(Debug, Clone, Serialize)]
pub struct SyncIssue {
    pub record: String,
    pub message: String,
}

/// Counts of records touched plus any collected failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub executions_skipped: usize,
    pub executions_upserted: usize,
    pub notifications_cancelled: usize,
    pub notifications_upserted: usize,
    pub issues: Vec<SyncIssue>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn issue(&mut self, record: &str, err: impl std::fmt::Display) {
        tracing::warn!(record, %err, "dependent record sync failed");
        self.issues.push(SyncIssue {
            record: record.to_string(),
            message: err.to_string(),
        });
    }
}

pub struct DataSynchronizer<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> DataSynchronizer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Pausing a schedule skips its planned executions and cancels its
    /// pending/ready notifications.
    pub fn sync_on_pause(&self, schedule_id: &Uuid) -> SyncReport {
        self.halt(schedule_id, "paused")
    }

    /// Cancelling an active schedule halts its dependent records the same
    /// way a pause does, with the skip reason reflecting the cancellation.
    pub fn sync_on_cancel(&self, schedule_id: &Uuid) -> SyncReport {
        self.halt(schedule_id, "cancelled")
    }

    fn halt(&self, schedule_id: &Uuid, reason: &str) -> SyncReport {
        let mut report = SyncReport::default();

        match self.store.skip_planned_executions(schedule_id, reason) {
            Ok(count) => report.executions_skipped = count,
            Err(e) => report.issue("executions", e),
        }
        match self.store.cancel_notifications(schedule_id) {
            Ok(count) => report.notifications_cancelled = count,
            Err(e) => report.issue("notifications", e),
        }

        report
    }

    /// Resuming (re)creates the planned execution for the new due date and,
    /// when the schedule uses notifications and the reminder is not already
    /// in the past, its pending notification; then sweeps stale rows.
    pub fn sync_on_resume(
        &self,
        schedule: &Schedule,
        new_next_due_date: NaiveDate,
        today: NaiveDate,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        let exec = Execution::planned(&schedule.tenant_id, schedule.id, new_next_due_date);
        match self.store.upsert_execution(&exec) {
            Ok(()) => report.executions_upserted += 1,
            Err(e) => report.issue("executions", e),
        }

        if schedule.requires_notification {
            let notify_date = new_next_due_date
                - chrono::Duration::days(schedule.notification_days_before as i64);
            if notify_date >= today {
                let n = Notification::pending(&schedule.tenant_id, schedule.id, notify_date);
                match self.store.upsert_notification(&n) {
                    Ok(()) => report.notifications_upserted += 1,
                    Err(e) => report.issue("notifications", e),
                }
            }
        }

        self.cleanup_orphaned_data(schedule, new_next_due_date, today, &mut report);
        report
    }

    /// Sweep rows a transition left behind: stale planned executions become
    /// skipped ("superseded"), pending notifications dated before today are
    /// cancelled. The execution cutoff is capped at today so catch-up rows
    /// planned between today and a next-cycle due date survive the sweep.
    pub fn cleanup_orphaned_data(
        &self,
        schedule: &Schedule,
        next_due_date: NaiveDate,
        today: NaiveDate,
        report: &mut SyncReport,
    ) {
        let cutoff = next_due_date.min(today);
        match self
            .store
            .skip_planned_executions_before(&schedule.id, cutoff, "superseded")
        {
            Ok(count) => report.executions_skipped += count,
            Err(e) => report.issue("executions", e),
        }
        match self.store.cancel_notifications_before(&schedule.id, today) {
            Ok(count) => report.notifications_cancelled += count,
            Err(e) => report.issue("notifications", e),
        }
    }
}
