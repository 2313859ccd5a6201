//! Abstract persistence seam for the lifecycle engine.
//!
//! The engine never talks to SQLite directly; it goes through [`Store`] so
//! the surrounding persistence layer stays swappable. [`SqliteStore`] is the
//! bundled adapter, delegating to the per-entity repository modules.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{audit, execution, notification, schedule, tenant};
use crate::db::DatabaseError;
use crate::models::enums::ScheduleStatus;
use crate::models::{Execution, Notification, Schedule, TransitionLogEntry};

pub trait Store {
    fn fetch_schedule(&self, id: &Uuid) -> Result<Option<Schedule>, DatabaseError>;
    fn insert_schedule(&self, schedule: &Schedule) -> Result<(), DatabaseError>;
    fn update_schedule_status(
        &self,
        id: &Uuid,
        status: ScheduleStatus,
        next_due_date: Option<NaiveDate>,
        updated_at: NaiveDateTime,
    ) -> Result<(), DatabaseError>;
    fn update_schedule_after_execution(
        &self,
        id: &Uuid,
        last_executed_date: NaiveDate,
        next_due_date: NaiveDate,
        updated_at: NaiveDateTime,
    ) -> Result<(), DatabaseError>;

    /// Create-or-update on the (schedule_id, planned_date) unique key.
    fn upsert_execution(&self, exec: &Execution) -> Result<(), DatabaseError>;
    fn skip_planned_executions(&self, schedule_id: &Uuid, reason: &str)
        -> Result<usize, DatabaseError>;
    fn skip_planned_executions_before(
        &self,
        schedule_id: &Uuid,
        cutoff: NaiveDate,
        reason: &str,
    ) -> Result<usize, DatabaseError>;
    fn complete_execution(
        &self,
        schedule_id: &Uuid,
        planned_date: NaiveDate,
        executed_date: NaiveDate,
    ) -> Result<(), DatabaseError>;
    fn executions(&self, schedule_id: &Uuid) -> Result<Vec<Execution>, DatabaseError>;

    /// Create-or-update on the (schedule_id, notify_date) unique key.
    fn upsert_notification(&self, n: &Notification) -> Result<(), DatabaseError>;
    fn cancel_notifications(&self, schedule_id: &Uuid) -> Result<usize, DatabaseError>;
    fn cancel_notifications_before(
        &self,
        schedule_id: &Uuid,
        cutoff: NaiveDate,
    ) -> Result<usize, DatabaseError>;
    fn notifications(&self, schedule_id: &Uuid) -> Result<Vec<Notification>, DatabaseError>;

    fn append_transition(&self, entry: &TransitionLogEntry) -> Result<(), DatabaseError>;
    fn transition_history(&self, schedule_id: &Uuid)
        -> Result<Vec<TransitionLogEntry>, DatabaseError>;

    fn tenant_for_user(&self, user_id: &Uuid) -> Result<Option<String>, DatabaseError>;
    fn enqueue_assignee_notice(
        &self,
        tenant_id: &str,
        schedule_id: &Uuid,
        assignee_user_id: &Uuid,
        message: &str,
    ) -> Result<(), DatabaseError>;
}

/// SQLite-backed store over a single connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for SqliteStore {
    fn fetch_schedule(&self, id: &Uuid) -> Result<Option<Schedule>, DatabaseError> {
        schedule::get_schedule(&self.conn, id)
    }

    fn insert_schedule(&self, s: &Schedule) -> Result<(), DatabaseError> {
        schedule::insert_schedule(&self.conn, s)
    }

    fn update_schedule_status(
        &self,
        id: &Uuid,
        status: ScheduleStatus,
        next_due_date: Option<NaiveDate>,
        updated_at: NaiveDateTime,
    ) -> Result<(), DatabaseError> {
        schedule::update_schedule_status(&self.conn, id, status, next_due_date, updated_at)
    }

    fn update_schedule_after_execution(
        &self,
        id: &Uuid,
        last_executed_date: NaiveDate,
        next_due_date: NaiveDate,
        updated_at: NaiveDateTime,
    ) -> Result<(), DatabaseError> {
        schedule::update_schedule_after_execution(
            &self.conn,
            id,
            last_executed_date,
            next_due_date,
            updated_at,
        )
    }

    fn upsert_execution(&self, exec: &Execution) -> Result<(), DatabaseError> {
        execution::upsert_execution(&self.conn, exec)
    }

    fn skip_planned_executions(
        &self,
        schedule_id: &Uuid,
        reason: &str,
    ) -> Result<usize, DatabaseError> {
        execution::skip_planned_executions(&self.conn, schedule_id, reason)
    }

    fn skip_planned_executions_before(
        &self,
        schedule_id: &Uuid,
        cutoff: NaiveDate,
        reason: &str,
    ) -> Result<usize, DatabaseError> {
        execution::skip_planned_executions_before(&self.conn, schedule_id, cutoff, reason)
    }

    fn complete_execution(
        &self,
        schedule_id: &Uuid,
        planned_date: NaiveDate,
        executed_date: NaiveDate,
    ) -> Result<(), DatabaseError> {
        execution::complete_execution(&self.conn, schedule_id, planned_date, executed_date)
    }

    fn executions(&self, schedule_id: &Uuid) -> Result<Vec<Execution>, DatabaseError> {
        execution::get_executions(&self.conn, schedule_id)
    }

    fn upsert_notification(&self, n: &Notification) -> Result<(), DatabaseError> {
        notification::upsert_notification(&self.conn, n)
    }

    fn cancel_notifications(&self, schedule_id: &Uuid) -> Result<usize, DatabaseError> {
        notification::cancel_notifications(&self.conn, schedule_id)
    }

    fn cancel_notifications_before(
        &self,
        schedule_id: &Uuid,
        cutoff: NaiveDate,
    ) -> Result<usize, DatabaseError> {
        notification::cancel_notifications_before(&self.conn, schedule_id, cutoff)
    }

    fn notifications(&self, schedule_id: &Uuid) -> Result<Vec<Notification>, DatabaseError> {
        notification::get_notifications(&self.conn, schedule_id)
    }

    fn append_transition(&self, entry: &TransitionLogEntry) -> Result<(), DatabaseError> {
        audit::append_transition(&self.conn, entry)
    }

    fn transition_history(
        &self,
        schedule_id: &Uuid,
    ) -> Result<Vec<TransitionLogEntry>, DatabaseError> {
        audit::get_transition_history(&self.conn, schedule_id)
    }

    fn tenant_for_user(&self, user_id: &Uuid) -> Result<Option<String>, DatabaseError> {
        tenant::get_tenant_for_user(&self.conn, user_id)
    }

    fn enqueue_assignee_notice(
        &self,
        tenant_id: &str,
        schedule_id: &Uuid,
        assignee_user_id: &Uuid,
        message: &str,
    ) -> Result<(), DatabaseError> {
        tenant::enqueue_assignee_notice(&self.conn, tenant_id, schedule_id, assignee_user_id, message)
    }
}
