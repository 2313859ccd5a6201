use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{Priority, ScheduleStatus};
use crate::models::Schedule;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEDULE_COLUMNS: &str = "id, tenant_id, patient_id, item_id, interval_weeks, start_date,
     end_date, last_executed_date, next_due_date, status, assigned_user_id, priority,
     requires_notification, notification_days_before, created_at, updated_at";

pub fn insert_schedule(conn: &Connection, schedule: &Schedule) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO schedules (id, tenant_id, patient_id, item_id, interval_weeks, start_date,
         end_date, last_executed_date, next_due_date, status, assigned_user_id, priority,
         requires_notification, notification_days_before, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            schedule.id.to_string(),
            schedule.tenant_id,
            schedule.patient_id.to_string(),
            schedule.item_id.to_string(),
            schedule.interval_weeks,
            schedule.start_date.to_string(),
            schedule.end_date.map(|d| d.to_string()),
            schedule.last_executed_date.map(|d| d.to_string()),
            schedule.next_due_date.to_string(),
            schedule.status.as_str(),
            schedule.assigned_user_id.map(|id| id.to_string()),
            schedule.priority.as_str(),
            schedule.requires_notification as i32,
            schedule.notification_days_before,
            schedule.created_at.format(TIMESTAMP_FORMAT).to_string(),
            schedule.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "active schedule already exists for patient {} item {}",
                schedule.patient_id, schedule.item_id
            ))
        }
        other => DatabaseError::from(other),
    })?;
    Ok(())
}

pub fn get_schedule(conn: &Connection, id: &Uuid) -> Result<Option<Schedule>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], schedule_row)?;
    match rows.next() {
        Some(row) => Ok(Some(schedule_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Persist a status change, optionally moving `next_due_date` in the same write.
/// `updated_at` doubles as the pause timestamp while a schedule is paused.
pub fn update_schedule_status(
    conn: &Connection,
    id: &Uuid,
    status: ScheduleStatus,
    next_due_date: Option<NaiveDate>,
    updated_at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = match next_due_date {
        Some(due) => conn.execute(
            "UPDATE schedules SET status = ?1, next_due_date = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                status.as_str(),
                due.to_string(),
                updated_at.format(TIMESTAMP_FORMAT).to_string(),
                id.to_string()
            ],
        )?,
        None => conn.execute(
            "UPDATE schedules SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                status.as_str(),
                updated_at.format(TIMESTAMP_FORMAT).to_string(),
                id.to_string()
            ],
        )?,
    };
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Schedule".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Advance a schedule after an execution was performed.
pub fn update_schedule_after_execution(
    conn: &Connection,
    id: &Uuid,
    last_executed_date: NaiveDate,
    next_due_date: NaiveDate,
    updated_at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE schedules SET last_executed_date = ?1, next_due_date = ?2, updated_at = ?3
         WHERE id = ?4",
        params![
            last_executed_date.to_string(),
            next_due_date.to_string(),
            updated_at.format(TIMESTAMP_FORMAT).to_string(),
            id.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Schedule".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type ScheduleRow = (
    String,
    String,
    String,
    String,
    u32,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    Option<String>,
    String,
    i32,
    u32,
    String,
    String,
);

fn schedule_row(row: &Row<'_>) -> rusqlite::Result<ScheduleRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
        row.get(15)?,
    ))
}

fn schedule_from_row(r: ScheduleRow) -> Result<Schedule, DatabaseError> {
    let (
        id,
        tenant_id,
        patient_id,
        item_id,
        interval_weeks,
        start_date,
        end_date,
        last_executed_date,
        next_due_date,
        status,
        assigned_user_id,
        priority,
        requires_notification,
        notification_days_before,
        created_at,
        updated_at,
    ) = r;
    Ok(Schedule {
        id: parse_uuid(&id)?,
        tenant_id,
        patient_id: parse_uuid(&patient_id)?,
        item_id: parse_uuid(&item_id)?,
        interval_weeks,
        start_date: parse_date(&start_date)?,
        end_date: end_date.as_deref().map(parse_date).transpose()?,
        last_executed_date: last_executed_date.as_deref().map(parse_date).transpose()?,
        next_due_date: parse_date(&next_due_date)?,
        status: ScheduleStatus::from_str(&status)?,
        assigned_user_id: assigned_user_id.as_deref().map(parse_uuid).transpose()?,
        priority: Priority::from_str(&priority)?,
        requires_notification: requires_notification != 0,
        notification_days_before,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date '{s}': {e}")))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp '{s}': {e}")))
}
