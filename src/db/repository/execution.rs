use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::schedule::{parse_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::ExecutionStatus;
use crate::models::Execution;

/// Idempotent create-or-update keyed on (schedule_id, planned_date).
/// A retried or concurrent write lands on the existing row instead of
/// inserting a duplicate.
pub fn upsert_execution(conn: &Connection, exec: &Execution) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO executions (id, tenant_id, schedule_id, planned_date, executed_date,
         status, skipped_reason, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
         ON CONFLICT(schedule_id, planned_date) DO UPDATE SET
           executed_date = excluded.executed_date,
           status = excluded.status,
           skipped_reason = excluded.skipped_reason,
           updated_at = datetime('now')",
        params![
            exec.id.to_string(),
            exec.tenant_id,
            exec.schedule_id.to_string(),
            exec.planned_date.to_string(),
            exec.executed_date.map(|d| d.to_string()),
            exec.status.as_str(),
            exec.skipped_reason,
        ],
    )?;
    Ok(())
}

/// Mark every planned execution of a schedule as skipped. Returns the count.
pub fn skip_planned_executions(
    conn: &Connection,
    schedule_id: &Uuid,
    reason: &str,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE executions SET status = 'skipped', skipped_reason = ?1, updated_at = datetime('now')
         WHERE schedule_id = ?2 AND status = 'planned'",
        params![reason, schedule_id.to_string()],
    )?;
    Ok(changed)
}

/// Mark planned executions dated strictly before `cutoff` as skipped.
pub fn skip_planned_executions_before(
    conn: &Connection,
    schedule_id: &Uuid,
    cutoff: NaiveDate,
    reason: &str,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE executions SET status = 'skipped', skipped_reason = ?1, updated_at = datetime('now')
         WHERE schedule_id = ?2 AND status = 'planned' AND planned_date < ?3",
        params![reason, schedule_id.to_string(), cutoff.to_string()],
    )?;
    Ok(changed)
}

/// Mark a planned execution completed on `executed_date`.
pub fn complete_execution(
    conn: &Connection,
    schedule_id: &Uuid,
    planned_date: NaiveDate,
    executed_date: NaiveDate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE executions SET status = 'completed', executed_date = ?1, updated_at = datetime('now')
         WHERE schedule_id = ?2 AND planned_date = ?3 AND status IN ('planned', 'overdue')",
        params![
            executed_date.to_string(),
            schedule_id.to_string(),
            planned_date.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Execution".into(),
            id: format!("{schedule_id}@{planned_date}"),
        });
    }
    Ok(())
}

/// All executions of a schedule ordered by planned date.
pub fn get_executions(conn: &Connection, schedule_id: &Uuid) -> Result<Vec<Execution>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, schedule_id, planned_date, executed_date, status, skipped_reason
         FROM executions WHERE schedule_id = ?1 ORDER BY planned_date ASC",
    )?;

    let rows = stmt.query_map(params![schedule_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut executions = Vec::new();
    for row in rows {
        let (id, tenant_id, schedule_id, planned_date, executed_date, status, skipped_reason) =
            row?;
        executions.push(Execution {
            id: parse_uuid(&id)?,
            tenant_id,
            schedule_id: parse_uuid(&schedule_id)?,
            planned_date: parse_date(&planned_date)?,
            executed_date: executed_date.as_deref().map(parse_date).transpose()?,
            status: ExecutionStatus::from_str(&status)?,
            skipped_reason,
        });
    }
    Ok(executions)
}
