use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::schedule::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::ScheduleStatus;
use crate::models::TransitionLogEntry;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append a transition entry to the audit trail. The table is append-only;
/// nothing in the engine updates or deletes these rows.
pub fn append_transition(conn: &Connection, entry: &TransitionLogEntry) -> Result<(), DatabaseError> {
    let metadata_json =
        serde_json::to_string(&entry.metadata).unwrap_or_else(|_| "{}".to_string());
    conn.execute(
        "INSERT INTO transition_log (id, schedule_id, from_status, to_status, transitioned_at,
         performed_by, reason, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id.to_string(),
            entry.schedule_id.to_string(),
            entry.from_status.as_str(),
            entry.to_status.as_str(),
            entry.transitioned_at.format(TIMESTAMP_FORMAT).to_string(),
            entry.performed_by.map(|id| id.to_string()),
            entry.reason,
            metadata_json,
        ],
    )?;
    Ok(())
}

/// Transition history for a schedule, newest first.
pub fn get_transition_history(
    conn: &Connection,
    schedule_id: &Uuid,
) -> Result<Vec<TransitionLogEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, schedule_id, from_status, to_status, transitioned_at, performed_by, reason, metadata
         FROM transition_log WHERE schedule_id = ?1
         ORDER BY transitioned_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map(params![schedule_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, schedule_id, from_status, to_status, transitioned_at, performed_by, reason, metadata) =
            row?;
        entries.push(TransitionLogEntry {
            id: parse_uuid(&id)?,
            schedule_id: parse_uuid(&schedule_id)?,
            from_status: ScheduleStatus::from_str(&from_status)?,
            to_status: ScheduleStatus::from_str(&to_status)?,
            transitioned_at: parse_timestamp(&transitioned_at)?,
            performed_by: performed_by.as_deref().map(parse_uuid).transpose()?,
            reason,
            metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        });
    }
    Ok(entries)
}
