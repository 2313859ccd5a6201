use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::schedule::{parse_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::NotificationState;
use crate::models::Notification;

/// Idempotent create-or-update keyed on (schedule_id, notify_date).
pub fn upsert_notification(conn: &Connection, n: &Notification) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, tenant_id, schedule_id, notify_date, state, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
         ON CONFLICT(schedule_id, notify_date) DO UPDATE SET
           state = excluded.state,
           updated_at = datetime('now')",
        params![
            n.id.to_string(),
            n.tenant_id,
            n.schedule_id.to_string(),
            n.notify_date.to_string(),
            n.state.as_str(),
        ],
    )?;
    Ok(())
}

/// Cancel every pending/ready notification of a schedule. Returns the count.
pub fn cancel_notifications(conn: &Connection, schedule_id: &Uuid) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET state = 'cancelled', updated_at = datetime('now')
         WHERE schedule_id = ?1 AND state IN ('pending', 'ready')",
        params![schedule_id.to_string()],
    )?;
    Ok(changed)
}

/// Cancel pending/ready notifications dated strictly before `cutoff`.
pub fn cancel_notifications_before(
    conn: &Connection,
    schedule_id: &Uuid,
    cutoff: NaiveDate,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET state = 'cancelled', updated_at = datetime('now')
         WHERE schedule_id = ?1 AND state IN ('pending', 'ready') AND notify_date < ?2",
        params![schedule_id.to_string(), cutoff.to_string()],
    )?;
    Ok(changed)
}

/// All notifications of a schedule ordered by notify date.
pub fn get_notifications(
    conn: &Connection,
    schedule_id: &Uuid,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, schedule_id, notify_date, state
         FROM notifications WHERE schedule_id = ?1 ORDER BY notify_date ASC",
    )?;

    let rows = stmt.query_map(params![schedule_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut notifications = Vec::new();
    for row in rows {
        let (id, tenant_id, schedule_id, notify_date, state) = row?;
        notifications.push(Notification {
            id: parse_uuid(&id)?,
            tenant_id,
            schedule_id: parse_uuid(&schedule_id)?,
            notify_date: parse_date(&notify_date)?,
            state: NotificationState::from_str(&state)?,
        });
    }
    Ok(notifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::schedule::insert_schedule;
    use crate::test_support::test_schedule;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn upsert_twice_keeps_single_row() {
        let conn = open_memory_database().unwrap();
        let schedule = test_schedule(2, None);
        insert_schedule(&conn, &schedule).unwrap();

        upsert_notification(&conn, &Notification::pending("t1", schedule.id, day(2025, 4, 1)))
            .unwrap();
        upsert_notification(&conn, &Notification::pending("t1", schedule.id, day(2025, 4, 1)))
            .unwrap();

        let all = get_notifications(&conn, &schedule.id).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].state, NotificationState::Pending);
    }

    #[test]
    fn cancel_hits_pending_and_ready_only() {
        let conn = open_memory_database().unwrap();
        let schedule = test_schedule(2, None);
        insert_schedule(&conn, &schedule).unwrap();

        upsert_notification(&conn, &Notification::pending("t1", schedule.id, day(2025, 4, 1)))
            .unwrap();
        let mut ready = Notification::pending("t1", schedule.id, day(2025, 4, 15));
        ready.state = NotificationState::Ready;
        upsert_notification(&conn, &ready).unwrap();
        let mut sent = Notification::pending("t1", schedule.id, day(2025, 4, 29));
        sent.state = NotificationState::Sent;
        upsert_notification(&conn, &sent).unwrap();

        let cancelled = cancel_notifications(&conn, &schedule.id).unwrap();
        assert_eq!(cancelled, 2);

        let all = get_notifications(&conn, &schedule.id).unwrap();
        assert_eq!(all[0].state, NotificationState::Cancelled);
        assert_eq!(all[1].state, NotificationState::Cancelled);
        assert_eq!(all[2].state, NotificationState::Sent);
    }

    #[test]
    fn cancel_before_cutoff_spares_future_rows() {
        let conn = open_memory_database().unwrap();
        let schedule = test_schedule(2, None);
        insert_schedule(&conn, &schedule).unwrap();

        upsert_notification(&conn, &Notification::pending("t1", schedule.id, day(2025, 4, 1)))
            .unwrap();
        upsert_notification(&conn, &Notification::pending("t1", schedule.id, day(2025, 4, 15)))
            .unwrap();

        let cancelled =
            cancel_notifications_before(&conn, &schedule.id, day(2025, 4, 10)).unwrap();
        assert_eq!(cancelled, 1);

        let all = get_notifications(&conn, &schedule.id).unwrap();
        assert_eq!(all[0].state, NotificationState::Cancelled);
        assert_eq!(all[1].state, NotificationState::Pending);
    }
}
