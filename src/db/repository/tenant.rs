use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Tenant scope for a user, used to stamp new records.
pub fn get_tenant_for_user(conn: &Connection, user_id: &Uuid) -> Result<Option<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT tenant_id FROM user_tenants WHERE user_id = ?1")?;
    let mut rows = stmt.query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn set_tenant_for_user(
    conn: &Connection,
    user_id: &Uuid,
    tenant_id: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_tenants (user_id, tenant_id) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET tenant_id = ?2",
        params![user_id.to_string(), tenant_id],
    )?;
    Ok(())
}

/// Queue a best-effort notice to a schedule's assignee. Delivery happens
/// out of process; this row is the whole contract.
pub fn enqueue_assignee_notice(
    conn: &Connection,
    tenant_id: &str,
    schedule_id: &Uuid,
    assignee_user_id: &Uuid,
    message: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO assignee_notices (id, tenant_id, schedule_id, assignee_user_id, message)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            Uuid::new_v4().to_string(),
            tenant_id,
            schedule_id.to_string(),
            assignee_user_id.to_string(),
            message,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn tenant_lookup_round_trip() {
        let conn = open_memory_database().unwrap();
        let user = Uuid::new_v4();
        assert!(get_tenant_for_user(&conn, &user).unwrap().is_none());

        set_tenant_for_user(&conn, &user, "clinic-a").unwrap();
        assert_eq!(get_tenant_for_user(&conn, &user).unwrap().as_deref(), Some("clinic-a"));

        set_tenant_for_user(&conn, &user, "clinic-b").unwrap();
        assert_eq!(get_tenant_for_user(&conn, &user).unwrap().as_deref(), Some("clinic-b"));
    }
}
