use crate::Database;
use crate::models::{FeedbackRow, NewUserRow, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, ffi};

const USER_COLUMNS: &str = "username, password, email, first_name, last_name, created_at";
const FEEDBACK_COLUMNS: &str = "id, title, content, username, created_at";

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` without touching the table when the
    /// username is already taken; the primary key makes this race-free.
    pub fn create_user(&self, user: &NewUserRow<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password, email, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (user.username, user.password, user.email, user.first_name, user.last_name),
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                        || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, username))
    }

    /// Delete a user along with their feedback and sessions (cascade).
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            Ok(n > 0)
        })
    }

    // -- Feedback --

    pub fn insert_feedback(&self, username: &str, title: &str, content: &str) -> Result<FeedbackRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO feedback (title, content, username) VALUES (?1, ?2, ?3)",
                (title, content, username),
            )?;
            let id = conn.last_insert_rowid();
            query_feedback(conn, id)?.ok_or_else(|| anyhow!("Feedback {} vanished after insert", id))
        })
    }

    pub fn get_feedback(&self, id: i64) -> Result<Option<FeedbackRow>> {
        self.with_conn(|conn| query_feedback(conn, id))
    }

    /// All feedback owned by `username`, oldest first.
    pub fn list_feedback(&self, username: &str) -> Result<Vec<FeedbackRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE username = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([username], feedback_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Overwrite the supplied fields; `None` keeps the stored value.
    /// Returns the updated row, or `None` if the id does not exist.
    pub fn update_feedback(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<FeedbackRow>> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE feedback
                 SET title = COALESCE(?2, title), content = COALESCE(?3, content)
                 WHERE id = ?1",
                rusqlite::params![id, title, content],
            )?;
            if n == 0 {
                return Ok(None);
            }
            query_feedback(conn, id)
        })
    }

    pub fn delete_feedback(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM feedback WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, username: &str, ttl_hours: u64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, username, expires_at)
                 VALUES (?1, ?2, datetime('now', '+' || ?3 || ' hours'))",
                rusqlite::params![id, username, ttl_hours as i64],
            )?;
            Ok(())
        })
    }

    /// Owner of a live session, or `None` if it was deleted or has expired.
    pub fn session_username(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let username = conn
                .query_row(
                    "SELECT username FROM sessions WHERE id = ?1 AND expires_at > datetime('now')",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(username)
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Returns the number of sessions removed.
    pub fn delete_expired_sessions(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE expires_at <= datetime('now')", [])?;
            Ok(n)
        })
    }
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                password: row.get(1)?,
                email: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_feedback(conn: &Connection, id: i64) -> Result<Option<FeedbackRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?1"))?;
    let row = stmt.query_row([id], feedback_from_row).optional()?;
    Ok(row)
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<FeedbackRow> {
    Ok(FeedbackRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        username: row.get(3)?,
        created_at: row.get(4)?,
    })
}
