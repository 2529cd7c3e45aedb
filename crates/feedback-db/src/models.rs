//! Database row types. These map directly to SQLite rows and stay separate
//! from the `feedback-types` API models.

use chrono::{DateTime, NaiveDateTime, Utc};
use feedback_types::models::{Feedback, User};
use tracing::warn;

pub struct UserRow {
    pub username: String,
    /// Argon2 PHC string.
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

/// Everything needed to insert a user; the password is already hashed.
pub struct NewUserRow<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

pub struct FeedbackRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        let created_at = parse_timestamp(&self.created_at, &self.username);
        User {
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at,
        }
    }
}

impl FeedbackRow {
    pub fn into_feedback(self) -> Feedback {
        let created_at = parse_timestamp(&self.created_at, &self.id.to_string());
        Feedback {
            id: self.id,
            title: self.title,
            content: self.content,
            username: self.username,
            created_at,
        }
    }
}

/// SQLite's `datetime('now')` has no timezone suffix; treat it as UTC.
fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, owner, e);
            DateTime::default()
        })
}
