use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{parse_ts, parse_ts_opt, Store};
use crate::types::Reminder;

fn row_to_reminder(row: &SqliteRow) -> anyhow::Result<Reminder> {
    Ok(Reminder {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        kind: row.get("kind"),
        due_at: parse_ts(&row.get::<String, _>("due_at"))?,
        pre_notify_min: row.get("pre_notify_min"),
        notes: row.get("notes"),
        sent_at: parse_ts_opt(row.get("sent_at"))?,
    })
}

impl Store {
    pub async fn create_reminder(
        &self,
        user_id: &str,
        title: &str,
        kind: &str,
        due_at: DateTime<Utc>,
        pre_notify_min: i64,
        notes: &str,
    ) -> anyhow::Result<Reminder> {
        let reminder = Reminder {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            kind: kind.to_string(),
            due_at,
            pre_notify_min,
            notes: notes.to_string(),
            sent_at: None,
        };

        sqlx::query(
            "INSERT INTO reminders (id, user_id, title, kind, due_at, pre_notify_min, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&reminder.id)
        .bind(&reminder.user_id)
        .bind(&reminder.title)
        .bind(&reminder.kind)
        .bind(reminder.due_at.to_rfc3339())
        .bind(reminder.pre_notify_min)
        .bind(&reminder.notes)
        .execute(&self.pool)
        .await?;

        Ok(reminder)
    }

    pub async fn list_reminders(&self, user_id: &str) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query(
            "SELECT * FROM reminders WHERE user_id = ? ORDER BY due_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reminder).collect()
    }

    /// All reminders with no dispatch stamp, across every user; this is the
    /// per-tick scan set.
    pub async fn unsent_reminders(&self) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query("SELECT * FROM reminders WHERE sent_at IS NULL")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_reminder).collect()
    }

    /// Stamp a reminder sent. The `sent_at IS NULL` guard makes the stamp
    /// first-writer-wins: a second tick racing the first is a no-op.
    pub async fn mark_reminder_sent(
        &self,
        id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE reminders SET sent_at = ? WHERE id = ? AND sent_at IS NULL",
        )
        .bind(sent_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a reminder owned by `user_id`; false when no such row.
    pub async fn delete_reminder(&self, id: &str, user_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
