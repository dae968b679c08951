use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{parse_ts, Store};
use crate::types::Plan;

fn row_to_plan(row: &SqliteRow) -> anyhow::Result<Plan> {
    Ok(Plan {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: row.get("kind"),
        content: row.get("content"),
        created_at: parse_ts(&row.get::<String, _>("created_at"))?,
    })
}

impl Store {
    pub async fn create_plan(
        &self,
        user_id: &str,
        kind: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Plan> {
        let plan = Plan {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            content: content.to_string(),
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO plans (id, user_id, kind, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&plan.id)
        .bind(&plan.user_id)
        .bind(&plan.kind)
        .bind(&plan.content)
        .bind(plan.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(plan)
    }

    pub async fn list_plans(&self, user_id: &str) -> anyhow::Result<Vec<Plan>> {
        let rows = sqlx::query(
            "SELECT * FROM plans WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_plan).collect()
    }
}
