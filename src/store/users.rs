use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{parse_ts, Store};
use crate::types::User;

fn row_to_user(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        api_token: row.get("api_token"),
        created_at: parse_ts(&row.get::<String, _>("created_at"))?,
        is_pro: row.get::<i64, _>("is_pro") != 0,
    })
}

impl Store {
    /// Insert a user; fails on a duplicate email (unique index).
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            api_token: Uuid::new_v4().to_string(),
            created_at: now,
            is_pro: false,
        };

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, api_token, created_at, is_pro)
             VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.api_token)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn get_user_by_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE api_token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Issue a fresh API token, invalidating the previous one.
    pub async fn rotate_api_token(&self, user_id: &str) -> anyhow::Result<String> {
        let token = Uuid::new_v4().to_string();
        sqlx::query("UPDATE users SET api_token = ? WHERE id = ?")
            .bind(&token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    pub async fn set_user_pro(&self, user_id: &str, is_pro: bool) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET is_pro = ? WHERE id = ?")
            .bind(is_pro as i64)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
