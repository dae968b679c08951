use sqlx::{sqlite::SqliteRow, Row};

use super::Store;
use crate::types::Profile;

fn row_to_profile(row: &SqliteRow) -> Profile {
    Profile {
        user_id: row.get("user_id"),
        name: row.get("name"),
        age: row.get("age"),
        gender: row.get("gender"),
        weight_kg: row.get("weight_kg"),
        height_cm: row.get("height_cm"),
        conditions: row.get("conditions"),
        allergies: row.get("allergies"),
        medications: row.get("medications"),
        emergency_contact: row.get("emergency_contact"),
        phone: row.get("phone"),
        notify_email: row.get::<i64, _>("notify_email") != 0,
        notify_sms: row.get::<i64, _>("notify_sms") != 0,
        tz: row.get("tz"),
        goals: row.get("goals"),
        diet_prefs: row.get("diet_prefs"),
        activity_limits: row.get("activity_limits"),
        notes: row.get("notes"),
    }
}

impl Store {
    /// Create the empty profile that every account starts with.
    pub async fn create_profile(&self, user_id: &str, default_tz: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO profiles (user_id, tz) VALUES (?, ?)",
        )
        .bind(user_id)
        .bind(default_tz)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_profile))
    }

    /// Full-row update; the profile is only ever written by its owner.
    pub async fn update_profile(&self, p: &Profile) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE profiles SET
                name = ?, age = ?, gender = ?, weight_kg = ?, height_cm = ?,
                conditions = ?, allergies = ?, medications = ?,
                emergency_contact = ?, phone = ?, notify_email = ?,
                notify_sms = ?, tz = ?, goals = ?, diet_prefs = ?,
                activity_limits = ?, notes = ?
             WHERE user_id = ?",
        )
        .bind(&p.name)
        .bind(p.age)
        .bind(&p.gender)
        .bind(p.weight_kg)
        .bind(p.height_cm)
        .bind(&p.conditions)
        .bind(&p.allergies)
        .bind(&p.medications)
        .bind(&p.emergency_contact)
        .bind(&p.phone)
        .bind(p.notify_email as i64)
        .bind(p.notify_sms as i64)
        .bind(&p.tz)
        .bind(&p.goals)
        .bind(&p.diet_prefs)
        .bind(&p.activity_limits)
        .bind(&p.notes)
        .bind(&p.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
