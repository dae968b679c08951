use sqlx::{sqlite::SqliteRow, Row};

use super::Store;
use crate::types::{CareRole, CareTeamMember};

fn row_to_member(row: &SqliteRow) -> CareTeamMember {
    CareTeamMember {
        id: row.get("id"),
        patient_id: row.get("patient_id"),
        caregiver_id: row.get("caregiver_id"),
        role: CareRole::parse(&row.get::<String, _>("role")).unwrap_or(CareRole::Viewer),
    }
}

impl Store {
    /// Add (or re-role) a caregiver for a patient. Upsert keeps the
    /// relation unique per pair.
    pub async fn add_care_team_member(
        &self,
        patient_id: &str,
        caregiver_id: &str,
        role: CareRole,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO care_team (patient_id, caregiver_id, role) VALUES (?, ?, ?)
             ON CONFLICT(patient_id, caregiver_id) DO UPDATE SET role = excluded.role",
        )
        .bind(patient_id)
        .bind(caregiver_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_caregivers(&self, patient_id: &str) -> anyhow::Result<Vec<CareTeamMember>> {
        let rows = sqlx::query("SELECT * FROM care_team WHERE patient_id = ?")
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_member).collect())
    }

    pub async fn list_patients(&self, caregiver_id: &str) -> anyhow::Result<Vec<CareTeamMember>> {
        let rows = sqlx::query("SELECT * FROM care_team WHERE caregiver_id = ?")
            .bind(caregiver_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_member).collect())
    }

    /// Whether `caregiver_id` has been granted read access by `patient_id`.
    pub async fn has_care_access(
        &self,
        patient_id: &str,
        caregiver_id: &str,
    ) -> anyhow::Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM care_team WHERE patient_id = ? AND caregiver_id = ?",
        )
        .bind(patient_id)
        .bind(caregiver_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}
