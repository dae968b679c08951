use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, AuthedUser};
use crate::dispatch::display_local;
use crate::error::ApiError;
use crate::types::CareRole;

pub async fn list_caregivers(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let members = state.store.list_caregivers(&user.id).await?;

    let mut caregivers = Vec::with_capacity(members.len());
    for member in members {
        if let Some(caregiver) = state.store.get_user(&member.caregiver_id).await? {
            caregivers.push(json!({"email": caregiver.email, "role": member.role}));
        }
    }

    Ok(Json(json!({"caregivers": caregivers})))
}

#[derive(Deserialize)]
pub struct AddCaregiver {
    #[serde(default)]
    pub caregiver_email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "viewer".to_string()
}

pub async fn add_caregiver(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(req): Json<AddCaregiver>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = req.caregiver_email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::invalid_input("Caregiver email required."));
    }
    let role = CareRole::parse(&req.role)
        .ok_or_else(|| ApiError::invalid_input("Role must be viewer or editor."))?;

    let caregiver = state
        .store
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("No user with that email."))?;

    if caregiver.id == user.id {
        return Err(ApiError::invalid_input("You are already the account owner."));
    }

    state
        .store
        .add_care_team_member(&user.id, &caregiver.id, role)
        .await?;

    Ok(Json(json!({"added": email, "role": role})))
}

/// Patients who have granted the calling user read access.
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let members = state.store.list_patients(&user.id).await?;

    let mut patients = Vec::with_capacity(members.len());
    for member in members {
        if let Some(patient) = state.store.get_user(&member.patient_id).await? {
            patients.push(json!({
                "patient_id": patient.id,
                "email": patient.email,
                "role": member.role,
            }));
        }
    }

    Ok(Json(json!({"patients": patients})))
}

/// Read-only caregiver view of a patient's reminders. Ownership stays
/// with the patient; the relation only grants read.
pub async fn patient_reminders(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Path(patient_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let allowed = state.store.has_care_access(&patient_id, &user.id).await?;
    if !allowed {
        // Indistinguishable from an absent patient on purpose.
        return Err(ApiError::not_found("patient not found"));
    }

    let profile = state.store.get_profile(&patient_id).await?;
    let reminders = state.store.list_reminders(&patient_id).await?;

    let rows: Vec<serde_json::Value> = reminders
        .iter()
        .map(|r| {
            json!({
                "title": r.title,
                "kind": r.kind,
                "due_local": display_local(r.due_at, profile.as_ref(), state.default_tz),
                "sent": r.is_sent(),
            })
        })
        .collect();

    Ok(Json(serde_json::Value::Array(rows)))
}
