use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use super::{AppState, AuthedUser};
use crate::error::ApiError;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;
    Ok(Json(serde_json::to_value(profile).map_err(anyhow::Error::from)?))
}

#[derive(Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: String,
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: String,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub notify_email: bool,
    #[serde(default)]
    pub notify_sms: bool,
    #[serde(default)]
    pub tz: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub diet_prefs: String,
    #[serde(default)]
    pub activity_limits: String,
    #[serde(default)]
    pub notes: String,
}

fn default_true() -> bool {
    true
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;

    profile.name = update.name.trim().to_string();
    profile.age = update.age;
    profile.gender = update.gender.trim().to_string();
    profile.weight_kg = update.weight_kg;
    profile.height_cm = update.height_cm;
    profile.conditions = update.conditions.trim().to_string();
    profile.allergies = update.allergies.trim().to_string();
    profile.medications = update.medications.trim().to_string();
    profile.emergency_contact = update.emergency_contact.trim().to_string();
    profile.phone = update.phone.trim().to_string();
    profile.notify_email = update.notify_email;
    profile.notify_sms = update.notify_sms;
    // A bad zone name is tolerated here and falls back at display time;
    // an empty one resets to the configured default.
    profile.tz = if update.tz.trim().is_empty() {
        state.default_tz.to_string()
    } else {
        update.tz.trim().to_string()
    };
    profile.goals = update.goals.trim().to_string();
    profile.diet_prefs = update.diet_prefs.trim().to_string();
    profile.activity_limits = update.activity_limits.trim().to_string();
    profile.notes = update.notes.trim().to_string();

    state.store.update_profile(&profile).await?;
    Ok(Json(serde_json::to_value(profile).map_err(anyhow::Error::from)?))
}
