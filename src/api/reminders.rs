use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, AuthedUser};
use crate::dispatch::display_local;
use crate::error::ApiError;
use crate::timeutil::{parse_local_datetime, resolve_tz};
use crate::types::{Profile, Reminder};

fn reminder_row(r: &Reminder, profile: Option<&Profile>, state: &AppState) -> serde_json::Value {
    json!({
        "id": r.id,
        "title": r.title,
        "kind": r.kind,
        "due_at_utc": r.due_at.to_rfc3339(),
        "due_local": display_local(r.due_at, profile, state.default_tz),
        "pre_notify_min": r.pre_notify_min,
        "notes": r.notes,
        "sent_at": r.sent_at.map(|t| display_local(t, profile, state.default_tz)),
    })
}

pub async fn list(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state.store.get_profile(&user.id).await?;
    let reminders = state.store.list_reminders(&user.id).await?;

    let rows: Vec<serde_json::Value> = reminders
        .iter()
        .map(|r| reminder_row(r, profile.as_ref(), &state))
        .collect();

    Ok(Json(serde_json::Value::Array(rows)))
}

#[derive(Deserialize)]
pub struct CreateReminder {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Local civil time, `YYYY-MM-DD HH:MM`, in the profile's zone.
    #[serde(default)]
    pub due_at: String,
    #[serde(default)]
    pub pre_notify_min: i64,
    #[serde(default)]
    pub notes: String,
}

fn default_kind() -> String {
    "general".to_string()
}

pub async fn create(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(req): Json<CreateReminder>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::invalid_input("Title and valid local date/time required."));
    }
    if req.pre_notify_min < 0 {
        return Err(ApiError::invalid_input("pre_notify_min must be >= 0"));
    }

    let profile = state.store.get_profile(&user.id).await?;
    let tz = profile
        .as_ref()
        .map(|p| resolve_tz(&p.tz, state.default_tz))
        .unwrap_or(state.default_tz);

    let due_utc = parse_local_datetime(&req.due_at, tz)?;

    let reminder = state
        .store
        .create_reminder(&user.id, title, &req.kind, due_utc, req.pre_notify_min, &req.notes)
        .await?;

    Ok(Json(reminder_row(&reminder, profile.as_ref(), &state)))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.store.delete_reminder(&id, &user.id).await?;
    if !deleted {
        return Err(ApiError::not_found("reminder not found"));
    }
    Ok(Json(json!({"deleted": id})))
}
