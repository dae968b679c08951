use axum::extract::State;
use axum::{Extension, Json};
use serde_json::json;

use super::{AppState, AuthedUser};
use crate::error::ApiError;

/// Full JSON dump of the caller's data: account, profile, reminders,
/// and saved plans.
pub async fn export_data(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state.store.get_profile(&user.id).await?;
    let reminders = state.store.list_reminders(&user.id).await?;
    let plans = state.store.list_plans(&user.id).await?;

    let reminder_rows: Vec<serde_json::Value> = reminders
        .iter()
        .map(|r| {
            json!({
                "title": r.title,
                "kind": r.kind,
                "due_at_utc": r.due_at.to_rfc3339(),
                "pre_notify_min": r.pre_notify_min,
                "notes": r.notes,
            })
        })
        .collect();

    let plan_rows: Vec<serde_json::Value> = plans
        .iter()
        .map(|p| {
            json!({
                "kind": p.kind,
                "created_at": p.created_at.to_rfc3339(),
                "content": p.content,
            })
        })
        .collect();

    Ok(Json(json!({
        "user": {"email": user.email, "is_pro": user.is_pro},
        "profile": profile,
        "reminders": reminder_rows,
        "plans": plan_rows,
    })))
}
