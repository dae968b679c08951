use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::warn;
use url::form_urlencoded::byte_serialize;

use super::{AppState, AuthedUser};
use crate::billing::entitled;
use crate::clock::Clock;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AssessRequest {
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub query: String,
    /// `true` demands the delegated classifier (denied without an active
    /// subscription), `false` forces the rule path, absent means
    /// delegate automatically when entitled.
    #[serde(default)]
    pub delegate: Option<bool>,
}

pub async fn assess(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(req): Json<AssessRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.symptoms.trim().is_empty() {
        return Err(ApiError::invalid_input("Symptom description required."));
    }

    let profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ApiError::invalid_input("Please complete your profile first."))?;

    let now = state.clock.now();
    let subscription = state.store.get_subscription(&user.id).await?;
    let is_entitled = entitled(subscription.as_ref(), now);

    let delegate = match req.delegate {
        Some(true) => {
            if !is_entitled {
                return Err(ApiError::denied(
                    "AI triage requires an active subscription. Upgrade at /api/billing/checkout to enable it.",
                ));
            }
            if !state.engine.delegation_available() {
                return Err(ApiError::invalid_input("AI triage is not configured."));
            }
            true
        }
        Some(false) => false,
        None => is_entitled,
    };

    let result = state
        .engine
        .assess(delegate, &req.symptoms, &req.query, Some(&profile))
        .await;

    let serialized =
        serde_json::to_string(&result).map_err(anyhow::Error::from)?;
    if let Err(e) = state
        .store
        .create_plan(&user.id, "assistant", &serialized, now)
        .await
    {
        // The assessment is still worth returning when the write fails.
        warn!(user = %user.id, "Failed to persist triage plan: {}", e);
    }

    let mut body = serde_json::to_value(&result).map_err(anyhow::Error::from)?;
    if let Some(query) = &result.doctor_search_query {
        let encoded: String = byte_serialize(query.as_bytes()).collect();
        body["google_search_link"] =
            serde_json::Value::String(format!("https://www.google.com/search?q={}", encoded));
    }

    Ok(Json(body))
}
