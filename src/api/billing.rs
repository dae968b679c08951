use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde_json::json;
use tracing::warn;

use super::{AppState, AuthedUser};
use crate::billing::webhook::{apply_event, verify_signature};
use crate::clock::Clock;
use crate::error::ApiError;

pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(billing) = &state.billing else {
        return Err(ApiError::invalid_input("Billing is not configured."));
    };

    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let success_url = format!("http://{}/billing?success=1", host);
    let cancel_url = format!("http://{}/billing?canceled=1", host);

    let session_id = billing
        .stripe
        .create_checkout_session(&billing.price_id, &user.email, &success_url, &cancel_url)
        .await
        .map_err(|e| ApiError::ExternalServiceFailure(e.to_string()))?;

    Ok(Json(json!({"id": session_id})))
}

/// Billing provider webhook. Unauthenticated; nothing in the payload is
/// trusted until the signature verifies, and an invalid signature
/// changes no state.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(billing) = &state.billing else {
        // Mirror of the unconfigured-integration posture: acknowledge and
        // do nothing, so a misdirected provider does not retry forever.
        return Ok(Json(json!({"received": false})));
    };

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let now = state.clock.now();
    let valid = verify_signature(&body, signature, &billing.webhook_secret, now)
        .map_err(ApiError::InvalidInput)?;
    if !valid {
        return Err(ApiError::denied("webhook signature mismatch"));
    }

    let event: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::invalid_input(format!("bad webhook payload: {}", e)))?;

    if let Err(e) = apply_event(&state.store, &event, now).await {
        // Non-2xx makes the provider redeliver; the apply is idempotent
        // so the retry is safe.
        warn!("Failed to apply webhook event: {}", e);
        return Err(ApiError::Internal(e.to_string()));
    }

    Ok(Json(json!({"received": true})))
}
