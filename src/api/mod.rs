//! JSON API surface.
//!
//! Everything under `/api` except register/login sits behind the
//! bearer-token middleware; the billing webhook is unauthenticated and
//! trusts nothing until its signature verifies.

mod assistant;
mod auth;
mod billing;
mod care_team;
mod export;
mod medications;
mod profile;
mod reminders;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono_tz::Tz;
use serde_json::json;

use crate::billing::StripeClient;
use crate::clock::Clock;
use crate::store::Store;
use crate::triage::TriageEngine;

pub use auth::AuthedUser;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub engine: Arc<TriageEngine>,
    pub clock: Arc<dyn Clock>,
    pub default_tz: Tz,
    pub billing: Option<BillingState>,
}

#[derive(Clone)]
pub struct BillingState {
    pub stripe: Arc<StripeClient>,
    pub price_id: String,
    pub webhook_secret: String,
}

pub fn build_router(state: AppState) -> Router {
    let authed = Router::new()
        .route("/api/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/api/reminders", get(reminders::list).post(reminders::create))
        .route("/api/reminders/{id}", delete(reminders::remove))
        .route("/api/medications", get(medications::list).post(medications::add))
        .route("/api/medications/{name}", delete(medications::remove))
        .route("/api/assistant", post(assistant::assess))
        .route("/api/care-team", get(care_team::list_caregivers).post(care_team::add_caregiver))
        .route("/api/care-team/patients", get(care_team::list_patients))
        .route(
            "/api/care-team/patients/{patient_id}/reminders",
            get(care_team::patient_reminders),
        )
        .route("/api/export", get(export::export_data))
        .route("/api/billing/checkout", post(billing::create_checkout))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/stripe/webhook", post(billing::webhook))
        .merge(authed)
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
