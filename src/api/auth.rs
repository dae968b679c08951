use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::AppState;
use crate::clock::Clock;
use crate::error::ApiError;
use crate::types::User;

/// Authenticated user, inserted into request extensions by
/// `require_auth` and extracted by handlers.
#[derive(Clone)]
pub struct AuthedUser(pub User);

/// Bearer-token middleware for everything under `/api` except
/// register/login.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if token.is_empty() {
        return Err(ApiError::denied("authentication required"));
    }

    let user = state
        .store
        .get_user_by_token(token)
        .await?
        .ok_or_else(|| ApiError::denied("invalid or expired token"))?;

    req.extensions_mut().insert(AuthedUser(user));
    Ok(next.run(req).await)
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid_input("Email and password required."));
    }

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::invalid_input("Account exists."));
    }

    let password_hash = hash_password(&req.password)?;
    let now = state.clock.now();
    let user = state.store.create_user(&email, &password_hash, now).await?;
    // Every account starts with an (empty) profile.
    state
        .store
        .create_profile(&user.id, &state.default_tz.to_string())
        .await?;

    info!(user = %user.id, "Account registered");
    Ok(Json(json!({"user_id": user.id, "token": user.api_token})))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = req.email.trim().to_lowercase();

    let user = match state.store.get_user_by_email(&email).await? {
        Some(u) if verify_password(&req.password, &u.password_hash) => u,
        _ => return Err(ApiError::denied("Invalid credentials.")),
    };

    let token = state.store.rotate_api_token(&user.id).await?;
    Ok(Json(json!({"user_id": user.id, "token": token})))
}
