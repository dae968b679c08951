//! Medication list endpoints.
//!
//! Medications live as a comma-separated list on the profile record;
//! these handlers give that list CRUD semantics without inventing a
//! separate entity.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use super::{AppState, AuthedUser};
use crate::error::ApiError;

pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn join_list(items: &[String]) -> String {
    items.join(", ")
}

pub async fn list(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;

    Ok(Json(json!({"medications": parse_list(&profile.medications)})))
}

#[derive(Deserialize)]
pub struct AddMedication {
    #[serde(default)]
    pub name: String,
}

pub async fn add(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(req): Json<AddMedication>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid_input("Medication name required."));
    }

    let mut profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;

    let mut meds = parse_list(&profile.medications);
    if !meds.iter().any(|m| m.eq_ignore_ascii_case(name)) {
        meds.push(name.to_string());
        profile.medications = join_list(&meds);
        state.store.update_profile(&profile).await?;
    }

    Ok(Json(json!({"medications": meds})))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut profile = state
        .store
        .get_profile(&user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;

    let meds = parse_list(&profile.medications);
    let remaining: Vec<String> = meds
        .iter()
        .filter(|m| !m.eq_ignore_ascii_case(name.trim()))
        .cloned()
        .collect();

    if remaining.len() == meds.len() {
        return Err(ApiError::not_found("medication not found"));
    }

    profile.medications = join_list(&remaining);
    state.store.update_profile(&profile).await?;

    Ok(Json(json!({"medications": remaining})))
}

#[cfg(test)]
mod tests {
    use super::parse_list;

    #[test]
    fn test_parse_list_handles_commas_and_newlines() {
        assert_eq!(
            parse_list("metformin 500mg, lisinopril\natorvastatin"),
            vec!["metformin 500mg", "lisinopril", "atorvastatin"]
        );
    }

    #[test]
    fn test_parse_list_drops_empties() {
        assert_eq!(parse_list(" , ,\n"), Vec::<String>::new());
        assert_eq!(parse_list(""), Vec::<String>::new());
    }
}
