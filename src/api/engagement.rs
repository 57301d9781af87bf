use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::entities::{search_history, user_preferences};
use crate::services::AuthUser;

const DEFAULT_PAGE_SIZE: i32 = 10;
const MAX_PAGE_SIZE: i32 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntryDto {
    pub id: i32,
    pub query: String,
    pub created_at: String,
}

impl From<search_history::Model> for SearchEntryDto {
    fn from(model: search_history::Model) -> Self {
        Self {
            id: model.id,
            query: model.query,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesDto {
    #[serde(default)]
    pub preferred_sources: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
}

const fn default_page_size() -> i32 {
    DEFAULT_PAGE_SIZE
}

impl From<user_preferences::Model> for PreferencesDto {
    fn from(model: user_preferences::Model) -> Self {
        Self {
            preferred_sources: split_sources(&model.preferred_sources),
            page_size: model.page_size,
        }
    }
}

fn split_sources(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub async fn search_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SearchEntryDto>>, ApiError> {
    let entries = state.articles().recent_searches(user.id).await?;
    Ok(Json(entries.into_iter().map(SearchEntryDto::from).collect()))
}

pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PreferencesDto>, ApiError> {
    let prefs = state.store().get_preferences(user.id).await?;

    Ok(Json(prefs.map_or(
        PreferencesDto {
            preferred_sources: vec![],
            page_size: DEFAULT_PAGE_SIZE,
        },
        PreferencesDto::from,
    )))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PreferencesDto>,
) -> Result<Json<PreferencesDto>, ApiError> {
    if payload.page_size < 1 || payload.page_size > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let stored = payload
        .preferred_sources
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    let saved = state
        .store()
        .save_preferences(user.id, &stored, payload.page_size)
        .await?;

    Ok(Json(PreferencesDto::from(saved)))
}
