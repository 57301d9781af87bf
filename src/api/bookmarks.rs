use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::articles::ListQuery;
use super::auth::MessageResponse;
use super::{ApiError, AppState};
use crate::entities::{articles, bookmarks};
use crate::services::{AuthUser, Pagination};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    #[serde(default)]
    pub article_id: Option<i32>,
}

/// A bookmark joined with the fields of its article that listings need.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDto {
    pub bookmark_id: i32,
    pub article_id: i32,
    pub title: String,
    pub description: String,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: String,
    pub source_name: String,
    pub bookmarked_at: String,
}

impl From<(bookmarks::Model, articles::Model)> for BookmarkDto {
    fn from((bookmark, article): (bookmarks::Model, articles::Model)) -> Self {
        Self {
            bookmark_id: bookmark.id,
            article_id: article.id,
            title: article.title,
            description: article.description,
            url: article.url,
            url_to_image: article.url_to_image,
            published_at: article.published_at,
            source_name: article.source_name,
            bookmarked_at: bookmark.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookmarkPageResponse {
    pub bookmarks: Vec<BookmarkDto>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkResponse {
    pub message: String,
    pub bookmark_id: i32,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookmarkPageResponse>, ApiError> {
    let (rows, pagination) = state
        .bookmarks()
        .list(user.id, query.page, query.limit)
        .await?;

    Ok(Json(BookmarkPageResponse {
        bookmarks: rows.into_iter().map(BookmarkDto::from).collect(),
        pagination,
    }))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateBookmarkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(article_id) = payload.article_id else {
        return Err(ApiError::validation("Article ID is required"));
    };

    let bookmark_id = state.bookmarks().create(user.id, article_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookmarkResponse {
            message: "Bookmark added successfully".to_string(),
            bookmark_id,
        }),
    ))
}

pub async fn count(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.bookmarks().count(user.id).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.bookmarks().delete(user.id, id).await?;

    Ok(Json(MessageResponse {
        message: "Bookmark removed successfully".to_string(),
    }))
}
