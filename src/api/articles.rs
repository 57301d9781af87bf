use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::MaybeUser;
use super::{ApiError, AppState};
use crate::db::ArticleSearch;
use crate::entities::articles;
use crate::services::Pagination;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub id: i32,
    pub source_id: Option<String>,
    pub source_name: String,
    pub author: Option<String>,
    pub title: String,
    pub description: String,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: String,
    pub content: String,
}

impl From<articles::Model> for ArticleDto {
    fn from(model: articles::Model) -> Self {
        Self {
            id: model.id,
            source_id: model.source_id,
            source_name: model.source_name,
            author: model.author,
            title: model.title,
            description: model.description,
            url: model.url,
            url_to_image: model.url_to_image,
            published_at: model.published_at,
            content: model.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticlePageResponse {
    pub articles: Vec<ArticleDto>,
    pub pagination: Pagination,
}

fn page_response(items: Vec<articles::Model>, pagination: Pagination) -> ArticlePageResponse {
    ArticlePageResponse {
        articles: items.into_iter().map(ArticleDto::from).collect(),
        pagination,
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ArticlePageResponse>, ApiError> {
    let (items, pagination) = state.articles().list(query.page, query.limit).await?;
    Ok(Json(page_response(items, pagination)))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ArticlePageResponse>, ApiError> {
    let filter = ArticleSearch {
        q: none_if_blank(query.q),
        author: none_if_blank(query.author),
        source: none_if_blank(query.source),
        from: none_if_blank(query.from),
        to: none_if_blank(query.to),
    };

    if let (Some(user), Some(q)) = (user.as_ref(), filter.q.as_deref()) {
        state.articles().record_search(user.id, q).await;
    }

    let (items, pagination) = state
        .articles()
        .search(filter, query.page, query.limit)
        .await?;

    Ok(Json(page_response(items, pagination)))
}

pub async fn sources(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let sources = state.articles().sources().await?;
    Ok(Json(sources))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ArticleDto>, ApiError> {
    let article = state.articles().get(id).await?;
    Ok(Json(ArticleDto::from(article)))
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
