//! Pagination and multi-field search over the article store.

use crate::db::{ArticleSearch, Store};
use crate::entities::{articles, search_history};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

const SEARCH_HISTORY_LIMIT: u64 = 50;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Article not found: {0}")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Absent or non-positive values fall back to the defaults; limit is capped.
#[must_use]
pub fn clamp_paging(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
    let limit = limit
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    (page, limit)
}

pub struct ArticleService {
    store: Store,
}

impl ArticleService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// All articles, newest publication first.
    pub async fn list(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(Vec<articles::Model>, Pagination), QueryError> {
        self.search(ArticleSearch::default(), page, limit).await
    }

    /// Filtered listing; an empty filter is equivalent to `list`.
    pub async fn search(
        &self,
        filter: ArticleSearch,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(Vec<articles::Model>, Pagination), QueryError> {
        let (page, limit) = clamp_paging(page, limit);
        let (items, total) = self.store.article_page(&filter, page, limit).await?;
        Ok((items, Pagination::new(page, limit, total)))
    }

    pub async fn get(&self, id: i32) -> Result<articles::Model, QueryError> {
        self.store
            .get_article(id)
            .await?
            .ok_or(QueryError::NotFound(id))
    }

    pub async fn sources(&self) -> Result<Vec<String>, QueryError> {
        Ok(self.store.article_sources().await?)
    }

    /// Best-effort: a failure to record history never fails the search.
    pub async fn record_search(&self, user_id: i32, query: &str) {
        if let Err(e) = self.store.record_search(user_id, query).await {
            warn!("Failed to record search history: {}", e);
        }
    }

    pub async fn recent_searches(
        &self,
        user_id: i32,
    ) -> Result<Vec<search_history::Model>, QueryError> {
        Ok(self
            .store
            .recent_searches(user_id, SEARCH_HISTORY_LIMIT)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_paging_defaults() {
        assert_eq!(clamp_paging(None, None), (1, 10));
        assert_eq!(clamp_paging(Some(0), Some(0)), (1, 10));
        assert_eq!(clamp_paging(Some(3), Some(25)), (3, 25));
    }

    #[test]
    fn clamp_paging_caps_limit() {
        assert_eq!(clamp_paging(Some(1), Some(5000)), (1, MAX_LIMIT));
    }

    #[test]
    fn pagination_page_count() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).pages, 2);
        assert_eq!(Pagination::new(1, 3, 7).pages, 3);
    }
}
