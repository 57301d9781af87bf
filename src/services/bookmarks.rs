//! Authenticated bookmark CRUD over the bookmarks/articles join.

use crate::db::Store;
use crate::entities::{articles, bookmarks};
use crate::services::articles::{Pagination, clamp_paging};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Article not found: {0}")]
    ArticleNotFound(i32),

    #[error("Article already bookmarked")]
    Duplicate,

    #[error("Bookmark not found: {0}")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for BookmarkError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub struct BookmarkService {
    store: Store,
}

impl BookmarkService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// The user's bookmarks joined with their articles, newest bookmark
    /// first, in the same pagination envelope as article listings.
    pub async fn list(
        &self,
        user_id: i32,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(Vec<(bookmarks::Model, articles::Model)>, Pagination), BookmarkError> {
        let (page, limit) = clamp_paging(page, limit);
        let (rows, total) = self.store.bookmark_page(user_id, page, limit).await?;

        // Articles are never deleted, so the join side is always present.
        let rows = rows
            .into_iter()
            .filter_map(|(bookmark, article)| article.map(|a| (bookmark, a)))
            .collect();

        Ok((rows, Pagination::new(page, limit, total)))
    }

    /// Returns the new bookmark's id. The unique (user, article) index
    /// backstops the existence check under concurrent callers.
    pub async fn create(&self, user_id: i32, article_id: i32) -> Result<i32, BookmarkError> {
        if self.store.get_article(article_id).await?.is_none() {
            return Err(BookmarkError::ArticleNotFound(article_id));
        }

        if self.store.bookmark_exists(user_id, article_id).await? {
            return Err(BookmarkError::Duplicate);
        }

        Ok(self.store.add_bookmark(user_id, article_id).await?)
    }

    /// Only the owner can delete; anything else looks like NotFound.
    pub async fn delete(&self, user_id: i32, bookmark_id: i32) -> Result<(), BookmarkError> {
        let deleted = self.store.delete_bookmark(bookmark_id, user_id).await?;
        if deleted {
            Ok(())
        } else {
            Err(BookmarkError::NotFound(bookmark_id))
        }
    }

    pub async fn count(&self, user_id: i32) -> Result<u64, BookmarkError> {
        Ok(self.store.bookmark_count(user_id).await?)
    }
}
