use crate::entities::{articles, bookmarks, prelude::*};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

pub struct BookmarkRepository {
    conn: DatabaseConnection,
}

impl BookmarkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, user_id: i32, article_id: i32) -> Result<bool> {
        let count = Bookmarks::find()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .filter(bookmarks::Column::ArticleId.eq(article_id))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    pub async fn insert(&self, user_id: i32, article_id: i32) -> Result<i32> {
        let model = bookmarks::ActiveModel {
            user_id: Set(user_id),
            article_id: Set(article_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let res = Bookmarks::insert(model).exec(&self.conn).await?;
        Ok(res.last_insert_id)
    }

    /// One page of a user's bookmarks joined with their articles, newest
    /// bookmark first, plus the total bookmark count for that user.
    pub async fn page_with_articles(
        &self,
        user_id: i32,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<(bookmarks::Model, Option<articles::Model>)>, u64)> {
        let paginator = Bookmarks::find()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .order_by_desc(bookmarks::Column::CreatedAt)
            .order_by_desc(bookmarks::Column::Id)
            .find_also_related(Articles)
            .paginate(&self.conn, limit);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        Ok((rows, total))
    }

    /// Deletes the bookmark only if it belongs to the given user.
    pub async fn delete_owned(&self, id: i32, user_id: i32) -> Result<bool> {
        let res = Bookmarks::delete_many()
            .filter(bookmarks::Column::Id.eq(id))
            .filter(bookmarks::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(res.rows_affected > 0)
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        let count = Bookmarks::find()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;

        Ok(count)
    }
}
