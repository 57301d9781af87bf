use crate::entities::{prelude::*, search_history, user_preferences};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Repository for the per-user engagement tables: search history and
/// preferences.
pub struct EngagementRepository {
    conn: DatabaseConnection,
}

impl EngagementRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn record_search(&self, user_id: i32, query: &str) -> Result<()> {
        let model = search_history::ActiveModel {
            user_id: Set(user_id),
            query: Set(query.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        SearchHistory::insert(model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn recent_searches(
        &self,
        user_id: i32,
        limit: u64,
    ) -> Result<Vec<search_history::Model>> {
        let rows = SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id))
            .order_by_desc(search_history::Column::CreatedAt)
            .order_by_desc(search_history::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get_preferences(&self, user_id: i32) -> Result<Option<user_preferences::Model>> {
        let prefs = UserPreferences::find()
            .filter(user_preferences::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query user preferences")?;

        Ok(prefs)
    }

    pub async fn save_preferences(
        &self,
        user_id: i32,
        preferred_sources: &str,
        page_size: i32,
    ) -> Result<user_preferences::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let existing = UserPreferences::find()
            .filter(user_preferences::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        let saved = if let Some(existing) = existing {
            let mut active: user_preferences::ActiveModel = existing.into();
            active.preferred_sources = Set(preferred_sources.to_string());
            active.page_size = Set(page_size);
            active.updated_at = Set(now);
            active.update(&self.conn).await?
        } else {
            let model = user_preferences::ActiveModel {
                user_id: Set(user_id),
                preferred_sources: Set(preferred_sources.to_string()),
                page_size: Set(page_size),
                updated_at: Set(now),
                ..Default::default()
            };
            model.insert(&self.conn).await?
        };

        Ok(saved)
    }
}
