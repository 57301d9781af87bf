use crate::entities::{articles, bookmarks, search_history, user_preferences, users};
use crate::models::article::NewArticle;
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::article::ArticleSearch;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn article_repo(&self) -> repositories::article::ArticleRepository {
        repositories::article::ArticleRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn bookmark_repo(&self) -> repositories::bookmark::BookmarkRepository {
        repositories::bookmark::BookmarkRepository::new(self.conn.clone())
    }

    fn engagement_repo(&self) -> repositories::engagement::EngagementRepository {
        repositories::engagement::EngagementRepository::new(self.conn.clone())
    }

    // ========== Articles ==========

    pub async fn add_articles(&self, batch: &[NewArticle]) -> Result<()> {
        self.article_repo().insert_batch(batch).await
    }

    pub async fn article_urls(&self) -> Result<Vec<String>> {
        self.article_repo().urls().await
    }

    pub async fn article_page(
        &self,
        search: &ArticleSearch,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<articles::Model>, u64)> {
        self.article_repo().page(search, page, limit).await
    }

    pub async fn get_article(&self, id: i32) -> Result<Option<articles::Model>> {
        self.article_repo().get(id).await
    }

    pub async fn article_sources(&self) -> Result<Vec<String>> {
        self.article_repo().sources().await
    }

    pub async fn article_count(&self) -> Result<u64> {
        self.article_repo().count().await
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model> {
        self.user_repo().create(name, email, password_hash).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn set_user_token(&self, id: i32, token: &str) -> Result<()> {
        self.user_repo().set_token(id, token).await
    }

    pub async fn user_count(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ========== Bookmarks ==========

    pub async fn bookmark_exists(&self, user_id: i32, article_id: i32) -> Result<bool> {
        self.bookmark_repo().exists(user_id, article_id).await
    }

    pub async fn add_bookmark(&self, user_id: i32, article_id: i32) -> Result<i32> {
        self.bookmark_repo().insert(user_id, article_id).await
    }

    pub async fn bookmark_page(
        &self,
        user_id: i32,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<(bookmarks::Model, Option<articles::Model>)>, u64)> {
        self.bookmark_repo()
            .page_with_articles(user_id, page, limit)
            .await
    }

    pub async fn delete_bookmark(&self, id: i32, user_id: i32) -> Result<bool> {
        self.bookmark_repo().delete_owned(id, user_id).await
    }

    pub async fn bookmark_count(&self, user_id: i32) -> Result<u64> {
        self.bookmark_repo().count_for_user(user_id).await
    }

    // ========== Engagement ==========

    pub async fn record_search(&self, user_id: i32, query: &str) -> Result<()> {
        self.engagement_repo().record_search(user_id, query).await
    }

    pub async fn recent_searches(
        &self,
        user_id: i32,
        limit: u64,
    ) -> Result<Vec<search_history::Model>> {
        self.engagement_repo().recent_searches(user_id, limit).await
    }

    pub async fn get_preferences(&self, user_id: i32) -> Result<Option<user_preferences::Model>> {
        self.engagement_repo().get_preferences(user_id).await
    }

    pub async fn save_preferences(
        &self,
        user_id: i32,
        preferred_sources: &str,
        page_size: i32,
    ) -> Result<user_preferences::Model> {
        self.engagement_repo()
            .save_preferences(user_id, preferred_sources, page_size)
            .await
    }
}
