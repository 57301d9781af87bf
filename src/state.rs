use std::sync::Arc;

use crate::clients::newsapi::NewsApiClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{ArticleService, AuthService, BookmarkService, IngestService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across services to enable connection pooling.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("ArticleDesk/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub news: Arc<NewsApiClient>,

    pub ingest: Arc<IngestService>,

    pub articles: Arc<ArticleService>,

    pub auth: Arc<AuthService>,

    pub bookmarks: Arc<BookmarkService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.news.request_timeout_seconds.into())?;
        let news = Arc::new(NewsApiClient::with_shared_client(
            http_client,
            &config.news.base_url,
            &config.news.api_key,
        ));

        let ingest = Arc::new(IngestService::new(
            store.clone(),
            news.clone(),
            config.news.clone(),
        ));
        let articles = Arc::new(ArticleService::new(store.clone()));
        let auth = Arc::new(AuthService::new(store.clone(), config.auth.clone()));
        let bookmarks = Arc::new(BookmarkService::new(store.clone()));

        Ok(Self {
            config,
            store,
            news,
            ingest,
            articles,
            auth,
            bookmarks,
        })
    }
}
