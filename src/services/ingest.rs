//! Scheduled ingestion: fetch a page of articles from NewsAPI, drop the ones
//! already stored (by URL), and persist the remainder in batches.

use crate::clients::newsapi::{EverythingQuery, NewsApiClient, NewsApiError, WireArticle};
use crate::config::NewsConfig;
use crate::db::Store;
use crate::models::article::NewArticle;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// SQLite bound-parameter limits cap how many rows one INSERT can carry.
pub const INSERT_BATCH_SIZE: usize = 50;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("News API error: {0}")]
    Upstream(String),

    #[error("News API request failed: {0}")]
    Fetch(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{failed} of {total} insert batches failed")]
    PartialInsert { failed: usize, total: usize },

    #[error("Ingestion already in progress")]
    AlreadyRunning,
}

impl From<NewsApiError> for IngestError {
    fn from(err: NewsApiError) -> Self {
        match err {
            NewsApiError::Upstream { message, .. } => Self::Upstream(message),
            NewsApiError::Transport(e) => Self::Fetch(e.to_string()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestStats {
    pub fetched: usize,
    pub existing: usize,
    pub inserted: usize,
    pub batches: usize,
}

pub struct IngestService {
    store: Store,
    news: Arc<NewsApiClient>,
    config: NewsConfig,
    in_flight: Mutex<()>,
}

impl IngestService {
    #[must_use]
    pub const fn new(store: Store, news: Arc<NewsApiClient>, config: NewsConfig) -> Self {
        Self {
            store,
            news,
            config,
            in_flight: Mutex::const_new(()),
        }
    }

    /// One full ingestion run: fetch, de-duplicate, persist. Overlapping
    /// runs are single-flighted; the loser is skipped, not queued.
    pub async fn run(&self) -> Result<IngestStats, IngestError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Ingestion already in progress, skipping this run");
            return Err(IngestError::AlreadyRunning);
        };

        let query = EverythingQuery {
            q: self.config.query.clone(),
            from: yesterday(),
            page_size: self.config.page_size,
        };

        let fetched = self.news.everything(&query).await?;
        let articles: Vec<NewArticle> = fetched.into_iter().filter_map(map_wire).collect();

        self.persist(articles).await
    }

    /// De-duplicates against the store and inserts the remainder in batches.
    /// A failed batch does not stop the ones after it, but any failure makes
    /// the whole run report an error.
    pub async fn persist(&self, fetched: Vec<NewArticle>) -> Result<IngestStats, IngestError> {
        let total_fetched = fetched.len();
        info!("Processing {} articles...", total_fetched);

        let existing: HashSet<String> = self
            .store
            .article_urls()
            .await
            .map_err(|e| IngestError::Database(e.to_string()))?
            .into_iter()
            .collect();

        let new_articles = filter_new(fetched, &existing);
        let existing_count = total_fetched - new_articles.len();

        info!(
            "Found {} existing articles, {} new articles to save",
            existing_count,
            new_articles.len()
        );

        if new_articles.is_empty() {
            info!("No new articles to save");
            return Ok(IngestStats {
                fetched: total_fetched,
                existing: existing_count,
                ..Default::default()
            });
        }

        let total_batches = new_articles.len().div_ceil(INSERT_BATCH_SIZE);
        let mut failed = 0usize;

        for (i, batch) in new_articles.chunks(INSERT_BATCH_SIZE).enumerate() {
            match self.store.add_articles(batch).await {
                Ok(()) => info!("Saved batch {}/{}", i + 1, total_batches),
                Err(e) => {
                    failed += 1;
                    error!(
                        batch = i + 1,
                        total = total_batches,
                        error = %e,
                        "Failed to insert article batch"
                    );
                }
            }
        }

        if failed > 0 {
            return Err(IngestError::PartialInsert {
                failed,
                total: total_batches,
            });
        }

        info!(
            fetched = total_fetched,
            existing = existing_count,
            inserted = new_articles.len(),
            batches = total_batches,
            "Articles saved successfully"
        );

        Ok(IngestStats {
            fetched: total_fetched,
            existing: existing_count,
            inserted: new_articles.len(),
            batches: total_batches,
        })
    }
}

/// Keeps only articles whose URL is not yet stored, preserving fetch order.
/// Repeated URLs within the fetched page itself are dropped too.
fn filter_new(fetched: Vec<NewArticle>, existing: &HashSet<String>) -> Vec<NewArticle> {
    let mut seen = existing.clone();
    fetched
        .into_iter()
        .filter(|a| seen.insert(a.url.clone()))
        .collect()
}

/// Maps the wire shape to the internal one, defaulting absent optionals.
/// Records without a title are unusable and dropped.
fn map_wire(wire: WireArticle) -> Option<NewArticle> {
    let title = wire.title?;

    Some(NewArticle {
        source_id: wire.source.id,
        source_name: wire
            .source
            .name
            .unwrap_or_else(|| "Unknown".to_string()),
        author: wire.author,
        title,
        description: wire.description.unwrap_or_default(),
        url: wire.url,
        url_to_image: wire.url_to_image,
        published_at: wire.published_at,
        content: wire.content.unwrap_or_default(),
    })
}

/// Lower bound for the fetch window, YYYY-MM-DD.
fn yesterday() -> String {
    (chrono::Utc::now() - chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::newsapi::WireSource;

    fn article(url: &str) -> NewArticle {
        NewArticle {
            source_id: None,
            source_name: "Test Source".to_string(),
            author: None,
            title: format!("Article at {url}"),
            description: String::new(),
            url: url.to_string(),
            url_to_image: None,
            published_at: "2025-03-01T12:00:00Z".to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn filter_new_keeps_only_unseen_urls_in_order() {
        let existing: HashSet<String> = ["a", "b"].iter().map(ToString::to_string).collect();
        let fetched = vec![article("a"), article("c"), article("d"), article("b")];

        let new = filter_new(fetched, &existing);

        let urls: Vec<&str> = new.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["c", "d"]);
    }

    #[test]
    fn filter_new_drops_duplicates_within_the_page() {
        let fetched = vec![article("a"), article("a"), article("b")];

        let new = filter_new(fetched, &HashSet::new());

        let urls: Vec<&str> = new.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b"]);
    }

    #[test]
    fn map_wire_defaults_absent_optionals() {
        let wire = WireArticle {
            source: WireSource {
                id: None,
                name: Some("BBC News".to_string()),
            },
            author: None,
            title: Some("Headline".to_string()),
            description: None,
            url: "https://example.com/a".to_string(),
            url_to_image: None,
            published_at: "2025-03-01T12:00:00Z".to_string(),
            content: None,
        };

        let article = map_wire(wire).unwrap();
        assert_eq!(article.source_id, None);
        assert_eq!(article.description, "");
        assert_eq!(article.content, "");
        assert_eq!(article.source_name, "BBC News");
    }

    #[test]
    fn map_wire_drops_untitled_records() {
        let wire = WireArticle {
            source: WireSource {
                id: None,
                name: None,
            },
            author: None,
            title: None,
            description: None,
            url: "https://example.com/a".to_string(),
            url_to_image: None,
            published_at: "2025-03-01T12:00:00Z".to_string(),
            content: None,
        };

        assert!(map_wire(wire).is_none());
    }

    #[test]
    fn yesterday_is_a_plain_date() {
        let date = yesterday();
        assert_eq!(date.len(), 10);
        assert_eq!(date.matches('-').count(), 2);
    }
}
