use articledesk::clients::newsapi::NewsApiClient;
use articledesk::config::NewsConfig;
use articledesk::db::Store;
use articledesk::models::article::NewArticle;
use articledesk::services::ingest::{INSERT_BATCH_SIZE, IngestService};
use std::sync::Arc;

async fn spawn_store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store")
}

fn ingest_service(store: Store) -> IngestService {
    let config = NewsConfig::default();
    let news = Arc::new(NewsApiClient::new(&config.base_url, &config.api_key));
    IngestService::new(store, news, config)
}

fn article(url: &str) -> NewArticle {
    NewArticle {
        source_id: Some("src".to_string()),
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

#[tokio::test]
async fn persist_inserts_only_new_urls() {
    let store = spawn_store().await;
    let ingest = ingest_service(store.clone());

    let stats = ingest
        .persist(vec![article("a"), article("b")])
        .await
        .unwrap();
    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.existing, 0);
    assert_eq!(stats.inserted, 2);
    assert_eq!(store.article_count().await.unwrap(), 2);

    // Second run overlaps on "a"; only "c" lands
    let stats = ingest
        .persist(vec![article("a"), article("c")])
        .await
        .unwrap();
    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.existing, 1);
    assert_eq!(stats.inserted, 1);

    let mut urls = store.article_urls().await.unwrap();
    urls.sort();
    assert_eq!(urls, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn persist_is_a_no_op_when_everything_is_known() {
    let store = spawn_store().await;
    let ingest = ingest_service(store.clone());

    ingest.persist(vec![article("a")]).await.unwrap();
    let stats = ingest.persist(vec![article("a")]).await.unwrap();

    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.batches, 0);
    assert_eq!(store.article_count().await.unwrap(), 1);
}

#[tokio::test]
async fn persist_splits_large_runs_into_batches() {
    let store = spawn_store().await;
    let ingest = ingest_service(store.clone());

    let n = INSERT_BATCH_SIZE * 2 + 20;
    let fetched: Vec<NewArticle> = (0..n)
        .map(|i| article(&format!("https://example.com/{i}")))
        .collect();

    let stats = ingest.persist(fetched).await.unwrap();

    assert_eq!(stats.inserted, n);
    assert_eq!(stats.batches, 3);
    assert_eq!(store.article_count().await.unwrap(), n as u64);
}

#[tokio::test]
async fn store_enforces_url_uniqueness() {
    let store = spawn_store().await;

    store.add_articles(&[article("a")]).await.unwrap();
    let result = store.add_articles(&[article("a")]).await;

    assert!(result.is_err());
    assert_eq!(store.article_count().await.unwrap(), 1);
}
