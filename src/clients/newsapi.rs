use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NewsApiError {
    /// Non-2xx response; carries the upstream error message verbatim.
    #[error("NewsAPI error: {message}")]
    Upstream { status: u16, message: String },

    #[error("NewsAPI request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Article record as returned by the NewsAPI `everything` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireArticle {
    pub source: WireSource,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(rename = "totalResults")]
    total_results: u64,
    articles: Vec<WireArticle>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EverythingQuery {
    pub q: String,
    /// Lower bound on publication date, YYYY-MM-DD.
    pub from: String,
    pub page_size: u32,
}

#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_shared_client(Client::new(), base_url, api_key)
    }

    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetches one page of articles sorted by publication date.
    pub async fn everything(
        &self,
        query: &EverythingQuery,
    ) -> Result<Vec<WireArticle>, NewsApiError> {
        let url = format!("{}/everything", self.base_url);

        // The API key travels as a query parameter but never into the logs.
        info!(%url, q = %query.q, from = %query.from, "Fetching articles from NewsAPI");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.q.clone()),
                ("from", query.from.clone()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", query.page_size.to_string()),
                ("apiKey", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));

            return Err(NewsApiError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: EverythingResponse = response.json().await?;

        info!(
            total_results = body.total_results,
            returned = body.articles.len(),
            "NewsAPI fetch complete"
        );

        Ok(body.articles)
    }
}
