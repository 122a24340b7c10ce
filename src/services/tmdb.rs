//! TMDb metadata gateway
//!
//! Read-only lookups used by the watchlist views and the media proxy routes.
//! Authenticates with the v3 `api_key` query parameter.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{MediaDetails, MediaId, MediaType, TrendingWindow},
};

/// Source of media metadata
#[async_trait]
pub trait MediaMetadataGateway: Send + Sync {
    /// Full details for one movie or TV show
    async fn details(&self, media_type: MediaType, id: MediaId) -> AppResult<MediaDetails>;

    /// Free-text search across movies and TV shows
    async fn search(&self, query: &str) -> AppResult<Vec<MediaDetails>>;

    /// Trending items of one kind
    async fn trending(
        &self,
        media_type: MediaType,
        window: TrendingWindow,
    ) -> AppResult<Vec<MediaDetails>>;

    /// Gateway name for logging and debugging
    fn name(&self) -> &'static str;
}

#[derive(Deserialize)]
struct PagedResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Clone)]
pub struct TmdbGateway {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbGateway {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("TMDB_API_KEY is not set, metadata requests will be rejected upstream");
        }

        Self {
            http_client,
            api_key,
            api_url,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> AppResult<T> {
        let url = format!("{}{}", self.api_url.trim_end_matches('/'), path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, path, &body));
        }

        Ok(response.json().await?)
    }
}

fn status_error(status: StatusCode, path: &str, body: &str) -> AppError {
    if status == StatusCode::NOT_FOUND {
        return AppError::NotFound(format!("No TMDb entry at {}", path));
    }
    AppError::ExternalApi(format!("TMDb returned status {} for {}: {}", status, path, body))
}

/// Keeps movie and TV results, tagging each with its kind
///
/// `fallback` applies to listings whose items carry no `media_type` field
/// (per-kind endpoints); people and unparseable items are dropped.
pub fn parse_results(results: Vec<Value>, fallback: Option<MediaType>) -> Vec<MediaDetails> {
    results
        .into_iter()
        .filter_map(|item| {
            let kind = match item.get("media_type").and_then(Value::as_str) {
                Some(raw) => raw.parse::<MediaType>().ok()?,
                None => fallback?,
            };
            let mut details: MediaDetails = serde_json::from_value(item).ok()?;
            details.media_type = Some(kind);
            Some(details)
        })
        .collect()
}

#[async_trait]
impl MediaMetadataGateway for TmdbGateway {
    #[tracing::instrument(skip(self))]
    async fn details(&self, media_type: MediaType, id: MediaId) -> AppResult<MediaDetails> {
        let path = format!("/{}/{}", media_type.as_str(), id);
        let mut details: MediaDetails = self.get(&path, &[]).await?;
        details.media_type = Some(media_type);
        Ok(details)
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> AppResult<Vec<MediaDetails>> {
        let page: PagedResponse = self
            .get("/search/multi", &[("query", query), ("include_adult", "false")])
            .await?;
        let results = parse_results(page.results, None);
        tracing::debug!(count = results.len(), "TMDb search completed");
        Ok(results)
    }

    #[tracing::instrument(skip(self))]
    async fn trending(
        &self,
        media_type: MediaType,
        window: TrendingWindow,
    ) -> AppResult<Vec<MediaDetails>> {
        let path = format!("/trending/{}/{}", media_type.as_str(), window.as_str());
        let page: PagedResponse = self.get(&path, &[]).await?;
        Ok(parse_results(page.results, Some(media_type)))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
