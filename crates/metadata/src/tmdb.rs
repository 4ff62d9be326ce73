//! TMDB (The Movie Database) client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use std::time::Duration;

use marquee_core::types::ContentType;
use moka::future::Cache;
use tracing::debug;

use crate::MetadataError;
use crate::models::{
    self, MediaSummary, MovieDetails, Page, SearchSuggestion, SeasonDetails, SeriesDetails,
};
use crate::source::{MAX_SUGGESTIONS, MetadataSource, is_suggestion_query};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
const CACHE_CAPACITY: u64 = 2_000;

pub struct TmdbClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
    cache: Option<Cache<String, serde_json::Value>>,
}

impl TmdbClient {
    /// A client with no API key answers every call with
    /// [`MetadataError::MissingApiKey`] and never touches the network.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            cache: Some(build_cache(DEFAULT_CACHE_TTL)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Successful responses are reused for `ttl`. Zero disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = (!ttl.is_zero()).then(|| build_cache(ttl));
        self
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, MetadataError> {
        let api_key = self.api_key.as_deref().ok_or(MetadataError::MissingApiKey)?;

        let cache_key = cache_key(path, params);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&cache_key).await {
                debug!(path = %path, "TMDB cache hit");
                return Ok(hit);
            }
        }

        let mut all_params = vec![("api_key", api_key)];
        all_params.extend_from_slice(params);

        let url = format!("{}{path}", self.base_url);
        debug!(path = %path, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MetadataError::NotFound);
        }

        if !resp.status().is_success() {
            return Err(MetadataError::Upstream(resp.status().as_u16()));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| MetadataError::Decode(format!("parse JSON: {e}")))?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, body.clone()).await;
        }
        Ok(body)
    }

    async fn list(
        &self,
        path: &str,
        fallback: ContentType,
    ) -> Result<Vec<MediaSummary>, MetadataError> {
        let data = self.get_json(path, &[("page", "1")]).await?;
        Ok(models::parse_page(data, Some(fallback))?.results)
    }
}

fn build_cache(ttl: Duration) -> Cache<String, serde_json::Value> {
    Cache::builder()
        .max_capacity(CACHE_CAPACITY)
        .time_to_live(ttl)
        .build()
}

fn cache_key(path: &str, params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort();
    let query: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{path}?{}", query.join("&"))
}

#[async_trait::async_trait]
impl MetadataSource for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, MetadataError> {
        let data = self
            .get_json(
                &format!("/movie/{id}"),
                &[("append_to_response", "credits,videos")],
            )
            .await?;
        models::parse_movie(data)
    }

    async fn series_details(&self, id: u64) -> Result<SeriesDetails, MetadataError> {
        let data = self.get_json(&format!("/tv/{id}"), &[]).await?;
        models::parse_series(data)
    }

    async fn season_details(&self, id: u64, season: u32) -> Result<SeasonDetails, MetadataError> {
        let data = self
            .get_json(&format!("/tv/{id}/season/{season}"), &[])
            .await?;
        models::parse_season(data)
    }

    async fn recommendations(
        &self,
        content_type: ContentType,
        id: u64,
    ) -> Result<Page<MediaSummary>, MetadataError> {
        let data = self
            .get_json(
                &format!("/{content_type}/{id}/recommendations"),
                &[("page", "1")],
            )
            .await?;
        models::parse_page(data, Some(content_type))
    }

    async fn search_suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<SearchSuggestion>, MetadataError> {
        if !is_suggestion_query(query) {
            return Ok(Vec::new());
        }
        let data = self
            .get_json(
                "/search/multi",
                &[
                    ("query", query.trim()),
                    ("include_adult", "false"),
                    ("page", "1"),
                ],
            )
            .await?;

        Ok(models::parse_page(data, None)?
            .results
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(SearchSuggestion::from)
            .collect())
    }

    async fn search(&self, query: &str, page: u32) -> Result<Page<MediaSummary>, MetadataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Page::empty());
        }
        let page = page.max(1).to_string();
        let data = self
            .get_json(
                "/search/multi",
                &[("query", query), ("include_adult", "false"), ("page", page.as_str())],
            )
            .await?;
        models::parse_page(data, None)
    }

    async fn trending_movies(&self) -> Result<Vec<MediaSummary>, MetadataError> {
        self.list("/trending/movie/week", ContentType::Movie).await
    }

    async fn popular_series(&self) -> Result<Vec<MediaSummary>, MetadataError> {
        self.list("/tv/popular", ContentType::Tv).await
    }

    async fn top_rated_movies(&self) -> Result<Vec<MediaSummary>, MetadataError> {
        self.list("/movie/top_rated", ContentType::Movie).await
    }
}
