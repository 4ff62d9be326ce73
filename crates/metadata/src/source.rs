use marquee_core::types::ContentType;

use crate::MetadataError;
use crate::models::{
    MediaSummary, MovieDetails, Page, SearchSuggestion, SeasonDetails, SeriesDetails,
};

/// Minimum trimmed query length before a suggestion lookup is attempted.
pub const MIN_SUGGESTION_QUERY: usize = 2;
/// Maximum suggestions returned for one query.
pub const MAX_SUGGESTIONS: usize = 8;

/// Read-only access to the media database.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, MetadataError>;

    async fn series_details(&self, id: u64) -> Result<SeriesDetails, MetadataError>;

    async fn season_details(&self, id: u64, season: u32) -> Result<SeasonDetails, MetadataError>;

    /// First page of recommendations for a movie or series.
    async fn recommendations(
        &self,
        content_type: ContentType,
        id: u64,
    ) -> Result<Page<MediaSummary>, MetadataError>;

    /// Typeahead lookup. Queries shorter than [`MIN_SUGGESTION_QUERY`]
    /// characters (after trimming) return an empty list without a request.
    async fn search_suggestions(&self, query: &str)
    -> Result<Vec<SearchSuggestion>, MetadataError>;

    /// Full multi-search, movies and series only.
    async fn search(&self, query: &str, page: u32) -> Result<Page<MediaSummary>, MetadataError>;

    async fn trending_movies(&self) -> Result<Vec<MediaSummary>, MetadataError>;

    async fn popular_series(&self) -> Result<Vec<MediaSummary>, MetadataError>;

    async fn top_rated_movies(&self) -> Result<Vec<MediaSummary>, MetadataError>;
}

/// True when `query` is long enough to be worth a suggestion lookup.
pub fn is_suggestion_query(query: &str) -> bool {
    query.trim().chars().count() >= MIN_SUGGESTION_QUERY
}
