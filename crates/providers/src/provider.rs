use serde::Serialize;
use url::form_urlencoded;

/// Builds the movie embed URL for a TMDB id.
pub type MovieUrlFn = fn(u64) -> String;
/// Builds the episode embed URL for a TMDB series id, season and episode.
pub type EpisodeUrlFn = fn(u64, u32, u32) -> String;

/// One external streaming source.
///
/// `rank` is advisory: nothing sorts or filters on it.
#[derive(Debug, Clone)]
pub struct Provider {
    pub name: &'static str,
    pub rank: u32,
    pub disabled: bool,
    /// Origins the embed is served from, for `frame-src` / `media-src`.
    pub origins: &'static [&'static str],
    movie_url: MovieUrlFn,
    episode_url: EpisodeUrlFn,
}

impl Provider {
    pub const fn new(
        name: &'static str,
        rank: u32,
        origins: &'static [&'static str],
        movie_url: MovieUrlFn,
        episode_url: EpisodeUrlFn,
    ) -> Self {
        Self {
            name,
            rank,
            disabled: false,
            origins,
            movie_url,
            episode_url,
        }
    }

    pub fn movie_url(&self, tmdb_id: u64) -> String {
        (self.movie_url)(tmdb_id)
    }

    pub fn episode_url(&self, tmdb_id: u64, season: u32, episode: u32) -> String {
        (self.episode_url)(tmdb_id, season, episode)
    }

    pub fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name.to_string(),
            rank: self.rank,
            disabled: self.disabled,
        }
    }
}

/// Serializable view of a provider for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub rank: u32,
    pub disabled: bool,
}

/// Append form-encoded query parameters to a base URL.
pub(crate) fn with_query(base: String, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return base;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{base}?{query}")
}
