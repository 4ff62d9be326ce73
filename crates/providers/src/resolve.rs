use marquee_core::types::{ContentRef, ContentType};

use crate::provider::Provider;

/// Build the iframe URL for `provider`.
///
/// A tv request without both season and episode yields `None` rather than a
/// half-built URL. Reachability of the result is never checked.
pub fn resolve(
    content_type: ContentType,
    tmdb_id: u64,
    provider: &Provider,
    season: Option<u32>,
    episode: Option<u32>,
) -> Option<String> {
    match (content_type, season, episode) {
        (ContentType::Movie, _, _) => Some(provider.movie_url(tmdb_id)),
        (ContentType::Tv, Some(season), Some(episode)) => {
            Some(provider.episode_url(tmdb_id, season, episode))
        }
        (ContentType::Tv, _, _) => None,
    }
}

pub fn resolve_ref(content: &ContentRef, provider: &Provider) -> Option<String> {
    resolve(
        content.content_type,
        content.id,
        provider,
        content.season,
        content.episode,
    )
}
