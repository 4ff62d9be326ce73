//! Explicit schemas for the parts of TMDB responses this app uses.
//!
//! `Raw*` types mirror the upstream JSON loosely (every field optional) and
//! are validated into the public types. List items that fail validation are
//! dropped; detail payloads that fail become [`MetadataError::Decode`].

use marquee_core::types::ContentType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::MetadataError;
use crate::images::{self, BACKDROP, POSTER, POSTER_CARD};

/// Cap on credited cast members kept from a details payload.
const MAX_CAST: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub page: u32,
    pub results: Vec<T>,
    pub total_pages: u32,
    pub total_results: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            page: 1,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// A movie or series as it appears in lists (recommendations, search, home).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSummary {
    pub id: u64,
    pub media_type: ContentType,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub year: Option<i32>,
    pub vote_average: f64,
    pub poster_url: String,
}

/// One entry of the search-as-you-type dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub year: Option<i32>,
    pub poster_path: Option<String>,
    pub vote_average: f64,
}

impl From<MediaSummary> for SearchSuggestion {
    fn from(m: MediaSummary) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content_type: m.media_type,
            year: m.year,
            poster_path: m.poster_path,
            vote_average: m.vote_average,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCompany {
    pub name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: String,
    pub tagline: Option<String>,
    pub release_date: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<u32>,
    pub vote_average: f64,
    pub adult: bool,
    pub genres: Vec<Genre>,
    pub production_companies: Vec<ProductionCompany>,
    pub cast: Vec<CastMember>,
    pub director: Option<String>,
    pub trailer: Option<Video>,
    pub poster_url: String,
    pub backdrop_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDetails {
    pub id: u64,
    pub name: String,
    pub overview: String,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub year: Option<i32>,
    pub vote_average: f64,
    pub number_of_seasons: Option<u32>,
    pub genres: Vec<Genre>,
    pub seasons: Vec<SeasonSummary>,
    pub poster_url: String,
    pub backdrop_url: String,
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub episode_number: u32,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub still_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonDetails {
    pub season_number: u32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub episodes: Vec<Episode>,
}

impl SeasonDetails {
    pub fn episode(&self, number: u32) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.episode_number == number)
    }
}

// ---------------------------------------------------------------------------
// Raw upstream shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSummary {
    id: Option<u64>,
    title: Option<String>,
    name: Option<String>,
    media_type: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    page: Option<u32>,
    #[serde(default)]
    results: Vec<serde_json::Value>,
    total_pages: Option<u32>,
    total_results: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCredits {
    #[serde(default)]
    cast: Vec<RawCast>,
    #[serde(default)]
    crew: Vec<RawCrew>,
}

#[derive(Debug, Deserialize)]
struct RawCast {
    name: Option<String>,
    character: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCrew {
    name: Option<String>,
    job: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVideos {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawMovie {
    id: u64,
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    vote_average: Option<f64>,
    #[serde(default)]
    adult: bool,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    credits: RawCredits,
    #[serde(default)]
    videos: RawVideos,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    id: u64,
    name: Option<String>,
    overview: Option<String>,
    first_air_date: Option<String>,
    last_air_date: Option<String>,
    vote_average: Option<f64>,
    number_of_seasons: Option<u32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Deserialize)]
struct RawSeason {
    season_number: u32,
    name: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    episodes: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Validate one list item.
///
/// `fallback` is the type assumed when the record carries no `media_type`
/// (single-type endpoints). With `None`, untyped records are rejected, as
/// are typed records that are neither movies nor series (people).
fn summary_from_value(value: serde_json::Value, fallback: Option<ContentType>) -> Option<MediaSummary> {
    let raw: RawSummary = serde_json::from_value(value).ok()?;

    let media_type = match raw.media_type.as_deref() {
        Some(t) => ContentType::parse(t)?,
        None => fallback?,
    };
    let id = raw.id.filter(|id| *id > 0)?;
    let title = non_empty(raw.title).or_else(|| non_empty(raw.name))?;
    let release_date = non_empty(raw.release_date).or_else(|| non_empty(raw.first_air_date));
    let poster_path = non_empty(raw.poster_path);

    Some(MediaSummary {
        id,
        media_type,
        title,
        overview: raw.overview.unwrap_or_default(),
        poster_url: images::image_url(poster_path.as_deref(), POSTER_CARD),
        poster_path,
        backdrop_path: non_empty(raw.backdrop_path),
        year: year_of(release_date.as_deref()),
        release_date,
        vote_average: raw.vote_average.unwrap_or(0.0),
    })
}

/// Decode a paginated list, keeping only conforming records.
pub fn parse_page(
    data: serde_json::Value,
    fallback: Option<ContentType>,
) -> Result<Page<MediaSummary>, MetadataError> {
    let raw: RawPage =
        serde_json::from_value(data).map_err(|e| MetadataError::Decode(e.to_string()))?;

    let total = raw.results.len();
    let results: Vec<MediaSummary> = raw
        .results
        .into_iter()
        .filter_map(|v| summary_from_value(v, fallback))
        .collect();

    if results.len() < total {
        debug!(dropped = total - results.len(), kept = results.len(), "dropped non-conforming records");
    }

    Ok(Page {
        page: raw.page.unwrap_or(1),
        results,
        total_pages: raw.total_pages.unwrap_or(0),
        total_results: raw.total_results.unwrap_or(0),
    })
}

pub fn parse_movie(data: serde_json::Value) -> Result<MovieDetails, MetadataError> {
    let raw: RawMovie =
        serde_json::from_value(data).map_err(|e| MetadataError::Decode(e.to_string()))?;

    let cast = raw
        .credits
        .cast
        .into_iter()
        .filter_map(|c| {
            let name = non_empty(c.name)?;
            Some(CastMember {
                name,
                character: non_empty(c.character),
                profile_url: images::image_url(c.profile_path.as_deref(), images::PROFILE),
            })
        })
        .take(MAX_CAST)
        .collect();

    let director = raw
        .credits
        .crew
        .into_iter()
        .find(|c| c.job.as_deref() == Some("Director"))
        .and_then(|c| non_empty(c.name));

    let trailer = raw
        .videos
        .results
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Video>(v).ok())
        .find(|v| v.kind == "Trailer" && v.site == "YouTube");

    let release_date = non_empty(raw.release_date);

    Ok(MovieDetails {
        id: raw.id,
        title: non_empty(raw.title).unwrap_or_else(|| "Untitled".to_string()),
        original_title: non_empty(raw.original_title),
        overview: raw.overview.unwrap_or_default(),
        tagline: non_empty(raw.tagline),
        year: year_of(release_date.as_deref()),
        release_date,
        runtime: raw.runtime.filter(|r| *r > 0),
        vote_average: raw.vote_average.unwrap_or(0.0),
        adult: raw.adult,
        genres: raw.genres,
        production_companies: raw.production_companies,
        cast,
        director,
        trailer,
        poster_url: images::image_url(raw.poster_path.as_deref(), POSTER),
        backdrop_url: images::image_url(raw.backdrop_path.as_deref(), BACKDROP),
    })
}

pub fn parse_series(data: serde_json::Value) -> Result<SeriesDetails, MetadataError> {
    let raw: RawSeries =
        serde_json::from_value(data).map_err(|e| MetadataError::Decode(e.to_string()))?;

    let first_air_date = non_empty(raw.first_air_date);
    let backdrop_path = non_empty(raw.backdrop_path);

    Ok(SeriesDetails {
        id: raw.id,
        name: non_empty(raw.name).unwrap_or_else(|| "Untitled".to_string()),
        overview: raw.overview.unwrap_or_default(),
        year: year_of(first_air_date.as_deref()),
        first_air_date,
        last_air_date: non_empty(raw.last_air_date),
        vote_average: raw.vote_average.unwrap_or(0.0),
        number_of_seasons: raw.number_of_seasons,
        genres: raw.genres,
        seasons: raw.seasons,
        poster_url: images::image_url(raw.poster_path.as_deref(), POSTER),
        backdrop_url: images::image_url(backdrop_path.as_deref(), BACKDROP),
        backdrop_path,
    })
}

pub fn parse_season(data: serde_json::Value) -> Result<SeasonDetails, MetadataError> {
    let raw: RawSeason =
        serde_json::from_value(data).map_err(|e| MetadataError::Decode(e.to_string()))?;

    let episodes = raw
        .episodes
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Episode>(v).ok())
        .collect();

    Ok(SeasonDetails {
        season_number: raw.season_number,
        name: non_empty(raw.name),
        overview: non_empty(raw.overview),
        episodes,
    })
}
