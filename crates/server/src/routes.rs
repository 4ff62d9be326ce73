use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use marquee_core::error::ApiError;
use marquee_core::types::{ContentRef, ContentType, parse_id};
use marquee_metadata::models::{Episode, MediaSummary, MovieDetails, Page, SeriesDetails};
use marquee_metadata::source::is_suggestion_query;
use marquee_providers::PlayerSelection;
use marquee_providers::provider::ProviderInfo;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::progress::{RecordOutcome, StoredProgress};
use crate::state::AppState;

/// Items per list on the home page.
const HOME_LIST_LEN: usize = 14;
const MAX_CLIENT_ID_LEN: usize = 128;

pub fn build_router(state: AppState) -> Router {
    let registry = state.providers.clone();
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    crate::security::apply(router, &registry)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Providers and players
        .route("/providers", get(list_providers))
        .route("/player/{content_type}/{id}", get(player_url))
        .route("/watch/movie/{id}", get(watch_movie))
        .route("/watch/tv/{id}/{season}/{episode}", get(watch_episode))
        // Metadata
        .route("/home", get(home))
        .route("/movies/{id}", get(movie_details))
        .route("/tv/{id}", get(series_details))
        .route("/tv/{id}/season/{season}", get(season_details))
        .route("/recommendations/{content_type}/{id}", get(recommendations))
        .route("/search", get(search))
        .route("/search/suggestions", get(search_suggestions))
        .route("/search/live", get(crate::live::live_suggestions))
        // Playback
        .route("/playback/messages", post(relay_player_message))
        .route("/playback/progress/{client_id}/{key}", get(get_progress))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a numeric route segment; anything else is a missing resource.
fn path_number<T: TryFrom<u64>>(raw: &str, what: &str) -> Result<T, AppError> {
    parse_id(raw)
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| AppError::not_found(what))
}

fn path_content_type(raw: &str) -> Result<ContentType, AppError> {
    ContentType::parse(raw).ok_or_else(|| AppError::not_found("content type"))
}

/// JSON body with the metadata `Cache-Control` header.
fn cached<T: Serialize>(state: &AppState, body: T) -> Response {
    ([(header::CACHE_CONTROL, state.cache_control())], Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Providers and players
// ---------------------------------------------------------------------------

async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(state.providers.infos())
}

#[derive(Deserialize)]
struct ProviderQuery {
    provider: Option<String>,
}

#[derive(Deserialize)]
struct PlayerQuery {
    provider: Option<String>,
    season: Option<String>,
    episode: Option<String>,
}

#[derive(Serialize)]
struct PlayerResponse {
    content: ContentRef,
    provider: String,
    /// `null` until a tv request names both season and episode.
    player_url: Option<String>,
}

async fn player_url(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
    Query(query): Query<PlayerQuery>,
) -> Result<Json<PlayerResponse>, AppError> {
    let content_type = path_content_type(&content_type)?;
    let id = path_number(&id, "content")?;
    let season = query
        .season
        .as_deref()
        .map(|s| path_number(s, "season"))
        .transpose()?;
    let episode = query
        .episode
        .as_deref()
        .map(|e| path_number(e, "episode"))
        .transpose()?;

    let content = match content_type {
        ContentType::Movie => ContentRef::movie(id),
        ContentType::Tv => ContentRef {
            content_type,
            id,
            season,
            episode,
        },
    };
    let selection = PlayerSelection::starting_at(&state.providers, query.provider.as_deref())?;

    Ok(Json(PlayerResponse {
        content,
        provider: selection.provider().name.to_string(),
        player_url: selection.player_url(&content),
    }))
}

/// Everything a watch page needs to render its player.
#[derive(Serialize)]
struct WatchResponse<T> {
    content: T,
    title: String,
    backdrop_url: String,
    provider: String,
    providers: Vec<ProviderInfo>,
    player_url: Option<String>,
}

#[derive(Serialize)]
struct EpisodeContent {
    series: SeriesDetails,
    episode: Episode,
}

fn watch_response<T>(
    state: &AppState,
    selection: &PlayerSelection<'_>,
    content_ref: ContentRef,
    content: T,
    title: String,
    backdrop_url: String,
) -> WatchResponse<T> {
    WatchResponse {
        content,
        title,
        backdrop_url,
        provider: selection.provider().name.to_string(),
        providers: state.providers.infos(),
        player_url: selection.player_url(&content_ref),
    }
}

async fn watch_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<WatchResponse<MovieDetails>>, AppError> {
    let id = path_number(&id, "movie")?;
    let selection = PlayerSelection::starting_at(&state.providers, query.provider.as_deref())?;

    let movie = state
        .metadata
        .movie_details(id)
        .await
        .map_err(|e| AppError::metadata(e, "Failed to fetch movie details"))?;

    let title = movie.title.clone();
    let backdrop_url = movie.backdrop_url.clone();
    Ok(Json(watch_response(
        &state,
        &selection,
        ContentRef::movie(id),
        movie,
        title,
        backdrop_url,
    )))
}

async fn watch_episode(
    State(state): State<AppState>,
    Path((id, season, episode)): Path<(String, String, String)>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<WatchResponse<EpisodeContent>>, AppError> {
    let id = path_number(&id, "series")?;
    let season_number: u32 = path_number(&season, "season")?;
    let episode_number: u32 = path_number(&episode, "episode")?;
    let selection = PlayerSelection::starting_at(&state.providers, query.provider.as_deref())?;

    let (series, season) = tokio::try_join!(
        state.metadata.series_details(id),
        state.metadata.season_details(id, season_number),
    )
    .map_err(|e| AppError::metadata(e, "Failed to fetch episode details"))?;

    let episode = season
        .episode(episode_number)
        .cloned()
        .ok_or_else(|| AppError::not_found("episode"))?;

    let title = format!(
        "{} - S{season_number:02}E{episode_number:02}",
        series.name
    );
    let backdrop_url = series.backdrop_url.clone();
    Ok(Json(watch_response(
        &state,
        &selection,
        ContentRef::episode(id, season_number, episode_number),
        EpisodeContent { series, episode },
        title,
        backdrop_url,
    )))
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HomeResponse {
    trending_movies: Vec<MediaSummary>,
    popular_series: Vec<MediaSummary>,
    top_rated_movies: Vec<MediaSummary>,
}

async fn home(State(state): State<AppState>) -> Result<Response, AppError> {
    let (mut trending_movies, mut popular_series, mut top_rated_movies) = tokio::try_join!(
        state.metadata.trending_movies(),
        state.metadata.popular_series(),
        state.metadata.top_rated_movies(),
    )
    .map_err(|e| AppError::metadata(e, "Failed to fetch home page"))?;

    trending_movies.truncate(HOME_LIST_LEN);
    popular_series.truncate(HOME_LIST_LEN);
    top_rated_movies.truncate(HOME_LIST_LEN);

    Ok(cached(
        &state,
        HomeResponse {
            trending_movies,
            popular_series,
            top_rated_movies,
        },
    ))
}

async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = path_number(&id, "movie")?;
    let movie = state
        .metadata
        .movie_details(id)
        .await
        .map_err(|e| AppError::metadata(e, "Failed to fetch movie details"))?;
    Ok(cached(&state, movie))
}

async fn series_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = path_number(&id, "series")?;
    let series = state
        .metadata
        .series_details(id)
        .await
        .map_err(|e| AppError::metadata(e, "Failed to fetch series details"))?;
    Ok(cached(&state, series))
}

async fn season_details(
    State(state): State<AppState>,
    Path((id, season)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let id = path_number(&id, "series")?;
    let season = path_number(&season, "season")?;
    let details = state
        .metadata
        .season_details(id, season)
        .await
        .map_err(|e| AppError::metadata(e, "Failed to fetch season details"))?;
    Ok(cached(&state, details))
}

async fn recommendations(
    State(state): State<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let content_type = path_content_type(&content_type)?;
    let id = path_number(&id, content_type.as_str())?;
    let page = state
        .metadata
        .recommendations(content_type, id)
        .await
        .map_err(|e| AppError::upstream(e, "Failed to fetch recommendations"))?;
    Ok(cached(&state, page))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
}

async fn search_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let q = query.q.unwrap_or_default();
    if !is_suggestion_query(&q) {
        return Ok(Json(Vec::<()>::new()).into_response());
    }
    let suggestions = state
        .metadata
        .search_suggestions(&q)
        .await
        .map_err(|e| AppError::metadata(e, "Failed to fetch suggestions"))?;
    Ok(cached(&state, suggestions))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let q = query.q.unwrap_or_default();
    if q.trim().is_empty() {
        return Ok(Json(Page::<MediaSummary>::empty()).into_response());
    }
    let page = query
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let results = state
        .metadata
        .search(&q, page)
        .await
        .map_err(|e| AppError::metadata(e, "Failed to search"))?;
    Ok(cached(&state, results))
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// A player `message` event forwarded by the page.
#[derive(Deserialize)]
struct PlayerMessage {
    client_id: String,
    provider: String,
    content_type: ContentType,
    content_id: u64,
    season: Option<u32>,
    episode: Option<u32>,
    /// The raw `event.data`, whatever its shape.
    #[serde(default)]
    data: serde_json::Value,
}

fn check_client_id(client_id: &str) -> Result<(), AppError> {
    if client_id.is_empty() || client_id.len() > MAX_CLIENT_ID_LEN {
        return Err(ApiError::BadRequest("client_id must be 1-128 bytes".into()).into());
    }
    Ok(())
}

async fn relay_player_message(
    State(state): State<AppState>,
    Json(body): Json<PlayerMessage>,
) -> Result<(StatusCode, Json<RecordOutcome>), AppError> {
    check_client_id(&body.client_id)?;
    // Players of disabled providers are never shown, so their messages are not kept.
    let provider = state.providers.get_enabled(&body.provider)?;

    let content = ContentRef {
        content_type: body.content_type,
        id: body.content_id,
        season: body.season,
        episode: body.episode,
    };
    let outcome = state
        .progress
        .record(&body.client_id, provider.name, content, &body.data)
        .await;

    Ok((StatusCode::ACCEPTED, Json(outcome)))
}

async fn get_progress(
    State(state): State<AppState>,
    Path((client_id, key)): Path<(String, String)>,
) -> Result<Json<StoredProgress>, AppError> {
    check_client_id(&client_id)?;
    let stored = state
        .progress
        .get(&client_id, &key)
        .await
        .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::not_found("progress"))?;
    Ok(Json(stored))
}
