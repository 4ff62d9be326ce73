use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use marquee_core::types::ContentType;
use marquee_metadata::models::{
    self, MediaSummary, MovieDetails, Page, SearchSuggestion, SeasonDetails, SeriesDetails,
};
use marquee_metadata::{MetadataError, MetadataSource, TmdbClient};
use marquee_providers::Registry;
use marquee_server::routes::build_router;
use marquee_server::state::AppState;
use serde_json::{Value, json};

/// Id the fake source has never heard of.
const UNKNOWN_ID: u64 = 999_999_999;

/// Canned metadata: movie 550, series 1399 with a two-episode season 1.
#[derive(Default)]
struct FakeMetadata {
    fail: bool,
    suggestion_calls: AtomicUsize,
}

impl FakeMetadata {
    fn check(&self) -> Result<(), MetadataError> {
        if self.fail {
            Err(MetadataError::Upstream(502))
        } else {
            Ok(())
        }
    }

    fn list(n: u64, media_type: &str) -> Vec<MediaSummary> {
        let results: Vec<Value> = (1..=n)
            .map(|i| json!({ "id": i, "title": format!("Item {i}"), "name": format!("Item {i}"), "media_type": media_type }))
            .collect();
        models::parse_page(json!({ "results": results }), None)
            .unwrap()
            .results
    }
}

#[async_trait::async_trait]
impl MetadataSource for FakeMetadata {
    fn name(&self) -> &str {
        "fake"
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails, MetadataError> {
        self.check()?;
        if id != 550 {
            return Err(MetadataError::NotFound);
        }
        models::parse_movie(json!({
            "id": 550,
            "title": "Fight Club",
            "release_date": "1999-10-15",
            "backdrop_path": "/fc.jpg",
            "credits": { "cast": [], "crew": [{ "name": "David Fincher", "job": "Director" }] }
        }))
    }

    async fn series_details(&self, id: u64) -> Result<SeriesDetails, MetadataError> {
        self.check()?;
        if id != 1399 {
            return Err(MetadataError::NotFound);
        }
        models::parse_series(json!({ "id": 1399, "name": "Game of Thrones" }))
    }

    async fn season_details(&self, id: u64, season: u32) -> Result<SeasonDetails, MetadataError> {
        self.check()?;
        if id != 1399 || season != 1 {
            return Err(MetadataError::NotFound);
        }
        models::parse_season(json!({
            "season_number": 1,
            "episodes": [
                { "episode_number": 1, "name": "Winter Is Coming" },
                { "episode_number": 2, "name": "The Kingsroad" }
            ]
        }))
    }

    async fn recommendations(
        &self,
        content_type: ContentType,
        id: u64,
    ) -> Result<Page<MediaSummary>, MetadataError> {
        self.check()?;
        if id == UNKNOWN_ID {
            return Err(MetadataError::NotFound);
        }
        let mut page = Page::empty();
        page.results = Self::list(3, content_type.as_str());
        Ok(page)
    }

    async fn search_suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<SearchSuggestion>, MetadataError> {
        self.suggestion_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.check()?;
        Ok(Self::list(3, "movie")
            .into_iter()
            .map(|mut m| {
                m.title = format!("{} {}", query.trim(), m.id);
                SearchSuggestion::from(m)
            })
            .collect())
    }

    async fn search(&self, _query: &str, page: u32) -> Result<Page<MediaSummary>, MetadataError> {
        self.check()?;
        let mut result = Page::empty();
        result.page = page;
        result.results = Self::list(2, "tv");
        Ok(result)
    }

    async fn trending_movies(&self) -> Result<Vec<MediaSummary>, MetadataError> {
        self.check()?;
        Ok(Self::list(20, "movie"))
    }

    async fn popular_series(&self) -> Result<Vec<MediaSummary>, MetadataError> {
        self.check()?;
        Ok(Self::list(5, "tv"))
    }

    async fn top_rated_movies(&self) -> Result<Vec<MediaSummary>, MetadataError> {
        self.check()?;
        Ok(Self::list(14, "movie"))
    }
}

async fn app_with(metadata: Arc<dyn MetadataSource>, providers: Registry, limit: u32) -> TestServer {
    let pool = marquee_db::connect(":memory:").await.unwrap();
    marquee_db::migrate::run(&pool).await.unwrap();

    let state = AppState::new(pool, metadata, providers, limit, Duration::from_secs(3600));
    TestServer::new(build_router(state)).unwrap()
}

async fn test_app() -> TestServer {
    app_with(Arc::new(FakeMetadata::default()), Registry::builtin(), 500).await
}

// ---------------------------------------------------------------------------
// Health and headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let server = test_app().await;
    let resp = server.get("/health").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn security_headers_on_every_response() {
    let server = test_app().await;
    for path in ["/health", "/api/providers", "/api/movies/abc"] {
        let resp = server.get(path).await;
        assert_eq!(resp.header("x-frame-options"), "DENY");
        assert_eq!(resp.header("x-content-type-options"), "nosniff");
        let csp = resp.header("content-security-policy");
        let csp = csp.to_str().unwrap();
        assert!(csp.contains("connect-src 'self' https://api.themoviedb.org"));
        assert!(csp.contains("https://player.videasy.net"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }
}

#[tokio::test]
async fn disabled_provider_origins_leave_the_policy() {
    let server = app_with(
        Arc::new(FakeMetadata::default()),
        Registry::builtin().with_disabled(&["MovieKex"]),
        500,
    )
    .await;
    let resp = server.get("/health").await;
    let csp = resp.header("content-security-policy");
    assert!(!csp.to_str().unwrap().contains("moviekex.online"));
}

// ---------------------------------------------------------------------------
// Providers and players
// ---------------------------------------------------------------------------

#[tokio::test]
async fn providers_listed_in_order() {
    let server = test_app().await;
    let body: Value = server.get("/api/providers").await.json();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["Agent", "VidSrc", "EmbedSu", "VidLink", "Smashy", "MovieKex"]
    );
    assert_eq!(body[0]["rank"], 1);
    assert_eq!(body[0]["disabled"], false);
}

#[tokio::test]
async fn player_url_for_movie_per_provider() {
    let server = test_app().await;

    let body: Value = server
        .get("/api/player/movie/550")
        .add_query_param("provider", "VidSrc")
        .await
        .json();
    assert_eq!(body["player_url"], "https://vidsrc.net/embed/movie/550");
    assert_eq!(body["provider"], "VidSrc");

    let body: Value = server.get("/api/player/movie/550").await.json();
    assert_eq!(body["provider"], "Agent");
    let url = body["player_url"].as_str().unwrap();
    assert!(url.starts_with("https://player.videasy.net/movie/550?"));
    assert!(url.contains("color="));
}

#[tokio::test]
async fn player_url_for_tv_needs_season_and_episode() {
    let server = test_app().await;

    let body: Value = server
        .get("/api/player/tv/1399")
        .add_query_param("provider", "EmbedSu")
        .add_query_param("season", "2")
        .await
        .json();
    assert!(body["player_url"].is_null());

    let body: Value = server
        .get("/api/player/tv/1399")
        .add_query_param("provider", "EmbedSu")
        .add_query_param("season", "2")
        .add_query_param("episode", "5")
        .await
        .json();
    assert_eq!(body["player_url"], "https://embed.su/embed/tv/1399/2/5");
}

#[tokio::test]
async fn unknown_or_disabled_provider_is_rejected() {
    let server = app_with(
        Arc::new(FakeMetadata::default()),
        Registry::builtin().with_disabled(&["Smashy"]),
        500,
    )
    .await;

    let resp = server
        .get("/api/player/movie/550")
        .add_query_param("provider", "NoSuchHost")
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["code"], "bad_request");

    server
        .get("/api/player/movie/550")
        .add_query_param("provider", "Smashy")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_route_params_are_not_found() {
    let server = test_app().await;
    for path in [
        "/api/player/anime/550",
        "/api/player/movie/55x",
        "/api/watch/movie/-1",
        "/api/watch/tv/1399/one/1",
        "/api/movies/abc",
        "/api/recommendations/person/1",
    ] {
        let resp = server.get(path).await;
        resp.assert_status(StatusCode::NOT_FOUND);
        let body: Value = resp.json();
        assert_eq!(body["code"], "not_found", "{path}");
    }
}

#[tokio::test]
async fn watch_movie_bundles_details_and_player() {
    let server = test_app().await;
    let resp = server
        .get("/api/watch/movie/550")
        .add_query_param("provider", "VidLink")
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["title"], "Fight Club");
    assert_eq!(body["content"]["director"], "David Fincher");
    assert_eq!(
        body["backdrop_url"],
        "https://image.tmdb.org/t/p/w1280/fc.jpg"
    );
    assert_eq!(body["provider"], "VidLink");
    assert_eq!(body["providers"].as_array().unwrap().len(), 6);
    assert!(
        body["player_url"]
            .as_str()
            .unwrap()
            .starts_with("https://vidlink.pro/movie/550")
    );
}

#[tokio::test]
async fn watch_unknown_movie_is_not_found() {
    let server = test_app().await;
    server
        .get("/api/watch/movie/1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn watch_episode_formats_title_and_checks_episode() {
    let server = test_app().await;

    let body: Value = server.get("/api/watch/tv/1399/1/2").await.json();
    assert_eq!(body["title"], "Game of Thrones - S01E02");
    assert_eq!(body["content"]["episode"]["name"], "The Kingsroad");
    assert!(
        body["player_url"]
            .as_str()
            .unwrap()
            .starts_with("https://player.videasy.net/tv/1399/1/2")
    );
    assert_eq!(body["backdrop_url"], "/placeholder.svg");

    server
        .get("/api/watch/tv/1399/1/9")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recommendations_are_cached_publicly() {
    let server = test_app().await;
    let resp = server.get("/api/recommendations/tv/1399").await;
    resp.assert_status_ok();
    assert_eq!(resp.header("cache-control"), "public, max-age=3600");
    let body: Value = resp.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert_eq!(body["results"][0]["media_type"], "tv");
}

#[tokio::test]
async fn upstream_failure_is_generic_500() {
    let fake = FakeMetadata {
        fail: true,
        ..Default::default()
    };
    let server = app_with(Arc::new(fake), Registry::builtin(), 500).await;

    let resp = server.get("/api/recommendations/movie/550").await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json();
    assert_eq!(body["error"], "Failed to fetch recommendations");
    assert!(resp.maybe_header("cache-control").is_none());
}

#[tokio::test]
async fn upstream_not_found_on_recommendations_is_500() {
    let server = test_app().await;
    let resp = server
        .get(&format!("/api/recommendations/movie/{UNKNOWN_ID}"))
        .await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json();
    assert_eq!(
        body,
        json!({ "error": "Failed to fetch recommendations", "code": "upstream_error" })
    );
}

#[tokio::test]
async fn missing_api_key_is_reported() {
    let server = app_with(Arc::new(TmdbClient::new(None)), Registry::builtin(), 500).await;
    let resp = server.get("/api/recommendations/movie/550").await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json();
    assert_eq!(body["error"], "API key not configured");
}

#[tokio::test]
async fn short_suggestion_query_skips_upstream() {
    let fake = Arc::new(FakeMetadata::default());
    let server = app_with(fake.clone(), Registry::builtin(), 500).await;

    let body: Value = server
        .get("/api/search/suggestions")
        .add_query_param("q", " b ")
        .await
        .json();
    assert_eq!(body, json!([]));
    assert_eq!(fake.suggestion_calls.load(Ordering::SeqCst), 0);

    let body: Value = server
        .get("/api/search/suggestions")
        .add_query_param("q", "ba")
        .await
        .json();
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["type"], "movie");
    assert_eq!(fake.suggestion_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn search_defaults_to_first_page() {
    let server = test_app().await;

    let body: Value = server
        .get("/api/search")
        .add_query_param("q", "dune")
        .add_query_param("page", "zero")
        .await
        .json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    let body: Value = server.get("/api/search").await.json();
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn home_lists_are_capped() {
    let server = test_app().await;
    let body: Value = server.get("/api/home").await.json();
    assert_eq!(body["trending_movies"].as_array().unwrap().len(), 14);
    assert_eq!(body["popular_series"].as_array().unwrap().len(), 5);
    assert_eq!(body["top_rated_movies"].as_array().unwrap().len(), 14);
}

#[tokio::test]
async fn season_route_returns_episodes() {
    let server = test_app().await;
    let body: Value = server.get("/api/tv/1399/season/1").await.json();
    assert_eq!(body["episodes"].as_array().unwrap().len(), 2);

    server
        .get("/api/tv/1399/season/7")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Playback progress
// ---------------------------------------------------------------------------

fn player_message(client_id: &str, data: Value) -> Value {
    json!({
        "client_id": client_id,
        "provider": "VidSrc",
        "content_type": "movie",
        "content_id": 550,
        "data": data,
    })
}

#[tokio::test]
async fn relayed_progress_round_trips() {
    let server = test_app().await;

    let resp = server
        .post("/api/playback/messages")
        .json(&player_message(
            "browser-1",
            json!(r#"{"id":550,"type":"movie","progress":120.5,"timestamp":1700000000,"duration":8340}"#),
        ))
        .await;
    resp.assert_status(StatusCode::ACCEPTED);
    let body: Value = resp.json();
    assert_eq!(body, json!({ "status": "recorded", "key": "VidSrc_movie_550" }));

    let stored: Value = server
        .get("/api/playback/progress/browser-1/VidSrc_movie_550")
        .await
        .json();
    assert_eq!(stored["progress"], 120.5);
    assert_eq!(stored["duration"], 8340.0);

    server
        .get("/api/playback/progress/browser-2/VidSrc_movie_550")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_messages_are_discarded_without_damage() {
    let server = test_app().await;
    server
        .post("/api/playback/messages")
        .json(&player_message(
            "b",
            json!(r#"{"progress":30,"duration":100}"#),
        ))
        .await
        .assert_status(StatusCode::ACCEPTED);

    for data in [json!("{not json"), json!({ "progress": 99 }), json!(null)] {
        let resp = server
            .post("/api/playback/messages")
            .json(&player_message("b", data))
            .await;
        resp.assert_status(StatusCode::ACCEPTED);
        let body: Value = resp.json();
        assert_eq!(body["status"], "discarded");
    }

    let stored: Value = server
        .get("/api/playback/progress/b/VidSrc_movie_550")
        .await
        .json();
    assert_eq!(stored["progress"], 30.0);
}

#[tokio::test]
async fn relay_rejects_unknown_provider() {
    let server = test_app().await;
    let mut msg = player_message("b", json!(r#"{"progress":1,"duration":2}"#));
    msg["provider"] = json!("Nope");
    server
        .post("/api/playback/messages")
        .json(&msg)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn relay_rejects_disabled_provider() {
    let server = app_with(
        Arc::new(FakeMetadata::default()),
        Registry::builtin().with_disabled(&["VidSrc"]),
        500,
    )
    .await;
    let resp = server
        .post("/api/playback/messages")
        .json(&player_message("b", json!(r#"{"progress":1,"duration":2}"#)))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"], "provider is disabled: VidSrc");
}

#[tokio::test]
async fn per_client_store_is_bounded() {
    let server = app_with(Arc::new(FakeMetadata::default()), Registry::builtin(), 1).await;
    for id in [1, 2] {
        let mut msg = player_message("b", json!(r#"{"progress":1,"duration":2}"#));
        msg["content_id"] = json!(id);
        server.post("/api/playback/messages").json(&msg).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    server
        .get("/api/playback/progress/b/VidSrc_movie_1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/api/playback/progress/b/VidSrc_movie_2")
        .await
        .assert_status_ok();
}

// ---------------------------------------------------------------------------
// Live suggestions
// ---------------------------------------------------------------------------

/// WebSockets need a real listener rather than the mock transport.
async fn live_server() -> TestServer {
    let pool = marquee_db::connect(":memory:").await.unwrap();
    marquee_db::migrate::run(&pool).await.unwrap();
    let state = AppState::new(
        pool,
        Arc::new(FakeMetadata::default()),
        Registry::builtin(),
        500,
        Duration::from_secs(3600),
    );
    TestServer::builder()
        .http_transport()
        .build(build_router(state))
        .unwrap()
}

#[tokio::test]
async fn live_search_pushes_snapshots_until_populated() {
    let server = live_server().await;

    let mut socket = server
        .get_websocket("/api/search/live")
        .await
        .into_websocket()
        .await;
    socket
        .send_json(&json!({ "type": "input", "text": "heat" }))
        .await;

    let mut phases = Vec::new();
    let mut last = Value::Null;
    while phases.last().map(String::as_str) != Some("populated") {
        assert!(phases.len() < 10, "unexpected snapshots: {phases:?}");
        last = socket.receive_json().await;
        phases.push(last["phase"].as_str().unwrap().to_string());
    }

    assert_eq!(phases, ["pending", "loading", "populated"]);
    assert_eq!(last["query"], "heat");
    assert_eq!(last["visible"], true);
    assert_eq!(last["suggestions"][0]["title"], "heat 1");
    assert_eq!(last["search_url"], "/search?q=heat");
}

#[tokio::test]
async fn live_search_ignores_unknown_frames() {
    let server = live_server().await;

    let mut socket = server
        .get_websocket("/api/search/live")
        .await
        .into_websocket()
        .await;
    socket.send_text("not json").await;
    socket.send_json(&json!({ "type": "shout" })).await;
    socket
        .send_json(&json!({ "type": "input", "text": "ab" }))
        .await;

    let first: Value = socket.receive_json().await;
    assert_eq!(first["phase"], "pending");
    assert_eq!(first["query"], "ab");
}
