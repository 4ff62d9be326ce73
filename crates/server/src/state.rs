use std::sync::Arc;
use std::time::Duration;

use marquee_metadata::MetadataSource;
use marquee_providers::Registry;
use sqlx::SqlitePool;

use crate::progress::ProgressRecorder;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub metadata: Arc<dyn MetadataSource>,
    pub providers: Arc<Registry>,
    pub progress: ProgressRecorder,
    /// How long clients may reuse a metadata response.
    pub cache_ttl: Duration,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        metadata: Arc<dyn MetadataSource>,
        providers: Registry,
        progress_limit: u32,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            progress: ProgressRecorder::new(db.clone(), progress_limit),
            db,
            metadata,
            providers: Arc::new(providers),
            cache_ttl,
        }
    }

    /// `Cache-Control` value for successful metadata responses.
    pub fn cache_control(&self) -> String {
        if self.cache_ttl.is_zero() {
            "no-store".to_string()
        } else {
            format!("public, max-age={}", self.cache_ttl.as_secs())
        }
    }
}
