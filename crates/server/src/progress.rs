//! Playback progress relayed from embedded players.
//!
//! The page script forwards every `message` event it receives from the
//! player iframe. Only string payloads are considered; anything that does
//! not decode into a progress report is dropped and logged. Records are
//! overwritten per key, never merged, and each client namespace is capped.

use marquee_core::types::{ContentRef, ContentType};
use marquee_db::repo::progress::{self, ProgressRow};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

/// Progress report as embed hosts post it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressData {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
    pub progress: f64,
    #[serde(default)]
    pub timestamp: Option<f64>,
    pub duration: f64,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
}

/// What happened to one relayed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Recorded { key: String },
    Discarded,
    /// Parsed fine but the write failed; nothing was propagated.
    Failed { key: String },
}

/// Storage key: `{provider}_{type}_{id}` plus `_{season}_{episode}` for tv.
pub fn storage_key(provider: &str, content: &ContentRef) -> String {
    match (content.content_type, content.season, content.episode) {
        (ContentType::Tv, Some(season), Some(episode)) => {
            format!("{provider}_tv_{}_{season}_{episode}", content.id)
        }
        (content_type, _, _) => format!("{provider}_{content_type}_{}", content.id),
    }
}

/// Decode a relayed payload. `None` for anything that is not a JSON string
/// holding a progress report.
pub fn parse_payload(data: &serde_json::Value) -> Option<ProgressData> {
    let serde_json::Value::String(raw) = data else {
        debug!("ignoring non-string player message");
        return None;
    };
    match serde_json::from_str::<ProgressData>(raw) {
        Ok(report) if report.progress.is_finite() && report.duration.is_finite() => Some(report),
        Ok(_) => {
            warn!("discarding player message with non-finite progress");
            None
        }
        Err(e) => {
            warn!(error = %e, "discarding malformed player message");
            None
        }
    }
}

/// Stored progress as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredProgress {
    pub key: String,
    pub provider: String,
    pub content_type: String,
    pub content_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<i64>,
    pub progress: f64,
    pub duration: f64,
    pub timestamp: i64,
    pub updated_ms: i64,
}

impl From<ProgressRow> for StoredProgress {
    fn from(r: ProgressRow) -> Self {
        Self {
            key: r.storage_key,
            provider: r.provider,
            content_type: r.content_type,
            content_id: r.content_id,
            season: r.season,
            episode: r.episode,
            progress: r.progress_seconds,
            duration: r.duration_seconds,
            timestamp: r.reported_ts,
            updated_ms: r.updated_ms,
        }
    }
}

#[derive(Clone)]
pub struct ProgressRecorder {
    db: SqlitePool,
    limit: u32,
}

impl ProgressRecorder {
    /// `limit` is the number of records kept per client; 0 keeps all.
    pub fn new(db: SqlitePool, limit: u32) -> Self {
        Self { db, limit }
    }

    /// Handle one relayed message. Never fails: storage errors are logged
    /// and reported as [`RecordOutcome::Failed`].
    pub async fn record(
        &self,
        client_id: &str,
        provider: &str,
        content: ContentRef,
        data: &serde_json::Value,
    ) -> RecordOutcome {
        let Some(report) = parse_payload(data) else {
            return RecordOutcome::Discarded;
        };

        // The player knows which episode is actually playing.
        let content = match content.content_type {
            ContentType::Movie => ContentRef::movie(content.id),
            ContentType::Tv => ContentRef {
                season: report.season.or(content.season),
                episode: report.episode.or(content.episode),
                ..content
            },
        };
        if content.content_type == ContentType::Tv
            && (content.season.is_none() || content.episode.is_none())
        {
            warn!(client_id, provider, id = content.id, "tv progress without an episode");
            return RecordOutcome::Discarded;
        }

        let key = storage_key(provider, &content);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let row = ProgressRow {
            client_id: client_id.to_string(),
            storage_key: key.clone(),
            provider: provider.to_string(),
            content_type: content.content_type.as_str().to_string(),
            content_id: i64::try_from(content.id).unwrap_or(i64::MAX),
            season: content.season.map(i64::from),
            episode: content.episode.map(i64::from),
            progress_seconds: report.progress,
            duration_seconds: report.duration,
            reported_ts: report.timestamp.map(|t| t as i64).unwrap_or(now_ms),
            updated_ms: now_ms,
        };

        if let Err(e) = progress::upsert(&self.db, &row).await {
            error!(client_id, key = %key, error = %e, "failed to store playback progress");
            return RecordOutcome::Failed { key };
        }
        debug!(client_id, key = %key, progress = report.progress, "playback progress recorded");

        if self.limit > 0 {
            match progress::evict_oldest(&self.db, client_id, self.limit).await {
                Ok(0) => {}
                Ok(n) => info!(client_id, evicted = n, "evicted old playback progress"),
                Err(e) => error!(client_id, error = %e, "failed to evict playback progress"),
            }
        }

        RecordOutcome::Recorded { key }
    }

    pub async fn get(
        &self,
        client_id: &str,
        key: &str,
    ) -> Result<Option<StoredProgress>, sqlx::Error> {
        Ok(progress::get(&self.db, client_id, key)
            .await?
            .map(StoredProgress::from))
    }
}
