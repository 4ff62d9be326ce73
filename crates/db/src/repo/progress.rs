use sqlx::SqlitePool;

/// One stored playback position, keyed by `(client_id, storage_key)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRow {
    pub client_id: String,
    pub storage_key: String,
    pub provider: String,
    pub content_type: String,
    pub content_id: i64,
    pub season: Option<i64>,
    pub episode: Option<i64>,
    pub progress_seconds: f64,
    pub duration_seconds: f64,
    /// Timestamp reported by the embedded player.
    pub reported_ts: i64,
    pub updated_ms: i64,
}

type ProgressTuple = (
    String,
    String,
    String,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    f64,
    f64,
    i64,
    i64,
);

impl From<ProgressTuple> for ProgressRow {
    fn from(r: ProgressTuple) -> Self {
        Self {
            client_id: r.0,
            storage_key: r.1,
            provider: r.2,
            content_type: r.3,
            content_id: r.4,
            season: r.5,
            episode: r.6,
            progress_seconds: r.7,
            duration_seconds: r.8,
            reported_ts: r.9,
            updated_ms: r.10,
        }
    }
}

/// Replace whatever is stored under the row's key. Fields are overwritten,
/// never merged.
pub async fn upsert(pool: &SqlitePool, row: &ProgressRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO playback_progress (client_id, storage_key, provider, content_type, \
         content_id, season, episode, progress_seconds, duration_seconds, reported_ts, updated_ms) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(client_id, storage_key) DO UPDATE SET \
         provider = excluded.provider, content_type = excluded.content_type, \
         content_id = excluded.content_id, season = excluded.season, episode = excluded.episode, \
         progress_seconds = excluded.progress_seconds, duration_seconds = excluded.duration_seconds, \
         reported_ts = excluded.reported_ts, updated_ms = excluded.updated_ms",
    )
    .bind(&row.client_id)
    .bind(&row.storage_key)
    .bind(&row.provider)
    .bind(&row.content_type)
    .bind(row.content_id)
    .bind(row.season)
    .bind(row.episode)
    .bind(row.progress_seconds)
    .bind(row.duration_seconds)
    .bind(row.reported_ts)
    .bind(row.updated_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(
    pool: &SqlitePool,
    client_id: &str,
    storage_key: &str,
) -> Result<Option<ProgressRow>, sqlx::Error> {
    let row: Option<ProgressTuple> = sqlx::query_as(
        "SELECT client_id, storage_key, provider, content_type, content_id, season, episode, \
         progress_seconds, duration_seconds, reported_ts, updated_ms \
         FROM playback_progress WHERE client_id = ? AND storage_key = ?",
    )
    .bind(client_id)
    .bind(storage_key)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ProgressRow::from))
}

/// Keep only the `keep` most recently updated records of a client.
/// Returns the number of records removed.
pub async fn evict_oldest(
    pool: &SqlitePool,
    client_id: &str,
    keep: u32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM playback_progress WHERE client_id = ? AND storage_key NOT IN ( \
         SELECT storage_key FROM playback_progress WHERE client_id = ? \
         ORDER BY updated_ms DESC, storage_key ASC LIMIT ?)",
    )
    .bind(client_id)
    .bind(client_id)
    .bind(i64::from(keep))
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
