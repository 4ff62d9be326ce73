use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_DB: &str = "marquee.db";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_PROGRESS_LIMIT: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub db_path: String,
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub cache_ttl: Duration,
    pub disabled_providers: Vec<String>,
    /// Records kept per client; 0 keeps everything.
    pub progress_limit: u32,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cache_ttl_secs = match get("MARQUEE_CACHE_TTL_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid MARQUEE_CACHE_TTL_SECS: {v:?}"))?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let progress_limit = match get("MARQUEE_PROGRESS_LIMIT") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid MARQUEE_PROGRESS_LIMIT: {v:?}"))?,
            None => DEFAULT_PROGRESS_LIMIT,
        };

        let log_format = match get("MARQUEE_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!("invalid MARQUEE_LOG_FORMAT: {other:?} (text or json)"),
        };

        let disabled_providers = get("MARQUEE_DISABLED_PROVIDERS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind: get("MARQUEE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            db_path: get("MARQUEE_DB").unwrap_or_else(|| DEFAULT_DB.to_string()),
            tmdb_api_key: get("TMDB_API_KEY"),
            tmdb_base_url: get("MARQUEE_TMDB_BASE_URL"),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            disabled_providers,
            progress_limit,
            log_format,
        })
    }
}
