//! Metadata fetch layer over the TMDB v3 API.
//!
//! Responses are decoded into explicit schemas at this boundary; records
//! that do not conform are dropped instead of being passed through.

pub mod images;
pub mod models;
pub mod source;
pub mod tmdb;

pub use source::MetadataSource;
pub use tmdb::TmdbClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("API key not configured")]
    MissingApiKey,
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned HTTP {0}")]
    Upstream(u16),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not found")]
    NotFound,
}
