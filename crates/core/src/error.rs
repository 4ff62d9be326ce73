use serde::Serialize;
use thiserror::Error;

/// Unified API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The metadata API failed or answered with something unusable.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Upstream(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Upstream(_) | Self::Internal(_) => 500,
        }
    }

    /// The human-readable part, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Upstream(m) | Self::Internal(m) => m,
        }
    }
}

/// JSON error body: `{ "error": "…", "code": "…" }`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub code: String,
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(e: &ApiError) -> Self {
        Self {
            error: e.message().to_string(),
            code: e.code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_surface_as_500_with_plain_message() {
        let err = ApiError::Upstream("Failed to fetch recommendations".into());
        assert_eq!(err.status_code(), 500);

        let body = serde_json::to_value(ErrorEnvelope::from(&err)).unwrap();
        assert_eq!(body["error"], "Failed to fetch recommendations");
        assert_eq!(body["code"], "upstream_error");
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(ApiError::NotFound("movie".into()).status_code(), 404);
    }
}
