use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marquee_core::error::{ApiError, ErrorEnvelope};
use marquee_metadata::MetadataError;
use marquee_providers::ProviderError;
use tracing::error;

/// Newtype wrapper so we can implement `IntoResponse` in this crate.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = ErrorEnvelope::from(&self.0);
        (status, Json(envelope)).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unknown(_) | ProviderError::Disabled(_) => {
                Self(ApiError::BadRequest(e.to_string()))
            }
            ProviderError::NoneEnabled => Self(ApiError::Internal(e.to_string())),
        }
    }
}

impl AppError {
    /// Map a metadata failure to a response. Details go to the log; the
    /// client sees `context` (or the missing-key message).
    pub fn metadata(err: MetadataError, context: &str) -> Self {
        match err {
            MetadataError::NotFound => Self(ApiError::NotFound("not found".into())),
            MetadataError::MissingApiKey => Self(ApiError::Upstream(err.to_string())),
            other => {
                error!(error = %other, "{context}");
                Self(ApiError::Upstream(context.to_string()))
            }
        }
    }

    /// Like [`AppError::metadata`], but an upstream 404 is a failure of the
    /// proxied call rather than a missing resource of ours.
    pub fn upstream(err: MetadataError, context: &str) -> Self {
        match err {
            MetadataError::NotFound => {
                error!(error = %err, "{context}");
                Self(ApiError::Upstream(context.to_string()))
            }
            other => Self::metadata(other, context),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self(ApiError::NotFound(format!("{what} not found")))
    }
}
