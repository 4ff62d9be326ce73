//! Headers attached to every response.

use axum::Router;
use axum::http::{HeaderValue, header};
use marquee_providers::Registry;
use marquee_providers::csp::content_security_policy;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::error;

const FALLBACK_CSP: &str = "default-src 'self'; frame-ancestors 'none'";

fn csp_header(registry: &Registry) -> HeaderValue {
    let policy = content_security_policy(registry);
    HeaderValue::from_str(&policy).unwrap_or_else(|e| {
        error!(error = %e, "derived CSP is not a valid header value, using fallback");
        HeaderValue::from_static(FALLBACK_CSP)
    })
}

/// Wrap `router` with the CSP derived from `registry`, frame denial and
/// MIME sniffing protection.
pub fn apply<S>(router: Router<S>, registry: &Registry) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::overriding(
                header::CONTENT_SECURITY_POLICY,
                csp_header(registry),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            )),
    )
}
