//! Security headers derived from the provider registry.

use crate::registry::Registry;

/// Origin the browser may fetch metadata from directly.
pub const METADATA_ORIGIN: &str = "https://api.themoviedb.org";

/// Build the `Content-Security-Policy` value.
///
/// `frame-src` and `media-src` allow exactly the origins of the enabled
/// providers; the app itself refuses to be framed.
pub fn content_security_policy(registry: &Registry) -> String {
    let mut embed_sources = vec!["'self'"];
    for provider in registry.enabled() {
        for &origin in provider.origins {
            if !embed_sources.contains(&origin) {
                embed_sources.push(origin);
            }
        }
    }
    let embed_sources = embed_sources.join(" ");

    [
        "default-src 'self'".to_string(),
        "script-src 'self' 'unsafe-inline' 'unsafe-eval'".to_string(),
        "style-src 'self' 'unsafe-inline'".to_string(),
        "img-src 'self' data: https: http:".to_string(),
        "font-src 'self' data:".to_string(),
        format!("connect-src 'self' {METADATA_ORIGIN}"),
        format!("frame-src {embed_sources}"),
        format!("media-src {embed_sources}"),
        "object-src 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'none'".to_string(),
    ]
    .join("; ")
}
