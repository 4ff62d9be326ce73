//! Image URL construction with a local fallback.

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// Served by the front end when an item has no artwork.
pub const PLACEHOLDER: &str = "/placeholder.svg";

pub const POSTER_THUMB: &str = "w92";
pub const PROFILE: &str = "w185";
pub const POSTER_CARD: &str = "w342";
pub const POSTER: &str = "w500";
pub const BACKDROP: &str = "w1280";

/// Full image URL for a TMDB path, or the placeholder when there is none.
pub fn image_url(path: Option<&str>, size: &str) -> String {
    match path.map(str::trim) {
        Some(p) if !p.is_empty() => format!("{IMAGE_BASE}/{size}{p}"),
        _ => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sized_url() {
        assert_eq!(
            image_url(Some("/abc.jpg"), POSTER_CARD),
            "https://image.tmdb.org/t/p/w342/abc.jpg"
        );
    }

    #[test]
    fn falls_back_to_placeholder() {
        assert_eq!(image_url(None, POSTER), PLACEHOLDER);
        assert_eq!(image_url(Some(""), POSTER), PLACEHOLDER);
        assert_eq!(image_url(Some("  "), BACKDROP), PLACEHOLDER);
    }
}
