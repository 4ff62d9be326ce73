use serde::{Deserialize, Serialize};

/// Kind of playable content, as the metadata API and embed hosts name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Movie,
    Tv,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one playable thing: a movie, or an episode of a series.
///
/// Season and episode are optional so a tv reference can exist before the
/// episode has been chosen; resolution refuses to build a URL until both
/// are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub content_type: ContentType,
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl ContentRef {
    pub fn movie(id: u64) -> Self {
        Self {
            content_type: ContentType::Movie,
            id,
            season: None,
            episode: None,
        }
    }

    pub fn episode(id: u64, season: u32, episode: u32) -> Self {
        Self {
            content_type: ContentType::Tv,
            id,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// A series reference with no episode selected yet.
    pub fn series(id: u64) -> Self {
        Self {
            content_type: ContentType::Tv,
            id,
            season: None,
            episode: None,
        }
    }
}

/// Parse a numeric route segment the way the page routes did: anything that
/// is not a plain non-negative integer is treated as "no such resource".
pub fn parse_id(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
