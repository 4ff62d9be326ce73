//! The built-in embed hosts, in preference order.

use crate::provider::{Provider, with_query};

/// Amber accent passed to hosts that accept a branding color.
pub const BRAND_COLOR: &str = "f59e0b";

pub const AGENT: Provider = Provider::new(
    "Agent",
    1,
    &["https://player.videasy.net", "https://*.videasy.net"],
    |id| {
        with_query(
            format!("https://player.videasy.net/movie/{id}"),
            &[("color", BRAND_COLOR)],
        )
    },
    |id, season, episode| {
        with_query(
            format!("https://player.videasy.net/tv/{id}/{season}/{episode}"),
            &[
                ("color", BRAND_COLOR),
                ("autoplayNextEpisode", "true"),
                ("episodeSelector", "true"),
            ],
        )
    },
);

pub const VIDSRC: Provider = Provider::new(
    "VidSrc",
    2,
    &["https://vidsrc.net", "https://*.vidsrc.net"],
    |id| format!("https://vidsrc.net/embed/movie/{id}"),
    |id, season, episode| format!("https://vidsrc.net/embed/tv/{id}/{season}/{episode}"),
);

pub const EMBEDSU: Provider = Provider::new(
    "EmbedSu",
    3,
    &["https://embed.su", "https://*.embed.su"],
    |id| format!("https://embed.su/embed/movie/{id}"),
    |id, season, episode| format!("https://embed.su/embed/tv/{id}/{season}/{episode}"),
);

pub const VIDLINK: Provider = Provider::new(
    "VidLink",
    4,
    &["https://vidlink.pro", "https://*.vidlink.pro"],
    |id| {
        with_query(
            format!("https://vidlink.pro/movie/{id}"),
            &[("primaryColor", BRAND_COLOR)],
        )
    },
    |id, season, episode| {
        with_query(
            format!("https://vidlink.pro/tv/{id}/{season}/{episode}"),
            &[("primaryColor", BRAND_COLOR)],
        )
    },
);

pub const SMASHY: Provider = Provider::new(
    "Smashy",
    5,
    &[
        "https://player.smashystream.com",
        "https://*.smashystream.com",
    ],
    |id| {
        with_query(
            format!("https://player.smashystream.com/movie/{id}"),
            &[("primaryColor", BRAND_COLOR)],
        )
    },
    |id, season, episode| {
        with_query(
            format!("https://player.smashystream.com/tv/{id}/{season}/{episode}"),
            &[("primaryColor", BRAND_COLOR)],
        )
    },
);

pub const MOVIEKEX: Provider = Provider::new(
    "MovieKex",
    6,
    &["https://moviekex.online"],
    |id| format!("https://moviekex.online/embed/movie/{id}"),
    |id, season, episode| format!("https://moviekex.online/embed/tv/{id}/{season}/{episode}"),
);

/// All built-in providers in registry order.
pub fn builtin() -> Vec<Provider> {
    vec![AGENT, VIDSRC, EMBEDSU, VIDLINK, SMASHY, MOVIEKEX]
}
