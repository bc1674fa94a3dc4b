//! Official stream provider
//!
//! Serves pre-catalogued first-party stream links from an immutable table
//! built once at startup. Each episode entry carries one or more release
//! variants (subtitled, dubbed, extended cut) in up to three qualities.
//! Candidates are ranked quality-descending, subtitled before dubbed, and
//! carry a priority hint that keeps them ahead of every other tier.
//!
//! An episode with no entry yields an empty list - the common case, and
//! never an error.

use once_cell::sync::Lazy;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::models::{
    BehaviorHints, EpisodeDescriptor, Quality, StreamCandidate, StreamTier, SubtitleRef, TrackType,
};

const COUNTRY_WHITELIST: &[&str] = &["US", "GB", "CA", "AU", "DE", "FR", "NL", "IT", "ES", "JP"];

/// Priority hint forcing official candidates ahead of all other tiers
const OFFICIAL_PRIORITY: u32 = 100;

/// One release variant of a catalogued episode
pub struct OfficialVariant {
    pub label: &'static str,
    pub qualities: &'static [(Quality, &'static str)],
}

/// Catalog entry for one episode
pub struct OfficialEntry {
    pub title: &'static str,
    pub arc_number: u32,
    pub variants: &'static [OfficialVariant],
}

macro_rules! variant {
    ($label:expr, $($quality:ident => $url:expr),+ $(,)?) => {
        OfficialVariant {
            label: $label,
            qualities: &[$((Quality::$quality, $url)),+],
        }
    };
}

/// Static episode catalog. The Pixeldrain URLs are refreshed out of band by
/// re-extracting them from the official watch page.
static CATALOG: Lazy<HashMap<&'static str, OfficialEntry>> = Lazy::new(|| {
    HashMap::from([
        (
            "RO_1",
            OfficialEntry {
                title: "Romance Dawn",
                arc_number: 1,
                variants: &[
                    variant!("English Subtitles",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ro1-480p-sub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ro1-720p-sub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ro1-1080p-sub",
                    ),
                    variant!("English Dub",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ro1-480p-dub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ro1-720p-dub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ro1-1080p-dub",
                    ),
                    variant!("English Dub with Closed Captions",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ro1-480p-dub-cc",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ro1-720p-dub-cc",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ro1-1080p-dub-cc",
                    ),
                ],
            },
        ),
        (
            "OR_1",
            OfficialEntry {
                title: "Orange Town",
                arc_number: 2,
                variants: &[
                    variant!("English Subtitles",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-or1-480p-sub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-or1-720p-sub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-or1-1080p-sub",
                    ),
                    variant!("English Dub",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-or1-480p-dub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-or1-720p-dub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-or1-1080p-dub",
                    ),
                ],
            },
        ),
        (
            "SY_1",
            OfficialEntry {
                title: "Syrup Village",
                arc_number: 3,
                variants: &[
                    variant!("English Subtitles",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-sy1-480p-sub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-sy1-720p-sub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-sy1-1080p-sub",
                    ),
                    variant!("English Dub",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-sy1-480p-dub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-sy1-720p-dub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-sy1-1080p-dub",
                    ),
                ],
            },
        ),
        (
            "GA_1",
            OfficialEntry {
                title: "Gaimon",
                arc_number: 4,
                variants: &[
                    variant!("English Subtitles",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ga1-480p-sub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ga1-720p-sub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ga1-1080p-sub",
                    ),
                    variant!("English Dub",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ga1-480p-dub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ga1-720p-dub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ga1-1080p-dub",
                    ),
                ],
            },
        ),
        (
            "BA_1",
            OfficialEntry {
                title: "Baratie",
                arc_number: 5,
                variants: &[
                    variant!("English Subtitles",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ba1-480p-sub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ba1-720p-sub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ba1-1080p-sub",
                    ),
                    variant!("English Dub",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ba1-480p-dub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ba1-720p-dub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ba1-1080p-dub",
                    ),
                ],
            },
        ),
        (
            "AP_1",
            OfficialEntry {
                title: "Arlong Park",
                arc_number: 6,
                variants: &[
                    variant!("English Subtitles",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ap1-480p-sub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ap1-720p-sub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ap1-1080p-sub",
                    ),
                    variant!("English Subtitles, Extended",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ap1-480p-sub-ext",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ap1-720p-sub-ext",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ap1-1080p-sub-ext",
                    ),
                    variant!("English Dub",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ap1-480p-dub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ap1-720p-dub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ap1-1080p-dub",
                    ),
                ],
            },
        ),
        (
            "WA_1",
            OfficialEntry {
                title: "Water 7",
                arc_number: 17,
                variants: &[variant!("English Subtitles",
                    HD720p => "https://pixeldrain.com/api/file/placeholder-wa1-720p-sub",
                )],
            },
        ),
        (
            "WS_1",
            OfficialEntry {
                title: "Wano",
                arc_number: 35,
                variants: &[
                    variant!("English Subtitles",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ws1-480p-sub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ws1-720p-sub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ws1-1080p-sub",
                    ),
                    variant!("English Subtitles, Extended",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ws1-480p-sub-ext",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ws1-720p-sub-ext",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ws1-1080p-sub-ext",
                    ),
                    variant!("English Dub",
                        SD480p => "https://pixeldrain.com/api/file/placeholder-ws1-480p-dub",
                        HD720p => "https://pixeldrain.com/api/file/placeholder-ws1-720p-dub",
                        FHD1080p => "https://pixeldrain.com/api/file/placeholder-ws1-1080p-dub",
                    ),
                ],
            },
        ),
        (
            "EN_1",
            OfficialEntry {
                title: "The Superhumans of Enies Lobby",
                arc_number: 17,
                variants: &[variant!("English Subtitles",
                    HD720p => "https://pixeldrain.net/api/file/X5BqDuJy",
                )],
            },
        ),
    ])
});

/// Look up the catalog entry for an episode key
pub fn catalog_entry(episode_id: &str) -> Option<&'static OfficialEntry> {
    CATALOG.get(episode_id)
}

/// Official stream candidates for an episode, ranked quality-descending
/// then subtitled-before-dubbed. Empty when the episode is not catalogued.
pub fn official_streams(episode: &EpisodeDescriptor) -> Vec<StreamCandidate> {
    let Some(entry) = catalog_entry(&episode.id) else {
        return Vec::new();
    };

    let mut ranked: Vec<(Reverse<u8>, u8, StreamCandidate)> = Vec::new();
    for variant in entry.variants {
        let track = TrackType::from_label(variant.label);
        for (quality, url) in variant.qualities {
            let subtitles = if track == TrackType::Subtitled {
                vec![SubtitleRef {
                    // Same URL: the subtitles are muxed into the video
                    url: url.to_string(),
                    lang: "eng".to_string(),
                    label: "English (Embedded)".to_string(),
                }]
            } else {
                Vec::new()
            };

            ranked.push((
                Reverse(quality.rank()),
                track.rank(),
                StreamCandidate {
                    tier: StreamTier::Official,
                    name: Some(format!("{} - {}", episode.title, variant.label)),
                    title: format!("🎌 One Pace Official - {} ({})", quality, variant.label),
                    url: Some(url.to_string()),
                    quality: Some(*quality),
                    subtitles,
                    behavior_hints: BehaviorHints {
                        binge_group: "onepace-official".to_string(),
                        country_whitelist: Some(
                            COUNTRY_WHITELIST.iter().map(|c| c.to_string()).collect(),
                        ),
                        priority: Some(OFFICIAL_PRIORITY),
                    },
                    ..Default::default()
                },
            ));
        }
    }

    ranked.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    ranked.into_iter().map(|(_, _, candidate)| candidate).collect()
}
