//! Data structures and types for the addon pipeline
//!
//! Contains all shared models used across the application organized by domain:
//! - **Episodes**: canonical episode descriptors resolved from request ids
//! - **Streams**: playable stream candidates and their priority tiers
//! - **Debrid**: TorBox file links and transient job state
//! - **Subtitles**: aggregated subtitle candidates and attached references

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Episode Models
// =============================================================================

/// Canonical episode metadata, resolved once per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeDescriptor {
    /// Per-episode key, e.g. "RO_1"
    pub id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub title: String,
}

impl fmt::Display for EpisodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => write!(f, "S{:02}E{:02} - {}", s, e, self.title),
            _ => write!(f, "{} - {}", self.id, self.title),
        }
    }
}

// =============================================================================
// Stream Models
// =============================================================================

/// Priority class of a stream candidate. Official streams always outrank
/// debrid and torrent streams in the final ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamTier {
    Official,
    Debrid,
    P2p,
}

impl StreamTier {
    /// Ordering rank (lower = served first)
    pub fn rank(&self) -> u8 {
        match self {
            StreamTier::Official => 0,
            StreamTier::Debrid => 1,
            StreamTier::P2p => 2,
        }
    }
}

impl fmt::Display for StreamTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamTier::Official => write!(f, "Official"),
            StreamTier::Debrid => write!(f, "Debrid"),
            StreamTier::P2p => write!(f, "P2P"),
        }
    }
}

/// Video quality classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    FHD1080p,
    HD720p,
    SD480p,
    #[default]
    Unknown,
}

impl Quality {
    /// Parse quality from a loose label (e.g. "1080p", "Some.File.720p.mkv")
    pub fn from_str_loose(s: &str) -> Self {
        let s_lower = s.to_lowercase();
        if s_lower.contains("1080p") {
            Quality::FHD1080p
        } else if s_lower.contains("720p") {
            Quality::HD720p
        } else if s_lower.contains("480p") {
            Quality::SD480p
        } else {
            Quality::Unknown
        }
    }

    /// Quality ranking for sorting (higher = better)
    pub fn rank(&self) -> u8 {
        match self {
            Quality::FHD1080p => 3,
            Quality::HD720p => 2,
            Quality::SD480p => 1,
            Quality::Unknown => 0,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::FHD1080p => write!(f, "1080p"),
            Quality::HD720p => write!(f, "720p"),
            Quality::SD480p => write!(f, "480p"),
            Quality::Unknown => write!(f, "???"),
        }
    }
}

impl Ord for Quality {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Audio track type of an official variant. Subtitled releases rank ahead of
/// dubbed ones within the same quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Subtitled,
    Dubbed,
}

impl TrackType {
    /// Parse from a variant label like "English Subtitles" or "English Dub"
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("dub") {
            TrackType::Dubbed
        } else {
            TrackType::Subtitled
        }
    }

    /// Ordering rank (lower = served first)
    pub fn rank(&self) -> u8 {
        match self {
            TrackType::Subtitled => 0,
            TrackType::Dubbed => 1,
        }
    }
}

/// Raw per-file stream descriptor from the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStreamDescriptor {
    #[serde(rename = "infoHash")]
    pub info_hash: Option<String>,
    #[serde(rename = "fileIdx")]
    pub file_idx: Option<u32>,
}

/// Stremio behavior hints attached to a stream candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub binge_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_whitelist: Option<Vec<String>>,
    /// Forces official candidates ahead of every other tier in clients that
    /// honor it; the pipeline ordering does not depend on it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// One playable stream option returned to the client.
///
/// Produced by exactly one provider and owned by the aggregator for the
/// lifetime of one response; only mutated to append subtitle references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamCandidate {
    #[serde(skip, default = "StreamCandidate::default_tier")]
    pub tier: StreamTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub title: String,
    /// Direct playable URL (official and debrid tiers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Torrent content identifier (P2P tier)
    #[serde(rename = "infoHash", skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    #[serde(rename = "fileIdx", skip_serializing_if = "Option::is_none")]
    pub file_idx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub subtitles: Vec<SubtitleRef>,
    #[serde(rename = "behaviorHints")]
    pub behavior_hints: BehaviorHints,
}

impl StreamCandidate {
    fn default_tier() -> StreamTier {
        StreamTier::P2p
    }
}

impl Default for StreamCandidate {
    fn default() -> Self {
        Self {
            tier: StreamTier::P2p,
            name: None,
            title: String::new(),
            url: None,
            info_hash: None,
            file_idx: None,
            quality: None,
            subtitles: Vec::new(),
            behavior_hints: BehaviorHints::default(),
        }
    }
}

impl fmt::Display for StreamCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quality {
            Some(q) => write!(f, "[{}] [{}] {}", self.tier, q, self.title),
            None => write!(f, "[{}] {}", self.tier, self.title),
        }
    }
}

// =============================================================================
// Debrid Models
// =============================================================================

/// Downloadable file link reported by the debrid service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLink {
    pub url: String,
    pub name: String,
    pub size: u64,
}

/// Recognized video container extensions
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "ts", "m2ts",
];

impl FileLink {
    /// Whether this link points at a recognized video container
    pub fn is_video(&self) -> bool {
        is_video_file(&self.name)
    }
}

/// Check a filename against the recognized video extensions
pub fn is_video_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

// =============================================================================
// Subtitle Models
// =============================================================================

/// Origin of a subtitle candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleSource {
    Official,
    Community,
}

impl SubtitleSource {
    /// Ordering rank: official entries precede community entries regardless
    /// of rating.
    pub fn rank(&self) -> u8 {
        match self {
            SubtitleSource::Official => 0,
            SubtitleSource::Community => 1,
        }
    }
}

/// Subtitle track found by one of the subtitle providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    pub url: String,
    pub lang: String,
    pub label: String,
    pub source: SubtitleSource,
    pub rating: f32,
}

impl SubtitleCandidate {
    /// Deduplication key: one entry per (language, url) pair
    pub fn dedup_key(&self) -> (String, String) {
        (self.lang.clone(), self.url.clone())
    }

    /// The subset attached onto a stream candidate
    pub fn to_ref(&self) -> SubtitleRef {
        SubtitleRef {
            url: self.url.clone(),
            lang: self.lang.clone(),
            label: self.label.clone(),
        }
    }
}

/// Subtitle reference attached to a stream candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleRef {
    pub url: String,
    pub lang: String,
    pub label: String,
}

/// Requested subtitle language set: an explicit code list or everything
/// the providers carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelection {
    All,
    Codes(Vec<String>),
}

impl LanguageSelection {
    /// Build from an optional code list; `None` and the "all" sentinel both
    /// select every language.
    pub fn from_codes(codes: Option<Vec<String>>) -> Self {
        match codes {
            None => LanguageSelection::All,
            Some(list) if list.is_empty() => LanguageSelection::All,
            Some(list) if list.iter().any(|c| c.eq_ignore_ascii_case("all")) => {
                LanguageSelection::All
            }
            Some(list) => LanguageSelection::Codes(list),
        }
    }

    /// Whether a language code passes the filter. Unknown codes are kept so
    /// undetected languages still reach the client.
    pub fn matches(&self, code: &str) -> bool {
        match self {
            LanguageSelection::All => true,
            LanguageSelection::Codes(codes) => {
                code == "unknown" || codes.iter().any(|c| c.eq_ignore_ascii_case(code))
            }
        }
    }

    /// Comma-joined code list for provider query URLs
    pub fn query_codes(&self) -> String {
        match self {
            LanguageSelection::All => "all".to_string(),
            LanguageSelection::Codes(codes) => codes.join(","),
        }
    }
}

impl Default for LanguageSelection {
    fn default() -> Self {
        LanguageSelection::All
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Quality Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_quality_from_str() {
        assert_eq!(Quality::from_str_loose("1080p"), Quality::FHD1080p);
        assert_eq!(
            Quality::from_str_loose("One.Pace.720p.WEB.mkv"),
            Quality::HD720p
        );
        assert_eq!(Quality::from_str_loose("480p"), Quality::SD480p);
        assert_eq!(Quality::from_str_loose("CAM"), Quality::Unknown);
        assert_eq!(Quality::from_str_loose(""), Quality::Unknown);
    }

    #[test]
    fn test_quality_ordering() {
        assert!(Quality::FHD1080p > Quality::HD720p);
        assert!(Quality::HD720p > Quality::SD480p);
        assert!(Quality::SD480p > Quality::Unknown);
    }

    // -------------------------------------------------------------------------
    // Tier Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tier_rank_order() {
        assert!(StreamTier::Official.rank() < StreamTier::Debrid.rank());
        assert!(StreamTier::Debrid.rank() < StreamTier::P2p.rank());
    }

    // -------------------------------------------------------------------------
    // TrackType Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_track_type_from_label() {
        assert_eq!(
            TrackType::from_label("English Subtitles"),
            TrackType::Subtitled
        );
        assert_eq!(TrackType::from_label("English Dub"), TrackType::Dubbed);
        assert_eq!(
            TrackType::from_label("English Dub with Closed Captions"),
            TrackType::Dubbed
        );
        assert_eq!(
            TrackType::from_label("English Subtitles, Extended"),
            TrackType::Subtitled
        );
    }

    #[test]
    fn test_track_type_rank() {
        assert!(TrackType::Subtitled.rank() < TrackType::Dubbed.rank());
    }

    // -------------------------------------------------------------------------
    // Video File Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("episode.mkv"));
        assert!(is_video_file("Episode.1080p.MP4"));
        assert!(is_video_file("show.m2ts"));
        assert!(!is_video_file("episode.nfo"));
        assert!(!is_video_file("subs.srt"));
        assert!(!is_video_file("no_extension"));
    }

    // -------------------------------------------------------------------------
    // Subtitle Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_subtitle_dedup_key() {
        let sub = SubtitleCandidate {
            url: "https://example.com/sub.srt".to_string(),
            lang: "en".to_string(),
            label: "English".to_string(),
            source: SubtitleSource::Community,
            rating: 5.0,
        };
        assert_eq!(
            sub.dedup_key(),
            ("en".to_string(), "https://example.com/sub.srt".to_string())
        );
    }

    #[test]
    fn test_subtitle_source_order() {
        assert!(SubtitleSource::Official.rank() < SubtitleSource::Community.rank());
    }

    #[test]
    fn test_language_selection() {
        let all = LanguageSelection::from_codes(None);
        assert!(all.matches("en"));
        assert!(all.matches("ja"));
        assert_eq!(all.query_codes(), "all");

        let some = LanguageSelection::from_codes(Some(vec!["en".into(), "es".into()]));
        assert!(some.matches("en"));
        assert!(some.matches("ES"));
        assert!(!some.matches("fr"));
        assert!(some.matches("unknown"));
        assert_eq!(some.query_codes(), "en,es");

        let sentinel = LanguageSelection::from_codes(Some(vec!["all".into()]));
        assert_eq!(sentinel, LanguageSelection::All);
    }

    // -------------------------------------------------------------------------
    // Serialization Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_raw_descriptor_deserialize() {
        let raw: RawStreamDescriptor =
            serde_json::from_str(r#"{"infoHash": "abc123", "fileIdx": 2}"#).unwrap();
        assert_eq!(raw.info_hash.as_deref(), Some("abc123"));
        assert_eq!(raw.file_idx, Some(2));

        let bare: RawStreamDescriptor = serde_json::from_str(r#"{}"#).unwrap();
        assert!(bare.info_hash.is_none());
    }

    #[test]
    fn test_stream_candidate_serializes_stremio_shape() {
        let candidate = StreamCandidate {
            tier: StreamTier::P2p,
            title: "📁 Torrent - Romance Dawn".to_string(),
            info_hash: Some("abc123".to_string()),
            file_idx: Some(0),
            behavior_hints: BehaviorHints {
                binge_group: "onepace-torrent".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["infoHash"], "abc123");
        assert_eq!(json["fileIdx"], 0);
        assert_eq!(json["behaviorHints"]["bingeGroup"], "onepace-torrent");
        // Internal fields never reach the wire
        assert!(json.get("tier").is_none());
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_episode_descriptor_display() {
        let full = EpisodeDescriptor {
            id: "RO_1".to_string(),
            season: Some(1),
            episode: Some(1),
            title: "Romance Dawn".to_string(),
        };
        assert_eq!(full.to_string(), "S01E01 - Romance Dawn");

        let bare = EpisodeDescriptor {
            id: "RO_1".to_string(),
            season: None,
            episode: None,
            title: "Episode RO_1".to_string(),
        };
        assert_eq!(bare.to_string(), "RO_1 - Episode RO_1");
    }
}
