//! Official One Pace subtitle repository client
//!
//! Looks up per-episode subtitle files in the public subtitle repository via
//! the GitHub contents API. Folder naming in the repository is inconsistent,
//! so the lookup tries several conventions (episode key, key with spaces,
//! arc name) and finally probes a handful of direct file name patterns
//! before giving up. Official results always carry the top rating.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::api::language_label;
use crate::models::{EpisodeDescriptor, LanguageSelection, SubtitleCandidate, SubtitleSource};

/// Rating assigned to every official subtitle
pub const OFFICIAL_RATING: f32 = 10.0;

const USER_AGENT: &str = "PaceStream v0.1";

const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass"];

/// Languages probed by the direct-file fallback when no explicit list is given
const PROBE_LANGUAGES: &[&str] = &["en", "es", "fr", "pt", "de", "it", "ja"];

/// Arc folder names by episode key prefix
static ARC_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("RO", "Romance Dawn"),
        ("OR", "Orange Town"),
        ("SY", "Syrup Village"),
        ("GA", "Gaimon"),
        ("BA", "Baratie"),
        ("AP", "Arlong Park"),
        ("REV", "Reverse Mountain"),
        ("WP", "Whisky Peak"),
        ("LG", "Little Garden"),
        ("AR", "Arabasta"),
        ("JA", "Jaya"),
        ("SK", "Skypeia"),
        ("LRLL", "Long Ring Long Land"),
        ("WA", "Water 7"),
        ("EL", "Enies Lobby"),
        ("TB", "Thriller Bark"),
        ("SAB", "Sabaody Archipelago"),
        ("AM", "Amazon Lily"),
        ("ID", "Impel Down"),
        ("MW", "Marineford"),
        ("FI", "Fish-Man Island"),
        ("PH", "Punk Hazard"),
        ("DR", "Dressrosa"),
        ("ZO", "Zou"),
        ("WC", "Whole Cake Island"),
        ("WS", "Wano"),
    ])
});

/// Full-language-name patterns checked against the whole filename
const NAME_PATTERNS: &[(&str, &str)] = &[
    ("english", "en"),
    ("spanish", "es"),
    ("french", "fr"),
    ("portuguese", "pt"),
    ("german", "de"),
    ("italian", "it"),
    ("japanese", "ja"),
];

/// Short-code tokens matched against delimited filename parts
const CODE_TOKENS: &[(&str, &str)] = &[
    ("eng", "en"),
    ("en", "en"),
    ("esp", "es"),
    ("es", "es"),
    ("fra", "fr"),
    ("fr", "fr"),
    ("por", "pt"),
    ("pt", "pt"),
    ("ger", "de"),
    ("de", "de"),
    ("ita", "it"),
    ("it", "it"),
    ("jpn", "ja"),
    ("jp", "ja"),
    ("ja", "ja"),
];

/// One entry from the GitHub contents API
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

/// Official subtitle repository client
pub struct OnePaceSubtitleRepo {
    api_url: String,
    raw_url: String,
    client: reqwest::Client,
}

impl OnePaceSubtitleRepo {
    /// Create a client against the public repository
    pub fn new() -> Self {
        Self::with_base_urls(
            "https://api.github.com/repos/one-pace/one-pace-public-subtitles/contents/main/Release/Final%20Subs",
            "https://raw.githubusercontent.com/one-pace/one-pace-public-subtitles/main/main/Release/Final%20Subs",
        )
    }

    /// Create a client with custom base URLs (for testing)
    pub fn with_base_urls(api_url: impl Into<String>, raw_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            raw_url: raw_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch official subtitles for an episode, filtered to the requested
    /// languages. Failures of any kind produce an empty list.
    pub async fn fetch(
        &self,
        episode: &EpisodeDescriptor,
        languages: &LanguageSelection,
    ) -> Vec<SubtitleCandidate> {
        let mut files = self.list_episode_files(&episode.id).await;
        if files.is_empty() {
            files = self.probe_direct_files(&episode.id, languages).await;
        }
        if files.is_empty() {
            debug!(episode = %episode.id, "no official subtitle files found");
            return Vec::new();
        }

        files
            .into_iter()
            .filter_map(|(name, url)| {
                let lang = language_from_filename(&name);
                if !languages.matches(&lang) {
                    return None;
                }
                Some(SubtitleCandidate {
                    url,
                    label: format!(
                        "🎌 One Pace Official - {} ({})",
                        language_label(&lang),
                        episode.title
                    ),
                    lang,
                    source: SubtitleSource::Official,
                    rating: OFFICIAL_RATING,
                })
            })
            .collect()
    }

    /// Walk the candidate folder conventions for an episode key
    async fn list_episode_files(&self, episode_id: &str) -> Vec<(String, String)> {
        let mut paths = vec![episode_id.to_string(), episode_id.replace('_', " ")];
        if let Some(arc) = arc_name(episode_id) {
            paths.push(arc.to_string());
        }
        paths.dedup();

        let mut files = Vec::new();
        for path in paths {
            let url = format!("{}/{}", self.api_url, urlencoding::encode(&path));
            let response = match self
                .client
                .get(&url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(path, error = %e, "contents request failed");
                    continue;
                }
            };
            if !response.status().is_success() {
                debug!(path, status = %response.status(), "contents path not found");
                continue;
            }
            let entries = match response.json::<Vec<ContentsEntry>>().await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(path, error = %e, "contents parse failed");
                    continue;
                }
            };

            for entry in entries {
                if entry.kind != "file" || !is_subtitle_file(&entry.name) {
                    continue;
                }
                let relevant = entry.name.contains(episode_id)
                    || entry.name.to_lowercase().contains("subtitle");
                if !relevant {
                    continue;
                }
                if let Some(url) = entry.download_url {
                    files.push((entry.name, url));
                }
            }
        }
        files
    }

    /// Probe common direct file name patterns with HEAD requests
    async fn probe_direct_files(
        &self,
        episode_id: &str,
        languages: &LanguageSelection,
    ) -> Vec<(String, String)> {
        let langs: Vec<String> = match languages {
            LanguageSelection::Codes(codes) => codes.clone(),
            LanguageSelection::All => PROBE_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        };

        let mut names = Vec::new();
        let mut seen = HashSet::new();
        for lang in &langs {
            for ext in SUBTITLE_EXTENSIONS {
                for name in [
                    format!("{episode_id}.{lang}.{ext}"),
                    format!("{episode_id}_{lang}.{ext}"),
                    format!("{episode_id} - {lang}.{ext}"),
                    format!("{episode_id}.{ext}"),
                ] {
                    if seen.insert(name.clone()) {
                        names.push(name);
                    }
                }
            }
        }

        let mut files = Vec::new();
        for name in names {
            let url = format!("{}/{}", self.raw_url, urlencoding::encode(&name));
            let exists = match self.client.head(&url).send().await {
                Ok(r) => r.status().is_success(),
                Err(_) => false,
            };
            if exists {
                debug!(file = %name, "direct subtitle file found");
                files.push((name, url));
            }
        }
        files
    }
}

impl Default for OnePaceSubtitleRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Arc folder name for an episode key like "RO_1"
pub fn arc_name(episode_id: &str) -> Option<&'static str> {
    let prefix = episode_id.split('_').next()?;
    ARC_NAMES.get(prefix).copied()
}

fn is_subtitle_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| SUBTITLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Detect the subtitle language from a filename.
///
/// Full language names are matched anywhere; short codes only as delimited
/// tokens, so "french" never reads as "en". Unmatched names default to
/// English, the repository's dominant language.
pub fn language_from_filename(filename: &str) -> String {
    let lower = filename.to_lowercase();
    for (pattern, code) in NAME_PATTERNS {
        if lower.contains(pattern) {
            return code.to_string();
        }
    }

    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    for (token, code) in CODE_TOKENS {
        if tokens.contains(token) {
            return code.to_string();
        }
    }

    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_name_from_prefix() {
        assert_eq!(arc_name("RO_1"), Some("Romance Dawn"));
        assert_eq!(arc_name("WS_3"), Some("Wano"));
        assert_eq!(arc_name("EL_2"), Some("Enies Lobby"));
        assert_eq!(arc_name("XX_1"), None);
    }

    #[test]
    fn test_language_from_full_name() {
        assert_eq!(language_from_filename("RO_1 English Subtitles.srt"), "en");
        assert_eq!(language_from_filename("RO_1.Spanish.ass"), "es");
        assert_eq!(language_from_filename("romance_dawn_french.srt"), "fr");
    }

    #[test]
    fn test_language_from_code_token() {
        assert_eq!(language_from_filename("RO_1.en.srt"), "en");
        assert_eq!(language_from_filename("RO_1_jpn.ass"), "ja");
        assert_eq!(language_from_filename("RO_1 - pt.vtt"), "pt");
    }

    #[test]
    fn test_language_default_is_english() {
        assert_eq!(language_from_filename("RO_1.srt"), "en");
    }

    #[test]
    fn test_french_is_not_misread_as_english() {
        // "french" contains the substring "en"; token matching avoids that trap
        assert_eq!(language_from_filename("ep_french.srt"), "fr");
    }

    #[test]
    fn test_is_subtitle_file() {
        assert!(is_subtitle_file("a.srt"));
        assert!(is_subtitle_file("b.VTT"));
        assert!(is_subtitle_file("c.ass"));
        assert!(!is_subtitle_file("d.mkv"));
        assert!(!is_subtitle_file("plain"));
    }
}
