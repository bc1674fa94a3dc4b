//! OpenSubtitles community search client
//!
//! Queries the legacy REST search endpoint (no API key required) with several
//! query phrasings, scores each hit for relevance to the episode, and merges
//! the results. A phrasing that errors or returns garbage contributes
//! nothing; the search as a whole never fails.

use serde::Deserialize;
use tracing::debug;

use crate::api::language_label;
use crate::models::{EpisodeDescriptor, LanguageSelection, SubtitleCandidate, SubtitleSource};

/// Cap on merged community results per episode
const MAX_COMMUNITY_RESULTS: usize = 10;

const USER_AGENT: &str = "PaceStream v0.1";

/// One record from the legacy search API
#[derive(Debug, Deserialize)]
struct OsRecord {
    #[serde(rename = "SubDownloadLink")]
    download_link: Option<String>,
    #[serde(rename = "SubLanguageID")]
    language_id: Option<String>,
    #[serde(rename = "ISO639")]
    iso639: Option<String>,
    #[serde(rename = "SubFileName")]
    file_name: Option<String>,
    #[serde(rename = "SubRating")]
    rating: Option<String>,
    #[serde(rename = "SubDownloadsCnt")]
    downloads: Option<String>,
}

/// Community subtitle search client
pub struct OpenSubtitlesClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenSubtitlesClient {
    /// Create a client against the public REST endpoint
    pub fn new() -> Self {
        Self::with_base_url("https://rest.opensubtitles.org/search")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Search community subtitles for an episode.
    ///
    /// Tries multiple query phrasings, merges and deduplicates on
    /// `(language, url)`, keeps the most relevant matches first.
    pub async fn search(
        &self,
        episode: &EpisodeDescriptor,
        languages: &LanguageSelection,
    ) -> Vec<SubtitleCandidate> {
        let mut scored: Vec<(u32, SubtitleCandidate)> = Vec::new();

        for strategy in self.search_strategies(episode, languages) {
            let records = match self.fetch_records(&strategy).await {
                Some(records) => records,
                None => continue,
            };
            debug!(strategy = %strategy, hits = records.len(), "community search strategy");

            for record in records {
                if let Some(entry) = scored_candidate(record, episode) {
                    scored.push(entry);
                }
            }
        }

        // Most relevant first, then dedupe keeps the best entry per (lang, url)
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let mut seen = std::collections::HashSet::new();
        scored
            .into_iter()
            .map(|(_, candidate)| candidate)
            .filter(|c| seen.insert(c.dedup_key()))
            .take(MAX_COMMUNITY_RESULTS)
            .collect()
    }

    /// Query phrasings, most specific first
    fn search_strategies(
        &self,
        episode: &EpisodeDescriptor,
        languages: &LanguageSelection,
    ) -> Vec<String> {
        let codes = languages.query_codes();
        let mut strategies = vec![format!(
            "{}/sublanguageid-{}/query-{}",
            self.base_url,
            codes,
            urlencoding::encode(&format!("One Pace {}", episode.title))
        )];
        if let (Some(season), Some(ep)) = (episode.season, episode.episode) {
            strategies.push(format!(
                "{}/sublanguageid-{}/query-{}/season-{}/episode-{}",
                self.base_url,
                codes,
                urlencoding::encode("One Piece"),
                season,
                ep
            ));
        }
        strategies.push(format!(
            "{}/sublanguageid-{}/query-{}",
            self.base_url,
            codes,
            urlencoding::encode("One Pace")
        ));
        strategies
    }

    /// Fetch one strategy, swallowing every kind of failure
    async fn fetch_records(&self, url: &str) -> Option<Vec<OsRecord>> {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(url, error = %e, "community search request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "community search rejected");
            return None;
        }
        match response.json::<Vec<OsRecord>>().await {
            Ok(records) => Some(records),
            Err(e) => {
                debug!(url, error = %e, "community search parse failed");
                None
            }
        }
    }
}

impl Default for OpenSubtitlesClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a raw record into a scored candidate, dropping link-less entries
fn scored_candidate(
    record: OsRecord,
    episode: &EpisodeDescriptor,
) -> Option<(u32, SubtitleCandidate)> {
    let url = record.download_link.clone()?;
    let lang = record
        .language_id
        .clone()
        .or(record.iso639.clone())
        .unwrap_or_else(|| "en".to_string());
    let file_name = record.file_name.clone().unwrap_or_default();
    let rating = record
        .rating
        .as_deref()
        .and_then(|r| r.parse::<f32>().ok())
        .unwrap_or(0.0);

    let label = if file_name.is_empty() {
        format!("{} - OpenSubtitles", language_label(&lang))
    } else {
        format!("{} - {}", language_label(&lang), file_name)
    };

    let score = match_score(&record, episode);
    Some((
        score,
        SubtitleCandidate {
            url,
            lang,
            label,
            source: SubtitleSource::Community,
            rating,
        },
    ))
}

/// Relevance score: how well a community hit matches the requested episode
fn match_score(record: &OsRecord, episode: &EpisodeDescriptor) -> u32 {
    let mut score = 0u32;
    let file_name = record
        .file_name
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let title = episode.title.to_lowercase();

    if !title.is_empty() && file_name.contains(&title) {
        score += 50;
    }
    if file_name.contains("one pace") {
        score += 30;
    } else if file_name.contains("one piece") {
        score += 20;
    }
    if let Some(season) = episode.season {
        if file_name.contains(&format!("s{season}")) {
            score += 15;
        }
    }
    if let Some(ep) = episode.episode {
        if file_name.contains(&format!("e{ep}")) {
            score += 15;
        }
    }
    if let Some(rating) = record.rating.as_deref().and_then(|r| r.parse::<f32>().ok()) {
        if rating > 0.0 {
            score += (rating * 2.0) as u32;
        }
    }
    if let Some(downloads) = record
        .downloads
        .as_deref()
        .and_then(|d| d.parse::<u32>().ok())
    {
        if downloads > 100 {
            score += 10;
        }
    }
    score
}
