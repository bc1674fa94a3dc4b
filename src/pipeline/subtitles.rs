//! Subtitle aggregation
//!
//! Merges the official subtitle repository with community OpenSubtitles
//! search results into one ranked list. Official files always sort ahead
//! of community ones, community ratings are discounted so a popular upload
//! can never outrank an official release, and duplicate (language, url)
//! pairs collapse to the higher-ranked entry.

use std::collections::HashMap;

use tracing::debug;

use crate::api::opensubtitles::OpenSubtitlesClient;
use crate::api::subs_repo::OnePaceSubtitleRepo;
use crate::models::{EpisodeDescriptor, LanguageSelection, SubtitleCandidate};

/// Hard cap on the merged list
pub const MAX_SUBTITLES: usize = 15;

/// Community match scores are discounted by this factor before ranking so
/// they stay below the official rating
pub const COMMUNITY_RATING_SCALE: f32 = 0.5;

/// Fetches from both subtitle sources concurrently and merges the results
pub struct SubtitleAggregator {
    repo: OnePaceSubtitleRepo,
    community: OpenSubtitlesClient,
}

impl Default for SubtitleAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SubtitleAggregator {
    pub fn new() -> Self {
        Self {
            repo: OnePaceSubtitleRepo::new(),
            community: OpenSubtitlesClient::new(),
        }
    }

    /// Injectable clients, for tests pointed at a local server
    pub fn with_clients(repo: OnePaceSubtitleRepo, community: OpenSubtitlesClient) -> Self {
        Self { repo, community }
    }

    /// Collect, merge and rank subtitles for an episode. Source failures
    /// degrade to an empty contribution, never an error.
    pub async fn collect(
        &self,
        episode: &EpisodeDescriptor,
        languages: &LanguageSelection,
    ) -> Vec<SubtitleCandidate> {
        let (official, community) = tokio::join!(
            self.repo.fetch(episode, languages),
            self.community.search(episode, languages),
        );
        debug!(
            episode = %episode.id,
            official = official.len(),
            community = community.len(),
            "subtitle sources fetched"
        );
        merge_and_rank(official, community)
    }
}

/// Discount community ratings, dedupe on (language, url) preferring the
/// official source, then order official-first, rating-descending.
pub(crate) fn merge_and_rank(
    official: Vec<SubtitleCandidate>,
    community: Vec<SubtitleCandidate>,
) -> Vec<SubtitleCandidate> {
    let mut by_key: HashMap<(String, String), SubtitleCandidate> = HashMap::new();

    for candidate in official {
        by_key.insert(candidate.dedup_key(), candidate);
    }
    for mut candidate in community {
        candidate.rating *= COMMUNITY_RATING_SCALE;
        by_key.entry(candidate.dedup_key()).or_insert(candidate);
    }

    let mut merged: Vec<SubtitleCandidate> = by_key.into_values().collect();
    merged.sort_by(|a, b| {
        a.source
            .rank()
            .cmp(&b.source.rank())
            .then_with(|| b.rating.total_cmp(&a.rating))
    });
    merged.truncate(MAX_SUBTITLES);
    merged
}
