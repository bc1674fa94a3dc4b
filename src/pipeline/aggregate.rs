//! Stream aggregation and ranking
//!
//! Front door of the pipeline: resolves the requested episode, gathers
//! candidates from every tier, attaches subtitles and emits the final
//! ordered list. Delivery mode is decided once per request from the
//! presence of a debrid credential and never mixed: with a credential the
//! torrent descriptors go through the debrid resolver (and silently drop
//! when uncached), without one they are served as plain P2P streams.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::api::torbox::TorboxClient;
use crate::catalog::MetadataStore;
use crate::models::{
    BehaviorHints, EpisodeDescriptor, LanguageSelection, RawStreamDescriptor, StreamCandidate,
    StreamTier, SubtitleCandidate,
};
use crate::pipeline::episode::resolve_episode;
use crate::pipeline::official::official_streams;
use crate::pipeline::subtitles::SubtitleAggregator;

/// How torrent-backed descriptors are delivered for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Resolve through a debrid service with the given API key
    Debrid(String),
    /// Hand the raw info-hashes to the player
    P2p,
}

impl DeliveryMode {
    /// A present, non-empty credential selects debrid for the whole request
    pub fn from_credential(credential: Option<&str>) -> Self {
        match credential {
            Some(key) if !key.is_empty() => DeliveryMode::Debrid(key.to_string()),
            _ => DeliveryMode::P2p,
        }
    }
}

/// Aggregates official, debrid/P2P and subtitle sources per request
pub struct StreamPipeline {
    store: Arc<MetadataStore>,
    subtitles: SubtitleAggregator,
    languages: LanguageSelection,
    /// Test override for the debrid API endpoint
    torbox_base_url: Option<String>,
}

impl StreamPipeline {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self {
            store,
            subtitles: SubtitleAggregator::new(),
            languages: LanguageSelection::All,
            torbox_base_url: None,
        }
    }

    pub fn with_subtitle_aggregator(mut self, subtitles: SubtitleAggregator) -> Self {
        self.subtitles = subtitles;
        self
    }

    pub fn with_languages(mut self, languages: LanguageSelection) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_torbox_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.torbox_base_url = Some(base_url.into());
        self
    }

    /// Full stream response for one addon request.
    ///
    /// Unknown media types and unresolvable ids yield an empty list.
    pub async fn streams(
        &self,
        media_type: &str,
        raw_id: &str,
        credential: Option<&str>,
    ) -> Vec<StreamCandidate> {
        if media_type != "series" {
            debug!(media_type, "unsupported media type");
            return Vec::new();
        }
        let Some(episode) = resolve_episode(&self.store, raw_id) else {
            debug!(raw_id, "episode not resolved");
            return Vec::new();
        };

        let mode = DeliveryMode::from_credential(credential);
        let descriptors = self.store.streams_for(&episode.id);

        let (subtitles, resolved) = tokio::join!(
            self.subtitles.collect(&episode, &self.languages),
            self.resolve_descriptors(&episode, descriptors, &mode),
        );

        let mut candidates = official_streams(&episode);
        candidates.extend(resolved);

        let subtitle_refs: Vec<_> = subtitles.iter().map(SubtitleCandidate::to_ref).collect();
        for candidate in &mut candidates {
            candidate.subtitles.extend(subtitle_refs.iter().cloned());
        }

        let mode_label = match &mode {
            DeliveryMode::Debrid(_) => "debrid",
            DeliveryMode::P2p => "p2p",
        };
        info!(
            episode = %episode.id,
            streams = candidates.len(),
            subtitles = subtitle_refs.len(),
            mode = mode_label,
            "stream response assembled"
        );
        candidates
    }

    /// Turn stored torrent descriptors into candidates for the selected
    /// delivery mode, preserving descriptor order.
    async fn resolve_descriptors(
        &self,
        episode: &EpisodeDescriptor,
        descriptors: &[RawStreamDescriptor],
        mode: &DeliveryMode,
    ) -> Vec<StreamCandidate> {
        match mode {
            DeliveryMode::P2p => descriptors
                .iter()
                .filter(|d| d.info_hash.is_some())
                .map(|d| p2p_candidate(episode, d))
                .collect(),
            DeliveryMode::Debrid(key) => {
                let client = match &self.torbox_base_url {
                    Some(base) => TorboxClient::with_base_url(key.as_str(), base.as_str()),
                    None => TorboxClient::new(key.as_str()),
                };
                let jobs = descriptors.iter().filter_map(|d| {
                    let hash = d.info_hash.clone()?;
                    let file_idx = d.file_idx.unwrap_or(0);
                    let client = &client;
                    Some(async move { client.resolve(&hash, file_idx).await })
                });
                join_all(jobs).await.into_iter().flatten().collect()
            }
        }
    }
}

fn p2p_candidate(episode: &EpisodeDescriptor, descriptor: &RawStreamDescriptor) -> StreamCandidate {
    StreamCandidate {
        tier: StreamTier::P2p,
        title: format!("📁 Torrent - {}", episode.title),
        info_hash: descriptor.info_hash.clone(),
        file_idx: descriptor.file_idx,
        behavior_hints: BehaviorHints {
            binge_group: "onepace-torrent".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}
