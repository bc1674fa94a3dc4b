//! Metadata and catalog store
//!
//! Read-only JSON store backing the addon: the series meta document with its
//! indexed episode list, the catalog listing, and the per-episode raw stream
//! descriptors. Loaded once at startup; missing or malformed files degrade to
//! empty data with a logged warning.
//!
//! Layout under the data directory:
//! - `meta/series/pp_onepace.json` - `{ meta: { videos: [{id, season, episode, title}] } }`
//! - `catalog/series/seriesCatalog.json` - `{ metas: [...] }`
//! - `stream/series/<episodeId>.json` - `{ streams: [{infoHash, fileIdx}] }`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::models::RawStreamDescriptor;

/// Canonical series key: compound request ids must carry this prefix.
pub const SERIES_ID: &str = "pp_onepace";

/// One indexed episode from the series meta document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub season: u32,
    pub episode: u32,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct MetaDocument {
    meta: MetaBody,
}

#[derive(Debug, Deserialize)]
struct MetaBody {
    #[serde(default)]
    videos: Vec<EpisodeRecord>,
}

#[derive(Debug, Deserialize)]
struct StreamDocument {
    #[serde(default)]
    streams: Vec<RawStreamDescriptor>,
}

/// Read-only lookup over the series metadata, catalog and raw streams
#[derive(Debug, Default)]
pub struct MetadataStore {
    episodes: Vec<EpisodeRecord>,
    streams: HashMap<String, Vec<RawStreamDescriptor>>,
    catalog: Option<Value>,
    meta: Option<Value>,
}

impl MetadataStore {
    /// Load the store from a data directory. Every missing piece is an empty
    /// piece, never an error.
    pub fn load(data_dir: &Path) -> Self {
        let meta_path = data_dir.join("meta/series").join(format!("{SERIES_ID}.json"));
        let catalog_path = data_dir.join("catalog/series/seriesCatalog.json");

        let meta = read_json(&meta_path);
        let episodes = meta
            .as_ref()
            .and_then(|v| serde_json::from_value::<MetaDocument>(v.clone()).ok())
            .map(|doc| doc.meta.videos)
            .unwrap_or_default();

        let mut streams = HashMap::new();
        let stream_dir = data_dir.join("stream/series");
        if let Ok(entries) = std::fs::read_dir(&stream_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if let Some(value) = read_json(&path) {
                    match serde_json::from_value::<StreamDocument>(value) {
                        Ok(doc) => {
                            streams.insert(stem.to_string(), doc.streams);
                        }
                        Err(e) => warn!(file = %path.display(), error = %e, "invalid stream file"),
                    }
                }
            }
        }

        Self {
            episodes,
            streams,
            catalog: read_json(&catalog_path),
            meta,
        }
    }

    /// Build a store from in-memory parts (used by tests)
    pub fn from_parts(
        episodes: Vec<EpisodeRecord>,
        streams: HashMap<String, Vec<RawStreamDescriptor>>,
    ) -> Self {
        Self {
            episodes,
            streams,
            catalog: None,
            meta: None,
        }
    }

    /// Find the indexed episode with an exact (season, episode) match
    pub fn find_episode(&self, season: u32, episode: u32) -> Option<&EpisodeRecord> {
        self.episodes
            .iter()
            .find(|r| r.season == season && r.episode == episode)
    }

    /// Raw stream descriptors catalogued for an episode key
    pub fn streams_for(&self, episode_id: &str) -> &[RawStreamDescriptor] {
        self.streams
            .get(episode_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Catalog document for the addon catalog endpoint
    pub fn catalog(&self) -> Value {
        self.catalog.clone().unwrap_or_else(|| json!({ "metas": [] }))
    }

    /// Meta document for the addon meta endpoint
    pub fn meta(&self) -> Value {
        self.meta.clone().unwrap_or_else(|| json!({ "meta": {} }))
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }
}

/// Read and parse a JSON file, logging and swallowing any failure
fn read_json(path: &Path) -> Option<Value> {
    match std::fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to parse JSON file");
                None
            }
        },
        Err(e) => {
            warn!(file = %path.display(), error = %e, "failed to read JSON file");
            None
        }
    }
}
