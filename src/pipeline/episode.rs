//! Episode resolver
//!
//! Maps a raw request identifier to a canonical episode descriptor. Two
//! accepted shapes: a compound `pp_onepace:<season>:<episode>` key resolved
//! against the metadata store, or a bare episode key used as-is with a
//! synthesized title. Resolution failure is `None`, never an error - the
//! metadata is local and deterministic, so there is nothing to retry.

use crate::catalog::{MetadataStore, SERIES_ID};
use crate::models::EpisodeDescriptor;

/// Resolve a raw request identifier against the metadata store.
///
/// Compound ids must carry the series prefix and integer season/episode
/// numbers matching an indexed episode exactly. Anything with a `:` that
/// does not fully parse is rejected.
pub fn resolve_episode(store: &MetadataStore, raw_id: &str) -> Option<EpisodeDescriptor> {
    if raw_id.is_empty() {
        return None;
    }

    if raw_id.contains(':') {
        let parts: Vec<&str> = raw_id.split(':').collect();
        if parts.len() < 3 || parts[0] != SERIES_ID {
            return None;
        }
        let season: u32 = parts[1].parse().ok()?;
        let episode: u32 = parts[2].parse().ok()?;
        let record = store.find_episode(season, episode)?;
        return Some(EpisodeDescriptor {
            id: record.id.clone(),
            season: Some(record.season),
            episode: Some(record.episode),
            title: record.title.clone(),
        });
    }

    // Bare token: already a canonical per-episode key
    Some(EpisodeDescriptor {
        id: raw_id.to_string(),
        season: None,
        episode: None,
        title: format!("Episode {raw_id}"),
    })
}
