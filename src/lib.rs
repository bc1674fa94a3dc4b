//! PaceStream - a Stremio addon serving One Pace episodes
//!
//! The crate resolves addon stream requests through a three-tier pipeline:
//! official first-party links, debrid-cached torrents (TorBox), and plain
//! P2P info-hashes as the fallback, with subtitles aggregated from the
//! official repository and OpenSubtitles.
//!
//! # Modules
//!
//! - `api` - remote service clients (TorBox, OpenSubtitles, subtitle repo)
//! - `catalog` - file-backed episode and torrent metadata
//! - `pipeline` - episode resolution, tier aggregation and ranking
//! - `server` - the addon HTTP surface
//! - `config` / `cli` - persistent settings and the command line

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod server;

pub use catalog::MetadataStore;
pub use models::{Quality, StreamCandidate, StreamTier, SubtitleCandidate};
pub use pipeline::StreamPipeline;
