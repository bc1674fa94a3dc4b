//! Stream resolution and aggregation pipeline
//!
//! - Episode: request id → canonical episode descriptor
//! - Official: catalogued first-party stream links
//! - Subtitles: official repository + community search, merged and ranked
//! - Aggregate: the orchestrator producing the final ordered candidate list

pub mod aggregate;
pub mod episode;
pub mod official;
pub mod subtitles;

pub use aggregate::{DeliveryMode, StreamPipeline};
pub use episode::resolve_episode;
pub use official::official_streams;
pub use subtitles::SubtitleAggregator;
