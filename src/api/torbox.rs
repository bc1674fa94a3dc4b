//! TorBox debrid client
//!
//! Drives the cached-torrent service through the per-file resolution state
//! machine: check availability, locate or create the remote job, request the
//! download links, select the video file. A torrent that is not already
//! cached fails the resolution; there is no queue-and-wait path and no retry.
//! Every transition that hits a transport or parse error terminates the job
//! with `None` - absence of a candidate is the sole failure signal.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::api::{ApiError, ApiResult};
use crate::models::{BehaviorHints, FileLink, Quality, StreamCandidate, StreamTier};

/// Countries the debrid service commonly serves
const COUNTRY_WHITELIST: &[&str] = &["US", "GB", "CA", "AU", "DE", "FR", "NL", "IT", "ES"];

/// Transient per-call resolution state. Lives only for the duration of one
/// resolution; never cached across requests, so every request re-verifies
/// availability.
#[derive(Debug)]
pub struct DebridJob {
    pub info_hash: String,
    pub file_idx: u32,
    pub available: bool,
    pub torrent_id: Option<String>,
    pub links: Vec<FileLink>,
}

impl DebridJob {
    fn new(info_hash: &str, file_idx: u32) -> Self {
        Self {
            info_hash: info_hash.to_string(),
            file_idx,
            available: false,
            torrent_id: None,
            links: Vec::new(),
        }
    }
}

// =============================================================================
// Wire Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    data: Option<HashMap<String, Vec<serde_json::Value>>>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    data: Option<CreateData>,
}

#[derive(Debug, Deserialize)]
struct CreateData {
    torrent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TorrentListResponse {
    #[serde(default)]
    data: Vec<TorrentEntry>,
}

#[derive(Debug, Deserialize)]
struct TorrentEntry {
    id: i64,
    #[serde(default)]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct LinksResponse {
    #[serde(default)]
    data: Vec<TorboxFile>,
}

#[derive(Debug, Deserialize)]
struct TorboxFile {
    download: String,
    name: String,
    #[serde(default)]
    size: u64,
}

// =============================================================================
// Client
// =============================================================================

/// TorBox API client, scoped to one account credential
pub struct TorboxClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl TorboxClient {
    /// Create a client against the production API
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://api.torbox.app/v1/api")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Resolve a torrent info-hash to one playable debrid candidate.
    ///
    /// Returns `None` when the torrent is not cached, any remote call fails,
    /// or no usable file link comes back.
    pub async fn resolve(&self, info_hash: &str, file_idx: u32) -> Option<StreamCandidate> {
        let mut job = DebridJob::new(info_hash, file_idx);

        // CHECK_AVAILABILITY: fail-safe, any error counts as not cached
        job.available = match self.check_availability(info_hash).await {
            Ok(available) => available,
            Err(e) => {
                warn!(hash = info_hash, error = %e, "availability check failed");
                false
            }
        };
        if !job.available {
            debug!(hash = info_hash, "torrent not cached, skipping");
            return None;
        }

        // LOCATE_OR_CREATE_TORRENT: locate is best effort, create is not
        job.torrent_id = match self.find_torrent(info_hash).await {
            Ok(Some(id)) => {
                debug!(hash = info_hash, torrent_id = %id, "reusing existing torrent");
                Some(id)
            }
            Ok(None) | Err(_) => match self.create_torrent(info_hash).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(hash = info_hash, error = %e, "create torrent failed");
                    None
                }
            },
        };
        let torrent_id = job.torrent_id.clone()?;

        // AWAIT_LINKS: single attempt, zero links fails the job
        job.links = match self.request_links(&torrent_id).await {
            Ok(links) => links,
            Err(e) => {
                warn!(hash = info_hash, torrent_id = %torrent_id, error = %e, "link request failed");
                return None;
            }
        };
        if job.links.is_empty() {
            debug!(hash = info_hash, "no download links returned");
            return None;
        }

        // SELECT_FILE
        let file = select_video_file(&job.links, job.file_idx)?;
        debug!(hash = info_hash, file = %file.name, size = file.size, "selected file");

        // DONE
        let quality = match Quality::from_str_loose(&file.name) {
            Quality::Unknown => None,
            q => Some(q),
        };
        Some(StreamCandidate {
            tier: StreamTier::Debrid,
            title: format!("🚀 TorBox (Cached) - {}", file.name),
            url: Some(file.url.clone()),
            quality,
            behavior_hints: BehaviorHints {
                binge_group: "onepace-torbox".to_string(),
                country_whitelist: Some(
                    COUNTRY_WHITELIST.iter().map(|c| c.to_string()).collect(),
                ),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    /// Check whether the torrent is instantly available in the service cache
    async fn check_availability(&self, info_hash: &str) -> ApiResult<bool> {
        let url = format!("{}/torrents/instantavailability", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("hash", info_hash)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let body: AvailabilityResponse = response.json().await?;
        Ok(body
            .data
            .and_then(|data| data.get(info_hash).map(|files| !files.is_empty()))
            .unwrap_or(false))
    }

    /// Look for an existing remote job holding this hash
    async fn find_torrent(&self, info_hash: &str) -> ApiResult<Option<String>> {
        let url = format!("{}/torrents/mylist", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let body: TorrentListResponse = response.json().await?;
        Ok(body
            .data
            .into_iter()
            .find(|t| t.hash.eq_ignore_ascii_case(info_hash))
            .map(|t| t.id.to_string()))
    }

    /// Submit a new download job for the hash in download-only mode
    async fn create_torrent(&self, info_hash: &str) -> ApiResult<Option<String>> {
        let url = format!("{}/torrents/createtorrent", self.base_url);
        let magnet = format!("magnet:?xt=urn:btih:{info_hash}");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            // seed mode 3 = download only, no re-seeding back to the swarm
            .json(&json!({ "magnet": magnet, "seed": 3, "as_queued": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let body: CreateResponse = response.json().await?;
        Ok(body
            .data
            .and_then(|d| d.torrent_id)
            .map(|id| id.to_string()))
    }

    /// Fetch the downloadable file links for a remote job
    async fn request_links(&self, torrent_id: &str) -> ApiResult<Vec<FileLink>> {
        let url = format!("{}/torrents/requestdl", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.api_key.as_str()), ("torrent_id", torrent_id)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let body: LinksResponse = response.json().await?;
        Ok(body
            .data
            .into_iter()
            .map(|f| FileLink {
                url: f.download,
                name: f.name,
                size: f.size,
            })
            .collect())
    }

    /// Verify the account credential against the user endpoint
    pub async fn verify_key(&self) -> bool {
        let url = format!("{}/user/me", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "credential verification request failed");
                false
            }
        }
    }
}

/// Pick the playable file: recognized video extensions sorted by descending
/// size, indexed by the caller-supplied file index; out-of-range indexes fall
/// back to the unsorted link list at the same position.
pub fn select_video_file(links: &[FileLink], file_idx: u32) -> Option<&FileLink> {
    let mut videos: Vec<&FileLink> = links.iter().filter(|l| l.is_video()).collect();
    videos.sort_by(|a, b| b.size.cmp(&a.size));
    videos
        .get(file_idx as usize)
        .copied()
        .or_else(|| links.get(file_idx as usize))
}
