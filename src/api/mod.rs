//! API clients for external services
//!
//! - TorBox: cached-torrent debrid resolution
//! - OpenSubtitles: community subtitle search (legacy REST endpoint)
//! - One Pace subtitle repository: official subtitles via the GitHub contents API
//!
//! All clients treat the remote side as an untrusted, possibly-stale oracle:
//! transport or parse failures surface as empty results, never as panics or
//! hard errors in the pipeline.

pub mod opensubtitles;
pub mod subs_repo;
pub mod torbox;

pub use opensubtitles::OpenSubtitlesClient;
pub use subs_repo::OnePaceSubtitleRepo;
pub use torbox::TorboxClient;

use thiserror::Error;

/// Transport-level failure talking to a provider
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Human-readable label for a two-letter language code
pub fn language_label(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "en" => "English".to_string(),
        "es" => "Spanish".to_string(),
        "fr" => "French".to_string(),
        "pt" => "Portuguese".to_string(),
        "it" => "Italian".to_string(),
        "de" => "German".to_string(),
        "ja" => "Japanese".to_string(),
        "ko" => "Korean".to_string(),
        "zh" => "Chinese".to_string(),
        "ar" => "Arabic".to_string(),
        "ru" => "Russian".to_string(),
        "unknown" => "Default".to_string(),
        other => other.to_uppercase(),
    }
}
