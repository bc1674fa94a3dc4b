//! End-to-end pipeline tests: episode resolution, tier selection and the
//! final stream ordering, with every remote service mocked.

use std::collections::HashMap;
use std::sync::Arc;

use mockito::Matcher;
use pacestream::api::opensubtitles::OpenSubtitlesClient;
use pacestream::api::subs_repo::OnePaceSubtitleRepo;
use pacestream::catalog::{EpisodeRecord, MetadataStore};
use pacestream::models::RawStreamDescriptor;
use pacestream::pipeline::SubtitleAggregator;
use pacestream::{StreamPipeline, StreamTier};

const HASH: &str = "abc123def456abc123def456abc123def456abcd";

fn store() -> Arc<MetadataStore> {
    let episodes = vec![EpisodeRecord {
        id: "RO_1".to_string(),
        season: 1,
        episode: 1,
        title: "Romance Dawn 01".to_string(),
    }];
    let streams = HashMap::from([(
        "RO_1".to_string(),
        vec![RawStreamDescriptor {
            info_hash: Some(HASH.to_string()),
            file_idx: Some(0),
        }],
    )]);
    Arc::new(MetadataStore::from_parts(episodes, streams))
}

/// Subtitle aggregator whose sources all point at the mock server
fn mock_subtitles(server: &mockito::Server) -> SubtitleAggregator {
    SubtitleAggregator::with_clients(
        OnePaceSubtitleRepo::with_base_urls(
            format!("{}/contents", server.url()),
            format!("{}/raw", server.url()),
        ),
        OpenSubtitlesClient::with_base_url(format!("{}/os", server.url())),
    )
}

/// Everything remote fails; sources degrade to empty contributions
async fn mock_all_down(server: &mut mockito::Server) {
    server
        .mock("GET", Matcher::Any)
        .with_status(500)
        .expect_at_least(0)
        .create_async()
        .await;
}

#[tokio::test]
async fn test_p2p_mode_without_credential() {
    let mut server = mockito::Server::new_async().await;
    mock_all_down(&mut server).await;

    let pipeline = StreamPipeline::new(store())
        .with_subtitle_aggregator(mock_subtitles(&server))
        .with_torbox_base_url(server.url());

    let streams = pipeline.streams("series", "pp_onepace:1:1", None).await;

    // All official variants first, then exactly one torrent candidate
    let officials = streams
        .iter()
        .take_while(|s| s.tier == StreamTier::Official)
        .count();
    assert!(officials > 0);
    assert_eq!(streams.len(), officials + 1);

    let torrent = &streams[streams.len() - 1];
    assert_eq!(torrent.tier, StreamTier::P2p);
    assert_eq!(torrent.info_hash.as_deref(), Some(HASH));
    assert_eq!(torrent.title, "📁 Torrent - Romance Dawn 01");
    assert!(streams.iter().all(|s| s.tier != StreamTier::Debrid));
}

#[tokio::test]
async fn test_debrid_mode_uncached_yields_no_fallback() {
    let mut server = mockito::Server::new_async().await;

    // Catch-all first: later mocks take precedence on overlap
    mock_all_down(&mut server).await;
    server
        .mock("GET", "/torrents/instantavailability")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"success":true,"data":{}}"#)
        .create_async()
        .await;

    let pipeline = StreamPipeline::new(store())
        .with_subtitle_aggregator(mock_subtitles(&server))
        .with_torbox_base_url(server.url());

    let streams = pipeline
        .streams("series", "pp_onepace:1:1", Some("api-key"))
        .await;

    // Officials only: the uncached torrent drops without a P2P substitute
    assert!(!streams.is_empty());
    assert!(streams.iter().all(|s| s.tier == StreamTier::Official));
}

#[tokio::test]
async fn test_debrid_mode_cached_replaces_p2p() {
    let mut server = mockito::Server::new_async().await;
    mock_all_down(&mut server).await;

    server
        .mock("GET", "/torrents/instantavailability")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(
            r#"{{"success":true,"data":{{"{HASH}":[{{"name":"f.mkv"}}]}}}}"#
        ))
        .create_async()
        .await;
    server
        .mock("GET", "/torrents/mylist")
        .with_status(200)
        .with_body(format!(
            r#"{{"success":true,"data":[{{"id":5,"hash":"{HASH}"}}]}}"#
        ))
        .create_async()
        .await;
    server
        .mock("GET", "/torrents/requestdl")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"success":true,"data":[
                {"download":"https://cdn.example/ep.720p.mkv","name":"ep.720p.mkv","size":700}
            ]}"#,
        )
        .create_async()
        .await;

    let pipeline = StreamPipeline::new(store())
        .with_subtitle_aggregator(mock_subtitles(&server))
        .with_torbox_base_url(server.url());

    let streams = pipeline
        .streams("series", "pp_onepace:1:1", Some("api-key"))
        .await;

    let debrid: Vec<_> = streams
        .iter()
        .filter(|s| s.tier == StreamTier::Debrid)
        .collect();
    assert_eq!(debrid.len(), 1);
    assert_eq!(
        debrid[0].url.as_deref(),
        Some("https://cdn.example/ep.720p.mkv")
    );
    assert!(streams.iter().all(|s| s.tier != StreamTier::P2p));

    // Ordering: every official candidate precedes the debrid one
    let first_non_official = streams
        .iter()
        .position(|s| s.tier != StreamTier::Official)
        .unwrap();
    assert!(streams[first_non_official..]
        .iter()
        .all(|s| s.tier != StreamTier::Official));
}

#[tokio::test]
async fn test_unknown_id_and_media_type_yield_empty() {
    let mut server = mockito::Server::new_async().await;
    mock_all_down(&mut server).await;

    let pipeline = StreamPipeline::new(store())
        .with_subtitle_aggregator(mock_subtitles(&server))
        .with_torbox_base_url(server.url());

    // Wrong media type short-circuits before resolution
    assert!(pipeline.streams("movie", "pp_onepace:1:1", None).await.is_empty());
    // Compound id pointing at a missing episode
    assert!(pipeline.streams("series", "pp_onepace:9:9", None).await.is_empty());
    // Malformed compound id
    assert!(pipeline.streams("series", "pp_onepace:1", None).await.is_empty());
    // Bare token with no catalog entry or stored streams
    assert!(pipeline.streams("series", "foo", None).await.is_empty());
}

#[tokio::test]
async fn test_subtitles_attached_to_every_candidate() {
    let mut server = mockito::Server::new_async().await;
    mock_all_down(&mut server).await;

    server
        .mock("GET", "/contents/RO_1")
        .with_status(200)
        .with_body(
            r#"[{"name":"RO_1 English Subtitles.srt","type":"file","download_url":"https://raw.example/RO_1.srt"}]"#,
        )
        .create_async()
        .await;

    let pipeline = StreamPipeline::new(store())
        .with_subtitle_aggregator(mock_subtitles(&server))
        .with_torbox_base_url(server.url());

    let streams = pipeline.streams("series", "pp_onepace:1:1", None).await;
    assert!(!streams.is_empty());
    for stream in &streams {
        assert!(
            stream
                .subtitles
                .iter()
                .any(|s| s.url == "https://raw.example/RO_1.srt"),
            "missing aggregated subtitle on {}",
            stream.title
        );
    }
}
