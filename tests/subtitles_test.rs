//! Integration tests for subtitle aggregation against mock servers

use mockito::Matcher;
use pacestream::api::opensubtitles::OpenSubtitlesClient;
use pacestream::api::subs_repo::{OnePaceSubtitleRepo, OFFICIAL_RATING};
use pacestream::models::{EpisodeDescriptor, LanguageSelection, SubtitleSource};
use pacestream::pipeline::SubtitleAggregator;

fn episode() -> EpisodeDescriptor {
    EpisodeDescriptor {
        id: "RO_1".to_string(),
        season: Some(1),
        episode: Some(1),
        title: "Romance Dawn".to_string(),
    }
}

fn contents_entry(name: &str) -> String {
    format!(
        r#"{{"name":"{name}","type":"file","download_url":"https://raw.example/{name}"}}"#
    )
}

fn os_record(file_name: &str, lang: &str, rating: &str, downloads: &str) -> String {
    format!(
        r#"{{"SubDownloadLink":"https://dl.example/{file_name}","SubLanguageID":"{lang}","SubFileName":"{file_name}","SubRating":"{rating}","SubDownloadsCnt":"{downloads}"}}"#
    )
}

#[tokio::test]
async fn test_official_repo_folder_lookup() {
    let mut server = mockito::Server::new_async().await;
    let repo = OnePaceSubtitleRepo::with_base_urls(
        format!("{}/contents", server.url()),
        format!("{}/raw", server.url()),
    );

    server
        .mock("GET", "/contents/RO_1")
        .with_status(200)
        .with_body(format!(
            "[{},{},{}]",
            contents_entry("RO_1 English Subtitles.srt"),
            contents_entry("RO_1.French.srt"),
            contents_entry("RO_1 readme.md")
        ))
        .create_async()
        .await;

    let subs = repo.fetch(&episode(), &LanguageSelection::All).await;
    assert_eq!(subs.len(), 2);
    assert!(subs.iter().all(|s| s.source == SubtitleSource::Official));
    assert!(subs.iter().all(|s| s.rating == OFFICIAL_RATING));
    assert!(subs.iter().any(|s| s.lang == "en"));
    assert!(subs.iter().any(|s| s.lang == "fr"));
}

#[tokio::test]
async fn test_official_repo_language_filter() {
    let mut server = mockito::Server::new_async().await;
    let repo = OnePaceSubtitleRepo::with_base_urls(
        format!("{}/contents", server.url()),
        format!("{}/raw", server.url()),
    );

    server
        .mock("GET", "/contents/RO_1")
        .with_status(200)
        .with_body(format!(
            "[{},{}]",
            contents_entry("RO_1 English Subtitles.srt"),
            contents_entry("RO_1.Spanish.srt")
        ))
        .create_async()
        .await;

    let only_spanish = LanguageSelection::from_codes(Some(vec!["es".to_string()]));
    let subs = repo.fetch(&episode(), &only_spanish).await;
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].lang, "es");
}

#[tokio::test]
async fn test_community_search_scores_and_dedupes() {
    let mut server = mockito::Server::new_async().await;
    let client = OpenSubtitlesClient::with_base_url(server.url());

    // Every strategy returns the same two records; dedupe keeps one of each
    server
        .mock("GET", Matcher::Regex("/sublanguageid-".to_string()))
        .with_status(200)
        .with_body(format!(
            "[{},{}]",
            os_record("One Pace Romance Dawn.srt", "en", "8.0", "5000"),
            os_record("unrelated.srt", "es", "0.0", "2")
        ))
        .expect_at_least(1)
        .create_async()
        .await;

    let subs = client.search(&episode(), &LanguageSelection::All).await;
    assert_eq!(subs.len(), 2);
    // The well-matched popular upload ranks first
    assert!(subs[0].url.contains("One Pace Romance Dawn.srt"));
    assert!(subs.iter().all(|s| s.source == SubtitleSource::Community));
}

#[tokio::test]
async fn test_community_failure_degrades_to_empty() {
    let mut server = mockito::Server::new_async().await;
    let client = OpenSubtitlesClient::with_base_url(server.url());

    server
        .mock("GET", Matcher::Regex("/sublanguageid-".to_string()))
        .with_status(503)
        .expect_at_least(1)
        .create_async()
        .await;

    let subs = client.search(&episode(), &LanguageSelection::All).await;
    assert!(subs.is_empty());
}

#[tokio::test]
async fn test_aggregator_official_first_even_against_popular_community() {
    let mut server = mockito::Server::new_async().await;
    let repo = OnePaceSubtitleRepo::with_base_urls(
        format!("{}/contents", server.url()),
        format!("{}/raw", server.url()),
    );
    let community = OpenSubtitlesClient::with_base_url(format!("{}/os", server.url()));
    let aggregator = SubtitleAggregator::with_clients(repo, community);

    server
        .mock("GET", "/contents/RO_1")
        .with_status(200)
        .with_body(format!("[{}]", contents_entry("RO_1 English Subtitles.srt")))
        .create_async()
        .await;

    server
        .mock("GET", Matcher::Regex("/os/sublanguageid-".to_string()))
        .with_status(200)
        .with_body(format!(
            "[{}]",
            os_record("One Pace Romance Dawn.srt", "en", "9.9", "99999")
        ))
        .expect_at_least(1)
        .create_async()
        .await;

    let subs = aggregator.collect(&episode(), &LanguageSelection::All).await;
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].source, SubtitleSource::Official);
    assert_eq!(subs[0].rating, OFFICIAL_RATING);
    assert_eq!(subs[1].source, SubtitleSource::Community);
    // Community ratings arrive discounted
    assert!(subs[1].rating < 9.9);
}

#[tokio::test]
async fn test_aggregator_survives_both_sources_failing() {
    let mut server = mockito::Server::new_async().await;
    let repo = OnePaceSubtitleRepo::with_base_urls(
        format!("{}/contents", server.url()),
        format!("{}/raw", server.url()),
    );
    let community = OpenSubtitlesClient::with_base_url(format!("{}/os", server.url()));
    let aggregator = SubtitleAggregator::with_clients(repo, community);

    server
        .mock("GET", Matcher::Any)
        .with_status(500)
        .expect_at_least(1)
        .create_async()
        .await;

    let subs = aggregator.collect(&episode(), &LanguageSelection::All).await;
    assert!(subs.is_empty());
}
