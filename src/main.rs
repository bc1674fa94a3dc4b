use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pacestream::api::torbox::TorboxClient;
use pacestream::catalog::MetadataStore;
use pacestream::cli::{Cli, Command};
use pacestream::config::Config;
use pacestream::models::LanguageSelection;
use pacestream::pipeline::StreamPipeline;
use pacestream::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pacestream=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Configure {
            torbox_api_key,
            clear,
        }) => configure(torbox_api_key, clear).await,
        Some(Command::Serve {
            port,
            data_dir,
            torbox_api_key,
        }) => serve(port, data_dir, torbox_api_key).await,
        None => serve(None, None, None).await,
    }
}

async fn serve(
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    torbox_api_key: Option<String>,
) -> Result<()> {
    let config = Config::load();
    let port = port.unwrap_or_else(|| config.resolve_port());
    let data_dir = data_dir
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from("data"));
    let credential = torbox_api_key.or_else(|| config.resolve_api_key());

    let store = Arc::new(MetadataStore::load(&data_dir));
    info!(
        data_dir = %data_dir.display(),
        episodes = store.episode_count(),
        debrid = credential.is_some(),
        "metadata loaded"
    );

    let languages = LanguageSelection::from_codes(if config.subtitle_languages.is_empty() {
        None
    } else {
        Some(config.subtitle_languages.clone())
    });
    let pipeline = StreamPipeline::new(Arc::clone(&store)).with_languages(languages);
    let state = Arc::new(AppState::new(store, pipeline, credential));

    server::serve(state, port).await
}

async fn configure(torbox_api_key: Option<String>, clear: bool) -> Result<()> {
    let mut config = Config::load();

    if clear {
        config.torbox_api_key = None;
        config.save()?;
        println!("TorBox API key removed.");
        return Ok(());
    }

    let Some(key) = torbox_api_key else {
        bail!("pass --torbox-api-key <KEY>, or --clear to remove the stored key");
    };

    let client = TorboxClient::new(key.as_str());
    if !client.verify_key().await {
        warn!("key verification against TorBox failed");
        bail!("the provided TorBox API key was rejected");
    }

    config.torbox_api_key = Some(key);
    config.save()?;
    println!("TorBox API key verified and saved to {}", Config::path()?.display());
    Ok(())
}
