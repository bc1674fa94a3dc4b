//! Addon HTTP surface
//!
//! Serves the Stremio addon protocol over axum: manifest, catalog, meta
//! and stream endpoints, each also reachable behind a user-config path
//! segment (`/torbox=KEY/...`) that carries the debrid credential. All
//! responses are JSON with permissive CORS so Stremio clients can install
//! the addon from any origin.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::{MetadataStore, SERIES_ID};
use crate::pipeline::StreamPipeline;

/// Config path segment carrying a debrid API key, e.g. "torbox=abc-123"
static CONFIG_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^torbox=([A-Za-z0-9-]+)$").unwrap());

/// Shared request state
pub struct AppState {
    pipeline: StreamPipeline,
    store: Arc<MetadataStore>,
    manifest: Value,
    /// Credential from config/env, used when the URL carries none
    default_credential: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<MetadataStore>,
        pipeline: StreamPipeline,
        default_credential: Option<String>,
    ) -> Self {
        Self {
            pipeline,
            manifest: build_manifest(&store),
            store,
            default_credential,
        }
    }
}

/// Addon manifest, advertised identically with and without a config prefix
fn build_manifest(store: &MetadataStore) -> Value {
    json!({
        "id": "com.pacestream.onepace",
        "version": env!("CARGO_PKG_VERSION"),
        "name": "PaceStream",
        "description": format!(
            "One Pace episodes with official, debrid and torrent streams ({} episodes)",
            store.episode_count()
        ),
        "types": ["series"],
        "catalogs": [{
            "type": "series",
            "id": SERIES_ID,
            "name": "One Pace",
        }],
        "resources": ["catalog", "meta", "stream"],
        "idPrefixes": [SERIES_ID],
        "behaviorHints": {
            "configurable": true,
            "configurationRequired": false,
        },
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/manifest.json", get(manifest))
        .route("/catalog/:media_type/:id", get(catalog))
        .route("/meta/:media_type/:id", get(meta))
        .route("/stream/:media_type/:id", get(stream))
        .route("/:config/manifest.json", get(manifest_configured))
        .route("/:config/catalog/:media_type/:id", get(catalog_configured))
        .route("/:config/meta/:media_type/:id", get(meta_configured))
        .route("/:config/stream/:media_type/:id", get(stream_configured))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "addon listening");
    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}

/// Extract the debrid key from a config path segment, if it is one
fn credential_from_config(config: &str) -> Option<String> {
    CONFIG_SEGMENT
        .captures(config)
        .map(|caps| caps[1].to_string())
}

/// Trailing ".json" that Stremio appends to resource ids
fn strip_json_suffix(id: &str) -> &str {
    id.strip_suffix(".json").unwrap_or(id)
}

// =============================================================================
// Handlers
// =============================================================================

async fn landing() -> Html<String> {
    Html(format!(
        "<html><body style=\"font-family: sans-serif\">\
         <h1>PaceStream</h1>\
         <p>One Pace addon for Stremio, v{}.</p>\
         <p>Install: <code>/manifest.json</code> \
         or <code>/torbox=YOUR_API_KEY/manifest.json</code></p>\
         </body></html>",
        env!("CARGO_PKG_VERSION")
    ))
}

async fn manifest(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.manifest.clone())
}

async fn manifest_configured(
    State(state): State<Arc<AppState>>,
    Path(_config): Path<String>,
) -> Json<Value> {
    Json(state.manifest.clone())
}

async fn catalog(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Json<Value> {
    catalog_response(&state, &media_type, strip_json_suffix(&id))
}

async fn catalog_configured(
    State(state): State<Arc<AppState>>,
    Path((_config, media_type, id)): Path<(String, String, String)>,
) -> Json<Value> {
    catalog_response(&state, &media_type, strip_json_suffix(&id))
}

fn catalog_response(state: &AppState, media_type: &str, id: &str) -> Json<Value> {
    if media_type != "series" || id != SERIES_ID {
        return Json(json!({ "metas": [] }));
    }
    Json(state.store.catalog())
}

async fn meta(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Json<Value> {
    meta_response(&state, &media_type, strip_json_suffix(&id))
}

async fn meta_configured(
    State(state): State<Arc<AppState>>,
    Path((_config, media_type, id)): Path<(String, String, String)>,
) -> Json<Value> {
    meta_response(&state, &media_type, strip_json_suffix(&id))
}

fn meta_response(state: &AppState, media_type: &str, id: &str) -> Json<Value> {
    if media_type != "series" || id != SERIES_ID {
        return Json(json!({ "meta": {} }));
    }
    Json(state.store.meta())
}

async fn stream(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Json<Value> {
    stream_response(&state, &media_type, strip_json_suffix(&id), None).await
}

async fn stream_configured(
    State(state): State<Arc<AppState>>,
    Path((config, media_type, id)): Path<(String, String, String)>,
) -> Json<Value> {
    let credential = credential_from_config(&config);
    stream_response(&state, &media_type, strip_json_suffix(&id), credential).await
}

async fn stream_response(
    state: &AppState,
    media_type: &str,
    id: &str,
    path_credential: Option<String>,
) -> Json<Value> {
    // URL-carried credential wins over the configured default
    let credential = path_credential.or_else(|| state.default_credential.clone());
    let streams = state
        .pipeline
        .streams(media_type, id, credential.as_deref())
        .await;
    Json(json!({ "streams": streams }))
}
