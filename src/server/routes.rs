//! Router configuration for the plugin API.
//!
//! This module defines the HTTP routes and applies middleware for the
//! credential gate, CORS and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /                       - Welcome / health check (public)
//! /.well-known/*          - Plugin manifest files (public)
//! /assets/*               - Static assets (public)
//! /lyrics ... /album-art  - Genius-backed endpoints (gated)
//! /openapi.yaml           - OpenAPI document as YAML (gated)
//! /openapi.json           - OpenAPI document as JSON (gated)
//! ```
//!
//! # Layer Order
//!
//! Outermost first: tracing, CORS, credential gate, routing. CORS sits outside
//! the gate so that browser preflights are answered without credentials.
//!
//! # Example
//!
//! ```ignore
//! use genius_plugin::genius::HttpGeniusConnector;
//! use genius_plugin::server::{create_router, CredentialStrategy, RouterConfig};
//!
//! let strategy = CredentialStrategy::per_request(HttpGeniusConnector::new()?);
//! let router = create_router(strategy, RouterConfig::new().with_dev_origin());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::auth::{credential_gate, CredentialStrategy, ASSETS_PREFIX, MANIFEST_PREFIX};
use super::handlers::{
    album_art_handler, album_id_by_song_handler, album_id_handler, album_metadata_handler,
    album_tracks_handler, annotations_handler, artist_id_handler, artist_metadata_handler,
    artist_top_songs_handler, comments_handler, find_by_lyrics_handler, lyrics_handler,
    metadata_handler, openapi_json_handler, openapi_yaml_handler, welcome_handler, AppState,
};
use crate::genius::GeniusConnector;

/// Origin of the assistant web client.
pub const DEFAULT_CORS_ORIGIN: &str = "https://chat.openai.com";

/// Extra origin allowed in development mode.
pub const DEV_CORS_ORIGIN: &str = "http://localhost:8000";

/// Default directory holding `ai-plugin.json`.
pub const DEFAULT_WELL_KNOWN_DIR: &str = ".well-known";

/// Default directory holding static assets.
pub const DEFAULT_ASSETS_DIR: &str = "assets";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,

    /// Directory mounted at `/.well-known`
    pub well_known_dir: PathBuf,

    /// Directory mounted at `/assets`
    pub assets_dir: PathBuf,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with production defaults.
    ///
    /// By default:
    /// - CORS allows only `https://chat.openai.com`
    /// - Static files come from `.well-known` and `assets` in the working directory
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            well_known_dir: PathBuf::from(DEFAULT_WELL_KNOWN_DIR),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            enable_tracing: true,
        }
    }

    /// Replace the allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Also allow the local development origin.
    pub fn with_dev_origin(mut self) -> Self {
        if !self.cors_origins.iter().any(|o| o == DEV_CORS_ORIGIN) {
            self.cors_origins.push(DEV_CORS_ORIGIN.to_string());
        }
        self
    }

    /// Set the directory served at `/.well-known`.
    pub fn with_well_known_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.well_known_dir = dir.into();
        self
    }

    /// Set the directory served at `/assets`.
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `strategy` - How each request obtains its Genius client
/// * `config` - Router configuration
///
/// # Returns
///
/// A configured Axum router ready to be served.
pub fn create_router<C>(strategy: CredentialStrategy<C>, config: RouterConfig) -> Router
where
    C: GeniusConnector + 'static,
{
    let app_state = AppState::default();
    let strategy = Arc::new(strategy);
    let cors = build_cors_layer(&config);

    let router = api_routes::<C>(app_state)
        .nest_service(MANIFEST_PREFIX, ServeDir::new(&config.well_known_dir))
        .nest_service(ASSETS_PREFIX, ServeDir::new(&config.assets_dir))
        .layer(middleware::from_fn_with_state(
            strategy,
            credential_gate::<C>,
        ))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Routes served by handlers, all bound to the connector's client type.
fn api_routes<C>(app_state: AppState) -> Router
where
    C: GeniusConnector + 'static,
{
    Router::new()
        .route("/", get(welcome_handler))
        .route("/lyrics", get(lyrics_handler::<C::Client>))
        .route("/annotations", get(annotations_handler::<C::Client>))
        .route("/comments", get(comments_handler::<C::Client>))
        .route("/metadata", get(metadata_handler::<C::Client>))
        .route("/find-by-lyrics", get(find_by_lyrics_handler::<C::Client>))
        .route("/artist-id", get(artist_id_handler::<C::Client>))
        .route("/artist-metadata", get(artist_metadata_handler::<C::Client>))
        .route("/artist-top-songs", get(artist_top_songs_handler::<C::Client>))
        .route("/album-id", get(album_id_handler::<C::Client>))
        .route("/album-metadata", get(album_metadata_handler::<C::Client>))
        .route("/album-tracks", get(album_tracks_handler::<C::Client>))
        .route("/album-art", get(album_art_handler::<C::Client>))
        .route("/album-id-by-song", get(album_id_by_song_handler::<C::Client>))
        .route("/openapi.yaml", get(openapi_yaml_handler))
        .route("/openapi.json", get(openapi_json_handler))
        .with_state(app_state)
}

/// Build the CORS layer based on configuration.
///
/// Listed origins may send credentials with any method and any headers.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// =============================================================================
// Tests
// =============================================================================
