//! OpenAPI schema for the plugin API.
//!
//! The assistant discovers the plugin's operations through this document, so
//! every summary and description on the handlers is user-facing.
//!
//! Operations are collected from the `#[utoipa::path]` attributes in
//! [`handlers`](super::handlers) by [`ApiDoc`]. The YAML rendering served at
//! `/openapi.yaml` is computed on first request and reused for the lifetime
//! of the process.

use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::debug;
use utoipa::openapi::OpenApi as OpenApiDocument;
use utoipa::OpenApi;

use super::handlers;
use crate::error::ApiError;

pub const API_TITLE: &str = "ChatGPT Genius Plugin";

pub const API_VERSION: &str = "0.0.1";

pub const API_DESCRIPTION: &str = "Use the Genius API to search for song lyrics, discover song meanings and trivia using annotations, get artist and album data, and write song parodies";

// =============================================================================
// Document
// =============================================================================

/// Every documented operation.
///
/// `/openapi.yaml` and `/openapi.json` carry no path attribute and stay out of
/// the document.
#[derive(OpenApi)]
#[openapi(paths(
    handlers::welcome_handler,
    handlers::lyrics_handler,
    handlers::annotations_handler,
    handlers::comments_handler,
    handlers::metadata_handler,
    handlers::find_by_lyrics_handler,
    handlers::artist_id_handler,
    handlers::artist_metadata_handler,
    handlers::artist_top_songs_handler,
    handlers::album_id_handler,
    handlers::album_metadata_handler,
    handlers::album_tracks_handler,
    handlers::album_art_handler,
    handlers::album_id_by_song_handler,
))]
pub struct ApiDoc;

/// Build the OpenAPI document from [`ApiDoc`] with the plugin's info block.
///
/// The derive fills `info` from the crate manifest; the plugin publishes its
/// own title and version instead.
pub fn build_document() -> OpenApiDocument {
    let mut doc = ApiDoc::openapi();
    doc.info.title = API_TITLE.to_string();
    doc.info.version = API_VERSION.to_string();
    doc.info.description = Some(API_DESCRIPTION.to_string());
    doc.info.contact = None;
    doc.info.license = None;
    doc
}

// =============================================================================
// Schema Holder
// =============================================================================

/// The API document plus its lazily rendered YAML form.
pub struct ApiSchema {
    document: OpenApiDocument,
    yaml: OnceCell<Bytes>,
}

impl ApiSchema {
    pub fn new() -> Self {
        Self {
            document: build_document(),
            yaml: OnceCell::new(),
        }
    }

    pub fn document(&self) -> &OpenApiDocument {
        &self.document
    }

    /// YAML rendering of the document.
    ///
    /// Rendered once; concurrent first callers wait for the same value.
    pub async fn yaml(&self) -> Result<Bytes, ApiError> {
        let rendered = self
            .yaml
            .get_or_try_init(|| async {
                debug!("Rendering OpenAPI YAML");
                serde_yaml::to_string(&self.document)
                    .map(Bytes::from)
                    .map_err(|e| ApiError::Schema(e.to_string()))
            })
            .await?;

        Ok(rendered.clone())
    }
}

impl Default for ApiSchema {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
