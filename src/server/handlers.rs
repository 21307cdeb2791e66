//! HTTP request handlers for the plugin API.
//!
//! Each handler takes the request's Genius client from extensions (attached by
//! the credential gate), performs one or two client calls and projects the
//! result into a single-field JSON object.
//!
//! # Endpoints
//!
//! - `GET /` - Welcome message
//! - `GET /lyrics`, `/annotations`, `/comments`, `/metadata` - Song lookups
//! - `GET /find-by-lyrics` - Lyric fragment search
//! - `GET /artist-id`, `/artist-metadata`, `/artist-top-songs` - Artist lookups
//! - `GET /album-id`, `/album-id-by-song`, `/album-metadata`, `/album-tracks`,
//!   `/album-art` - Album lookups
//! - `GET /openapi.yaml`, `/openapi.json` - API schema

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};
use utoipa::openapi::OpenApi;
use utoipa::{IntoParams, ToSchema};

use super::auth::ClientHandle;
use super::openapi::ApiSchema;
use crate::error::{ApiError, GeniusError};
use crate::genius::GeniusApi;

/// Fields removed from artist records before they are returned.
pub const ARTIST_HIDDEN_FIELDS: &[&str] = &["songs", "description_annotation"];

/// Fields removed from album records before they are returned.
pub const ALBUM_HIDDEN_FIELDS: &[&str] = &["description_annotation", "song_performances", "cover_arts"];

/// Songs fetched when only the artist record is needed.
pub const ARTIST_LOOKUP_SONGS: usize = 1;

/// Songs fetched for the top songs listing.
pub const ARTIST_TOP_SONGS: usize = 5;

pub const WELCOME_MESSAGE: &str = "Welcome to the ChatGPT Genius Plugin!";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Genius clients are not part of it: they travel in request extensions.
#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<ApiSchema>,
}

impl AppState {
    pub fn new(schema: ApiSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ApiSchema::new())
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters identifying a song.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SongQuery {
    pub song_name: String,
    pub artist_name: String,
}

/// Query parameters for lyric search.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LyricsQuery {
    pub lyrics: String,
}

/// Query parameters identifying an artist.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArtistQuery {
    pub artist_name: String,
}

/// Query parameters identifying an album by name.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlbumQuery {
    pub album_name: String,
    pub artist_name: String,
}

/// Query parameters identifying an album by Genius id.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlbumIdQuery {
    pub album_id: String,
}

/// Query string extractor that rejects with 422 and a JSON `detail`.
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::new(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Body of a 422 response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationError {
    pub detail: String,
}

impl ValidationError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LyricsResponse {
    pub lyrics: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnnotationsResponse {
    #[schema(value_type = Object)]
    pub annotations: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentsResponse {
    #[schema(value_type = Object)]
    pub comments: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetadataResponse {
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResultsResponse {
    #[schema(value_type = Object)]
    pub search_results: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArtistIdResponse {
    pub artist_id: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArtistMetadataResponse {
    #[schema(value_type = Object)]
    pub artist: Map<String, Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopSongsResponse {
    #[schema(value_type = Object)]
    pub top_songs: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlbumIdResponse {
    #[schema(value_type = Object)]
    pub album_id: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlbumMetadataResponse {
    #[schema(value_type = Object)]
    pub album: Map<String, Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TracksResponse {
    #[schema(value_type = Object)]
    pub tracks: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlbumArtResponse {
    #[schema(value_type = Object)]
    pub album_art: Value,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ApiError to HTTP response.
///
/// Upstream failures are not classified: the caller always sees a bare 500
/// and the cause is logged.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            ApiError::Upstream(GeniusError::NotFound(_)) => "not_found",
            ApiError::Upstream(GeniusError::RateLimited(_)) => "rate_limited",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Projection(_) => "projection_error",
            ApiError::Schema(_) => "schema_error",
        };

        error!(
            error_type = error_type,
            status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            "Server error: {}",
            self
        );

        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        debug!(
            status = StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
            "Invalid query: {}", self.detail
        );

        (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response()
    }
}

// =============================================================================
// Projections
// =============================================================================

/// Remove `fields` from a record, ignoring those that are absent.
pub fn strip_fields(mut record: Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    for field in fields {
        record.remove(*field);
    }
    record
}

/// Search term used for album lookups: `"{name} {artist_name}"`.
pub fn album_search_term(name: &str, artist_name: &str) -> String {
    format!("{} {}", name, artist_name)
}

/// Id of the first hit of the first section of an album search.
pub fn first_album_hit_id(search_results: &Value) -> Result<Value, ApiError> {
    project(search_results, "/sections/0/hits/0/result/id")
}

/// Image URL of the first cover art in a cover art listing.
pub fn first_cover_art_url(cover_arts: &Value) -> Result<Value, ApiError> {
    project(cover_arts, "/cover_arts/0/image_url")
}

fn project(value: &Value, pointer: &str) -> Result<Value, ApiError> {
    value
        .pointer(pointer)
        .cloned()
        .ok_or_else(|| ApiError::Projection(pointer.to_string()))
}

fn take_object(mut value: Value, key: &str) -> Result<Map<String, Value>, ApiError> {
    match value.get_mut(key).map(Value::take) {
        Some(Value::Object(record)) => Ok(record),
        _ => Err(ApiError::Projection(key.to_string())),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle welcome requests.
///
/// # Endpoint
///
/// `GET /`
///
/// Always public; doubles as the health check.
#[utoipa::path(
    get,
    path = "/",
    operation_id = "health_check",
    summary = "Health Check",
    responses(
        (status = 200, description = "Successful Response", body = WelcomeResponse)
    )
)]
pub async fn welcome_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// `GET /lyrics?song_name=&artist_name=`
#[utoipa::path(
    get,
    path = "/lyrics",
    operation_id = "get_lyrics",
    summary = "Get song lyrics",
    description = "Get song lyrics for a given song name. May optionally specify artist name.",
    params(SongQuery),
    responses(
        (status = 200, description = "Successful Response", body = LyricsResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn lyrics_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<SongQuery>,
) -> Result<Json<LyricsResponse>, ApiError> {
    let song = genius
        .search_song(&query.song_name, &query.artist_name)
        .await?;

    Ok(Json(LyricsResponse {
        lyrics: song.lyrics,
    }))
}

/// `GET /annotations?song_name=&artist_name=`
#[utoipa::path(
    get,
    path = "/annotations",
    operation_id = "get_annotations",
    summary = "Get song annotations",
    description = "Get song annotations for a given song name. May optionally specify artist name.",
    params(SongQuery),
    responses(
        (status = 200, description = "Successful Response", body = AnnotationsResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn annotations_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<SongQuery>,
) -> Result<Json<AnnotationsResponse>, ApiError> {
    let song = genius
        .search_song(&query.song_name, &query.artist_name)
        .await?;
    let annotations = genius.song_annotations(song.id).await?;

    Ok(Json(AnnotationsResponse { annotations }))
}

/// `GET /comments?song_name=&artist_name=`
#[utoipa::path(
    get,
    path = "/comments",
    operation_id = "get_comments",
    summary = "Get song comments",
    description = "Get song comments for a given song name. May optionally specify artist name.",
    params(SongQuery),
    responses(
        (status = 200, description = "Successful Response", body = CommentsResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn comments_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<SongQuery>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let song = genius
        .search_song(&query.song_name, &query.artist_name)
        .await?;
    let comments = genius.song_comments(song.id).await?;

    Ok(Json(CommentsResponse { comments }))
}

/// `GET /metadata?song_name=&artist_name=`
#[utoipa::path(
    get,
    path = "/metadata",
    operation_id = "get_metadata",
    summary = "Get song metadata",
    description = "Get song metadata for a given song name. May optionally specify artist name.",
    params(SongQuery),
    responses(
        (status = 200, description = "Successful Response", body = MetadataResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn metadata_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<SongQuery>,
) -> Result<Json<MetadataResponse>, ApiError> {
    let song = genius
        .search_song(&query.song_name, &query.artist_name)
        .await?;

    Ok(Json(MetadataResponse {
        metadata: song.to_map(),
    }))
}

/// `GET /find-by-lyrics?lyrics=`
#[utoipa::path(
    get,
    path = "/find-by-lyrics",
    operation_id = "find_by_lyrics",
    summary = "Find song by lyrics",
    description = "Find song by lyrics",
    params(LyricsQuery),
    responses(
        (status = 200, description = "Successful Response", body = SearchResultsResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn find_by_lyrics_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<LyricsQuery>,
) -> Result<Json<SearchResultsResponse>, ApiError> {
    let search_results = genius.search_lyrics(&query.lyrics).await?;

    Ok(Json(SearchResultsResponse { search_results }))
}

/// `GET /artist-id?artist_name=`
#[utoipa::path(
    get,
    path = "/artist-id",
    operation_id = "get_artist_id",
    summary = "Get artist id",
    description = "Get artist id for a given artist name.",
    params(ArtistQuery),
    responses(
        (status = 200, description = "Successful Response", body = ArtistIdResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn artist_id_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<ArtistQuery>,
) -> Result<Json<ArtistIdResponse>, ApiError> {
    let artist = genius
        .search_artist(&query.artist_name, ARTIST_LOOKUP_SONGS)
        .await?;

    Ok(Json(ArtistIdResponse {
        artist_id: artist.id,
    }))
}

/// `GET /artist-metadata?artist_name=`
///
/// The record is returned without its song list and description annotation.
#[utoipa::path(
    get,
    path = "/artist-metadata",
    operation_id = "get_artist_metadata",
    summary = "Get artist metadata",
    description = "Get artist metadata for a given artist name.",
    params(ArtistQuery),
    responses(
        (status = 200, description = "Successful Response", body = ArtistMetadataResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn artist_metadata_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<ArtistQuery>,
) -> Result<Json<ArtistMetadataResponse>, ApiError> {
    let artist = genius
        .search_artist(&query.artist_name, ARTIST_LOOKUP_SONGS)
        .await?;

    Ok(Json(ArtistMetadataResponse {
        artist: strip_fields(artist.to_map(), ARTIST_HIDDEN_FIELDS),
    }))
}

/// `GET /artist-top-songs?artist_name=`
#[utoipa::path(
    get,
    path = "/artist-top-songs",
    operation_id = "get_artist_top_songs",
    summary = "Get artist's top songs",
    description = "Get artist's top songs for a given artist name.",
    params(ArtistQuery),
    responses(
        (status = 200, description = "Successful Response", body = TopSongsResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn artist_top_songs_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<ArtistQuery>,
) -> Result<Json<TopSongsResponse>, ApiError> {
    let artist = genius
        .search_artist(&query.artist_name, ARTIST_TOP_SONGS)
        .await?;
    let top_songs = artist
        .to_map()
        .remove("songs")
        .ok_or_else(|| ApiError::Projection("songs".to_string()))?;

    Ok(Json(TopSongsResponse { top_songs }))
}

/// `GET /album-id?album_name=&artist_name=`
#[utoipa::path(
    get,
    path = "/album-id",
    operation_id = "get_album_id",
    summary = "Get album id",
    description = "Get album id for a given album name. May optionally specify artist name.",
    params(AlbumQuery),
    responses(
        (status = 200, description = "Successful Response", body = AlbumIdResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn album_id_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<AlbumQuery>,
) -> Result<Json<AlbumIdResponse>, ApiError> {
    let search_term = album_search_term(&query.album_name, &query.artist_name);
    let search_results = genius.search_albums(&search_term).await?;

    Ok(Json(AlbumIdResponse {
        album_id: first_album_hit_id(&search_results)?,
    }))
}

/// `GET /album-metadata?album_id=`
///
/// The album record is returned without its description annotation, song
/// performances and cover arts.
#[utoipa::path(
    get,
    path = "/album-metadata",
    operation_id = "get_album_metadata",
    summary = "Get album metadata",
    description = "Get album metadata for a given id.",
    params(AlbumIdQuery),
    responses(
        (status = 200, description = "Successful Response", body = AlbumMetadataResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn album_metadata_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<AlbumIdQuery>,
) -> Result<Json<AlbumMetadataResponse>, ApiError> {
    let response = genius.album(&query.album_id).await?;
    let album = take_object(response, "album")?;

    Ok(Json(AlbumMetadataResponse {
        album: strip_fields(album, ALBUM_HIDDEN_FIELDS),
    }))
}

/// `GET /album-tracks?album_id=`
#[utoipa::path(
    get,
    path = "/album-tracks",
    operation_id = "get_album_tracks",
    summary = "Get album tracks",
    description = "Get album tracks for a given album id.",
    params(AlbumIdQuery),
    responses(
        (status = 200, description = "Successful Response", body = TracksResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn album_tracks_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<AlbumIdQuery>,
) -> Result<Json<TracksResponse>, ApiError> {
    let tracks = genius.album_tracks(&query.album_id).await?;

    Ok(Json(TracksResponse { tracks }))
}

/// `GET /album-art?album_id=`
#[utoipa::path(
    get,
    path = "/album-art",
    operation_id = "get_album_art",
    summary = "Get album art image url",
    description = "Get album art image url for a given album id.",
    params(AlbumIdQuery),
    responses(
        (status = 200, description = "Successful Response", body = AlbumArtResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn album_art_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<AlbumIdQuery>,
) -> Result<Json<AlbumArtResponse>, ApiError> {
    let cover_arts = genius.album_cover_arts(&query.album_id).await?;

    Ok(Json(AlbumArtResponse {
        album_art: first_cover_art_url(&cover_arts)?,
    }))
}

/// `GET /album-id-by-song?song_name=&artist_name=`
#[utoipa::path(
    get,
    path = "/album-id-by-song",
    operation_id = "get_album_by_song",
    summary = "Get album id by song",
    description = "Get album id for a given song name. May optionally specify artist name.",
    params(SongQuery),
    responses(
        (status = 200, description = "Successful Response", body = AlbumIdResponse),
        (status = 422, description = "Validation Error", body = ValidationError)
    )
)]
pub async fn album_id_by_song_handler<G: GeniusApi + 'static>(
    Extension(genius): Extension<ClientHandle<G>>,
    QueryParams(query): QueryParams<SongQuery>,
) -> Result<Json<AlbumIdResponse>, ApiError> {
    let search_term = album_search_term(&query.song_name, &query.artist_name);
    let search_results = genius.search_albums(&search_term).await?;

    Ok(Json(AlbumIdResponse {
        album_id: first_album_hit_id(&search_results)?,
    }))
}

/// Handle YAML schema requests.
///
/// # Endpoint
///
/// `GET /openapi.yaml`
///
/// # Response
///
/// `200 OK` with `Content-Type: text/yaml`. The body is rendered on the first
/// request and served from memory afterwards.
pub async fn openapi_yaml_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let yaml = state.schema.yaml().await?;

    Ok(([(header::CONTENT_TYPE, "text/yaml")], yaml).into_response())
}

/// `GET /openapi.json`
pub async fn openapi_json_handler(State(state): State<AppState>) -> Json<OpenApi> {
    Json(state.schema.document().clone())
}

// =============================================================================
// Tests
// =============================================================================
