//! HTTP implementation of the Genius client.
//!
//! Two API families are used:
//!
//! - the authenticated developer API (`https://api.genius.com`), for search,
//!   songs, artists and referents
//! - the public web API (`https://genius.com/api`), for lyric and album
//!   search, album records and comments
//!
//! Both wrap their payload as `{"meta": {...}, "response": {...}}`; only the
//! `response` member is returned to callers.

use async_trait::async_trait;
use http::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::lyrics::extract_lyrics;
use super::{Artist, GeniusApi, GeniusConnector, Song};
use crate::error::GeniusError;

/// Default base URL of the authenticated developer API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.genius.com";

/// Default base URL of the public web API.
pub const DEFAULT_WEB_BASE_URL: &str = "https://genius.com/api";

/// Page size used for every paginated listing.
const PER_PAGE: usize = 50;

const USER_AGENT: &str = concat!("genius-plugin/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Connector
// =============================================================================

/// Connector producing [`HttpGeniusClient`]s that share one connection pool.
#[derive(Clone)]
pub struct HttpGeniusConnector {
    http: Client,
    api_base_url: String,
    web_base_url: String,
}

impl HttpGeniusConnector {
    /// Create a connector against the public Genius endpoints.
    pub fn new() -> Result<Self, GeniusError> {
        Self::with_base_urls(DEFAULT_API_BASE_URL, DEFAULT_WEB_BASE_URL)
    }

    /// Create a connector against custom base URLs.
    pub fn with_base_urls(
        api_base_url: impl Into<String>,
        web_base_url: impl Into<String>,
    ) -> Result<Self, GeniusError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            api_base_url: trim_base(api_base_url.into()),
            web_base_url: trim_base(web_base_url.into()),
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn web_base_url(&self) -> &str {
        &self.web_base_url
    }
}

#[async_trait]
impl GeniusConnector for HttpGeniusConnector {
    type Client = HttpGeniusClient;

    async fn connect(&self, access_token: &str) -> Result<Self::Client, GeniusError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| GeniusError::InvalidToken)?;
        authorization.set_sensitive(true);

        Ok(HttpGeniusClient {
            http: self.http.clone(),
            authorization,
            api_base_url: self.api_base_url.clone(),
            web_base_url: self.web_base_url.clone(),
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

// =============================================================================
// Client
// =============================================================================

/// A Genius client bound to one access token.
#[derive(Clone)]
pub struct HttpGeniusClient {
    http: Client,
    authorization: HeaderValue,
    api_base_url: String,
    web_base_url: String,
}

#[derive(Clone, Copy, Debug)]
enum Api {
    Developer,
    Web,
}

impl HttpGeniusClient {
    async fn get(
        &self,
        api: Api,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, GeniusError> {
        let url = match api {
            Api::Developer => format!("{}/{}", self.api_base_url, path),
            Api::Web => format!("{}/{}", self.web_base_url, path),
        };
        debug!(api = ?api, path = path, "Genius request");

        let mut request = self.http.get(&url).query(query);
        if let Api::Developer = api {
            request = request.header(AUTHORIZATION, self.authorization.clone());
        }

        let response = check_status(request.send().await?, &url)?;
        let mut body: Value = response.json().await?;

        match body.get_mut("response") {
            Some(inner) => Ok(inner.take()),
            None => Err(GeniusError::MissingField("response")),
        }
    }

    async fn song_page_lyrics(&self, song_url: &str) -> Result<String, GeniusError> {
        if song_url.is_empty() {
            return Ok(String::new());
        }

        debug!(url = song_url, "Fetching song page");
        let response = check_status(self.http.get(song_url).send().await?, song_url)?;
        let html = response.text().await?;

        Ok(extract_lyrics(&html).unwrap_or_default())
    }

    async fn artist_songs(&self, artist_id: u64, max_songs: usize) -> Result<Vec<Song>, GeniusError> {
        let mut songs = Vec::new();
        let mut page = Some(1u64);
        let per_page = max_songs.min(PER_PAGE);

        while let Some(current) = page {
            if songs.len() >= max_songs {
                break;
            }

            let response = self
                .get(
                    Api::Developer,
                    &format!("artists/{}/songs", artist_id),
                    &[
                        ("sort", "popularity".to_string()),
                        ("per_page", per_page.to_string()),
                        ("page", current.to_string()),
                    ],
                )
                .await?;

            let listed = response
                .get("songs")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            for record in listed.into_iter().take(max_songs - songs.len()) {
                let Value::Object(info) = record else {
                    continue;
                };
                let url = info
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let lyrics = self.song_page_lyrics(&url).await?;
                songs.push(Song::from_record(info, lyrics)?);
            }

            page = response.get("next_page").and_then(Value::as_u64);
        }

        Ok(songs)
    }
}

#[async_trait]
impl GeniusApi for HttpGeniusClient {
    async fn search_song(&self, title: &str, artist: &str) -> Result<Song, GeniusError> {
        let search_term = format!("{} {}", title, artist).trim().to_string();
        let response = self
            .get(
                Api::Developer,
                "search",
                &[("q", search_term.clone()), ("per_page", PER_PAGE.to_string())],
            )
            .await?;

        let hits = hits(&response);
        let hit = select_song_hit(&hits, artist)
            .ok_or_else(|| GeniusError::NotFound(format!("song matching '{}'", search_term)))?;
        let song_id = hit
            .get("result")
            .and_then(|r| r.get("id"))
            .and_then(Value::as_u64)
            .ok_or(GeniusError::MissingField("result.id"))?;

        let mut song = self
            .get(
                Api::Developer,
                &format!("songs/{}", song_id),
                &[("text_format", "plain".to_string())],
            )
            .await?;
        let info = match song.get_mut("song").map(Value::take) {
            Some(Value::Object(info)) => info,
            _ => return Err(GeniusError::MissingField("song")),
        };

        let url = info
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let lyrics = self.song_page_lyrics(&url).await?;

        Song::from_record(info, lyrics)
    }

    async fn song_annotations(&self, song_id: u64) -> Result<Value, GeniusError> {
        let mut annotations = Vec::new();
        let mut page = 1u64;

        loop {
            let response = self
                .get(
                    Api::Developer,
                    "referents",
                    &[
                        ("song_id", song_id.to_string()),
                        ("per_page", PER_PAGE.to_string()),
                        ("page", page.to_string()),
                        ("text_format", "plain".to_string()),
                    ],
                )
                .await?;

            let referents = response
                .get("referents")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let count = referents.len();
            annotations.extend(referents.iter().map(referent_annotations));

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(Value::Array(annotations))
    }

    async fn song_comments(&self, song_id: u64) -> Result<Value, GeniusError> {
        self.get(
            Api::Web,
            &format!("songs/{}/comments", song_id),
            &[
                ("per_page", PER_PAGE.to_string()),
                ("text_format", "plain".to_string()),
            ],
        )
        .await
    }

    async fn search_lyrics(&self, lyrics: &str) -> Result<Value, GeniusError> {
        self.get(Api::Web, "search/lyric", &[("q", lyrics.to_string())])
            .await
    }

    async fn search_artist(&self, name: &str, max_songs: usize) -> Result<Artist, GeniusError> {
        let response = self
            .get(
                Api::Developer,
                "search",
                &[("q", name.to_string()), ("per_page", PER_PAGE.to_string())],
            )
            .await?;

        let hits = hits(&response);
        let artist_id = select_artist_id(&hits, name)
            .ok_or_else(|| GeniusError::NotFound(format!("artist matching '{}'", name)))?;

        let mut artist = self
            .get(
                Api::Developer,
                &format!("artists/{}", artist_id),
                &[("text_format", "plain".to_string())],
            )
            .await?;
        let info = match artist.get_mut("artist").map(Value::take) {
            Some(Value::Object(info)) => info,
            _ => return Err(GeniusError::MissingField("artist")),
        };

        let songs = self.artist_songs(artist_id, max_songs).await?;
        Artist::from_record(info, songs)
    }

    async fn search_albums(&self, search_term: &str) -> Result<Value, GeniusError> {
        self.get(Api::Web, "search/album", &[("q", search_term.to_string())])
            .await
    }

    async fn album(&self, album_id: &str) -> Result<Value, GeniusError> {
        self.get(
            Api::Web,
            &format!("albums/{}", urlencoding::encode(album_id)),
            &[("text_format", "plain".to_string())],
        )
        .await
    }

    async fn album_tracks(&self, album_id: &str) -> Result<Value, GeniusError> {
        self.get(
            Api::Web,
            &format!("albums/{}/tracks", urlencoding::encode(album_id)),
            &[
                ("per_page", PER_PAGE.to_string()),
                ("text_format", "plain".to_string()),
            ],
        )
        .await
    }

    async fn album_cover_arts(&self, album_id: &str) -> Result<Value, GeniusError> {
        self.get(
            Api::Web,
            &format!("albums/{}/cover_arts", urlencoding::encode(album_id)),
            &[("text_format", "plain".to_string())],
        )
        .await
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Map a non-success status to the matching [`GeniusError`].
fn check_status(response: Response, url: &str) -> Result<Response, GeniusError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(match status {
        StatusCode::NOT_FOUND => GeniusError::NotFound(url.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GeniusError::Unauthorized(url.to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => GeniusError::RateLimited(url.to_string()),
        _ => GeniusError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        },
    })
}

fn hits(response: &Value) -> Vec<Value> {
    response
        .get("hits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn primary_artist(hit: &Value) -> Option<&Value> {
    hit.get("result").and_then(|r| r.get("primary_artist"))
}

fn primary_artist_matches(hit: &Value, wanted: &str) -> bool {
    primary_artist(hit)
        .and_then(|a| a.get("name"))
        .and_then(Value::as_str)
        .map(|name| normalize(name) == wanted)
        .unwrap_or(false)
}

/// Pick the song hit to use for a search.
///
/// Prefers the first song whose primary artist matches `artist`, falling back
/// to the first song hit.
fn select_song_hit<'a>(hits: &'a [Value], artist: &str) -> Option<&'a Value> {
    let songs: Vec<&Value> = hits
        .iter()
        .filter(|hit| hit.get("type").and_then(Value::as_str) == Some("song"))
        .collect();

    let wanted = normalize(artist);
    if !wanted.is_empty() {
        if let Some(hit) = songs.iter().find(|hit| primary_artist_matches(hit, &wanted)) {
            return Some(hit);
        }
    }

    songs.first().copied()
}

/// Pick the artist id behind an artist-name search.
fn select_artist_id(hits: &[Value], name: &str) -> Option<u64> {
    let wanted = normalize(name);
    let hit = hits
        .iter()
        .find(|hit| primary_artist_matches(hit, &wanted))
        .or_else(|| hits.first())?;

    primary_artist(hit)
        .and_then(|a| a.get("id"))
        .and_then(Value::as_u64)
}

/// Flatten a referent to `[fragment, [annotation body, ...]]`.
fn referent_annotations(referent: &Value) -> Value {
    let fragment = referent
        .get("fragment")
        .cloned()
        .unwrap_or(Value::Null);
    let bodies = referent
        .get("annotations")
        .and_then(Value::as_array)
        .map(|annotations| {
            annotations
                .iter()
                .map(|a| {
                    a.get("body")
                        .and_then(|b| b.get("plain"))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect()
        })
        .unwrap_or_default();

    Value::Array(vec![fragment, Value::Array(bodies)])
}

// =============================================================================
// Tests
// =============================================================================
