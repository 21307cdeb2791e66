//! Genius API client layer.
//!
//! The server never talks to Genius directly. It goes through two traits:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           Credential Gate               │
//! └────────────────────┬────────────────────┘
//!                      │ token
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         GeniusConnector Trait           │
//! │   (builds one client per credential)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           GeniusApi Trait               │
//! │  (song, artist, album, search calls)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │   HttpGeniusClient (reqwest + lyrics    │
//! │   page scraping)                        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Tests substitute their own implementations of both traits.

mod client;
mod lyrics;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::GeniusError;

pub use client::{HttpGeniusClient, HttpGeniusConnector, DEFAULT_API_BASE_URL, DEFAULT_WEB_BASE_URL};
pub use lyrics::extract_lyrics;

// =============================================================================
// Traits
// =============================================================================

/// Operations exposed by a client bound to one credential.
///
/// Implementations must be safe to share between concurrent requests: in
/// fixed-credential deployments a single instance serves the whole process.
#[async_trait]
pub trait GeniusApi: Send + Sync {
    /// Find the best song match for a title and artist, with lyrics.
    async fn search_song(&self, title: &str, artist: &str) -> Result<Song, GeniusError>;

    /// Annotations for a song as `[[fragment, [annotation, ...]], ...]`.
    async fn song_annotations(&self, song_id: u64) -> Result<Value, GeniusError>;

    /// Comment listing for a song.
    async fn song_comments(&self, song_id: u64) -> Result<Value, GeniusError>;

    /// Full-text search by lyric fragment.
    async fn search_lyrics(&self, lyrics: &str) -> Result<Value, GeniusError>;

    /// Find an artist by name, collecting at most `max_songs` of their most
    /// popular songs. Songs carry their listing record, not the full record.
    async fn search_artist(&self, name: &str, max_songs: usize) -> Result<Artist, GeniusError>;

    /// Album search. The payload is grouped in `sections[].hits[]`.
    async fn search_albums(&self, search_term: &str) -> Result<Value, GeniusError>;

    /// Album record, wrapped as `{"album": {...}}`.
    async fn album(&self, album_id: &str) -> Result<Value, GeniusError>;

    /// Track listing for an album.
    async fn album_tracks(&self, album_id: &str) -> Result<Value, GeniusError>;

    /// Cover art listing for an album, wrapped as `{"cover_arts": [...]}`.
    async fn album_cover_arts(&self, album_id: &str) -> Result<Value, GeniusError>;
}

/// Builds a [`GeniusApi`] client from a bearer credential.
#[async_trait]
pub trait GeniusConnector: Send + Sync {
    /// The client type this connector produces.
    type Client: GeniusApi + 'static;

    /// Construct a client bound to `access_token`.
    async fn connect(&self, access_token: &str) -> Result<Self::Client, GeniusError>;
}

// =============================================================================
// Records
// =============================================================================

/// A song together with its scraped lyrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub url: String,
    pub lyrics: String,
    /// The record as returned by Genius
    pub info: Map<String, Value>,
}

impl Song {
    /// Build a song from a Genius song record.
    pub fn from_record(info: Map<String, Value>, lyrics: String) -> Result<Self, GeniusError> {
        let id = info
            .get("id")
            .and_then(Value::as_u64)
            .ok_or(GeniusError::MissingField("song.id"))?;
        let title = string_field(&info, "title");
        let url = string_field(&info, "url");
        let artist = info
            .get("primary_artist")
            .and_then(|a| a.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            id,
            title,
            artist,
            url,
            lyrics,
            info,
        })
    }

    /// The Genius record with a `lyrics` entry added.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.info.clone();
        map.insert("lyrics".to_string(), Value::String(self.lyrics.clone()));
        map
    }
}

/// An artist and the songs collected while searching for them.
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: u64,
    pub name: String,
    pub info: Map<String, Value>,
    pub songs: Vec<Song>,
}

impl Artist {
    /// Build an artist from a Genius artist record.
    pub fn from_record(info: Map<String, Value>, songs: Vec<Song>) -> Result<Self, GeniusError> {
        let id = info
            .get("id")
            .and_then(Value::as_u64)
            .ok_or(GeniusError::MissingField("artist.id"))?;
        let name = string_field(&info, "name");

        Ok(Self {
            id,
            name,
            info,
            songs,
        })
    }

    /// The Genius record with a `songs` entry holding each song's map.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.info.clone();
        let songs = self
            .songs
            .iter()
            .map(|song| Value::Object(song.to_map()))
            .collect();
        map.insert("songs".to_string(), Value::Array(songs));
        map
    }
}

fn string_field(info: &Map<String, Value>, key: &str) -> String {
    info.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// =============================================================================
// Tests
// =============================================================================
