//! HTTP server layer for the Genius plugin.
//!
//! This module exposes the Genius API to the assistant as a set of GET
//! endpoints, each answering with a single-field JSON object.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │          GET /lyrics?song_name=...&artist_name=...              │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌─────────┐ │
//! │  │  handlers   │  │    auth     │  │   openapi   │  │ routes  │ │
//! │  │ (endpoints) │  │   (gate)    │  │  (schema)   │  │(router) │ │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └─────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod openapi;
pub mod routes;

pub use auth::{
    credential_gate, extract_bearer_token, is_public_path, AuthError, ClientHandle,
    CredentialStrategy,
};
pub use handlers::{
    AppState, QueryParams, ValidationError, ALBUM_HIDDEN_FIELDS, ARTIST_HIDDEN_FIELDS,
};
pub use openapi::{build_document, ApiDoc, ApiSchema};
pub use routes::{
    create_router, RouterConfig, DEFAULT_ASSETS_DIR, DEFAULT_CORS_ORIGIN, DEFAULT_WELL_KNOWN_DIR,
    DEV_CORS_ORIGIN,
};
