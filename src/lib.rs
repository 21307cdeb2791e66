//! # Genius Plugin
//!
//! An HTTP gateway that lets a chat assistant query Genius for song lyrics,
//! annotations, comments and artist and album data.
//!
//! ## Features
//!
//! - **Credential gate**: either a per-request bearer token or one fixed
//!   startup token, chosen at deployment time
//! - **Plugin API**: fourteen GET endpoints, each returning a single-field JSON object
//! - **OpenAPI schema**: derived from the handlers with utoipa and served as YAML or JSON
//! - **Static mounts**: plugin manifest under `/.well-known`, assets under `/assets`
//!
//! ## Architecture
//!
//! - [`genius`] - Genius API client and the connector trait
//! - [`server`] - Axum-based HTTP server, gate and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use genius_plugin::{create_router, CredentialStrategy, HttpGeniusConnector, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let strategy = CredentialStrategy::per_request(HttpGeniusConnector::new()?);
//!     let router = create_router(strategy, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod genius;
pub mod server;

// Re-export commonly used types
pub use config::{Cli, Command, CredentialMode, SchemaConfig, SchemaFormat, ServeConfig};
pub use error::{ApiError, GeniusError};
pub use genius::{
    extract_lyrics, Artist, GeniusApi, GeniusConnector, HttpGeniusClient, HttpGeniusConnector,
    Song,
};
pub use server::{
    build_document, create_router, AppState, ApiSchema, AuthError, ClientHandle, CredentialStrategy,
    RouterConfig, ValidationError,
};
