//! Credential gate for the plugin API.
//!
//! Every request passes through [`credential_gate`] before routing reaches a
//! handler. What the gate does depends on the [`CredentialStrategy`] chosen at
//! startup:
//!
//! - **Per-request credential**: the caller sends `Authorization: Bearer <token>`.
//!   The gate builds a fresh Genius client bound to that token and attaches it
//!   to the request. Nothing is cached between requests.
//! - **Fixed credential**: one client built at startup from a configured token
//!   is attached to every request. No header is inspected.
//!
//! Handlers read the attached [`ClientHandle`] from request extensions and
//! never know which strategy produced it.
//!
//! # Public Paths
//!
//! `/`, anything under `/.well-known` and anything under `/assets` skip
//! authentication entirely.
//!
//! # Rejections
//!
//! ```text
//! no header, or empty header      -> 401 "Missing Authorization header"
//! header without "Bearer " prefix -> 401 "Invalid Authorization header"
//! ```

use std::ops::Deref;
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;
use crate::genius::GeniusConnector;

/// Scheme label expected in front of the token, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Path of the health check.
pub const HEALTH_PATH: &str = "/";

/// Prefix of the plugin manifest mount.
pub const MANIFEST_PREFIX: &str = "/.well-known";

/// Prefix of the static assets mount.
pub const ASSETS_PREFIX: &str = "/assets";

// =============================================================================
// Types
// =============================================================================

/// Reasons the gate rejects a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No Authorization header, or an empty one
    #[error("Missing Authorization header")]
    MissingHeader,

    /// Authorization header present but not a bearer credential
    #[error("Invalid Authorization header")]
    InvalidHeader,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        debug!(
            status = StatusCode::UNAUTHORIZED.as_u16(),
            "Authentication failed: {}", self
        );

        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

/// Shared pointer to the Genius client serving a request.
pub struct ClientHandle<G: ?Sized>(Arc<G>);

impl<G> ClientHandle<G> {
    pub fn new(client: G) -> Self {
        Self(Arc::new(client))
    }
}

impl<G: ?Sized> ClientHandle<G> {
    /// Whether two handles point at the same client instance.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }
}

impl<G: ?Sized> Clone for ClientHandle<G> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<G: ?Sized> Deref for ClientHandle<G> {
    type Target = G;

    fn deref(&self) -> &G {
        &self.0
    }
}

/// How requests obtain their Genius client.
///
/// The two variants are separate deployment modes and are never combined.
pub enum CredentialStrategy<C: GeniusConnector> {
    /// One client, built at startup, shared by every request.
    FixedCredential(ClientHandle<C::Client>),

    /// A new client per request, built from the caller's bearer token.
    PerRequestCredential(C),
}

impl<C: GeniusConnector> CredentialStrategy<C> {
    /// Share `client` across all requests.
    pub fn fixed(client: C::Client) -> Self {
        CredentialStrategy::FixedCredential(ClientHandle::new(client))
    }

    /// Authenticate each request and build its client with `connector`.
    pub fn per_request(connector: C) -> Self {
        CredentialStrategy::PerRequestCredential(connector)
    }

    pub fn is_per_request(&self) -> bool {
        matches!(self, CredentialStrategy::PerRequestCredential(_))
    }
}

// =============================================================================
// Header Parsing
// =============================================================================

/// Whether `path` is served without authentication.
pub fn is_public_path(path: &str) -> bool {
    path == HEALTH_PATH || path.starts_with(MANIFEST_PREFIX) || path.starts_with(ASSETS_PREFIX)
}

/// Extract the bearer token from the Authorization header.
///
/// The prefix is removed once; the remainder is returned untouched, even when
/// it is empty or itself contains `"Bearer "`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingHeader),
    };

    value
        .to_str()
        .ok()
        .and_then(|header| header.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::InvalidHeader)
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware resolving the Genius client for each request.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use axum::{middleware, Router};
/// use genius_plugin::server::auth::{credential_gate, CredentialStrategy};
///
/// let strategy = Arc::new(CredentialStrategy::per_request(connector));
/// let app = Router::new()
///     .route("/lyrics", get(lyrics_handler::<HttpGeniusClient>))
///     .layer(middleware::from_fn_with_state(strategy, credential_gate::<HttpGeniusConnector>));
/// ```
pub async fn credential_gate<C>(
    State(strategy): State<Arc<CredentialStrategy<C>>>,
    OriginalUri(original_uri): OriginalUri,
    mut request: Request,
    next: Next,
) -> Response
where
    C: GeniusConnector + 'static,
{
    match strategy.as_ref() {
        CredentialStrategy::FixedCredential(client) => {
            request.extensions_mut().insert(client.clone());
        }
        CredentialStrategy::PerRequestCredential(connector) => {
            if is_public_path(original_uri.path()) {
                return next.run(request).await;
            }

            let token = match extract_bearer_token(request.headers()) {
                Ok(token) => token.to_string(),
                Err(err) => return err.into_response(),
            };

            match connector.connect(&token).await {
                Ok(client) => {
                    request.extensions_mut().insert(ClientHandle::new(client));
                }
                Err(err) => return ApiError::from(err).into_response(),
            }
        }
    }

    next.run(request).await
}

// =============================================================================
// Tests
// =============================================================================
