//! Configuration management for the Genius plugin.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap, with `serve` and `schema` subcommands
//! - Environment variables with `GENIUS_` prefix
//! - Defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `GENIUS_HOST` - Server bind address (default: 0.0.0.0)
//! - `GENIUS_PORT` - Server port (default: 8000)
//! - `GENIUS_CREDENTIAL_MODE` - `per-request` or `fixed` (default: per-request)
//! - `GENIUS_ACCESS_TOKEN` - Genius token used in fixed mode
//! - `GENIUS_API_BASE_URL` - Developer API base (default: https://api.genius.com)
//! - `GENIUS_WEB_BASE_URL` - Web API base (default: https://genius.com/api)
//! - `GENIUS_WELL_KNOWN_DIR` - Manifest directory (default: .well-known)
//! - `GENIUS_ASSETS_DIR` - Static asset directory (default: assets)
//! - `GENIUS_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::genius::{DEFAULT_API_BASE_URL, DEFAULT_WEB_BASE_URL};
use crate::server::{DEFAULT_ASSETS_DIR, DEFAULT_CORS_ORIGIN, DEFAULT_WELL_KNOWN_DIR};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Genius Plugin - Lyrics, annotations and artist data for the assistant.
#[derive(Parser, Debug, Clone)]
#[command(name = "genius-plugin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Print the OpenAPI document and exit.
    Schema(SchemaConfig),
}

/// Where Genius credentials come from.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialMode {
    /// Each request carries its own bearer token.
    #[default]
    PerRequest,

    /// One configured token serves every request.
    Fixed,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaFormat {
    #[default]
    Yaml,
    Json,
}

/// Options for `genius-plugin serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GENIUS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GENIUS_PORT")]
    pub port: u16,

    // =========================================================================
    // Credential Configuration
    // =========================================================================
    /// How requests obtain their Genius credential.
    #[arg(long, value_enum, default_value_t = CredentialMode::PerRequest, env = "GENIUS_CREDENTIAL_MODE")]
    pub credential_mode: CredentialMode,

    /// Genius access token shared by all requests (fixed mode only).
    #[arg(long, env = "GENIUS_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Base URL of the Genius developer API.
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "GENIUS_API_BASE_URL")]
    pub api_base_url: String,

    /// Base URL of the Genius web API.
    #[arg(long, default_value = DEFAULT_WEB_BASE_URL, env = "GENIUS_WEB_BASE_URL")]
    pub web_base_url: String,

    // =========================================================================
    // Static Files
    // =========================================================================
    /// Directory served at /.well-known.
    #[arg(long, default_value = DEFAULT_WELL_KNOWN_DIR, env = "GENIUS_WELL_KNOWN_DIR")]
    pub well_known_dir: PathBuf,

    /// Directory served at /assets.
    #[arg(long, default_value = DEFAULT_ASSETS_DIR, env = "GENIUS_ASSETS_DIR")]
    pub assets_dir: PathBuf,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    #[arg(long, env = "GENIUS_CORS_ORIGINS", value_delimiter = ',', default_value = DEFAULT_CORS_ORIGIN)]
    pub cors_origins: Vec<String>,

    /// Also allow http://localhost:8000 for local testing.
    #[arg(long, default_value_t = false)]
    pub dev: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match (self.credential_mode, self.access_token.as_deref()) {
            (CredentialMode::Fixed, None | Some("")) => {
                return Err(
                    "Fixed credential mode requires a token. \
                     Set --access-token or GENIUS_ACCESS_TOKEN"
                        .to_string(),
                );
            }
            (CredentialMode::PerRequest, Some(token)) if !token.is_empty() => {
                return Err(
                    "An access token is configured but credential mode is per-request. \
                     Use --credential-mode=fixed or unset GENIUS_ACCESS_TOKEN"
                        .to_string(),
                );
            }
            _ => {}
        }

        for (name, value) in [
            ("api_base_url", &self.api_base_url),
            ("web_base_url", &self.web_base_url),
        ] {
            let url = Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", name, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("{} must use http or https", name));
            }
        }

        if self.cors_origins.iter().all(|origin| origin.trim().is_empty()) && !self.dev {
            return Err("At least one CORS origin is required".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configured origins with blanks removed.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Options for `genius-plugin schema`.
#[derive(Args, Debug, Clone)]
pub struct SchemaConfig {
    /// Output format.
    #[arg(long, value_enum, default_value_t = SchemaFormat::Yaml)]
    pub format: SchemaFormat,
}

// =============================================================================
// Tests
// =============================================================================
