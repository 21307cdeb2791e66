//! Genius Plugin - HTTP gateway between the assistant and Genius.
//!
//! This binary starts the HTTP server or prints the API schema.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genius_plugin::{
    config::{Cli, Command, CredentialMode, SchemaConfig, SchemaFormat, ServeConfig},
    genius::{GeniusConnector, HttpGeniusConnector},
    server::{build_document, create_router, CredentialStrategy, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Schema(config) => run_schema(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let connector =
        match HttpGeniusConnector::with_base_urls(&config.api_base_url, &config.web_base_url) {
            Ok(connector) => connector,
            Err(e) => {
                error!("Failed to create Genius HTTP client: {}", e);
                return ExitCode::FAILURE;
            }
        };

    info!("Configuration:");
    info!("  Genius API: {}", connector.api_base_url());
    info!("  Genius web API: {}", connector.web_base_url());

    let strategy = match config.credential_mode {
        CredentialMode::PerRequest => {
            info!("  Credentials: per request (Authorization: Bearer <token>)");
            CredentialStrategy::per_request(connector)
        }
        CredentialMode::Fixed => {
            warn!("  Credentials: FIXED - every caller shares the configured Genius token");
            let token = config.access_token.as_deref().unwrap_or_default();
            match connector.connect(token).await {
                Ok(client) => CredentialStrategy::fixed(client),
                Err(e) => {
                    error!("Failed to create Genius client from access token: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let router_config = build_router_config(&config);
    info!("  CORS origins: {}", router_config.cors_origins.join(", "));
    info!("  Manifest dir: {}", router_config.well_known_dir.display());
    info!("  Assets dir: {}", router_config.assets_dir.display());

    let router = create_router(strategy, router_config);

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/", addr);
    info!("    curl http://{}/.well-known/ai-plugin.json", addr);
    info!(
        "    curl -H 'Authorization: Bearer <token>' 'http://{}/lyrics?song_name=...&artist_name=...'",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "genius_plugin=debug,tower_http=debug"
    } else {
        "genius_plugin=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cors_origins(config.allowed_origins())
        .with_well_known_dir(config.well_known_dir.clone())
        .with_assets_dir(config.assets_dir.clone())
        .with_tracing(!config.no_tracing);

    if config.dev {
        router_config = router_config.with_dev_origin();
    }

    router_config
}

// =============================================================================
// Schema Command
// =============================================================================

fn run_schema(config: SchemaConfig) -> ExitCode {
    let document = build_document();

    let rendered = match config.format {
        SchemaFormat::Yaml => serde_yaml::to_string(&document).map_err(|e| e.to_string()),
        SchemaFormat::Json => serde_json::to_string_pretty(&document).map_err(|e| e.to_string()),
    };

    match rendered {
        Ok(text) => {
            println!("{}", text.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
