//! remainders-api: read-only API over stored remainders
//!
//! Serves the latest resolved remainders and recipient search over HTTP.
//! TLS termination is expected in front of this process.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use remainders_common::config::TomlConfig;
use remainders_common::source::{MemoryRecordSource, RecordSource, SqliteRecordSource};
use remainders_common::ResultPipeline;
use remainders_api::logging::init_tracing;
use remainders_api::{build_router, AppState, HttpOptions};
use tracing::{error, info, warn};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "remainders-api", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "REMAINDERS_CONFIG", default_value = "remainders.toml")]
    config: PathBuf,

    /// Serve records from a JSON file instead of the database
    #[arg(long)]
    records_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TomlConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    init_tracing(&config.logging, config.debug)?;

    info!(
        "Starting remainders-api v{} (policy: {})",
        env!("CARGO_PKG_VERSION"),
        config.resolution.policy
    );
    if config.debug {
        info!("CORS: {:?}", config.allowed_origins);
    }

    let source: Arc<dyn RecordSource> = match &cli.records_file {
        Some(path) => {
            let source = MemoryRecordSource::from_json_file(path)?;
            if source.is_empty() {
                warn!("Records file {} holds no records", path.display());
            } else {
                info!("Serving {} records from {}", source.len(), path.display());
            }
            Arc::new(source)
        }
        None => {
            info!("Database: {}", config.database_url);
            match SqliteRecordSource::connect(&config.database_url, config.connect.retry()).await {
                Ok(source) => Arc::new(source),
                Err(e) => {
                    error!("Failed to connect to database: {}", e);
                    return Err(e.into());
                }
            }
        }
    };

    let engine = config.resolution.build_engine()?;
    info!(
        "Role table: {} roles, placeholder {:?}",
        engine.roles().len(),
        engine.placeholder().token
    );

    if config.shared_secret == 0 {
        info!("API authentication disabled (shared_secret = 0)");
    } else {
        info!("API authentication enabled");
    }

    let state = AppState::new(ResultPipeline::new(source, engine), config.shared_secret);
    let app = build_router(state, &HttpOptions::from_config(&config)?);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("remainders-api listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
