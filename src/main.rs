use anyhow::Result;
use clap::Parser;
use tagx::config::Config;
use tagx::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line overrides for the environment-driven configuration.
#[derive(Debug, Parser)]
#[command(
    name = "tagx",
    version,
    about = "NLP-powered tag generation API with per-client rate limiting"
)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Log level for the tagx target (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();

    // Load configuration from environment, command line winning on overlap
    let mut config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tagx={},tower_http=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tagx service");
    tracing::info!(
        "Configuration: bind_address={}, generation_timeout={}s, cleanup_interval={}s",
        config.bind_address(),
        config.generation_timeout.as_secs(),
        config.cleanup_interval.as_secs()
    );

    // Create and run the server
    let server = Server::new(config);

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
