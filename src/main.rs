use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_browser::{
    config::Config,
    database::Database,
    ingestor::{ChannelIngestor, RefreshScheduler},
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "epg-browser")]
#[command(version = "0.1.0")]
#[command(about = "Browse EPG channel metadata aggregated from public provider files")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("epg_browser={},tower_http=trace", cli.log_level)
    } else {
        format!("epg_browser={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPG Channel Browser v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from specified file
    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    config.upstream.validate()?;

    info!("Using database: {}", config.database.url);

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let ingestor = Arc::new(ChannelIngestor::new(
        database.clone(),
        config.upstream.clone(),
        config.ingestion.clone(),
    )?);

    // Populate an empty database in the background so the server is
    // reachable while the first refresh runs.
    if config.ingestion.refresh_on_empty {
        let count = database.channel_count().await?;
        if count == 0 {
            info!("Database is empty, fetching channels from upstream");
            let startup_ingestor = ingestor.clone();
            tokio::spawn(async move {
                match startup_ingestor.refresh().await {
                    Ok((channel_count, _)) => {
                        info!("Initial refresh stored {} channels", channel_count);
                    }
                    Err(e) => {
                        error!("Initial refresh failed: {}. Use POST /api/refresh to retry.", e);
                    }
                }
            });
        } else {
            info!("Database contains {} channels", count);
        }
    }

    if let Some(cron) = config
        .ingestion
        .refresh_cron
        .clone()
        .filter(|c| !c.is_empty())
    {
        let scheduler = RefreshScheduler::new(ingestor.clone(), &cron)?;
        tokio::spawn(scheduler.start());
        info!("Scheduled refreshes enabled ({})", cron);
    }

    let web_server = WebServer::new(config, database, ingestor)?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
