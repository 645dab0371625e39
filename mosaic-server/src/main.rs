use clap::Parser;
use mosaic_core::MosaicConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use mosaic_server::bootstrap;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "mosaic.toml")]
    config: String,

    /// Check credential and model loading, then exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match MosaicConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging
    let default_level = config
        .service
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .init();

    if args.health {
        match bootstrap::create_completion_client(&config) {
            Ok(_) => println!("✅ API credential loaded ({})", config.completion.api_key_env),
            Err(e) => {
                println!("❌ {}", e);
                std::process::exit(1);
            }
        }

        match bootstrap::create_classifier(&config) {
            Ok(_) => println!("✅ Personality model loaded: {}", config.model.name),
            Err(e) => {
                println!("❌ {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Mind Mosaic health check passed");
        return Ok(());
    }

    let services = match bootstrap::create_services(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Initialization error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(services = ?services, "Services ready");

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    mosaic_server::http::start_http_server(services, config, tx.subscribe()).await?;

    Ok(())
}
