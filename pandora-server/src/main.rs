use std::sync::Arc;

use clap::Parser;
use pandora_core::generation::{self, GenerationBackend, GenerationConfig};
use pandora_core::PandoraConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use pandora_server::http;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "pandora.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match PandoraConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Connect to DB
    let pool = match pandora_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match pandora_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        match pandora_core::db::count_stories(&pool).await {
            Ok(n) => println!("✅ stories table reachable: {} rows", n),
            Err(e) => {
                println!("❌ stories table check failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Pandora DB health check passed");
        return Ok(());
    }

    // Build the generation client once; a missing API key surfaces on first use
    let generation_config = GenerationConfig::from_settings(&config.generation);
    let generator: Arc<dyn GenerationBackend> =
        Arc::from(generation::create_backend(generation_config)?);

    // Shutdown signal
    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(pool, generator, config, tx.subscribe()).await?;

    Ok(())
}
