pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

pub use config::Config;
use scheduler::Scheduler;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => {
            config.validate()?;
            run_daemon(config).await
        }

        "fetch" | "-f" | "--fetch" => {
            config.validate()?;
            run_single_fetch(config).await
        }

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("ArticleDesk - News article aggregator");
    println!("Fetches articles from NewsAPI and serves them over a REST API");
    println!();
    println!("USAGE:");
    println!("  articledesk <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("  daemon            Run the API server with the fetch scheduler");
    println!("  fetch             Run a single article fetch and exit");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("  ARTICLEDESK_DB    Database location (default: sqlite:data/articledesk.db)");
    println!("  NEWS_API_KEY      NewsAPI key (required)");
    println!("  JWT_SECRET        Session token signing secret (required)");
    println!("  PORT              HTTP listen port (default: 3000)");
    println!("  CRON_SCHEDULE     Fetch schedule, cron with seconds field");
    println!("  APP_ENV           \"production\" enables Secure cookies");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the news query, scheduler, etc.");
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "ArticleDesk v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);

    let scheduler = Scheduler::new(Arc::clone(&shared), config.scheduler.clone());
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting Web API on port {}", port);

        let app_state = api::create_app_state(Arc::clone(&shared));
        let app = api::router(app_state);
        let addr = format!("0.0.0.0:{port}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web server running at http://{addr}");
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}

/// One-shot fetch; a failure becomes a non-zero process exit.
async fn run_single_fetch(config: Config) -> anyhow::Result<()> {
    info!("Running one-shot article fetch...");

    let shared = Arc::new(SharedState::new(config).await?);
    let stats = shared.ingest.run().await?;

    info!(
        fetched = stats.fetched,
        existing = stats.existing,
        inserted = stats.inserted,
        "Fetch complete"
    );
    Ok(())
}
