//! Server entry point for the gateway.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use furgate::api::{self, AppState};
use furgate::auth::{AuthService, AuthorizationStore};
use furgate::db::Database;
use furgate::pacing::Pacer;
use furgate::scraper::{HttpScrapeClient, RobotsPolicy, ScrapeConfig};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Gateway starting");

    let db = Database::new(&args.database).await?;
    let store = AuthorizationStore::new(db, args.database_limit);

    // Fetch the upstream crawl policy once; the client holds it for its
    // whole lifetime
    let bootstrap_http = reqwest::Client::builder()
        .user_agent(furgate::scraper::client::DEFAULT_USER_AGENT)
        .build()?;
    let robots = RobotsPolicy::fetch(&bootstrap_http, &args.upstream).await?;
    info!(upstream = %args.upstream, crawl_delay = ?robots.crawl_delay(), "upstream policy loaded");

    let client: Arc<dyn furgate::scraper::ScrapeClient> = Arc::new(HttpScrapeClient::new(
        ScrapeConfig::new(args.upstream.clone(), robots),
    )?);

    // --rate-limit overrides; otherwise the robots Crawl-delay seeds the
    // interval
    let pacer = Arc::new(Pacer::seeded(args.rate_limit, client.crawl_delay()));
    if pacer.min_interval().is_zero() {
        debug!("pacing disabled");
    } else {
        debug!(interval = ?pacer.min_interval(), "pacing enabled");
    }

    let auth = Arc::new(AuthService::new(store, client.clone()));
    let state = AppState {
        client,
        auth,
        pacer,
    };

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(bind = %args.bind, "serving API");
    axum::serve(
        listener,
        api::router(state)
            .into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
