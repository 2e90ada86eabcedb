//! CLI argument definitions using clap derive macros.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use furgate::auth::DEFAULT_DATABASE_LIMIT;

/// HTTP gateway over a gallery-site scraping backend.
///
/// Exposes submissions, journals, users and folder listings as a stable
/// JSON API, with cookie authorization cached in a local database and
/// upstream calls paced per caller.
#[derive(Parser, Debug)]
#[command(name = "furgate")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Address to serve the API on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Path of the authorization database (created if absent)
    #[arg(short, long, default_value = "furgate.db")]
    pub database: PathBuf,

    /// Maximum retained authorization records before oldest-first eviction
    #[arg(long, default_value_t = DEFAULT_DATABASE_LIMIT, value_parser = clap::value_parser!(i64).range(1..))]
    pub database_limit: i64,

    /// Minimum delay between upstream calls per caller in milliseconds
    /// (0 to disable, max 60000; defaults to the upstream crawl delay)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    /// Upstream site base URL
    #[arg(long, default_value = "https://www.furaffinity.net")]
    pub upstream: url::Url,
}
