mod cache;
mod config;
mod error;
mod logging;
mod server;
mod wcl;

use chrono::Duration;
use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

use cache::{CacheLayer, NoopStorage, SqliteStorage};
use server::{AppState, ProxyServer};
use wcl::{CachedWclClient, MemberFetcher, WclClient};

#[derive(Parser, Debug)]
#[command(name = "wcl-proxy")]
#[command(about = "A caching proxy and tiny web UI for the Warcraft Logs GraphQL API")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./wcl-proxy.yaml or $XDG_CONFIG_HOME/wcl-proxy/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Address to listen on, overriding server.bind
  #[arg(short, long)]
  bind: Option<String>,

  /// Disable the guild lookup cache
  #[arg(long)]
  no_cache: bool,

  /// Also write logs to a daily-rolling file in this directory
  #[arg(long)]
  log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init(args.log_dir.as_deref())?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let credentials = config.credentials()?;

  let ttl = Duration::seconds(config.cache.ttl_secs);
  let cache = if args.no_cache || !config.cache.enabled {
    tracing::info!("Response cache disabled");
    CacheLayer::new(NoopStorage)
  } else {
    CacheLayer::new(SqliteStorage::open(config.cache.path.as_deref())?).with_ttl(ttl)
  };

  let client = WclClient::from_config(&config, credentials)?;
  let state = AppState {
    guilds: CachedWclClient::new(client.clone(), cache),
    members: MemberFetcher::new(client, config.members.clone()),
  };

  let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
  ProxyServer::new(state).run(&bind).await?;

  Ok(())
}
