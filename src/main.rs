mod cache;
mod config;
mod hn;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use hn::client::ResilientClient;
use hn::service::StoryService;

#[derive(Parser, Debug)]
#[command(name = "hnbest")]
#[command(about = "Fetches the best Hacker News stories, ranked by score")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/hnbest/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Number of stories to fetch (1..=500)
  #[arg(short = 'n', long, default_value_t = 10)]
  count: usize,

  /// Pretty-print the JSON output
  #[arg(long)]
  pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  // Logs go to stderr so stdout stays clean JSON
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hnbest=info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  if args.count < 1 {
    return Err(eyre!("count must be greater than 0"));
  }
  if args.count > 500 {
    return Err(eyre!("count must be less than or equal to 500"));
  }

  let config = config::Config::load(args.config.as_deref())?;

  let client = ResilientClient::new(config.hn.request_timeout())?;
  let service = StoryService::new(client, config.hn);

  let stories = service.best_stories(args.count).await;

  let json = if args.pretty {
    serde_json::to_string_pretty(&stories)
  } else {
    serde_json::to_string(&stories)
  }
  .map_err(|e| eyre!("Failed to serialize stories: {}", e))?;

  println!("{json}");

  Ok(())
}
