use bioguardian::cache::{CacheSource, SpeciesCache, SpeciesStore, SqliteStore};
use bioguardian::config::Config;
use bioguardian::discover::DiscoverState;
use bioguardian::logging;
use bioguardian::species::{normalize_category, SpeciesClient, SpeciesRecord};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bioguardian")]
#[command(about = "Discover endangered species, with an offline-first local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/bioguardian/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Species API base url
  #[arg(long)]
  api_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List endangered species of a category, refreshing the cache when stale
  Discover {
    /// Taxonomic group, e.g. mammals or birds
    category: String,
    /// Print records as JSON
    #[arg(long)]
    json: bool,
  },
  /// Show what the local cache holds for a category, without network access
  Cached {
    category: String,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.url = url;
  }

  let _log_guard = logging::init(&config.log)?;

  let store = match &config.cache.path {
    Some(path) => SqliteStore::open_at(path)?,
    None => SqliteStore::open()?,
  };

  match args.command {
    Command::Discover { category, json } => {
      let client = SpeciesClient::new(&config)?;
      let cache = SpeciesCache::new(store, client)
        .with_freshness_window(config.cache.freshness_window());
      discover(&cache, &category, json).await
    }
    Command::Cached { category } => show_cached(&store, &category),
  }
}

async fn discover(
  cache: &SpeciesCache<SqliteStore, SpeciesClient>,
  category: &str,
  json: bool,
) -> Result<()> {
  let (result, offline_since) = match cache.resolve(category).await {
    Ok(result) if result.source == CacheSource::Offline => (Ok(result.data), result.fetched_at),
    Ok(result) => (Ok(result.data), None),
    Err(e) => {
      tracing::error!("species lookup for {} failed: {}", category, e);
      (Err(e), None)
    }
  };

  let state = DiscoverState::from_result(category, result);

  match state {
    DiscoverState::Success(species) => {
      if let Some(fetched_at) = offline_since {
        eprintln!(
          "Offline: showing cached data from {}",
          format_millis(fetched_at)
        );
      }
      if json {
        let out = serde_json::to_string_pretty(&species)
          .map_err(|e| eyre!("Failed to serialize species: {}", e))?;
        println!("{}", out);
      } else {
        print_table(&species);
      }
      Ok(())
    }
    DiscoverState::Error(message) => Err(eyre!(message)),
  }
}

fn show_cached(store: &SqliteStore, category: &str) -> Result<()> {
  let key = normalize_category(category);
  let species = store.query_by_category(&key)?;

  if species.is_empty() {
    println!("Nothing cached for {}", key);
    return Ok(());
  }

  let now = Utc::now().timestamp_millis();
  for record in &species {
    let age_hours = record.age_millis(now) / (60 * 60 * 1000);
    println!(
      "{:>6}  {:<32}  fetched {} ({}h ago)",
      record.id,
      record.display_name(),
      format_millis(record.last_fetched),
      age_hours
    );
  }
  println!("{} cached record(s) for {}", species.len(), key);
  Ok(())
}

fn print_table(species: &[SpeciesRecord]) {
  println!(
    "{:>6}  {:<32}  {:<32}  STATUS",
    "ID", "NAME", "SCIENTIFIC NAME"
  );
  for record in species {
    println!(
      "{:>6}  {:<32}  {:<32}  {}",
      record.id,
      record.display_name(),
      record.scientific_name.as_deref().unwrap_or("-"),
      record.conservation_status.as_deref().unwrap_or("-")
    );
  }
}

fn format_millis(millis: i64) -> String {
  Utc
    .timestamp_millis_opt(millis)
    .single()
    .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
    .unwrap_or_else(|| millis.to_string())
}
